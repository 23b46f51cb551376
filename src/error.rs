// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for duckchat
//!
//! This module defines all error types used throughout the application.

use thiserror::Error;

/// Main error type for duckchat operations
#[derive(Error, Debug)]
pub enum DuckError {
    /// Chat endpoint errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Header capture failed or produced nothing usable
    #[error("Header refresh failed: {0}")]
    HeaderRefresh(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Conversation state does not allow the requested operation
    #[error("Session error: {0}")]
    Session(String),
}

/// Errors reported by the chat endpoint, either as an HTTP status or as an
/// error event inside the response stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP 429 from the chat endpoint
    #[error("Rate limited by the chat endpoint")]
    RateLimited,

    /// `ERR_CHALLENGE`: the request headers are stale and must be re-captured
    #[error("Challenge failed: request headers are no longer valid")]
    Challenge,

    /// `ERR_CONVERSATION_LIMIT`: the transcript is too long to continue
    #[error("Conversation limit exceeded")]
    ConversationLimit,

    /// Any other error event
    #[error("Chat service error: {0}")]
    Service(String),

    /// A data record in the stream could not be parsed
    #[error("Couldn't parse body={0}")]
    MalformedEvent(String),

    /// Unexpected HTTP status
    #[error("API error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Network connectivity error
    #[error("Network error: {0}")]
    Network(String),

    /// Response body failed mid-stream
    #[error("Streaming error: {0}")]
    Stream(String),
}

impl DuckError {
    /// The endpoint-level error, if this is one.
    fn api(&self) -> Option<&ApiError> {
        match self {
            DuckError::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Whether fresh request headers could fix this error.
    pub fn is_challenge(&self) -> bool {
        matches!(self.api(), Some(ApiError::Challenge))
    }
}

/// Result type alias for duckchat operations
pub type Result<T> = std::result::Result<T, DuckError>;
