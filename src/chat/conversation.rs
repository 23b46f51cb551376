// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Conversation state
//!
//! The transcript sent with every request. The endpoint is stateless, so the
//! full history goes over the wire each time.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::ModelId;

/// Role of the message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant response
    Assistant,
}

/// A single turn of the transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Selected model plus the append-only transcript.
///
/// Serializes to exactly the request body the chat endpoint expects:
/// `{"model": "...", "messages": [{"role": "user", "content": "..."}]}`.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    model: ModelId,
    messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation for a model
    pub fn new(model: ModelId) -> Self {
        Self {
            model,
            messages: Vec::new(),
        }
    }

    pub fn model(&self) -> &ModelId {
        &self.model
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a user turn
    pub fn add_input(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    /// Append the assistant turn of a completed exchange
    pub fn add_answer(&mut self, text: impl Into<String>) {
        self.messages.push(Message::assistant(text));
    }

    /// True when the last turn is a user turn with no answer yet.
    pub fn awaiting_answer(&self) -> bool {
        matches!(self.messages.last(), Some(m) if m.role == Role::User)
    }

    /// The pending user input, if the last exchange has not been answered.
    pub fn last_input(&self) -> Option<&str> {
        self.messages
            .last()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Request body for the current state. Deterministic for equal states.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
