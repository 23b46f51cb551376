// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! duckchat - streaming client for the DuckDuckGo AI chat endpoint.
//!
//! This crate exposes the shared runtime used by:
//! - the `duckchat` CLI (`src/main.rs`)
//! - the local HTTP service (`duckchat serve`)
//!
//! Architecture highlights:
//! - `chat`: conversation state, event-stream decoding, the session client and
//!   challenge recovery
//! - `auth`: captured request headers, the capture seam and the shared manager
//! - `models`: the catalog of model identifiers the endpoint accepts
//! - `service`: axum router over the chat client
//! - `config`, `cli`: settings file and command-line definitions

pub mod auth;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod service;

pub use error::{ApiError, DuckError, Result};
