// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat sessions against the streaming chat endpoint
//!
//! This module provides the conversation transcript, the event-stream decoder,
//! the session client, and challenge recovery.

pub mod client;
pub mod conversation;
pub mod retry;
pub mod stream;

pub use client::{DuckChat, DUCK_CHAT_URL};
pub use conversation::{Conversation, Message, Role};
pub use retry::{ask_with_refresh, recovery_for, Recovery};
pub use stream::{classify_error_event, decode_line, decode_stream, Line, StreamEvent};
