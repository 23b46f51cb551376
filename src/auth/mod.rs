// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Request headers that authorize chat requests
//!
//! The chat endpoint only answers requests carrying headers captured from a
//! real browser session. This module holds the header set, the seam for
//! capturing a new one, and the shared manager that refreshes and persists it.

pub mod headers;
pub mod manager;
pub mod source;

pub use headers::AuthHeaders;
pub use manager::{HeaderManager, HeaderRefresher};
pub use source::{CommandHeaderSource, HeaderSource};
