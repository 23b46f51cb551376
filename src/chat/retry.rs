// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Challenge recovery for chat exchanges
//!
//! The client itself never retries. A challenge means the request headers went
//! stale; the caller refreshes them and re-sends the same exchange once.

use crate::auth::HeaderRefresher;
use crate::error::{DuckError, Result};

use super::client::DuckChat;

/// What to do after a failed exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Capture fresh headers and re-send once
    RefreshHeaders,
    /// Give the error to the caller
    Propagate,
}

/// Decide how to recover from an exchange error
pub fn recovery_for(error: &DuckError) -> Recovery {
    if error.is_challenge() {
        Recovery::RefreshHeaders
    } else {
        Recovery::Propagate
    }
}

/// Ask `query`, refreshing headers and re-sending once if the endpoint
/// rejects the headers with a challenge.
///
/// The retry re-sends the pending input rather than asking again, so the
/// transcript holds a single user turn for the query either way. A failure of
/// the second attempt is returned as is.
pub async fn ask_with_refresh(
    chat: &mut DuckChat,
    refresher: &dyn HeaderRefresher,
    query: &str,
) -> Result<String> {
    let error = match chat.ask(query).await {
        Ok(answer) => return Ok(answer),
        Err(error) => error,
    };

    match recovery_for(&error) {
        Recovery::Propagate => Err(error),
        Recovery::RefreshHeaders => {
            tracing::warn!("{}; refreshing headers and retrying once", error);
            let fresh = refresher.refreshed_headers(chat.headers()).await?;
            chat.set_headers(fresh);

            let answer = chat.resend().await?;
            tracing::info!("exchange succeeded after header refresh");
            Ok(answer)
        }
    }
}
