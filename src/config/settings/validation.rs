// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::time::Duration;

use crate::error::{DuckError, Result};

use super::Settings;

/// Environment variable that overrides the configured chat endpoint
pub const CHAT_URL_ENV: &str = "DUCKCHAT_CHAT_URL";

impl Settings {
    /// Get the chat endpoint URL, checking env var first.
    pub fn chat_url(&self) -> String {
        resolve_chat_url(std::env::var(CHAT_URL_ENV).ok(), &self.upstream.chat_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.request_timeout_secs)
    }

    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_secs(self.headers.refresh_timeout_secs)
    }

    pub fn catalog_max_age(&self) -> Duration {
        Duration::from_secs(self.models.max_age_days * 24 * 60 * 60)
    }

    /// List every problem with the current settings.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.upstream.chat_url.trim().is_empty() {
            problems.push("upstream.chat_url is empty".to_string());
        }
        if self.upstream.request_timeout_secs == 0 {
            problems.push("upstream.request_timeout_secs must be positive".to_string());
        }
        if self.server.host.trim().is_empty() {
            problems.push("server.host is empty".to_string());
        }
        if self.server.port == 0 {
            problems.push("server.port must not be 0".to_string());
        }
        match self.headers.refresh_command.first() {
            Some(program) if !program.trim().is_empty() => {}
            _ => problems.push("headers.refresh_command has no program".to_string()),
        }
        if self.headers.refresh_timeout_secs == 0 {
            problems.push("headers.refresh_timeout_secs must be positive".to_string());
        }

        problems
    }

    /// Fail with every problem found, if any.
    pub fn validate(&self) -> Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(DuckError::Config(problems.join("; ")))
        }
    }
}

fn resolve_chat_url(env_value: Option<String>, configured: &str) -> String {
    // Priority: env var > config file.
    env_value
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| configured.to_string())
}
