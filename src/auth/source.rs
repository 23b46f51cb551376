// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Header capture
//!
//! Valid headers can only be obtained by driving a real browser through the
//! chat page and recording the request it sends. That automation lives outside
//! this crate; [`HeaderSource`] is the seam, and [`CommandHeaderSource`] runs an
//! external capture program that prints the headers as a JSON object.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::{DuckError, Result};

use super::headers::AuthHeaders;

/// Something that can capture a fresh set of request headers.
///
/// Implementations are expensive (a full browser run) and must not be called
/// concurrently; go through [`super::HeaderManager`] which serializes them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HeaderSource: Send + Sync {
    /// Capture headers. An empty set counts as a failure.
    async fn fetch_headers(&self) -> Result<AuthHeaders>;
}

/// Runs `program args...` and parses its stdout as a JSON object of headers.
#[derive(Debug, Clone)]
pub struct CommandHeaderSource {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandHeaderSource {
    /// Default time allowed for one capture run
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Build from a command line split into words (`["node", "capture.js"]`).
    pub fn from_command(command: &[String]) -> Result<Self> {
        let (program, args) = command.split_first().ok_or_else(|| {
            DuckError::Config("header refresh command is empty".to_string())
        })?;
        Ok(Self::new(program.clone(), args.to_vec()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl HeaderSource for CommandHeaderSource {
    async fn fetch_headers(&self) -> Result<AuthHeaders> {
        tracing::info!("capturing headers with {}", self.program);

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DuckError::HeaderRefresh(format!("failed to spawn {}: {}", self.program, e))
            })?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                DuckError::HeaderRefresh(format!(
                    "{} did not finish within {}s",
                    self.program,
                    self.timeout.as_secs()
                ))
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DuckError::HeaderRefresh(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let value: serde_json::Value = serde_json::from_slice(&output.stdout).map_err(|e| {
            DuckError::HeaderRefresh(format!("capture output is not JSON: {}", e))
        })?;
        let headers = AuthHeaders::from_json(&value)?;
        if headers.is_empty() {
            return Err(DuckError::HeaderRefresh(
                "capture produced no headers".to_string(),
            ));
        }

        tracing::info!("captured {} headers", headers.len());
        Ok(headers)
    }
}
