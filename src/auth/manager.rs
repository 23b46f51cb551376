// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Shared header state for long-running callers
//!
//! [`HeaderManager`] owns the current header set, serializes refreshes through
//! the [`HeaderSource`], and persists every refreshed set to a store file so a
//! restart does not need a browser run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::error::{DuckError, Result};

use super::headers::AuthHeaders;
use super::source::HeaderSource;

/// Produces fresh headers to replace a set the endpoint rejected.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HeaderRefresher: Send + Sync {
    /// `stale` is the set that was rejected. Implementations may return a
    /// newer set they already have instead of capturing again.
    async fn refreshed_headers(&self, stale: &AuthHeaders) -> Result<AuthHeaders>;
}

pub struct HeaderManager {
    source: Arc<dyn HeaderSource>,
    store_path: Option<PathBuf>,
    current: RwLock<AuthHeaders>,
    refresh_lock: Mutex<()>,
}

impl HeaderManager {
    pub fn new(source: Arc<dyn HeaderSource>, store_path: Option<PathBuf>) -> Self {
        Self::with_headers(source, store_path, AuthHeaders::new())
    }

    pub fn with_headers(
        source: Arc<dyn HeaderSource>,
        store_path: Option<PathBuf>,
        headers: AuthHeaders,
    ) -> Self {
        Self {
            source,
            store_path,
            current: RwLock::new(headers),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Start from the store file, capturing a first set if it is missing or empty.
    pub async fn load_or_refresh(
        source: Arc<dyn HeaderSource>,
        store_path: Option<PathBuf>,
    ) -> Result<Self> {
        let stored = match &store_path {
            Some(path) => load_store(path)?,
            None => None,
        };

        match stored {
            Some(headers) => {
                tracing::info!("loaded {} stored headers", headers.len());
                Ok(Self::with_headers(source, store_path, headers))
            }
            None => {
                let manager = Self::new(source, store_path);
                manager.refresh(&AuthHeaders::new()).await?;
                Ok(manager)
            }
        }
    }

    /// Snapshot of the headers in use
    pub async fn current(&self) -> AuthHeaders {
        self.current.read().await.clone()
    }

    pub fn store_path(&self) -> Option<&Path> {
        self.store_path.as_deref()
    }

    /// Replace `stale` with a freshly captured set.
    ///
    /// Only one capture runs at a time. A caller that waited behind another
    /// refresh gets that refresh's result when the current set no longer
    /// matches the one it saw rejected.
    pub async fn refresh(&self, stale: &AuthHeaders) -> Result<AuthHeaders> {
        let _guard = self.refresh_lock.lock().await;

        {
            let current = self.current.read().await;
            if *current != *stale && !current.is_empty() {
                tracing::debug!("headers already refreshed by another request");
                return Ok(current.clone());
            }
        }

        tracing::info!("refreshing request headers");
        let fresh = self.source.fetch_headers().await?;
        if fresh.is_empty() {
            return Err(DuckError::HeaderRefresh(
                "header source returned no headers".to_string(),
            ));
        }

        if let Some(path) = &self.store_path {
            save_store(path, &fresh)?;
        }
        *self.current.write().await = fresh.clone();
        Ok(fresh)
    }

    /// Capture a new set unconditionally
    pub async fn force_refresh(&self) -> Result<AuthHeaders> {
        let current = self.current().await;
        self.refresh(&current).await
    }
}

#[async_trait]
impl HeaderRefresher for HeaderManager {
    async fn refreshed_headers(&self, stale: &AuthHeaders) -> Result<AuthHeaders> {
        self.refresh(stale).await
    }
}

/// Read a stored header set. A missing or empty store is `None`.
pub fn load_store(path: &Path) -> Result<Option<AuthHeaders>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    let value: serde_json::Value = serde_json::from_str(&content)?;
    let headers = AuthHeaders::from_json(&value)?;
    Ok((!headers.is_empty()).then_some(headers))
}

pub fn save_store(path: &Path, headers: &AuthHeaders) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(headers)?;
    std::fs::write(path, content)?;
    Ok(())
}
