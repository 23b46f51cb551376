// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Model catalog loader
//!
//! Loads model definitions from:
//! 1. Built-in defaults (always available)
//! 2. The scraper-written catalog file, which replaces the defaults entirely

use std::path::Path;
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};

use crate::error::{DuckError, Result};

use super::schema::{CatalogFile, ModelEntry, ModelId};

/// The set of model identifiers the chat endpoint accepts.
///
/// The first entry is the default model.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    entries: Vec<ModelEntry>,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::with_defaults_only()
    }
}

impl ModelCatalog {
    /// Catalog with only the built-in models
    pub fn with_defaults_only() -> Self {
        Self {
            entries: [
                "gpt-4o-mini",
                "claude-3-haiku-20240307",
                "meta-llama/Llama-3.3-70B-Instruct-Turbo",
                "mistralai/Mistral-Small-24B-Instruct-2501",
                "o3-mini",
            ]
            .into_iter()
            .map(ModelEntry::from_id)
            .collect(),
        }
    }

    /// Build a catalog from explicit entries. Entries without a name get one
    /// derived from their id.
    pub fn from_entries(entries: Vec<ModelEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(DuckError::Config("model catalog is empty".to_string()));
        }
        let entries = entries
            .into_iter()
            .map(|mut entry| {
                if entry.name.is_empty() {
                    entry.name = super::derive_model_name(&entry.id);
                }
                entry
            })
            .collect();
        Ok(Self { entries })
    }

    /// Load the catalog file. A missing file yields the built-in defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No model catalog at {}, using defaults", path.display());
            return Ok(Self::with_defaults_only());
        }

        let content = std::fs::read_to_string(path)?;
        let file: CatalogFile = serde_json::from_str(&content)?;
        Self::from_entries(file.models)
    }

    /// All entries, default first
    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    /// The default model
    pub fn default_model(&self) -> ModelId {
        ModelId::new(self.entries[0].id.clone())
    }

    /// Resolve a display name (case-insensitive) or a raw identifier.
    pub fn resolve(&self, name_or_id: &str) -> Result<ModelId> {
        let wanted = name_or_id.trim();
        self.entries
            .iter()
            .find(|e| e.id == wanted)
            .or_else(|| {
                self.entries
                    .iter()
                    .find(|e| e.name.eq_ignore_ascii_case(wanted))
            })
            .map(|e| ModelId::new(e.id.clone()))
            .ok_or_else(|| DuckError::InvalidInput(format!("unknown model: {}", wanted)))
    }

    /// Make the model named by `name_or_id` the default.
    pub fn prefer(&mut self, name_or_id: &str) -> Result<()> {
        let id = self.resolve(name_or_id)?;
        if let Some(pos) = self.entries.iter().position(|e| e.id == id.as_str()) {
            let entry = self.entries.remove(pos);
            self.entries.insert(0, entry);
        }
        Ok(())
    }

    /// Resolve an optional selector, falling back to the default.
    pub fn resolve_or_default(&self, name_or_id: Option<&str>) -> Result<ModelId> {
        match name_or_id {
            Some(s) if !s.trim().is_empty() => self.resolve(s),
            _ => Ok(self.default_model()),
        }
    }
}

/// When the catalog file was last written, if it exists.
pub fn last_updated(path: &Path) -> Option<DateTime<Utc>> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

/// Whether the catalog file is older than `max_age` (or missing), meaning the
/// scraper should be re-run.
pub fn is_stale(path: &Path, max_age: Duration) -> bool {
    let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(_) => return true,
    };
    SystemTime::now()
        .duration_since(modified)
        .map(|age| age > max_age)
        .unwrap_or(false)
}
