// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Model catalog schema
//!
//! The catalog file is produced out-of-band by the model scraper and lists
//! the identifiers the chat endpoint accepts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a chat model as sent on the wire (e.g. `gpt-4o-mini`).
///
/// Only obtainable through [`super::ModelCatalog`], so every `ModelId` held by a
/// conversation is one the catalog knows about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Display name, e.g. `Gpt4OMini`
    #[serde(default)]
    pub name: String,

    /// Wire identifier
    pub id: String,
}

impl ModelEntry {
    /// Create an entry, deriving the display name from the identifier.
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: derive_model_name(&id),
            id,
        }
    }
}

/// On-disk catalog layout (`models.json`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

/// Derive a display name from a model identifier.
///
/// Takes the last `/` segment, splits it on `-`, title-cases every piece and
/// joins them: `meta-llama/Llama-3.3-70B-Instruct-Turbo` becomes
/// `Llama3.370BInstructTurbo`.
pub fn derive_model_name(id: &str) -> String {
    let last = id.rsplit('/').next().unwrap_or(id);
    last.split('-').map(title_case).collect()
}

// Upper-cases the first letter of every alphabetic run, lower-cases the rest.
fn title_case(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    let mut prev_alpha = false;
    for c in part.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
