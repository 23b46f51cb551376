// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Model catalog
//!
//! The chat endpoint only accepts a fixed set of model identifiers. That set
//! changes over time and is scraped from the web UI by an external tool that
//! writes `models.json`:
//!
//! ```json
//! { "models": [ { "name": "Gpt4OMini", "id": "gpt-4o-mini" } ] }
//! ```
//!
//! The first entry is the default model. When no file exists the built-in list
//! is used.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use duckchat::models::ModelCatalog;
//!
//! let catalog = ModelCatalog::load_from(&path)?;
//! let model = catalog.resolve_or_default(Some("o3-mini"))?;
//! ```

pub mod loader;
pub mod schema;

pub use loader::{is_stale, last_updated, ModelCatalog};
pub use schema::{derive_model_name, CatalogFile, ModelEntry, ModelId};
