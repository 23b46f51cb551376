// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings management for duckchat
//!
//! Handles loading and saving settings from ~/.duckchat/settings.json

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::chat::DUCK_CHAT_URL;

mod io;
mod validation;

/// Main settings structure, stored in ~/.duckchat/settings.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// HTTP service settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Chat endpoint settings
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Header capture and storage
    #[serde(default)]
    pub headers: HeadersConfig,

    /// Model catalog settings
    #[serde(default)]
    pub models: ModelsConfig,
}

/// HTTP service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Chat endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Chat endpoint URL (overridden by DUCKCHAT_CHAT_URL)
    #[serde(default = "default_chat_url")]
    pub chat_url: String,

    /// Timeout for one whole exchange, including the streamed body
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Header capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadersConfig {
    /// Where captured headers are kept (default: ~/.duckchat/headers.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,

    /// Program and arguments that print a JSON object of captured headers
    #[serde(default = "default_refresh_command")]
    pub refresh_command: Vec<String>,

    /// Time allowed for one capture run
    #[serde(default = "default_refresh_timeout_secs")]
    pub refresh_timeout_secs: u64,
}

/// Model catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Catalog file written by the model scraper (default: ~/.duckchat/models.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,

    /// Model used when a request names none (default: first catalog entry)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    /// Catalog age after which a re-scrape is suggested
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_chat_url() -> String {
    DUCK_CHAT_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_refresh_command() -> Vec<String> {
    vec!["duckchat-capture".to_string()]
}

fn default_refresh_timeout_secs() -> u64 {
    120
}

fn default_max_age_days() -> u64 {
    7
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            chat_url: default_chat_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for HeadersConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            refresh_command: default_refresh_command(),
            refresh_timeout_secs: default_refresh_timeout_secs(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            default_model: None,
            max_age_days: default_max_age_days(),
        }
    }
}
