// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Request headers captured from a real browser session

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DuckError, Result};

// Transport-level headers that describe the captured request rather than
// authorize it. Replaying them would corrupt ours.
const NOT_REPLAYED: &[&str] = &[
    "accept-encoding",
    "connection",
    "content-length",
    "host",
    "transfer-encoding",
];

/// Header name to value, names lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthHeaders(BTreeMap<String, String>);

impl AuthHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header. Returns false if the header is one that must not be
    /// replayed (pseudo-headers, hop-by-hop and body framing headers).
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into().trim().to_ascii_lowercase();
        if name.is_empty() || name.starts_with(':') || NOT_REPLAYED.contains(&name.as_str()) {
            return false;
        }
        self.0.insert(name, value.into());
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Build from a JSON object. String values are taken as-is, other scalars
    /// are stringified; nested values are rejected.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            DuckError::HeaderRefresh("expected a JSON object of headers".to_string())
        })?;

        let mut headers = Self::new();
        for (name, value) in object {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => continue,
                Value::Array(_) | Value::Object(_) => {
                    return Err(DuckError::HeaderRefresh(format!(
                        "header {} has a non-scalar value",
                        name
                    )))
                }
            };
            headers.insert(name.as_str(), value);
        }
        Ok(headers)
    }

    /// Convert to a reqwest header map.
    pub fn to_header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.0.len());
        for (name, value) in &self.0 {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| DuckError::InvalidInput(format!("header name {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| DuckError::InvalidInput(format!("header {}: {}", name, e)))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

impl<K, V> FromIterator<(K, V)> for AuthHeaders
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}
