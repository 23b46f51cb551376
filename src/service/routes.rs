// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! HTTP handlers
//!
//! ## Endpoints
//!
//! - `POST /chat` - `{"content": "...", "model": "..."}`, answers with the
//!   assistant reply as plain text
//! - `GET /models` - the model catalog
//! - `GET /health` - liveness check

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::chat::{ask_with_refresh, DuckChat};
use crate::models::ModelEntry;

use super::AppState;

/// Body of `POST /chat`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    /// The user message
    pub content: String,
    /// Model name or identifier; the catalog default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Body of `GET /models`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelsResponse {
    pub default: String,
    pub models: Vec<ModelEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Error body, `{"detail": "..."}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Failures visible to service clients
#[derive(Debug)]
pub enum ServiceError {
    /// The requested model is not in the catalog
    UnknownModel(String),
    /// Anything else; details stay in the logs
    Internal,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ServiceError::UnknownModel(detail) => (StatusCode::UNPROCESSABLE_ENTITY, detail),
            ServiceError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            ),
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

/// POST /chat
///
/// Each request is a fresh conversation. A challenge is answered by one
/// header refresh and a single re-send.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<String, ServiceError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("chat", %request_id);

    async move {
        let model = state
            .catalog
            .resolve_or_default(request.model.as_deref())
            .map_err(|e| ServiceError::UnknownModel(e.to_string()))?;

        let headers = state.headers.current().await;
        let mut duck = DuckChat::with_client(
            state.client.clone(),
            state.chat_url.clone(),
            headers,
            model,
        );

        match ask_with_refresh(&mut duck, state.headers.as_ref(), &request.content).await {
            Ok(answer) => {
                tracing::debug!(chars = answer.len(), "answered");
                Ok(answer)
            }
            Err(e) => {
                tracing::error!("chat request failed: {}", e);
                Err(ServiceError::Internal)
            }
        }
    }
    .instrument(span)
    .await
}

/// GET /models
pub async fn models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        default: state.catalog.default_model().to_string(),
        models: state.catalog.entries().to_vec(),
        updated_at: state.catalog_updated_at,
    })
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}
