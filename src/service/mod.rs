// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Local HTTP service
//!
//! Exposes the chat client over HTTP so other local tools can ask questions
//! without dealing with header capture. Shared state is the header manager,
//! the model catalog and one pooled HTTP client.

pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tower_http::trace::TraceLayer;

use crate::auth::HeaderManager;
use crate::error::Result;
use crate::models::ModelCatalog;

pub use routes::{ChatRequest, ErrorResponse, ModelsResponse, ServiceError};

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub headers: Arc<HeaderManager>,
    pub catalog: Arc<ModelCatalog>,
    pub client: Client,
    pub chat_url: String,
    pub catalog_updated_at: Option<DateTime<Utc>>,
}

impl AppState {
    pub fn new(
        headers: Arc<HeaderManager>,
        catalog: ModelCatalog,
        client: Client,
        chat_url: impl Into<String>,
    ) -> Self {
        Self {
            headers,
            catalog: Arc::new(catalog),
            client,
            chat_url: chat_url.into(),
            catalog_updated_at: None,
        }
    }

    pub fn with_catalog_updated_at(mut self, updated_at: Option<DateTime<Utc>>) -> Self {
        self.catalog_updated_at = updated_at;
        self
    }
}

/// Build the service router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(routes::chat))
        .route("/models", get(routes::models))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
