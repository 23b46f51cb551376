// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::StreamExt;
use reqwest::Client;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use duckchat::auth::manager::load_store;
use duckchat::auth::{AuthHeaders, HeaderManager, HeaderSource};
use duckchat::chat::{ask_with_refresh, DuckChat, Message};
use duckchat::error::{ApiError, DuckError, Result};
use duckchat::models::ModelCatalog;
use duckchat::service::{create_router, AppState};

const CHALLENGE: &str = "data: {\"action\":\"error\",\"type\":\"ERR_CHALLENGE\"}\ndata: [DONE]\n";

/// Hands out `fresh-1`, `fresh-2`, ... and counts captures
#[derive(Default)]
struct CountingSource {
    calls: AtomicUsize,
}

#[async_trait]
impl HeaderSource for CountingSource {
    async fn fetch_headers(&self) -> Result<AuthHeaders> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(AuthHeaders::from_iter([(
            "x-vqd-hash-1",
            format!("fresh-{}", n),
        )]))
    }
}

fn stale() -> AuthHeaders {
    AuthHeaders::from_iter([("x-vqd-hash-1", "stale"), ("user-agent", "test-agent")])
}

fn endpoint(server: &MockServer) -> String {
    format!("{}/duckchat/v1/chat", server.uri())
}

fn sse(parts: &[&str]) -> String {
    let mut body = String::new();
    for part in parts {
        body.push_str("data: ");
        body.push_str(part);
        body.push_str("\n\n");
    }
    body
}

#[tokio::test]
async fn test_two_exchanges_send_full_history() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/duckchat/v1/chat"))
        .and(body_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [{"role": "user", "content": "Hello!"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse(&[
            "{\"role\":\"assistant\",\"message\":\"Hi\"}",
            "[PING]",
            "{\"message\":\" there\"}",
            "[DONE]",
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/duckchat/v1/chat"))
        .and(body_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "user", "content": "Hello!"},
                {"role": "assistant", "content": "Hi there"},
                {"role": "user", "content": "How are you?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse(&[
            "[CHAT_TITLE:Greetings]",
            "{\"message\":\"Fine.\"}",
            "[DONE]",
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut duck = DuckChat::with_client(
        Client::new(),
        endpoint(&server),
        stale(),
        ModelCatalog::default().default_model(),
    );

    assert_eq!(duck.ask("Hello!").await.unwrap(), "Hi there");
    assert_eq!(duck.ask("How are you?").await.unwrap(), "Fine.");
    assert_eq!(
        duck.conversation().messages(),
        &[
            Message::user("Hello!"),
            Message::assistant("Hi there"),
            Message::user("How are you?"),
            Message::assistant("Fine."),
        ]
    );
}

#[tokio::test]
async fn test_stream_then_ask_shares_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sse(&[
            "{\"message\":\"a\"}",
            "{\"message\":\"b\"}",
            "{\"message\":\"c\"}",
            "[DONE]",
        ])))
        .mount(&server)
        .await;

    let mut duck = DuckChat::with_client(
        Client::new(),
        endpoint(&server),
        stale(),
        ModelCatalog::default().default_model(),
    );

    let fragments: Vec<String> = duck
        .ask_stream("letters")
        .map(|f| f.unwrap())
        .collect()
        .await;
    assert_eq!(fragments, vec!["a", "b", "c"]);
    assert_eq!(duck.conversation().len(), 2);

    assert_eq!(duck.ask("again").await.unwrap(), "abc");
    assert_eq!(duck.conversation().len(), 4);
}

#[tokio::test]
async fn test_malformed_record_aborts_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("data: {\"message\":\"ok\"}\ndata: {\"message\": \n"),
        )
        .mount(&server)
        .await;

    let mut duck = DuckChat::with_client(
        Client::new(),
        endpoint(&server),
        stale(),
        ModelCatalog::default().default_model(),
    );

    let err = duck.ask("q").await.unwrap_err();
    assert!(matches!(
        err,
        DuckError::Api(ApiError::MalformedEvent(ref body)) if body.contains("message")
    ));
    assert_eq!(duck.conversation().messages(), &[Message::user("q")]);
}

#[tokio::test]
async fn test_refresh_through_manager_persists_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-vqd-hash-1", "stale"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHALLENGE))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-vqd-hash-1", "fresh-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(sse(&["{\"message\":\"ok\"}", "[DONE]"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let store = temp.path().join("headers.json");
    let source = Arc::new(CountingSource::default());
    let manager = HeaderManager::with_headers(source.clone(), Some(store.clone()), stale());

    let mut duck = DuckChat::with_client(
        Client::new(),
        endpoint(&server),
        manager.current().await,
        ModelCatalog::default().default_model(),
    );
    let answer = ask_with_refresh(&mut duck, &manager, "Hello!").await.unwrap();

    assert_eq!(answer, "ok");
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        duck.conversation().messages(),
        &[Message::user("Hello!"), Message::assistant("ok")]
    );
    let stored = load_store(&store).unwrap().unwrap();
    assert_eq!(stored.get("x-vqd-hash-1"), Some("fresh-1"));
}

#[tokio::test]
async fn test_service_requests_share_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-vqd-hash-1", "stale"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHALLENGE))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-vqd-hash-1", "fresh-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(sse(&["{\"message\":\"ok\"}", "[DONE]"])),
        )
        .mount(&server)
        .await;

    let source = Arc::new(CountingSource::default());
    let manager = Arc::new(HeaderManager::with_headers(source.clone(), None, stale()));
    let app = create_router(AppState::new(
        manager,
        ModelCatalog::default(),
        Client::new(),
        endpoint(&server),
    ));

    let requests = (0..3).map(|_| {
        let app = app.clone();
        async move {
            let response = app
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/chat")
                        .header("content-type", "application/json")
                        .body(Body::from(r#"{"content": "Hello!"}"#))
                        .unwrap(),
                )
                .await
                .unwrap();
            response.status()
        }
    });

    let statuses = futures::future::join_all(requests).await;
    assert!(statuses.iter().all(|s| *s == StatusCode::OK));
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}
