// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat session client
//!
//! Sends the conversation to the chat endpoint and reassembles the streamed
//! answer. One exchange at a time: every method that touches the transcript
//! takes `&mut self`.
//!
//! An exchange either commits both the user input and the answer, or (on any
//! failure or cancellation) only the user input. A partial answer is never
//! recorded.

use std::pin::Pin;

use futures::{Stream, StreamExt};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};

use crate::auth::AuthHeaders;
use crate::error::{ApiError, DuckError, Result};
use crate::models::ModelId;

use super::conversation::Conversation;
use super::stream::{classify_error_event, decode_stream, StreamEvent};

/// Public chat endpoint
pub const DUCK_CHAT_URL: &str = "https://duckduckgo.com/duckchat/v1/chat";

type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// Client for one conversation with the chat endpoint
pub struct DuckChat {
    client: Client,
    endpoint: String,
    headers: AuthHeaders,
    conversation: Conversation,
}

impl DuckChat {
    /// Create a client for the public endpoint
    pub fn new(headers: AuthHeaders, model: ModelId) -> Self {
        Self::with_client(Client::new(), DUCK_CHAT_URL, headers, model)
    }

    /// Create a client with a preconfigured HTTP client and endpoint
    pub fn with_client(
        client: Client,
        endpoint: impl Into<String>,
        headers: AuthHeaders,
        model: ModelId,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            headers,
            conversation: Conversation::new(model),
        }
    }

    /// Replace the headers used for subsequent requests
    pub fn set_headers(&mut self, headers: AuthHeaders) {
        self.headers = headers;
    }

    pub fn headers(&self) -> &AuthHeaders {
        &self.headers
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask a question and wait for the full answer.
    pub async fn ask(&mut self, query: &str) -> Result<String> {
        self.conversation.add_input(query);
        self.answer_pending().await
    }

    /// Re-issue the request for the last, unanswered input without appending
    /// it again. Used after a failed exchange, e.g. once headers are refreshed.
    pub async fn resend(&mut self) -> Result<String> {
        if !self.conversation.awaiting_answer() {
            return Err(DuckError::Session(
                "no unanswered input to resend".to_string(),
            ));
        }
        self.answer_pending().await
    }

    /// Ask a question and stream the answer fragments as they arrive.
    ///
    /// Nothing is sent until the stream is first polled. The full answer is
    /// committed once the stream is exhausted; dropping the stream early
    /// leaves only the user input in the transcript. An error event ends the
    /// stream with the classified error; fragments already yielded stand.
    pub fn ask_stream<'a>(
        &'a mut self,
        query: &str,
    ) -> impl Stream<Item = Result<String>> + Send + 'a {
        let query = query.to_string();
        let this = self;

        async_stream::try_stream! {
            this.conversation.add_input(query);

            let mut answer = String::new();
            let mut events = this.open_stream().await?;
            while let Some(event) = events.next().await {
                let event = event?;
                if let Some(err) = classify_error_event(&event) {
                    tracing::debug!("error event in stream: {}", err);
                    Err::<(), DuckError>(DuckError::Api(err))?;
                }
                let fragment = event.message().unwrap_or_default().to_string();
                answer.push_str(&fragment);
                yield fragment;
            }
            drop(events);

            this.conversation.add_answer(answer);
        }
    }

    async fn answer_pending(&mut self) -> Result<String> {
        let answer = self.collect_answer().await?;
        self.conversation.add_answer(answer.clone());
        Ok(answer)
    }

    /// Drain one response, concatenating fragments. Any error event aborts
    /// the whole exchange.
    async fn collect_answer(&self) -> Result<String> {
        let mut events = self.open_stream().await?;
        let mut answer = String::new();

        while let Some(event) = events.next().await {
            let event = event?;
            if let Some(err) = classify_error_event(&event) {
                tracing::debug!("error event in stream: {}", err);
                return Err(err.into());
            }
            answer.push_str(event.message().unwrap_or_default());
        }

        Ok(answer)
    }

    /// Send the serialized conversation and return the decoded event stream.
    async fn open_stream(&self) -> Result<EventStream> {
        let mut headers = self.headers.to_header_map()?;
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let body = self.conversation.serialize()?;
        tracing::debug!(
            model = %self.conversation.model(),
            turns = self.conversation.len(),
            "sending chat request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| DuckError::Api(ApiError::Network(e.to_string())))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited.into());
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::ServerError {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        Ok(Box::pin(decode_stream(response.bytes_stream())))
    }
}
