// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Event-stream decoding for chat responses
//!
//! The response body is line oriented. Data lines look like
//! `data: {"message":"Hi"}`, interleaved with control lines:
//!
//! - `data: [DONE]` ends the stream
//! - `data: [PING]` is a keep-alive
//! - `data: [CHAT_TITLE:...]` carries the generated chat title
//!
//! Everything else must be a JSON object. Unparseable records are an error,
//! never dropped.

use futures::{Stream, StreamExt};
use serde_json::{Map, Value};

use crate::error::{ApiError, DuckError, Result};

const DATA_PREFIX: &str = "data: ";
const DONE_MARKER: &str = "[DONE]";
const PING_MARKER: &str = "[PING]";
const TITLE_MARKER: &str = "[CHAT_TITLE:";

const ERR_CONVERSATION_LIMIT: &str = "ERR_CONVERSATION_LIMIT";
const ERR_CHALLENGE: &str = "ERR_CHALLENGE";

/// One decoded record. The upstream schema is not fixed, so this keeps the
/// whole JSON object and only exposes the fields the protocol relies on.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent(Map<String, Value>);

impl StreamEvent {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// `action` field, e.g. `"error"`
    pub fn action(&self) -> Option<&str> {
        self.0.get("action").and_then(Value::as_str)
    }

    /// `type` field
    pub fn event_type(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// `message` field, the answer fragment
    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    pub fn is_error(&self) -> bool {
        self.action() == Some("error")
    }
}

/// Outcome of decoding a single line
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// Blank line or control record, nothing to yield
    Skip,
    /// Terminal marker
    Done,
    /// A data record
    Event(StreamEvent),
}

/// Decode one line of the body. The line may still carry its terminator.
pub fn decode_line(line: &str) -> std::result::Result<Line, ApiError> {
    if line.trim().is_empty() {
        return Ok(Line::Skip);
    }
    let line = line.trim_end_matches(['\r', '\n']);

    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return parse_record(line).map(Line::Event);
    };

    if payload.starts_with(DONE_MARKER) {
        tracing::debug!("end of stream");
        return Ok(Line::Done);
    }
    if payload.starts_with(PING_MARKER) {
        tracing::debug!("keep-alive");
        return Ok(Line::Skip);
    }
    if payload.starts_with(TITLE_MARKER) && payload.ends_with(']') {
        tracing::debug!("chat title: {}", &payload[TITLE_MARKER.len()..payload.len() - 1]);
        return Ok(Line::Skip);
    }

    parse_record(payload).map(Line::Event)
}

fn parse_record(payload: &str) -> std::result::Result<StreamEvent, ApiError> {
    serde_json::from_str::<Map<String, Value>>(payload)
        .map(StreamEvent)
        .map_err(|_| ApiError::MalformedEvent(payload.to_string()))
}

/// Map an error event to its classification. Returns `None` for any event
/// whose `action` is not `"error"`.
pub fn classify_error_event(event: &StreamEvent) -> Option<ApiError> {
    if !event.is_error() {
        return None;
    }

    let err_message = match event.event_type() {
        Some(t) => t.to_string(),
        None => Value::Object(event.0.clone()).to_string(),
    };

    Some(match err_message.as_str() {
        ERR_CONVERSATION_LIMIT => ApiError::ConversationLimit,
        ERR_CHALLENGE => ApiError::Challenge,
        _ => ApiError::Service(err_message),
    })
}

/// Bytes of one line as text. Invalid UTF-8 makes the whole record malformed.
fn line_text(raw: Vec<u8>) -> std::result::Result<String, ApiError> {
    String::from_utf8(raw).map_err(|e| {
        let lossy = String::from_utf8_lossy(e.as_bytes());
        ApiError::MalformedEvent(lossy.trim_end_matches(['\r', '\n']).to_string())
    })
}

/// Turn a response body into a lazy stream of events.
///
/// Chunks are reassembled into lines, so a record may be split across any
/// number of network reads. The stream ends at `[DONE]` or when the body ends;
/// a missing `[DONE]` is not an error. The body is dropped together with the
/// returned stream.
pub fn decode_stream<S, B, E>(body: S) -> impl Stream<Item = Result<StreamEvent>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    async_stream::try_stream! {
        let mut body = Box::pin(body);
        let mut buffer: Vec<u8> = Vec::new();
        let mut finished = false;

        'body: while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| DuckError::Api(ApiError::Stream(e.to_string())))?;
            buffer.extend_from_slice(chunk.as_ref());

            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let raw: Vec<u8> = buffer.drain(..=pos).collect();
                let line = line_text(raw).map_err(DuckError::Api)?;
                match decode_line(&line).map_err(DuckError::Api)? {
                    Line::Skip => {}
                    Line::Done => {
                        finished = true;
                        break 'body;
                    }
                    Line::Event(event) => yield event,
                }
            }
        }

        // Body ended without a newline after the last record
        if !finished && !buffer.is_empty() {
            let line = line_text(std::mem::take(&mut buffer)).map_err(DuckError::Api)?;
            if let Line::Event(event) = decode_line(&line).map_err(DuckError::Api)? {
                yield event;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::stream;
    use proptest::prelude::*;

    fn event(json: &str) -> StreamEvent {
        StreamEvent::new(serde_json::from_str(json).unwrap())
    }

    fn chunks(parts: &[&str]) -> impl Stream<Item = std::result::Result<Vec<u8>, String>> {
        let owned: Vec<_> = parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(owned)
    }

    fn collect(parts: &[&str]) -> Vec<Result<StreamEvent>> {
        block_on(decode_stream(chunks(parts)).collect::<Vec<_>>())
    }

    #[test]
    fn test_decode_line_blank_variants() {
        for line in ["\n", "\r", "\r\n", "   \n"] {
            assert_eq!(decode_line(line).unwrap(), Line::Skip);
        }
    }

    #[test]
    fn test_decode_line_done() {
        assert_eq!(decode_line("data: [DONE]\n").unwrap(), Line::Done);
        assert_eq!(decode_line("data: [DONE][LIMIT_CONVERSATION]\n").unwrap(), Line::Done);
    }

    #[test]
    fn test_decode_line_ping() {
        assert_eq!(decode_line("data: [PING]\n").unwrap(), Line::Skip);
    }

    #[test]
    fn test_decode_line_chat_title() {
        assert_eq!(
            decode_line("data: [CHAT_TITLE:Greetings]\n").unwrap(),
            Line::Skip
        );
    }

    #[test]
    fn test_decode_line_unterminated_title_is_malformed() {
        let err = decode_line("data: [CHAT_TITLE:Greet\n").unwrap_err();
        assert_eq!(err, ApiError::MalformedEvent("[CHAT_TITLE:Greet".to_string()));
    }

    #[test]
    fn test_decode_line_data_record() {
        let line = decode_line("data: {\"message\":\"Hi\",\"id\":\"x\"}\n").unwrap();
        let Line::Event(ev) = line else {
            panic!("expected event");
        };
        assert_eq!(ev.message(), Some("Hi"));
        assert_eq!(ev.get("id"), Some(&Value::String("x".to_string())));
    }

    #[test]
    fn test_decode_line_bare_record() {
        let line = decode_line("{\"action\":\"error\",\"type\":\"ERR_CHALLENGE\"}\n").unwrap();
        assert!(matches!(line, Line::Event(ref ev) if ev.is_error()));
    }

    #[test]
    fn test_decode_line_malformed_keeps_payload() {
        let err = decode_line("data: {oops\n").unwrap_err();
        assert_eq!(err, ApiError::MalformedEvent("{oops".to_string()));
    }

    #[test]
    fn test_decode_line_non_object_is_malformed() {
        assert!(decode_line("data: 42\n").is_err());
        assert!(decode_line("data: [\"a\"]\n").is_err());
    }

    #[test]
    fn test_event_accessors_missing_fields() {
        let ev = event(r#"{"role":"assistant"}"#);
        assert_eq!(ev.action(), None);
        assert_eq!(ev.event_type(), None);
        assert_eq!(ev.message(), None);
        assert!(!ev.is_error());
    }

    #[test]
    fn test_classify_conversation_limit() {
        let ev = event(r#"{"action":"error","type":"ERR_CONVERSATION_LIMIT"}"#);
        assert_eq!(classify_error_event(&ev), Some(ApiError::ConversationLimit));
    }

    #[test]
    fn test_classify_challenge() {
        let ev = event(r#"{"action":"error","type":"ERR_CHALLENGE","status":418}"#);
        assert_eq!(classify_error_event(&ev), Some(ApiError::Challenge));
    }

    #[test]
    fn test_classify_other_type() {
        let ev = event(r#"{"action":"error","type":"ERR_INPUT_LIMIT"}"#);
        assert_eq!(
            classify_error_event(&ev),
            Some(ApiError::Service("ERR_INPUT_LIMIT".to_string()))
        );
    }

    #[test]
    fn test_classify_without_type_uses_whole_event() {
        let ev = event(r#"{"action":"error","status":500}"#);
        let Some(ApiError::Service(detail)) = classify_error_event(&ev) else {
            panic!("expected service error");
        };
        let parsed: Value = serde_json::from_str(&detail).unwrap();
        assert_eq!(parsed["status"], 500);
        assert_eq!(parsed["action"], "error");
    }

    #[test]
    fn test_classify_non_error_event() {
        assert_eq!(classify_error_event(&event(r#"{"message":"Hi"}"#)), None);
        assert_eq!(
            classify_error_event(&event(r#"{"action":"success","message":"Hi"}"#)),
            None
        );
    }

    #[test]
    fn test_decode_stream_stops_at_done() {
        let events = collect(&[
            "data: {\"message\":\"Hi\"}\n",
            "data: {\"message\":\" there\"}\n",
            "data: [DONE]\n",
            "data: {not even json}\n",
        ]);
        let messages: Vec<_> = events
            .into_iter()
            .map(|e| e.unwrap().message().unwrap_or_default().to_string())
            .collect();
        assert_eq!(messages, vec!["Hi", " there"]);
    }

    #[test]
    fn test_decode_stream_filters_noise() {
        let events = collect(&[
            "data: [PING]\n",
            "\n",
            "data: {\"message\":\"a\"}\n",
            "\r\n",
            "data: [CHAT_TITLE:Small talk]\n",
            "data: {\"message\":\"b\"}\n",
            "data: [DONE]\n",
        ]);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_decode_stream_records_split_across_chunks() {
        let events = collect(&["da", "ta: {\"mess", "age\":\"Hé", "llo\"}\ndata: [DO", "NE]\n"]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().message(), Some("Héllo"));
    }

    #[test]
    fn test_decode_stream_multibyte_char_split_across_chunks() {
        let bytes = "data: {\"message\":\"ü\"}\n".as_bytes().to_vec();
        let split = bytes.iter().position(|b| *b > 0x7f).unwrap() + 1;
        let parts: Vec<std::result::Result<Vec<u8>, String>> =
            vec![Ok(bytes[..split].to_vec()), Ok(bytes[split..].to_vec())];
        let events = block_on(decode_stream(stream::iter(parts)).collect::<Vec<_>>());
        assert_eq!(events[0].as_ref().unwrap().message(), Some("ü"));
    }

    #[test]
    fn test_decode_stream_without_done_ends_cleanly() {
        let events = collect(&["data: {\"message\":\"a\"}\n", "data: {\"message\":\"b\"}"]);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.is_ok()));
    }

    #[test]
    fn test_decode_stream_malformed_fails() {
        let events = collect(&["data: {\"message\":\"a\"}\n", "data: garbage\n", "data: [DONE]\n"]);
        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert!(matches!(
            events[1],
            Err(DuckError::Api(ApiError::MalformedEvent(ref p))) if p == "garbage"
        ));
    }

    #[test]
    fn test_decode_stream_invalid_utf8_is_malformed() {
        let mut record = b"data: {\"message\":\"a".to_vec();
        record.push(0xff);
        record.extend_from_slice(b"b\"}\ndata: [DONE]\n");
        let parts: Vec<std::result::Result<Vec<u8>, String>> = vec![Ok(record)];

        let events = block_on(decode_stream(stream::iter(parts)).collect::<Vec<_>>());
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Err(DuckError::Api(ApiError::MalformedEvent(ref p))) if p.starts_with("data: {\"message\":\"a")
        ));
    }

    #[test]
    fn test_decode_stream_invalid_utf8_in_trailing_line() {
        let parts: Vec<std::result::Result<Vec<u8>, String>> = vec![
            Ok(b"data: {\"message\":\"ok\"}\n".to_vec()),
            Ok(vec![b'd', b'a', b't', b'a', b':', b' ', 0xc3]),
        ];

        let events = block_on(decode_stream(stream::iter(parts)).collect::<Vec<_>>());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap().message(), Some("ok"));
        assert!(matches!(
            events[1],
            Err(DuckError::Api(ApiError::MalformedEvent(_)))
        ));
    }

    #[test]
    fn test_decode_stream_transport_error() {
        let parts: Vec<std::result::Result<Vec<u8>, String>> = vec![
            Ok(b"data: {\"message\":\"a\"}\n".to_vec()),
            Err("connection reset".to_string()),
        ];
        let events = block_on(decode_stream(stream::iter(parts)).collect::<Vec<_>>());
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[1],
            Err(DuckError::Api(ApiError::Stream(ref m))) if m.contains("connection reset")
        ));
    }

    #[test]
    fn test_decode_stream_empty_body() {
        assert!(collect(&[]).is_empty());
    }

    fn body_for(messages: &[String]) -> String {
        let mut body = String::from("data: [CHAT_TITLE:Test]\n");
        for (i, m) in messages.iter().enumerate() {
            if i % 2 == 0 {
                body.push_str("data: [PING]\n\n");
            }
            let record = serde_json::json!({ "role": "assistant", "message": m });
            body.push_str(&format!("data: {}\n", record));
        }
        body.push_str("data: {\"role\":\"assistant\"}\n");
        body.push_str("data: [DONE]\n");
        body
    }

    proptest! {
        #[test]
        fn prop_reassembly_matches_concatenation(
            messages in prop::collection::vec(any::<String>(), 0..20),
            cut in 1usize..64,
        ) {
            let body = body_for(&messages).into_bytes();
            let parts: Vec<std::result::Result<Vec<u8>, String>> =
                body.chunks(cut).map(|c| Ok(c.to_vec())).collect();

            let answer: String = block_on(decode_stream(stream::iter(parts)).collect::<Vec<_>>())
                .into_iter()
                .map(|e| e.unwrap().message().unwrap_or_default().to_string())
                .collect();

            prop_assert_eq!(answer, messages.concat());
        }
    }
}
