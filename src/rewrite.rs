// Rewrite module - splices replacement content and id into a captured request
//
// This is the single semantic move of the whole tool: the nonce, normally a
// client-side dedup token for a freshly sent message, is overwritten with the
// id of an existing message. The remote service then treats the send as an
// edit of that message and never produces the edited marker.
//
// The transformation is pure: the captured record is read, never written,
// and identical inputs produce byte-identical output.

use crate::parser::models::CapturedRequest;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Referrer used when the capture did not carry one.
pub const DEFAULT_REFERRER: &str = "https://discord.com/channels/@me";

/// The rewritten request, ready for direct dispatch.
#[derive(Debug, Clone)]
pub struct RequestPayload {
    pub endpoint: String,
    pub headers: BTreeMap<String, String>,
    pub body: Map<String, Value>,
}

/// Both materializations of the rewritten request.
#[derive(Debug, Clone)]
pub struct RewrittenRequest {
    /// Self-contained fetch() text, replayable in a browser console
    pub fetch_snippet: String,
    /// The same request in structured form for the dispatcher
    pub payload: RequestPayload,
}

/// Produce the edit request for `captured` with `new_content` as the message
/// text and `new_id` in place of the nonce.
///
/// `new_id` must be non-empty; the interactive flow rejects empty ids before
/// this point.
pub fn rewrite(captured: &CapturedRequest, new_content: &str, new_id: &str) -> RewrittenRequest {
    let mut body = captured.body.clone();
    body.insert("content".to_string(), Value::String(new_content.to_string()));
    body.insert("nonce".to_string(), Value::String(new_id.to_string()));

    let fetch_snippet = render_fetch(captured, &body);

    RewrittenRequest {
        fetch_snippet,
        payload: RequestPayload {
            endpoint: captured.endpoint.clone(),
            headers: captured.headers.clone(),
            body,
        },
    }
}

/// Render the console form of the request.
///
/// The body is embedded as a real JSON string literal, so unescaping it
/// recovers the body byte for byte - the snippet itself is a valid capture.
fn render_fetch(captured: &CapturedRequest, body: &Map<String, Value>) -> String {
    let headers_value: Value = Value::Object(
        captured
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    );
    let headers_pretty = serde_json::to_string_pretty(&headers_value)
        .unwrap_or_else(|_| headers_value.to_string());

    let body_literal = Value::String(Value::Object(body.clone()).to_string()).to_string();
    let referrer = captured.referrer().unwrap_or(DEFAULT_REFERRER);

    format!(
        "fetch(\"{url}\", {{\n  \"headers\": {headers},\n  \"referrer\": \"{referrer}\",\n  \"referrerPolicy\": \"strict-origin-when-cross-origin\",\n  \"body\": {body},\n  \"method\": \"POST\",\n  \"mode\": \"cors\",\n  \"credentials\": \"include\"\n}});",
        url = captured.endpoint,
        headers = headers_pretty,
        referrer = referrer,
        body = body_literal,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Extractor;

    const CAPTURE: &str = r#"fetch("https://discord.com/api/v9/channels/123/messages", {"headers": {"authorization": "X"}, "body": "{\"content\":\"hi\",\"nonce\":\"111\",\"tts\":false}"})"#;

    fn captured() -> CapturedRequest {
        Extractor::new().extract(CAPTURE).unwrap()
    }

    #[test]
    fn content_and_nonce_are_replaced() {
        let rewritten = rewrite(&captured(), "bye", "999");
        assert_eq!(rewritten.payload.body["content"], "bye");
        assert_eq!(rewritten.payload.body["nonce"], "999");
        assert_eq!(
            rewritten.payload.endpoint,
            "https://discord.com/api/v9/channels/123/messages"
        );
        // untouched fields survive
        assert_eq!(rewritten.payload.body["tts"], false);
        assert_eq!(rewritten.payload.headers["authorization"], "X");
    }

    #[test]
    fn the_captured_record_is_not_mutated() {
        let original = captured();
        let _ = rewrite(&original, "bye", "999");
        assert_eq!(original.body["content"], "hi");
        assert_eq!(original.body["nonce"], "111");
        assert_eq!(original.original_nonce, "111");
    }

    #[test]
    fn rewriting_is_deterministic() {
        let original = captured();
        let first = rewrite(&original, "bye", "999");
        let second = rewrite(&original, "bye", "999");
        assert_eq!(first.fetch_snippet, second.fetch_snippet);
        assert_eq!(first.payload.body, second.payload.body);
    }

    #[test]
    fn snippet_round_trips_through_extraction() {
        let rewritten = rewrite(&captured(), "say \"hi\"\nagain", "424242");
        let reparsed = Extractor::new().extract(&rewritten.fetch_snippet).unwrap();
        assert_eq!(reparsed.original_content, "say \"hi\"\nagain");
        assert_eq!(reparsed.original_nonce, "424242");
        assert_eq!(reparsed.endpoint, "https://discord.com/api/v9/channels/123/messages");
    }

    #[test]
    fn snippet_uses_the_default_referrer_when_none_captured() {
        let rewritten = rewrite(&captured(), "bye", "999");
        assert!(rewritten
            .fetch_snippet
            .contains(r#""referrer": "https://discord.com/channels/@me""#));
    }

    #[test]
    fn snippet_reuses_a_captured_referrer() {
        let raw = r#"fetch("https://discord.com/api/v9/channels/123/messages", {"headers": {"referer": "https://discord.com/channels/@me/123"}, "body": "{\"nonce\":\"1\"}"})"#;
        let original = Extractor::new().extract(raw).unwrap();
        let rewritten = rewrite(&original, "bye", "999");
        assert!(rewritten
            .fetch_snippet
            .contains(r#""referrer": "https://discord.com/channels/@me/123""#));
    }

    #[test]
    fn snippet_replays_credentialed_and_cross_origin() {
        let rewritten = rewrite(&captured(), "bye", "999");
        assert!(rewritten.fetch_snippet.contains(r#""method": "POST""#));
        assert!(rewritten.fetch_snippet.contains(r#""mode": "cors""#));
        assert!(rewritten.fetch_snippet.contains(r#""credentials": "include""#));
        assert!(rewritten.fetch_snippet.ends_with("});"));
    }
}
