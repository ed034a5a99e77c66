// Parser module - turns a captured fetch snippet into a validated record
//
// The input is the text a browser devtools "Copy as fetch" action produces:
// a fetch() call whose arguments embed the endpoint URL, a headers object and
// the stringified request body. Rather than pattern-scanning the whole
// snippet, the well-delimited substrings (the balanced headers object, the
// body string literal) are located structurally and then handed to serde_json,
// so nested braces and escape sequences inside values parse correctly.

pub mod models;

use models::CapturedRequest;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Why a capture could not be turned into a [`CapturedRequest`].
///
/// All variants are recoverable: the caller reports the diagnostic and lets
/// the user recapture. No partially-populated record is ever produced.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The text does not contain a fetch() call at all
    #[error("no fetch() call found in the copied text")]
    NotACapture,
    /// A fetch() call is present but does not target a channel messages endpoint
    #[error("the request does not target a channel messages endpoint")]
    UnrecognizedEndpoint,
    #[error("could not parse the request headers: {0}")]
    MalformedHeaders(String),
    #[error("could not parse the request body: {0}")]
    MalformedBody(String),
    /// The body parsed but carries no nonce - a different request type was copied
    #[error("the request body has no nonce field; copy the send-message request")]
    MissingNonce,
}

/// Quick shape check used by the interactive loop before full extraction.
pub fn looks_like_capture(text: &str) -> bool {
    text.trim_start().starts_with("fetch(")
}

/// Extracts [`CapturedRequest`] records from fetch snippets.
pub struct Extractor {
    endpoint_re: Regex,
}

impl Extractor {
    pub fn new() -> Self {
        // The only endpoint this tool recognizes: the versioned channel
        // messages route, with the channel id captured for link building.
        let endpoint_re =
            Regex::new(r#"fetch\(\s*["'](https://discord\.com/api/v\d+/channels/(\d+)/messages)["']"#)
                .expect("endpoint pattern compiles");
        Self { endpoint_re }
    }

    /// Parse `raw` into a validated record.
    pub fn extract(&self, raw: &str) -> Result<CapturedRequest, ExtractError> {
        if !raw.contains("fetch(") {
            return Err(ExtractError::NotACapture);
        }

        let caps = self
            .endpoint_re
            .captures(raw)
            .ok_or(ExtractError::UnrecognizedEndpoint)?;
        let endpoint = caps[1].to_string();
        let channel_id = caps[2].to_string();

        let headers = parse_headers(raw)?;
        let body = parse_body(raw)?;

        let nonce = body.get("nonce").ok_or(ExtractError::MissingNonce)?;
        let original_nonce = json_display(nonce);
        let original_content = body
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        tracing::debug!(endpoint = %endpoint, nonce = %original_nonce, "capture extracted");

        Ok(CapturedRequest {
            endpoint,
            channel_id,
            headers,
            body,
            original_nonce,
            original_content,
        })
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Locate the headers object and parse it into a name -> value map.
fn parse_headers(raw: &str) -> Result<BTreeMap<String, String>, ExtractError> {
    let after_key = find_key(raw, "headers")
        .ok_or_else(|| ExtractError::MalformedHeaders("no headers object in the capture".into()))?;
    let block = balanced_object(raw, after_key)
        .ok_or_else(|| ExtractError::MalformedHeaders("unterminated headers object".into()))?;

    // Strict parse first; fall back to single-quote normalization, since some
    // capture tools emit JS-style quoting instead of JSON.
    match serde_json::from_str(block) {
        Ok(headers) => Ok(headers),
        Err(_) => serde_json::from_str(&block.replace('\'', "\""))
            .map_err(|e| ExtractError::MalformedHeaders(e.to_string())),
    }
}

/// Locate the stringified body, unescape it and parse the inner object.
fn parse_body(raw: &str) -> Result<Map<String, Value>, ExtractError> {
    let after_key = find_key(raw, "body")
        .ok_or_else(|| ExtractError::MalformedBody("no body field in the capture".into()))?;
    let literal = string_literal(raw, after_key)
        .ok_or_else(|| ExtractError::MalformedBody("body is not a quoted string".into()))?;

    // The literal is itself valid JSON; parsing it as a string undoes the
    // escaping exactly, whatever the capture tool escaped.
    let unescaped: String = serde_json::from_str(literal)
        .map_err(|e| ExtractError::MalformedBody(format!("invalid body escaping: {e}")))?;

    serde_json::from_str(&unescaped)
        .map_err(|e| ExtractError::MalformedBody(format!("body is not a JSON object: {e}")))
}

/// Find `"key":` (or `'key':`) and return the offset just past the colon.
fn find_key(text: &str, key: &str) -> Option<usize> {
    for quote in ['"', '\''] {
        let needle = format!("{quote}{key}{quote}");
        let mut from = 0;
        while let Some(pos) = text[from..].find(&needle) {
            let after = from + pos + needle.len();
            let rest = &text[after..];
            let trimmed = rest.trim_start();
            if trimmed.starts_with(':') {
                return Some(after + (rest.len() - trimmed.len()) + 1);
            }
            from = after;
        }
    }
    None
}

/// Return the balanced `{...}` substring starting at the first `{` at or
/// after `start`. Braces inside quoted strings do not count, so header
/// values containing `{` or `}` are handled.
fn balanced_object(text: &str, start: usize) -> Option<&str> {
    let begin = start + text[start..].find('{')?;
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in text[begin..].char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_string = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => in_string = Some(ch),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[begin..begin + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Return the double-quoted string literal starting at the first `"` at or
/// after `start`, quotes included, honoring backslash escapes.
fn string_literal(text: &str, start: usize) -> Option<&str> {
    let begin = start + text[start..].find('"')?;
    let mut escaped = false;

    for (i, ch) in text[begin + 1..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => return Some(&text[begin..begin + 1 + i + 1]),
            _ => {}
        }
    }
    None
}

/// Render a JSON value for display: strings bare, everything else as JSON.
fn json_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
