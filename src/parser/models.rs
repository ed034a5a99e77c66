// Data model for a captured send-message request
//
// A CapturedRequest only comes out of Extractor::extract and is never
// mutated afterwards: the rewrite stage deep-copies the body it needs.
// Unknown body fields are kept verbatim so the replayed request carries
// whatever else the client sent (tts, flags, ...).

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A validated send-message request lifted out of a "Copy as fetch" snippet.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// Full messages-endpoint URL the snippet targeted
    pub endpoint: String,
    /// Numeric channel id extracted from the endpoint path
    pub channel_id: String,
    /// Request headers as captured; opaque except for the referrer lookup
    pub headers: BTreeMap<String, String>,
    /// Parsed request body; guaranteed to contain a `nonce` key
    pub body: Map<String, Value>,
    /// `body.nonce` as seen at parse time
    pub original_nonce: String,
    /// `body.content` as seen at parse time, empty string when absent
    pub original_content: String,
}

impl CapturedRequest {
    /// Referrer to replay with, when the capture carried one.
    ///
    /// Browsers emit the header as `referer`; some capture tools spell it
    /// `referrer`. Either is accepted.
    pub fn referrer(&self) -> Option<&str> {
        self.headers
            .get("referer")
            .or_else(|| self.headers.get("referrer"))
            .map(String::as_str)
    }
}
