// Dispatch module - sends the rewritten request to the remote endpoint
//
// One bounded POST per call, no retries: retrying is a user decision made in
// the interactive loop, and the console snippet stays available for manual
// replay whatever happens here.

use crate::rewrite::RequestPayload;
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Why a dispatch did not produce an edited message.
///
/// Both variants are recoverable at the interaction level.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The endpoint answered, but not with 200
    #[error("response code {status}: {body}")]
    Http { status: u16, body: String },
    /// Timeout, refused connection, DNS failure, or an unreadable response
    #[error("network error while sending the request: {0}")]
    Transport(#[from] reqwest::Error),
}

/// HTTP client wrapper for replaying rewritten requests.
pub struct Dispatcher {
    client: reqwest::Client,
}

impl Dispatcher {
    /// Build a dispatcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    /// POST the payload to its endpoint.
    ///
    /// A 200 response is the only success; its body is parsed and returned.
    /// Everything else - other status codes, transport faults, unparseable
    /// response bodies - comes back as a [`DispatchError`].
    pub async fn send(&self, payload: &RequestPayload) -> Result<Value, DispatchError> {
        let response = self
            .client
            .post(&payload.endpoint)
            .headers(header_map(&payload.headers))
            .json(&payload.body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::OK {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "dispatch rejected");
            Err(DispatchError::Http {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Convert the captured headers into a reqwest header map.
///
/// Names or values that cannot be represented as HTTP headers are skipped
/// with a warning instead of aborting the whole dispatch.
fn header_map(headers: &BTreeMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => tracing::warn!("Skipping unrepresentable header: {}", name),
        }
    }
    map
}
