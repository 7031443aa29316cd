//! Single-page fetching and response classification
//!
//! [`PageFetcher`] issues exactly one GET per call through the transport,
//! interprets the response envelope, and classifies failures. Retries are
//! the pagination loop's responsibility, never this layer's.

mod types;

pub use types::{Cursor, PageEnvelope};

use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::types::{JsonValue, QueryParams};
use std::sync::Arc;
use tracing::debug;

/// Fetches and classifies one page at a time
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    auth_token: String,
}

impl PageFetcher {
    /// Create a fetcher over the given transport
    pub fn new(transport: Arc<dyn Transport>, auth_token: impl Into<String>) -> Self {
        Self {
            transport,
            auth_token: auth_token.into(),
        }
    }

    /// Fetch one page.
    ///
    /// Non-2xx responses are classified by their server-supplied error
    /// text; 2xx responses must parse into a [`PageEnvelope`].
    pub async fn fetch(&self, url: &str, params: &QueryParams) -> Result<PageEnvelope> {
        let query = params.as_pairs();
        let headers = [("Authorization", self.auth_token.as_str())];

        let response = self.transport.get(url, &query, &headers).await?;

        if !response.is_success() {
            return Err(classify_status(response.status, &response.body));
        }

        let envelope = PageEnvelope::parse(&response.body)?;
        debug!(%params, records = envelope.data.len(), "page fetched");
        Ok(envelope)
    }
}

impl std::fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFetcher").finish_non_exhaustive()
    }
}

/// Classify a non-2xx response.
///
/// The match runs case-insensitively over the status line and the
/// server-supplied error text (the JSON `error` field when the body
/// parses, else the raw body): "too many requests" is a rate limit,
/// "not found" a graceful end, anything else a generic status error.
fn classify_status(status: u16, body: &str) -> Error {
    let error_text = serde_json::from_str::<JsonValue>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(JsonValue::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("");

    let message = format!("{reason} {error_text}").trim().to_string();
    let haystack = message.to_lowercase();

    if haystack.contains("too many requests") {
        Error::rate_limited(status, message)
    } else if haystack.contains("not found") {
        Error::not_found(status, message)
    } else {
        Error::status(status, message)
    }
}
