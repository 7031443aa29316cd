//! HTTP transport
//!
//! The engine talks to the network through the [`Transport`] trait: one
//! GET per call, no retries, no response interpretation. [`HttpTransport`]
//! is the reqwest-backed implementation; tests substitute their own.

mod throttle;

pub use throttle::{Throttle, ThrottleConfig};

use crate::config::ClientConfig;
use crate::error::Result;
use async_trait::async_trait;

/// One raw HTTP response: status code plus decoded body text
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body, decoded to text
    pub body: String,
}

impl TransportResponse {
    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Pluggable HTTP dependency: performs exactly one GET per call.
///
/// Retries and backoff are the pagination loop's responsibility, and
/// envelope interpretation is the page fetcher's; implementations do
/// neither.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one GET with the given query pairs and headers
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<TransportResponse>;
}

/// reqwest-backed [`Transport`] with timeout, proxy, and optional throttle
pub struct HttpTransport {
    client: reqwest::Client,
    throttle: Option<Throttle>,
}

impl HttpTransport {
    /// Build a transport from the client configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent);

        if let Some(proxy_url) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        let client = builder.build()?;
        let throttle = config.throttle.as_ref().map(Throttle::new);

        Ok(Self { client, throttle })
    }

    /// Whether client-side throttling is enabled
    pub fn has_throttle(&self) -> bool {
        self.throttle.is_some()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<TransportResponse> {
        if let Some(throttle) = &self.throttle {
            throttle.wait().await;
        }

        let mut req = self.client.get(url).query(query);
        for (key, value) in headers {
            req = req.header(*key, *value);
        }

        let response = req.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(TransportResponse { status, body })
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("has_throttle", &self.throttle.is_some())
            .finish_non_exhaustive()
    }
}
