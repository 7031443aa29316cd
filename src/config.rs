//! Client configuration
//!
//! Everything the engine needs to talk to a scraper gateway: base URL,
//! credential, concurrency and retry knobs, and transport options.

use crate::transport::ThrottleConfig;
use std::time::Duration;

/// Configuration for a [`ScraperClient`](crate::client::ScraperClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the scraper gateway
    pub base_url: String,
    /// Authorization credential sent with every request
    pub auth_token: String,
    /// Maximum number of page fetches in flight at once
    pub num_workers: usize,
    /// Retry budget per page
    pub max_retries: u32,
    /// Upstream sub-batch limit, sent as the `maxPages` query parameter
    pub max_pages: u32,
    /// Fixed sleep between retries of the same page
    pub retry_backoff: Duration,
    /// Per-request timeout (a timeout is a transient failure)
    pub request_timeout: Duration,
    /// Optional outbound HTTP(S) proxy URL
    pub proxy: Option<String>,
    /// Optional client-side request throttle
    pub throttle: Option<ThrottleConfig>,
    /// User agent string
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth_token: String::new(),
            num_workers: 10,
            max_retries: 3,
            max_pages: 10,
            retry_backoff: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            proxy: None,
            throttle: None,
            user_agent: format!("pageharvest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Create a config with the required fields set
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: auth_token.into(),
            ..Self::default()
        }
    }

    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`]
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the authorization credential
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.config.auth_token = token.into();
        self
    }

    /// Set the concurrency bound (values <= 30 are recommended)
    pub fn num_workers(mut self, workers: usize) -> Self {
        self.config.num_workers = workers;
        self
    }

    /// Set the per-page retry budget
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the upstream sub-batch limit (values <= 10 are recommended)
    pub fn max_pages(mut self, pages: u32) -> Self {
        self.config.max_pages = pages;
        self
    }

    /// Set the fixed backoff between retries
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.config.retry_backoff = backoff;
        self
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Route requests through an outbound proxy
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.config.proxy = Some(url.into());
        self
    }

    /// Enable client-side throttling
    pub fn throttle(mut self, config: ThrottleConfig) -> Self {
        self.config.throttle = Some(config);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
