//! Scraper client façade
//!
//! Maps resource descriptors onto query parameter sets and delegates the
//! actual work to the worker pool. No retry or cursor logic lives here.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::fetch::PageFetcher;
use crate::paginate::QueryOutcome;
use crate::pool::{CancelToken, PoolConfig, RunReport, WorkerPool};
use crate::transport::{HttpTransport, Transport};
use crate::types::{DependentsSpec, ItemRef, PageSink, QueryParams, RepoRef};
use std::sync::Arc;
use url::Url;

/// Default filter for issue list queries
pub const DEFAULT_ISSUE_QUERY: &str = "is:issue";
/// Default filter for pull list queries
pub const DEFAULT_PULL_QUERY: &str = "is:pr";

/// High-level client for harvesting paginated resources from a scraper
/// gateway.
///
/// Each resource kind has a collect variant returning per-query outcomes
/// and a stream variant handing pages to a [`PageSink`] as they arrive.
pub struct ScraperClient {
    base_url: String,
    max_pages: u32,
    pool: WorkerPool,
}

impl ScraperClient {
    /// Create a client with the reqwest-backed transport
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Self::with_transport(config, transport)
    }

    /// Create a client over a caller-supplied transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(Error::config("base_url is required"));
        }
        // Validate early; the pool would otherwise fail on every query
        Url::parse(&config.base_url)?;

        let fetcher = Arc::new(PageFetcher::new(transport, config.auth_token.clone()));
        let pool = WorkerPool::new(
            fetcher,
            PoolConfig {
                num_workers: config.num_workers,
                max_retries: config.max_retries,
                retry_backoff: config.retry_backoff,
            },
        );

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_pages: config.max_pages,
            pool,
        })
    }

    /// Token for cancelling the current run
    pub fn cancel_token(&self) -> CancelToken {
        self.pool.cancel_token()
    }

    /// Request cancellation of the current run
    pub fn cancel(&self) {
        self.pool.cancel();
    }

    // ============================================================================
    // Issue / Pull Lists
    // ============================================================================

    /// Harvest the issue lists of the given repositories.
    ///
    /// `query` filters the issue page (defaults to `is:issue`).
    pub async fn fetch_issue_lists(
        &self,
        repos: &[RepoRef],
        query: Option<&str>,
    ) -> Vec<QueryOutcome> {
        let queries = self.list_queries(repos, query.unwrap_or(DEFAULT_ISSUE_QUERY));
        self.pool.run(&self.endpoint("issues"), queries).await
    }

    /// Harvest issue lists, streaming each page into the sink
    pub async fn stream_issue_lists(
        &self,
        repos: &[RepoRef],
        query: Option<&str>,
        sink: Arc<dyn PageSink>,
    ) -> RunReport {
        let queries = self.list_queries(repos, query.unwrap_or(DEFAULT_ISSUE_QUERY));
        self.pool
            .run_with_sink(&self.endpoint("issues"), queries, sink)
            .await
    }

    /// Harvest the pull request lists of the given repositories.
    ///
    /// `query` filters the pulls page (defaults to `is:pr`).
    pub async fn fetch_pull_lists(
        &self,
        repos: &[RepoRef],
        query: Option<&str>,
    ) -> Vec<QueryOutcome> {
        let queries = self.list_queries(repos, query.unwrap_or(DEFAULT_PULL_QUERY));
        self.pool.run(&self.endpoint("pulls"), queries).await
    }

    /// Harvest pull request lists, streaming each page into the sink
    pub async fn stream_pull_lists(
        &self,
        repos: &[RepoRef],
        query: Option<&str>,
        sink: Arc<dyn PageSink>,
    ) -> RunReport {
        let queries = self.list_queries(repos, query.unwrap_or(DEFAULT_PULL_QUERY));
        self.pool
            .run_with_sink(&self.endpoint("pulls"), queries, sink)
            .await
    }

    // ============================================================================
    // Single Issue / Pull Timelines
    // ============================================================================

    /// Harvest the timelines of single issues
    pub async fn fetch_issue_timelines(&self, items: &[ItemRef]) -> Vec<QueryOutcome> {
        let queries = self.item_queries(items);
        self.pool.run(&self.endpoint("issue"), queries).await
    }

    /// Harvest single issue timelines, streaming each page into the sink
    pub async fn stream_issue_timelines(
        &self,
        items: &[ItemRef],
        sink: Arc<dyn PageSink>,
    ) -> RunReport {
        let queries = self.item_queries(items);
        self.pool
            .run_with_sink(&self.endpoint("issue"), queries, sink)
            .await
    }

    /// Harvest the timelines of single pull requests
    pub async fn fetch_pull_timelines(&self, items: &[ItemRef]) -> Vec<QueryOutcome> {
        let queries = self.item_queries(items);
        self.pool.run(&self.endpoint("pull"), queries).await
    }

    /// Harvest single pull timelines, streaming each page into the sink
    pub async fn stream_pull_timelines(
        &self,
        items: &[ItemRef],
        sink: Arc<dyn PageSink>,
    ) -> RunReport {
        let queries = self.item_queries(items);
        self.pool
            .run_with_sink(&self.endpoint("pull"), queries, sink)
            .await
    }

    // ============================================================================
    // Dependents
    // ============================================================================

    /// Harvest the dependents of the given targets
    pub async fn fetch_dependents(&self, specs: &[DependentsSpec]) -> Vec<QueryOutcome> {
        let queries = self.dependents_queries(specs);
        self.pool.run(&self.endpoint("dependents"), queries).await
    }

    /// Harvest dependents, streaming each page into the sink
    pub async fn stream_dependents(
        &self,
        specs: &[DependentsSpec],
        sink: Arc<dyn PageSink>,
    ) -> RunReport {
        let queries = self.dependents_queries(specs);
        self.pool
            .run_with_sink(&self.endpoint("dependents"), queries, sink)
            .await
    }

    // ============================================================================
    // Query Building
    // ============================================================================

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn list_queries(&self, repos: &[RepoRef], query: &str) -> Vec<QueryParams> {
        repos
            .iter()
            .map(|repo| {
                QueryParams::new()
                    .with("owner", repo.owner.as_str())
                    .with("name", repo.name.as_str())
                    .with("query", query)
                    .with("fromPage", "1")
                    .with("maxPages", self.max_pages.to_string())
            })
            .collect()
    }

    fn item_queries(&self, items: &[ItemRef]) -> Vec<QueryParams> {
        items
            .iter()
            .map(|item| {
                QueryParams::new()
                    .with("owner", item.repo.owner.as_str())
                    .with("name", item.repo.name.as_str())
                    .with("id", item.number.to_string())
            })
            .collect()
    }

    fn dependents_queries(&self, specs: &[DependentsSpec]) -> Vec<QueryParams> {
        specs
            .iter()
            .map(|spec| {
                let mut params = QueryParams::new()
                    .with("owner", spec.repo.owner.as_str())
                    .with("name", spec.repo.name.as_str())
                    .with("type", spec.kind.as_str())
                    .with("maxPages", self.max_pages.to_string());
                if let Some(package_id) = &spec.package_id {
                    params.set("packageId", package_id.as_str());
                }
                if let Some(after) = &spec.resume_after {
                    params.set("after", after.as_str());
                }
                params
            })
            .collect()
    }
}

impl std::fmt::Debug for ScraperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScraperClient")
            .field("base_url", &self.base_url)
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}
