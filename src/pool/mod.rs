//! Worker pool
//!
//! Runs many pagination loops concurrently under one admission gate: one
//! tokio task per query, at most `num_workers` page fetches in flight at
//! any instant regardless of how many queries were submitted. A failure
//! in one loop is contained at the loop boundary and never aborts its
//! siblings.

mod types;

pub use types::{CancelToken, PoolConfig, RunReport};

use crate::fetch::PageFetcher;
use crate::paginate::{LoopConfig, PaginationLoop, QueryOutcome, Termination};
use crate::types::{PageSink, QueryParams};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};

/// Bounded-concurrency executor for paginated queries
pub struct WorkerPool {
    fetcher: Arc<PageFetcher>,
    gate: Arc<Semaphore>,
    cancel: CancelToken,
    config: PoolConfig,
}

impl WorkerPool {
    /// Create a pool over a fetcher
    pub fn new(fetcher: Arc<PageFetcher>, config: PoolConfig) -> Self {
        Self {
            fetcher,
            gate: Arc::new(Semaphore::new(config.num_workers.max(1))),
            cancel: CancelToken::new(),
            config,
        }
    }

    /// Token for cancelling runs on this pool
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Request cancellation of the current run
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Collect-all mode: run every query to completion and return one
    /// outcome per query, in submission order.
    pub async fn run(&self, url: &str, queries: Vec<QueryParams>) -> Vec<QueryOutcome> {
        self.execute(url, queries, None).await
    }

    /// Streaming mode: hand each page to the sink as soon as it is
    /// fetched and report once all loops have terminated.
    pub async fn run_with_sink(
        &self,
        url: &str,
        queries: Vec<QueryParams>,
        sink: Arc<dyn PageSink>,
    ) -> RunReport {
        let outcomes = self.execute(url, queries, Some(sink)).await;
        let report = RunReport::from_outcomes(&outcomes);
        info!(
            queries = report.queries,
            completed = report.completed,
            partial = report.partial,
            pages = report.pages,
            "run finished"
        );
        report
    }

    async fn execute(
        &self,
        url: &str,
        queries: Vec<QueryParams>,
        sink: Option<Arc<dyn PageSink>>,
    ) -> Vec<QueryOutcome> {
        let loop_config = LoopConfig {
            max_retries: self.config.max_retries,
            retry_backoff: self.config.retry_backoff,
        };

        let mut handles = Vec::with_capacity(queries.len());
        for params in queries {
            let looper =
                PaginationLoop::new(Arc::clone(&self.fetcher), Arc::clone(&self.gate), loop_config);
            let url = url.to_string();
            let sink = sink.clone();
            let cancel = self.cancel.clone();
            let snapshot = params.clone();

            let handle = tokio::spawn(async move {
                looper.run(&url, params, sink.as_deref(), &cancel).await
            });
            handles.push((snapshot, handle));
        }

        let joined = futures::future::join_all(
            handles
                .into_iter()
                .map(|(snapshot, handle)| async move { (snapshot, handle.await) }),
        )
        .await;

        let mut outcomes = Vec::with_capacity(joined.len());
        for (snapshot, result) in joined {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    // A panicking loop must not take the run down with it
                    error!(params = %snapshot, "worker task aborted: {e}");
                    outcomes.push(QueryOutcome {
                        params: snapshot,
                        items: Vec::new(),
                        pages: 0,
                        records: 0,
                        termination: Termination::ContractViolation,
                        error: Some(format!("worker task aborted: {e}")),
                    });
                }
            }
        }
        outcomes
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
