//! Pagination loop
//!
//! Drives one query through successive pages: fetch, hand the page to the
//! sink or the accumulator, advance the cursor, and retry transient
//! failures against a per-page budget. Pages within a query are strictly
//! ordered; the cursor for page N+1 comes from page N's envelope.

mod types;

pub use types::{QueryOutcome, RetryState, Termination};

use crate::fetch::PageFetcher;
use crate::pool::CancelToken;
use crate::types::{PageSink, QueryParams};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

/// Retry and backoff knobs for one pagination loop
#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    /// Retry budget per page
    pub max_retries: u32,
    /// Fixed sleep between retries of the same page
    pub retry_backoff: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff: Duration::from_secs(10),
        }
    }
}

/// Runs one query to completion under the shared admission gate
pub struct PaginationLoop {
    fetcher: Arc<PageFetcher>,
    gate: Arc<Semaphore>,
    config: LoopConfig,
}

impl PaginationLoop {
    /// Create a loop over a fetcher and a shared admission gate
    pub fn new(fetcher: Arc<PageFetcher>, gate: Arc<Semaphore>, config: LoopConfig) -> Self {
        Self {
            fetcher,
            gate,
            config,
        }
    }

    /// Drive the query until exhaustion, terminal failure, or cancellation.
    ///
    /// With a sink, every non-empty page is handed over as soon as it is
    /// fetched together with the current parameter snapshot, and the
    /// outcome carries no items; without one, items accumulate in page
    /// order. Failures never escape this method: they are folded into the
    /// outcome's [`Termination`].
    pub async fn run(
        &self,
        url: &str,
        initial: QueryParams,
        sink: Option<&dyn PageSink>,
        cancel: &CancelToken,
    ) -> QueryOutcome {
        let submitted = initial.clone();
        let mut params = initial;
        let mut retry = RetryState::new(self.config.max_retries);
        let mut items = Vec::new();
        let mut pages = 0u32;
        let mut records = 0u64;

        let outcome = |items, pages, records, termination, error| QueryOutcome {
            params: submitted.clone(),
            items,
            pages,
            records,
            termination,
            error,
        };

        loop {
            if cancel.is_cancelled() {
                return outcome(items, pages, records, Termination::Cancelled, None);
            }

            let fetched = {
                // Hold a gate permit only while the fetch is in flight;
                // backoff sleeps must not occupy a worker slot.
                let _permit = self
                    .gate
                    .acquire()
                    .await
                    .expect("admission gate never closes");
                self.fetcher.fetch(url, &params).await
            };

            match fetched {
                Ok(envelope) => {
                    pages += 1;
                    let continuation = envelope.continuation();

                    if !envelope.data.is_empty() {
                        records += envelope.data.len() as u64;
                        if let Some(sink) = sink {
                            if let Err(e) = sink.on_page(&envelope.data, &params).await {
                                error!(%params, error = %e, "sink rejected page");
                                return outcome(
                                    items,
                                    pages,
                                    records,
                                    Termination::SinkFailed,
                                    Some(e.to_string()),
                                );
                            }
                        } else {
                            items.extend(envelope.data);
                        }
                        retry.reset();
                    }

                    match continuation {
                        Some(cursor) => params = cursor.apply(params),
                        None => return outcome(items, pages, records, Termination::Exhausted, None),
                    }
                }
                Err(err) if err.is_graceful_end() => {
                    // The target disappeared mid-run; no further pages
                    // exist and no budget is spent.
                    debug!(%params, "pagination ended: {err}");
                    return outcome(items, pages, records, Termination::Exhausted, None);
                }
                Err(err) if err.is_transient() => {
                    if !retry.consume() {
                        error!(
                            %params,
                            "query failed after {} retries: {err}",
                            self.config.max_retries
                        );
                        return outcome(
                            items,
                            pages,
                            records,
                            Termination::RetriesExhausted,
                            Some(err.to_string()),
                        );
                    }
                    warn!(
                        %params,
                        retry = retry.used(),
                        max = self.config.max_retries,
                        "transient failure, backing off: {err}"
                    );
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
                Err(err) => {
                    error!(%params, "page contract violated: {err}");
                    return outcome(
                        items,
                        pages,
                        records,
                        Termination::ContractViolation,
                        Some(err.to_string()),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
