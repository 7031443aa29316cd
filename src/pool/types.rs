//! Worker pool types

use crate::paginate::{QueryOutcome, Termination};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cooperative cancellation flag shared by a pool and its loops.
///
/// Cancelling prevents new page fetches from starting; fetches already in
/// flight run to completion. Loops share no mutable state, so cancelling
/// never corrupts a sibling's partial result.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an un-cancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Concurrency and retry knobs for a worker pool
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Maximum page fetches in flight at once
    pub num_workers: usize,
    /// Retry budget per page
    pub max_retries: u32,
    /// Fixed sleep between retries of the same page
    pub retry_backoff: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_workers: 10,
            max_retries: 3,
            retry_backoff: Duration::from_secs(10),
        }
    }
}

/// Aggregate result of a streaming run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Queries submitted
    pub queries: usize,
    /// Queries that ran to clean exhaustion
    pub completed: usize,
    /// Queries that stopped early (retries, contract, or sink failures)
    pub partial: usize,
    /// Queries cut short by cancellation
    pub cancelled: usize,
    /// Pages fetched across all queries
    pub pages: u64,
    /// Item records observed across all queries
    pub records: u64,
}

impl RunReport {
    /// Summarize a set of query outcomes
    pub fn from_outcomes(outcomes: &[QueryOutcome]) -> Self {
        let mut report = Self {
            queries: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome.termination {
                Termination::Exhausted => report.completed += 1,
                Termination::Cancelled => report.cancelled += 1,
                Termination::RetriesExhausted
                | Termination::ContractViolation
                | Termination::SinkFailed => report.partial += 1,
            }
            report.pages += u64::from(outcome.pages);
            report.records += outcome.records;
        }
        report
    }

    /// Whether every query ran to clean exhaustion
    pub fn all_complete(&self) -> bool {
        self.completed == self.queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QueryParams;

    fn outcome(termination: Termination, pages: u32, records: u64) -> QueryOutcome {
        QueryOutcome {
            params: QueryParams::new(),
            items: Vec::new(),
            pages,
            records,
            termination,
            error: None,
        }
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_run_report_from_outcomes() {
        let outcomes = vec![
            outcome(Termination::Exhausted, 3, 30),
            outcome(Termination::RetriesExhausted, 1, 10),
            outcome(Termination::Exhausted, 2, 20),
            outcome(Termination::Cancelled, 0, 0),
        ];

        let report = RunReport::from_outcomes(&outcomes);
        assert_eq!(report.queries, 4);
        assert_eq!(report.completed, 2);
        assert_eq!(report.partial, 1);
        assert_eq!(report.cancelled, 1);
        assert_eq!(report.pages, 6);
        assert_eq!(report.records, 60);
        assert!(!report.all_complete());
    }

    #[test]
    fn test_run_report_all_complete() {
        let outcomes = vec![outcome(Termination::Exhausted, 1, 5)];
        assert!(RunReport::from_outcomes(&outcomes).all_complete());
        assert!(RunReport::default().all_complete());
    }
}
