//! Pagination loop state and outcome types

use crate::types::{JsonValue, QueryParams};

/// Per-query retry budget.
///
/// Reset to the configured maximum every time a page succeeds and
/// advances the cursor; consumed one unit per transient failure.
#[derive(Debug, Clone, Copy)]
pub struct RetryState {
    remaining: u32,
    max: u32,
}

impl RetryState {
    /// Create a fresh budget
    pub fn new(max: u32) -> Self {
        Self {
            remaining: max,
            max,
        }
    }

    /// Restore the full budget
    pub fn reset(&mut self) {
        self.remaining = self.max;
    }

    /// Consume one unit of budget.
    ///
    /// Returns `false` once the budget is exhausted; the caller must then
    /// stop retrying.
    pub fn consume(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining > 0
    }

    /// Units left before the query degrades to a partial result
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Units consumed since the last reset
    pub fn used(&self) -> u32 {
        self.max - self.remaining
    }
}

/// How a query's pagination loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The server signalled no more data (including a not-found page)
    Exhausted,
    /// The retry budget ran out on a page; the result is partial
    RetriesExhausted,
    /// The backend broke the page envelope contract
    ContractViolation,
    /// The page sink rejected a page
    SinkFailed,
    /// The run was cancelled before this query finished
    Cancelled,
}

impl Termination {
    /// Whether the query ran to clean exhaustion
    pub fn is_complete(self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

/// The accumulated result of one query
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// The parameters the query was submitted with
    pub params: QueryParams,
    /// Item records in page order (empty in streaming mode)
    pub items: Vec<JsonValue>,
    /// Pages successfully fetched
    pub pages: u32,
    /// Item records observed across all pages, whether streamed or kept
    pub records: u64,
    /// How the loop ended
    pub termination: Termination,
    /// Failure detail, when the loop did not end in exhaustion
    pub error: Option<String>,
}

impl QueryOutcome {
    /// Whether all pages for this query were fetched
    pub fn is_complete(&self) -> bool {
        self.termination.is_complete()
    }

    /// Whether the query stopped early and kept a partial result
    pub fn is_partial(&self) -> bool {
        !self.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_state_consume_until_exhausted() {
        let mut retry = RetryState::new(3);
        assert_eq!(retry.remaining(), 3);

        assert!(retry.consume());
        assert!(retry.consume());
        assert_eq!(retry.used(), 2);
        // Third consecutive failure exhausts the budget
        assert!(!retry.consume());
        assert_eq!(retry.remaining(), 0);
    }

    #[test]
    fn test_retry_state_reset() {
        let mut retry = RetryState::new(2);
        assert!(retry.consume());
        retry.reset();
        assert_eq!(retry.remaining(), 2);
        assert_eq!(retry.used(), 0);
    }

    #[test]
    fn test_retry_state_zero_budget() {
        let mut retry = RetryState::new(0);
        assert!(!retry.consume());
        assert!(!retry.consume());
    }

    #[test]
    fn test_termination_completeness() {
        assert!(Termination::Exhausted.is_complete());
        assert!(!Termination::RetriesExhausted.is_complete());
        assert!(!Termination::ContractViolation.is_complete());
        assert!(!Termination::SinkFailed.is_complete());
        assert!(!Termination::Cancelled.is_complete());
    }
}
