//! Tests for the pagination loop
//!
//! These run against a scripted transport with a paused clock, so backoff
//! arithmetic is asserted exactly.

use super::*;
use crate::error::{Error, Result};
use crate::transport::{Transport, TransportResponse};
use crate::types::JsonValue;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Transport double that replays a fixed script of responses and records
/// the query parameters of every call.
#[derive(Default)]
struct ScriptedTransport {
    script: Mutex<VecDeque<Result<TransportResponse>>>,
    calls: AtomicU32,
    queries: Mutex<Vec<Vec<(String, String)>>>,
}

impl ScriptedTransport {
    fn new(script: Vec<Result<TransportResponse>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn query_at(&self, call: usize) -> Vec<(String, String)> {
        self.queries.lock().unwrap()[call].clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(
        &self,
        _url: &str,
        query: &[(&str, &str)],
        _headers: &[(&str, &str)],
    ) -> Result<TransportResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(
            query
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        );
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .expect("script exhausted: unexpected extra fetch")
    }
}

fn page(body: JsonValue) -> Result<TransportResponse> {
    Ok(TransportResponse {
        status: 200,
        body: body.to_string(),
    })
}

fn failure(status: u16, body: JsonValue) -> Result<TransportResponse> {
    Ok(TransportResponse {
        status,
        body: body.to_string(),
    })
}

fn transport_error() -> Result<TransportResponse> {
    // A body-less reqwest error is hard to fabricate; a generic 503 walks
    // the same transient path.
    failure(503, json!({"error": "service unavailable"}))
}

const BACKOFF: Duration = Duration::from_secs(10);

fn test_loop(transport: Arc<ScriptedTransport>, max_retries: u32) -> PaginationLoop {
    let fetcher = Arc::new(PageFetcher::new(transport, "token test"));
    PaginationLoop::new(
        fetcher,
        Arc::new(Semaphore::new(4)),
        LoopConfig {
            max_retries,
            retry_backoff: BACKOFF,
        },
    )
}

fn params(owner: &str, name: &str) -> QueryParams {
    QueryParams::new()
        .with("owner", owner)
        .with("name", name)
        .with("fromPage", "1")
}

#[tokio::test(start_paused = true)]
async fn test_pages_concatenate_in_order() {
    let transport = ScriptedTransport::new(vec![
        page(json!({"data": [{"id": 1}], "current": 1})),
        page(json!({"data": [{"id": 2}]})),
    ]);
    let looper = test_loop(transport.clone(), 3);

    let outcome = looper
        .run("http://gw/issues", params("a", "b"), None, &CancelToken::new())
        .await;

    assert_eq!(outcome.termination, Termination::Exhausted);
    assert_eq!(outcome.items, vec![json!({"id": 1}), json!({"id": 2})]);
    assert_eq!(outcome.pages, 2);
    assert_eq!(outcome.records, 2);
    assert_eq!(transport.calls(), 2);
    // Second fetch carried the advanced page cursor
    assert!(transport
        .query_at(1)
        .contains(&("fromPage".to_string(), "2".to_string())));
}

#[tokio::test(start_paused = true)]
async fn test_after_token_takes_precedence_over_current() {
    let transport = ScriptedTransport::new(vec![
        page(json!({"data": [{"id": 1}], "current": 1, "after": "tok_1"})),
        page(json!({"data": [{"id": 2}]})),
    ]);
    let looper = test_loop(transport.clone(), 3);

    let outcome = looper
        .run("http://gw/dependents", params("a", "b"), None, &CancelToken::new())
        .await;

    assert_eq!(outcome.termination, Termination::Exhausted);
    let second = transport.query_at(1);
    assert!(second.contains(&("after".to_string(), "tok_1".to_string())));
    // The numeric cursor was not advanced
    assert!(second.contains(&("fromPage".to_string(), "1".to_string())));
}

#[tokio::test(start_paused = true)]
async fn test_not_found_is_graceful_without_retry_or_sleep() {
    let transport = ScriptedTransport::new(vec![failure(404, json!({"error": "not found"}))]);
    let looper = test_loop(transport.clone(), 3);

    let start = tokio::time::Instant::now();
    let outcome = looper
        .run("http://gw/issue", params("a", "b"), None, &CancelToken::new())
        .await;

    assert_eq!(outcome.termination, Termination::Exhausted);
    assert!(outcome.items.is_empty());
    assert_eq!(outcome.pages, 0);
    assert_eq!(transport.calls(), 1);
    // No backoff sleep was performed
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_retry_then_succeed() {
    let transport = ScriptedTransport::new(vec![
        failure(429, json!({"error": "too many requests"})),
        failure(429, json!({"error": "too many requests"})),
        page(json!({"data": [{"id": 9}]})),
    ]);
    let looper = test_loop(transport.clone(), 3);

    let start = tokio::time::Instant::now();
    let outcome = looper
        .run("http://gw/issues", params("a", "b"), None, &CancelToken::new())
        .await;

    assert_eq!(outcome.termination, Termination::Exhausted);
    assert_eq!(outcome.items, vec![json!({"id": 9})]);
    assert_eq!(transport.calls(), 3);
    // One fixed backoff per retry, and the cursor never moved
    assert_eq!(start.elapsed(), 2 * BACKOFF);
    assert_eq!(transport.query_at(0), transport.query_at(2));
}

#[tokio::test(start_paused = true)]
async fn test_budget_exhaustion_keeps_partial_result() {
    let transport = ScriptedTransport::new(vec![
        page(json!({"data": [{"id": 1}], "current": 1})),
        transport_error(),
        failure(429, json!({"error": "too many requests"})),
        transport_error(),
    ]);
    let looper = test_loop(transport.clone(), 3);

    let start = tokio::time::Instant::now();
    let outcome = looper
        .run("http://gw/issues", params("a", "b"), None, &CancelToken::new())
        .await;

    assert_eq!(outcome.termination, Termination::RetriesExhausted);
    assert!(outcome.is_partial());
    assert_eq!(outcome.items, vec![json!({"id": 1})]);
    assert_eq!(outcome.pages, 1);
    // maxRetries consecutive failures: maxRetries fetches of the stuck
    // page, maxRetries - 1 sleeps, then no further fetches
    assert_eq!(transport.calls(), 4);
    assert_eq!(start.elapsed(), 2 * BACKOFF);
    assert!(outcome.error.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_budget_resets_after_successful_page() {
    let transport = ScriptedTransport::new(vec![
        failure(429, json!({"error": "too many requests"})),
        page(json!({"data": [{"id": 1}], "current": 1})),
        failure(429, json!({"error": "too many requests"})),
        page(json!({"data": [{"id": 2}]})),
    ]);
    // Budget of 2 survives one failure per page, but not two in a row
    let looper = test_loop(transport.clone(), 2);

    let outcome = looper
        .run("http://gw/issues", params("a", "b"), None, &CancelToken::new())
        .await;

    assert_eq!(outcome.termination, Termination::Exhausted);
    assert_eq!(outcome.items, vec![json!({"id": 1}), json!({"id": 2})]);
    assert_eq!(transport.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_page_is_terminal_without_retry() {
    let transport = ScriptedTransport::new(vec![
        page(json!({"data": [{"id": 1}], "current": 1})),
        page(json!({"rows": []})),
    ]);
    let looper = test_loop(transport.clone(), 3);

    let start = tokio::time::Instant::now();
    let outcome = looper
        .run("http://gw/issues", params("a", "b"), None, &CancelToken::new())
        .await;

    assert_eq!(outcome.termination, Termination::ContractViolation);
    assert_eq!(outcome.items, vec![json!({"id": 1})]);
    assert_eq!(transport.calls(), 2);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(outcome.error.as_deref().unwrap().contains("no data field"));
}

#[tokio::test(start_paused = true)]
async fn test_empty_page_with_continuation_advances() {
    let transport = ScriptedTransport::new(vec![
        page(json!({"data": [], "current": 1})),
        page(json!({"data": [{"id": 5}]})),
    ]);
    let looper = test_loop(transport.clone(), 3);

    let outcome = looper
        .run("http://gw/issues", params("a", "b"), None, &CancelToken::new())
        .await;

    assert_eq!(outcome.termination, Termination::Exhausted);
    assert_eq!(outcome.items, vec![json!({"id": 5})]);
    assert_eq!(outcome.pages, 2);
}

#[derive(Default)]
struct CapturingSink {
    pages: Mutex<Vec<(Vec<JsonValue>, QueryParams)>>,
}

#[async_trait]
impl PageSink for CapturingSink {
    async fn on_page(&self, items: &[JsonValue], params: &QueryParams) -> anyhow::Result<()> {
        self.pages
            .lock()
            .unwrap()
            .push((items.to_vec(), params.clone()));
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn test_streaming_sink_gets_each_page_with_snapshot() {
    let transport = ScriptedTransport::new(vec![
        page(json!({"data": [{"id": 1}], "current": 1})),
        page(json!({"data": [{"id": 2}]})),
    ]);
    let looper = test_loop(transport, 3);
    let sink = CapturingSink::default();

    let outcome = looper
        .run(
            "http://gw/issues",
            params("a", "b"),
            Some(&sink),
            &CancelToken::new(),
        )
        .await;

    assert_eq!(outcome.termination, Termination::Exhausted);
    // Streamed pages are not accumulated again
    assert!(outcome.items.is_empty());
    assert_eq!(outcome.records, 2);

    let pages = sink.pages.lock().unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].0, vec![json!({"id": 1})]);
    assert_eq!(pages[0].1.get("fromPage"), Some("1"));
    assert_eq!(pages[1].0, vec![json!({"id": 2})]);
    assert_eq!(pages[1].1.get("fromPage"), Some("2"));
}

struct RejectingSink;

#[async_trait]
impl PageSink for RejectingSink {
    async fn on_page(&self, _items: &[JsonValue], _params: &QueryParams) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("disk full"))
    }
}

#[tokio::test(start_paused = true)]
async fn test_sink_error_terminates_the_query() {
    let transport = ScriptedTransport::new(vec![page(
        json!({"data": [{"id": 1}], "current": 1}),
    )]);
    let looper = test_loop(transport.clone(), 3);

    let outcome = looper
        .run(
            "http://gw/issues",
            params("a", "b"),
            Some(&RejectingSink),
            &CancelToken::new(),
        )
        .await;

    assert_eq!(outcome.termination, Termination::SinkFailed);
    assert_eq!(outcome.error.as_deref(), Some("disk full"));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_token_stops_before_first_fetch() {
    let transport = ScriptedTransport::new(vec![]);
    let looper = test_loop(transport.clone(), 3);

    let cancel = CancelToken::new();
    cancel.cancel();

    let outcome = looper
        .run("http://gw/issues", params("a", "b"), None, &cancel)
        .await;

    assert_eq!(outcome.termination, Termination::Cancelled);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_error_variant_matches_transient_classification() {
    // A 500 with arbitrary text is transient, same as a rate limit
    let transport = ScriptedTransport::new(vec![
        failure(500, json!({"error": "internal server error"})),
        page(json!({"data": [{"id": 3}]})),
    ]);
    let looper = test_loop(transport.clone(), 2);

    let outcome = looper
        .run("http://gw/pulls", params("a", "b"), None, &CancelToken::new())
        .await;

    assert_eq!(outcome.termination, Termination::Exhausted);
    assert_eq!(outcome.items, vec![json!({"id": 3})]);
    assert_eq!(transport.calls(), 2);

    // Keep the helper honest
    assert!(matches!(
        Error::rate_limited(429, "x"),
        e if e.is_transient()
    ));
}
