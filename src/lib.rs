//! # pageharvest
//!
//! A bounded-concurrency client engine for bulk-harvesting cursor-paginated
//! resources from a scraper gateway.
//!
//! ## Features
//!
//! - **Bounded fan-out**: any number of queries, never more than
//!   `num_workers` page fetches in flight
//! - **Cursor pagination**: numeric page indices and opaque continuation
//!   tokens through one loop
//! - **Per-page retry budget**: fixed backoff on transient failures,
//!   graceful not-found handling, terminal contract violations
//! - **Collect or stream**: full per-query results, or a sink invoked as
//!   every page lands
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pageharvest::{ClientConfig, RepoRef, Result, ScraperClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = ScraperClient::new(ClientConfig::new(
//!         "https://scraper.example.dev/github",
//!         "token ...",
//!     ))?;
//!
//!     let repos = vec![RepoRef::parse("pandas-dev/pandas")?];
//!     for outcome in client.fetch_issue_lists(&repos, None).await {
//!         println!("{}: {} records", outcome.params, outcome.records);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      ScraperClient                       │
//! │  issue/pull lists · issue/pull timelines · dependents    │
//! └──────────────────────────┬───────────────────────────────┘
//! ┌──────────────────────────┴───────────────────────────────┐
//! │  WorkerPool   one task per query, shared admission gate  │
//! ├──────────────────────────────────────────────────────────┤
//! │  PaginationLoop   cursor state · retry budget · backoff  │
//! ├──────────────────────────────────────────────────────────┤
//! │  PageFetcher      envelope decode · error classification │
//! ├──────────────────────────────────────────────────────────┤
//! │  Transport        one GET per call (reqwest or custom)   │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types: query parameters, descriptors, the page sink seam
pub mod types;

/// Client configuration
pub mod config;

/// HTTP transport and throttling
pub mod transport;

/// Single-page fetching and response classification
pub mod fetch;

/// The per-query pagination loop
pub mod paginate;

/// Bounded-concurrency worker pool
pub mod pool;

/// The scraper client façade
pub mod client;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::ScraperClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, Result};
pub use fetch::{Cursor, PageEnvelope, PageFetcher};
pub use paginate::{QueryOutcome, Termination};
pub use pool::{CancelToken, RunReport, WorkerPool};
pub use transport::{HttpTransport, Throttle, ThrottleConfig, Transport, TransportResponse};
pub use types::{
    sink_fn, DependentKind, DependentsSpec, FnSink, ItemRef, JsonValue, PageSink, QueryParams,
    RepoRef,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
