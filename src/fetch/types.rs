//! Page envelope wire types
//!
//! One envelope per server response: zero or more item records plus
//! continuation metadata.

use crate::error::{Error, Result};
use crate::types::{JsonValue, QueryParams};
use serde::Deserialize;

/// Continuation marker for the next page of a query.
///
/// Opaque tokens take precedence over numeric indices when an envelope
/// carries both, so resource kinds with differing pagination styles run
/// through a single loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// Opaque continuation token, sent back as the `after` parameter
    After(String),
    /// Numeric page index, sent back as the `fromPage` parameter
    FromPage(u64),
}

impl Cursor {
    /// Derive the next iteration's parameters from the current ones
    #[must_use]
    pub fn apply(&self, params: QueryParams) -> QueryParams {
        match self {
            Self::After(token) => params.with("after", token.clone()),
            Self::FromPage(page) => params.with("fromPage", page.to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawEnvelope {
    data: Option<Vec<JsonValue>>,
    current: Option<u64>,
    after: Option<String>,
}

/// The decoded server response for one page
#[derive(Debug, Clone)]
pub struct PageEnvelope {
    /// Item records carried by this page
    pub data: Vec<JsonValue>,
    /// Current page index; implies the next page is `current + 1`
    pub current: Option<u64>,
    /// Opaque continuation token for the next page
    pub after: Option<String>,
}

impl PageEnvelope {
    /// Parse a 2xx response body into an envelope.
    ///
    /// An empty body, invalid JSON, or a body without a `data` field is a
    /// contract violation, not a transient failure.
    pub fn parse(body: &str) -> Result<Self> {
        if body.trim().is_empty() {
            return Err(Error::malformed("empty response body"));
        }

        let raw: RawEnvelope = serde_json::from_str(body)
            .map_err(|e| Error::malformed(format!("invalid JSON body: {e}")))?;

        match raw.data {
            Some(data) => Ok(Self {
                data,
                current: raw.current,
                after: raw.after,
            }),
            None => Err(Error::malformed("response has no data field")),
        }
    }

    /// Continuation marker, if the server signalled more pages.
    ///
    /// Absence means the query is exhausted.
    pub fn continuation(&self) -> Option<Cursor> {
        if let Some(after) = &self.after {
            return Some(Cursor::After(after.clone()));
        }
        self.current.map(|current| Cursor::FromPage(current + 1))
    }
}
