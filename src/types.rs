//! Common types used throughout pageharvest
//!
//! This module contains the query parameter map, the resource descriptors
//! consumed by the client façade, and the page sink seam.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

// ============================================================================
// Query Parameters
// ============================================================================

/// Ordered query parameter map for one paginated query.
///
/// Each in-flight pagination loop owns its params exclusively; cursor
/// advancement derives a new value from the previous one instead of
/// mutating a shared map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    /// Create an empty parameter map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Consume self and return a copy with the parameter set
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Get a parameter value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Remove a parameter, returning any previous value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Check whether a parameter is present
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over parameters in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Borrow the parameters as serializable key/value pairs
    pub fn as_pairs(&self) -> Vec<(&str, &str)> {
        self.iter().collect()
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in self.iter() {
            if !first {
                write!(f, "&")?;
            }
            write!(f, "{k}={v}")?;
            first = false;
        }
        Ok(())
    }
}

// ============================================================================
// Resource Descriptors
// ============================================================================

/// A repository identified by owner and name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoRef {
    /// Create a repo reference from owner and name
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse an `owner/name` string
    pub fn parse(name_with_owner: &str) -> Result<Self> {
        match name_with_owner.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self::new(owner, name))
            }
            _ => Err(Error::config(format!(
                "expected owner/name, got '{name_with_owner}'"
            ))),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A single numbered item (issue or pull request) inside a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    /// The repository the item belongs to
    pub repo: RepoRef,
    /// Issue or pull request number
    pub number: u64,
}

impl ItemRef {
    /// Create an item reference
    pub fn new(repo: RepoRef, number: u64) -> Self {
        Self { repo, number }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}

/// What kind of dependents page to harvest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DependentKind {
    /// Repositories depending on the target
    #[default]
    Repository,
    /// Dependents of a specific published package
    Package,
}

impl DependentKind {
    /// Wire value for the `type` query parameter
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Repository => "REPOSITORY",
            Self::Package => "PACKAGE",
        }
    }
}

/// Descriptor for one dependents query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentsSpec {
    /// Target repository
    pub repo: RepoRef,
    /// Dependent kind (defaults to `REPOSITORY`)
    #[serde(default)]
    pub kind: DependentKind,
    /// Package id, for `PACKAGE` targets that expose several packages
    #[serde(default)]
    pub package_id: Option<String>,
    /// Continuation token to resume a previously interrupted harvest
    #[serde(default)]
    pub resume_after: Option<String>,
}

impl DependentsSpec {
    /// Create a dependents descriptor for a repository target
    pub fn new(repo: RepoRef) -> Self {
        Self {
            repo,
            kind: DependentKind::default(),
            package_id: None,
            resume_after: None,
        }
    }

    /// Set the dependent kind
    #[must_use]
    pub fn kind(mut self, kind: DependentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the package id (implies `PACKAGE` kind)
    #[must_use]
    pub fn package_id(mut self, id: impl Into<String>) -> Self {
        self.kind = DependentKind::Package;
        self.package_id = Some(id.into());
        self
    }

    /// Resume from a previously returned continuation token
    #[must_use]
    pub fn resume_after(mut self, token: impl Into<String>) -> Self {
        self.resume_after = Some(token.into());
        self
    }
}

// ============================================================================
// Page Sink
// ============================================================================

/// Consumer of harvested pages.
///
/// In streaming mode the pool invokes the sink once per successfully
/// fetched page, together with a snapshot of the query parameters that
/// produced it. Implementations with shared mutable state must be safe
/// for concurrent invocation; an error terminates the owning query only.
#[async_trait]
pub trait PageSink: Send + Sync {
    /// Handle one page of item records
    async fn on_page(&self, items: &[JsonValue], params: &QueryParams) -> anyhow::Result<()>;
}

/// [`PageSink`] adapter over a synchronous closure
pub struct FnSink<F>(F);

#[async_trait]
impl<F> PageSink for FnSink<F>
where
    F: Fn(&[JsonValue], &QueryParams) -> anyhow::Result<()> + Send + Sync,
{
    async fn on_page(&self, items: &[JsonValue], params: &QueryParams) -> anyhow::Result<()> {
        (self.0)(items, params)
    }
}

/// Wrap a synchronous closure as a [`PageSink`]
pub fn sink_fn<F>(f: F) -> FnSink<F>
where
    F: Fn(&[JsonValue], &QueryParams) -> anyhow::Result<()> + Send + Sync,
{
    FnSink(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_ordering() {
        let params = QueryParams::new()
            .with("owner", "rust-lang")
            .with("name", "rust")
            .with("fromPage", "1");

        // BTreeMap keeps keys sorted, so pairs come out deterministic
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["fromPage", "name", "owner"]);
    }

    #[test]
    fn test_query_params_overwrite() {
        let mut params = QueryParams::new().with("fromPage", "1");
        params.set("fromPage", "2");
        assert_eq!(params.get("fromPage"), Some("2"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_query_params_remove() {
        let mut params = QueryParams::new().with("after", "abc");
        assert_eq!(params.remove("after"), Some("abc".to_string()));
        assert!(params.is_empty());
    }

    #[test]
    fn test_query_params_display() {
        let params = QueryParams::new().with("name", "rust").with("owner", "a");
        assert_eq!(params.to_string(), "name=rust&owner=a");
    }

    #[test]
    fn test_repo_ref_parse() {
        let repo = RepoRef::parse("pandas-dev/pandas").unwrap();
        assert_eq!(repo.owner, "pandas-dev");
        assert_eq!(repo.name, "pandas");
        assert_eq!(repo.to_string(), "pandas-dev/pandas");

        assert!(RepoRef::parse("no-slash").is_err());
        assert!(RepoRef::parse("/name").is_err());
        assert!(RepoRef::parse("owner/").is_err());
    }

    #[test]
    fn test_item_ref_display() {
        let item = ItemRef::new(RepoRef::new("focus-trap", "focus-trap"), 114);
        assert_eq!(item.to_string(), "focus-trap/focus-trap#114");
    }

    #[test]
    fn test_dependent_kind_wire_values() {
        assert_eq!(DependentKind::Repository.as_str(), "REPOSITORY");
        assert_eq!(DependentKind::Package.as_str(), "PACKAGE");
        assert_eq!(DependentKind::default(), DependentKind::Repository);
    }

    #[test]
    fn test_dependents_spec_package_id_implies_package_kind() {
        let spec = DependentsSpec::new(RepoRef::new("pytorch", "pytorch"))
            .package_id("UGFja2FnZS01MjY1MjIxNQ==");
        assert_eq!(spec.kind, DependentKind::Package);
        assert_eq!(spec.package_id.as_deref(), Some("UGFja2FnZS01MjY1MjIxNQ=="));
    }

    #[tokio::test]
    async fn test_closure_page_sink() {
        let sink = sink_fn(|items: &[JsonValue], _params: &QueryParams| {
            assert_eq!(items.len(), 1);
            Ok(())
        });
        let params = QueryParams::new();
        sink.on_page(&[serde_json::json!({"id": 1})], &params)
            .await
            .unwrap();
    }
}
