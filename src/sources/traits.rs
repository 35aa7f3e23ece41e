//! SourceAdapter trait and per-source result type
//!
//! The core abstraction for pluggable upstream breach sources.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};

use super::normalized::{Record, RecordGroup};
use super::SourceKind;
use crate::error::{ErrorInfo, SourceError};
use crate::query::Query;

// =============================================================================
// Result Types
// =============================================================================

/// Outcome of one adapter for one query
///
/// `ok == false` means the call itself failed; `ok && !found` means the call
/// succeeded with zero matches. `found` always equals `ok && count > 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceResult {
    pub name: String,
    pub ok: bool,
    pub found: bool,
    pub count: usize,
    pub data: Vec<Record>,
    /// Per-source breakdown for grouped upstreams
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<RecordGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    #[serde(default)]
    pub elapsed_ms: u64,
}

impl SourceResult {
    /// Successful call; count is the number of normalized records
    pub fn success(name: impl Into<String>, data: Vec<Record>) -> Self {
        let count = data.len();
        Self {
            name: name.into(),
            ok: true,
            found: count > 0,
            count,
            data,
            groups: Vec::new(),
            error: None,
            elapsed_ms: 0,
        }
    }

    pub fn failure(name: impl Into<String>, error: ErrorInfo) -> Self {
        Self {
            name: name.into(),
            ok: false,
            found: false,
            count: 0,
            data: Vec::new(),
            groups: Vec::new(),
            error: Some(error),
            elapsed_ms: 0,
        }
    }

    pub fn with_groups(mut self, groups: Vec<RecordGroup>) -> Self {
        self.groups = groups;
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = elapsed.as_millis() as u64;
        self
    }
}

// =============================================================================
// Trait Definition
// =============================================================================

/// Trait for pluggable upstream breach sources
///
/// Implementors only provide [`fetch`](SourceAdapter::fetch); the provided
/// [`search`](SourceAdapter::search) normalizes the payload with the source's
/// normalizer and converts every failure into a `SourceResult`.
///
/// # Implementation Notes
///
/// - Map the query's field to the upstream vocabulary inside `fetch`
/// - Use [`Query::upstream_value`] so pasted profile links become handles
/// - Report "zero matches" envelopes as an empty payload, not as an error
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Which upstream this adapter talks to
    fn kind(&self) -> SourceKind;

    /// Display name used to label results
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Perform the upstream call and return its decoded payload
    async fn fetch(&self, query: &Query) -> Result<Value, SourceError>;

    /// Query the upstream and normalize its answer. Never fails.
    async fn search(&self, query: &Query) -> SourceResult {
        let started = Instant::now();
        let kind = self.kind();

        let result = match self.fetch(query).await {
            Ok(payload) => {
                let records = kind.normalize(&payload);
                let groups = kind.group(&payload);
                tracing::debug!(
                    source = self.name(),
                    records = records.len(),
                    "Upstream answered"
                );
                SourceResult::success(self.name(), records).with_groups(groups)
            }
            Err(err) => {
                tracing::warn!(
                    source = self.name(),
                    kind = %err.kind(),
                    error = %err,
                    "Upstream call failed"
                );
                SourceResult::failure(self.name(), ErrorInfo::from(&err))
            }
        };

        result.with_elapsed(started.elapsed())
    }
}
