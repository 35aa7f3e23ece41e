//! Concurrent fan-out over all sources and report assembly
//!
//! Every adapter runs in its own tokio task. All tasks are awaited to
//! completion; a failure, timeout or panic in one never cancels the others.

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::BreachLookupConfig;
use crate::error::ErrorInfo;
use crate::query::Query;
use crate::sources::{build_adapters, SourceAdapter, SourceResult};

// =============================================================================
// Report Types
// =============================================================================

/// Outcome of one search across all sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReport {
    pub id: Uuid,
    pub query: Query,
    /// Sum of `count` over successful sources
    pub total_leaks: usize,
    /// Number of sources with at least one record
    pub found_sources: usize,
    pub results: Vec<SourceResult>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub elapsed_ms: u64,
}

/// Per-source line handed to the summary service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub name: String,
    pub ok: bool,
    pub found: bool,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AggregateReport {
    /// Build a report; the totals are derived from `results`
    pub fn new(query: Query, results: Vec<SourceResult>) -> Self {
        let total_leaks = results.iter().filter(|r| r.ok).map(|r| r.count).sum();
        let found_sources = results.iter().filter(|r| r.found).count();

        Self {
            id: Uuid::new_v4(),
            query,
            total_leaks,
            found_sources,
            results,
            timestamp: Utc::now(),
            elapsed_ms: 0,
        }
    }

    /// Compact per-source view, one entry per source regardless of outcome
    pub fn summary_input(&self) -> Vec<SourceSummary> {
        self.results
            .iter()
            .map(|r| SourceSummary {
                name: r.name.clone(),
                ok: r.ok,
                found: r.found,
                count: r.count,
                error: r.error.as_ref().map(|e| e.message.clone()),
            })
            .collect()
    }

    /// Result of the named source
    pub fn result(&self, name: &str) -> Option<&SourceResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

// =============================================================================
// Aggregator
// =============================================================================

/// Runs a query against every adapter and folds the outcomes
#[derive(Clone)]
pub struct Aggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl Aggregator {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    pub fn from_config(config: &BreachLookupConfig) -> Result<Self> {
        Ok(Self::new(build_adapters(config)?))
    }

    /// Adapter names in dispatch order
    pub fn source_names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Search all sources concurrently and wait for every one of them
    pub async fn aggregate(&self, query: &Query) -> AggregateReport {
        let started = Instant::now();

        let tasks = self.adapters.iter().map(|adapter| {
            let adapter = Arc::clone(adapter);
            let query = query.clone();
            let span = tracing::info_span!("source", source = adapter.name());
            tokio::spawn(async move { adapter.search(&query).await }.instrument(span))
        });
        let joined = join_all(tasks).await;

        let results: Vec<SourceResult> = joined
            .into_iter()
            .zip(&self.adapters)
            .map(|(outcome, adapter)| match outcome {
                Ok(result) => result,
                Err(err) => {
                    tracing::error!(source = adapter.name(), error = %err, "Adapter task failed");
                    SourceResult::failure(
                        adapter.name(),
                        ErrorInfo::internal(format!("adapter task failed: {}", err)),
                    )
                }
            })
            .collect();

        let mut report = AggregateReport::new(query.clone(), results);
        report.elapsed_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            report_id = %report.id,
            field = %query.field(),
            total_leaks = report.total_leaks,
            found_sources = report.found_sources,
            elapsed_ms = report.elapsed_ms,
            "Search aggregated"
        );

        report
    }
}
