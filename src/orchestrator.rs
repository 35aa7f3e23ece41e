//! Search entry point
//!
//! `received -> validated -> dispatched -> aggregated -> persisted -> returned`.
//! Validation is the only step that can fail. Persistence runs in background
//! tasks and never delays or fails the response.

use anyhow::Result;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use crate::aggregate::{AggregateReport, Aggregator};
use crate::config::BreachLookupConfig;
use crate::error::ValidationError;
use crate::history::{sinks_from_config, ReportSink, UserIdentity};
use crate::query::Query;

/// Raw search input as submitted by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub value: String,
    pub field: String,
}

impl SearchRequest {
    pub fn new(value: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            field: field.into(),
        }
    }
}

/// Validates queries, runs the aggregator and forwards reports to sinks
///
/// Clones share the set of in-flight sink deliveries.
#[derive(Clone)]
pub struct SearchOrchestrator {
    aggregator: Aggregator,
    sinks: Vec<Arc<dyn ReportSink>>,
    /// Sink deliveries that may still be running
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl SearchOrchestrator {
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            aggregator,
            sinks: Vec::new(),
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Adapters and sinks as described by the configuration
    pub fn from_config(config: &BreachLookupConfig) -> Result<Self> {
        let aggregator = Aggregator::from_config(config)?;
        let orchestrator = sinks_from_config(&config.history)?
            .into_iter()
            .fold(Self::new(aggregator), Self::with_sink);
        Ok(orchestrator)
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.aggregator.source_names()
    }

    /// Run one search
    ///
    /// Returns a [`ValidationError`] without contacting any upstream when the
    /// input is rejected. Otherwise always returns a report, even when every
    /// source failed.
    pub async fn handle_search(
        &self,
        request: SearchRequest,
        user: Option<UserIdentity>,
    ) -> Result<AggregateReport, ValidationError> {
        let query = Query::parse(&request.value, &request.field)
            .inspect_err(|_| tracing::info!(field = %request.field, "Search rejected"))?;

        tracing::debug!(field = %query.field(), "Dispatching search");
        let report = self.aggregator.aggregate(&query).await;

        self.persist(&report, user);

        Ok(report)
    }

    /// Wait for every sink delivery started so far
    ///
    /// Callers that exit right after a search (the CLI, server shutdown) use
    /// this so background deliveries are not cut off.
    pub async fn flush_sinks(&self) {
        let handles = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for result in join_all(handles).await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Sink delivery task failed");
            }
        }
    }

    /// Hand the report to every sink without waiting for them
    fn persist(&self, report: &AggregateReport, user: Option<UserIdentity>) {
        if self.sinks.is_empty() {
            return;
        }

        let report = Arc::new(report.clone());
        let user = user.map(Arc::new);
        let handles = self.sinks.iter().map(|sink| {
            let sink = Arc::clone(sink);
            let report = Arc::clone(&report);
            let user = user.clone();
            tokio::spawn(async move {
                if let Err(e) = sink.accept(&report, user.as_deref()).await {
                    tracing::warn!(
                        sink = sink.name(),
                        report_id = %report.id,
                        error = %e,
                        "Failed to forward report"
                    );
                }
            })
        });

        let mut pending = match self.pending.lock() {
            Ok(pending) => pending,
            Err(poisoned) => poisoned.into_inner(),
        };
        pending.retain(|handle| !handle.is_finished());
        pending.extend(handles);
    }
}
