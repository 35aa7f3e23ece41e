//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use breach_lookup::{
    Aggregator, Query, SearchOrchestrator, SourceAdapter, SourceError, SourceKind,
};

// =============================================================================
// Mock upstream
// =============================================================================

/// Serve `app` on an ephemeral local port and return its base URL
pub async fn spawn_upstream(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind TCP listener");
    let addr = listener.local_addr().expect("Failed to get local address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock upstream failed");
    });

    format!("http://{}", addr)
}

// =============================================================================
// Fake adapters
// =============================================================================

/// What a fake adapter does when called
#[derive(Clone)]
pub enum Behavior {
    Respond(Value),
    Timeout,
    Unauthorized,
    Panic,
}

/// Scripted adapter that counts its calls and records the values it saw
#[derive(Clone)]
pub struct FakeAdapter {
    kind: SourceKind,
    behavior: Behavior,
    delay: Duration,
    pub calls: Arc<AtomicUsize>,
    pub seen: Arc<Mutex<Vec<String>>>,
}

impl FakeAdapter {
    pub fn new(kind: SourceKind, behavior: Behavior) -> Self {
        Self {
            kind,
            behavior,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answers with one record in the source's own payload shape
    pub fn with_one_record(kind: SourceKind) -> Self {
        Self::new(kind, Behavior::Respond(one_record_payload(kind)))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_values(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceAdapter for FakeAdapter {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self, query: &Query) -> Result<Value, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(query.upstream_value());

        tokio::time::sleep(self.delay).await;

        match &self.behavior {
            Behavior::Respond(payload) => Ok(payload.clone()),
            Behavior::Timeout => Err(SourceError::Timeout(self.delay)),
            Behavior::Unauthorized => Err(SourceError::Auth { status: 401 }),
            Behavior::Panic => panic!("adapter exploded"),
        }
    }
}

/// A payload holding exactly one record, shaped the way `kind` answers
pub fn one_record_payload(kind: SourceKind) -> Value {
    match kind {
        SourceKind::Itp => json!({"DB1": {"data": [{"phone": "89991234567", "pol": "1"}]}}),
        SourceKind::Dyxless => json!({
            "status": true,
            "counts": 1,
            "data": [{"source": "CDEK", "phone": "79991234567"}]
        }),
        SourceKind::LeakOsint => json!({
            "List": {"VK 2012": {"InfoLeak": "VK dump", "Data": [{"Phone": "79991234567"}]}}
        }),
        SourceKind::Usersbox => json!({
            "status": "success",
            "data": {"count": 1, "items": [{
                "source": {"database": "yandex", "collection": "eda"},
                "hits": {"items": [{"_score": 3.5, "phone": "79991234567"}]}
            }]}
        }),
        SourceKind::Vektor => json!([{"base": "Avito", "phone": "79991234567"}]),
    }
}

/// One fake per source, every one answering with a single record
pub fn fakes_with_one_record() -> Vec<FakeAdapter> {
    SourceKind::ALL
        .into_iter()
        .map(FakeAdapter::with_one_record)
        .collect()
}

pub fn aggregator(fakes: &[FakeAdapter]) -> Aggregator {
    let adapters: Vec<Arc<dyn SourceAdapter>> = fakes
        .iter()
        .map(|f| Arc::new(f.clone()) as Arc<dyn SourceAdapter>)
        .collect();
    Aggregator::new(adapters)
}

pub fn orchestrator(fakes: &[FakeAdapter]) -> SearchOrchestrator {
    SearchOrchestrator::new(aggregator(fakes))
}

pub fn total_calls(fakes: &[FakeAdapter]) -> usize {
    fakes.iter().map(FakeAdapter::call_count).sum()
}
