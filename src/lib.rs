//! Breach Lookup - multi-source personal data breach search
//!
//! A single query (phone, email, INN, SNILS or social handle) is fanned out to
//! five independent upstream breach/OSINT APIs. Each upstream answers in its
//! own JSON shape; the per-source normalizers reduce those shapes to one
//! canonical [`Record`] list, and the aggregator folds the per-source outcomes
//! into an [`AggregateReport`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Consumers: HTTP API, CLI                                       │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Search Orchestrator                           │
//! │        validate -> aggregate -> forward to report sinks         │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Aggregator                                │
//! │          spawn all adapters, settle all, reduce counts          │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Source Adapters (ITP, Dyxless, LeakOsint, Usersbox, Vektor)    │
//! │        upstream transport -> raw JSON -> normalizer             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use breach_lookup::{BreachLookupConfig, SearchOrchestrator, SearchRequest};
//!
//! let config = BreachLookupConfig::from_file("config/breach_lookup.yaml")?;
//! let orchestrator = SearchOrchestrator::from_config(&config)?;
//!
//! let report = orchestrator
//!     .handle_search(SearchRequest::new("+7 (999) 123-45-67", "phone"), None)
//!     .await?;
//! println!("{} leaks across {} sources", report.total_leaks, report.found_sources);
//! ```

pub mod aggregate;
#[cfg(feature = "server")]
pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod query;
pub mod sources;

// Re-export main types
pub use aggregate::{AggregateReport, Aggregator, SourceSummary};
pub use config::{BreachLookupConfig, RetryPolicy, SourceConfig};
pub use error::{ErrorInfo, ErrorKind, SourceError, ValidationError};
pub use history::{JsonlHistory, MemoryHistory, ReportSink, UserIdentity, WebhookSink};
pub use orchestrator::{SearchOrchestrator, SearchRequest};
pub use query::{FieldKind, Query};
pub use sources::{Record, RecordGroup, SourceAdapter, SourceKind, SourceResult};
