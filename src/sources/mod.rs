//! Upstream breach sources
//!
//! Each source lives in its own module with an adapter (request mapping and
//! upstream error envelopes) and a normalizer (payload shape -> records).
//! [`SourceKind`] is the tagged variant that selects the normalizer for a
//! payload, so the aggregator never needs source-specific logic.

pub mod dyxless;
pub mod itp;
pub mod leakosint;
pub mod normalized;
pub mod traits;
pub mod transport;
pub mod usersbox;
pub mod vektor;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::config::{BreachLookupConfig, RetryPolicy, SourceSettings, DEFAULT_BACKOFF_MS};

pub use dyxless::DyxlessAdapter;
pub use itp::ItpAdapter;
pub use leakosint::LeakOsintAdapter;
pub use normalized::{canonicalize, Record, RecordGroup};
pub use traits::{SourceAdapter, SourceResult};
pub use transport::UpstreamClient;
pub use usersbox::UsersboxAdapter;
pub use vektor::VektorAdapter;

/// The five upstream sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Itp,
    Dyxless,
    LeakOsint,
    Usersbox,
    Vektor,
}

impl SourceKind {
    /// Dispatch order of a search
    pub const ALL: [SourceKind; 5] = [
        Self::Itp,
        Self::Dyxless,
        Self::LeakOsint,
        Self::Usersbox,
        Self::Vektor,
    ];

    /// Display name used in reports
    pub fn name(&self) -> &'static str {
        match self {
            Self::Itp => "ITP",
            Self::Dyxless => "Dyxless",
            Self::LeakOsint => "LeakOsint",
            Self::Usersbox => "Usersbox",
            Self::Vektor => "Vektor",
        }
    }

    /// Environment variable holding the API key unless configured otherwise
    pub fn default_key_env(&self) -> &'static str {
        match self {
            Self::Itp => "ITP_API_KEY",
            Self::Dyxless => "DYXLESS_TOKEN",
            Self::LeakOsint => "LEAKOSINT_TOKEN",
            Self::Usersbox => "USERSBOX_TOKEN",
            Self::Vektor => "VEKTOR_API_KEY",
        }
    }

    /// Public endpoint, where one is known
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Self::Dyxless => Some("https://api-dyxless.cfd"),
            Self::LeakOsint => Some("https://leakosintapi.com"),
            Self::Usersbox => Some("https://api.usersbox.ru/v1"),
            Self::Itp | Self::Vektor => None,
        }
    }

    /// Dyxless serves intermittent HTML error pages and gets one retry
    pub fn default_retry(&self) -> RetryPolicy {
        match self {
            Self::Dyxless => RetryPolicy::once(DEFAULT_BACKOFF_MS),
            _ => RetryPolicy::none(),
        }
    }

    /// Reduce a raw payload of this source to canonical records
    pub fn normalize(&self, payload: &Value) -> Vec<Record> {
        match self {
            Self::Itp => itp::normalize(payload),
            Self::Dyxless => dyxless::normalize(payload),
            Self::LeakOsint => leakosint::normalize(payload),
            Self::Usersbox => usersbox::normalize(payload),
            Self::Vektor => vektor::normalize(payload),
        }
    }

    /// Per-source breakdown; only grouped upstreams produce one
    pub fn group(&self, payload: &Value) -> Vec<RecordGroup> {
        match self {
            Self::Usersbox => usersbox::normalize_groups(payload),
            _ => Vec::new(),
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Build the adapter for one source
pub fn build_adapter(settings: SourceSettings) -> Result<Arc<dyn SourceAdapter>> {
    if settings.api_key.is_none() {
        tracing::warn!(
            source = settings.kind.name(),
            env = %settings.key_env,
            "API key not set, source will report a configuration error"
        );
    }

    let adapter: Arc<dyn SourceAdapter> = match settings.kind {
        SourceKind::Itp => Arc::new(ItpAdapter::new(settings)?),
        SourceKind::Dyxless => Arc::new(DyxlessAdapter::new(settings)?),
        SourceKind::LeakOsint => Arc::new(LeakOsintAdapter::new(settings)?),
        SourceKind::Usersbox => Arc::new(UsersboxAdapter::new(settings)?),
        SourceKind::Vektor => Arc::new(VektorAdapter::new(settings)?),
    };
    Ok(adapter)
}

/// Build all five adapters in dispatch order
pub fn build_adapters(config: &BreachLookupConfig) -> Result<Vec<Arc<dyn SourceAdapter>>> {
    SourceKind::ALL
        .into_iter()
        .map(|kind| build_adapter(config.source_settings(kind)))
        .collect()
}
