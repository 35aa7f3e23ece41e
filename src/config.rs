//! Service configuration
//!
//! Loaded from YAML (`config/breach_lookup.yaml` by default). Every field is
//! optional; per-source defaults come from [`SourceKind`]. API keys never live
//! in the file: each source names the environment variable holding its key.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::sources::SourceKind;

/// Default per-call upstream timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Default fixed backoff between attempts
pub const DEFAULT_BACKOFF_MS: u64 = 600;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BreachLookupConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

fn default_addr() -> String {
    "0.0.0.0:8080".to_string()
}

/// Where finished reports are forwarded
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HistoryConfig {
    /// Append every report to this JSON-lines file
    #[serde(default)]
    pub jsonl_path: Option<String>,
    /// POST every report to this URL (summary service, external history)
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub webhook_timeout_secs: Option<u64>,
}

/// Per-source sections
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub itp: SourceConfig,
    #[serde(default)]
    pub dyxless: SourceConfig,
    #[serde(default)]
    pub leakosint: SourceConfig,
    #[serde(default)]
    pub usersbox: SourceConfig,
    #[serde(default)]
    pub vektor: SourceConfig,
}

impl SourcesConfig {
    pub fn get(&self, kind: SourceKind) -> &SourceConfig {
        match kind {
            SourceKind::Itp => &self.itp,
            SourceKind::Dyxless => &self.dyxless,
            SourceKind::LeakOsint => &self.leakosint,
            SourceKind::Usersbox => &self.usersbox,
            SourceKind::Vektor => &self.vektor,
        }
    }
}

/// Retry behaviour for transient upstream failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_backoff_ms() -> u64 {
    DEFAULT_BACKOFF_MS
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_ms: DEFAULT_BACKOFF_MS,
        }
    }

    pub fn once(backoff_ms: u64) -> Self {
        Self {
            max_retries: 1,
            backoff_ms,
        }
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// One source section as written in the file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
    /// Result cap for sources that accept one (LeakOsint)
    #[serde(default)]
    pub limit: Option<u32>,
}

impl SourceConfig {
    /// Fill gaps with the source's defaults and read its key from the environment
    pub fn resolve(&self, kind: SourceKind) -> SourceSettings {
        let key_env = self
            .api_key_env
            .clone()
            .unwrap_or_else(|| kind.default_key_env().to_string());
        let api_key = std::env::var(&key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        SourceSettings {
            kind,
            base_url: self
                .base_url
                .clone()
                .or_else(|| kind.default_base_url().map(str::to_string)),
            api_key,
            key_env,
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            retry: self.retry.unwrap_or_else(|| kind.default_retry()),
            limit: self.limit.unwrap_or(100),
        }
    }
}

/// Fully resolved settings an adapter is built from
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub kind: SourceKind,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Variable the key was looked up in, for diagnostics
    pub key_env: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub limit: u32,
}

impl SourceSettings {
    /// Settings pointing at an explicit endpoint with an explicit key
    pub fn new(kind: SourceKind, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            base_url: Some(base_url.into()),
            api_key: Some(api_key.into()),
            key_env: kind.default_key_env().to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: kind.default_retry(),
            limit: 100,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn without_key(mut self) -> Self {
        self.api_key = None;
        self
    }
}

impl BreachLookupConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse config file {}", path))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: BreachLookupConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &str) -> Result<Self> {
        if std::path::Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn source_settings(&self, kind: SourceKind) -> SourceSettings {
        self.sources.get(kind).resolve(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
server:
  addr: "127.0.0.1:9000"

history:
  jsonl_path: "data/history.jsonl"

sources:
  itp:
    base_url: "https://itp.internal/api"
    api_key_env: "ITP_TEST_KEY_UNSET"
    timeout_secs: 5
  dyxless:
    retry:
      max_retries: 2
      backoff_ms: 100
"#;

        let config = BreachLookupConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.addr, "127.0.0.1:9000");
        assert_eq!(
            config.history.jsonl_path.as_deref(),
            Some("data/history.jsonl")
        );

        let itp = config.source_settings(SourceKind::Itp);
        assert_eq!(itp.base_url.as_deref(), Some("https://itp.internal/api"));
        assert_eq!(itp.timeout, Duration::from_secs(5));
        assert_eq!(itp.key_env, "ITP_TEST_KEY_UNSET");
        assert!(itp.api_key.is_none());
        assert_eq!(itp.retry, RetryPolicy::none());

        let dyxless = config.source_settings(SourceKind::Dyxless);
        assert_eq!(dyxless.retry.max_retries, 2);
        assert_eq!(dyxless.retry.backoff(), Duration::from_millis(100));
    }

    #[test]
    fn test_defaults_per_source() {
        let config = BreachLookupConfig::default();
        assert_eq!(config.server.addr, "0.0.0.0:8080");

        let dyxless = config.source_settings(SourceKind::Dyxless);
        assert_eq!(dyxless.retry, RetryPolicy::once(600));
        assert_eq!(dyxless.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let leakosint = config.source_settings(SourceKind::LeakOsint);
        assert!(leakosint.base_url.is_some());
        assert_eq!(leakosint.retry.max_retries, 0);

        // No public endpoint is known for these two; they must be configured
        assert!(config.source_settings(SourceKind::Itp).base_url.is_none());
        assert!(config.source_settings(SourceKind::Vektor).base_url.is_none());
    }

    #[test]
    fn test_sample_config_parses() {
        let config = BreachLookupConfig::from_file("config/breach_lookup.yaml").unwrap();
        assert!(config.history.jsonl_path.is_some());
        assert_eq!(
            config.source_settings(SourceKind::Dyxless).retry,
            RetryPolicy::once(600)
        );
        assert_eq!(config.source_settings(SourceKind::LeakOsint).limit, 100);
    }

    #[test]
    fn test_retry_section_defaults_backoff() {
        let yaml = r#"
sources:
  vektor:
    retry:
      max_retries: 1
"#;
        let config = BreachLookupConfig::from_yaml(yaml).unwrap();
        let vektor = config.source_settings(SourceKind::Vektor);
        assert_eq!(vektor.retry, RetryPolicy::once(DEFAULT_BACKOFF_MS));
    }
}
