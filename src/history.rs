//! Report sinks: search history and the summary service
//!
//! The orchestrator forwards every finished [`AggregateReport`] to each
//! configured [`ReportSink`]. Sinks are best-effort; their errors are logged by
//! the caller and never change the search outcome.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

use crate::aggregate::{AggregateReport, SourceSummary};
use crate::config::HistoryConfig;

/// Default timeout for webhook delivery
const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Identity of the user who ran a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: String,
}

impl UserIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Destination for finished reports
#[async_trait]
pub trait ReportSink: Send + Sync {
    fn name(&self) -> &str;

    async fn accept(&self, report: &AggregateReport, user: Option<&UserIdentity>) -> Result<()>;
}

/// One stored search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserIdentity>,
    pub recorded_at: DateTime<Utc>,
    pub report: AggregateReport,
}

impl HistoryEntry {
    fn new(report: &AggregateReport, user: Option<&UserIdentity>) -> Self {
        Self {
            user: user.cloned(),
            recorded_at: Utc::now(),
            report: report.clone(),
        }
    }
}

// =============================================================================
// In-memory history
// =============================================================================

/// Process-local history, newest last
#[derive(Default)]
pub struct MemoryHistory {
    entries: RwLock<Vec<HistoryEntry>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.read().await.clone()
    }

    /// Entries recorded for one user
    pub async fn for_user(&self, user_id: &str) -> Vec<HistoryEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.user.as_ref().is_some_and(|u| u.user_id == user_id))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ReportSink for MemoryHistory {
    fn name(&self) -> &str {
        "memory"
    }

    async fn accept(&self, report: &AggregateReport, user: Option<&UserIdentity>) -> Result<()> {
        self.entries
            .write()
            .await
            .push(HistoryEntry::new(report, user));
        Ok(())
    }
}

// =============================================================================
// JSON-lines history
// =============================================================================

/// Append-only JSON-lines file, one [`HistoryEntry`] per line
pub struct JsonlHistory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every stored entry
    pub async fn load(&self) -> Result<Vec<HistoryEntry>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read history {}", self.path.display()))
            }
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("Malformed history line {}", i + 1))
            })
            .collect()
    }
}

#[async_trait]
impl ReportSink for JsonlHistory {
    fn name(&self) -> &str {
        "jsonl"
    }

    async fn accept(&self, report: &AggregateReport, user: Option<&UserIdentity>) -> Result<()> {
        let mut line = serde_json::to_string(&HistoryEntry::new(report, user))
            .context("Failed to serialize history entry")?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open history {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .context("Failed to append history entry")?;
        file.flush().await?;

        Ok(())
    }
}

// =============================================================================
// Webhook
// =============================================================================

/// Body posted to the webhook
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<&'a UserIdentity>,
    summary: Vec<SourceSummary>,
    report: &'a AggregateReport,
}

/// POSTs the report and its summary input to an external service
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ReportSink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn accept(&self, report: &AggregateReport, user: Option<&UserIdentity>) -> Result<()> {
        let payload = WebhookPayload {
            user,
            summary: report.summary_input(),
            report,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .context("Failed to deliver report to webhook")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Webhook returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            );
        }

        Ok(())
    }
}

/// Sinks named by the history section of the configuration
pub fn sinks_from_config(config: &HistoryConfig) -> Result<Vec<Arc<dyn ReportSink>>> {
    let mut sinks: Vec<Arc<dyn ReportSink>> = Vec::new();

    if let Some(path) = &config.jsonl_path {
        tracing::info!(path = %path, "Recording search history to JSON lines");
        sinks.push(Arc::new(JsonlHistory::new(path)));
    }

    if let Some(url) = &config.webhook_url {
        let timeout = Duration::from_secs(
            config
                .webhook_timeout_secs
                .unwrap_or(DEFAULT_WEBHOOK_TIMEOUT_SECS),
        );
        tracing::info!(url = %url, "Forwarding reports to webhook");
        sinks.push(Arc::new(WebhookSink::new(url, timeout)?));
    }

    Ok(sinks)
}
