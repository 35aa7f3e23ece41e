//! Upstream HTTP transport shared by all adapters
//!
//! Wraps a reqwest client with the per-source timeout and retry policy and
//! turns every way an upstream call can go wrong into a [`SourceError`].

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::{RetryPolicy, SourceSettings};
use crate::error::SourceError;

/// Longest upstream body excerpt kept in an error message
const ERROR_BODY_LIMIT: usize = 200;

/// HTTP client for one upstream source
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    source: &'static str,
    timeout: Duration,
    retry: RetryPolicy,
}

impl UpstreamClient {
    pub fn new(source: &'static str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            source,
            timeout,
            retry,
        })
    }

    pub fn from_settings(settings: &SourceSettings) -> Result<Self> {
        Self::new(settings.kind.name(), settings.timeout, settings.retry)
    }

    /// Send a request built by `build` and decode the JSON body
    ///
    /// `build` runs once per attempt. Transient failures are retried after the
    /// policy's fixed backoff; terminal ones return immediately.
    pub async fn send_json<F>(&self, build: F) -> Result<Value, SourceError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.attempt(build(&self.http)).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_transient() && attempt <= self.retry.max_retries => {
                    tracing::warn!(
                        source = self.source,
                        attempt,
                        backoff_ms = self.retry.backoff_ms,
                        error = %err,
                        "Transient upstream failure, retrying"
                    );
                    sleep(self.retry.backoff()).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn attempt(&self, request: RequestBuilder) -> Result<Value, SourceError> {
        let response = request.send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SourceError::Auth {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let body = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        decode_json(&content_type, &body)
    }

    fn classify(&self, err: reqwest::Error) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout(self.timeout)
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

/// Decode a successful body, rejecting HTML error pages served with 200
fn decode_json(content_type: &str, body: &str) -> Result<Value, SourceError> {
    if content_type.contains("text/html") || body.trim_start().starts_with('<') {
        let content_type = if content_type.is_empty() {
            "text/html".to_string()
        } else {
            content_type.to_string()
        };
        return Err(SourceError::ContentType { content_type });
    }

    serde_json::from_str(body).map_err(|e| SourceError::Decode(e.to_string()))
}

/// Base URL and API key, or the reason the source cannot be called
pub fn require_endpoint(settings: &SourceSettings) -> Result<(&str, &str), SourceError> {
    let base_url = settings.base_url.as_deref().ok_or_else(|| {
        SourceError::NotConfigured(format!("{} base_url is not set", settings.kind.name()))
    })?;
    let api_key = settings.api_key.as_deref().ok_or_else(|| {
        SourceError::NotConfigured(format!("{} is not set", settings.key_env))
    })?;
    Ok((base_url.trim_end_matches('/'), api_key))
}
