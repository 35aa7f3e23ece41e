//! Usersbox SourceAdapter implementation

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::SourceSettings;
use crate::error::SourceError;
use crate::query::Query;
use crate::sources::normalized::is_not_found_message;
use crate::sources::traits::SourceAdapter;
use crate::sources::transport::{require_endpoint, UpstreamClient};
use crate::sources::SourceKind;

/// Usersbox source adapter
pub struct UsersboxAdapter {
    settings: SourceSettings,
    client: UpstreamClient,
}

impl UsersboxAdapter {
    pub fn new(settings: SourceSettings) -> Result<Self> {
        let client = UpstreamClient::from_settings(&settings)?;
        Ok(Self { settings, client })
    }
}

#[async_trait]
impl SourceAdapter for UsersboxAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Usersbox
    }

    async fn fetch(&self, query: &Query) -> Result<Value, SourceError> {
        let (base_url, token) = require_endpoint(&self.settings)?;
        let url = format!("{}/search", base_url);
        let q = query.upstream_value();

        let payload = self
            .client
            .send_json(|http| {
                http.get(&url)
                    .header(reqwest::header::AUTHORIZATION, token)
                    .query(&[("q", q.as_str())])
            })
            .await?;

        check_envelope(payload)
    }
}

/// `{"status": "error", "error": {"code", "message"}}` envelope
fn check_envelope(payload: Value) -> Result<Value, SourceError> {
    if payload.get("status").and_then(Value::as_str) != Some("error") {
        return Ok(payload);
    }

    let error = payload.get("error");
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .or_else(|| error.and_then(Value::as_str))
        .unwrap_or("request rejected");

    if is_not_found_message(message) {
        Ok(json!({"status": "success", "data": {"count": 0, "items": []}}))
    } else {
        Err(SourceError::Upstream(message.to_string()))
    }
}
