//! Dyxless SourceAdapter implementation

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

/// Dyxless source adapter
pub struct DyxlessAdapter {
    settings: SourceSettings,
    client: UpstreamClient,
}

impl DyxlessAdapter {
    pub fn new(settings: SourceSettings) -> Result<Self> {
        let client = UpstreamClient::from_settings(&settings)?;
        Ok(Self { settings, client })
    }
}

#[async_trait]
impl SourceAdapter for DyxlessAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Dyxless
    }

    async fn fetch(&self, query: &Query) -> Result<Value, SourceError> {
        let (base_url, token) = require_endpoint(&self.settings)?;
        let url = format!("{}/query", base_url);
        let body = json!({
            "query": query.upstream_value(),
            "token": token,
        });

        let payload = self
            .client
            .send_json(|http| http.post(&url).json(&body))
            .await?;

        check_envelope(payload)
    }
}

/// `{"status": false, "message": ...}` is an upstream failure unless the
/// message only says nothing matched
fn check_envelope(payload: Value) -> Result<Value, SourceError> {
    if payload.get("status").and_then(Value::as_bool) != Some(false) {
        return Ok(payload);
    }

    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("request rejected");

    if is_not_found_message(message) {
        Ok(json!({"status": true, "data": []}))
    } else {
        Err(SourceError::Upstream(message.to_string()))
    }
}
