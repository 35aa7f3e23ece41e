//! ITP SourceAdapter implementation

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::SourceSettings;
use crate::error::SourceError;
use crate::query::{FieldKind, Query};
use crate::sources::normalized::is_not_found_message;
use crate::sources::traits::SourceAdapter;
use crate::sources::transport::{require_endpoint, UpstreamClient};
use crate::sources::SourceKind;

/// ITP source adapter
pub struct ItpAdapter {
    settings: SourceSettings,
    client: UpstreamClient,
}

impl ItpAdapter {
    pub fn new(settings: SourceSettings) -> Result<Self> {
        let client = UpstreamClient::from_settings(&settings)?;
        Ok(Self { settings, client })
    }
}

#[async_trait]
impl SourceAdapter for ItpAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Itp
    }

    async fn fetch(&self, query: &Query) -> Result<Value, SourceError> {
        let (base_url, api_key) = require_endpoint(&self.settings)?;
        let url = format!("{}/search", base_url);
        let body = json!({
            "searchOptions": [{
                "type": search_type(query.field()),
                "query": query.upstream_value(),
            }]
        });

        let payload = self
            .client
            .send_json(|http| http.post(&url).header("x-api-key", api_key).json(&body))
            .await?;

        check_envelope(payload)
    }
}

/// ITP search type vocabulary
fn search_type(field: FieldKind) -> &'static str {
    match field {
        FieldKind::Phone => "phone",
        FieldKind::Email => "email",
        FieldKind::Inn => "inn",
        FieldKind::Snils => "snils",
        FieldKind::Vk | FieldKind::Ok | FieldKind::Username => "username",
    }
}

/// ITP reports failures as `{"error": "..."}` with status 200
fn check_envelope(payload: Value) -> Result<Value, SourceError> {
    match payload.get("error").and_then(Value::as_str) {
        Some(message) if is_not_found_message(message) => Ok(json!({})),
        Some(message) => Err(SourceError::Upstream(message.to_string())),
        None => Ok(payload),
    }
}
