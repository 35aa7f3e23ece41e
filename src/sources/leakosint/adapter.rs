//! LeakOsint SourceAdapter implementation

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::SourceSettings;
use crate::error::SourceError;
use crate::query::Query;
use crate::sources::traits::SourceAdapter;
use crate::sources::transport::{require_endpoint, UpstreamClient};
use crate::sources::SourceKind;

/// Language of upstream info texts
const RESPONSE_LANG: &str = "ru";

/// LeakOsint source adapter
pub struct LeakOsintAdapter {
    settings: SourceSettings,
    client: UpstreamClient,
}

impl LeakOsintAdapter {
    pub fn new(settings: SourceSettings) -> Result<Self> {
        let client = UpstreamClient::from_settings(&settings)?;
        Ok(Self { settings, client })
    }
}

#[async_trait]
impl SourceAdapter for LeakOsintAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::LeakOsint
    }

    async fn fetch(&self, query: &Query) -> Result<Value, SourceError> {
        let (base_url, token) = require_endpoint(&self.settings)?;
        let url = format!("{}/", base_url);
        let body = json!({
            "token": token,
            "request": query.upstream_value(),
            "limit": self.settings.limit,
            "lang": RESPONSE_LANG,
        });

        let payload = self
            .client
            .send_json(|http| http.post(&url).json(&body))
            .await?;

        check_envelope(payload)
    }
}

/// Rejected requests come back as `{"Error code": "..."}` with status 200
fn check_envelope(payload: Value) -> Result<Value, SourceError> {
    match payload.get("Error code") {
        None => Ok(payload),
        Some(Value::String(message)) => Err(SourceError::Upstream(message.clone())),
        Some(other) => Err(SourceError::Upstream(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_is_upstream_error() {
        let err = check_envelope(json!({"Error code": "bad token"})).unwrap_err();
        assert!(matches!(err, SourceError::Upstream(ref m) if m == "bad token"));
        assert!(!err.is_transient());

        let err = check_envelope(json!({"Error code": 3})).unwrap_err();
        assert!(matches!(err, SourceError::Upstream(ref m) if m == "3"));
    }

    #[test]
    fn test_list_passes_through() {
        let payload = json!({"List": {}, "NumOfResults": 0});
        assert_eq!(check_envelope(payload.clone()).unwrap(), payload);
    }
}
