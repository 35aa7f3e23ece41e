//! Vektor SourceAdapter implementation

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::SourceSettings;
use crate::error::SourceError;
use crate::query::{FieldKind, Query};
use crate::sources::traits::SourceAdapter;
use crate::sources::transport::{require_endpoint, UpstreamClient};
use crate::sources::SourceKind;

/// Vektor source adapter
pub struct VektorAdapter {
    settings: SourceSettings,
    client: UpstreamClient,
}

impl VektorAdapter {
    pub fn new(settings: SourceSettings) -> Result<Self> {
        let client = UpstreamClient::from_settings(&settings)?;
        Ok(Self { settings, client })
    }
}

#[async_trait]
impl SourceAdapter for VektorAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Vektor
    }

    async fn fetch(&self, query: &Query) -> Result<Value, SourceError> {
        let (base_url, api_key) = require_endpoint(&self.settings)?;
        let url = format!("{}/search", base_url);
        let value = query.upstream_value();
        let search_type = search_type(query.field());

        let result = self
            .client
            .send_json(|http| {
                http.get(&url)
                    .bearer_auth(api_key)
                    .query(&[("type", search_type), ("value", value.as_str())])
            })
            .await;

        match result {
            Err(SourceError::Status { status: 404, .. }) => Ok(json!([])),
            other => other,
        }
    }
}

fn search_type(field: FieldKind) -> &'static str {
    if field.is_handle() {
        "username"
    } else {
        field.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_type_mapping() {
        assert_eq!(search_type(FieldKind::Phone), "phone");
        assert_eq!(search_type(FieldKind::Inn), "inn");
        assert_eq!(search_type(FieldKind::Vk), "username");
        assert_eq!(search_type(FieldKind::Username), "username");
    }
}
