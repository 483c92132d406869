//! CKAN action API client.

use super::{Catalog, CatalogError, DatasetRecord, OrgRecord};
use crate::config::CatalogConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// CKAN response envelope shared by every action.
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl Envelope {
    fn error_message(&self) -> String {
        self.error
            .as_ref()
            .and_then(|err| err.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_owned()
    }
}

/// Catalog client for a CKAN instance (`/api/3/action/*`).
#[derive(Debug, Clone)]
pub struct CkanClient {
    endpoint: String,
    client: reqwest::Client,
}

impl CkanClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("storyfold/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint().to_owned(),
            client,
        })
    }

    fn action_url(&self, action: &str) -> String {
        format!("{}/api/3/action/{action}", self.endpoint)
    }

    async fn show(&self, action: &str, query: &[(&str, &str)]) -> Result<Value, CatalogError> {
        let response = self
            .client
            .get(self.action_url(action))
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let envelope: Option<Envelope> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                message: envelope.map_or_else(|| text.trim().to_owned(), |e| e.error_message()),
            });
        }

        let envelope = envelope
            .ok_or_else(|| CatalogError::Decode(format!("`{action}` did not return a CKAN envelope")))?;
        if !envelope.success {
            return Err(CatalogError::Api {
                message: envelope.error_message(),
            });
        }

        envelope
            .result
            .ok_or_else(|| CatalogError::Decode(format!("`{action}` returned no result")))
    }
}

#[async_trait]
impl Catalog for CkanClient {
    async fn get_dataset_details(&self, name: &str) -> Result<DatasetRecord, CatalogError> {
        self.show("package_show", &[("id", name)]).await
    }

    async fn get_org_details(&self, name: &str) -> Result<OrgRecord, CatalogError> {
        self.show("organization_show", &[("id", name), ("include_datasets", "true")])
            .await
    }
}
