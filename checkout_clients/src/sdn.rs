use std::sync::Arc;

use log::*;
use reqwest::Client;
use serde_json::Value;

use crate::{config::SdnConfig, ApiClientError};

/// What a search of the screening list turned up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdnSearchResult {
    NoMatch,
    /// At least one entry matched. `response` is the raw body, kept for the audit record.
    Match { total: u64, response: String },
    /// The list could not be searched. The reason is for logging only.
    Unavailable(String),
}

#[derive(Clone)]
pub struct SdnApi {
    config: SdnConfig,
    client: Arc<Client>,
}

impl SdnApi {
    pub fn new(config: SdnConfig) -> Result<Self, ApiClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ApiClientError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Searches the screening list for an individual. An empty `address` is left out of the query.
    pub async fn search(&self, name: &str, address: &str) -> SdnSearchResult {
        match self.query(name, address).await {
            Ok(response) => match total(&response) {
                Ok(0) => SdnSearchResult::NoMatch,
                Ok(total) => SdnSearchResult::Match { total, response },
                Err(e) => {
                    warn!("🔎️ Unexpected response from the SDN API. {e}");
                    SdnSearchResult::Unavailable(e.to_string())
                },
            },
            Err(e) => {
                warn!("🔎️ Unable to connect to the SDN API. {e}");
                SdnSearchResult::Unavailable(e.to_string())
            },
        }
    }

    async fn query(&self, name: &str, address: &str) -> Result<String, ApiClientError> {
        let mut params = vec![
            ("sources", self.config.sources.as_str()),
            ("api_key", self.config.api_key.reveal().as_str()),
            ("type", "individual"),
            ("name", name),
        ];
        if !address.is_empty() {
            params.push(("address", address));
        }
        trace!("🔎️ Searching the SDN list at {}", self.config.api_url);
        let response = self.client.get(&self.config.api_url).query(&params).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(ApiClientError::QueryError { status: status.as_u16(), message: body })
        }
    }
}

fn total(body: &str) -> Result<u64, ApiClientError> {
    let json = serde_json::from_str::<Value>(body).map_err(|e| ApiClientError::JsonError(e.to_string()))?;
    json["total"].as_u64().ok_or_else(|| ApiClientError::JsonError(format!("No 'total' in response: {body}")))
}
