use std::{collections::BTreeMap, sync::Arc};

use log::*;
use reqwest::Client;
use serde_json::Value;

use crate::{config::LmsConfig, ApiClientError};

/// Client for the LMS credit API.
#[derive(Clone)]
pub struct CreditApi {
    config: LmsConfig,
    client: Arc<Client>,
}

impl CreditApi {
    pub fn new(config: LmsConfig) -> Result<Self, ApiClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ApiClientError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api/credit/v1{path}", self.config.lms_url_root.trim_end_matches('/'))
    }

    async fn get_json(&self, access_token: &str, path: &str, params: &[(&str, &str)]) -> Result<Value, ApiClientError> {
        let url = self.url(path);
        trace!("🎓️ Fetching {url}");
        let mut req = self.client.get(url).bearer_auth(access_token);
        if !params.is_empty() {
            req = req.query(params);
        }
        let response = req.send().await?;
        if response.status().is_success() {
            response.json::<Value>().await.map_err(|e| ApiClientError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await?;
            Err(ApiClientError::QueryError { status, message })
        }
    }

    /// Fetches the details of a single credit provider. Returns `None` if the LMS could not be reached, timed out,
    /// or answered with anything but a JSON success response.
    pub async fn provider_details(&self, access_token: &str, provider_id: &str) -> Option<Value> {
        let path = format!("/providers/{provider_id}/");
        match self.get_json(access_token, &path, &[]).await {
            Ok(details) => Some(details),
            Err(e) => {
                error!("🎓️ Failed to retrieve credit provider details for provider [{provider_id}]. {e}");
                None
            },
        }
    }

    /// Fetches several credit providers at once, keyed by provider id. Any failure gives an empty map.
    pub async fn providers(&self, access_token: &str, provider_ids: &[String]) -> BTreeMap<String, Value> {
        if provider_ids.is_empty() {
            return BTreeMap::new();
        }
        let ids = provider_ids.join(",");
        let providers = match self.get_json(access_token, "/providers/", &[("provider_ids", ids.as_str())]).await {
            Ok(Value::Array(providers)) => providers,
            Ok(other) => {
                error!("🎓️ Expected a list of credit providers, got {other}");
                return BTreeMap::new();
            },
            Err(e) => {
                error!("🎓️ Failed to retrieve credit provider details for [{ids}]. {e}");
                return BTreeMap::new();
            },
        };
        providers
            .into_iter()
            .filter_map(|p| p["id"].as_str().map(|id| (id.to_string(), p.clone())))
            .collect()
    }
}
