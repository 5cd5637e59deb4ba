use std::collections::BTreeMap;

use checkout_clients::{CreditApi, LmsConfig};
use checkout_common::Secret;
use checkout_engine::db_types::Order;
use serde_json::Value;

use crate::errors::ServerError;

/// Fetches the credit providers behind an order's lines, for display on the receipt.
#[derive(Clone)]
pub struct CreditProviders {
    api: CreditApi,
    access_token: Secret<String>,
}

impl CreditProviders {
    pub fn new(config: LmsConfig, access_token: Secret<String>) -> Result<Self, ServerError> {
        let api = CreditApi::new(config).map_err(|e| ServerError::InitializeError(e.to_string()))?;
        Ok(Self { api, access_token })
    }

    /// Provider details keyed by provider id. Empty if no line carries credit, or if the LMS could not be reached.
    pub async fn for_order(&self, order: &Order) -> BTreeMap<String, Value> {
        let ids = provider_ids(order);
        self.api.providers(self.access_token.reveal(), &ids).await
    }
}

/// The distinct credit providers on an order, in line order.
pub fn provider_ids(order: &Order) -> Vec<String> {
    let mut ids = Vec::new();
    for provider in order.lines.iter().filter_map(|l| l.credit_provider.as_ref()) {
        if !ids.contains(provider) {
            ids.push(provider.clone());
        }
    }
    ids
}
