use checkout_clients::{SdnApi, SdnConfig, SdnSearchResult};
use checkout_engine::{db_types::NewSdnCheckFailure, traits::PaymentRecords};
use log::*;

use crate::errors::ServerError;

/// Screens buyers against the consolidated screening list before they are allowed to pay.
///
/// When the list cannot be searched, the check passes: an outage of the screening API should not stop every sale.
/// A match always fails the check, and is recorded for compliance review.
#[derive(Clone)]
pub struct SdnChecker<B> {
    api: Option<SdnApi>,
    db: B,
}

impl<B> SdnChecker<B>
where B: PaymentRecords
{
    /// Creates a checker. If `enabled` is false, every check passes without calling out.
    pub fn new(enabled: bool, config: SdnConfig, db: B) -> Result<Self, ServerError> {
        let api = if enabled {
            Some(SdnApi::new(config).map_err(|e| ServerError::InitializeError(e.to_string()))?)
        } else {
            None
        };
        Ok(Self { api, db })
    }

    pub fn disabled(db: B) -> Self {
        Self { api: None, db }
    }

    pub fn is_enabled(&self) -> bool {
        self.api.is_some()
    }

    /// Returns `true` if the purchase may go ahead.
    pub async fn passes(&self, full_name: &str, address: &str, username: Option<&str>, basket_id: i64) -> bool {
        let Some(api) = &self.api else {
            return true;
        };
        match api.search(full_name, address).await {
            SdnSearchResult::NoMatch => {
                debug!("🔎️ No SDN match for basket #{basket_id}");
                true
            },
            SdnSearchResult::Unavailable(reason) => {
                warn!("🔎️ SDN check for basket #{basket_id} could not be performed and was skipped. {reason}");
                true
            },
            SdnSearchResult::Match { total, response } => {
                warn!("🔎️ SDN check failed for basket #{basket_id}. {total} possible matches for the buyer.");
                let failure = NewSdnCheckFailure {
                    full_name: full_name.to_string(),
                    username: username.map(String::from),
                    sdn_check_response: response,
                    basket_id: Some(basket_id),
                };
                if let Err(e) = self.db.record_sdn_check_failure(failure).await {
                    error!("🔎️ Could not record the SDN check failure for basket #{basket_id}. {e}");
                }
                false
            },
        }
    }
}
