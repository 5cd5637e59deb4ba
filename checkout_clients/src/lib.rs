//! Outbound REST clients.
//!
//! Both APIs are best-effort lookups. Their public methods never return errors: failures are logged and reported as
//! "unavailable" (SDN) or "no data" (credit providers), and the caller decides what a safe default is.
mod config;
mod credit;
mod error;
mod sdn;

pub use config::{LmsConfig, SdnConfig};
pub use credit::CreditApi;
pub use error::ApiClientError;
pub use sdn::{SdnApi, SdnSearchResult};
