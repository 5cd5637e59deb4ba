//! Glue between the checkout flow and the outbound REST clients.
pub mod credit;
pub mod sdn;

pub use credit::CreditProviders;
pub use sdn::SdnChecker;
