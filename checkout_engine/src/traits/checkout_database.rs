use crate::traits::{AccountManagement, BasketManagement, OrderManagement, PaymentRecords};

/// The highest-level backend contract. Anything that implements it can drive every checkout API.
pub trait CheckoutDatabase: AccountManagement + BasketManagement + OrderManagement + PaymentRecords {
    /// The URL of the database
    fn url(&self) -> &str;
}
