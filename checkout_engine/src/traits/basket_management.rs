use thiserror::Error;

use crate::db_types::{Basket, BasketStatus, Voucher};

#[derive(Debug, Clone, Error)]
pub enum BasketError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Basket #{0} does not exist")]
    NotFound(i64),
    #[error("Basket #{id} cannot move from {from} to {to}")]
    IllegalStatusChange { id: i64, from: BasketStatus, to: BasketStatus },
}

impl From<sqlx::Error> for BasketError {
    fn from(e: sqlx::Error) -> Self {
        BasketError::DatabaseError(e.to_string())
    }
}

/// Read access to baskets and vouchers, plus the one basket mutation the checkout flow is allowed to make before an
/// order exists: freezing.
///
/// Baskets returned from these methods are fully populated, i.e. `lines` is filled in. Line discounts are always zero
/// until offers are applied (see [`crate::offers::apply_offers`]).
#[allow(async_fn_in_trait)]
pub trait BasketManagement {
    async fn fetch_basket(&self, basket_id: i64) -> Result<Option<Basket>, BasketError>;

    /// Returns the most recent `Open` basket owned by the user on the given site, if there is one.
    async fn fetch_open_basket_for_user(&self, user_id: i64, site: &str) -> Result<Option<Basket>, BasketError>;

    async fn fetch_voucher(&self, code: &str) -> Result<Option<Voucher>, BasketError>;

    /// Moves the basket from `Open` to `Frozen`. Once frozen, the basket contents can no longer change, which
    /// guarantees that the amount the customer is charged matches the basket that the order is eventually built from.
    ///
    /// Returns [`BasketError::IllegalStatusChange`] if the basket is not `Open`.
    async fn freeze_basket(&self, basket_id: i64) -> Result<Basket, BasketError>;
}
