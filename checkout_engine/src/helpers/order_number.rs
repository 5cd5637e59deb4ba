use crate::db_types::OrderNumber;

/// Basket ids are shifted by this amount so that order numbers never look like small, guessable integers.
pub const ORDER_NUMBER_OFFSET: i64 = 100_000;

/// Reversible mapping between basket ids and order numbers, of the form `{PREFIX}-{OFFSET + basket_id}`.
///
/// The order number doubles as the gateway's reference number, so it is all we get back to find the basket when a
/// payment notification arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderNumberGenerator {
    prefix: String,
}

impl OrderNumberGenerator {
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn order_number(&self, basket_id: i64) -> OrderNumber {
        OrderNumber(format!("{}-{}", self.prefix, ORDER_NUMBER_OFFSET + basket_id))
    }

    /// Recovers the basket id from an order number. The prefix is not checked, since order numbers issued under a
    /// previous partner code must still resolve.
    ///
    /// Returns `None` if the number part is missing, is not an integer, or does not map to a positive basket id.
    pub fn basket_id(&self, order_number: &str) -> Option<i64> {
        let (_prefix, number) = order_number.rsplit_once('-')?;
        let id = number.parse::<i64>().ok()?.checked_sub(ORDER_NUMBER_OFFSET)?;
        (id > 0).then_some(id)
    }
}
