use thiserror::Error;

use crate::db_types::{BasketStatus, NewOrder, Order, OrderNumber};

#[derive(Debug, Clone, Error)]
pub enum OrderError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderNumber),
    #[error("Basket #{0} does not exist")]
    BasketNotFound(i64),
    #[error("An order cannot be placed for basket #{id} while it is {status}")]
    BasketNotPayable { id: i64, status: BasketStatus },
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        OrderError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Places an order in a single atomic transaction:
    /// * the order row is inserted. If an order with the same number already exists,
    ///   [`OrderError::OrderAlreadyExists`] is returned and nothing else happens.
    /// * a copy of every basket line is stored against the order.
    /// * the basket is moved to `Submitted`.
    ///
    /// If any step fails, none of the changes are persisted.
    async fn place_order(&self, order: NewOrder) -> Result<Order, OrderError>;

    /// Fetches the order with the given number, including its lines.
    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderError>;
}
