use thiserror::Error;

use crate::{
    db_types::{BasketStatus, Money},
    processors::PaymentError,
    traits::{BasketError, OrderError},
};

#[derive(Debug, Clone, Error)]
pub enum SubmissionError {
    #[error("Basket #{0} does not exist or does not belong to the user")]
    BasketNotFound(i64),
    #[error("Basket #{id} is {status}. Only open baskets can be submitted for payment")]
    BasketNotOpen { id: i64, status: BasketStatus },
    #[error("{0}")]
    BasketError(#[from] BasketError),
    #[error("{0}")]
    PaymentError(#[from] PaymentError),
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("The basket total is {0}, so it cannot be checked out for free")]
    BasketNotFree(Money),
    #[error("{0}")]
    BasketError(#[from] BasketError),
    #[error("{0}")]
    OrderError(#[from] OrderError),
}
