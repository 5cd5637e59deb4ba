//! Payment processors.
//!
//! A processor knows how to turn a basket into the signed parameters its hosted payment page expects, and how to make
//! sense of the notification it posts back once the customer has paid (or not).
mod cybersource;

pub use cybersource::{card_type_name, Cybersource, CybersourceConfig, PCI_FIELDS};
use thiserror::Error;

use crate::db_types::{Basket, BillingAddress, Money, OrderNumber, ProcessorFields, UserAccount};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("The response signature is invalid. {0}")]
    InvalidSignature(String),
    #[error("The customer cancelled the payment")]
    UserCancelled,
    #[error("The transaction was declined")]
    TransactionDeclined,
    #[error("The payment gateway reported an error")]
    GatewayError,
    #[error("The payment gateway returned an unrecognised decision: {0}")]
    UnknownDecision(String),
    #[error("Only {authorized} of the requested {requested} was authorized")]
    PartialAuthorization { requested: Money, authorized: Money },
    #[error("Card data may not be signed or sent to the server: {0}")]
    PciViolation(String),
    #[error("Malformed gateway response: {0}")]
    MalformedResponse(String),
    #[error("Payment processor configuration error: {0}")]
    Configuration(String),
}

impl PaymentError {
    /// True when the customer simply did not complete the payment. These are expected outcomes, not faults.
    pub fn is_customer_outcome(&self) -> bool {
        matches!(self, PaymentError::UserCancelled | PaymentError::TransactionDeclined)
    }

    /// True for the failures the gateway reports about the payment itself. They are acknowledged, never retried.
    pub fn is_gateway_outcome(&self) -> bool {
        matches!(
            self,
            PaymentError::GatewayError | PaymentError::UnknownDecision(_) | PaymentError::PartialAuthorization { .. }
        )
    }
}

/// The useful content of an accepted payment notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandledProcessorResponse {
    pub transaction_id: String,
    pub total: Money,
    pub currency: String,
    /// Masked card number, as echoed by the gateway
    pub card_number: String,
    pub card_type: Option<String>,
}

pub trait PaymentProcessor {
    fn name(&self) -> &str;

    /// Builds the signed parameters for the hosted payment page. `extra` is merged in before signing.
    ///
    /// With `use_client_side_checkout`, `payment_page_url` points at the silent-order-POST endpoint that the browser
    /// submits card data to directly.
    fn get_transaction_parameters(
        &self,
        basket: &Basket,
        order_number: &OrderNumber,
        user: &UserAccount,
        use_client_side_checkout: bool,
        extra: ProcessorFields,
    ) -> Result<ProcessorFields, PaymentError>;

    /// Verifies the notification and extracts the payment details. Any payment outcome other than a fully authorised
    /// payment is returned as an error.
    fn handle_processor_response(&self, response: &ProcessorFields) -> Result<HandledProcessorResponse, PaymentError>;

    /// Rebuilds the billing address from the fields the gateway echoes back.
    fn billing_address(&self, response: &ProcessorFields) -> Result<BillingAddress, PaymentError>;

    fn transaction_id<'a>(&self, response: &'a ProcessorFields) -> Option<&'a str>;

    fn order_number<'a>(&self, response: &'a ProcessorFields) -> Option<&'a str>;
}
