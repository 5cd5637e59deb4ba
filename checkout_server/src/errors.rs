use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use checkout_engine::{
    traits::{AccountError, BasketError, OrderError},
    CheckoutError,
    SubmissionError,
};
use log::error;
use thiserror::Error;

pub const BASKET_UNAVAILABLE_MESSAGE: &str =
    "There was a problem retrieving your basket. Refresh the page to try again.";
pub const BASKET_MODIFIED_MESSAGE: &str =
    "Your basket may have been modified or already purchased. Refresh the page to try again.";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{BASKET_UNAVAILABLE_MESSAGE}")]
    BasketUnavailable,
    #[error("{BASKET_MODIFIED_MESSAGE}")]
    BasketModified,
    #[error("Basket is not free.")]
    BasketNotFree,
    #[error("We were unable to process your purchase. Contact {0} for assistance.")]
    PurchaseBlocked(String),
    #[error("Could not process the payment. {0}")]
    PaymentError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::AccountNotFound => StatusCode::FORBIDDEN,
                AuthError::ForbiddenPeer => StatusCode::FORBIDDEN,
                AuthError::ConfigurationError => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::BasketUnavailable => StatusCode::BAD_REQUEST,
            Self::BasketModified => StatusCode::BAD_REQUEST,
            Self::BasketNotFree => StatusCode::BAD_REQUEST,
            Self::PurchaseBlocked(_) => StatusCode::BAD_REQUEST,
            Self::PaymentError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("User account not found.")]
    AccountNotFound,
    #[error("Requests from this address are not allowed.")]
    ForbiddenPeer,
    #[error("Token validation is not configured on this server.")]
    ConfigurationError,
}

impl From<AccountError> for ServerError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<BasketError> for ServerError {
    fn from(e: BasketError) -> Self {
        match e {
            BasketError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            BasketError::NotFound(_) => Self::BasketUnavailable,
            BasketError::IllegalStatusChange { .. } => Self::BasketModified,
        }
    }
}

impl From<OrderError> for ServerError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            OrderError::BasketNotFound(_) => Self::BasketUnavailable,
            OrderError::OrderAlreadyExists(_) | OrderError::BasketNotPayable { .. } => Self::BasketModified,
        }
    }
}

impl From<SubmissionError> for ServerError {
    fn from(e: SubmissionError) -> Self {
        match e {
            SubmissionError::BasketNotFound(_) => Self::BasketUnavailable,
            SubmissionError::BasketNotOpen { .. } => Self::BasketModified,
            SubmissionError::BasketError(e) => e.into(),
            SubmissionError::PaymentError(e) => {
                error!("💳️ Could not generate transaction parameters. {e}");
                Self::PaymentError(e.to_string())
            },
        }
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::BasketNotFree(_) => Self::BasketNotFree,
            CheckoutError::BasketError(e) => e.into(),
            CheckoutError::OrderError(e) => e.into(),
        }
    }
}
