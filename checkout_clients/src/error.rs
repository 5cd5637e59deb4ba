use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ApiClientError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Request could not be completed: {0}")]
    RestRequestError(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
}

impl From<reqwest::Error> for ApiClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiClientError::Timeout(e.to_string())
        } else {
            ApiClientError::RestRequestError(e.to_string())
        }
    }
}
