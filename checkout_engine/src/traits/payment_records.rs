use thiserror::Error;

use crate::db_types::{NewProcessorResponse, NewSdnCheckFailure, ProcessorResponse, SdnCheckFailure};

#[derive(Debug, Clone, Error)]
pub enum RecordError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for RecordError {
    fn from(e: sqlx::Error) -> Self {
        RecordError::DatabaseError(e.to_string())
    }
}

/// Append-only audit records. Implementations must write these outside of any transaction used for order placement,
/// so that a record survives even when the rest of the request is rolled back.
#[allow(async_fn_in_trait)]
pub trait PaymentRecords {
    async fn record_processor_response(
        &self,
        response: NewProcessorResponse,
    ) -> Result<ProcessorResponse, RecordError>;

    async fn record_sdn_check_failure(&self, failure: NewSdnCheckFailure) -> Result<SdnCheckFailure, RecordError>;
}
