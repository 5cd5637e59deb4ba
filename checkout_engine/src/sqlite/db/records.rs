use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{NewProcessorResponse, NewSdnCheckFailure, ProcessorResponse, SdnCheckFailure};

pub async fn insert_processor_response(
    response: NewProcessorResponse,
    conn: &mut SqliteConnection,
) -> Result<ProcessorResponse, sqlx::Error> {
    let record = sqlx::query_as(
        r#"
            INSERT INTO payment_processor_responses (processor_name, transaction_id, basket_id, response)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(response.processor_name)
    .bind(response.transaction_id)
    .bind(response.basket_id)
    .bind(Json(response.response))
    .fetch_one(conn)
    .await?;
    Ok(record)
}

pub async fn fetch_processor_responses(conn: &mut SqliteConnection) -> Result<Vec<ProcessorResponse>, sqlx::Error> {
    let records = sqlx::query_as("SELECT * FROM payment_processor_responses ORDER BY id").fetch_all(conn).await?;
    Ok(records)
}

pub async fn insert_sdn_check_failure(
    failure: NewSdnCheckFailure,
    conn: &mut SqliteConnection,
) -> Result<SdnCheckFailure, sqlx::Error> {
    let record = sqlx::query_as(
        r#"
            INSERT INTO sdn_check_failures (full_name, username, sdn_check_response, basket_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(failure.full_name)
    .bind(failure.username)
    .bind(failure.sdn_check_response)
    .bind(failure.basket_id)
    .fetch_one(conn)
    .await?;
    Ok(record)
}

pub async fn fetch_sdn_check_failures(conn: &mut SqliteConnection) -> Result<Vec<SdnCheckFailure>, sqlx::Error> {
    let records = sqlx::query_as("SELECT * FROM sdn_check_failures ORDER BY id").fetch_all(conn).await?;
    Ok(records)
}
