use sqlx::SqliteConnection;

use crate::db_types::{NewUserAccount, UserAccount};

pub async fn fetch_user_account(id: i64, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn insert_user_account(
    user: NewUserAccount,
    conn: &mut SqliteConnection,
) -> Result<UserAccount, sqlx::Error> {
    let user = sqlx::query_as(
        r#"
            INSERT INTO users (username, email, first_name, last_name, is_staff)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(user.username)
    .bind(user.email)
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.is_staff)
    .fetch_one(conn)
    .await?;
    Ok(user)
}
