use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Basket, BasketLine, BasketStatus, NewBasket, Voucher};

/// Fetches the basket with the given id, including its lines.
pub async fn fetch_basket(id: i64, conn: &mut SqliteConnection) -> Result<Option<Basket>, sqlx::Error> {
    let basket: Option<Basket> =
        sqlx::query_as("SELECT * FROM baskets WHERE id = $1").bind(id).fetch_optional(&mut *conn).await?;
    with_lines(basket, conn).await
}

/// Fetches the user's most recently created `Open` basket for the site, including its lines.
pub async fn fetch_open_basket_for_user(
    owner_id: i64,
    site: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Basket>, sqlx::Error> {
    let basket: Option<Basket> = sqlx::query_as(
        "SELECT * FROM baskets WHERE owner_id = $1 AND site = $2 AND status = 'Open' ORDER BY id DESC LIMIT 1",
    )
    .bind(owner_id)
    .bind(site)
    .fetch_optional(&mut *conn)
    .await?;
    with_lines(basket, conn).await
}

async fn with_lines(basket: Option<Basket>, conn: &mut SqliteConnection) -> Result<Option<Basket>, sqlx::Error> {
    match basket {
        Some(mut basket) => {
            basket.lines = fetch_basket_lines(basket.id, conn).await?;
            Ok(Some(basket))
        },
        None => Ok(None),
    }
}

pub async fn fetch_basket_lines(basket_id: i64, conn: &mut SqliteConnection) -> Result<Vec<BasketLine>, sqlx::Error> {
    let lines = sqlx::query_as("SELECT * FROM basket_lines WHERE basket_id = $1 ORDER BY id")
        .bind(basket_id)
        .fetch_all(conn)
        .await?;
    Ok(lines)
}

/// Changes the basket status, but only if it is currently `from`. Returns `false` if no row was updated, which means
/// the basket does not exist or has already moved on.
pub async fn update_status(
    id: i64,
    from: BasketStatus,
    to: BasketStatus,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE baskets SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = $3")
            .bind(to.to_string())
            .bind(id)
            .bind(from.to_string())
            .execute(conn)
            .await?;
    let updated = result.rows_affected() == 1;
    if updated {
        debug!("🧺️ Basket #{id} moved from {from} to {to}");
    }
    Ok(updated)
}

pub async fn insert_basket(basket: NewBasket, conn: &mut SqliteConnection) -> Result<Basket, sqlx::Error> {
    let mut inserted: Basket = sqlx::query_as(
        r#"
            INSERT INTO baskets (owner_id, site, currency, voucher_code)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(basket.owner_id)
    .bind(basket.site)
    .bind(basket.currency)
    .bind(basket.voucher_code)
    .fetch_one(&mut *conn)
    .await?;
    for line in basket.lines {
        let line: BasketLine = sqlx::query_as(
            r#"
                INSERT INTO basket_lines (
                    basket_id,
                    product_id,
                    title,
                    quantity,
                    unit_price,
                    credit_provider,
                    course_key,
                    id_verification_required
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *;
            "#,
        )
        .bind(inserted.id)
        .bind(line.product_id)
        .bind(line.title)
        .bind(line.quantity)
        .bind(line.unit_price.value())
        .bind(line.credit_provider)
        .bind(line.course_key)
        .bind(line.id_verification_required)
        .fetch_one(&mut *conn)
        .await?;
        inserted.lines.push(line);
    }
    debug!("🧺️ Basket #{} created with {} lines", inserted.id, inserted.lines.len());
    Ok(inserted)
}

pub async fn fetch_voucher(code: &str, conn: &mut SqliteConnection) -> Result<Option<Voucher>, sqlx::Error> {
    let voucher = sqlx::query_as("SELECT * FROM vouchers WHERE code = $1").bind(code).fetch_optional(conn).await?;
    Ok(voucher)
}

pub async fn insert_voucher(voucher: Voucher, conn: &mut SqliteConnection) -> Result<Voucher, sqlx::Error> {
    let voucher = sqlx::query_as("INSERT INTO vouchers (code, percent_off) VALUES ($1, $2) RETURNING *")
        .bind(voucher.code)
        .bind(voucher.percent_off)
        .fetch_one(conn)
        .await?;
    Ok(voucher)
}
