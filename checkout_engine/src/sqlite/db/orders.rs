use log::debug;
use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{BasketLine, NewOrder, Order, OrderLine, OrderNumber};

/// Inserts the order row. This is not atomic on its own. Embed the call in a transaction alongside
/// [`insert_order_lines`] and the basket status change, passing `&mut *tx` as the connection.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let (card_type, card_label) = match &order.payment_source {
        Some(source) => (Some(source.card_type.clone()), Some(source.label.clone())),
        None => (None, None),
    };
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                number,
                basket_id,
                user_id,
                site,
                currency,
                total,
                shipping_method,
                shipping_charge,
                billing_address,
                card_type,
                card_label
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *;
        "#,
    )
    .bind(order.number.as_str())
    .bind(order.basket_id)
    .bind(order.user_id)
    .bind(&order.site)
    .bind(&order.currency)
    .bind(order.total.value())
    .bind(order.shipping_method.to_string())
    .bind(order.shipping_charge.value())
    .bind(order.billing_address.clone().map(Json))
    .bind(card_type)
    .bind(card_label)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order [{}] inserted with id {}", order.number, order.id);
    Ok(order)
}

/// Copies the (discounted) basket lines onto the order.
pub async fn insert_order_lines(
    order_id: i64,
    lines: &[BasketLine],
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderLine>, sqlx::Error> {
    let mut result = Vec::with_capacity(lines.len());
    for line in lines {
        let line: OrderLine = sqlx::query_as(
            r#"
                INSERT INTO order_lines (
                    order_id,
                    product_id,
                    title,
                    quantity,
                    line_price,
                    credit_provider,
                    course_key,
                    id_verification_required
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *;
            "#,
        )
        .bind(order_id)
        .bind(&line.product_id)
        .bind(&line.title)
        .bind(line.quantity)
        .bind(line.line_price().value())
        .bind(&line.credit_provider)
        .bind(&line.course_key)
        .bind(line.id_verification_required)
        .fetch_one(&mut *conn)
        .await?;
        result.push(line);
    }
    Ok(result)
}

/// Returns the order with the given number, including its lines.
pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE number = $1")
        .bind(number.as_str())
        .fetch_optional(&mut *conn)
        .await?;
    match order {
        Some(mut order) => {
            order.lines = fetch_order_lines(order.id, conn).await?;
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

/// The number of the order placed for `basket_id`, if there is one. A basket is paid for at most once.
pub async fn fetch_order_number_for_basket(
    basket_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderNumber>, sqlx::Error> {
    let number: Option<OrderNumber> = sqlx::query_scalar("SELECT number FROM orders WHERE basket_id = $1")
        .bind(basket_id)
        .fetch_optional(conn)
        .await?;
    Ok(number)
}

pub async fn fetch_order_lines(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderLine>, sqlx::Error> {
    let lines = sqlx::query_as("SELECT * FROM order_lines WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(lines)
}
