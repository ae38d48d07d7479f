use chrono::{DateTime, Utc};
use log::trace;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{Order, OrderId, OrderItem, OrderStatusType},
};

#[derive(Debug, Clone, FromRow)]
struct OrderRow {
    order_id: String,
    customer_id: String,
    status: String,
    items: String,
    total: f64,
    payment_id: Option<String>,
    reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = SqliteDatabaseError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatusType>()
            .map_err(|e| SqliteDatabaseError::DecodeError(format!("order {}: {e}", row.order_id)))?;
        let items = serde_json::from_str::<Vec<OrderItem>>(&row.items)
            .map_err(|e| SqliteDatabaseError::DecodeError(format!("items for order {}: {e}", row.order_id)))?;
        Ok(Order {
            order_id: OrderId(row.order_id),
            customer_id: row.customer_id,
            status,
            items,
            total: row.total,
            payment_id: row.payment_id,
            reason: row.reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: &Order, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    let items = serde_json::to_string(&order.items)
        .map_err(|e| SqliteDatabaseError::DecodeError(format!("could not serialize items: {e}")))?;
    sqlx::query(
        r#"
            INSERT INTO orders (
                order_id,
                customer_id,
                status,
                items,
                total,
                payment_id,
                reason,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9);
        "#,
    )
    .bind(order.order_id.as_str())
    .bind(&order.customer_id)
    .bind(order.status.as_str())
    .bind(items)
    .bind(order.total)
    .bind(&order.payment_id)
    .bind(&order.reason)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(conn)
    .await?;
    trace!("🗃️ Order {} inserted", order.order_id);
    Ok(())
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let row = sqlx::query_as::<_, OrderRow>(
        r#"
            SELECT
                order_id,
                customer_id,
                status,
                items,
                total,
                payment_id,
                reason,
                created_at,
                updated_at
            FROM orders
            WHERE order_id = $1;
        "#,
    )
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    row.map(Order::try_from).transpose()
}

/// Overwrites the status and reason for the order. There is no check on the previous status.
pub async fn update_status(
    order_id: &OrderId,
    status: OrderStatusType,
    reason: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query("UPDATE orders SET status = $1, reason = $2, updated_at = $3 WHERE order_id = $4;")
        .bind(status.as_str())
        .bind(reason)
        .bind(now)
        .bind(order_id.as_str())
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::OrderNotFound(order_id.clone()));
    }
    Ok(())
}

pub async fn update_payment_id(
    order_id: &OrderId,
    payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let result = sqlx::query("UPDATE orders SET payment_id = $1 WHERE order_id = $2;")
        .bind(payment_id)
        .bind(order_id.as_str())
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(SqliteDatabaseError::OrderNotFound(order_id.clone()));
    }
    Ok(())
}
