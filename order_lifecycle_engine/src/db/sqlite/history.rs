use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{OrderId, OrderStatusType, StatusChange},
};

#[derive(Debug, Clone, FromRow)]
struct StatusChangeRow {
    order_id: String,
    status: String,
    reason: String,
    changed_at: DateTime<Utc>,
}

impl TryFrom<StatusChangeRow> for StatusChange {
    type Error = SqliteDatabaseError;

    fn try_from(row: StatusChangeRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatusType>()
            .map_err(|e| SqliteDatabaseError::DecodeError(format!("history for order {}: {e}", row.order_id)))?;
        Ok(StatusChange { order_id: OrderId(row.order_id), status, reason: row.reason, changed_at: row.changed_at })
    }
}

/// Appends an entry to the status history. History rows are never updated or deleted.
pub async fn append(change: &StatusChange, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query("INSERT INTO order_status_history (order_id, status, reason, changed_at) VALUES ($1, $2, $3, $4);")
        .bind(change.order_id.as_str())
        .bind(change.status.as_str())
        .bind(&change.reason)
        .bind(change.changed_at)
        .execute(conn)
        .await?;
    Ok(())
}

/// Fetches the history for the order, most recent first.
pub async fn fetch_history(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<StatusChange>, SqliteDatabaseError> {
    let rows = sqlx::query_as::<_, StatusChangeRow>(
        r#"
            SELECT order_id, status, reason, changed_at
            FROM order_status_history
            WHERE order_id = $1
            ORDER BY changed_at DESC, id DESC;
        "#,
    )
    .bind(order_id.as_str())
    .fetch_all(conn)
    .await?;
    rows.into_iter().map(StatusChange::try_from).collect()
}
