use std::fmt::Debug;

use chrono::Utc;
use log::*;
use sqlx::SqlitePool;

use super::{db_url, history, new_pool, orders, SqliteDatabaseError};
use crate::{
    db::traits::{OrderManagement, OrderManagementError},
    db_types::{NewOrder, Order, OrderId, OrderStatusType, StatusChange, ORDER_CREATED_REASON},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `OLC_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    /// Connects to the database at `url`, creating it if necessary, and brings the schema up to date.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        sqlx::migrate!("./src/db/sqlite/migrations").run(&pool).await?;
        info!("🗃️ Database schema is up to date");
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), SqliteDatabaseError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn create_order(&self, order: NewOrder) -> Result<Order, OrderManagementError> {
        let now = Utc::now();
        let order = Order::from_new_order(OrderId::random(), order, now);
        let created = StatusChange::new(order.order_id.clone(), order.status, ORDER_CREATED_REASON, now);
        let mut tx = self.pool.begin().await.map_err(SqliteDatabaseError::from)?;
        orders::insert_order(&order, &mut tx).await?;
        history::append(&created, &mut tx).await?;
        tx.commit().await.map_err(SqliteDatabaseError::from)?;
        debug!("🗃️ Order {} has been saved in the DB (total {:.2})", order.order_id, order.total);
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatusType,
        reason: &str,
    ) -> Result<(), OrderManagementError> {
        let now = Utc::now();
        let change = StatusChange::new(order_id.clone(), status, reason, now);
        let mut tx = self.pool.begin().await.map_err(SqliteDatabaseError::from)?;
        orders::update_status(order_id, status, reason, now, &mut tx).await?;
        history::append(&change, &mut tx).await?;
        tx.commit().await.map_err(SqliteDatabaseError::from)?;
        debug!("🗃️ Order {order_id} status set to {status}");
        Ok(())
    }

    async fn update_payment_id(&self, order_id: &OrderId, payment_id: &str) -> Result<(), OrderManagementError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        orders::update_payment_id(order_id, payment_id, &mut conn).await?;
        trace!("🗃️ Payment id for order {order_id} set to {payment_id}");
        Ok(())
    }

    async fn fetch_history(&self, order_id: &OrderId) -> Result<Vec<StatusChange>, OrderManagementError> {
        let mut conn = self.pool.acquire().await.map_err(SqliteDatabaseError::from)?;
        let history = history::fetch_history(order_id, &mut conn).await?;
        Ok(history)
    }
}
