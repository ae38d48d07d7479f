//! An in-process order repository.
//!
//! `MemoryDatabase` keeps orders and their status history in hash maps behind a `tokio` read-write lock. Like the SQLite
//! backend it performs no coordination between writers: two sequential status updates simply overwrite one another.
//! Clones share the same underlying storage.
use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use log::*;
use tokio::sync::RwLock;

use crate::{
    db::traits::{OrderManagement, OrderManagementError},
    db_types::{NewOrder, Order, OrderId, OrderStatusType, StatusChange, ORDER_CREATED_REASON},
};

#[derive(Default)]
struct Tables {
    orders: HashMap<OrderId, Order>,
    /// Insertion ordered, oldest first
    history: HashMap<OrderId, Vec<StatusChange>>,
}

#[derive(Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the order exactly as given, along with an "order created" history entry. Useful for seeding orders in a
    /// known state.
    pub async fn insert_order(&self, order: Order) {
        let mut tables = self.tables.write().await;
        let created = StatusChange::new(order.order_id.clone(), order.status, ORDER_CREATED_REASON, order.created_at);
        tables.history.insert(order.order_id.clone(), vec![created]);
        tables.orders.insert(order.order_id.clone(), order);
    }

    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }
}

impl OrderManagement for MemoryDatabase {
    async fn create_order(&self, order: NewOrder) -> Result<Order, OrderManagementError> {
        let order = Order::from_new_order(OrderId::random(), order, Utc::now());
        self.insert_order(order.clone()).await;
        debug!("🗃️ Order {} stored in memory", order.order_id);
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderManagementError> {
        Ok(self.tables.read().await.orders.get(order_id).cloned())
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatusType,
        reason: &str,
    ) -> Result<(), OrderManagementError> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        let order =
            tables.orders.get_mut(order_id).ok_or_else(|| OrderManagementError::OrderNotFound(order_id.clone()))?;
        order.status = status;
        order.reason = Some(reason.to_string());
        order.updated_at = now;
        tables.history.entry(order_id.clone()).or_default().push(StatusChange::new(
            order_id.clone(),
            status,
            reason,
            now,
        ));
        Ok(())
    }

    async fn update_payment_id(&self, order_id: &OrderId, payment_id: &str) -> Result<(), OrderManagementError> {
        let mut tables = self.tables.write().await;
        let order =
            tables.orders.get_mut(order_id).ok_or_else(|| OrderManagementError::OrderNotFound(order_id.clone()))?;
        order.payment_id = Some(payment_id.to_string());
        Ok(())
    }

    async fn fetch_history(&self, order_id: &OrderId) -> Result<Vec<StatusChange>, OrderManagementError> {
        let tables = self.tables.read().await;
        let history = tables.history.get(order_id).map(|h| h.iter().rev().cloned().collect()).unwrap_or_default();
        Ok(history)
    }
}
