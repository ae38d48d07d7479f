use std::future::Future;

use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderId, OrderStatusType, StatusChange};

#[derive(Debug, Clone, Error)]
pub enum OrderManagementError {
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Stored order data is invalid: {0}")]
    InvalidData(String),
}

/// The `OrderManagement` trait defines the behaviour for storing and querying orders and their status history.
///
/// Implementations are shared between request handlers and the tasks that run transitions, so every returned future
/// must be `Send`. Implementors can still write plain `async fn`s.
pub trait OrderManagement: Clone + Send + Sync {
    /// Stores a brand-new order in `PENDING_PAYMENT` status with a freshly generated order id, and records the initial
    /// "order created" entry in the status history.
    fn create_order(&self, order: NewOrder) -> impl Future<Output = Result<Order, OrderManagementError>> + Send;

    /// Fetches the order with the given id. Returns `None` if it does not exist.
    fn fetch_order(
        &self,
        order_id: &OrderId,
    ) -> impl Future<Output = Result<Option<Order>, OrderManagementError>> + Send;

    /// Overwrites the status and reason of the order, bumps `updated_at` and appends a [`StatusChange`] to the history.
    ///
    /// No check is made against the current status. Callers are responsible for validating the transition.
    fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatusType,
        reason: &str,
    ) -> impl Future<Output = Result<(), OrderManagementError>> + Send;

    /// Sets the payment id for the order. This does not touch the status history.
    fn update_payment_id(
        &self,
        order_id: &OrderId,
        payment_id: &str,
    ) -> impl Future<Output = Result<(), OrderManagementError>> + Send;

    /// Returns the status history for the order, most recent first. Unknown orders have an empty history.
    fn fetch_history(
        &self,
        order_id: &OrderId,
    ) -> impl Future<Output = Result<Vec<StatusChange>, OrderManagementError>> + Send;
}
