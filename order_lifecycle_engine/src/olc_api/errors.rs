use thiserror::Error;

use crate::{
    db::traits::OrderManagementError,
    db_types::{OrderId, OrderStatusType},
    lease::LeaseError,
    webhook::SignatureError,
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("State transition not allowed for order {order_id}: {from} -> {to}")]
    TransitionNotAllowed { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("Could not acquire the lock for order {0}")]
    LockNotAcquired(OrderId),
    /// Reserved. Leases carry no ownership token, so expiry during processing is never detected and this is never
    /// raised.
    #[error("Lock for order {0} expired or was taken over during processing")]
    LockExpired(OrderId),
    /// Reserved for a concurrent-modification check that does not exist yet. Never raised.
    #[error("Order {0} was changed by another process")]
    TransitionConflict(OrderId),
    #[error("Lease store error: {0}")]
    LeaseStoreError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
    #[error("The transition task for order {0} failed: {1}")]
    TaskFailed(OrderId, String),
}

impl OrderFlowError {
    /// True for the errors a caller should resolve by retrying the whole operation.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            OrderFlowError::TransitionNotAllowed { .. }
                | OrderFlowError::LockNotAcquired(_)
                | OrderFlowError::LockExpired(_)
                | OrderFlowError::TransitionConflict(_)
        )
    }

    pub(crate) fn from_lease_error(order_id: &OrderId, e: LeaseError) -> Self {
        match e {
            LeaseError::NotAcquired { .. } => OrderFlowError::LockNotAcquired(order_id.clone()),
            LeaseError::Store(e) => OrderFlowError::LeaseStoreError(e.to_string()),
        }
    }
}

impl From<OrderManagementError> for OrderFlowError {
    fn from(e: OrderManagementError) -> Self {
        match e {
            OrderManagementError::OrderNotFound(id) => OrderFlowError::OrderNotFound(id),
            OrderManagementError::DatabaseError(s) => OrderFlowError::DatabaseError(s),
            e => OrderFlowError::DatabaseError(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum WebhookError {
    #[error("Webhook signature check failed. {0}")]
    Signature(#[from] SignatureError),
    #[error("Invalid event payload. {0}")]
    MalformedPayload(String),
    #[error("order_id and shipment_id are required")]
    MissingIdentifiers,
    #[error("Unknown shipping status: {0}")]
    UnknownShippingStatus(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} is in {status} state, expected SHIPPING")]
    OrderNotShipping { order_id: OrderId, status: OrderStatusType },
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<OrderManagementError> for WebhookError {
    fn from(e: OrderManagementError) -> Self {
        match e {
            OrderManagementError::OrderNotFound(id) => WebhookError::OrderNotFound(id),
            OrderManagementError::DatabaseError(s) => WebhookError::DatabaseError(s),
            e => WebhookError::DatabaseError(e.to_string()),
        }
    }
}
