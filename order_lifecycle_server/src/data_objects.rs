use order_lifecycle_engine::db_types::{OrderId, OrderStatusType, StatusChange};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayOrderRequest {
    #[serde(default)]
    pub payment_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelOrderRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// The reply to a pay, cancel or ship request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionResponse {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub message: String,
}

impl TransitionResponse {
    pub fn new<S: Into<String>>(order_id: OrderId, status: OrderStatusType, message: S) -> Self {
        Self { order_id, status, message: message.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub order_id: OrderId,
    pub history: Vec<StatusChange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self { status: "ok".into() }
    }
}
