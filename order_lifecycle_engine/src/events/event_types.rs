use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{OrderId, OrderStatusType},
    webhook::ShippingStatus,
};

/// Where a committed status change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionSource {
    /// The lease-protected state machine
    StateMachine,
    /// The shipping webhook dispatcher, which writes without taking the lease
    ShippingWebhook,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangedEvent {
    pub order_id: OrderId,
    pub from: OrderStatusType,
    pub to: OrderStatusType,
    pub reason: String,
    pub source: TransitionSource,
    pub timestamp: DateTime<Utc>,
}

impl StatusChangedEvent {
    pub fn new<S: Into<String>>(
        order_id: OrderId,
        from: OrderStatusType,
        to: OrderStatusType,
        reason: S,
        source: TransitionSource,
    ) -> Self {
        Self { order_id, from, to, reason: reason.into(), source, timestamp: Utc::now() }
    }
}

/// Raised when a shipment is reported lost or damaged. Refund processing itself happens downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRequestedEvent {
    pub order_id: OrderId,
    pub shipment_id: String,
    pub shipping_status: ShippingStatus,
    pub timestamp: DateTime<Utc>,
}

impl RefundRequestedEvent {
    pub fn new<S: Into<String>>(order_id: OrderId, shipment_id: S, shipping_status: ShippingStatus) -> Self {
        Self { order_id, shipment_id: shipment_id.into(), shipping_status, timestamp: Utc::now() }
    }
}
