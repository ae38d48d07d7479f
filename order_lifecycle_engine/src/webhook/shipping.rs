use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use super::null_as_default;
use crate::db_types::{OrderId, OrderStatusType};

/// A shipping provider event, as delivered to the webhook endpoint. Missing fields take their zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub shipment_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: i64,
}

impl ShippingEvent {
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn has_identifiers(&self) -> bool {
        !self.order_id.is_empty() && !self.shipment_id.is_empty()
    }
}

//--------------------------------------    ShippingStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingStatus {
    InTransit,
    Delivered,
    Lost,
    Damaged,
    Returned,
}

impl ShippingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingStatus::InTransit => "IN_TRANSIT",
            ShippingStatus::Delivered => "DELIVERED",
            ShippingStatus::Lost => "LOST",
            ShippingStatus::Damaged => "DAMAGED",
            ShippingStatus::Returned => "RETURNED",
        }
    }

    /// What the dispatcher does with an order in `SHIPPING` when this status arrives.
    pub fn action(&self, shipment_id: &str) -> ShippingAction {
        use OrderStatusType::{Delivered, ShipFailed};
        match self {
            ShippingStatus::InTransit => ShippingAction::Acknowledge,
            ShippingStatus::Delivered => ShippingAction::Transition {
                to: Delivered,
                reason: format!("delivered - confirmed by webhook (shipment {shipment_id})"),
                refund_triggered: false,
            },
            ShippingStatus::Lost | ShippingStatus::Damaged => ShippingAction::Transition {
                to: ShipFailed,
                reason: format!(
                    "shipment {} - refund initiated (shipment {shipment_id})",
                    self.as_str().to_ascii_lowercase()
                ),
                refund_triggered: true,
            },
            ShippingStatus::Returned => ShippingAction::Transition {
                to: ShipFailed,
                reason: format!("shipment returned (shipment {shipment_id})"),
                refund_triggered: false,
            },
        }
    }
}

impl Display for ShippingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_TRANSIT" => Ok(Self::InTransit),
            "DELIVERED" => Ok(Self::Delivered),
            "LOST" => Ok(Self::Lost),
            "DAMAGED" => Ok(Self::Damaged),
            "RETURNED" => Ok(Self::Returned),
            s => Err(format!("unknown shipping status: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShippingAction {
    /// Noted, but the order status does not change.
    Acknowledge,
    Transition { to: OrderStatusType, reason: String, refund_triggered: bool },
}

//-------------------------------------- ShippingWebhookResponse -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingWebhookResponse {
    pub order_id: OrderId,
    pub shipment_id: String,
    pub previous_status: OrderStatusType,
    pub new_status: OrderStatusType,
    pub refund_triggered: bool,
    pub message: String,
}
