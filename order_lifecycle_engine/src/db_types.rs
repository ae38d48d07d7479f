use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Generates a fresh, random order identifier.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order has been created and is waiting for payment.
    PendingPayment,
    /// Payment has been confirmed.
    Paid,
    /// The order was cancelled before payment. Terminal.
    Cancelled,
    /// The order has been handed to the shipping provider.
    Shipping,
    /// The shipping provider confirmed delivery. Terminal.
    Delivered,
    /// The shipment was lost, damaged or returned. Terminal.
    ShipFailed,
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 6] = [
        OrderStatusType::PendingPayment,
        OrderStatusType::Paid,
        OrderStatusType::Cancelled,
        OrderStatusType::Shipping,
        OrderStatusType::Delivered,
        OrderStatusType::ShipFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatusType::PendingPayment => "PENDING_PAYMENT",
            OrderStatusType::Paid => "PAID",
            OrderStatusType::Cancelled => "CANCELLED",
            OrderStatusType::Shipping => "SHIPPING",
            OrderStatusType::Delivered => "DELIVERED",
            OrderStatusType::ShipFailed => "SHIP_FAILED",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_PAYMENT" => Ok(Self::PendingPayment),
            "PAID" => Ok(Self::Paid),
            "CANCELLED" => Ok(Self::Cancelled),
            "SHIPPING" => Ok(Self::Shipping),
            "DELIVERED" => Ok(Self::Delivered),
            "SHIP_FAILED" => Ok(Self::ShipFailed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------       OrderItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: u32,
    pub price: f64,
}

impl OrderItem {
    pub fn new<S: Into<String>>(product_id: S, quantity: u32, price: f64) -> Self {
        Self { product_id: product_id.into(), quantity, price }
    }

    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_id: String,
    pub items: Vec<OrderItem>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(customer_id: S, items: Vec<OrderItem>) -> Self {
        Self { customer_id: customer_id.into(), items }
    }

    /// The order total. This is calculated once, when the order is stored, and is never recalculated.
    pub fn total(&self) -> f64 {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub customer_id: String,
    pub status: OrderStatusType,
    pub items: Vec<OrderItem>,
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    /// The reason given for the most recent status change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds the initial record for a new order, in `PENDING_PAYMENT` status.
    pub fn from_new_order(order_id: OrderId, order: NewOrder, now: DateTime<Utc>) -> Self {
        let total = order.total();
        Self {
            order_id,
            customer_id: order.customer_id,
            status: OrderStatusType::PendingPayment,
            items: order.items,
            total,
            payment_id: None,
            reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}

//--------------------------------------      StatusChange     ---------------------------------------------------------
pub const ORDER_CREATED_REASON: &str = "order created";

/// An entry in the append-only status history of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub reason: String,
    pub changed_at: DateTime<Utc>,
}

impl StatusChange {
    pub fn new<S: Into<String>>(order_id: OrderId, status: OrderStatusType, reason: S, changed_at: DateTime<Utc>) -> Self {
        Self { order_id, status, reason: reason.into(), changed_at }
    }
}

//--------------------------------------    StatusTransition   ---------------------------------------------------------
/// The result of a committed status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub order_id: OrderId,
    pub from: OrderStatusType,
    pub to: OrderStatusType,
}
