//! The static order lifecycle transition table.
//!
//! | From            | Allowed To               |
//! |-----------------|--------------------------|
//! | PENDING_PAYMENT | PAID, CANCELLED          |
//! | PAID            | SHIPPING                 |
//! | SHIPPING        | DELIVERED, SHIP_FAILED   |
//! | CANCELLED       | (terminal)               |
//! | DELIVERED       | (terminal)               |
//! | SHIP_FAILED     | (terminal)               |
//!
//! Lookups take an [`OrderStatusType`], so a status name outside the table never reaches them. A stored status that
//! does not parse is reported as invalid data instead.
use crate::db_types::OrderStatusType::{self, *};

/// Returns the set of states that can be reached from `from` in a single transition.
pub fn allowed_targets(from: OrderStatusType) -> &'static [OrderStatusType] {
    match from {
        PendingPayment => &[Paid, Cancelled],
        Paid => &[Shipping],
        Shipping => &[Delivered, ShipFailed],
        Cancelled | Delivered | ShipFailed => &[],
    }
}

pub fn is_allowed(from: OrderStatusType, to: OrderStatusType) -> bool {
    allowed_targets(from).contains(&to)
}

pub fn is_terminal(status: OrderStatusType) -> bool {
    allowed_targets(status).is_empty()
}
