//! #  Order repository contracts.
//!
//! The order lifecycle engine does not care where orders live. Any backend that implements [`OrderManagement`] can
//! be handed to the [`crate::OrderFlowApi`] (the state machine) and the [`crate::ShippingWebhookApi`] (the webhook
//! dispatcher).
//!
//! Backends provide **no locking** of their own and no optimistic concurrency checks. Two racing writers that both
//! call [`OrderManagement::update_order_status`] will both succeed, and the last write wins. Serialising transitions
//! on a single order is the job of the lease lock in [`crate::lease`].
mod order_management;

pub use order_management::{OrderManagement, OrderManagementError};
