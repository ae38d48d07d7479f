//! # Order lifecycle engine public API
//!
//! * [`order_flow_api`] is the order state machine: create, pay, cancel and ship orders, each status change guarded by
//!   a per-order lease.
//! * [`shipping_webhook_api`] dispatches verified shipping provider events onto orders.
//!
//! Both APIs are created by supplying a backend that implements [`crate::OrderManagement`]. The state machine also
//! needs a [`crate::lease::LeaseLock`].
//!
//! ```rust,ignore
//! use order_lifecycle_engine::{lease::*, MemoryDatabase, OrderFlowApi, ProcessingDelay};
//! let lock = LeaseLock::new(MemoryLeaseStore::new(), AcquirePolicy::default());
//! let api = OrderFlowApi::new(MemoryDatabase::new(), lock, ProcessingDelay::Disabled);
//! let order = api.create_order(new_order).await?;
//! api.pay_order(&order.order_id, "pay-123").await?;
//! ```
pub mod errors;
pub mod order_flow_api;
pub mod processing_delay;
pub mod shipping_webhook_api;
