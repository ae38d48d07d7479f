//! Order Lifecycle Engine
//!
//! This library moves orders through a fixed lifecycle (payment, cancellation, shipment, delivery or shipment
//! failure) while several request handlers may try to advance the same order at once.
//!
//! The library is divided into these sections:
//! 1. Order storage ([`mod@db`]). SQLite and in-memory backends implement the [`OrderManagement`] trait. Backends do no
//!    locking of their own.
//! 2. The [`transitions`] table, which decides whether a status change is legal.
//! 3. The [`lease`] lock, a TTL-bounded mutual exclusion primitive over a shared key-value store.
//! 4. The public API ([`mod@olc_api`]): the [`OrderFlowApi`] state machine and the [`ShippingWebhookApi`] dispatcher.
//! 5. The [`webhook`] signature verifier, offering canonical (four-field) and raw-body HMAC-SHA256 policies.
//!
//! The engine also emits events when order statuses change or refunds are requested. See [`events`].
mod db;

pub mod db_types;
pub mod events;
pub mod lease;
mod olc_api;
pub mod transitions;
pub mod webhook;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use db::memory::MemoryDatabase;
#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use db::traits::{OrderManagement, OrderManagementError};
pub use olc_api::{
    errors::{OrderFlowError, WebhookError},
    order_flow_api::{OrderFlowApi, DEFAULT_CANCEL_REASON, SHIPMENT_INITIATED_REASON},
    processing_delay::ProcessingDelay,
    shipping_webhook_api::ShippingWebhookApi,
};
