//! Inbound shipping webhooks.
//!
//! * [`signature`] decides whether a webhook body was produced by a holder of the shared secret. Two policies are
//!   offered. [`SignatureMode::Canonical`] signs only four whitelisted fields of the body, so the shipping `status` and
//!   `details` are **not** authenticated. [`SignatureMode::Raw`] signs every byte of the body.
//! * [`shipping`] holds the shipping event types and the mapping from shipping status to order status that the
//!   [`crate::ShippingWebhookApi`] dispatcher applies.
use serde::{Deserialize, Deserializer};

pub mod shipping;
pub mod signature;

pub use shipping::{ShippingAction, ShippingEvent, ShippingStatus, ShippingWebhookResponse};
pub use signature::{CanonicalPayload, SignatureError, SignatureMode, WebhookVerifier, DEFAULT_SIGNATURE_HEADER};

/// Treats an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
