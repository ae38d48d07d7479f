use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::OrderManagement,
    db_types::{OrderId, OrderStatusType},
    events::{EventProducers, RefundRequestedEvent, StatusChangedEvent, TransitionSource},
    olc_api::errors::WebhookError,
    webhook::{ShippingAction, ShippingEvent, ShippingStatus, ShippingWebhookResponse},
};

/// The shipping webhook dispatcher.
///
/// Maps a verified shipping event onto an order status change. Orders must currently be in `SHIPPING`, which is
/// checked with a direct read rather than through the transition table.
///
/// Writes go straight to the order repository and **do not take the order's lease**. A webhook-triggered write can
/// therefore interleave with a lease-protected transition on the same order. Routing these writes through
/// [`crate::OrderFlowApi`] instead only needs a change here, since both share the [`OrderManagement`] backend.
pub struct ShippingWebhookApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B: Clone> Clone for ShippingWebhookApi<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), producers: self.producers.clone() }
    }
}

impl<B> Debug for ShippingWebhookApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ShippingWebhookApi")
    }
}

impl<B> ShippingWebhookApi<B> {
    pub fn new(db: B) -> Self {
        Self { db, producers: EventProducers::default() }
    }

    pub fn with_producers(mut self, producers: EventProducers) -> Self {
        self.producers = producers;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> ShippingWebhookApi<B>
where B: OrderManagement
{
    /// Parses a webhook body whose signature has already been checked, and dispatches it.
    pub async fn process_payload(&self, body: &[u8]) -> Result<ShippingWebhookResponse, WebhookError> {
        let event = ShippingEvent::from_body(body).map_err(|e| {
            warn!("🪝️ Failed to parse webhook event: {e}");
            WebhookError::MalformedPayload(e.to_string())
        })?;
        self.process_event(event).await
    }

    pub async fn process_event(&self, event: ShippingEvent) -> Result<ShippingWebhookResponse, WebhookError> {
        info!(
            "🪝️ Received event: shipment={} order={} type={} status={}",
            event.shipment_id, event.order_id, event.event_type, event.status
        );
        if !event.has_identifiers() {
            return Err(WebhookError::MissingIdentifiers);
        }
        let order_id = OrderId::from(event.order_id.as_str());
        let order = self.db.fetch_order(&order_id).await?.ok_or_else(|| WebhookError::OrderNotFound(order_id.clone()))?;
        let previous_status = order.status;
        if previous_status != OrderStatusType::Shipping {
            info!("🪝️ Order {order_id} is not in SHIPPING state (current={previous_status}). Ignoring.");
            return Err(WebhookError::OrderNotShipping { order_id, status: previous_status });
        }
        let shipping_status = event.status.parse::<ShippingStatus>().map_err(|_| {
            warn!("🪝️ Unknown shipping status: {}", event.status);
            WebhookError::UnknownShippingStatus(event.status.clone())
        })?;
        match shipping_status.action(&event.shipment_id) {
            ShippingAction::Acknowledge => {
                info!("🪝️ Order {order_id}: shipment {} is in transit", event.shipment_id);
                Ok(ShippingWebhookResponse {
                    order_id,
                    shipment_id: event.shipment_id,
                    previous_status,
                    new_status: previous_status,
                    refund_triggered: false,
                    message: "status noted, no state change".into(),
                })
            },
            ShippingAction::Transition { to, reason, refund_triggered } => {
                if refund_triggered {
                    warn!(
                        "🪝️💸️ *** REFUND TRIGGERED for order {order_id} (shipment {}, reason: {shipping_status}) ***",
                        event.shipment_id
                    );
                }
                self.db.update_order_status(&order_id, to, &reason).await.map_err(|e| {
                    error!("🪝️ Could not update status for order {order_id}. {e}");
                    WebhookError::from(e)
                })?;
                info!("🪝️ Order {order_id}: {previous_status} -> {to} (refund={refund_triggered})");
                let changed = StatusChangedEvent::new(
                    order_id.clone(),
                    previous_status,
                    to,
                    reason,
                    TransitionSource::ShippingWebhook,
                );
                self.producers.publish_status_changed(changed).await;
                if refund_triggered {
                    let refund = RefundRequestedEvent::new(order_id.clone(), &event.shipment_id, shipping_status);
                    self.producers.publish_refund_requested(refund).await;
                }
                Ok(ShippingWebhookResponse {
                    order_id,
                    shipment_id: event.shipment_id,
                    previous_status,
                    new_status: to,
                    refund_triggered,
                    message: format!("order transitioned to {to}"),
                })
            },
        }
    }
}
