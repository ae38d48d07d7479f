use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::OrderManagement,
    db_types::{NewOrder, Order, OrderId, OrderStatusType, StatusChange, StatusTransition},
    events::{EventProducers, StatusChangedEvent, TransitionSource},
    lease::{lease_key, LeaseLock, LeaseStore},
    olc_api::{errors::OrderFlowError, processing_delay::ProcessingDelay},
    transitions::{is_allowed, is_terminal},
};

pub const DEFAULT_CANCEL_REASON: &str = "cancelled by customer";
pub const SHIPMENT_INITIATED_REASON: &str = "shipment initiated";

/// `OrderFlowApi` is the order state machine. Every status change made through it is serialised per order by a lease
/// lock, for as long as the lease has not expired.
///
/// A transition runs these steps:
/// 1. Acquire the lease for the order.
/// 2. Read the current status.
/// 3. Check the edge against the transition table.
/// 4. Sleep for the configured [`ProcessingDelay`].
/// 5. Write the new status and append to the history.
/// 6. Release the lease. This happens on every exit path once the lease was acquired, including when the caller
///    stops waiting, since the steps run on a spawned task.
///
/// If steps 2 to 5 take longer than the lease TTL, a second caller can acquire the lease, validate against the same
/// current status and write too. Nothing detects this.
pub struct OrderFlowApi<B, L> {
    db: B,
    lock: LeaseLock<L>,
    delay: ProcessingDelay,
    producers: EventProducers,
}

impl<B: Clone, L: Clone> Clone for OrderFlowApi<B, L> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), lock: self.lock.clone(), delay: self.delay, producers: self.producers.clone() }
    }
}

impl<B, L> Debug for OrderFlowApi<B, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.delay)
    }
}

impl<B, L> OrderFlowApi<B, L> {
    pub fn new(db: B, lock: LeaseLock<L>, delay: ProcessingDelay) -> Self {
        Self { db, lock, delay, producers: EventProducers::default() }
    }

    pub fn with_producers(mut self, producers: EventProducers) -> Self {
        self.producers = producers;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn lock(&self) -> &LeaseLock<L> {
        &self.lock
    }

    pub fn processing_delay(&self) -> ProcessingDelay {
        self.delay
    }
}

impl<B, L> OrderFlowApi<B, L>
where
    B: OrderManagement,
    L: LeaseStore,
{
    /// Stores a new order in `PENDING_PAYMENT`. The customer id and at least one item are required.
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        if order.customer_id.is_empty() || order.items.is_empty() {
            return Err(OrderFlowError::InvalidOrder("customer_id and items are required".into()));
        }
        let order = self.db.create_order(order).await?;
        info!("🔄️📦️ Created order {} for customer {} (total={:.2})", order.order_id, order.customer_id, order.total);
        Ok(order)
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        self.db.fetch_order(order_id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))
    }

    /// The status history of the order, most recent first. Unknown orders have an empty history.
    pub async fn fetch_history(&self, order_id: &OrderId) -> Result<Vec<StatusChange>, OrderFlowError> {
        let history = self.db.fetch_history(order_id).await?;
        Ok(history)
    }
}

impl<B, L> OrderFlowApi<B, L>
where
    B: OrderManagement + 'static,
    L: LeaseStore + 'static,
{
    /// Moves the order to `target`, recording `reason` in the history. See the type-level docs for the algorithm.
    ///
    /// The transition runs on its own task. Dropping the returned future (a timeout, a `select!`) only stops the
    /// caller from waiting: once spawned, the transition runs to completion and the lease is always released.
    ///
    /// Errors are not retried here. [`OrderFlowError::is_conflict`] tells the caller whether a retry makes sense.
    pub async fn transition(
        &self,
        order_id: &OrderId,
        target: OrderStatusType,
        reason: &str,
    ) -> Result<StatusTransition, OrderFlowError> {
        self.spawn_transition(order_id, target, reason, None).await
    }

    /// Marks the order as paid, then records the payment id. A failure to record the payment id is logged and does
    /// not fail the payment. Both writes complete even if the caller stops waiting.
    pub async fn pay_order(&self, order_id: &OrderId, payment_id: &str) -> Result<StatusTransition, OrderFlowError> {
        let reason = format!("payment confirmed: {payment_id}");
        self.spawn_transition(order_id, OrderStatusType::Paid, &reason, Some(payment_id)).await
    }

    /// Cancels the order. An absent or empty reason is replaced with "cancelled by customer".
    pub async fn cancel_order(
        &self,
        order_id: &OrderId,
        reason: Option<&str>,
    ) -> Result<StatusTransition, OrderFlowError> {
        let reason = reason.filter(|r| !r.is_empty()).unwrap_or(DEFAULT_CANCEL_REASON);
        let transition = self.transition(order_id, OrderStatusType::Cancelled, reason).await?;
        info!("🔄️❌️ Order {order_id} CANCELLED (reason: {reason})");
        Ok(transition)
    }

    pub async fn ship_order(&self, order_id: &OrderId) -> Result<StatusTransition, OrderFlowError> {
        let transition = self.transition(order_id, OrderStatusType::Shipping, SHIPMENT_INITIATED_REASON).await?;
        info!("🔄️🚚️ Order {order_id} marked as SHIPPING");
        Ok(transition)
    }

    async fn spawn_transition(
        &self,
        order_id: &OrderId,
        target: OrderStatusType,
        reason: &str,
        payment_id: Option<&str>,
    ) -> Result<StatusTransition, OrderFlowError> {
        let api = self.clone();
        let id = order_id.clone();
        let reason = reason.to_string();
        let payment_id = payment_id.map(String::from);
        let task = tokio::spawn(async move { api.run_transition(&id, target, &reason, payment_id.as_deref()).await });
        task.await.map_err(|e| {
            error!("🔄️ Order {order_id}: the transition task did not finish. {e}");
            OrderFlowError::TaskFailed(order_id.clone(), e.to_string())
        })?
    }

    async fn run_transition(
        &self,
        order_id: &OrderId,
        target: OrderStatusType,
        reason: &str,
        payment_id: Option<&str>,
    ) -> Result<StatusTransition, OrderFlowError> {
        let key = lease_key(order_id);
        let lease = self.lock.acquire(&key).await.map_err(|e| OrderFlowError::from_lease_error(order_id, e))?;
        info!("🔄️ Order {order_id}: lock acquired (TTL={:?})", lease.ttl());
        let result = self.transition_under_lease(order_id, target, reason).await;
        if let Err(e) = self.lock.release(lease).await {
            error!("🔄️ Order {order_id}: could not release lock. It will expire on its own. {e}");
        } else {
            debug!("🔄️ Order {order_id}: lock released");
        }
        let transition = result?;
        if let Some(payment_id) = payment_id {
            match self.db.update_payment_id(order_id, payment_id).await {
                Ok(()) => info!("🔄️💰️ Order {order_id} marked as PAID (payment_id={payment_id})"),
                Err(e) => warn!("🔄️💰️ Order {order_id} is PAID, but payment id {payment_id} could not be stored. {e}"),
            }
        }
        let event = StatusChangedEvent::new(
            order_id.clone(),
            transition.from,
            transition.to,
            reason,
            TransitionSource::StateMachine,
        );
        self.producers.publish_status_changed(event).await;
        Ok(transition)
    }

    async fn transition_under_lease(
        &self,
        order_id: &OrderId,
        target: OrderStatusType,
        reason: &str,
    ) -> Result<StatusTransition, OrderFlowError> {
        let order = self.fetch_order(order_id).await?;
        let from = order.status;
        if !is_allowed(from, target) {
            if is_terminal(from) {
                debug!("🔄️ Order {order_id} is already {from}. No further transitions are allowed");
            } else {
                debug!("🔄️ Order {order_id}: {from} -> {target} is not allowed");
            }
            return Err(OrderFlowError::TransitionNotAllowed { order_id: order_id.clone(), from, to: target });
        }
        let delay = self.delay.sample();
        if !delay.is_zero() {
            debug!("🔄️ Order {order_id}: processing ({delay:?} delay)...");
            tokio::time::sleep(delay).await;
        }
        self.db.update_order_status(order_id, target, reason).await?;
        info!("🔄️ Order {order_id}: {from} -> {target} COMMITTED");
        Ok(StatusTransition { order_id: order_id.clone(), from, to: target })
    }
}
