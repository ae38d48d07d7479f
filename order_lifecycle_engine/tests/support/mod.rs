#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use chrono::Utc;
use order_lifecycle_engine::{
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderStatusType},
    lease::{AcquirePolicy, LeaseLock, LeaseStore, LeaseStoreError, MemoryLeaseStore},
    MemoryDatabase,
    OrderFlowApi,
    ProcessingDelay,
};

pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// Two widgets at 10.00 and one gadget at 5.00
pub fn new_order() -> NewOrder {
    NewOrder::new("cust-42", vec![OrderItem::new("widget", 2, 10.0), OrderItem::new("gadget", 1, 5.0)])
}

pub async fn seed_order(db: &MemoryDatabase, order_id: &str, status: OrderStatusType) -> OrderId {
    let mut order = Order::from_new_order(OrderId::from(order_id), new_order(), Utc::now());
    order.status = status;
    db.insert_order(order).await;
    OrderId::from(order_id)
}

pub type MemoryApi = OrderFlowApi<MemoryDatabase, MemoryLeaseStore>;

pub fn memory_api(ttl: Duration, delay: ProcessingDelay) -> (MemoryApi, MemoryDatabase, MemoryLeaseStore) {
    let db = MemoryDatabase::new();
    let store = MemoryLeaseStore::new();
    let lock = LeaseLock::new(store.clone(), AcquirePolicy::default().with_ttl(ttl));
    (OrderFlowApi::new(db.clone(), lock, delay), db, store)
}

/// Wraps the in-memory lease store and counts acquisition attempts.
#[derive(Clone, Default)]
pub struct CountingLeaseStore {
    pub inner: MemoryLeaseStore,
    pub attempts: Arc<AtomicU32>,
    pub deletes: Arc<AtomicU32>,
}

impl CountingLeaseStore {
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> u32 {
        self.deletes.load(Ordering::SeqCst)
    }
}

impl LeaseStore for CountingLeaseStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, LeaseStoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.inner.set_if_absent(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), LeaseStoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key).await
    }
}
