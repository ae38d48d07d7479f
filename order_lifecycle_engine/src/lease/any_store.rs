use std::time::Duration;

#[cfg(feature = "redis")]
use super::RedisLeaseStore;
use super::{LeaseStore, LeaseStoreError, MemoryLeaseStore};

/// A lease store selected at runtime, typically from configuration.
#[derive(Clone)]
pub enum AnyLeaseStore {
    Memory(MemoryLeaseStore),
    #[cfg(feature = "redis")]
    Redis(RedisLeaseStore),
}

impl AnyLeaseStore {
    pub fn name(&self) -> &'static str {
        match self {
            AnyLeaseStore::Memory(_) => "in-process",
            #[cfg(feature = "redis")]
            AnyLeaseStore::Redis(_) => "redis",
        }
    }
}

impl Default for AnyLeaseStore {
    fn default() -> Self {
        AnyLeaseStore::Memory(MemoryLeaseStore::new())
    }
}

impl LeaseStore for AnyLeaseStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, LeaseStoreError> {
        match self {
            AnyLeaseStore::Memory(store) => store.set_if_absent(key, value, ttl).await,
            #[cfg(feature = "redis")]
            AnyLeaseStore::Redis(store) => store.set_if_absent(key, value, ttl).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), LeaseStoreError> {
        match self {
            AnyLeaseStore::Memory(store) => store.delete(key).await,
            #[cfg(feature = "redis")]
            AnyLeaseStore::Redis(store) => store.delete(key).await,
        }
    }
}
