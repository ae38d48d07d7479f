use std::{collections::HashMap, sync::Arc, time::Duration};

use log::*;
use tokio::{sync::Mutex, time::Instant};

use super::{LeaseStore, LeaseStoreError};

struct Entry {
    #[allow(dead_code)]
    value: String,
    expires_at: Instant,
}

/// An in-process lease store. Clones share the same leases.
///
/// Expiry is measured with [`tokio::time::Instant`], so pausing and advancing the tokio clock moves leases towards
/// expiry exactly as it moves sleeps.
#[derive(Clone, Default)]
pub struct MemoryLeaseStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The time left on the lease under `key`, or `None` if it is absent or expired.
    pub async fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        entries.get(key).filter(|e| e.expires_at > now).map(|e| e.expires_at - now)
    }

    pub async fn is_held(&self, key: &str) -> bool {
        self.remaining_ttl(key).await.is_some()
    }
}

impl LeaseStore for MemoryLeaseStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, LeaseStoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get(key) {
            if entry.expires_at > now {
                return Ok(false);
            }
            trace!("🔒️ Lease {key} had expired. Replacing it.");
        }
        entries.insert(key.to_string(), Entry { value: value.to_string(), expires_at: now + ttl });
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<(), LeaseStoreError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
