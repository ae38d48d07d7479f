use std::time::Duration;

use log::*;
use redis::{aio::ConnectionManager, AsyncCommands, Client};

use super::{LeaseStore, LeaseStoreError};

/// A lease store backed by Redis, using `SET key value NX PX ttl` to acquire and `DEL key` to release.
///
/// Each clone shares the same `ConnectionManager`, which reconnects automatically.
#[derive(Clone)]
pub struct RedisLeaseStore {
    conn_manager: ConnectionManager,
}

impl RedisLeaseStore {
    pub async fn connect(url: &str) -> Result<Self, LeaseStoreError> {
        let client = Client::open(url).map_err(|e| LeaseStoreError::ConnectionError(e.to_string()))?;
        let conn_manager =
            ConnectionManager::new(client).await.map_err(|e| LeaseStoreError::ConnectionError(e.to_string()))?;
        info!("🔒️ Connected to Redis lease store");
        Ok(Self { conn_manager })
    }
}

impl LeaseStore for RedisLeaseStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, LeaseStoreError> {
        let mut conn = self.conn_manager.clone();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        // SET .. NX replies OK when written and nil when the key already exists
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await
            .map_err(|e| LeaseStoreError::CommandError(format!("SET NX failed for {key}: {e}")))?;
        Ok(reply.is_some())
    }

    async fn delete(&self, key: &str) -> Result<(), LeaseStoreError> {
        let mut conn = self.conn_manager.clone();
        let _: () = conn.del(key).await.map_err(|e| LeaseStoreError::CommandError(format!("DEL failed for {key}: {e}")))?;
        Ok(())
    }
}
