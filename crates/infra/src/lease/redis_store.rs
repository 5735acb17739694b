//! Redis-backed lease store.
//!
//! - **Acquire**: `SET key token NX EX ttl`
//! - **Renew**: Lua compare-and-expire (`GET` + `EXPIRE` in one script)
//! - **Release**: Lua compare-and-delete (`GET` + `DEL` in one script)
//! - **Force release**: plain `DEL`
//! - **Listing**: cursor-based `SCAN MATCH prefix*` (never `KEYS`)
//!
//! Redis runs each script atomically, so no other client can observe or change
//! the key between the ownership check and the mutation.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::instrument;

use super::store::{LeaseStore, LeaseStoreError};

/// Extend the TTL only while the caller still owns the key.
const RENEW_IF_OWNER_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("EXPIRE", KEYS[1], ARGV[2])
else
    return 0
end
"#;

/// Delete only while the caller still owns the key.
const DELETE_IF_OWNER_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Keys fetched per `SCAN` round trip.
const SCAN_BATCH: usize = 100;

#[derive(Clone)]
pub struct RedisLeaseStore {
    conn: ConnectionManager,
    renew_script: redis::Script,
    delete_script: redis::Script,
}

impl std::fmt::Debug for RedisLeaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisLeaseStore").finish_non_exhaustive()
    }
}

impl RedisLeaseStore {
    /// Connect to Redis (e.g. "redis://localhost:6379").
    ///
    /// The connection manager reconnects transparently after network failures;
    /// commands issued while disconnected fail and surface as
    /// [`LeaseStoreError::Connection`].
    pub async fn connect(redis_url: impl AsRef<str>) -> Result<Self, LeaseStoreError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| LeaseStoreError::Connection(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| LeaseStoreError::Connection(e.to_string()))?;

        Ok(Self {
            conn,
            renew_script: redis::Script::new(RENEW_IF_OWNER_SCRIPT),
            delete_script: redis::Script::new(DELETE_IF_OWNER_SCRIPT),
        })
    }
}

fn command_error(op: &str, e: redis::RedisError) -> LeaseStoreError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout() {
        LeaseStoreError::Connection(format!("{op} failed: {e}"))
    } else {
        LeaseStoreError::Command(format!("{op} failed: {e}"))
    }
}

/// Redis expirations are whole seconds; never round a positive TTL down to 0.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl LeaseStore for RedisLeaseStore {
    #[instrument(level = "debug", skip(self, value), err)]
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, LeaseStoreError> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs(ttl))
            .query_async(&mut conn)
            .await
            .map_err(|e| command_error("SET NX", e))?;

        Ok(reply.is_some())
    }

    #[instrument(level = "debug", skip(self, value), err)]
    async fn renew_if_owner(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, LeaseStoreError> {
        let mut conn = self.conn.clone();
        let renewed: i64 = self
            .renew_script
            .key(key)
            .arg(value)
            .arg(ttl_secs(ttl))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| LeaseStoreError::Script(format!("renew failed: {e}")))?;

        Ok(renewed == 1)
    }

    #[instrument(level = "debug", skip(self, value), err)]
    async fn delete_if_owner(&self, key: &str, value: &str) -> Result<bool, LeaseStoreError> {
        let mut conn = self.conn.clone();
        let deleted: i64 = self
            .delete_script
            .key(key)
            .arg(value)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| LeaseStoreError::Script(format!("release failed: {e}")))?;

        Ok(deleted == 1)
    }

    #[instrument(level = "debug", skip(self), err)]
    async fn delete(&self, key: &str) -> Result<bool, LeaseStoreError> {
        let mut conn = self.conn.clone();
        let deleted: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| command_error("DEL", e))?;

        Ok(deleted > 0)
    }

    #[instrument(level = "debug", skip(self), err)]
    async fn get(&self, key: &str) -> Result<Option<String>, LeaseStoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| command_error("GET", e))
    }

    #[instrument(level = "debug", skip(self), err)]
    async fn ttl(&self, key: &str) -> Result<Option<u64>, LeaseStoreError> {
        let mut conn = self.conn.clone();
        // -2: key absent, -1: key without expiration.
        let ttl: i64 = redis::cmd("TTL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| command_error("TTL", e))?;

        Ok(u64::try_from(ttl).ok())
    }

    #[instrument(level = "debug", skip(self), err)]
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, LeaseStoreError> {
        let mut conn = self.conn.clone();
        let pattern = format!("{prefix}*");
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| command_error("SCAN", e))?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once across iterations.
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}
