//! Redis fast-store backend
//!
//! Holds one multiplexed connection, lazily established and reset on
//! error. The multi-step bundles run as Lua scripts so concurrent
//! redirects and the sync job's reads cannot interleave with them. Every
//! round trip is bounded by the configured command timeout; an expired
//! deadline surfaces as a transient failure.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use redis::{AsyncCommands, ErrorKind, ServerErrorKind, aio::MultiplexedConnection};
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::config::FastStoreConfig;
use crate::errors::{Result, SnaplinkError};
use crate::faststore::{FastStore, TouchOutcome, keys};

/// KEYS[1] = url:{code}:clicks, KEYS[2] = url:{code}:expiry,
/// KEYS[3] = dirty_urls; ARGV = fallback clicks, fallback expiry, now, code.
/// Returns -1 when expired, else the new click count.
static REDIRECT_SCRIPT: Lazy<redis::Script> = Lazy::new(|| {
    redis::Script::new(
        r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
    redis.call('SET', KEYS[1], ARGV[1])
end
if redis.call('EXISTS', KEYS[2]) == 0 then
    redis.call('SET', KEYS[2], ARGV[2])
end
local expiry = redis.call('GET', KEYS[2])
if expiry < ARGV[3] then
    return -1
end
local clicks = redis.call('INCR', KEYS[1])
redis.call('SADD', KEYS[3], ARGV[4])
return clicks
"#,
    )
});

/// KEYS[1] = rate_limit:{client}; ARGV[1] = window seconds.
/// The expiry is set only on the 0->1 transition so two concurrent first
/// requests cannot both skip it.
static RATE_LIMIT_SCRIPT: Lazy<redis::Script> = Lazy::new(|| {
    redis::Script::new(
        r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], tonumber(ARGV[1]))
end
return count
"#,
    )
});

pub struct RedisFastStore {
    client: redis::Client,
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    command_timeout: Duration,
}

impl RedisFastStore {
    pub fn new(config: &FastStoreConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.clone()).map_err(|e| {
            SnaplinkError::fast_store_unavailable(format!(
                "invalid redis url '{}': {e}",
                config.url
            ))
        })?;

        debug!(
            "RedisFastStore created for {} (command timeout {}ms)",
            config.url, config.command_timeout_ms
        );

        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            command_timeout: Duration::from_millis(config.command_timeout_ms),
        })
    }

    async fn get_connection(&self) -> Result<MultiplexedConnection> {
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // double-checked: another task may have connected while we waited
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        let new_conn = tokio::time::timeout(
            self.command_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| SnaplinkError::fast_store_unavailable("redis connect timed out"))?
        .map_err(SnaplinkError::from)?;

        *conn_guard = Some(new_conn.clone());
        debug!("Redis connection established and cached");

        Ok(new_conn)
    }

    async fn reset_connection(&self) {
        let mut conn_guard = self.connection.write().await;
        *conn_guard = None;
        debug!("Redis connection reset due to error");
    }

    /// Bound a redis round trip by the command timeout and reset the
    /// cached connection on failure so the next call reconnects.
    async fn bounded<T, F>(&self, what: &str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.command_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!("Redis {} failed: {}", what, e);
                self.reset_connection().await;
                Err(SnaplinkError::from(e))
            }
            Err(_) => {
                error!("Redis {} timed out after {:?}", what, self.command_timeout);
                self.reset_connection().await;
                Err(SnaplinkError::fast_store_unavailable(format!(
                    "{what} timed out"
                )))
            }
        }
    }
}

#[async_trait]
impl FastStore for RedisFastStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;
        self.bounded("GET", conn.get(key)).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.get_connection().await?;
        self.bounded("SETEX", conn.set_ex(key, value, ttl_seconds))
            .await
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;
        self.bounded::<i64, _>("SADD", conn.sadd(key, member))
            .await?;
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.get_connection().await?;
        self.bounded("SMEMBERS", conn.smembers(key)).await
    }

    async fn rename(&self, src: &str, dst: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let result = tokio::time::timeout(
            self.command_timeout,
            redis::cmd("RENAME")
                .arg(src)
                .arg(dst)
                .query_async::<()>(&mut conn),
        )
        .await;

        match result {
            Ok(Ok(())) => Ok(true),
            // RENAME on an absent source is the expected empty-cycle signal
            Ok(Err(e))
                if e.kind() == ErrorKind::Server(ServerErrorKind::ResponseError)
                    && e.to_string().contains("no such key") =>
            {
                Ok(false)
            }
            Ok(Err(e)) => {
                error!("Redis RENAME {} -> {} failed: {}", src, dst, e);
                self.reset_connection().await;
                Err(SnaplinkError::from(e))
            }
            Err(_) => {
                self.reset_connection().await;
                Err(SnaplinkError::fast_store_unavailable("RENAME timed out"))
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;
        self.bounded::<i64, _>("DEL", conn.del(key)).await?;
        Ok(())
    }

    async fn touch(
        &self,
        code: &str,
        fallback_clicks: u64,
        fallback_expiry: &str,
        now: &str,
    ) -> Result<TouchOutcome> {
        let mut conn = self.get_connection().await?;

        let result = self
            .bounded::<i64, _>(
                "redirect script",
                REDIRECT_SCRIPT
                    .key(keys::clicks(code))
                    .key(keys::expiry(code))
                    .key(keys::DIRTY_SET)
                    .arg(fallback_clicks)
                    .arg(fallback_expiry)
                    .arg(now)
                    .arg(code)
                    .invoke_async(&mut conn),
            )
            .await?;

        if result == -1 {
            Ok(TouchOutcome::Expired)
        } else {
            Ok(TouchOutcome::Clicks(result.max(0) as u64))
        }
    }

    async fn rate_incr(&self, key: &str, window_seconds: u64) -> Result<u64> {
        let mut conn = self.get_connection().await?;

        let count = self
            .bounded::<i64, _>(
                "rate limit script",
                RATE_LIMIT_SCRIPT
                    .key(key)
                    .arg(window_seconds)
                    .invoke_async(&mut conn),
            )
            .await?;

        Ok(count.max(0) as u64)
    }
}
