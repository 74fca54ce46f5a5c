//! Redis-backed rate limit store.
//!
//! Atomic INCR + PEXPIRE keeps one shared budget across instances; selected
//! when `REDIS_URL` is configured. The connection is lazy and rebuilt after
//! a failed command.

use std::sync::{Arc, Mutex};

use redis::Client;

use crate::error::{ApiError, Result};
use crate::rate_limiter::{Clock, RateLimitQuota, RateLimitResult, RateLimitStore};

const KEY_PREFIX: &str = "komnot:rl:";

const CHECK_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
  redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
local ttl = redis.call('PTTL', KEYS[1])
return {count, ttl}
"#;

pub struct RedisRateLimitStore {
    client: Client,
    connection: Mutex<Option<redis::Connection>>,
    clock: Arc<dyn Clock>,
}

impl RedisRateLimitStore {
    pub fn new(redis_url: &str, clock: Arc<dyn Clock>) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| ApiError::Internal(format!("failed to create redis client: {}", e)))?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
            clock,
        })
    }

    fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut redis::Connection) -> redis::RedisResult<T>,
    ) -> Result<T> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| ApiError::Internal("redis connection lock poisoned".to_string()))?;

        if guard.is_none() {
            let conn = self
                .client
                .get_connection()
                .map_err(|e| ApiError::Internal(format!("failed to connect to redis: {}", e)))?;
            *guard = Some(conn);
        }

        let Some(conn) = guard.as_mut() else {
            return Err(ApiError::Internal("redis connection unavailable".to_string()));
        };

        match f(conn) {
            Ok(value) => Ok(value),
            Err(e) => {
                // Drop the broken connection; the next call reconnects.
                *guard = None;
                Err(ApiError::Internal(format!("redis command failed: {}", e)))
            }
        }
    }
}

impl RateLimitStore for RedisRateLimitStore {
    fn check(&self, key: &str, quota: &RateLimitQuota) -> Result<RateLimitResult> {
        let window_ms = quota.window.as_millis() as u64;
        let redis_key = format!("{}{}", KEY_PREFIX, key);

        let (count, ttl_ms): (u64, i64) = self.with_connection(|conn| {
            redis::cmd("EVAL")
                .arg(CHECK_SCRIPT)
                .arg(1)
                .arg(&redis_key)
                .arg(window_ms)
                .query(conn)
        })?;

        let now = self.clock.now_ms();
        let reset_ms = if ttl_ms > 0 {
            now + ttl_ms as u64
        } else {
            now + window_ms
        };

        let count = count.min(u32::MAX as u64) as u32;
        if count > quota.limit {
            Ok(RateLimitResult {
                success: false,
                limit: quota.limit,
                remaining: 0,
                reset_ms,
            })
        } else {
            Ok(RateLimitResult {
                success: true,
                limit: quota.limit,
                remaining: quota.limit - count,
                reset_ms,
            })
        }
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
