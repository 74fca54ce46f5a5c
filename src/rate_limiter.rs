//! Fixed-window rate limiting.
//!
//! Counters live behind the [`RateLimitStore`] trait so the in-memory store
//! can be swapped for a shared backend (see `redis_store`) without touching
//! guard logic. The in-memory store takes an injected [`Clock`], which keeps
//! window arithmetic deterministic under test.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{ApiError, Result};

/// How often the in-memory store drops expired entries.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Per-endpoint-class quota: `limit` requests per `window`.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitQuota {
    pub limit: u32,
    pub window: Duration,
}

/// Preset quotas per endpoint class. Route handlers pick the class; the
/// limiter knows nothing about endpoints.
pub mod presets {
    use super::RateLimitQuota;
    use std::time::Duration;

    pub const API: RateLimitQuota = RateLimitQuota {
        limit: 60,
        window: Duration::from_secs(60),
    };
    pub const READ: RateLimitQuota = RateLimitQuota {
        limit: 120,
        window: Duration::from_secs(60),
    };
    pub const WRITE: RateLimitQuota = RateLimitQuota {
        limit: 30,
        window: Duration::from_secs(60),
    };
    pub const HEAVY: RateLimitQuota = RateLimitQuota {
        limit: 10,
        window: Duration::from_secs(60),
    };
}

/// Outcome of a single check. Derived from stored state, never stored itself.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitResult {
    pub success: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_ms: u64,
}

/// Time source for window arithmetic.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Clock advanced by hand, for deterministic tests.
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self(AtomicU64::new(start_ms))
    }

    pub fn advance(&self, by: Duration) {
        self.0.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Keyed request counters over a fixed window.
pub trait RateLimitStore: Send + Sync {
    /// Count one request against `key` and report whether it is allowed.
    fn check(&self, key: &str, quota: &RateLimitQuota) -> Result<RateLimitResult>;

    /// Backend name, reported by the health endpoint.
    fn backend(&self) -> &'static str;
}

struct RateLimitEntry {
    count: u32,
    reset_ms: u64,
}

/// Process-local store. Counters are per instance; a multi-instance
/// deployment gets independent budgets per instance unless the Redis store
/// is substituted.
pub struct MemoryRateLimitStore {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
    last_sweep_ms: AtomicU64,
    sweep_interval_ms: u64,
    clock: Arc<dyn Clock>,
}

impl MemoryRateLimitStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now_ms();
        Self {
            entries: Mutex::new(HashMap::new()),
            last_sweep_ms: AtomicU64::new(now),
            sweep_interval_ms: SWEEP_INTERVAL.as_millis() as u64,
            clock,
        }
    }

    /// Number of live entries, expired or not. Used by tests to observe
    /// sweep behavior.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sweep_if_due(&self, now: u64) {
        let last = self.last_sweep_ms.load(Ordering::Acquire);
        if now.saturating_sub(last) < self.sweep_interval_ms {
            return;
        }
        // One sweep per interval, whichever request crosses the line first.
        if self
            .last_sweep_ms
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        if let Ok(mut entries) = self.entries.lock() {
            let before = entries.len();
            entries.retain(|_, entry| entry.reset_ms > now);
            let removed = before - entries.len();
            if removed > 0 {
                tracing::debug!(target: "komnot::rate_limit", removed, "swept expired entries");
            }
        }
    }
}

impl RateLimitStore for MemoryRateLimitStore {
    fn check(&self, key: &str, quota: &RateLimitQuota) -> Result<RateLimitResult> {
        let now = self.clock.now_ms();
        self.sweep_if_due(now);

        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ApiError::Internal("rate limit store lock poisoned".to_string()))?;

        let window_ms = quota.window.as_millis() as u64;
        let entry = entries
            .entry(key.to_string())
            .or_insert(RateLimitEntry { count: 0, reset_ms: 0 });

        if entry.reset_ms <= now {
            // First request of a window, or the previous window expired.
            entry.count = 1;
            entry.reset_ms = now + window_ms;
            return Ok(RateLimitResult {
                success: true,
                limit: quota.limit,
                remaining: quota.limit.saturating_sub(1),
                reset_ms: entry.reset_ms,
            });
        }

        entry.count = entry.count.saturating_add(1);
        if entry.count > quota.limit {
            Ok(RateLimitResult {
                success: false,
                limit: quota.limit,
                remaining: 0,
                reset_ms: entry.reset_ms,
            })
        } else {
            Ok(RateLimitResult {
                success: true,
                limit: quota.limit,
                remaining: quota.limit - entry.count,
                reset_ms: entry.reset_ms,
            })
        }
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
