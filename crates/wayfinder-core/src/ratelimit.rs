//! Fixed-window rate limiting keyed by user, route, and calendar minute.
//!
//! The counter store must provide atomic increment-and-expire semantics
//! shared across all worker instances; the limiter itself holds no state.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use wayfinder_db::queries::stores;

/// Window length in seconds.
pub const WINDOW_SECONDS: i64 = 60;

/// Counter expiry, slightly longer than the window to tolerate clock skew.
pub const WINDOW_EXPIRY: Duration = Duration::from_secs(75);

/// Atomic windowed counter.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment the counter at `key`, setting `expiry` on the first
    /// increment, and return the post-increment count.
    async fn increment_with_expiry(&self, key: &str, expiry: Duration) -> Result<i64>;
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: i64,
    pub retry_after_seconds: i64,
}

/// Check and count one request in the current fixed window.
///
/// `now_unix` is the caller-supplied wall clock (seconds); production code
/// uses [`check_now`].
pub async fn check(
    store: &dyn CounterStore,
    user_id: &str,
    route: &str,
    limit_per_minute: i64,
    now_unix: i64,
) -> Result<RateLimitDecision> {
    let window = now_unix.div_euclid(WINDOW_SECONDS);
    let key = format!("rl:{user_id}:{route}:{window}");
    let count = store.increment_with_expiry(&key, WINDOW_EXPIRY).await?;

    if count <= limit_per_minute {
        Ok(RateLimitDecision {
            allowed: true,
            remaining: (limit_per_minute - count).max(0),
            retry_after_seconds: 0,
        })
    } else {
        Ok(RateLimitDecision {
            allowed: false,
            remaining: 0,
            retry_after_seconds: WINDOW_SECONDS - now_unix.rem_euclid(WINDOW_SECONDS),
        })
    }
}

/// [`check`] against the current wall clock.
pub async fn check_now(
    store: &dyn CounterStore,
    user_id: &str,
    route: &str,
    limit_per_minute: i64,
) -> Result<RateLimitDecision> {
    check(
        store,
        user_id,
        route,
        limit_per_minute,
        chrono::Utc::now().timestamp(),
    )
    .await
}

/// Postgres-backed counter store shared by all worker instances.
#[derive(Debug, Clone)]
pub struct PgCounterStore {
    pool: PgPool,
}

impl PgCounterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CounterStore for PgCounterStore {
    async fn increment_with_expiry(&self, key: &str, expiry: Duration) -> Result<i64> {
        stores::counter_increment(&self.pool, key, expiry.as_secs()).await
    }
}

/// In-memory counter store for tests.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: Mutex<HashMap<String, (i64, Instant)>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment_with_expiry(&self, key: &str, expiry: Duration) -> Result<i64> {
        let mut counters = self.counters.lock().expect("counter mutex poisoned");
        let now = Instant::now();
        let entry = counters.entry(key.to_owned()).or_insert((0, now + expiry));
        if entry.1 <= now {
            *entry = (0, now + expiry);
        }
        entry.0 += 1;
        Ok(entry.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn limit_allows_then_denies() {
        let store = MemoryCounterStore::new();
        let limit = 3;
        let now = 1_900_000_000;

        for i in 1..=limit {
            let decision = check(&store, "u1", "plan", limit, now).await.unwrap();
            assert!(decision.allowed, "request {i} should be allowed");
            assert_eq!(decision.remaining, limit - i);
        }

        let denied = check(&store, "u1", "plan", limit, now).await.unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert!(denied.retry_after_seconds >= 1 && denied.retry_after_seconds <= 60);
    }

    #[tokio::test]
    async fn last_allowed_request_has_zero_remaining() {
        let store = MemoryCounterStore::new();
        let decision = check(&store, "u1", "plan", 1, 0).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[tokio::test]
    async fn windows_are_independent() {
        let store = MemoryCounterStore::new();
        let now = 1_900_000_000;

        let first = check(&store, "u1", "plan", 1, now).await.unwrap();
        assert!(first.allowed);
        let denied = check(&store, "u1", "plan", 1, now + 1).await.unwrap();
        assert!(!denied.allowed);

        // Next calendar minute gets a fresh counter.
        let next_window = check(&store, "u1", "plan", 1, now + WINDOW_SECONDS)
            .await
            .unwrap();
        assert!(next_window.allowed);
    }

    #[tokio::test]
    async fn users_and_routes_are_isolated() {
        let store = MemoryCounterStore::new();
        let now = 1_900_000_000;

        assert!(check(&store, "u1", "plan", 1, now).await.unwrap().allowed);
        assert!(!check(&store, "u1", "plan", 1, now).await.unwrap().allowed);
        assert!(check(&store, "u2", "plan", 1, now).await.unwrap().allowed);
        assert!(check(&store, "u1", "itinerary", 1, now).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn retry_after_counts_down_within_window() {
        let store = MemoryCounterStore::new();
        let now = 1_900_000_030; // 30 seconds into the minute
        let _ = check(&store, "u1", "plan", 0, now).await.unwrap();
        let denied = check(&store, "u1", "plan", 0, now).await.unwrap();
        assert_eq!(denied.retry_after_seconds, 30);
    }
}
