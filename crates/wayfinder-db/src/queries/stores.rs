//! Shared-store primitives: cache entries and rate-limit counters.
//!
//! Both tables are mutated through single atomic statements so that
//! correctness never depends on in-process locking. These back the
//! `CacheStore` and `CounterStore` traits in wayfinder-core.

use anyhow::{Context, Result};
use sqlx::PgPool;

/// Fetch a cache entry if it exists and has not expired.
pub async fn cache_get(pool: &PgPool, key: &str) -> Result<Option<String>> {
    let value: Option<(String,)> =
        sqlx::query_as("SELECT value FROM cache_entries WHERE key = $1 AND expires_at > NOW()")
            .bind(key)
            .fetch_optional(pool)
            .await
            .context("failed to read cache entry")?;

    Ok(value.map(|(v,)| v))
}

/// Upsert a cache entry with a TTL in seconds.
pub async fn cache_put(pool: &PgPool, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
    sqlx::query(
        "INSERT INTO cache_entries (key, value, expires_at) \
         VALUES ($1, $2, NOW() + $3 * INTERVAL '1 second') \
         ON CONFLICT (key) DO UPDATE \
         SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at",
    )
    .bind(key)
    .bind(value)
    .bind(ttl_seconds as f64)
    .execute(pool)
    .await
    .context("failed to write cache entry")?;

    Ok(())
}

/// Atomically increment a windowed counter, setting its expiry on the first
/// increment. Returns the post-increment count.
///
/// A row left over past its expiry is treated as absent: the counter resets
/// to 1 and a fresh expiry is stamped.
pub async fn counter_increment(pool: &PgPool, key: &str, expiry_seconds: u64) -> Result<i64> {
    let row: (i64,) = sqlx::query_as(
        "INSERT INTO rate_limit_counters (key, count, expires_at) \
         VALUES ($1, 1, NOW() + $2 * INTERVAL '1 second') \
         ON CONFLICT (key) DO UPDATE \
         SET count = CASE \
                 WHEN rate_limit_counters.expires_at < NOW() THEN 1 \
                 ELSE rate_limit_counters.count + 1 \
             END, \
             expires_at = CASE \
                 WHEN rate_limit_counters.expires_at < NOW() THEN EXCLUDED.expires_at \
                 ELSE rate_limit_counters.expires_at \
             END \
         RETURNING count",
    )
    .bind(key)
    .bind(expiry_seconds as f64)
    .fetch_one(pool)
    .await
    .context("failed to increment rate-limit counter")?;

    Ok(row.0)
}

/// Delete expired rows from both shared stores. Housekeeping, called
/// opportunistically by the worker tick.
pub async fn purge_expired(pool: &PgPool) -> Result<u64> {
    let cache = sqlx::query("DELETE FROM cache_entries WHERE expires_at <= NOW()")
        .execute(pool)
        .await
        .context("failed to purge expired cache entries")?;

    let counters = sqlx::query("DELETE FROM rate_limit_counters WHERE expires_at <= NOW()")
        .execute(pool)
        .await
        .context("failed to purge expired rate-limit counters")?;

    Ok(cache.rows_affected() + counters.rows_affected())
}
