//! Database query functions for the `alerts` and `notifications` tables.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Alert, Notification};

/// Insert a new active alert for a trip.
pub async fn insert_alert(
    pool: &PgPool,
    trip_id: Uuid,
    alert_type: &str,
    threshold: f64,
    frequency_minutes: i32,
) -> Result<Alert> {
    let alert = sqlx::query_as::<_, Alert>(
        "INSERT INTO alerts (trip_id, alert_type, threshold, frequency_minutes) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(trip_id)
    .bind(alert_type)
    .bind(threshold)
    .bind(frequency_minutes)
    .fetch_one(pool)
    .await
    .context("failed to insert alert")?;

    Ok(alert)
}

/// List all active alerts.
pub async fn list_active(pool: &PgPool) -> Result<Vec<Alert>> {
    let alerts = sqlx::query_as::<_, Alert>(
        "SELECT * FROM alerts WHERE is_active ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await
    .context("failed to list active alerts")?;

    Ok(alerts)
}

/// Record that an alert was checked at the given time.
pub async fn mark_checked(pool: &PgPool, alert_id: Uuid, at: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("UPDATE alerts SET last_checked_at = $1 WHERE id = $2")
        .bind(at)
        .bind(alert_id)
        .execute(pool)
        .await
        .context("failed to mark alert checked")?;

    Ok(result.rows_affected())
}

/// Record a triggered notification.
pub async fn insert_notification(
    pool: &PgPool,
    alert_id: Uuid,
    channel: &str,
    payload: &serde_json::Value,
    status: &str,
) -> Result<Notification> {
    let notification = sqlx::query_as::<_, Notification>(
        "INSERT INTO notifications (alert_id, channel, payload, status) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(alert_id)
    .bind(channel)
    .bind(payload)
    .bind(status)
    .fetch_one(pool)
    .await
    .context("failed to insert notification")?;

    Ok(notification)
}
