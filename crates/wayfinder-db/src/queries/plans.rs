//! Database query functions for the `plans` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PlanRecord;

/// Insert a generated plan artifact. Write-once: rows are never updated.
pub async fn insert_plan(
    pool: &PgPool,
    trip_id: Uuid,
    plans_json: &serde_json::Value,
    explain_md: &str,
) -> Result<PlanRecord> {
    let plan = sqlx::query_as::<_, PlanRecord>(
        "INSERT INTO plans (trip_id, plans_json, explain_md) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(trip_id)
    .bind(plans_json)
    .bind(explain_md)
    .fetch_one(pool)
    .await
    .context("failed to insert plan")?;

    Ok(plan)
}

/// Fetch the newest plan for a trip.
///
/// Concurrent plan jobs for one trip are not mutually excluded; readers take
/// the latest row by creation time (last-write-wins).
pub async fn latest_for_trip(pool: &PgPool, trip_id: Uuid) -> Result<Option<PlanRecord>> {
    let plan = sqlx::query_as::<_, PlanRecord>(
        "SELECT * FROM plans WHERE trip_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(trip_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch latest plan for trip")?;

    Ok(plan)
}
