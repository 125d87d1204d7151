//! Database query functions for the `itineraries` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::ItineraryRecord;

/// Insert a generated itinerary artifact. Write-once: rows are never updated.
pub async fn insert_itinerary(
    pool: &PgPool,
    trip_id: Uuid,
    plan_index: i32,
    itinerary_json: &serde_json::Value,
    itinerary_md: &str,
) -> Result<ItineraryRecord> {
    let itinerary = sqlx::query_as::<_, ItineraryRecord>(
        "INSERT INTO itineraries (trip_id, plan_index, itinerary_json, itinerary_md) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(trip_id)
    .bind(plan_index)
    .bind(itinerary_json)
    .bind(itinerary_md)
    .fetch_one(pool)
    .await
    .context("failed to insert itinerary")?;

    Ok(itinerary)
}

/// Fetch the newest itinerary for a trip.
pub async fn latest_for_trip(pool: &PgPool, trip_id: Uuid) -> Result<Option<ItineraryRecord>> {
    let itinerary = sqlx::query_as::<_, ItineraryRecord>(
        "SELECT * FROM itineraries WHERE trip_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(trip_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch latest itinerary for trip")?;

    Ok(itinerary)
}
