//! Database query functions for the `trips` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Trip;

/// Fields for a new trip row.
#[derive(Debug, Clone)]
pub struct NewTrip {
    pub user_id: String,
    pub origin: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub flexible_days: i32,
    pub budget_total: f64,
    pub currency: String,
    pub travelers: i32,
    pub preferences: serde_json::Value,
}

/// Insert a new trip row. Returns the inserted trip.
pub async fn insert_trip(pool: &PgPool, new: &NewTrip) -> Result<Trip> {
    let trip = sqlx::query_as::<_, Trip>(
        "INSERT INTO trips (user_id, origin, destination, start_date, end_date, \
                            flexible_days, budget_total, currency, travelers, preferences) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING *",
    )
    .bind(&new.user_id)
    .bind(&new.origin)
    .bind(&new.destination)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(new.flexible_days)
    .bind(new.budget_total)
    .bind(&new.currency)
    .bind(new.travelers)
    .bind(&new.preferences)
    .fetch_one(pool)
    .await
    .context("failed to insert trip")?;

    Ok(trip)
}

/// Fetch a single trip by ID.
pub async fn get_trip(pool: &PgPool, id: Uuid) -> Result<Option<Trip>> {
    let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch trip")?;

    Ok(trip)
}

/// Fetch a trip by ID scoped to its owning user.
pub async fn get_trip_for_user(pool: &PgPool, id: Uuid, user_id: &str) -> Result<Option<Trip>> {
    let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch trip for user")?;

    Ok(trip)
}

/// Store derived constraints on a trip (does not confirm them).
pub async fn set_constraints(
    pool: &PgPool,
    trip_id: Uuid,
    constraints: &serde_json::Value,
) -> Result<u64> {
    let result = sqlx::query("UPDATE trips SET constraints = $1 WHERE id = $2")
        .bind(constraints)
        .bind(trip_id)
        .execute(pool)
        .await
        .context("failed to set trip constraints")?;

    Ok(result.rows_affected())
}

/// Stamp a trip's constraints as confirmed. Plan jobs check this stamp
/// before generating.
pub async fn confirm_constraints(pool: &PgPool, trip_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE trips SET constraints_confirmed_at = NOW() \
         WHERE id = $1 AND constraints IS NOT NULL",
    )
    .bind(trip_id)
    .execute(pool)
    .await
    .context("failed to confirm trip constraints")?;

    Ok(result.rows_affected())
}
