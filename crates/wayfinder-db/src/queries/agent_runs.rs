//! Database query functions for the `agent_runs` audit table.
//!
//! Append-only: one row per generation run, used for replay and debugging.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::AgentRun;

/// Fields for a new audit record.
#[derive(Debug, Clone)]
pub struct NewAgentRun {
    pub trip_id: Uuid,
    pub phase: String,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
    pub tool_calls: serde_json::Value,
    pub model_info: serde_json::Value,
}

/// Append an audit record.
pub async fn insert_agent_run(pool: &PgPool, new: &NewAgentRun) -> Result<AgentRun> {
    let run = sqlx::query_as::<_, AgentRun>(
        "INSERT INTO agent_runs (trip_id, phase, input, output, tool_calls, model_info) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(new.trip_id)
    .bind(&new.phase)
    .bind(&new.input)
    .bind(&new.output)
    .bind(&new.tool_calls)
    .bind(&new.model_info)
    .fetch_one(pool)
    .await
    .context("failed to insert agent run")?;

    Ok(run)
}

/// List audit records for a trip, newest first.
pub async fn list_for_trip(pool: &PgPool, trip_id: Uuid) -> Result<Vec<AgentRun>> {
    let runs = sqlx::query_as::<_, AgentRun>(
        "SELECT * FROM agent_runs WHERE trip_id = $1 ORDER BY created_at DESC",
    )
    .bind(trip_id)
    .fetch_all(pool)
    .await
    .context("failed to list agent runs for trip")?;

    Ok(runs)
}
