//! Database query functions for the `jobs` table.
//!
//! Stage transitions use optimistic locking: the UPDATE's WHERE clause pins
//! the expected current stage, and callers inspect `rows_affected` to detect
//! a lost race or an illegal jump.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Job, JobStage, JobType};

/// Insert a new queued job. Returns the inserted row with server-generated
/// defaults (id, status, stage, timestamps).
pub async fn insert_job(
    pool: &PgPool,
    trip_id: Uuid,
    user_id: &str,
    job_type: JobType,
    plan_index: Option<i32>,
) -> Result<Job> {
    let job = sqlx::query_as::<_, Job>(
        "INSERT INTO jobs (trip_id, user_id, job_type, plan_index) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(trip_id)
    .bind(user_id)
    .bind(job_type)
    .bind(plan_index)
    .fetch_one(pool)
    .await
    .context("failed to insert job")?;

    Ok(job)
}

/// Fetch a single job by ID.
pub async fn get_job(pool: &PgPool, id: Uuid) -> Result<Option<Job>> {
    let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch job")?;

    Ok(job)
}

/// List all jobs for a trip, newest first.
pub async fn list_jobs_for_trip(pool: &PgPool, trip_id: Uuid) -> Result<Vec<Job>> {
    let jobs = sqlx::query_as::<_, Job>(
        "SELECT * FROM jobs WHERE trip_id = $1 ORDER BY created_at DESC",
    )
    .bind(trip_id)
    .fetch_all(pool)
    .await
    .context("failed to list jobs for trip")?;

    Ok(jobs)
}

/// Atomically claim the oldest queued job.
///
/// The claim moves the job straight to `STARTING`/`running` so a second
/// worker polling concurrently cannot take the same row
/// (`FOR UPDATE SKIP LOCKED` + the `status = 'queued'` pin). Returns `None`
/// when the queue is empty.
pub async fn claim_next_queued(pool: &PgPool) -> Result<Option<Job>> {
    let job = sqlx::query_as::<_, Job>(
        "UPDATE jobs \
         SET status = 'running', stage = 'STARTING', progress = 5, \
             message = 'starting', updated_at = NOW() \
         WHERE id = ( \
             SELECT id FROM jobs \
             WHERE status = 'queued' \
             ORDER BY created_at ASC \
             LIMIT 1 \
             FOR UPDATE SKIP LOCKED \
         ) \
         RETURNING *",
    )
    .fetch_optional(pool)
    .await
    .context("failed to claim next queued job")?;

    Ok(job)
}

/// Atomically advance a running job from one stage to another.
///
/// Status and progress are derived from the target stage. Returns the number
/// of rows affected (0 means the current stage did not match `from`).
pub async fn transition_stage(
    pool: &PgPool,
    job_id: Uuid,
    from: JobStage,
    to: JobStage,
    message: &str,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE jobs \
         SET stage = $1, status = $2, progress = $3, message = $4, updated_at = NOW() \
         WHERE id = $5 AND stage = $6",
    )
    .bind(to)
    .bind(to.status())
    .bind(to.progress())
    .bind(message)
    .bind(job_id)
    .bind(from)
    .execute(pool)
    .await
    .context("failed to transition job stage")?;

    Ok(result.rows_affected())
}

/// Mark a job complete, attaching its result payload.
///
/// Optimistically locked on the expected current stage.
pub async fn complete_job(
    pool: &PgPool,
    job_id: Uuid,
    from: JobStage,
    result_payload: &serde_json::Value,
    message: &str,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE jobs \
         SET stage = 'COMPLETE', status = 'succeeded', progress = 100, \
             message = $1, result = $2, updated_at = NOW() \
         WHERE id = $3 AND stage = $4",
    )
    .bind(message)
    .bind(result_payload)
    .bind(job_id)
    .bind(from)
    .execute(pool)
    .await
    .context("failed to complete job")?;

    Ok(result.rows_affected())
}

/// Mark a job failed with a structured error.
///
/// Allowed from any non-terminal stage; terminal jobs are left untouched
/// (rows_affected = 0).
pub async fn fail_job(
    pool: &PgPool,
    job_id: Uuid,
    error_code: &str,
    error_message: &str,
    next_action: &str,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE jobs \
         SET stage = 'FAILED', status = 'failed', progress = 100, \
             message = $1, error_code = $2, error_message = $1, \
             next_action = $3, updated_at = NOW() \
         WHERE id = $4 AND stage NOT IN ('COMPLETE', 'FAILED')",
    )
    .bind(error_message)
    .bind(error_code)
    .bind(next_action)
    .bind(job_id)
    .execute(pool)
    .await
    .context("failed to fail job")?;

    Ok(result.rows_affected())
}
