//! Task-queue client interface and the enqueue path.
//!
//! The queue is an explicit, transport-decoupled seam: callers create a
//! queued job row and hand its id to [`JobQueue::submit`]. The default
//! implementation backs the queue with the jobs table itself -- workers
//! poll for queued rows and claim them atomically -- so `submit` only has
//! to validate that the work item is real.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use wayfinder_db::models::{Job, JobStatus, JobType};
use wayfinder_db::queries::{jobs as jobs_db, trips as trips_db};

use crate::config::CoreConfig;
use crate::ratelimit::{self, CounterStore};
use crate::sanitize::sanitize_text;

/// At-least-once delivery of `(job_id)` work items to the worker pool.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn submit(&self, job_type: JobType, job_id: Uuid) -> Result<()>;
}

/// Jobs-table-backed queue.
#[derive(Debug, Clone)]
pub struct PgJobQueue {
    pool: PgPool,
}

impl PgJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn submit(&self, job_type: JobType, job_id: Uuid) -> Result<()> {
        let job = jobs_db::get_job(&self.pool, job_id)
            .await?
            .with_context(|| format!("job {job_id} not found"))?;

        if job.job_type != job_type {
            anyhow::bail!(
                "job {job_id} has type {}, expected {job_type}",
                job.job_type
            );
        }
        if job.status != JobStatus::Queued {
            anyhow::bail!("job {job_id} is {}, expected queued", job.status);
        }

        tracing::info!(job_id = %job_id, job_type = %job_type, "job submitted");
        Ok(())
    }
}

/// Rejected before a job row exists.
#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("VALIDATION.TRIP_NOT_FOUND: trip does not exist for this user")]
    TripNotFound,
    #[error("VALIDATION.PLAN_INDEX_OUT_OF_RANGE: plan_index must be 0..=2")]
    PlanIndexOutOfRange,
    #[error("RATE_LIMIT.EXCEEDED: retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: i64 },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Validate, rate-limit, create, and submit a generation job.
///
/// This is the single entry point the CLI (or any other transport) uses to
/// get work into the pipeline.
pub async fn enqueue_job(
    pool: &PgPool,
    queue: &dyn JobQueue,
    counters: &dyn CounterStore,
    config: &CoreConfig,
    trip_id: Uuid,
    user_id: &str,
    job_type: JobType,
    plan_index: Option<i32>,
) -> Result<Job, EnqueueError> {
    let user_id = sanitize_text(user_id);

    let trip = trips_db::get_trip_for_user(pool, trip_id, &user_id)
        .await?
        .ok_or(EnqueueError::TripNotFound)?;

    if let Some(index) = plan_index {
        if !(0..=2).contains(&index) {
            return Err(EnqueueError::PlanIndexOutOfRange);
        }
    }

    let route = job_type.to_string();
    let decision =
        ratelimit::check_now(counters, &user_id, &route, config.rate_limit_per_minute).await?;
    if !decision.allowed {
        return Err(EnqueueError::RateLimited {
            retry_after_seconds: decision.retry_after_seconds,
        });
    }

    let job = jobs_db::insert_job(pool, trip.id, &user_id, job_type, plan_index).await?;
    queue.submit(job_type, job.id).await?;
    Ok(job)
}
