//! Job state machine and execution.
//!
//! Validates and executes stage transitions for generation jobs, enforcing
//! the allowed transition graph and optimistic locking, with every
//! transition committed synchronously so a crash leaves the job's
//! last-known stage accurate.

pub mod error;
pub mod queue;
pub mod runner;

use anyhow::{Result, bail};
use sqlx::PgPool;
use uuid::Uuid;

use wayfinder_db::models::JobStage;
use wayfinder_db::queries::jobs as db;

use error::JobFailure;

/// The job state machine.
///
/// Enforces the valid transition graph:
///
/// ```text
/// QUEUED           -> STARTING           (claim)
/// STARTING         -> FETCH_CANDIDATES
/// FETCH_CANDIDATES -> GENERATE
/// GENERATE         -> VALIDATE
/// VALIDATE         -> PERSIST
/// PERSIST          -> COMPLETE
/// <any non-terminal> -> FAILED
/// ```
pub struct JobStateMachine;

impl JobStateMachine {
    /// Check whether a transition from `from` to `to` is a valid edge in
    /// the state graph.
    pub fn is_valid_transition(from: JobStage, to: JobStage) -> bool {
        if to == JobStage::Failed {
            return !from.is_terminal();
        }
        matches!(
            (from, to),
            (JobStage::Queued, JobStage::Starting)
                | (JobStage::Starting, JobStage::FetchCandidates)
                | (JobStage::FetchCandidates, JobStage::Generate)
                | (JobStage::Generate, JobStage::Validate)
                | (JobStage::Validate, JobStage::Persist)
                | (JobStage::Persist, JobStage::Complete)
        )
    }

    /// Advance a job to the next stage with optimistic locking.
    ///
    /// Returns an error if the transition is not a valid edge, the job does
    /// not exist, or the current stage in the database does not match
    /// `from` (optimistic lock failure).
    pub async fn advance(
        pool: &PgPool,
        job_id: Uuid,
        from: JobStage,
        to: JobStage,
        message: &str,
    ) -> Result<()> {
        if !Self::is_valid_transition(from, to) {
            bail!("invalid stage transition: {from} -> {to} for job {job_id}");
        }

        let rows = db::transition_stage(pool, job_id, from, to, message).await?;
        if rows == 0 {
            Self::diagnose_lock_failure(pool, job_id, from).await?;
        }
        Ok(())
    }

    /// Mark a job complete, attaching its result payload.
    pub async fn complete(
        pool: &PgPool,
        job_id: Uuid,
        from: JobStage,
        result: &serde_json::Value,
        message: &str,
    ) -> Result<()> {
        if !Self::is_valid_transition(from, JobStage::Complete) {
            bail!("invalid stage transition: {from} -> COMPLETE for job {job_id}");
        }

        let rows = db::complete_job(pool, job_id, from, result, message).await?;
        if rows == 0 {
            Self::diagnose_lock_failure(pool, job_id, from).await?;
        }
        Ok(())
    }

    /// Mark a job failed with a structured error. Legal from any
    /// non-terminal stage; a job already terminal is left untouched.
    pub async fn fail(pool: &PgPool, job_id: Uuid, failure: &JobFailure) -> Result<()> {
        let rows = db::fail_job(
            pool,
            job_id,
            failure.code.as_str(),
            &failure.message,
            &failure.next_action,
        )
        .await?;

        if rows == 0 {
            tracing::warn!(
                job_id = %job_id,
                code = failure.code.as_str(),
                "job already terminal, failure not recorded"
            );
        }
        Ok(())
    }

    async fn diagnose_lock_failure(pool: &PgPool, job_id: Uuid, expected: JobStage) -> Result<()> {
        let job = db::get_job(pool, job_id).await?;
        match job {
            None => bail!("job {job_id} not found"),
            Some(j) => bail!(
                "optimistic lock failed: job {job_id} is at stage {}, expected {expected}",
                j.stage
            ),
        }
    }
}
