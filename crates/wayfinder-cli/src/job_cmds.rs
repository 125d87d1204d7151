//! `wayfinder submit` and `wayfinder status` commands.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use wayfinder_core::config::CoreConfig;
use wayfinder_core::job::queue::{EnqueueError, PgJobQueue, enqueue_job};
use wayfinder_core::ratelimit::PgCounterStore;
use wayfinder_db::models::JobType;
use wayfinder_db::queries::jobs as jobs_db;

use crate::SubmitCommands;

pub async fn run_submit_command(
    command: SubmitCommands,
    pool: &PgPool,
    core_config: &CoreConfig,
) -> Result<()> {
    let (trip_id, user, job_type, plan_index) = match command {
        SubmitCommands::Plan { trip_id, user } => (trip_id, user, JobType::Plan, None),
        SubmitCommands::Itinerary {
            trip_id,
            user,
            plan_index,
        } => (trip_id, user, JobType::Itinerary, Some(plan_index)),
    };

    let trip_id =
        Uuid::parse_str(&trip_id).with_context(|| format!("invalid trip ID: {trip_id}"))?;
    let queue = PgJobQueue::new(pool.clone());
    let counters = PgCounterStore::new(pool.clone());

    let result = enqueue_job(
        pool,
        &queue,
        &counters,
        core_config,
        trip_id,
        &user,
        job_type,
        plan_index,
    )
    .await;

    match result {
        Ok(job) => {
            println!("Job enqueued: {}", job.id);
            println!("Poll with `wayfinder status {}`.", job.id);
            Ok(())
        }
        Err(EnqueueError::RateLimited {
            retry_after_seconds,
        }) => {
            eprintln!("Rate limit exceeded; retry in {retry_after_seconds}s.");
            std::process::exit(1);
        }
        Err(EnqueueError::TripNotFound) => {
            eprintln!("Trip not found for this user.");
            std::process::exit(1);
        }
        Err(EnqueueError::PlanIndexOutOfRange) => {
            eprintln!("plan-index must be 0, 1, or 2.");
            std::process::exit(1);
        }
        Err(EnqueueError::Other(e)) => Err(e),
    }
}

pub async fn run_status(pool: &PgPool, job_id: &str) -> Result<()> {
    let id = Uuid::parse_str(job_id).with_context(|| format!("invalid job ID: {job_id}"))?;
    let job = jobs_db::get_job(pool, id)
        .await?
        .with_context(|| format!("job {job_id} not found"))?;

    println!("Job {}", job.id);
    println!("  Type:     {}", job.job_type);
    println!("  Status:   {}", job.status);
    println!("  Stage:    {} ({}%)", job.stage, job.progress);
    println!("  Message:  {}", job.message);
    println!("  Updated:  {}", job.updated_at);

    if let Some(code) = &job.error_code {
        println!("  Error:    {code}");
        if let Some(message) = &job.error_message {
            println!("            {message}");
        }
        if let Some(next_action) = &job.next_action {
            println!("  Next:     {next_action}");
        }
    }
    if let Some(result) = &job.result {
        println!("  Result:   {result}");
    }
    Ok(())
}
