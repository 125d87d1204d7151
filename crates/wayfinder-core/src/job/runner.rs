//! Job execution: one handler per job type plus the top-level catch-all.
//!
//! Handlers walk the job through its stages, committing every transition to
//! the jobs table before moving on. Precondition and validation failures
//! return a structured [`JobFailure`]; anything unexpected bubbles up and
//! is recorded as `INTERNAL.WORKER_EXCEPTION` by [`execute_job`].

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::json;
use sqlx::PgPool;

use wayfinder_db::models::{Job, JobStage, JobType};
use wayfinder_db::queries::agent_runs::{self, NewAgentRun};
use wayfinder_db::queries::{itineraries as itineraries_db, plans as plans_db, trips as trips_db};

use crate::aggregator::Aggregator;
use crate::artifacts::PlansJson;
use crate::cache::CacheStore;
use crate::config::CoreConfig;
use crate::generate::GenerateError;
use crate::generate::itinerary as itinerary_flow;
use crate::generate::plans as plans_flow;
use crate::job::JobStateMachine;
use crate::job::error::{JobErrorCode, JobFailure};
use crate::providers::ProviderSet;
use crate::render;
use crate::sanitize::redact_json;
use crate::types::TripSnapshot;

/// Everything a worker needs to execute jobs. Built once at startup and
/// shared across the worker's lifetime.
pub struct WorkerContext {
    pub pool: PgPool,
    pub providers: Arc<ProviderSet>,
    pub cache: Arc<dyn CacheStore>,
    pub config: CoreConfig,
}

/// How a handler finished.
enum JobOutcome {
    Completed,
    Failed(JobFailure),
}

/// Execute a claimed job end-to-end.
///
/// Never lets a handler error escape: anything unexpected is caught here
/// and recorded as a terminal `INTERNAL.WORKER_EXCEPTION` failure.
pub async fn execute_job(ctx: &WorkerContext, job: &Job) -> Result<()> {
    tracing::info!(
        job_id = %job.id,
        trip_id = %job.trip_id,
        job_type = %job.job_type,
        "executing job"
    );

    let outcome = match job.job_type {
        JobType::Plan => run_plan_job(ctx, job).await,
        JobType::Itinerary => run_itinerary_job(ctx, job).await,
    };

    match outcome {
        Ok(JobOutcome::Completed) => {
            tracing::info!(job_id = %job.id, "job completed");
        }
        Ok(JobOutcome::Failed(failure)) => {
            tracing::warn!(
                job_id = %job.id,
                code = failure.code.as_str(),
                message = %failure.message,
                "job failed"
            );
            JobStateMachine::fail(&ctx.pool, job.id, &failure).await?;
        }
        Err(e) => {
            tracing::error!(job_id = %job.id, error = %format!("{e:#}"), "job crashed");
            let failure =
                JobFailure::with_message(JobErrorCode::WorkerException, format!("{e:#}"));
            JobStateMachine::fail(&ctx.pool, job.id, &failure).await?;
        }
    }
    Ok(())
}

/// Plan generation: STARTING -> FETCH_CANDIDATES -> GENERATE -> VALIDATE ->
/// PERSIST -> COMPLETE.
async fn run_plan_job(ctx: &WorkerContext, job: &Job) -> Result<JobOutcome> {
    // Preconditions, checked before any stage advance.
    let Some(trip) = trips_db::get_trip(&ctx.pool, job.trip_id).await? else {
        return Ok(JobOutcome::Failed(JobFailure::new(
            JobErrorCode::TripNotFound,
        )));
    };
    if trip.constraints_confirmed_at.is_none() {
        return Ok(JobOutcome::Failed(JobFailure::new(
            JobErrorCode::ConstraintsNotConfirmed,
        )));
    }
    let snapshot = TripSnapshot::from_trip(&trip);

    JobStateMachine::advance(
        &ctx.pool,
        job.id,
        JobStage::Starting,
        JobStage::FetchCandidates,
        "fetching flight and stay candidates",
    )
    .await?;

    let mut agg = Aggregator::new(ctx.providers.as_ref(), ctx.cache.as_ref());
    let (flights, stays) = plans_flow::fetch_candidates(&mut agg, &snapshot).await?;

    JobStateMachine::advance(
        &ctx.pool,
        job.id,
        JobStage::FetchCandidates,
        JobStage::Generate,
        "scoring candidate packages",
    )
    .await?;

    let generation = match plans_flow::assemble_plans(&mut agg, &snapshot, &flights, &stays).await
    {
        Ok(generation) => generation,
        Err(GenerateError::Optimizer(e)) => {
            return Ok(JobOutcome::Failed(JobFailure::with_message(
                JobErrorCode::NoCandidates,
                e.to_string(),
            )));
        }
        Err(GenerateError::Other(e)) => return Err(e),
    };

    JobStateMachine::advance(
        &ctx.pool,
        job.id,
        JobStage::Generate,
        JobStage::Validate,
        "validating generated plans",
    )
    .await?;

    if generation.plans.options.len() < 3 {
        return Ok(JobOutcome::Failed(JobFailure::new(
            JobErrorCode::PlanOutputInvalid,
        )));
    }

    JobStateMachine::advance(
        &ctx.pool,
        job.id,
        JobStage::Validate,
        JobStage::Persist,
        "persisting plan artifact",
    )
    .await?;

    let explain_md = render::render_plans_markdown(&snapshot, &generation.plans);
    let plans_value =
        serde_json::to_value(&generation.plans).context("failed to serialize plans")?;
    let record = plans_db::insert_plan(&ctx.pool, trip.id, &plans_value, &explain_md).await?;

    record_audit(
        ctx,
        &snapshot,
        "plan",
        json!({
            "plan_id": record.id,
            "options": generation.plans.options.len(),
            "budget_issues": generation.budget_issues,
        }),
        agg,
    )
    .await?;

    let result = json!({
        "plan_id": record.id,
        "options": generation.plans.options.len(),
        "budget_issues": generation.budget_issues,
    });
    let message = if generation.budget_issues > 0 {
        format!(
            "plan generated ({} option(s) over budget)",
            generation.budget_issues
        )
    } else {
        "plan generated".to_owned()
    };

    JobStateMachine::complete(&ctx.pool, job.id, JobStage::Persist, &result, &message).await?;
    Ok(JobOutcome::Completed)
}

/// Itinerary generation: STARTING -> FETCH_CANDIDATES -> GENERATE ->
/// VALIDATE -> PERSIST -> COMPLETE.
async fn run_itinerary_job(ctx: &WorkerContext, job: &Job) -> Result<JobOutcome> {
    let Some(trip) = trips_db::get_trip(&ctx.pool, job.trip_id).await? else {
        return Ok(JobOutcome::Failed(JobFailure::new(
            JobErrorCode::TripNotFound,
        )));
    };
    let snapshot = TripSnapshot::from_trip(&trip);

    let Some(plan_record) = plans_db::latest_for_trip(&ctx.pool, trip.id).await? else {
        return Ok(JobOutcome::Failed(JobFailure::new(
            JobErrorCode::PlanRequired,
        )));
    };
    let plans: PlansJson = serde_json::from_value(plan_record.plans_json.clone())
        .context("stored plan artifact undecodable")?;

    let plan_index = job.plan_index.unwrap_or(0);
    if plan_index < 0 || plan_index as usize >= plans.options.len() {
        return Ok(JobOutcome::Failed(JobFailure::new(
            JobErrorCode::PlanIndexOutOfRange,
        )));
    }

    JobStateMachine::advance(
        &ctx.pool,
        job.id,
        JobStage::Starting,
        JobStage::FetchCandidates,
        "fetching points of interest and weather",
    )
    .await?;

    let mut agg = Aggregator::new(ctx.providers.as_ref(), ctx.cache.as_ref());
    let itinerary_ctx = itinerary_flow::fetch_context(&mut agg, &snapshot).await?;

    JobStateMachine::advance(
        &ctx.pool,
        job.id,
        JobStage::FetchCandidates,
        JobStage::Generate,
        "assembling daily schedule",
    )
    .await?;

    let generation =
        itinerary_flow::assemble_itinerary(&mut agg, &snapshot, plan_index, &itinerary_ctx)
            .await?;

    JobStateMachine::advance(
        &ctx.pool,
        job.id,
        JobStage::Generate,
        JobStage::Validate,
        "validating generated itinerary",
    )
    .await?;

    if generation.itinerary.days.is_empty() {
        return Ok(JobOutcome::Failed(JobFailure::new(
            JobErrorCode::ItineraryOutputInvalid,
        )));
    }

    JobStateMachine::advance(
        &ctx.pool,
        job.id,
        JobStage::Validate,
        JobStage::Persist,
        "persisting itinerary artifact",
    )
    .await?;

    let itinerary_md =
        render::render_itinerary_markdown(&snapshot, &plans, plan_index, &generation.itinerary);
    let itinerary_value =
        serde_json::to_value(&generation.itinerary).context("failed to serialize itinerary")?;
    let record = itineraries_db::insert_itinerary(
        &ctx.pool,
        trip.id,
        plan_index,
        &itinerary_value,
        &itinerary_md,
    )
    .await?;

    record_audit(
        ctx,
        &snapshot,
        "itinerary",
        json!({
            "itinerary_id": record.id,
            "days": generation.itinerary.days.len(),
            "unresolved_issue_count": generation.unresolved_issues,
        }),
        agg,
    )
    .await?;

    let result = json!({
        "itinerary_id": record.id,
        "plan_index": plan_index,
        "days": generation.itinerary.days.len(),
        "unresolved_issue_count": generation.unresolved_issues,
    });
    let message = if generation.unresolved_issues > 0 {
        format!(
            "itinerary generated ({} unresolved schedule issue(s))",
            generation.unresolved_issues
        )
    } else {
        "itinerary generated".to_owned()
    };

    JobStateMachine::complete(&ctx.pool, job.id, JobStage::Persist, &result, &message).await?;
    Ok(JobOutcome::Completed)
}

/// Append the run's audit record: redacted input snapshot, output summary,
/// and the tool-call trace.
async fn record_audit(
    ctx: &WorkerContext,
    snapshot: &TripSnapshot,
    phase: &str,
    output: serde_json::Value,
    agg: Aggregator<'_>,
) -> Result<()> {
    let input =
        serde_json::to_value(snapshot).context("failed to serialize trip snapshot")?;
    let run = NewAgentRun {
        trip_id: snapshot.id,
        phase: phase.to_owned(),
        input: redact_json(&input),
        output,
        tool_calls: agg.into_trace().into_json(),
        model_info: json!({
            "providers": {
                "flights": ctx.config.providers.flights,
                "stays": ctx.config.providers.stays,
                "poi": ctx.config.providers.poi,
                "weather": ctx.config.providers.weather,
                "routing": ctx.config.providers.routing,
            },
        }),
    };
    agent_runs::insert_agent_run(&ctx.pool, &run).await?;
    Ok(())
}
