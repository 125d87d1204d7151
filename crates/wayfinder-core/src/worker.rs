//! Worker loop: claim queued jobs and execute them end-to-end.
//!
//! Each job is processed by exactly one worker invocation (the claim is an
//! atomic `queued -> STARTING` transition); there is no mid-job handoff and
//! no cancellation of a claimed job. A periodic tick refreshes price alerts
//! and purges expired shared-store rows.

use std::time::{Duration, Instant};

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use wayfinder_db::queries::{jobs as jobs_db, stores};

use crate::alerts;
use crate::job::runner::{WorkerContext, execute_job};

/// Worker loop pacing.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Idle sleep between queue polls.
    pub poll_interval: Duration,
    /// Cadence of the alert-refresh / housekeeping tick.
    pub tick_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            tick_interval: Duration::from_secs(60),
        }
    }
}

/// Run the worker until cancelled.
///
/// Claims the oldest queued job, executes it, and repeats; sleeps briefly
/// when the queue is empty. Job execution itself never aborts the loop --
/// failures are recorded on the job row.
pub async fn run_worker(
    ctx: &WorkerContext,
    config: &WorkerConfig,
    cancel: CancellationToken,
) -> Result<()> {
    tracing::info!(providers = ?ctx.providers, "worker started");
    let mut last_tick: Option<Instant> = None;

    loop {
        if cancel.is_cancelled() {
            tracing::info!("worker stopping");
            return Ok(());
        }

        if last_tick.is_none_or(|t| t.elapsed() >= config.tick_interval) {
            last_tick = Some(Instant::now());
            if let Err(e) = alerts::refresh_alerts(&ctx.pool).await {
                tracing::warn!(error = %format!("{e:#}"), "alert refresh failed");
            }
            match stores::purge_expired(&ctx.pool).await {
                Ok(purged) if purged > 0 => {
                    tracing::debug!(purged, "purged expired store rows");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "store purge failed");
                }
            }
        }

        match jobs_db::claim_next_queued(&ctx.pool).await {
            Ok(Some(job)) => {
                execute_job(ctx, &job).await?;
            }
            Ok(None) => {
                tokio::select! {
                    _ = tokio::time::sleep(config.poll_interval) => {}
                    _ = cancel.cancelled() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "queue poll failed");
                tokio::select! {
                    _ = tokio::time::sleep(config.poll_interval) => {}
                    _ = cancel.cancelled() => {}
                }
            }
        }
    }
}
