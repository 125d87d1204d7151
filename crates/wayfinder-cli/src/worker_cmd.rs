//! `wayfinder worker` command: run the job worker until interrupted.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use wayfinder_core::cache::PgCacheStore;
use wayfinder_core::config::CoreConfig;
use wayfinder_core::job::runner::WorkerContext;
use wayfinder_core::providers::resolve_providers;
use wayfinder_core::worker::{WorkerConfig, run_worker};

pub async fn run_worker_cmd(
    pool: &PgPool,
    core_config: &CoreConfig,
    poll_ms: u64,
    tick_secs: u64,
) -> Result<()> {
    // Capability resolution happens here, once; a misconfigured provider is
    // a startup error, not a failure on the first job.
    let providers = resolve_providers(core_config)?;
    println!("Worker starting with providers: {providers:?}");

    let ctx = WorkerContext {
        pool: pool.clone(),
        providers: Arc::new(providers),
        cache: Arc::new(PgCacheStore::new(pool.clone())),
        config: core_config.clone(),
    };
    let worker_config = WorkerConfig {
        poll_interval: Duration::from_millis(poll_ms),
        tick_interval: Duration::from_secs(tick_secs),
    };

    // Graceful shutdown: first signal cancels, second force-exits.
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    let got_first_signal = Arc::new(AtomicBool::new(false));
    let got_first_clone = Arc::clone(&got_first_signal);

    tokio::spawn(async move {
        loop {
            tokio::signal::ctrl_c().await.ok();
            if got_first_clone.swap(true, Ordering::SeqCst) {
                eprintln!("\nForce exit.");
                std::process::exit(130);
            }
            eprintln!("\nShutting down after the current job (Ctrl+C again to force)...");
            cancel_clone.cancel();
        }
    });

    run_worker(&ctx, &worker_config, cancel).await?;
    println!("Worker stopped.");
    Ok(())
}
