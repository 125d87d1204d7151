mod alert_cmds;
mod config;
mod job_cmds;
mod trip_cmds;
mod worker_cmd;

use clap::{Parser, Subcommand};

use wayfinder_db::pool;

use config::WayfinderConfig;

#[derive(Parser)]
#[command(name = "wayfinder", about = "Asynchronous trip-planning job service")]
struct Cli {
    /// Database URL (overrides WAYFINDER_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a wayfinder config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/wayfinder")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the wayfinder database (create + migrate)
    DbInit,
    /// Trip management
    Trip {
        #[command(subcommand)]
        command: TripCommands,
    },
    /// Submit a generation job
    Submit {
        #[command(subcommand)]
        command: SubmitCommands,
    },
    /// Show job status and progress
    Status {
        /// Job ID to show
        job_id: String,
    },
    /// Price alert management
    Alert {
        #[command(subcommand)]
        command: AlertCommands,
    },
    /// Run the job worker until interrupted
    Worker {
        /// Idle queue-poll interval in milliseconds
        #[arg(long, default_value_t = 500)]
        poll_ms: u64,
        /// Alert-refresh tick interval in seconds
        #[arg(long, default_value_t = 60)]
        tick_secs: u64,
    },
}

#[derive(Subcommand)]
pub enum TripCommands {
    /// Create a trip and derive its constraints
    Create {
        /// Owning user ID
        #[arg(long)]
        user: String,
        #[arg(long)]
        origin: String,
        #[arg(long)]
        destination: String,
        /// ISO date, e.g. 2030-01-01
        #[arg(long)]
        start_date: String,
        /// ISO date, e.g. 2030-01-05
        #[arg(long)]
        end_date: String,
        /// Total budget
        #[arg(long)]
        budget: f64,
        #[arg(long, default_value = "USD")]
        currency: String,
        #[arg(long, default_value_t = 1)]
        travelers: i32,
        /// Comma-separated preference tags (e.g. "relaxed,food")
        #[arg(long)]
        tags: Option<String>,
    },
    /// Confirm a trip's derived constraints (required before plan jobs)
    Confirm {
        /// Trip ID to confirm
        trip_id: String,
    },
    /// Show a trip with its latest plan and jobs
    Show {
        /// Trip ID to show
        trip_id: String,
        /// Owning user ID
        #[arg(long)]
        user: String,
    },
}

#[derive(Subcommand)]
pub enum AlertCommands {
    /// Register a price alert for a trip
    Create {
        /// Trip ID to watch
        trip_id: String,
        /// Owning user ID
        #[arg(long)]
        user: String,
        /// Alert type (e.g. flight_price, stay_price)
        #[arg(long, default_value = "flight_price")]
        alert_type: String,
        /// Trigger when the probed price is at or below this value
        #[arg(long)]
        threshold: f64,
        /// Minimum minutes between checks
        #[arg(long, default_value_t = 60)]
        frequency_minutes: i32,
    },
}

#[derive(Subcommand)]
pub enum SubmitCommands {
    /// Generate three ranked travel packages
    Plan {
        /// Trip ID to plan
        trip_id: String,
        /// Owning user ID
        #[arg(long)]
        user: String,
    },
    /// Generate a day-by-day itinerary for a chosen package
    Itinerary {
        /// Trip ID to build an itinerary for
        trip_id: String,
        /// Owning user ID
        #[arg(long)]
        user: String,
        /// Which plan option to use (0..=2)
        #[arg(long, default_value_t = 0)]
        plan_index: i32,
    },
}

/// Execute the `wayfinder init` command: write the config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
    };
    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!();
    println!("Next: run `wayfinder db-init` to create and migrate the database.");
    Ok(())
}

/// Execute the `wayfinder db-init` command: create database and migrate.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = WayfinderConfig::resolve(cli_db_url)?;

    println!("Initializing wayfinder database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;
    println!("wayfinder db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Trip { command } => {
            let resolved = WayfinderConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = trip_cmds::run_trip_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Submit { command } => {
            let resolved = WayfinderConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result =
                job_cmds::run_submit_command(command, &db_pool, &resolved.core_config).await;
            db_pool.close().await;
            result?;
        }
        Commands::Status { job_id } => {
            let resolved = WayfinderConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = job_cmds::run_status(&db_pool, &job_id).await;
            db_pool.close().await;
            result?;
        }
        Commands::Alert { command } => {
            let resolved = WayfinderConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = alert_cmds::run_alert_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
        Commands::Worker { poll_ms, tick_secs } => {
            let resolved = WayfinderConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result =
                worker_cmd::run_worker_cmd(&db_pool, &resolved.core_config, poll_ms, tick_secs)
                    .await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
