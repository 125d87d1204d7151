//! `wayfinder trip` commands: create, confirm constraints, show.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use wayfinder_core::intake::derive_constraints;
use wayfinder_core::sanitize::sanitize_text;
use wayfinder_core::types::TripSnapshot;
use wayfinder_db::queries::trips::{self as trips_db, NewTrip};
use wayfinder_db::queries::{jobs as jobs_db, plans as plans_db};

use crate::TripCommands;

pub async fn run_trip_command(command: TripCommands, pool: &PgPool) -> Result<()> {
    match command {
        TripCommands::Create {
            user,
            origin,
            destination,
            start_date,
            end_date,
            budget,
            currency,
            travelers,
            tags,
        } => {
            cmd_create(
                pool, &user, &origin, &destination, &start_date, &end_date, budget, &currency,
                travelers, tags.as_deref(),
            )
            .await
        }
        TripCommands::Confirm { trip_id } => cmd_confirm(pool, &trip_id).await,
        TripCommands::Show { trip_id, user } => cmd_show(pool, &trip_id, &user).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn cmd_create(
    pool: &PgPool,
    user: &str,
    origin: &str,
    destination: &str,
    start_date: &str,
    end_date: &str,
    budget: f64,
    currency: &str,
    travelers: i32,
    tags: Option<&str>,
) -> Result<()> {
    let start: NaiveDate = start_date
        .parse()
        .with_context(|| format!("invalid start date: {start_date}"))?;
    let end: NaiveDate = end_date
        .parse()
        .with_context(|| format!("invalid end date: {end_date}"))?;
    if end < start {
        anyhow::bail!("end date must not be before start date");
    }

    let preferences = match tags {
        Some(tags) => json!({"tags": sanitize_text(tags)}),
        None => json!({}),
    };

    let trip = trips_db::insert_trip(
        pool,
        &NewTrip {
            user_id: sanitize_text(user),
            origin: sanitize_text(origin),
            destination: sanitize_text(destination),
            start_date: start,
            end_date: end,
            flexible_days: 0,
            budget_total: budget,
            currency: sanitize_text(currency),
            travelers,
            preferences,
        },
    )
    .await?;

    // Derive constraints right away; the user confirms them separately.
    let snapshot = TripSnapshot::from_trip(&trip);
    let constraints = derive_constraints(&snapshot);
    let constraints_value =
        serde_json::to_value(&constraints).context("failed to serialize constraints")?;
    trips_db::set_constraints(pool, trip.id, &constraints_value).await?;

    println!("Trip created: {}", trip.id);
    println!("  {} -> {} ({} to {})", trip.origin, trip.destination, start, end);
    println!("  Budget: {budget:.0} {}, travelers: {travelers}", trip.currency);
    println!("  Derived constraints: pace {}, walking {:.0} km/day",
        constraints.pace, constraints.walking_tolerance_km_per_day);
    println!();
    println!("Next: review and confirm with `wayfinder trip confirm {}`.", trip.id);
    Ok(())
}

async fn cmd_confirm(pool: &PgPool, trip_id: &str) -> Result<()> {
    let id = Uuid::parse_str(trip_id).with_context(|| format!("invalid trip ID: {trip_id}"))?;
    let rows = trips_db::confirm_constraints(pool, id).await?;
    if rows == 0 {
        anyhow::bail!("trip {trip_id} not found or has no derived constraints");
    }
    println!("Constraints confirmed for trip {trip_id}.");
    Ok(())
}

async fn cmd_show(pool: &PgPool, trip_id: &str, user: &str) -> Result<()> {
    let id = Uuid::parse_str(trip_id).with_context(|| format!("invalid trip ID: {trip_id}"))?;
    let trip = trips_db::get_trip_for_user(pool, id, &sanitize_text(user))
        .await?
        .with_context(|| format!("trip {trip_id} not found"))?;

    println!("Trip {}", trip.id);
    println!("  Route: {} -> {}", trip.origin, trip.destination);
    println!("  Dates: {} to {}", trip.start_date, trip.end_date);
    println!("  Budget: {:.0} {}", trip.budget_total, trip.currency);
    println!(
        "  Constraints confirmed: {}",
        trip.constraints_confirmed_at.is_some()
    );

    match plans_db::latest_for_trip(pool, trip.id).await? {
        Some(plan) => println!("  Latest plan: {} ({})", plan.id, plan.created_at),
        None => println!("  Latest plan: none"),
    }

    let jobs = jobs_db::list_jobs_for_trip(pool, trip.id).await?;
    if jobs.is_empty() {
        println!("  Jobs: none");
    } else {
        println!("  Jobs:");
        for job in jobs.iter().take(5) {
            println!(
                "    {} {} {} {}% {}",
                job.id, job.job_type, job.status, job.progress, job.stage
            );
        }
    }
    Ok(())
}
