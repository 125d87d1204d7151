//! `wayfinder alert` commands: register price alerts.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use wayfinder_core::sanitize::sanitize_text;
use wayfinder_db::queries::{alerts as alerts_db, trips as trips_db};

use crate::AlertCommands;

pub async fn run_alert_command(command: AlertCommands, pool: &PgPool) -> Result<()> {
    match command {
        AlertCommands::Create {
            trip_id,
            user,
            alert_type,
            threshold,
            frequency_minutes,
        } => {
            let id = Uuid::parse_str(&trip_id)
                .with_context(|| format!("invalid trip ID: {trip_id}"))?;
            let trip = trips_db::get_trip_for_user(pool, id, &sanitize_text(&user))
                .await?
                .with_context(|| format!("trip {trip_id} not found"))?;

            let alert = alerts_db::insert_alert(
                pool,
                trip.id,
                &sanitize_text(&alert_type),
                threshold,
                frequency_minutes,
            )
            .await?;

            println!("Alert created: {}", alert.id);
            println!(
                "  {} alerts for trip {} when price <= {threshold:.0}, checked every {frequency_minutes} min",
                alert.alert_type, trip.id
            );
            Ok(())
        }
    }
}
