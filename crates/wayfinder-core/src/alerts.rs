//! Price-alert refresh, driven by the worker's periodic tick.
//!
//! Each due alert gets a deterministic probe price (hash of trip, alert
//! type, and the current hour); prices at or below the alert threshold
//! trigger a notification row.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use wayfinder_db::models::Alert;
use wayfinder_db::queries::alerts as alerts_db;

/// Check all due alerts once. Returns how many were checked.
pub async fn refresh_alerts(pool: &PgPool) -> Result<u32> {
    let now = Utc::now();
    let alerts = alerts_db::list_active(pool).await?;

    let mut checked = 0;
    for alert in &alerts {
        if should_check(alert, now) {
            check_one(pool, alert, now).await?;
            checked += 1;
        }
    }
    Ok(checked)
}

fn should_check(alert: &Alert, now: DateTime<Utc>) -> bool {
    match alert.last_checked_at {
        None => true,
        Some(last) => now >= last + Duration::minutes(i64::from(alert.frequency_minutes)),
    }
}

/// Deterministic probe price: stable within one hour for one alert.
fn probe_price(trip_id: Uuid, alert_type: &str, now: DateTime<Utc>) -> f64 {
    let basis = format!("{trip_id}|{alert_type}|{}", now.format("%Y-%m-%d-%H"));
    let digest = Sha256::digest(basis.as_bytes());
    let prefix = u32::from_be_bytes([0, digest[0], digest[1], digest[2]]);
    f64::from(prefix % 500) + 80.0
}

async fn check_one(pool: &PgPool, alert: &Alert, now: DateTime<Utc>) -> Result<()> {
    let price = probe_price(alert.trip_id, &alert.alert_type, now);
    alerts_db::mark_checked(pool, alert.id, now).await?;

    if price > alert.threshold {
        return Ok(());
    }

    let payload = json!({
        "trip_id": alert.trip_id,
        "alert_type": alert.alert_type,
        "price": price,
        "threshold": alert.threshold,
        "checked_at": now.to_rfc3339(),
    });
    alerts_db::insert_notification(pool, alert.id, "email", &payload, "sent").await?;
    tracing::info!(
        alert_id = %alert.id,
        trip_id = %alert.trip_id,
        price,
        threshold = alert.threshold,
        "price alert triggered"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(frequency_minutes: i32, last_checked_at: Option<DateTime<Utc>>) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            trip_id: Uuid::new_v4(),
            alert_type: "flight_price".to_owned(),
            threshold: 300.0,
            frequency_minutes,
            last_checked_at,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn never_checked_alert_is_due() {
        assert!(should_check(&alert(60, None), Utc::now()));
    }

    #[test]
    fn recently_checked_alert_is_not_due() {
        let now = Utc::now();
        let recent = alert(60, Some(now - Duration::minutes(10)));
        assert!(!should_check(&recent, now));

        let stale = alert(60, Some(now - Duration::minutes(61)));
        assert!(should_check(&stale, now));
    }

    #[test]
    fn probe_price_is_deterministic_within_an_hour() {
        let trip_id = Uuid::new_v4();
        let now = Utc::now();
        let a = probe_price(trip_id, "flight_price", now);
        let b = probe_price(trip_id, "flight_price", now);
        assert_eq!(a, b);
        assert!((80.0..580.0).contains(&a));
    }

    #[test]
    fn probe_price_varies_by_alert_type() {
        let trip_id = Uuid::new_v4();
        let now = Utc::now();
        let flight = probe_price(trip_id, "flight_price", now);
        let stay = probe_price(trip_id, "stay_price", now);
        // Hash-derived, so expect them to differ for different inputs.
        assert_ne!(flight, stay);
    }
}
