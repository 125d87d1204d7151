//! Value types shared across the generation pipeline.
//!
//! Candidate records are produced fresh per request or read back from the
//! cache; they are never mutated after construction, so everything here is
//! plain data with serde derives (candidates round-trip through the cache
//! as JSON).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wayfinder_db::models::Trip;

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// One flight offer from a flights provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightCandidate {
    pub id: String,
    pub depart_at: String,
    pub arrive_at: String,
    pub stops: i32,
    pub duration_minutes: i32,
    pub price_amount: f64,
    pub currency: String,
}

/// One lodging offer from a stays provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StayCandidate {
    pub id: String,
    pub name: String,
    pub area: String,
    pub location: GeoPoint,
    pub nightly_price_amount: f64,
    pub total_price_amount: f64,
    pub currency: String,
}

/// One point of interest from a POI provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiCandidate {
    pub id: String,
    pub name: String,
    pub location: GeoPoint,
}

/// Forecast summary for one calendar day (ISO date string).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherDay {
    pub date: String,
    pub summary: String,
}

/// A commute estimate between two points.
///
/// `mode` is the requested travel mode, or `"estimate"` when the provider
/// fell back to a computed distance estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEstimate {
    pub mode: String,
    pub minutes: i32,
}

/// Immutable snapshot of a trip, constructed once per job and passed by
/// value through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripSnapshot {
    pub id: Uuid,
    pub user_id: String,
    pub origin: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget_total: f64,
    pub currency: String,
    pub travelers: i32,
    pub preferences: serde_json::Value,
    pub constraints_confirmed: bool,
}

impl TripSnapshot {
    /// Build a snapshot from a trip row.
    pub fn from_trip(trip: &Trip) -> Self {
        Self {
            id: trip.id,
            user_id: trip.user_id.clone(),
            origin: trip.origin.clone(),
            destination: trip.destination.clone(),
            start_date: trip.start_date,
            end_date: trip.end_date,
            budget_total: trip.budget_total,
            currency: trip.currency.clone(),
            travelers: trip.travelers,
            preferences: trip.preferences.clone(),
            constraints_confirmed: trip.constraints_confirmed_at.is_some(),
        }
    }

    /// Caller-supplied center override from `preferences.location`, if any.
    pub fn preferred_center(&self) -> Option<GeoPoint> {
        let loc = self.preferences.get("location")?;
        let lat = loc.get("lat")?.as_f64()?;
        let lon = loc.get("lon")?.as_f64()?;
        Some(GeoPoint { lat, lon })
    }
}
