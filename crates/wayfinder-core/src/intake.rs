//! Constraint intake: derive trip constraints from user preferences.
//!
//! Constraints are derived deterministically from preference tags and must
//! be confirmed on the trip before a plan job may run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::TripSnapshot;
use crate::verifier::{MAX_DAILY_ACTIVITY_MINUTES, MAX_DAILY_COMMUTE_MINUTES};

/// Desired travel pace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    Relaxed,
    Balanced,
    Packed,
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Relaxed => "relaxed",
            Self::Balanced => "balanced",
            Self::Packed => "packed",
        };
        f.write_str(s)
    }
}

/// Derived trip constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub pace: Pace,
    pub walking_tolerance_km_per_day: f64,
    pub max_daily_activity_hours: f64,
    pub max_daily_commute_hours: f64,
    pub max_transfer_count: i32,
    pub hotel_star_min: Option<i32>,
    pub night_flight_allowed: bool,
}

/// Derive constraints from the trip's preference tags.
///
/// Tags may be a JSON array or a comma-separated string; "relaxed" and
/// "packed" adjust the pace, and "packed" wins when both appear.
pub fn derive_constraints(trip: &TripSnapshot) -> Constraints {
    let tags = preference_tags(&trip.preferences);

    let mut pace = Pace::Balanced;
    if tags.iter().any(|t| t == "relaxed") {
        pace = Pace::Relaxed;
    }
    if tags.iter().any(|t| t == "packed") {
        pace = Pace::Packed;
    }

    let walking = match pace {
        Pace::Relaxed => 3.0,
        Pace::Balanced => 6.0,
        Pace::Packed => 10.0,
    };

    Constraints {
        pace,
        walking_tolerance_km_per_day: walking,
        max_daily_activity_hours: f64::from(MAX_DAILY_ACTIVITY_MINUTES) / 60.0,
        max_daily_commute_hours: f64::from(MAX_DAILY_COMMUTE_MINUTES) / 60.0,
        max_transfer_count: 2,
        hotel_star_min: None,
        night_flight_allowed: false,
    }
}

fn preference_tags(preferences: &serde_json::Value) -> Vec<String> {
    match preferences.get("tags") {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(serde_json::Value::String(s)) => s
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}
