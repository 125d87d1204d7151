//! Generated artifact types: plan sets and itineraries.
//!
//! Both artifacts are produced once per job, persisted as JSON, and never
//! mutated afterwards (the verifier's correction pass runs before the
//! artifact is sealed).

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::optimizer::Scorecard;

/// Label of a plan variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanLabel {
    Cheap,
    Fast,
    Balanced,
}

impl PlanLabel {
    /// The three labels in presentation order.
    pub const ALL: [PlanLabel; 3] = [PlanLabel::Cheap, PlanLabel::Fast, PlanLabel::Balanced];

    /// User-facing title for this variant.
    pub fn title(self) -> &'static str {
        match self {
            Self::Cheap => "Budget saver",
            Self::Fast => "Time saver",
            Self::Balanced => "Balanced pick",
        }
    }
}

impl fmt::Display for PlanLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cheap => "cheap",
            Self::Fast => "fast",
            Self::Balanced => "balanced",
        };
        f.write_str(s)
    }
}

/// An amount in a currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSummary {
    pub depart_at: String,
    pub arrive_at: String,
    pub stops: i32,
    pub duration_minutes: i32,
    pub price: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaySummary {
    pub name: String,
    pub area: String,
    pub nightly_price: Money,
    pub total_price: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMetrics {
    pub total_price: Money,
    pub total_flight_minutes: i32,
    pub transfer_count: i32,
    pub daily_commute_minutes_estimate: i32,
}

/// One of the three plan variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOption {
    pub label: PlanLabel,
    pub title: String,
    pub flight: FlightSummary,
    pub stay: StaySummary,
    pub metrics: PlanMetrics,
    pub scorecard: Scorecard,
    pub explanation: String,
    pub warnings: Vec<String>,
}

/// The full plan artifact: exactly three labeled options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlansJson {
    pub generated_at: DateTime<Utc>,
    pub options: Vec<PlanOption>,
}

/// Slot within an itinerary day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Morning,
    Afternoon,
    Evening,
}

impl Period {
    /// The three periods in day order.
    pub const ALL: [Period; 3] = [Period::Morning, Period::Afternoon, Period::Evening];

    /// Fixed stay duration for this slot.
    pub fn stay_minutes(self) -> i32 {
        match self {
            Self::Morning | Self::Afternoon => 90,
            Self::Evening => 120,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        };
        f.write_str(s)
    }
}

/// A commute leg attached to an itinerary item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commute {
    pub mode: String,
    pub minutes: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryItem {
    pub period: Period,
    pub poi_name: String,
    pub stay_minutes: i32,
    pub commute: Commute,
    pub weather_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryDay {
    pub date: NaiveDate,
    pub items: Vec<ItineraryItem>,
}

/// The full itinerary artifact.
///
/// `unresolved_issue_count` reports how many verifier issues survived the
/// bounded self-correction pass; it is surfaced rather than discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryJson {
    pub generated_at: DateTime<Utc>,
    pub plan_index: i32,
    pub days: Vec<ItineraryDay>,
    #[serde(default)]
    pub unresolved_issue_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_label_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PlanLabel::Balanced).unwrap(),
            "\"balanced\""
        );
        assert_eq!(PlanLabel::Cheap.to_string(), "cheap");
    }

    #[test]
    fn period_stay_minutes() {
        assert_eq!(Period::Morning.stay_minutes(), 90);
        assert_eq!(Period::Afternoon.stay_minutes(), 90);
        assert_eq!(Period::Evening.stay_minutes(), 120);
    }

    #[test]
    fn itinerary_json_roundtrip() {
        let itinerary = ItineraryJson {
            generated_at: Utc::now(),
            plan_index: 1,
            days: vec![ItineraryDay {
                date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
                items: vec![ItineraryItem {
                    period: Period::Morning,
                    poi_name: "City Museum".to_owned(),
                    stay_minutes: 90,
                    commute: Commute {
                        mode: "transit".to_owned(),
                        minutes: 15,
                    },
                    weather_summary: "Clear".to_owned(),
                }],
            }],
            unresolved_issue_count: 0,
        };
        let encoded = serde_json::to_value(&itinerary).unwrap();
        let decoded: ItineraryJson = serde_json::from_value(encoded).unwrap();
        assert_eq!(itinerary, decoded);
    }
}
