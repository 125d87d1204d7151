//! Itinerary building: assign points of interest to day/period slots with
//! sequential commute estimates.

use std::collections::HashMap;

use anyhow::Result;
use chrono::Utc;

use crate::aggregator::Aggregator;
use crate::artifacts::{Commute, ItineraryDay, ItineraryItem, ItineraryJson, Period};
use crate::providers::{PoiQuery, TravelMode};
use crate::types::{GeoPoint, PoiCandidate, TripSnapshot};
use crate::verifier::{apply_itinerary_corrections, trip_days};

/// Seed location for commute chains when the trip has no location
/// preference.
pub const DEFAULT_CENTER: GeoPoint = GeoPoint {
    lat: 48.8566,
    lon: 2.3522,
};

/// Placeholder used when the POI list is empty.
pub const FREE_EXPLORATION: &str = "Free exploration";

/// How many points of interest to request per trip.
const POI_LIMIT: usize = 50;

/// Pre-fetched context for itinerary assembly.
#[derive(Debug)]
pub struct ItineraryContext {
    pub center: GeoPoint,
    pub pois: Vec<PoiCandidate>,
    pub weather_by_date: HashMap<String, String>,
}

/// Output of the itinerary-generation flow.
#[derive(Debug)]
pub struct ItineraryGeneration {
    pub itinerary: ItineraryJson,
    /// Verifier issues that survived the bounded correction pass.
    pub unresolved_issues: usize,
}

/// Fetch points of interest and the weather forecast (cached/traced).
pub async fn fetch_context(
    agg: &mut Aggregator<'_>,
    trip: &TripSnapshot,
) -> Result<ItineraryContext> {
    let center = trip.preferred_center().unwrap_or(DEFAULT_CENTER);

    let pois = agg
        .search_pois(&PoiQuery {
            destination: trip.destination.clone(),
            center,
            limit: POI_LIMIT,
        })
        .await?;

    let forecast = agg
        .forecast(
            center,
            &trip.start_date.to_string(),
            &trip.end_date.to_string(),
        )
        .await?;
    let weather_by_date = forecast
        .into_iter()
        .map(|day| (day.date, day.summary))
        .collect();

    Ok(ItineraryContext {
        center,
        pois,
        weather_by_date,
    })
}

/// Assign POIs to day/period slots in round-robin order.
///
/// Each slot's commute is estimated from the previous slot's location, so
/// estimates are sequentially dependent on assignment order.
pub async fn assemble_itinerary(
    agg: &mut Aggregator<'_>,
    trip: &TripSnapshot,
    plan_index: i32,
    ctx: &ItineraryContext,
) -> Result<ItineraryGeneration> {
    let dates = trip_days(trip.start_date, trip.end_date);

    let mut days = Vec::with_capacity(dates.len());
    let mut poi_index = 0usize;
    let mut last_point = ctx.center;

    for date in dates {
        let weather_summary = ctx
            .weather_by_date
            .get(&date.to_string())
            .cloned()
            .unwrap_or_else(|| "Forecast unavailable".to_owned());

        let mut items = Vec::with_capacity(Period::ALL.len());
        for period in Period::ALL {
            let poi = if ctx.pois.is_empty() {
                PoiCandidate {
                    id: "poi".to_owned(),
                    name: FREE_EXPLORATION.to_owned(),
                    location: ctx.center,
                }
            } else {
                ctx.pois[poi_index % ctx.pois.len()].clone()
            };

            let estimate = agg
                .estimate_route(last_point, poi.location, TravelMode::Transit)
                .await?;
            let mode = if estimate.mode == "estimate" {
                "estimate"
            } else {
                "transit"
            };

            items.push(ItineraryItem {
                period,
                poi_name: poi.name,
                stay_minutes: period.stay_minutes(),
                commute: Commute {
                    mode: mode.to_owned(),
                    minutes: estimate.minutes,
                },
                weather_summary: weather_summary.clone(),
            });

            last_point = poi.location;
            poi_index += 1;
        }
        days.push(ItineraryDay { date, items });
    }

    let mut itinerary = ItineraryJson {
        generated_at: Utc::now(),
        plan_index,
        days,
        unresolved_issue_count: 0,
    };
    let unresolved_issues = apply_itinerary_corrections(&mut itinerary);

    Ok(ItineraryGeneration {
        itinerary,
        unresolved_issues,
    })
}
