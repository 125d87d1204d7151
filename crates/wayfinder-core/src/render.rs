//! Markdown rendering of generated artifacts.
//!
//! Every persisted plan/itinerary carries a human-readable Markdown
//! explanation next to the JSON payload.

use crate::artifacts::{ItineraryJson, PlansJson};
use crate::types::TripSnapshot;

/// Render the plan set as Markdown.
pub fn render_plans_markdown(trip: &TripSnapshot, plans: &PlansJson) -> String {
    let mut out = String::new();
    out.push_str("# Travel packages\n\n");
    out.push_str(&format!("- {} → {}\n", trip.origin, trip.destination));
    out.push_str(&format!("- Dates: {} – {}\n", trip.start_date, trip.end_date));
    out.push_str(&format!(
        "- Budget: {:.0} {}, travelers: {}\n",
        trip.budget_total, trip.currency, trip.travelers
    ));
    out.push_str("\n## Options\n\n");

    for option in &plans.options {
        out.push_str(&format!("### {}\n", option.title));
        out.push_str(&format!(
            "- Total: {:.0} {}\n",
            option.metrics.total_price.amount, option.metrics.total_price.currency
        ));
        out.push_str(&format!(
            "- Flight: {} → {}, {} transfer(s), {} minutes\n",
            option.flight.depart_at,
            option.flight.arrive_at,
            option.flight.stops,
            option.flight.duration_minutes
        ));
        out.push_str(&format!(
            "- Stay: {} ({}), {:.0} {}/night\n",
            option.stay.name,
            option.stay.area,
            option.stay.nightly_price.amount,
            option.stay.nightly_price.currency
        ));
        out.push_str(&format!("- {}\n", option.explanation));
        if !option.warnings.is_empty() {
            out.push_str(&format!("- Warnings: {}\n", option.warnings.join("; ")));
        }
        out.push('\n');
    }
    out
}

/// Render an itinerary as Markdown.
pub fn render_itinerary_markdown(
    trip: &TripSnapshot,
    plans: &PlansJson,
    plan_index: i32,
    itinerary: &ItineraryJson,
) -> String {
    let mut out = String::new();
    out.push_str("# Day-by-day itinerary\n\n");
    out.push_str(&format!("- Destination: {}\n", trip.destination));

    if let Some(option) = plans.options.get(plan_index as usize) {
        out.push_str(&format!("- Package: {}\n", option.title));
        out.push_str(&format!(
            "- Total: {:.0} {}\n",
            option.metrics.total_price.amount, option.metrics.total_price.currency
        ));
    }
    if itinerary.unresolved_issue_count > 0 {
        out.push_str(&format!(
            "- Heads-up: {} schedule issue(s) could not be resolved automatically\n",
            itinerary.unresolved_issue_count
        ));
    }
    out.push('\n');

    for day in &itinerary.days {
        out.push_str(&format!("## {}\n", day.date));
        for item in &day.items {
            out.push_str(&format!(
                "- {}: {} (stay {} min, commute {} min, weather: {})\n",
                item.period,
                item.poi_name,
                item.stay_minutes,
                item.commute.minutes,
                item.weather_summary
            ));
        }
        out.push('\n');
    }
    out
}
