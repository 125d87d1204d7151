//! Plan generation: fetch candidates, optimize, verify, self-correct.

use anyhow::Result;
use chrono::Utc;

use super::GenerateError;
use crate::aggregator::Aggregator;
use crate::artifacts::{
    FlightSummary, Money, PlanLabel, PlanMetrics, PlanOption, PlansJson, StaySummary,
};
use crate::optimizer::{Choice, Scorecard, choose_plans, compute_scorecard};
use crate::providers::{FlightQuery, StayQuery, TravelMode};
use crate::types::{FlightCandidate, StayCandidate, TripSnapshot};
use crate::verifier::apply_plan_corrections;

/// Warning attached to options that exceed the trip budget.
pub const OVER_BUDGET_WARNING: &str = "This option runs over the trip budget";
/// Warning attached to options with two or more transfers.
pub const MANY_TRANSFERS_WARNING: &str = "Two or more transfers; allow time for connections";

/// Output of the plan-generation flow.
#[derive(Debug)]
pub struct PlanGeneration {
    pub plans: PlansJson,
    /// Number of over-budget options the verifier flagged (and annotated).
    pub budget_issues: usize,
}

/// Fetch flight and stay candidates for the trip (cached, traced).
pub async fn fetch_candidates(
    agg: &mut Aggregator<'_>,
    trip: &TripSnapshot,
) -> Result<(Vec<FlightCandidate>, Vec<StayCandidate>)> {
    let flights = agg
        .search_flights(&FlightQuery {
            origin: trip.origin.clone(),
            destination: trip.destination.clone(),
            start_date: trip.start_date.to_string(),
            end_date: trip.end_date.to_string(),
            travelers: trip.travelers,
        })
        .await?;

    let stays = agg
        .search_stays(&StayQuery {
            destination: trip.destination.clone(),
            start_date: trip.start_date.to_string(),
            end_date: trip.end_date.to_string(),
            travelers: trip.travelers,
            budget_total: trip.budget_total,
        })
        .await?;

    Ok((flights, stays))
}

/// Optimize the candidate sets into three labeled options, run the budget
/// check, and apply the single-pass correction.
pub async fn assemble_plans(
    agg: &mut Aggregator<'_>,
    trip: &TripSnapshot,
    flights: &[FlightCandidate],
    stays: &[StayCandidate],
) -> Result<PlanGeneration, GenerateError> {
    // Commute estimate between the first two stay areas stands in for the
    // daily commute of the whole trip.
    let daily_commute_minutes = match (stays.first(), stays.get(1)) {
        (Some(a), Some(b)) => {
            agg.estimate_route(a.location, b.location, TravelMode::Transit)
                .await
                .map_err(GenerateError::Other)?
                .minutes
        }
        (Some(only), None) => {
            agg.estimate_route(only.location, only.location, TravelMode::Transit)
                .await
                .map_err(GenerateError::Other)?
                .minutes
        }
        _ => 0,
    };

    let chosen = choose_plans(flights, stays, trip.budget_total, daily_commute_minutes)?;

    let mut options = Vec::with_capacity(3);
    for label in PlanLabel::ALL {
        let choice = match label {
            PlanLabel::Cheap => &chosen.cheap,
            PlanLabel::Fast => &chosen.fast,
            PlanLabel::Balanced => &chosen.balanced,
        };
        options.push(build_option(label, choice, trip.budget_total));
    }

    let mut plans = PlansJson {
        generated_at: Utc::now(),
        options,
    };
    let budget_issues = apply_plan_corrections(trip.budget_total, &mut plans);

    Ok(PlanGeneration {
        plans,
        budget_issues,
    })
}

fn build_option(label: PlanLabel, choice: &Choice, budget_total: f64) -> PlanOption {
    let total_cost = choice.flight.price_amount + choice.stay.total_price_amount;
    let currency = choice.stay.currency.clone();

    let scorecard = compute_scorecard(
        total_cost,
        &currency,
        budget_total,
        choice.flight.duration_minutes,
        choice.flight.stops,
        choice.daily_commute_minutes,
    );

    let mut warnings = Vec::new();
    if total_cost > budget_total {
        warnings.push(OVER_BUDGET_WARNING.to_owned());
    }
    if choice.flight.stops >= 2 {
        warnings.push(MANY_TRANSFERS_WARNING.to_owned());
    }

    PlanOption {
        label,
        title: label.title().to_owned(),
        flight: FlightSummary {
            depart_at: choice.flight.depart_at.clone(),
            arrive_at: choice.flight.arrive_at.clone(),
            stops: choice.flight.stops,
            duration_minutes: choice.flight.duration_minutes,
            price: Money {
                amount: choice.flight.price_amount,
                currency: choice.flight.currency.clone(),
            },
        },
        stay: StaySummary {
            name: choice.stay.name.clone(),
            area: choice.stay.area.clone(),
            nightly_price: Money {
                amount: choice.stay.nightly_price_amount,
                currency: currency.clone(),
            },
            total_price: Money {
                amount: choice.stay.total_price_amount,
                currency: currency.clone(),
            },
        },
        metrics: PlanMetrics {
            total_price: Money {
                amount: total_cost,
                currency,
            },
            total_flight_minutes: choice.flight.duration_minutes,
            transfer_count: choice.flight.stops,
            daily_commute_minutes_estimate: choice.daily_commute_minutes,
        },
        explanation: explain(label, &scorecard, &warnings),
        scorecard,
        warnings,
    }
}

fn explain(label: PlanLabel, scorecard: &Scorecard, warnings: &[String]) -> String {
    let lean = match label {
        PlanLabel::Cheap => "Leans toward saving money",
        PlanLabel::Fast => "Leans toward saving time",
        PlanLabel::Balanced => "Balances cost, time, and comfort",
    };
    let core = format!(
        "{lean}. Scores: cost {:.0}/100, time {:.0}/100, comfort {:.0}/100.",
        scorecard.cost_score, scorecard.time_score, scorecard.comfort_score
    );
    if warnings.is_empty() {
        core
    } else {
        format!("{core} Risks: {}.", warnings.join("; "))
    }
}
