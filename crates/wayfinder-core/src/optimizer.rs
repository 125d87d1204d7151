//! Package optimizer: scores every flight x stay combination and selects
//! the cheap, fast, and balanced variants.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{FlightCandidate, StayCandidate};

/// Candidate lists are truncated to this many entries before the cross
/// product, bounding the search at 400 combinations.
pub const MAX_CANDIDATES: usize = 20;

/// A selected flight + stay pairing.
#[derive(Debug, Clone)]
pub struct Choice {
    pub flight: FlightCandidate,
    pub stay: StayCandidate,
    pub daily_commute_minutes: i32,
}

/// The three selected package variants.
#[derive(Debug, Clone)]
pub struct ChosenPlans {
    pub cheap: Choice,
    pub fast: Choice,
    pub balanced: Choice,
}

/// Optimizer failure: fatal, non-retryable input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptimizerError {
    #[error("no flight or stay candidates to optimize over")]
    MissingCandidates,
}

/// Budget-relative cost score on a 0-100 scale.
///
/// Within budget the score falls linearly from 100 to 40 as the ratio
/// approaches 1; over budget it falls from 40 to 0. A non-positive budget
/// yields a neutral 50.
pub fn score_cost(total_cost: f64, budget: f64) -> f64 {
    if budget <= 0.0 {
        return 50.0;
    }
    let ratio = total_cost / budget;
    if ratio <= 1.0 {
        (100.0 - ratio * 60.0).max(0.0)
    } else {
        (40.0 - (ratio - 1.0) * 60.0).max(0.0)
    }
}

/// Flight-time score on a 0-100 scale.
pub fn score_time(minutes: i32) -> f64 {
    (100.0 - f64::from(minutes) / 12.0).max(0.0)
}

/// Comfort score penalising transfers and daily commute.
pub fn score_comfort(stops: i32, commute_minutes: i32) -> f64 {
    (100.0 - f64::from(stops) * 18.0 - f64::from(commute_minutes) * 0.6).max(0.0)
}

/// Select the cheap, fast, and balanced combinations.
///
/// Ties are broken by first-seen order in the cross product (flights outer,
/// stays inner). Returns [`OptimizerError::MissingCandidates`] when either
/// list is empty.
pub fn choose_plans(
    flights: &[FlightCandidate],
    stays: &[StayCandidate],
    budget_total: f64,
    daily_commute_minutes: i32,
) -> Result<ChosenPlans, OptimizerError> {
    let flights = &flights[..flights.len().min(MAX_CANDIDATES)];
    let stays = &stays[..stays.len().min(MAX_CANDIDATES)];
    if flights.is_empty() || stays.is_empty() {
        return Err(OptimizerError::MissingCandidates);
    }

    struct Combo {
        cost: f64,
        time: f64,
        comfort: f64,
        flight: usize,
        stay: usize,
    }

    let mut combos = Vec::with_capacity(flights.len() * stays.len());
    for (fi, flight) in flights.iter().enumerate() {
        for (si, stay) in stays.iter().enumerate() {
            combos.push(Combo {
                cost: flight.price_amount + stay.total_price_amount,
                time: f64::from(flight.duration_minutes),
                comfort: score_comfort(flight.stops, daily_commute_minutes),
                flight: fi,
                stay: si,
            });
        }
    }

    // Strict < keeps the earliest combination on ties.
    let mut cheapest = 0;
    let mut fastest = 0;
    let mut balanced = 0;
    let badness = |c: &Combo| {
        (1.0 - score_cost(c.cost, budget_total) / 100.0) * 0.45
            + (1.0 - score_time(c.time as i32) / 100.0) * 0.35
            + (1.0 - c.comfort / 100.0) * 0.20
    };
    for (i, combo) in combos.iter().enumerate() {
        if combo.cost < combos[cheapest].cost {
            cheapest = i;
        }
        if combo.time < combos[fastest].time {
            fastest = i;
        }
        if badness(combo) < badness(&combos[balanced]) {
            balanced = i;
        }
    }

    let choice = |i: usize| Choice {
        flight: flights[combos[i].flight].clone(),
        stay: stays[combos[i].stay].clone(),
        daily_commute_minutes,
    };

    Ok(ChosenPlans {
        cheap: choice(cheapest),
        fast: choice(fastest),
        balanced: choice(balanced),
    })
}

/// Normalized multi-dimensional quality breakdown attached to each plan
/// option for user-facing explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    pub total_cost: f64,
    pub currency: String,
    pub total_travel_time_hours: f64,
    pub num_transfers: i32,
    pub daily_load_score: f64,
    pub commute_score: f64,
    pub comfort_score: f64,
    pub cost_score: f64,
    pub time_score: f64,
}

/// Derive the scorecard for one selected combination.
pub fn compute_scorecard(
    total_cost: f64,
    currency: &str,
    budget_total: f64,
    flight_minutes: i32,
    stops: i32,
    commute_minutes: i32,
) -> Scorecard {
    Scorecard {
        total_cost,
        currency: currency.to_owned(),
        total_travel_time_hours: f64::from(flight_minutes) / 60.0,
        num_transfers: stops,
        daily_load_score: (100.0 - f64::from(commute_minutes) * 0.8 - f64::from(stops) * 10.0)
            .max(0.0),
        commute_score: (100.0 - f64::from(commute_minutes) * 0.7).max(0.0),
        comfort_score: score_comfort(stops, commute_minutes),
        cost_score: score_cost(total_cost, budget_total),
        time_score: score_time(flight_minutes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeoPoint;

    fn flight(id: &str, price: f64, minutes: i32, stops: i32) -> FlightCandidate {
        FlightCandidate {
            id: id.to_owned(),
            depart_at: "2030-01-01T10:00:00".to_owned(),
            arrive_at: "2030-01-01T18:00:00".to_owned(),
            stops,
            duration_minutes: minutes,
            price_amount: price,
            currency: "USD".to_owned(),
        }
    }

    fn stay(id: &str, total: f64) -> StayCandidate {
        StayCandidate {
            id: id.to_owned(),
            name: "Stay".to_owned(),
            area: "Center".to_owned(),
            location: GeoPoint { lat: 0.0, lon: 0.0 },
            nightly_price_amount: total / 5.0,
            total_price_amount: total,
            currency: "USD".to_owned(),
        }
    }

    #[test]
    fn cheap_minimises_cost_and_fast_minimises_time() {
        let flights = vec![flight("f1", 200.0, 480, 0), flight("f2", 600.0, 300, 1)];
        let stays = vec![stay("s1", 500.0), stay("s2", 900.0)];

        let chosen = choose_plans(&flights, &stays, 800.0, 20).unwrap();

        let cheap_cost =
            chosen.cheap.flight.price_amount + chosen.cheap.stay.total_price_amount;
        for f in &flights {
            for s in &stays {
                assert!(cheap_cost <= f.price_amount + s.total_price_amount);
                assert!(chosen.fast.flight.duration_minutes <= f.duration_minutes);
            }
        }
        assert_eq!(chosen.cheap.flight.id, "f1");
        assert_eq!(chosen.cheap.stay.id, "s1");
        assert_eq!(chosen.fast.flight.id, "f2");
    }

    #[test]
    fn cheap_within_budget_when_possible() {
        let flights = vec![flight("f1", 200.0, 480, 0), flight("f2", 600.0, 600, 1)];
        let stays = vec![stay("s1", 500.0), stay("s2", 900.0)];
        let chosen = choose_plans(&flights, &stays, 800.0, 20).unwrap();
        let total = chosen.cheap.flight.price_amount + chosen.cheap.stay.total_price_amount;
        assert!(total <= 800.0);
        assert_eq!(total, 700.0);
    }

    #[test]
    fn empty_candidates_is_an_error() {
        let flights = vec![flight("f1", 200.0, 480, 0)];
        let stays = vec![stay("s1", 500.0)];
        assert_eq!(
            choose_plans(&[], &stays, 800.0, 20).unwrap_err(),
            OptimizerError::MissingCandidates
        );
        assert_eq!(
            choose_plans(&flights, &[], 800.0, 20).unwrap_err(),
            OptimizerError::MissingCandidates
        );
    }

    #[test]
    fn ties_keep_first_seen_combination() {
        let flights = vec![flight("f1", 300.0, 400, 0), flight("f2", 300.0, 400, 0)];
        let stays = vec![stay("s1", 500.0), stay("s2", 500.0)];
        let chosen = choose_plans(&flights, &stays, 1000.0, 10).unwrap();
        assert_eq!(chosen.cheap.flight.id, "f1");
        assert_eq!(chosen.cheap.stay.id, "s1");
        assert_eq!(chosen.fast.flight.id, "f1");
        assert_eq!(chosen.balanced.flight.id, "f1");
    }

    #[test]
    fn candidate_lists_are_truncated() {
        let mut flights: Vec<FlightCandidate> = (0..30)
            .map(|i| flight(&format!("f{i}"), 500.0, 500, 0))
            .collect();
        // The cheapest flight sits past the truncation point and must be
        // invisible to the optimizer.
        flights[25].price_amount = 1.0;
        let stays = vec![stay("s1", 500.0)];
        let chosen = choose_plans(&flights, &stays, 1000.0, 10).unwrap();
        assert_eq!(chosen.cheap.flight.price_amount, 500.0);
    }

    #[test]
    fn cost_score_piecewise() {
        assert_eq!(score_cost(0.0, 1000.0), 100.0);
        assert_eq!(score_cost(500.0, 1000.0), 70.0);
        assert_eq!(score_cost(1000.0, 1000.0), 40.0);
        assert!(score_cost(1500.0, 1000.0) < 40.0);
        assert_eq!(score_cost(5000.0, 1000.0), 0.0);
        assert_eq!(score_cost(500.0, 0.0), 50.0);
        assert_eq!(score_cost(500.0, -10.0), 50.0);
    }

    #[test]
    fn time_and_comfort_scores_floor_at_zero() {
        assert_eq!(score_time(0), 100.0);
        assert_eq!(score_time(1200), 0.0);
        assert_eq!(score_time(100_000), 0.0);
        assert_eq!(score_comfort(0, 0), 100.0);
        assert_eq!(score_comfort(10, 600), 0.0);
    }

    #[test]
    fn scorecard_fields_follow_formulas() {
        let card = compute_scorecard(700.0, "USD", 800.0, 480, 1, 30);
        assert_eq!(card.total_cost, 700.0);
        assert_eq!(card.total_travel_time_hours, 8.0);
        assert_eq!(card.num_transfers, 1);
        assert_eq!(card.commute_score, 100.0 - 21.0);
        assert_eq!(card.daily_load_score, 100.0 - 24.0 - 10.0);
        assert_eq!(card.comfort_score, 100.0 - 18.0 - 18.0);
        assert_eq!(card.time_score, 60.0);
    }
}
