//! Deterministic mock providers.
//!
//! Every mock seeds a PRNG from a SHA-256 digest of the request parameters,
//! so equal queries always produce equal candidate sets -- a requirement
//! for the cache layer (cached and fresh results must agree) and for tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use super::{
    FlightQuery, FlightsProvider, PoiProvider, PoiQuery, RoutingProvider, StayQuery,
    StaysProvider, TravelMode, WeatherProvider, haversine_minutes,
};
use crate::types::{
    FlightCandidate, GeoPoint, PoiCandidate, RouteEstimate, StayCandidate, WeatherDay,
};

fn seeded_rng(parts: &[&str]) -> StdRng {
    let digest = Sha256::digest(parts.join("|").as_bytes());
    StdRng::from_seed(digest.into())
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    value
        .parse::<NaiveDate>()
        .with_context(|| format!("invalid date {value:?}"))
}

pub struct MockFlightsProvider;

#[async_trait]
impl FlightsProvider for MockFlightsProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &FlightQuery) -> Result<Vec<FlightCandidate>> {
        let travelers = query.travelers.to_string();
        let mut rng = seeded_rng(&[
            "flights",
            &query.origin,
            &query.destination,
            &query.start_date,
            &query.end_date,
            &travelers,
        ]);

        let start = parse_date(&query.start_date)?;
        let base_price: i32 = rng.random_range(120..=480);

        let mut results = Vec::with_capacity(12);
        for i in 0..12 {
            let stops = [0, 0, 1, 1, 2][rng.random_range(0..5)];
            let duration =
                rng.random_range(4 * 60..=16 * 60) + stops * rng.random_range(30..=120);
            let hour: u32 = rng.random_range(6..=20);
            let depart = start
                .and_hms_opt(hour, 0, 0)
                .context("invalid departure hour")?;
            let arrive = depart + Duration::minutes(i64::from(duration));
            let price = (base_price + rng.random_range(-40..=160)
                + stops * rng.random_range(-10..=30))
                * query.travelers;

            results.push(FlightCandidate {
                id: format!("mock_f_{i}"),
                depart_at: depart.format("%Y-%m-%dT%H:%M:%S").to_string(),
                arrive_at: arrive.format("%Y-%m-%dT%H:%M:%S").to_string(),
                stops,
                duration_minutes: duration,
                price_amount: f64::from(price),
                currency: "USD".to_owned(),
            });
        }
        Ok(results)
    }
}

pub struct MockStaysProvider;

#[async_trait]
impl StaysProvider for MockStaysProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &StayQuery) -> Result<Vec<StayCandidate>> {
        let travelers = query.travelers.to_string();
        let budget = (query.budget_total as i64).to_string();
        let mut rng = seeded_rng(&[
            "stays",
            &query.destination,
            &query.start_date,
            &query.end_date,
            &travelers,
            &budget,
        ]);

        let start = parse_date(&query.start_date)?;
        let end = parse_date(&query.end_date)?;
        let nights = (end - start).num_days().max(1);

        let center = GeoPoint {
            lat: rng.random_range(48.80..48.90),
            lon: rng.random_range(2.25..2.42),
        };
        let areas = [
            "City Center",
            "Old Town",
            "Riverside",
            "Museum District",
            "Business Area",
        ];

        let mut results = Vec::with_capacity(12);
        for i in 0..12 {
            let area = areas[rng.random_range(0..areas.len())];
            let nightly: i64 = rng.random_range(60..=260);
            let total = nightly * nights;
            let offset_lat: f64 = rng.random_range(-0.02..0.02);
            let offset_lon: f64 = rng.random_range(-0.03..0.03);

            results.push(StayCandidate {
                id: format!("mock_s_{i}"),
                name: format!("Mock Stay {}", i + 1),
                area: area.to_owned(),
                location: GeoPoint {
                    lat: center.lat + offset_lat,
                    lon: center.lon + offset_lon,
                },
                nightly_price_amount: nightly as f64,
                total_price_amount: total as f64,
                currency: "USD".to_owned(),
            });
        }
        Ok(results)
    }
}

pub struct MockPoiProvider;

#[async_trait]
impl PoiProvider for MockPoiProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &PoiQuery) -> Result<Vec<PoiCandidate>> {
        let lat = format!("{:.3}", query.center.lat);
        let lon = format!("{:.3}", query.center.lon);
        let mut rng = seeded_rng(&["poi", &query.destination, &lat, &lon]);

        let base = [
            "Historic Square",
            "City Museum",
            "Local Market",
            "Riverside Walk",
            "Modern Art Gallery",
            "Cathedral",
            "Botanical Garden",
            "Food Street",
            "Viewpoint",
            "Neighborhood Cafe",
        ];

        let n = query.limit.min(50);
        let mut results = Vec::with_capacity(n);
        for i in 0..n {
            let name = base[i % base.len()];
            let offset_lat: f64 = rng.random_range(-0.03..0.03);
            let offset_lon: f64 = rng.random_range(-0.04..0.04);
            results.push(PoiCandidate {
                id: format!("mock_p_{i}"),
                name: format!("{name} {}", i + 1),
                location: GeoPoint {
                    lat: query.center.lat + offset_lat,
                    lon: query.center.lon + offset_lon,
                },
            });
        }
        Ok(results)
    }
}

pub struct MockWeatherProvider;

#[async_trait]
impl WeatherProvider for MockWeatherProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn forecast(
        &self,
        _center: GeoPoint,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<WeatherDay>> {
        let start = parse_date(start_date)?;
        let end = parse_date(end_date)?;
        let days = (end - start).num_days() + 1;

        let mut results = Vec::new();
        for i in 0..days.max(0) {
            let date = start + Duration::days(i);
            results.push(WeatherDay {
                date: date.format("%Y-%m-%d").to_string(),
                summary: "Mild, partly cloudy".to_owned(),
            });
        }
        Ok(results)
    }
}

pub struct MockRoutingProvider;

#[async_trait]
impl RoutingProvider for MockRoutingProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn estimate(
        &self,
        from: GeoPoint,
        to: GeoPoint,
        mode: TravelMode,
    ) -> Result<RouteEstimate> {
        let minutes = haversine_minutes(from, to, mode.speed_kmh());
        Ok(RouteEstimate {
            mode: "estimate".to_owned(),
            minutes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight_query() -> FlightQuery {
        FlightQuery {
            origin: "SFO".into(),
            destination: "PAR".into(),
            start_date: "2030-01-01".into(),
            end_date: "2030-01-05".into(),
            travelers: 2,
        }
    }

    #[tokio::test]
    async fn flights_are_deterministic() {
        let provider = MockFlightsProvider;
        let a = provider.search(&flight_query()).await.unwrap();
        let b = provider.search(&flight_query()).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
    }

    #[tokio::test]
    async fn flights_vary_with_inputs() {
        let provider = MockFlightsProvider;
        let a = provider.search(&flight_query()).await.unwrap();
        let mut other = flight_query();
        other.destination = "ROM".into();
        let b = provider.search(&other).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn stays_scale_totals_by_nights() {
        let provider = MockStaysProvider;
        let query = StayQuery {
            destination: "PAR".into(),
            start_date: "2030-01-01".into(),
            end_date: "2030-01-05".into(),
            travelers: 2,
            budget_total: 1500.0,
        };
        let stays = provider.search(&query).await.unwrap();
        assert_eq!(stays.len(), 12);
        for stay in &stays {
            assert_eq!(stay.total_price_amount, stay.nightly_price_amount * 4.0);
        }
    }

    #[tokio::test]
    async fn poi_respects_limit() {
        let provider = MockPoiProvider;
        let query = PoiQuery {
            destination: "PAR".into(),
            center: GeoPoint { lat: 48.85, lon: 2.35 },
            limit: 7,
        };
        let pois = provider.search(&query).await.unwrap();
        assert_eq!(pois.len(), 7);

        let wide = PoiQuery { limit: 500, ..query };
        assert_eq!(provider.search(&wide).await.unwrap().len(), 50);
    }

    #[tokio::test]
    async fn weather_covers_inclusive_range() {
        let provider = MockWeatherProvider;
        let days = provider
            .forecast(GeoPoint { lat: 48.85, lon: 2.35 }, "2030-01-01", "2030-01-05")
            .await
            .unwrap();
        assert_eq!(days.len(), 5);
        assert_eq!(days[0].date, "2030-01-01");
        assert_eq!(days[4].date, "2030-01-05");
    }

    #[tokio::test]
    async fn routing_reports_estimate_mode() {
        let provider = MockRoutingProvider;
        let est = provider
            .estimate(
                GeoPoint { lat: 48.85, lon: 2.35 },
                GeoPoint { lat: 48.87, lon: 2.30 },
                TravelMode::Transit,
            )
            .await
            .unwrap();
        assert_eq!(est.mode, "estimate");
        assert!(est.minutes >= 1);
    }
}
