//! Cached, traced access to the provider capabilities.
//!
//! The aggregator is the single entry point the generation flows use to
//! reach upstream data: flights/stays/poi lookups go through the cache-aside
//! layer, and every call (cached or not) appends a redacted entry to the
//! run's tool-call trace.

use std::time::Instant;

use anyhow::Result;
use serde_json::json;

use crate::cache::{CacheStore, FLIGHTS_TTL, POI_TTL, STAYS_TTL, cache_key, get_or_compute};
use crate::providers::{FlightQuery, PoiQuery, ProviderSet, StayQuery, TravelMode};
use crate::trace::{TraceRecorder, output_summary};
use crate::types::{FlightCandidate, GeoPoint, PoiCandidate, RouteEstimate, StayCandidate, WeatherDay};

pub struct Aggregator<'a> {
    providers: &'a ProviderSet,
    cache: &'a dyn CacheStore,
    trace: TraceRecorder,
}

impl<'a> Aggregator<'a> {
    pub fn new(providers: &'a ProviderSet, cache: &'a dyn CacheStore) -> Self {
        Self {
            providers,
            cache,
            trace: TraceRecorder::new(),
        }
    }

    /// Consume the aggregator, yielding the accumulated trace.
    pub fn into_trace(self) -> TraceRecorder {
        self.trace
    }

    pub fn trace(&self) -> &TraceRecorder {
        &self.trace
    }

    /// Cached flights lookup.
    pub async fn search_flights(&mut self, query: &FlightQuery) -> Result<Vec<FlightCandidate>> {
        let payload = json!({
            "origin": query.origin,
            "destination": query.destination,
            "start_date": query.start_date,
            "end_date": query.end_date,
            "travelers": query.travelers,
        });
        let key = cache_key("flights", &payload);
        let providers = self.providers;

        let started = Instant::now();
        let results = get_or_compute(self.cache, &key, FLIGHTS_TTL, || async move {
            providers.flights.search(query).await
        })
        .await?;
        let latency = started.elapsed();

        tracing::debug!(count = results.len(), latency_ms = latency.as_millis() as u64, "flights fetched");
        self.trace
            .record("flights.search", payload, output_summary(&results), latency);
        Ok(results)
    }

    /// Cached stays lookup.
    pub async fn search_stays(&mut self, query: &StayQuery) -> Result<Vec<StayCandidate>> {
        let payload = json!({
            "destination": query.destination,
            "start_date": query.start_date,
            "end_date": query.end_date,
            "travelers": query.travelers,
            "budget_total": query.budget_total,
        });
        let key = cache_key("stays", &payload);
        let providers = self.providers;

        let started = Instant::now();
        let results = get_or_compute(self.cache, &key, STAYS_TTL, || async move {
            providers.stays.search(query).await
        })
        .await?;
        let latency = started.elapsed();

        tracing::debug!(count = results.len(), latency_ms = latency.as_millis() as u64, "stays fetched");
        self.trace
            .record("stays.search", payload, output_summary(&results), latency);
        Ok(results)
    }

    /// Cached point-of-interest lookup.
    pub async fn search_pois(&mut self, query: &PoiQuery) -> Result<Vec<PoiCandidate>> {
        let payload = json!({
            "destination": query.destination,
            "center": {"lat": query.center.lat, "lon": query.center.lon},
            "limit": query.limit,
        });
        let key = cache_key("poi", &payload);
        let providers = self.providers;

        let started = Instant::now();
        let results = get_or_compute(self.cache, &key, POI_TTL, || async move {
            providers.poi.search(query).await
        })
        .await?;
        let latency = started.elapsed();

        tracing::debug!(count = results.len(), latency_ms = latency.as_millis() as u64, "pois fetched");
        self.trace
            .record("poi.search", payload, output_summary(&results), latency);
        Ok(results)
    }

    /// Uncached weather forecast (traced).
    pub async fn forecast(
        &mut self,
        center: GeoPoint,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<WeatherDay>> {
        let payload = json!({
            "center": {"lat": center.lat, "lon": center.lon},
            "start_date": start_date,
            "end_date": end_date,
        });

        let started = Instant::now();
        let results = self
            .providers
            .weather
            .forecast(center, start_date, end_date)
            .await?;
        let latency = started.elapsed();

        self.trace
            .record("weather.forecast", payload, output_summary(&results), latency);
        Ok(results)
    }

    /// Uncached routing estimate (traced).
    pub async fn estimate_route(
        &mut self,
        from: GeoPoint,
        to: GeoPoint,
        mode: TravelMode,
    ) -> Result<RouteEstimate> {
        let payload = json!({
            "from": {"lat": from.lat, "lon": from.lon},
            "to": {"lat": to.lat, "lon": to.lon},
            "mode": mode.to_string(),
        });

        let started = Instant::now();
        let estimate = self.providers.routing.estimate(from, to, mode).await?;
        let latency = started.elapsed();

        self.trace.record(
            "routing.estimate",
            payload,
            json!({"mode": estimate.mode, "minutes": estimate.minutes}),
            latency,
        );
        Ok(estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCacheStore;
    use crate::config::CoreConfig;
    use crate::providers::resolve_providers;

    fn flight_query() -> FlightQuery {
        FlightQuery {
            origin: "SFO".into(),
            destination: "PAR".into(),
            start_date: "2030-01-01".into(),
            end_date: "2030-01-05".into(),
            travelers: 1,
        }
    }

    #[tokio::test]
    async fn repeated_search_hits_cache_but_still_traces() {
        let providers = resolve_providers(&CoreConfig::default()).unwrap();
        let cache = MemoryCacheStore::new();
        let mut agg = Aggregator::new(&providers, &cache);

        let first = agg.search_flights(&flight_query()).await.unwrap();
        let second = agg.search_flights(&flight_query()).await.unwrap();
        assert_eq!(first, second);

        // Both calls are traced even though the second was a cache hit.
        assert_eq!(agg.trace().len(), 2);
        assert_eq!(agg.trace().entries()[0].tool, "flights.search");
    }

    #[tokio::test]
    async fn trace_summary_is_truncated() {
        let providers = resolve_providers(&CoreConfig::default()).unwrap();
        let cache = MemoryCacheStore::new();
        let mut agg = Aggregator::new(&providers, &cache);

        let results = agg.search_flights(&flight_query()).await.unwrap();
        assert_eq!(results.len(), 12);

        let entry = &agg.trace().entries()[0];
        assert_eq!(entry.output["count"], 12);
        assert_eq!(entry.output["first"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn routing_and_weather_are_traced() {
        let providers = resolve_providers(&CoreConfig::default()).unwrap();
        let cache = MemoryCacheStore::new();
        let mut agg = Aggregator::new(&providers, &cache);

        let a = GeoPoint { lat: 48.85, lon: 2.35 };
        let b = GeoPoint { lat: 48.87, lon: 2.31 };
        agg.estimate_route(a, b, TravelMode::Transit).await.unwrap();
        agg.forecast(a, "2030-01-01", "2030-01-02").await.unwrap();

        let tools: Vec<&str> = agg
            .trace()
            .entries()
            .iter()
            .map(|e| e.tool.as_str())
            .collect();
        assert_eq!(tools, vec!["routing.estimate", "weather.forecast"]);
    }
}
