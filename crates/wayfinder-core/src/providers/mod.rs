//! Provider capabilities: flights, stays, points of interest, weather, and
//! routing.
//!
//! Each capability is an object-safe async trait; a [`ProviderSet`] bundles
//! one boxed implementation per capability. Concrete implementations are
//! selected by configuration at startup through [`resolve_providers`] --
//! a provider that is named but cannot be constructed resolves to a typed
//! [`CapabilityError`], never a runtime panic on first use.

pub mod kiwi;
pub mod mock;
pub mod openmeteo;
pub mod opentripmap;
pub mod osrm;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::config::CoreConfig;
use crate::types::{
    FlightCandidate, GeoPoint, PoiCandidate, RouteEstimate, StayCandidate, WeatherDay,
};

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Search parameters for a flights lookup.
#[derive(Debug, Clone)]
pub struct FlightQuery {
    pub origin: String,
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub travelers: i32,
}

/// Search parameters for a stays lookup.
#[derive(Debug, Clone)]
pub struct StayQuery {
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub travelers: i32,
    pub budget_total: f64,
}

/// Search parameters for a point-of-interest lookup.
#[derive(Debug, Clone)]
pub struct PoiQuery {
    pub destination: String,
    pub center: GeoPoint,
    pub limit: usize,
}

/// Travel mode for routing estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelMode {
    Walk,
    Drive,
    Transit,
}

impl TravelMode {
    /// Assumed speed for distance-based fallback estimates.
    pub fn speed_kmh(self) -> f64 {
        match self {
            Self::Walk => 4.5,
            Self::Drive => 28.0,
            Self::Transit => 18.0,
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Walk => "walk",
            Self::Drive => "drive",
            Self::Transit => "transit",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

#[async_trait]
pub trait FlightsProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Search flight offers. Implementations return a bounded list.
    async fn search(&self, query: &FlightQuery) -> Result<Vec<FlightCandidate>>;
}

#[async_trait]
pub trait StaysProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &StayQuery) -> Result<Vec<StayCandidate>>;
}

#[async_trait]
pub trait PoiProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &PoiQuery) -> Result<Vec<PoiCandidate>>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Daily forecast for the inclusive date range. Implementations degrade
    /// to placeholder summaries on upstream failure rather than erroring.
    async fn forecast(
        &self,
        center: GeoPoint,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<WeatherDay>>;
}

#[async_trait]
pub trait RoutingProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Commute estimate between two points. Implementations degrade to a
    /// haversine-distance estimate on upstream failure rather than erroring.
    async fn estimate(
        &self,
        from: GeoPoint,
        to: GeoPoint,
        mode: TravelMode,
    ) -> Result<RouteEstimate>;
}

/// One resolved implementation per capability.
pub struct ProviderSet {
    pub flights: Box<dyn FlightsProvider>,
    pub stays: Box<dyn StaysProvider>,
    pub poi: Box<dyn PoiProvider>,
    pub weather: Box<dyn WeatherProvider>,
    pub routing: Box<dyn RoutingProvider>,
}

impl fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSet")
            .field("flights", &self.flights.name())
            .field("stays", &self.stays.name())
            .field("poi", &self.poi.name())
            .field("weather", &self.weather.name())
            .field("routing", &self.routing.name())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// A configured capability could not be constructed.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("{capability} provider {provider:?} is unavailable: {reason}")]
    Unavailable {
        capability: &'static str,
        provider: String,
        reason: String,
    },
}

impl CapabilityError {
    fn unavailable(capability: &'static str, provider: &str, reason: &str) -> Self {
        Self::Unavailable {
            capability,
            provider: provider.to_owned(),
            reason: reason.to_owned(),
        }
    }
}

/// Resolve the configured provider set.
///
/// Called once at worker startup; the resulting set is injected into the
/// job runner.
pub fn resolve_providers(config: &CoreConfig) -> Result<ProviderSet, CapabilityError> {
    let selection = &config.providers;

    let flights: Box<dyn FlightsProvider> = match selection.flights.as_str() {
        "mock" => Box::new(mock::MockFlightsProvider),
        "kiwi" => match &config.kiwi_api_key {
            Some(key) => Box::new(kiwi::KiwiFlightsProvider::new(key.clone())),
            None => {
                return Err(CapabilityError::unavailable(
                    "flights",
                    "kiwi",
                    "WAYFINDER_KIWI_API_KEY is not set",
                ));
            }
        },
        other => {
            return Err(CapabilityError::unavailable(
                "flights",
                other,
                "no such flights provider",
            ));
        }
    };

    let stays: Box<dyn StaysProvider> = match selection.stays.as_str() {
        "mock" => Box::new(mock::MockStaysProvider),
        other => {
            return Err(CapabilityError::unavailable(
                "stays",
                other,
                "no such stays provider",
            ));
        }
    };

    let poi: Box<dyn PoiProvider> = match selection.poi.as_str() {
        "mock" => Box::new(mock::MockPoiProvider),
        "opentripmap" => match &config.opentripmap_api_key {
            Some(key) => Box::new(opentripmap::OpenTripMapPoiProvider::new(key.clone())),
            None => {
                return Err(CapabilityError::unavailable(
                    "poi",
                    "opentripmap",
                    "WAYFINDER_OPENTRIPMAP_API_KEY is not set",
                ));
            }
        },
        other => {
            return Err(CapabilityError::unavailable(
                "poi",
                other,
                "no such poi provider",
            ));
        }
    };

    let weather: Box<dyn WeatherProvider> = match selection.weather.as_str() {
        "mock" => Box::new(mock::MockWeatherProvider),
        "openmeteo" => Box::new(openmeteo::OpenMeteoWeatherProvider::new()),
        other => {
            return Err(CapabilityError::unavailable(
                "weather",
                other,
                "no such weather provider",
            ));
        }
    };

    let routing: Box<dyn RoutingProvider> = match selection.routing.as_str() {
        "mock" => Box::new(mock::MockRoutingProvider),
        "osrm" => Box::new(osrm::OsrmRoutingProvider::new()),
        other => {
            return Err(CapabilityError::unavailable(
                "routing",
                other,
                "no such routing provider",
            ));
        }
    };

    Ok(ProviderSet {
        flights,
        stays,
        poi,
        weather,
        routing,
    })
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Great-circle travel time in minutes at the given speed, at least one.
pub(crate) fn haversine_minutes(a: GeoPoint, b: GeoPoint, km_per_h: f64) -> i32 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let km = 2.0 * EARTH_RADIUS_KM * h.sqrt().asin();
    let minutes = (km / km_per_h.max(1e-6) * 60.0).round() as i32;
    minutes.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderSelection;

    #[test]
    fn mock_set_resolves() {
        let config = CoreConfig::default();
        let set = resolve_providers(&config).expect("mock providers always resolve");
        assert_eq!(set.flights.name(), "mock");
        assert_eq!(set.routing.name(), "mock");
    }

    #[test]
    fn keyed_provider_without_key_is_unavailable() {
        let config = CoreConfig {
            providers: ProviderSelection {
                poi: "opentripmap".into(),
                ..ProviderSelection::default()
            },
            ..CoreConfig::default()
        };
        let err = resolve_providers(&config).unwrap_err();
        let CapabilityError::Unavailable { capability, .. } = err;
        assert_eq!(capability, "poi");
    }

    #[test]
    fn unknown_provider_is_unavailable() {
        let config = CoreConfig {
            providers: ProviderSelection {
                stays: "booking".into(),
                ..ProviderSelection::default()
            },
            ..CoreConfig::default()
        };
        assert!(resolve_providers(&config).is_err());
    }

    #[test]
    fn haversine_is_positive_and_symmetric() {
        let a = GeoPoint { lat: 48.8566, lon: 2.3522 };
        let b = GeoPoint { lat: 48.8606, lon: 2.3376 };
        let ab = haversine_minutes(a, b, 18.0);
        let ba = haversine_minutes(b, a, 18.0);
        assert_eq!(ab, ba);
        assert!(ab >= 1);
    }

    #[test]
    fn haversine_floors_at_one_minute() {
        let a = GeoPoint { lat: 48.0, lon: 2.0 };
        assert_eq!(haversine_minutes(a, a, 18.0), 1);
    }
}
