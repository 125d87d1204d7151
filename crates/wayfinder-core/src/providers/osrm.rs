//! OSRM routing provider.
//!
//! Degrades to a haversine-distance estimate on any upstream failure; the
//! returned mode flips to "estimate" so callers can tell the difference.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use super::{RoutingProvider, TravelMode, haversine_minutes};
use crate::types::{GeoPoint, RouteEstimate};

const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

pub struct OsrmRoutingProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OsrmRoutingProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            client: reqwest::Client::new(),
        }
    }

    fn fallback(from: GeoPoint, to: GeoPoint, mode: TravelMode) -> RouteEstimate {
        RouteEstimate {
            mode: "estimate".to_owned(),
            minutes: haversine_minutes(from, to, mode.speed_kmh()),
        }
    }
}

impl Default for OsrmRoutingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    #[serde(default)]
    duration: f64,
}

#[async_trait]
impl RoutingProvider for OsrmRoutingProvider {
    fn name(&self) -> &str {
        "osrm"
    }

    async fn estimate(
        &self,
        from: GeoPoint,
        to: GeoPoint,
        mode: TravelMode,
    ) -> Result<RouteEstimate> {
        let profile = match mode {
            TravelMode::Drive | TravelMode::Transit => "driving",
            TravelMode::Walk => "foot",
        };
        let url = format!(
            "{}/route/v1/{profile}/{},{};{},{}",
            self.base_url, from.lon, from.lat, to.lon, to.lat
        );

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(6))
            .query(&[("overview", "false")])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        let data: RouteResponse = match response {
            Ok(resp) => match resp.json().await {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(error = %e, "osrm response undecodable, using estimate");
                    return Ok(Self::fallback(from, to, mode));
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "osrm request failed, using estimate");
                return Ok(Self::fallback(from, to, mode));
            }
        };

        let Some(route) = data.routes.first() else {
            return Ok(Self::fallback(from, to, mode));
        };

        let minutes = ((route.duration / 60.0).round() as i32).max(1);
        Ok(RouteEstimate {
            mode: mode.to_string(),
            minutes,
        })
    }
}
