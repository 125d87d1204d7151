//! OpenTripMap point-of-interest provider.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{PoiProvider, PoiQuery};
use crate::types::{GeoPoint, PoiCandidate};

const RADIUS_URL: &str = "https://api.opentripmap.com/0.1/en/places/radius";
const SEARCH_RADIUS_METERS: u32 = 6000;

pub struct OpenTripMapPoiProvider {
    api_key: String,
    client: reqwest::Client,
}

impl OpenTripMapPoiProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Place {
    xid: Option<String>,
    name: Option<String>,
    point: Option<Point>,
}

#[derive(Debug, Deserialize)]
struct Point {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[async_trait]
impl PoiProvider for OpenTripMapPoiProvider {
    fn name(&self) -> &str {
        "opentripmap"
    }

    async fn search(&self, query: &PoiQuery) -> Result<Vec<PoiCandidate>> {
        let limit = query.limit.min(50);
        let places: Vec<Place> = self
            .client
            .get(RADIUS_URL)
            .timeout(Duration::from_secs(10))
            .query(&[
                ("radius", SEARCH_RADIUS_METERS.to_string()),
                ("lon", query.center.lon.to_string()),
                ("lat", query.center.lat.to_string()),
                ("limit", limit.to_string()),
                ("apikey", self.api_key.clone()),
                ("format", "json".to_owned()),
                ("rate", "2".to_owned()),
            ])
            .send()
            .await
            .context("opentripmap request failed")?
            .error_for_status()
            .context("opentripmap returned an error status")?
            .json()
            .await
            .context("opentripmap response undecodable")?;

        let results = places
            .into_iter()
            .filter_map(|place| {
                let xid = place.xid?;
                let point = place.point.unwrap_or(Point {
                    lat: None,
                    lon: None,
                });
                Some(PoiCandidate {
                    id: xid,
                    name: place.name.filter(|n| !n.is_empty()).unwrap_or_else(|| "POI".to_owned()),
                    location: GeoPoint {
                        lat: point.lat.unwrap_or(query.center.lat),
                        lon: point.lon.unwrap_or(query.center.lon),
                    },
                })
            })
            .collect();

        Ok(results)
    }
}
