//! Kiwi Tequila flights provider.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use super::{FlightQuery, FlightsProvider};
use crate::types::FlightCandidate;

const SEARCH_URL: &str = "https://tequila-api.kiwi.com/v2/search";

pub struct KiwiFlightsProvider {
    api_key: String,
    client: reqwest::Client,
}

impl KiwiFlightsProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Offer>,
}

#[derive(Debug, Deserialize)]
struct Offer {
    id: Option<String>,
    utc_departure: Option<String>,
    utc_arrival: Option<String>,
    duration: Option<OfferDuration>,
    price: Option<f64>,
    #[serde(default)]
    route: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OfferDuration {
    total: Option<i64>,
}

#[async_trait]
impl FlightsProvider for KiwiFlightsProvider {
    fn name(&self) -> &str {
        "kiwi"
    }

    async fn search(&self, query: &FlightQuery) -> Result<Vec<FlightCandidate>> {
        let start: NaiveDate = query
            .start_date
            .parse()
            .with_context(|| format!("invalid start date {:?}", query.start_date))?;
        let date = start.format("%d/%m/%Y").to_string();

        let response: SearchResponse = self
            .client
            .get(SEARCH_URL)
            .timeout(Duration::from_secs(12))
            .header("apikey", self.api_key.as_str())
            .query(&[
                ("fly_from", query.origin.clone()),
                ("fly_to", query.destination.clone()),
                ("date_from", date.clone()),
                ("date_to", date),
                ("adults", query.travelers.to_string()),
                ("curr", "USD".to_owned()),
                ("limit", "20".to_owned()),
            ])
            .send()
            .await
            .context("kiwi request failed")?
            .error_for_status()
            .context("kiwi returned an error status")?
            .json()
            .await
            .context("kiwi response undecodable")?;

        let results = response
            .data
            .into_iter()
            .enumerate()
            .map(|(i, offer)| {
                let total_seconds = offer.duration.and_then(|d| d.total).unwrap_or(0);
                FlightCandidate {
                    id: offer.id.unwrap_or_else(|| format!("kiwi_{i}")),
                    depart_at: offer.utc_departure.unwrap_or_default(),
                    arrive_at: offer.utc_arrival.unwrap_or_default(),
                    stops: (offer.route.len() as i32 - 1).max(0),
                    duration_minutes: ((total_seconds as f64 / 60.0).round() as i32).max(1),
                    price_amount: offer.price.unwrap_or(0.0),
                    currency: "USD".to_owned(),
                }
            })
            .collect();

        Ok(results)
    }
}
