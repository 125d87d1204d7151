//! Open-Meteo weather provider.
//!
//! Degrades to placeholder "Forecast unavailable" days on any upstream
//! failure; a missing forecast must never fail a generation job.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use super::WeatherProvider;
use crate::types::{GeoPoint, WeatherDay};

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

pub struct OpenMeteoWeatherProvider {
    client: reqwest::Client,
}

impl OpenMeteoWeatherProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for OpenMeteoWeatherProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize, Default)]
struct DailyBlock {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    weathercode: Vec<i32>,
    #[serde(default)]
    temperature_2m_max: Vec<f64>,
    #[serde(default)]
    temperature_2m_min: Vec<f64>,
}

#[async_trait]
impl WeatherProvider for OpenMeteoWeatherProvider {
    fn name(&self) -> &str {
        "openmeteo"
    }

    async fn forecast(
        &self,
        center: GeoPoint,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<WeatherDay>> {
        let response = self
            .client
            .get(FORECAST_URL)
            .timeout(Duration::from_secs(10))
            .query(&[
                ("latitude", center.lat.to_string()),
                ("longitude", center.lon.to_string()),
                (
                    "daily",
                    "weathercode,temperature_2m_max,temperature_2m_min".to_owned(),
                ),
                ("timezone", "UTC".to_owned()),
                ("start_date", start_date.to_owned()),
                ("end_date", end_date.to_owned()),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        let data: ForecastResponse = match response {
            Ok(resp) => match resp.json().await {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!(error = %e, "open-meteo response undecodable, using fallback");
                    return Ok(fallback_days(start_date, end_date));
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "open-meteo request failed, using fallback");
                return Ok(fallback_days(start_date, end_date));
            }
        };

        let daily = data.daily.unwrap_or_default();
        let mut results = Vec::with_capacity(daily.time.len());
        for (i, day) in daily.time.iter().enumerate() {
            let code = daily.weathercode.get(i).copied();
            let mut summary = code_to_summary(code).to_owned();
            if let (Some(hi), Some(lo)) = (
                daily.temperature_2m_max.get(i),
                daily.temperature_2m_min.get(i),
            ) {
                summary = format!("{summary} ({lo:.0}°C–{hi:.0}°C)");
            }
            results.push(WeatherDay {
                date: day.clone(),
                summary,
            });
        }

        if results.is_empty() {
            return Ok(fallback_days(start_date, end_date));
        }
        Ok(results)
    }
}

fn fallback_days(start_date: &str, end_date: &str) -> Vec<WeatherDay> {
    let (Ok(start), Ok(end)) = (
        start_date.parse::<NaiveDate>(),
        end_date.parse::<NaiveDate>(),
    ) else {
        return Vec::new();
    };

    let days = (end - start).num_days() + 1;
    (0..days.max(0))
        .map(|i| WeatherDay {
            date: (start + chrono::Duration::days(i))
                .format("%Y-%m-%d")
                .to_string(),
            summary: "Forecast unavailable".to_owned(),
        })
        .collect()
}

fn code_to_summary(code: Option<i32>) -> &'static str {
    match code {
        None => "Forecast unavailable",
        Some(0) => "Clear",
        Some(1..=3) => "Partly cloudy",
        Some(45 | 48) => "Fog",
        Some(51 | 53 | 55) => "Drizzle",
        Some(61 | 63 | 65) => "Rain",
        Some(71 | 73 | 75) => "Snow",
        Some(80..=82) => "Rain showers",
        Some(95 | 96 | 99) => "Thunderstorm",
        Some(_) => "Mixed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_covers_inclusive_range() {
        let days = fallback_days("2030-01-01", "2030-01-03");
        assert_eq!(days.len(), 3);
        assert!(days.iter().all(|d| d.summary == "Forecast unavailable"));
    }

    #[test]
    fn fallback_on_bad_dates_is_empty() {
        assert!(fallback_days("soon", "later").is_empty());
    }

    #[test]
    fn weather_codes_map_to_summaries() {
        assert_eq!(code_to_summary(Some(0)), "Clear");
        assert_eq!(code_to_summary(Some(2)), "Partly cloudy");
        assert_eq!(code_to_summary(Some(63)), "Rain");
        assert_eq!(code_to_summary(Some(99)), "Thunderstorm");
        assert_eq!(code_to_summary(Some(7)), "Mixed");
        assert_eq!(code_to_summary(None), "Forecast unavailable");
    }
}
