//! Resolved core configuration.
//!
//! Provider selection, API keys, and rate limits are resolved once and
//! injected into the worker and aggregator at construction time; nothing in
//! the pipeline reads global mutable settings. Tests substitute a different
//! `CoreConfig` instance.

use std::env;

/// Which concrete implementation backs each provider capability.
#[derive(Debug, Clone)]
pub struct ProviderSelection {
    pub flights: String,
    pub stays: String,
    pub poi: String,
    pub weather: String,
    pub routing: String,
}

impl Default for ProviderSelection {
    fn default() -> Self {
        Self {
            flights: "mock".to_owned(),
            stays: "mock".to_owned(),
            poi: "mock".to_owned(),
            weather: "mock".to_owned(),
            routing: "mock".to_owned(),
        }
    }
}

/// Resolved configuration for the generation core.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub providers: ProviderSelection,
    /// Per-user request budget for each submit route.
    pub rate_limit_per_minute: i64,
    pub opentripmap_api_key: Option<String>,
    pub kiwi_api_key: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            providers: ProviderSelection::default(),
            rate_limit_per_minute: 5,
            opentripmap_api_key: None,
            kiwi_api_key: None,
        }
    }
}

impl CoreConfig {
    /// Build a config from `WAYFINDER_*` environment variables, falling back
    /// to defaults (mock providers, limit 5/min).
    pub fn from_env() -> Self {
        let defaults = ProviderSelection::default();
        Self {
            providers: ProviderSelection {
                flights: env_or("WAYFINDER_PROVIDER_FLIGHTS", &defaults.flights),
                stays: env_or("WAYFINDER_PROVIDER_STAYS", &defaults.stays),
                poi: env_or("WAYFINDER_PROVIDER_POI", &defaults.poi),
                weather: env_or("WAYFINDER_PROVIDER_WEATHER", &defaults.weather),
                routing: env_or("WAYFINDER_PROVIDER_ROUTING", &defaults.routing),
            },
            rate_limit_per_minute: env::var("WAYFINDER_RATE_LIMIT_PER_MINUTE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            opentripmap_api_key: env::var("WAYFINDER_OPENTRIPMAP_API_KEY").ok(),
            kiwi_api_key: env::var("WAYFINDER_KIWI_API_KEY").ok(),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_owned())
}
