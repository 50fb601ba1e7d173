use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub states_url: String,
    pub routes_url: String,
    pub metadata_url: String,
    pub max_flights: usize,
    pub max_route_lookups: usize,
    pub max_metadata_lookups: usize,
    pub route_cache_ttl: Duration,
    pub metadata_cache_ttl: Duration,
    pub cache_max_entries: usize,
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "8080"),
            states_url: try_load(
                "OPENSKY_STATES_URL",
                "https://opensky-network.org/api/states/all",
            ),
            routes_url: try_load(
                "OPENSKY_ROUTES_URL",
                "https://opensky-network.org/api/routes",
            ),
            metadata_url: try_load(
                "OPENSKY_METADATA_URL",
                "https://opensky-network.org/api/metadata/aircraft/icao24",
            ),
            max_flights: try_load("MAX_FLIGHTS", "200"),
            max_route_lookups: try_load("MAX_ROUTE_LOOKUPS", "80"),
            max_metadata_lookups: try_load("MAX_METADATA_LOOKUPS", "120"),
            route_cache_ttl: Duration::from_secs(try_load("ROUTE_CACHE_TTL_SECS", "300")),
            metadata_cache_ttl: Duration::from_secs(try_load("METADATA_CACHE_TTL_SECS", "1800")),
            cache_max_entries: try_load("CACHE_MAX_ENTRIES", "4096"),
            upstream_timeout: Duration::from_secs(try_load("UPSTREAM_TIMEOUT_SECS", "10")),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
