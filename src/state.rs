use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    cache::TtlCache,
    config::Config,
    enrich::{AircraftMetadata, FlightRoute},
};

/// Process-wide shared state: configuration, the upstream HTTP client, and
/// the two enrichment caches. Built once at startup and handed to every
/// request via `Arc`, so tests can run against isolated instances.
pub struct State {
    pub config: Config,
    pub http: reqwest::Client,
    pub route_cache: Mutex<TtlCache<FlightRoute>>,
    pub metadata_cache: Mutex<TtlCache<AircraftMetadata>>,
}

impl State {
    pub fn new() -> Arc<Self> {
        Self::with_config(Config::load())
    }

    pub fn with_config(config: Config) -> Arc<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .user_agent(concat!("skyfeed/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("HTTP client misconfigured!");

        Arc::new(Self {
            route_cache: Mutex::new(TtlCache::new(config.cache_max_entries)),
            metadata_cache: Mutex::new(TtlCache::new(config.cache_max_entries)),
            config,
            http,
        })
    }
}
