//! # Skyfeed
//!
//! Live flight-data aggregator behind the PlaneSpotter map view.
//!
//! One endpoint, `GET /api/adsb`, polls the OpenSky state vector feed for
//! the caller's viewport, normalizes the tuple-encoded records, and
//! enriches them with routes and registrations from two secondary lookups
//! behind process-wide TTL caches. Upstream trouble degrades data quality,
//! not availability: only a failure of the primary feed surfaces to the
//! client, as a 502 with an empty, explicitly-errored payload.
//!
//! All configuration comes from the environment, see [`config::Config`].

use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Router,
};
use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod cache;
pub mod config;
pub mod enrich;
pub mod error;
pub mod flight;
pub mod opensky;
pub mod query;
pub mod routes;
pub mod state;

use routes::flights_handler;
use state::State;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new();

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/api/adsb", get(flights_handler))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
