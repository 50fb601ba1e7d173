use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::routes::FlightsResponse;

/// Failure talking to an upstream service. Only the primary state vector
/// fetch lets this cross the handler boundary; enrichment lookups catch it
/// and negative-cache instead.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("upstream request failed with status {0}")]
    UpstreamStatus(StatusCode),

    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        error!("aircraft feed unavailable: {self}");

        let body = FlightsResponse {
            flights: Vec::new(),
            generated_at: crate::routes::generated_at(None),
            error: Some(self.to_string()),
        };

        (StatusCode::BAD_GATEWAY, Json(body)).into_response()
    }
}
