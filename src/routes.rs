use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State as AppState},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::debug;

use crate::{
    enrich::{enrich_with_metadata, enrich_with_routes},
    error::FeedError,
    flight::FlightState,
    opensky::fetch_states,
    query::FlightQuery,
    state::State,
};

#[derive(Debug, Serialize)]
pub struct FlightsResponse {
    pub flights: Vec<FlightState>,
    #[serde(rename = "generatedAt")]
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /api/adsb`: the whole pipeline for one viewport poll. Truncation to
/// `max_flights` happens in stable feed order right after the altitude
/// filter, before the enrichment fan-outs, so their cost stays bounded. A
/// primary feed failure propagates and becomes the 502 error envelope;
/// enrichment failures never do.
pub async fn flights_handler(
    AppState(state): AppState<Arc<State>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<FlightsResponse>, FeedError> {
    let query = FlightQuery::from_params(&params);

    let payload = fetch_states(&state.http, &state.config.states_url, query.bbox.as_ref()).await?;

    let mut flights: Vec<FlightState> = payload
        .states
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|tuple| FlightState::from_state_vector(tuple))
        .filter(|flight| flight.within_altitude_band(query.min_alt, query.max_alt))
        .take(state.config.max_flights)
        .collect();

    debug!(flights = flights.len(), bbox = ?query.bbox, "state vectors normalized");

    enrich_with_routes(&state, &mut flights, &query).await;
    enrich_with_metadata(&state, &mut flights).await;

    Ok(Json(FlightsResponse {
        generated_at: generated_at(payload.time),
        flights,
        error: None,
    }))
}

/// The feed's reported timestamp when it has one, otherwise now.
pub(crate) fn generated_at(feed_time: Option<i64>) -> String {
    feed_time
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::{generated_at, FlightsResponse};
    use crate::flight::{FlightState, UNKNOWN_AIRPORT};
    use serde_json::json;

    #[test]
    fn generation_timestamp_prefers_the_feed_clock() {
        assert_eq!(generated_at(Some(1_700_000_000)), "2023-11-14T22:13:20.000Z");
    }

    #[test]
    fn generation_timestamp_falls_back_to_now() {
        let stamp = generated_at(None);
        assert!(stamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
    }

    #[test]
    fn response_serializes_the_wire_contract() {
        let response = FlightsResponse {
            flights: vec![FlightState {
                id: "4CA7B4".to_string(),
                callsign: "RYR42PM".to_string(),
                lat: 53.42,
                lon: -6.27,
                alt: 38000,
                speed: 448,
                heading: 278.2,
                origin: "EGLL".to_string(),
                destination: UNKNOWN_AIRPORT.to_string(),
                registration: None,
            }],
            generated_at: "2023-11-14T22:13:20.000Z".to_string(),
            error: None,
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["generatedAt"], "2023-11-14T22:13:20.000Z");
        // A successful payload carries no error key at all.
        assert!(value.get("error").is_none());
        // Consumers never branch on missing keys: registration is an
        // explicit null, not an absent field.
        assert_eq!(value["flights"][0]["registration"], json!(null));
        assert_eq!(value["flights"][0]["destination"], UNKNOWN_AIRPORT);
    }
}
