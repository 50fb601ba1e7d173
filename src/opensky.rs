//! # OpenSky upstream calls
//!
//! One function per collaborator: the state vector feed, the route lookup,
//! and the aircraft metadata lookup. Each issues a single uncached GET with
//! the client-wide timeout; nothing here retries. Route and metadata
//! payloads come back as raw JSON because their shapes are not
//! contractually fixed, extraction lives in [`crate::enrich`].

use reqwest::{header::ACCEPT, Client};
use serde::Deserialize;
use serde_json::Value;

use crate::{error::FeedError, query::BoundingBox};

/// Envelope of the state vector feed. `states` is null outside coverage;
/// tuple elements stay raw so one malformed element drops one record, not
/// the whole batch.
#[derive(Debug, Deserialize)]
pub struct StateVectorResponse {
    pub time: Option<i64>,
    pub states: Option<Vec<Vec<Value>>>,
}

pub async fn fetch_states(
    client: &Client,
    base_url: &str,
    bbox: Option<&BoundingBox>,
) -> Result<StateVectorResponse, FeedError> {
    let mut request = client.get(base_url).header(ACCEPT, "application/json");
    if let Some(bbox) = bbox {
        request = request.query(&[
            ("lamin", bbox.lamin),
            ("lamax", bbox.lamax),
            ("lomin", bbox.lomin),
            ("lomax", bbox.lomax),
        ]);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(FeedError::UpstreamStatus(response.status()));
    }

    Ok(response.json().await?)
}

pub async fn fetch_route_payload(
    client: &Client,
    base_url: &str,
    callsign: &str,
) -> Result<Value, FeedError> {
    let response = client
        .get(base_url)
        .query(&[("callsign", callsign)])
        .header(ACCEPT, "application/json")
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(FeedError::UpstreamStatus(response.status()));
    }

    Ok(response.json().await?)
}

pub async fn fetch_metadata_payload(
    client: &Client,
    base_url: &str,
    icao24: &str,
) -> Result<Value, FeedError> {
    let url = format!("{}/{icao24}", base_url.trim_end_matches('/'));
    let response = client
        .get(url)
        .header(ACCEPT, "application/json")
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(FeedError::UpstreamStatus(response.status()));
    }

    Ok(response.json().await?)
}
