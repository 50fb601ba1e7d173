//! # Enrichment
//!
//! Resolves callsign -> route and ICAO24 -> registration against the two
//! secondary upstream services, behind the shared TTL caches.
//!
//! Both stages follow the same discipline: deduplicate keys in first-seen
//! order, cap the set (bounded fan-out), serve what the cache can, fetch
//! the misses concurrently, then write every outcome back. Resolved data
//! gets the full TTL, failures and clean empties half of it, so transient
//! upstream trouble self-heals faster than confirmed absence.
//! Enrichment never reorders flights and never fails a request.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    flight::FlightState,
    opensky,
    query::{normalize_airport_code, FlightQuery},
    state::State,
};

/// Resolved route for a callsign; at least one side is present.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightRoute {
    pub origin: Option<String>,
    pub destination: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AircraftMetadata {
    pub registration: String,
}

/// Overwrites `origin`/`destination` with resolved routes, then applies the
/// requested airport filters. Filtering runs after enrichment on purpose, a
/// flight whose lookup failed is matched on its fallback values.
pub async fn enrich_with_routes(state: &State, flights: &mut Vec<FlightState>, query: &FlightQuery) {
    if flights.is_empty() {
        return;
    }

    let callsigns = distinct_keys(
        flights.iter().map(|flight| flight.callsign.to_uppercase()),
        state.config.max_route_lookups,
    );

    let now = Instant::now();
    let mut resolved: HashMap<String, Option<FlightRoute>> = HashMap::new();
    let mut misses: Vec<String> = Vec::new();
    {
        let cache = state.route_cache.lock().await;
        for key in callsigns {
            match cache.get(&key, now) {
                Some(cached) => {
                    resolved.insert(key, cached);
                }
                None => misses.push(key),
            }
        }
    }

    let lookups = join_all(misses.into_iter().map(|callsign| async move {
        let outcome =
            opensky::fetch_route_payload(&state.http, &state.config.routes_url, &callsign).await;
        (callsign, outcome)
    }))
    .await;

    let now = Instant::now();
    let positive_ttl = state.config.route_cache_ttl;
    {
        let mut cache = state.route_cache.lock().await;
        for (callsign, outcome) in lookups {
            let route = match outcome {
                Ok(payload) => {
                    let route = extract_route(&payload);
                    if route.is_none() {
                        debug!(%callsign, "route lookup returned no usable data");
                    }
                    route
                }
                Err(e) => {
                    warn!(%callsign, error = %e, "route lookup failed");
                    None
                }
            };

            let ttl = if route.is_some() {
                positive_ttl
            } else {
                negative_ttl(positive_ttl)
            };
            cache.insert(&callsign, route.clone(), ttl, now);
            resolved.insert(callsign, route);
        }
    }

    for flight in flights.iter_mut() {
        if flight.callsign.is_empty() {
            continue;
        }
        if let Some(Some(route)) = resolved.get(&flight.callsign.to_uppercase()) {
            if let Some(origin) = &route.origin {
                flight.origin = origin.clone();
            }
            if let Some(destination) = &route.destination {
                flight.destination = destination.clone();
            }
        }
    }

    apply_airport_filters(flights, query);
}

/// Fills in registrations. Runs after the airport filter since the result
/// only affects display data, never filtering.
pub async fn enrich_with_metadata(state: &State, flights: &mut [FlightState]) {
    if flights.is_empty() {
        return;
    }

    let addresses = distinct_keys(
        flights.iter().map(|flight| flight.id.trim().to_lowercase()),
        state.config.max_metadata_lookups,
    );

    let now = Instant::now();
    let mut resolved: HashMap<String, Option<AircraftMetadata>> = HashMap::new();
    let mut misses: Vec<String> = Vec::new();
    {
        let cache = state.metadata_cache.lock().await;
        for key in addresses {
            match cache.get(&key, now) {
                Some(cached) => {
                    resolved.insert(key, cached);
                }
                None => misses.push(key),
            }
        }
    }

    let lookups = join_all(misses.into_iter().map(|icao24| async move {
        let outcome =
            opensky::fetch_metadata_payload(&state.http, &state.config.metadata_url, &icao24).await;
        (icao24, outcome)
    }))
    .await;

    let now = Instant::now();
    let positive_ttl = state.config.metadata_cache_ttl;
    {
        let mut cache = state.metadata_cache.lock().await;
        for (icao24, outcome) in lookups {
            let metadata = match outcome {
                Ok(payload) => {
                    let metadata = extract_registration(&payload)
                        .map(|registration| AircraftMetadata { registration });
                    if metadata.is_none() {
                        debug!(%icao24, "metadata lookup returned no registration");
                    }
                    metadata
                }
                Err(e) => {
                    warn!(%icao24, error = %e, "metadata lookup failed");
                    None
                }
            };

            let ttl = if metadata.is_some() {
                positive_ttl
            } else {
                negative_ttl(positive_ttl)
            };
            cache.insert(&icao24, metadata.clone(), ttl, now);
            resolved.insert(icao24, metadata);
        }
    }

    for flight in flights.iter_mut() {
        if let Some(Some(metadata)) = resolved.get(&flight.id.trim().to_lowercase()) {
            flight.registration = Some(metadata.registration.clone());
        }
    }
}

/// Negative entries live half as long as positive ones.
pub(crate) fn negative_ttl(positive: Duration) -> Duration {
    positive / 2
}

/// Distinct non-empty keys in first-seen order, capped. Keys beyond the cap
/// are left unenriched for this request, which also bounds the concurrent
/// lookup fan-out.
pub(crate) fn distinct_keys<I>(keys: I, cap: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    let mut distinct = Vec::new();
    for key in keys {
        if distinct.len() == cap {
            break;
        }
        if key.is_empty() || !seen.insert(key.clone()) {
            continue;
        }
        distinct.push(key);
    }
    distinct
}

pub(crate) fn apply_airport_filters(flights: &mut Vec<FlightState>, query: &FlightQuery) {
    if query.origins.is_empty() && query.destinations.is_empty() {
        return;
    }
    flights.retain(|flight| {
        (query.origins.is_empty() || query.origins.contains(&flight.origin))
            && (query.destinations.is_empty() || query.destinations.contains(&flight.destination))
    });
}

/// Pulls a route out of whatever shape the lookup service returned. A list
/// payload is scanned until the first entry yields anything; a single
/// record is tried directly.
#[must_use]
pub fn extract_route(payload: &Value) -> Option<FlightRoute> {
    match payload {
        Value::Array(candidates) => candidates.iter().find_map(extract_route_candidate),
        _ => extract_route_candidate(payload),
    }
}

/// Ordered extraction strategies over one candidate: explicit departure and
/// arrival fields, then a "route" list (first element is the origin, last
/// the destination), then a space-delimited route string, then a generic
/// "airports" list. Later strategies only fill in sides still missing; the
/// candidate wins if it produced at least one side.
fn extract_route_candidate(candidate: &Value) -> Option<FlightRoute> {
    let mut origin: Option<String> = None;
    let mut destination: Option<String> = None;

    match candidate {
        Value::Array(list) => fill_from_code_list(&mut origin, &mut destination, list),
        Value::String(route) => fill_from_route_string(&mut origin, &mut destination, route),
        Value::Object(record) => {
            origin = airport_field(candidate, "estDepartureAirport")
                .or_else(|| airport_field(candidate, "departure"));
            destination = airport_field(candidate, "estArrivalAirport")
                .or_else(|| airport_field(candidate, "arrival"))
                .or_else(|| airport_field(candidate, "destination"));

            if origin.is_none() || destination.is_none() {
                match record.get("route") {
                    Some(Value::Array(list)) => {
                        fill_from_code_list(&mut origin, &mut destination, list);
                    }
                    Some(Value::String(route)) => {
                        fill_from_route_string(&mut origin, &mut destination, route);
                    }
                    _ => {}
                }
            }

            if origin.is_none() || destination.is_none() {
                if let Some(Value::Array(list)) = record.get("airports") {
                    fill_from_code_list(&mut origin, &mut destination, list);
                }
            }
        }
        _ => return None,
    }

    if origin.is_none() && destination.is_none() {
        None
    } else {
        Some(FlightRoute { origin, destination })
    }
}

#[must_use]
pub fn extract_registration(payload: &Value) -> Option<String> {
    let registration = payload.get("registration")?.as_str()?.trim();
    if registration.is_empty() {
        None
    } else {
        Some(registration.to_uppercase())
    }
}

fn airport_field(record: &Value, key: &str) -> Option<String> {
    record
        .get(key)?
        .as_str()
        .and_then(normalize_airport_code)
}

fn fill_from_code_list(
    origin: &mut Option<String>,
    destination: &mut Option<String>,
    list: &[Value],
) {
    if list.is_empty() {
        return;
    }
    if origin.is_none() {
        *origin = list.first().and_then(Value::as_str).and_then(normalize_airport_code);
    }
    if destination.is_none() {
        *destination = list.last().and_then(Value::as_str).and_then(normalize_airport_code);
    }
}

fn fill_from_route_string(
    origin: &mut Option<String>,
    destination: &mut Option<String>,
    route: &str,
) {
    let codes: Vec<String> = route
        .split_whitespace()
        .filter_map(normalize_airport_code)
        .collect();
    if codes.is_empty() {
        return;
    }
    if origin.is_none() {
        *origin = codes.first().cloned();
    }
    if destination.is_none() {
        *destination = codes.last().cloned();
    }
}
