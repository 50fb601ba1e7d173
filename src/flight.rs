//! # Flight states
//!
//! Canonical per-aircraft record rebuilt on every request, plus the pure
//! normalization from the feed's tuple encoding. Records are never
//! persisted; identity only lasts for one request/response cycle.

use serde::Serialize;
use serde_json::Value;

/// Sentinel rendered by the clients for an unresolved airport.
pub const UNKNOWN_AIRPORT: &str = "—";

const M_TO_FEET: f64 = 3.28084;
const MS_TO_KNOTS: f64 = 1.94384;

/// Tuple positions consumed from the state vector feed.
const ICAO24: usize = 0;
const CALLSIGN: usize = 1;
const ORIGIN_COUNTRY: usize = 2;
const LONGITUDE: usize = 5;
const LATITUDE: usize = 6;
const BARO_ALTITUDE: usize = 7;
const VELOCITY: usize = 9;
const HEADING: usize = 10;
const GEO_ALTITUDE: usize = 13;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightState {
    pub id: String,
    pub callsign: String,
    pub lat: f64,
    pub lon: f64,
    pub alt: u32,
    pub speed: u32,
    pub heading: f64,
    pub origin: String,
    pub destination: String,
    pub registration: Option<String>,
}

impl FlightState {
    /// Maps one raw state vector into the canonical shape. Returns `None`
    /// when latitude or longitude is missing or non-numeric; every other
    /// field degrades to an explicit default instead.
    #[must_use]
    pub fn from_state_vector(state: &[Value]) -> Option<Self> {
        let lat = number_at(state, LATITUDE)?;
        let lon = number_at(state, LONGITUDE)?;

        // Geometric altitude is preferred over barometric.
        let alt = number_at(state, GEO_ALTITUDE)
            .or_else(|| number_at(state, BARO_ALTITUDE))
            .map_or(0, feet_rounded_to_25);
        let speed = number_at(state, VELOCITY).map_or(0, knots_rounded);
        let heading = normalize_heading(number_at(state, HEADING));

        let id = string_at(state, ICAO24)
            .map_or_else(|| String::from("UNKNOWN"), str::to_uppercase);
        let callsign = string_at(state, CALLSIGN).unwrap_or_default().trim().to_string();
        let origin = match string_at(state, ORIGIN_COUNTRY).map(str::trim) {
            Some(country) if !country.is_empty() => country.to_string(),
            _ => UNKNOWN_AIRPORT.to_string(),
        };

        Some(FlightState {
            id,
            callsign,
            lat,
            lon,
            alt,
            speed,
            heading,
            origin,
            destination: UNKNOWN_AIRPORT.to_string(),
            registration: None,
        })
    }

    /// Inclusive on each bound that is present.
    #[must_use]
    pub fn within_altitude_band(&self, min_alt: Option<u32>, max_alt: Option<u32>) -> bool {
        min_alt.map_or(true, |lo| self.alt >= lo) && max_alt.map_or(true, |hi| self.alt <= hi)
    }
}

/// Degrees folded into `[0, 360)`; unknown or non-numeric headings become 0.
#[must_use]
pub fn normalize_heading(heading: Option<f64>) -> f64 {
    heading.map_or(0.0, |degrees| degrees.rem_euclid(360.0))
}

fn feet_rounded_to_25(meters: f64) -> u32 {
    (((meters * M_TO_FEET) / 25.0).round() * 25.0).max(0.0) as u32
}

fn knots_rounded(meters_per_second: f64) -> u32 {
    (meters_per_second * MS_TO_KNOTS).round().max(0.0) as u32
}

fn number_at(state: &[Value], index: usize) -> Option<f64> {
    state.get(index)?.as_f64()
}

fn string_at(state: &[Value], index: usize) -> Option<&str> {
    state.get(index)?.as_str()
}
