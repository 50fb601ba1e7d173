use std::collections::{HashMap, HashSet};

/// Viewport rectangle forwarded to the state vector feed. Only built when
/// all four coordinates parse; min/max are resolved per axis so an inverted
/// viewport from the caller is corrected rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lamin: f64,
    pub lamax: f64,
    pub lomin: f64,
    pub lomax: f64,
}

/// Fully resolved query descriptor. Malformed parameters never produce an
/// error, the corresponding filter is simply absent.
#[derive(Debug, Default)]
pub struct FlightQuery {
    pub bbox: Option<BoundingBox>,
    pub origins: HashSet<String>,
    pub destinations: HashSet<String>,
    pub min_alt: Option<u32>,
    pub max_alt: Option<u32>,
}

impl FlightQuery {
    #[must_use]
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let min_lat = parse_coordinate(params.get("minLat"));
        let max_lat = parse_coordinate(params.get("maxLat"));
        let min_lon = parse_coordinate(params.get("minLon"));
        let max_lon = parse_coordinate(params.get("maxLon"));

        let bbox = match (min_lat, max_lat, min_lon, max_lon) {
            (Some(lat_a), Some(lat_b), Some(lon_a), Some(lon_b)) => Some(BoundingBox {
                lamin: lat_a.min(lat_b),
                lamax: lat_a.max(lat_b),
                lomin: lon_a.min(lon_b),
                lomax: lon_a.max(lon_b),
            }),
            _ => None,
        };

        let mut min_alt = parse_altitude(params.get("minAlt"));
        let mut max_alt = parse_altitude(params.get("maxAlt"));
        if let (Some(lo), Some(hi)) = (min_alt, max_alt) {
            if lo > hi {
                (min_alt, max_alt) = (Some(hi), Some(lo));
            }
        }

        FlightQuery {
            bbox,
            origins: parse_airport_filters(params.get("origin")),
            destinations: parse_airport_filters(params.get("destination")),
            min_alt,
            max_alt,
        }
    }
}

/// Uppercased, trimmed airport code, kept only at ICAO/IATA lengths (3 or 4
/// characters). Anything else is dropped silently.
#[must_use]
pub fn normalize_airport_code(raw: &str) -> Option<String> {
    let trimmed = raw.trim().to_uppercase();
    if (3..=4).contains(&trimmed.chars().count()) {
        Some(trimmed)
    } else {
        None
    }
}

fn parse_coordinate(value: Option<&String>) -> Option<f64> {
    value?.parse::<f64>().ok().filter(|parsed| parsed.is_finite())
}

fn parse_altitude(value: Option<&String>) -> Option<u32> {
    value?.parse::<i64>().ok().map(|parsed| parsed.max(0) as u32)
}

fn parse_airport_filters(value: Option<&String>) -> HashSet<String> {
    value
        .map(|list| {
            list.split(',')
                .filter_map(normalize_airport_code)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::FlightQuery;
    use std::collections::HashMap;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn bbox_requires_all_four_coordinates() {
        let query = FlightQuery::from_params(&params(&[
            ("minLat", "48.0"),
            ("maxLat", "52.0"),
            ("minLon", "-1.5"),
        ]));
        assert!(query.bbox.is_none());
    }

    #[test]
    fn inverted_viewport_is_corrected_per_axis() {
        let query = FlightQuery::from_params(&params(&[
            ("minLat", "52.0"),
            ("maxLat", "48.0"),
            ("minLon", "2.5"),
            ("maxLon", "-1.5"),
        ]));

        let bbox = query.bbox.expect("expected a bounding box");
        assert_eq!(bbox.lamin, 48.0);
        assert_eq!(bbox.lamax, 52.0);
        assert_eq!(bbox.lomin, -1.5);
        assert_eq!(bbox.lomax, 2.5);
    }

    #[test]
    fn malformed_coordinate_drops_the_whole_box() {
        let query = FlightQuery::from_params(&params(&[
            ("minLat", "48.0"),
            ("maxLat", "not-a-number"),
            ("minLon", "-1.5"),
            ("maxLon", "2.5"),
        ]));
        assert!(query.bbox.is_none());

        let query = FlightQuery::from_params(&params(&[
            ("minLat", "48.0"),
            ("maxLat", "NaN"),
            ("minLon", "-1.5"),
            ("maxLon", "2.5"),
        ]));
        assert!(query.bbox.is_none());
    }

    #[test]
    fn altitude_bounds_are_clamped_and_swapped_when_inverted() {
        let query = FlightQuery::from_params(&params(&[("minAlt", "-500"), ("maxAlt", "abc")]));
        assert_eq!(query.min_alt, Some(0));
        assert_eq!(query.max_alt, None);

        let query = FlightQuery::from_params(&params(&[
            ("minAlt", "30000"),
            ("maxAlt", "10000"),
        ]));
        assert_eq!(query.min_alt, Some(10000));
        assert_eq!(query.max_alt, Some(30000));
    }

    #[test]
    fn airport_filters_keep_only_plausible_codes() {
        let query = FlightQuery::from_params(&params(&[
            ("origin", " egll , KJFK,x,TOOLONGCODE,,lhr "),
            ("destination", ""),
        ]));

        assert_eq!(query.origins.len(), 3);
        assert!(query.origins.contains("EGLL"));
        assert!(query.origins.contains("KJFK"));
        assert!(query.origins.contains("LHR"));
        assert!(query.destinations.is_empty());
    }
}
