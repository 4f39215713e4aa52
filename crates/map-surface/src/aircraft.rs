// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Aircraft data handed to the map by the host.
//!
//! The surface never inspects these beyond passing them to the aircraft layer
//! and the selection overlay.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoBounds;

/// A reported aircraft position/velocity sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateVector {
    /// ICAO 24-bit address (lower-case hex string).
    pub icao24: String,
    #[serde(default)]
    pub callsign: Option<String>,
    #[serde(default)]
    pub origin_country: String,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub time_position: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_contact: DateTime<Utc>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    /// Barometric altitude in meters.
    #[serde(default)]
    pub baro_altitude: Option<f64>,
    #[serde(default)]
    pub on_ground: bool,
    /// Ground speed in m/s.
    #[serde(default)]
    pub velocity: Option<f64>,
    /// Track in degrees clockwise from north.
    #[serde(default)]
    pub true_track: Option<f64>,
    #[serde(default)]
    pub vertical_rate: Option<f64>,
    #[serde(default)]
    pub geo_altitude: Option<f64>,
    #[serde(default)]
    pub squawk: Option<String>,
}

impl StateVector {
    /// Position as (lat, lon) when both are known.
    #[must_use]
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Snapshot of state vectors at a point in time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateVectors {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub states: Vec<StateVector>,
}

impl StateVectors {
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    #[must_use]
    pub fn get_by_icao24(&self, icao24: &str) -> Option<&StateVector> {
        self.states.iter().find(|s| s.icao24 == icao24)
    }

    /// State vectors with a known position inside `bounds`.
    pub fn within<'a>(&'a self, bounds: &'a GeoBounds) -> impl Iterator<Item = &'a StateVector> + 'a {
        self.states.iter().filter(move |s| {
            s.position()
                .is_some_and(|(lat, lon)| bounds.contains(lat, lon))
        })
    }
}

/// A point along a flown track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub baro_altitude: Option<f64>,
    pub true_track: Option<f64>,
    #[serde(default)]
    pub on_ground: bool,
}

/// The aircraft currently selected by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AircraftTrack {
    pub icao24: String,
    #[serde(default)]
    pub callsign: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub path: Vec<Waypoint>,
}

impl AircraftTrack {
    /// Single-point track built from the latest state vector.
    #[must_use]
    pub fn from_state_vector(state: &StateVector) -> Self {
        let time = state.time_position.unwrap_or(state.last_contact);
        Self {
            icao24: state.icao24.clone(),
            callsign: state.callsign.as_ref().map(|c| c.trim().to_string()),
            start_time: time,
            end_time: time,
            path: vec![Waypoint {
                time,
                latitude: state.latitude,
                longitude: state.longitude,
                baro_altitude: state.baro_altitude,
                true_track: state.true_track,
                on_ground: state.on_ground,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "time": 1700000000,
        "states": [
            {"icao24": "abc123", "callsign": "KLM1234 ", "originCountry": "Kingdom of the Netherlands",
             "timePosition": 1699999990, "lastContact": 1699999995,
             "longitude": 4.76, "latitude": 52.31, "baroAltitude": 3200.0, "onGround": false,
             "velocity": 180.5, "trueTrack": 270.0},
            {"icao24": "def456", "lastContact": 1699999999, "longitude": null, "latitude": null}
        ]
    }"#;

    #[test]
    fn test_parse_snapshot() {
        let vectors: StateVectors = serde_json::from_str(SNAPSHOT).unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors.time.timestamp(), 1_700_000_000);

        let klm = vectors.get_by_icao24("abc123").unwrap();
        assert_eq!(klm.position(), Some((52.31, 4.76)));
        assert_eq!(klm.time_position.unwrap().timestamp(), 1_699_999_990);

        let unknown = vectors.get_by_icao24("def456").unwrap();
        assert!(unknown.position().is_none());
        assert!(unknown.time_position.is_none());
    }

    #[test]
    fn test_within_bounds_skips_unpositioned() {
        let vectors: StateVectors = serde_json::from_str(SNAPSHOT).unwrap();
        let bounds = GeoBounds {
            northern_latitude: 53.0,
            eastern_longitude: 5.0,
            southern_latitude: 52.0,
            western_longitude: 4.0,
        };

        let inside: Vec<_> = vectors.within(&bounds).map(|s| s.icao24.as_str()).collect();
        assert_eq!(inside, vec!["abc123"]);
        assert_eq!(vectors.within(&GeoBounds::ZERO).count(), 0);
    }

    #[test]
    fn test_track_from_state_vector() {
        let vectors: StateVectors = serde_json::from_str(SNAPSHOT).unwrap();
        let track = AircraftTrack::from_state_vector(vectors.get_by_icao24("abc123").unwrap());

        assert_eq!(track.icao24, "abc123");
        assert_eq!(track.callsign.as_deref(), Some("KLM1234"));
        assert_eq!(track.path.len(), 1);
        assert_eq!(track.start_time, track.end_time);
    }
}
