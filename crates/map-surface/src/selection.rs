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

//! Click-to-aircraft resolution.

use serde::{Deserialize, Serialize};

use crate::geo::LngLat;

/// Feature property holding the aircraft identifier.
pub const SELECTION_PROPERTY: &str = "icao24";

/// A rendered feature hit-tested by the engine at the pointer location.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub layer: Option<String>,
    #[serde(default)]
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Feature {
    /// Feature carrying a single string property.
    #[must_use]
    pub fn with_property(key: &str, value: &str) -> Self {
        let mut properties = serde_json::Map::new();
        properties.insert(key.to_string(), serde_json::Value::from(value));
        Self {
            layer: None,
            properties: Some(properties),
        }
    }

    /// String value of `key`, if present and a string.
    #[must_use]
    pub fn string_property(&self, key: &str) -> Option<&str> {
        self.properties.as_ref()?.get(key)?.as_str()
    }
}

/// A click delivered by the engine, with features ordered top-most first.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerEvent {
    /// Screen position in pixels.
    #[serde(default)]
    pub point: [f64; 2],
    #[serde(default)]
    pub lng_lat: Option<LngLat>,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl PointerEvent {
    #[must_use]
    pub fn with_features(features: Vec<Feature>) -> Self {
        Self {
            features,
            ..Default::default()
        }
    }
}

/// Resolve a click to the selected aircraft's `icao24`.
///
/// Only the first hit feature counts. A miss (no features, no properties, or
/// a missing or non-string id) resolves to `None`.
#[must_use]
pub fn resolve_click(event: &PointerEvent) -> Option<String> {
    event
        .features
        .first()?
        .string_property(SELECTION_PROPERTY)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_features() {
        assert_eq!(resolve_click(&PointerEvent::default()), None);
    }

    #[test]
    fn test_first_feature_wins() {
        let event = PointerEvent::with_features(vec![
            Feature::with_property("icao24", "abc123"),
            Feature::with_property("icao24", "def456"),
        ]);
        assert_eq!(resolve_click(&event).as_deref(), Some("abc123"));
        // Same event, same answer
        assert_eq!(resolve_click(&event), resolve_click(&event));
    }

    #[test]
    fn test_first_feature_without_id_is_a_miss() {
        let event = PointerEvent::with_features(vec![
            Feature {
                layer: Some("airports".to_string()),
                properties: None,
            },
            Feature::with_property("icao24", "def456"),
        ]);
        assert_eq!(resolve_click(&event), None);

        let event = PointerEvent::with_features(vec![Feature::with_property("name", "EHAM")]);
        assert_eq!(resolve_click(&event), None);
    }

    #[test]
    fn test_non_string_id_is_a_miss() {
        let mut properties = serde_json::Map::new();
        properties.insert("icao24".to_string(), json!(11_259_375));
        let event = PointerEvent::with_features(vec![Feature {
            layer: None,
            properties: Some(properties),
        }]);
        assert_eq!(resolve_click(&event), None);
    }

    #[test]
    fn test_deserialize_engine_event() {
        let event: PointerEvent = serde_json::from_value(json!({
            "point": [120.0, 48.5],
            "lngLat": {"lng": 4.76, "lat": 52.31},
            "features": [{"layer": "aircraft", "properties": {"icao24": "4ca7b5", "callsign": "RYR5AB"}}]
        }))
        .unwrap();
        assert_eq!(resolve_click(&event).as_deref(), Some("4ca7b5"));
        assert_eq!(event.lng_lat, Some(LngLat::new(4.76, 52.31)));
    }
}
