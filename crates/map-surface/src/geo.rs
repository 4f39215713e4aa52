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

//! Geographic coordinates and the visible-extent bounding box.
//!
//! The bounding box handed to data-fetch consumers is always derived from the
//! live map engine at call time. Before an engine is mounted the box is zeroed.

use serde::{Deserialize, Serialize};

use crate::engine::MapEngine;

/// A longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    #[must_use]
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Rendered extent as reported by a map engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLatBounds {
    pub south_west: LngLat,
    pub north_east: LngLat,
}

impl LngLatBounds {
    #[must_use]
    pub fn new(south_west: LngLat, north_east: LngLat) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    #[must_use]
    pub fn north_east(&self) -> LngLat {
        self.north_east
    }

    #[must_use]
    pub fn south_west(&self) -> LngLat {
        self.south_west
    }
}

/// Geographic box consumed by hosts to decide which state vectors to fetch.
///
/// The four edges are independent; nothing beyond the engine's own extent
/// constrains them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoBounds {
    pub northern_latitude: f64,
    pub eastern_longitude: f64,
    pub southern_latitude: f64,
    pub western_longitude: f64,
}

impl GeoBounds {
    /// The box reported while no engine is mounted.
    pub const ZERO: GeoBounds = GeoBounds {
        northern_latitude: 0.0,
        eastern_longitude: 0.0,
        southern_latitude: 0.0,
        western_longitude: 0.0,
    };

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Whether a position lies inside the box, edges included.
    ///
    /// Longitudes are compared modulo 360, so both a box reported past 180
    /// (west 165, east 193) and one whose western edge lies east of its
    /// eastern edge (west 165, east -167) cover the antimeridian.
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        if lat < self.southern_latitude || lat > self.northern_latitude {
            return false;
        }

        let mut span = self.eastern_longitude - self.western_longitude;
        if span < 0.0 {
            span += 360.0;
        }
        if span >= 360.0 {
            return true;
        }

        (lon - self.western_longitude).rem_euclid(360.0) <= span
    }
}

impl From<LngLatBounds> for GeoBounds {
    fn from(bounds: LngLatBounds) -> Self {
        let north_east = bounds.north_east();
        let south_west = bounds.south_west();

        Self {
            northern_latitude: north_east.lat,
            eastern_longitude: north_east.lng,
            southern_latitude: south_west.lat,
            western_longitude: south_west.lng,
        }
    }
}

/// Derive the visible geographic box from the mounted engine.
///
/// Returns [`GeoBounds::ZERO`] when no engine is mounted. Never caches: every
/// call reads the engine's current extent, so camera moves made outside the
/// viewport controller are picked up too.
#[must_use]
pub fn compute_bounds(engine: Option<&dyn MapEngine>) -> GeoBounds {
    match engine {
        Some(engine) => GeoBounds::from(engine.bounds()),
        None => GeoBounds::ZERO,
    }
}
