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

//! In-memory map engine without a renderer.
//!
//! Computes its extent from a camera center, zoom and pixel size using Web
//! Mercator, and keeps registered images in a map. Used for scripted sessions
//! and tests.

use std::collections::HashMap;
use std::f64::consts::PI;

use image::RgbaImage;
use log::debug;

use super::{EngineError, ImageOptions, MapEngine};
use crate::geo::{LngLat, LngLatBounds};
use crate::viewport::Viewport;

/// Width of the whole world in pixels at zoom 0 (vector-tile engines use 512px tiles).
const WORLD_SIZE_AT_ZOOM_0: f64 = 512.0;

/// Web Mercator projection utilities on the unit square.
#[derive(Debug)]
pub struct WebMercator;

impl WebMercator {
    /// Convert latitude to Web Mercator Y coordinate (0.0 to 1.0)
    #[must_use]
    pub fn lat_to_y(lat: f64) -> f64 {
        let lat_rad = lat.to_radians();
        (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
    }

    /// Convert longitude to Web Mercator X coordinate (0.0 to 1.0)
    #[must_use]
    pub fn lon_to_x(lon: f64) -> f64 {
        (lon + 180.0) / 360.0
    }

    /// Convert a Web Mercator Y coordinate back to latitude
    #[must_use]
    pub fn y_to_lat(y: f64) -> f64 {
        (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees()
    }

    /// Convert a Web Mercator X coordinate back to longitude
    #[must_use]
    pub fn x_to_lon(x: f64) -> f64 {
        x * 360.0 - 180.0
    }
}

/// An image held in the headless registry.
#[derive(Debug, Clone)]
pub struct RegisteredImage {
    pub image: RgbaImage,
    pub options: ImageOptions,
}

/// Map engine that only tracks camera and image registry state.
#[derive(Debug, Clone)]
pub struct HeadlessEngine {
    center: LngLat,
    zoom: f64,
    width: f64,
    height: f64,
    images: HashMap<String, RegisteredImage>,
}

impl HeadlessEngine {
    /// Create an engine with a `width` x `height` pixel canvas.
    #[must_use]
    pub fn new(center: LngLat, zoom: f64, width: f64, height: f64) -> Self {
        Self {
            center,
            zoom,
            width,
            height,
            images: HashMap::new(),
        }
    }

    /// Move the camera, as a gesture or programmatic fly-to would.
    pub fn set_camera(&mut self, viewport: &Viewport) {
        self.center = LngLat::new(viewport.longitude, viewport.latitude);
        self.zoom = viewport.zoom;
    }

    #[must_use]
    pub fn image(&self, name: &str) -> Option<&RegisteredImage> {
        self.images.get(name)
    }

    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

impl MapEngine for HeadlessEngine {
    fn bounds(&self) -> LngLatBounds {
        let world = WORLD_SIZE_AT_ZOOM_0 * 2_f64.powf(self.zoom);

        let center_x = WebMercator::lon_to_x(self.center.lng) * world;
        let center_y = WebMercator::lat_to_y(self.center.lat) * world;

        let half_width = self.width / 2.0;
        let half_height = self.height / 2.0;

        // Latitude is clamped to the Mercator square. Longitude is left
        // unwrapped and may run past +/-180 near the antimeridian.
        let top = (center_y - half_height).clamp(0.0, world);
        let bottom = (center_y + half_height).clamp(0.0, world);

        LngLatBounds::new(
            LngLat::new(
                WebMercator::x_to_lon((center_x - half_width) / world),
                WebMercator::y_to_lat(bottom / world),
            ),
            LngLat::new(
                WebMercator::x_to_lon((center_x + half_width) / world),
                WebMercator::y_to_lat(top / world),
            ),
        )
    }

    fn add_image(
        &mut self,
        name: &str,
        image: RgbaImage,
        options: ImageOptions,
    ) -> Result<(), EngineError> {
        if self.images.contains_key(name) {
            return Err(EngineError::ImageExists(name.to_string()));
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(EngineError::EmptyImage(name.to_string()));
        }

        debug!(
            "Registered image '{}' ({}x{}, sdf={})",
            name,
            image.width(),
            image.height(),
            options.sdf
        );
        self.images
            .insert(name.to_string(), RegisteredImage { image, options });
        Ok(())
    }

    fn has_image(&self, name: &str) -> bool {
        self.images.contains_key(name)
    }
}
