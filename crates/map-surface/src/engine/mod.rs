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

//! Map engine abstraction.
//!
//! The rendering engine (tiles, projection, gestures) lives outside this crate.
//! The surface only needs to read the rendered extent and to register raster
//! images that layers can reference by name.

mod headless;

pub use headless::{HeadlessEngine, RegisteredImage, WebMercator};

use image::RgbaImage;
use thiserror::Error;

use crate::geo::LngLatBounds;

/// Errors reported by a map engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("an image named '{0}' is already registered")]
    ImageExists(String),

    #[error("image '{0}' has no pixels")]
    EmptyImage(String),
}

/// Rendering hints for a registered image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageOptions {
    /// Treat the image as a signed distance field so layers can recolor it.
    pub sdf: bool,
}

/// Handle to a live, mounted map engine.
pub trait MapEngine {
    /// Current rendered extent as north-east / south-west corners.
    fn bounds(&self) -> LngLatBounds;

    /// Register a raster image in the engine's image registry.
    fn add_image(
        &mut self,
        name: &str,
        image: RgbaImage,
        options: ImageOptions,
    ) -> Result<(), EngineError>;

    /// Whether an image is registered under `name`.
    fn has_image(&self, name: &str) -> bool;
}
