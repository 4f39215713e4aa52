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

//! Viewport, geo-bounds and selection state for live aircraft maps.
//!
//! The map engine itself (tiles, projection, gestures) and the layers that draw
//! aircraft are external. This crate owns what sits between them and the host
//! application:
//!
//! - **Geo layer**: derives the visible geographic box from the engine's extent,
//!   zeroed while no engine is mounted
//! - **Viewport layer**: stores the camera reported by the engine and notifies
//!   the host with the camera and its box
//! - **Icon layer**: loads and rasterizes the aircraft SVG in the background and
//!   registers it with the engine as a recolorable image
//! - **Selection layer**: resolves clicks on rendered features to an aircraft id
//! - **Surface**: the state machine tying these to the engine lifecycle
//!
//! # Quick Start
//!
//! ```
//! use map_surface::engine::HeadlessEngine;
//! use map_surface::geo::LngLat;
//! use map_surface::selection::{Feature, PointerEvent};
//! use map_surface::{MapEvent, MapSurface, SurfaceConfig, Viewport};
//!
//! let mut surface = MapSurface::new(SurfaceConfig::default());
//! surface.on_map_change(|viewport, bounds| {
//!     println!("zoom {} -> {:?}", viewport.zoom, bounds);
//! });
//! surface.on_aircraft_select(|icao24| println!("selected {icao24}"));
//!
//! surface.mount(HeadlessEngine::new(LngLat::new(4.5, 50.5), 7.0, 1024.0, 768.0));
//! surface.dispatch(MapEvent::ViewportChange {
//!     viewport: Viewport::new(50.5, 4.5, 7.0),
//!     interaction: Default::default(),
//!     previous: None,
//! });
//! surface.dispatch(MapEvent::Click(PointerEvent::with_features(vec![
//!     Feature::with_property("icao24", "abc123"),
//! ])));
//!
//! assert!(surface.is_overlay_visible());
//! ```

pub mod aircraft;
pub mod engine;
pub mod geo;
pub mod icon;
pub mod layer;
pub mod selection;
pub mod surface;
pub mod viewport;

pub use aircraft::{AircraftTrack, StateVector, StateVectors};
pub use engine::{EngineError, HeadlessEngine, ImageOptions, MapEngine};
pub use geo::{compute_bounds, GeoBounds, LngLat, LngLatBounds};
pub use icon::{IconAsset, IconError, IconRegistrar, IconSpec, RegistrationState};
pub use layer::{AircraftLayer, AircraftLayerProps, SelectionOverlay};
pub use selection::{resolve_click, Feature, PointerEvent};
pub use surface::{MapEvent, MapSurface, SurfaceConfig, SurfaceState, ViewSettings};
pub use viewport::{InteractionSettings, InteractionState, Viewport, ViewportController};
