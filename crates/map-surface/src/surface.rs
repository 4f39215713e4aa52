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

//! Map surface orchestration.
//!
//! [`MapSurface`] owns the engine handle between load and unmount, routes
//! engine events to the viewport controller and the selection resolver, and
//! decides what gets rendered. Its state machine:
//!
//! ```text
//! Unmounted --load--> MountedNoSelection --resolved click--> MountedSelected
//!     ^                      |                                 |   ^
//!     +-------unmount--------+----------------unmount----------+   | resolved click
//!                                                                  +--+
//! ```
//!
//! Viewport changes are accepted in both mounted states and never touch the
//! selection. The overlay, once shown, stays shown for the rest of the mount.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::aircraft::{AircraftTrack, StateVectors};
use crate::engine::MapEngine;
use crate::geo::{compute_bounds, GeoBounds};
use crate::icon::{IconAsset, IconRegistrar, IconSpec, RegistrationState};
use crate::layer::{AircraftLayer, AircraftLayerProps, SelectionOverlay};
use crate::selection::{resolve_click, PointerEvent};
use crate::viewport::{InteractionSettings, InteractionState, Viewport, ViewportController};

/// Default basemap style.
pub const DEFAULT_MAP_STYLE: &str = "mapbox://styles/mapbox/dark-v10";

/// Default camera when the host has not moved the map yet.
pub const DEFAULT_ZOOM: f64 = 4.0;
pub const DEFAULT_LATITUDE: f64 = 50.0;
pub const DEFAULT_LONGITUDE: f64 = 10.0;

/// Host callback invoked with the selected aircraft's `icao24`.
pub type AircraftSelectCallback = Box<dyn FnMut(&str)>;

/// Static configuration for a surface.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    pub default_zoom: f64,
    pub default_latitude: f64,
    pub default_longitude: f64,
    pub map_style: String,
    /// Map provider credential.
    pub access_token: Option<String>,
    pub interaction: InteractionSettings,
    pub icon_asset: IconAsset,
    pub icon: IconSpec,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            default_zoom: DEFAULT_ZOOM,
            default_latitude: DEFAULT_LATITUDE,
            default_longitude: DEFAULT_LONGITUDE,
            map_style: DEFAULT_MAP_STYLE.to_string(),
            access_token: None,
            interaction: InteractionSettings::default(),
            icon_asset: IconAsset::aircraft(),
            icon: IconSpec::default(),
        }
    }
}

/// What an engine needs to mount: camera, capabilities, style and credential.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSettings {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
    #[serde(flatten)]
    pub interaction: InteractionSettings,
    pub map_style: String,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

/// Lifecycle and selection state of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    Unmounted,
    MountedNoSelection,
    MountedSelected,
}

/// Events delivered by a mounted engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapEvent {
    Click(PointerEvent),
    ViewportChange {
        viewport: Viewport,
        #[serde(default)]
        interaction: InteractionState,
        #[serde(default)]
        previous: Option<Viewport>,
    },
}

/// Interactive aircraft map bound to an engine of type `E`.
pub struct MapSurface<E: MapEngine> {
    config: SurfaceConfig,
    engine: Option<E>,
    viewport: ViewportController,
    icons: IconRegistrar,
    overlay_visible: bool,
    selected_icao24: Option<String>,
    state_vectors: StateVectors,
    selected_aircraft: Option<AircraftTrack>,
    on_aircraft_select: Option<AircraftSelectCallback>,
}

impl<E: MapEngine> std::fmt::Debug for MapSurface<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSurface")
            .field("state", &self.state())
            .field("viewport", &self.viewport)
            .field("icons", &self.icons)
            .field("overlay_visible", &self.overlay_visible)
            .field("selected_icao24", &self.selected_icao24)
            .field("aircraft_count", &self.state_vectors.len())
            .finish_non_exhaustive()
    }
}

impl<E: MapEngine> MapSurface<E> {
    #[must_use]
    pub fn new(config: SurfaceConfig) -> Self {
        let icons = IconRegistrar::new(config.icon_asset.clone(), config.icon.clone());
        Self {
            config,
            engine: None,
            viewport: ViewportController::new(),
            icons,
            overlay_visible: false,
            selected_icao24: None,
            state_vectors: StateVectors::default(),
            selected_aircraft: None,
            on_aircraft_select: None,
        }
    }

    /// Register the host's viewport listener.
    pub fn on_map_change(&mut self, callback: impl FnMut(&Viewport, &GeoBounds) + 'static) {
        self.viewport.set_listener(Box::new(callback));
    }

    /// Register the host's selection listener.
    pub fn on_aircraft_select(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_aircraft_select = Some(Box::new(callback));
    }

    /// Take the engine handle once the engine reports it is ready.
    ///
    /// Starts the icon registration for this mount. Mounting over an existing
    /// engine unmounts it first.
    pub fn mount(&mut self, engine: E) {
        if self.engine.is_some() {
            warn!("Surface already mounted, replacing engine");
            self.unmount();
        }

        let bounds = GeoBounds::from(engine.bounds());
        info!(
            "Map surface mounted, extent N {:.4} E {:.4} S {:.4} W {:.4}",
            bounds.northern_latitude,
            bounds.eastern_longitude,
            bounds.southern_latitude,
            bounds.western_longitude
        );
        self.engine = Some(engine);

        self.icons.reset();
        self.icons.start();
    }

    /// Release the engine handle.
    ///
    /// Any icon load still in flight is abandoned and per-mount state
    /// (viewport, selection, overlay) starts fresh on the next mount.
    pub fn unmount(&mut self) -> Option<E> {
        let engine = self.engine.take();
        if engine.is_none() {
            debug!("Unmount requested but surface is not mounted");
            return None;
        }

        self.icons.cancel();
        self.viewport.reset();
        self.overlay_visible = false;
        self.selected_icao24 = None;
        info!("Map surface unmounted");

        engine
    }

    /// Route an engine event.
    pub fn dispatch(&mut self, event: MapEvent) {
        match event {
            MapEvent::Click(pointer) => {
                self.handle_click(&pointer);
            }
            MapEvent::ViewportChange {
                viewport,
                interaction,
                previous,
            } => {
                self.handle_viewport_change(viewport, &interaction, previous.as_ref());
            }
        }
    }

    /// Resolve a click and, on a hit, show the overlay and notify the host.
    pub fn handle_click(&mut self, event: &PointerEvent) -> Option<String> {
        if self.engine.is_none() {
            debug!("Ignoring click, surface is not mounted");
            return None;
        }

        self.poll();

        let Some(icao24) = resolve_click(event) else {
            debug!("Click hit {} feature(s), no aircraft", event.features.len());
            return None;
        };

        info!("Aircraft {} selected", icao24);
        self.overlay_visible = true;
        self.selected_icao24 = Some(icao24.clone());

        if let Some(callback) = self.on_aircraft_select.as_mut() {
            callback(&icao24);
        }

        Some(icao24)
    }

    /// Store a new viewport and report it with its geographic box.
    pub fn handle_viewport_change(
        &mut self,
        viewport: Viewport,
        interaction: &InteractionState,
        previous: Option<&Viewport>,
    ) -> Option<GeoBounds> {
        let Some(engine) = self.engine.as_ref() else {
            debug!("Ignoring viewport change, surface is not mounted");
            return None;
        };

        let bounds = self.viewport.apply_viewport_change(
            viewport,
            interaction,
            previous,
            Some(engine as &dyn MapEngine),
        );

        self.poll();
        Some(bounds)
    }

    /// Apply a finished icon load to the engine, if one is ready.
    pub fn poll(&mut self) -> RegistrationState {
        let engine = self.engine.as_mut().map(|e| e as &mut dyn MapEngine);
        self.icons.poll(engine)
    }

    /// Wait for the current icon load to finish and apply it.
    pub async fn settle(&mut self) -> RegistrationState {
        let engine = self.engine.as_mut().map(|e| e as &mut dyn MapEngine);
        self.icons.settle(engine).await
    }

    /// Visible geographic box, zeroed while unmounted.
    #[must_use]
    pub fn geo_bounds(&self) -> GeoBounds {
        compute_bounds(self.engine.as_ref().map(|e| e as &dyn MapEngine))
    }

    /// Render the overlay (when visible) and the aircraft layer.
    pub fn render(&mut self, layer: &mut dyn AircraftLayer, overlay: &mut dyn SelectionOverlay) {
        if self.engine.is_none() {
            debug!("Skipping render, surface is not mounted");
            return;
        }

        self.poll();

        if self.overlay_visible {
            overlay.render(self.selected_aircraft.as_ref());
        }

        layer.render(&AircraftLayerProps {
            state_vectors: &self.state_vectors,
            zoom: self.viewport.zoom(),
            selected_aircraft: self.selected_aircraft.as_ref(),
            icon_name: &self.icons.spec().name,
        });
    }

    /// Camera and capabilities to mount an engine with.
    ///
    /// Defaults from the configuration, overridden by the last reported
    /// viewport.
    #[must_use]
    pub fn view_settings(&self) -> ViewSettings {
        let (latitude, longitude, zoom, pitch, bearing) = match self.viewport.viewport() {
            Some(v) => (v.latitude, v.longitude, v.zoom, v.pitch, v.bearing),
            None => (
                self.config.default_latitude,
                self.config.default_longitude,
                self.config.default_zoom,
                0.0,
                0.0,
            ),
        };

        ViewSettings {
            latitude,
            longitude,
            zoom,
            pitch,
            bearing,
            interaction: self.config.interaction,
            map_style: self.config.map_style.clone(),
            access_token: self.config.access_token.clone(),
        }
    }

    pub fn set_state_vectors(&mut self, state_vectors: StateVectors) {
        self.state_vectors = state_vectors;
    }

    pub fn set_selected_aircraft(&mut self, selected_aircraft: Option<AircraftTrack>) {
        self.selected_aircraft = selected_aircraft;
    }

    #[must_use]
    pub fn state(&self) -> SurfaceState {
        match (&self.engine, &self.selected_icao24) {
            (None, _) => SurfaceState::Unmounted,
            (Some(_), None) => SurfaceState::MountedNoSelection,
            (Some(_), Some(_)) => SurfaceState::MountedSelected,
        }
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.engine.is_some()
    }

    #[must_use]
    pub fn is_overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    /// Last id resolved from a click during this mount.
    #[must_use]
    pub fn selected_icao24(&self) -> Option<&str> {
        self.selected_icao24.as_deref()
    }

    #[must_use]
    pub fn selected_aircraft(&self) -> Option<&AircraftTrack> {
        self.selected_aircraft.as_ref()
    }

    #[must_use]
    pub fn state_vectors(&self) -> &StateVectors {
        &self.state_vectors
    }

    #[must_use]
    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.viewport()
    }

    #[must_use]
    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    /// Mutable engine access for hosts that drive the camera directly.
    pub fn engine_mut(&mut self) -> Option<&mut E> {
        self.engine.as_mut()
    }

    #[must_use]
    pub fn icon_state(&self) -> RegistrationState {
        self.icons.state()
    }

    /// Icon load attempts across all mounts.
    #[must_use]
    pub fn icon_attempts(&self) -> u32 {
        self.icons.attempts()
    }
}
