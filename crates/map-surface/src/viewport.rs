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

//! Viewport state and change notification.
//!
//! The controller stores the camera last reported by the engine, recomputes the
//! geographic box on every change and forwards both to the host.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::engine::MapEngine;
use crate::geo::{compute_bounds, GeoBounds};

/// Host callback invoked with the new viewport and its geographic box.
pub type MapChangeCallback = Box<dyn FnMut(&Viewport, &GeoBounds)>;

/// Camera description reported by the map engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub bearing: f64,
    /// Engine-specific fields carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Viewport {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, zoom: f64) -> Self {
        Self {
            latitude,
            longitude,
            zoom,
            pitch: 0.0,
            bearing: 0.0,
            extra: serde_json::Map::new(),
        }
    }
}

/// What the user was doing when the viewport changed. Not interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractionState {
    pub in_transition: bool,
    pub is_dragging: bool,
    pub is_panning: bool,
    pub is_rotating: bool,
    pub is_zooming: bool,
}

/// Interaction capabilities requested from the engine at mount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionSettings {
    pub drag_pan: bool,
    pub drag_rotate: bool,
    pub scroll_zoom: bool,
    pub touch_zoom: bool,
    pub touch_rotate: bool,
    pub keyboard: bool,
    pub double_click_zoom: bool,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub min_pitch: f64,
    pub max_pitch: f64,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            drag_pan: true,
            drag_rotate: false,
            scroll_zoom: true,
            touch_zoom: true,
            touch_rotate: true,
            keyboard: true,
            double_click_zoom: true,
            min_zoom: 0.0,
            max_zoom: 20.0,
            min_pitch: 0.0,
            max_pitch: 85.0,
        }
    }
}

/// Owns the current viewport and notifies the host of changes.
#[derive(Default)]
pub struct ViewportController {
    viewport: Option<Viewport>,
    on_change: Option<MapChangeCallback>,
    change_count: u64,
}

impl std::fmt::Debug for ViewportController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportController")
            .field("viewport", &self.viewport)
            .field("has_listener", &self.on_change.is_some())
            .field("change_count", &self.change_count)
            .finish()
    }
}

impl ViewportController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the host listener, replacing any previous one.
    pub fn set_listener(&mut self, listener: MapChangeCallback) {
        self.on_change = Some(listener);
    }

    /// Replace the stored viewport and notify the listener.
    ///
    /// The viewport is stored as given: no range checks and no merge with the
    /// previous value. `previous` mirrors the engine callback and is only
    /// logged. Returns the box that was (or would have been) reported.
    pub fn apply_viewport_change(
        &mut self,
        viewport: Viewport,
        interaction: &InteractionState,
        previous: Option<&Viewport>,
        engine: Option<&dyn MapEngine>,
    ) -> GeoBounds {
        trace!(
            "Viewport change {:?} -> {:?} ({:?})",
            previous.map(|v| (v.latitude, v.longitude, v.zoom)),
            (viewport.latitude, viewport.longitude, viewport.zoom),
            interaction
        );

        self.change_count += 1;
        let bounds = compute_bounds(engine);
        let viewport = self.viewport.insert(viewport);

        match self.on_change.as_mut() {
            Some(listener) => listener(viewport, &bounds),
            None => debug!("No map change listener registered, skipping notification"),
        }

        bounds
    }

    /// Current viewport, unset until the first change.
    #[must_use]
    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    #[must_use]
    pub fn zoom(&self) -> Option<f64> {
        self.viewport.as_ref().map(|v| v.zoom)
    }

    /// Number of changes applied since creation or the last reset.
    #[must_use]
    pub fn change_count(&self) -> u64 {
        self.change_count
    }

    /// Forget the stored viewport. The listener stays registered.
    pub fn reset(&mut self) {
        self.viewport = None;
        self.change_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::HeadlessEngine;
    use crate::geo::LngLat;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_viewport_unset_initially() {
        let controller = ViewportController::new();
        assert!(controller.viewport().is_none());
        assert!(controller.zoom().is_none());
    }

    #[test]
    fn test_change_without_listener_still_updates() {
        let mut controller = ViewportController::new();
        let bounds = controller.apply_viewport_change(
            Viewport::new(50.5, 4.5, 7.0),
            &InteractionState::default(),
            None,
            None,
        );

        assert_eq!(bounds, GeoBounds::ZERO);
        assert_eq!(controller.zoom(), Some(7.0));
        assert_eq!(controller.change_count(), 1);
    }

    #[test]
    fn test_listener_receives_viewport_and_bounds() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut controller = ViewportController::new();
        controller.set_listener(Box::new(move |viewport: &Viewport, bounds: &GeoBounds| {
            sink.borrow_mut().push((viewport.clone(), *bounds));
        }));

        let engine = HeadlessEngine::new(LngLat::new(4.5, 50.5), 7.0, 800.0, 600.0);
        let expected = compute_bounds(Some(&engine));

        controller.apply_viewport_change(
            Viewport::new(50.5, 4.5, 7.0),
            &InteractionState {
                is_dragging: true,
                ..Default::default()
            },
            None,
            Some(&engine),
        );

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, Viewport::new(50.5, 4.5, 7.0));
        assert_eq!(seen[0].1, expected);
    }

    #[test]
    fn test_change_replaces_wholesale() {
        let mut controller = ViewportController::new();
        let mut first = Viewport::new(10.0, 10.0, 3.0);
        first.bearing = 45.0;
        first
            .extra
            .insert("width".to_string(), serde_json::json!(800));

        controller.apply_viewport_change(first.clone(), &InteractionState::default(), None, None);
        controller.apply_viewport_change(
            Viewport::new(-95.0, 400.0, 42.0),
            &InteractionState::default(),
            Some(&first),
            None,
        );

        // Out-of-range values pass through, nothing carried over
        let current = controller.viewport().unwrap();
        assert!((current.latitude + 95.0).abs() < f64::EPSILON);
        assert!((current.longitude - 400.0).abs() < f64::EPSILON);
        assert!(current.bearing.abs() < f64::EPSILON);
        assert!(current.extra.is_empty());
    }

    #[test]
    fn test_reset_keeps_listener() {
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);

        let mut controller = ViewportController::new();
        controller.set_listener(Box::new(move |_, _| *counter.borrow_mut() += 1));
        controller.apply_viewport_change(Viewport::new(0.0, 0.0, 1.0), &InteractionState::default(), None, None);
        controller.reset();

        assert!(controller.viewport().is_none());
        controller.apply_viewport_change(Viewport::new(0.0, 0.0, 2.0), &InteractionState::default(), None, None);
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn test_viewport_keeps_engine_fields() {
        let json = r#"{"latitude":50.0,"longitude":4.0,"zoom":6.5,"width":1024,"height":768}"#;
        let viewport: Viewport = serde_json::from_str(json).unwrap();

        assert!((viewport.zoom - 6.5).abs() < f64::EPSILON);
        assert!(viewport.pitch.abs() < f64::EPSILON);
        assert_eq!(viewport.extra.get("width"), Some(&serde_json::json!(1024)));
    }

    #[test]
    fn test_default_interaction_settings() {
        let settings = InteractionSettings::default();
        assert!(settings.drag_pan);
        assert!(!settings.drag_rotate);
        assert!((settings.max_zoom - 20.0).abs() < f64::EPSILON);
        assert!((settings.max_pitch - 85.0).abs() < f64::EPSILON);
    }
}
