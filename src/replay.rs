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

//! Scripted map sessions against a headless engine.
//!
//! A script is a JSON array of steps. Each step plays the part of the map
//! engine (load, camera moves, clicks) or of the host (render, unmount), and
//! the session records what the surface reported back.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};
use map_surface::{
    AircraftLayer, AircraftLayerProps, AircraftTrack, Feature, GeoBounds, HeadlessEngine,
    InteractionState, LngLat, MapEvent, MapSurface, PointerEvent, RegistrationState,
    SelectionOverlay, StateVectors, SurfaceConfig, Viewport,
};
use serde::{Deserialize, Serialize};

/// One step of a session script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Engine finished loading with a canvas of the given size.
    Load {
        #[serde(default)]
        width: Option<f64>,
        #[serde(default)]
        height: Option<f64>,
    },
    /// Camera moved (gesture or fly-to).
    Viewport {
        viewport: Viewport,
        #[serde(default)]
        interaction: InteractionState,
    },
    /// Pointer click with the engine's hit-tested features.
    Click {
        #[serde(default)]
        features: Vec<Feature>,
    },
    /// Wait for the icon load to finish.
    Settle,
    /// Host render pass.
    Render,
    /// Tear the surface down.
    Unmount,
}

/// Parse a session script.
pub fn parse_script(json: &str) -> Result<Vec<Step>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Viewport notification as received by the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapChange {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub bounds: GeoBounds,
}

/// What the surface reported over a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub map_changes: Vec<MapChange>,
    pub selections: Vec<String>,
    pub overlay_renders: usize,
    /// Aircraft inside the visible box on each layer render.
    pub visible_aircraft: Vec<usize>,
    pub overlay_visible: bool,
    pub icon_state: String,
    pub final_bounds: GeoBounds,
}

/// Host-side recorder shared with the surface callbacks.
#[derive(Debug, Default)]
struct HostLog {
    map_changes: Vec<MapChange>,
    selections: Vec<String>,
    pending_selection: Option<String>,
}

/// Aircraft layer that counts what it would draw.
#[derive(Debug, Default)]
struct CountingLayer {
    bounds: GeoBounds,
    visible: Vec<usize>,
}

impl AircraftLayer for CountingLayer {
    fn render(&mut self, props: &AircraftLayerProps<'_>) {
        let visible = props.state_vectors.within(&self.bounds).count();
        debug!(
            "Aircraft layer: {} of {} aircraft visible at zoom {:?}, selected {:?}",
            visible,
            props.state_vectors.len(),
            props.zoom,
            props.selected_aircraft.map(|a| a.icao24.as_str())
        );
        self.visible.push(visible);
    }
}

/// Overlay that logs the selected aircraft.
#[derive(Debug, Default)]
struct LoggingOverlay {
    renders: usize,
}

impl SelectionOverlay for LoggingOverlay {
    fn render(&mut self, selected_aircraft: Option<&AircraftTrack>) {
        self.renders += 1;
        match selected_aircraft {
            Some(track) => info!(
                "Overlay: {} {}",
                track.icao24,
                track.callsign.as_deref().unwrap_or("-")
            ),
            None => info!("Overlay: no aircraft details yet"),
        }
    }
}

/// A surface on a headless engine, driven step by step.
#[derive(Debug)]
pub struct Session {
    surface: MapSurface<HeadlessEngine>,
    host: Rc<RefCell<HostLog>>,
    layer: CountingLayer,
    overlay: LoggingOverlay,
    canvas: (f64, f64),
}

impl Session {
    pub fn new(config: SurfaceConfig, state_vectors: StateVectors, canvas: (f64, f64)) -> Self {
        let host = Rc::new(RefCell::new(HostLog::default()));

        let mut surface = MapSurface::new(config);
        surface.set_state_vectors(state_vectors);

        let changes = Rc::clone(&host);
        surface.on_map_change(move |viewport, bounds| {
            info!(
                "Map changed: {:.4}, {:.4} zoom {:.2} -> N {:.4} E {:.4} S {:.4} W {:.4}",
                viewport.latitude,
                viewport.longitude,
                viewport.zoom,
                bounds.northern_latitude,
                bounds.eastern_longitude,
                bounds.southern_latitude,
                bounds.western_longitude
            );
            changes.borrow_mut().map_changes.push(MapChange {
                latitude: viewport.latitude,
                longitude: viewport.longitude,
                zoom: viewport.zoom,
                bounds: *bounds,
            });
        });

        let selections = Rc::clone(&host);
        surface.on_aircraft_select(move |icao24| {
            let mut host = selections.borrow_mut();
            host.selections.push(icao24.to_string());
            host.pending_selection = Some(icao24.to_string());
        });

        Self {
            surface,
            host,
            layer: CountingLayer::default(),
            overlay: LoggingOverlay::default(),
            canvas,
        }
    }

    /// Play a single step.
    pub async fn apply(&mut self, step: Step) {
        match step {
            Step::Load { width, height } => {
                let settings = self.surface.view_settings();
                let engine = HeadlessEngine::new(
                    LngLat::new(settings.longitude, settings.latitude),
                    settings.zoom,
                    width.unwrap_or(self.canvas.0),
                    height.unwrap_or(self.canvas.1),
                );
                self.surface.mount(engine);
            }
            Step::Viewport {
                viewport,
                interaction,
            } => {
                let previous = self.surface.viewport().cloned();
                if let Some(engine) = self.surface.engine_mut() {
                    engine.set_camera(&viewport);
                }
                self.surface.dispatch(MapEvent::ViewportChange {
                    viewport,
                    interaction,
                    previous,
                });
            }
            Step::Click { features } => {
                self.surface
                    .dispatch(MapEvent::Click(PointerEvent::with_features(features)));
                self.follow_selection();
            }
            Step::Settle => {
                let state = self.surface.settle().await;
                info!("Icon registration: {:?}", state);
            }
            Step::Render => {
                self.layer.bounds = self.surface.geo_bounds();
                self.surface.render(&mut self.layer, &mut self.overlay);
            }
            Step::Unmount => {
                self.surface.unmount();
            }
        }
    }

    /// Play all steps and summarize.
    pub async fn run(&mut self, steps: Vec<Step>) -> SessionReport {
        for step in steps {
            debug!("Step: {:?}", step);
            self.apply(step).await;
        }
        self.report()
    }

    /// Feed a fresh selection back as the selected aircraft, like a host
    /// fetching the track for the clicked id.
    fn follow_selection(&mut self) {
        let Some(icao24) = self.host.borrow_mut().pending_selection.take() else {
            return;
        };

        let track = self
            .surface
            .state_vectors()
            .get_by_icao24(&icao24)
            .map(AircraftTrack::from_state_vector);
        if track.is_none() {
            debug!("No state vector for {}, overlay has no details", icao24);
        }
        self.surface.set_selected_aircraft(track);
    }

    pub fn report(&self) -> SessionReport {
        let host = self.host.borrow();
        SessionReport {
            map_changes: host.map_changes.clone(),
            selections: host.selections.clone(),
            overlay_renders: self.overlay.renders,
            visible_aircraft: self.layer.visible.clone(),
            overlay_visible: self.surface.is_overlay_visible(),
            icon_state: format!("{:?}", self.surface.icon_state()),
            final_bounds: self.surface.geo_bounds(),
        }
    }

    pub fn icon_state(&self) -> RegistrationState {
        self.surface.icon_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: &str = r#"{
        "time": 1700000000,
        "states": [
            {"icao24": "484506", "callsign": "KLM1023 ", "lastContact": 1699999995,
             "longitude": 4.76, "latitude": 52.31, "baroAltitude": 3200.0},
            {"icao24": "4ca7b5", "callsign": "RYR5AB", "lastContact": 1699999995,
             "longitude": -6.27, "latitude": 53.42, "baroAltitude": 10500.0}
        ]
    }"#;

    const SCRIPT: &str = r#"[
        {"step": "render"},
        {"step": "load", "width": 1024, "height": 768},
        {"step": "click", "features": []},
        {"step": "viewport", "viewport": {"latitude": 52.3, "longitude": 4.8, "zoom": 8.0},
         "interaction": {"isPanning": true}},
        {"step": "render"},
        {"step": "click", "features": [{"layer": "aircraft", "properties": {"icao24": "484506"}}]},
        {"step": "settle"},
        {"step": "viewport", "viewport": {"latitude": 52.3, "longitude": 4.8, "zoom": 9.0}},
        {"step": "render"}
    ]"#;

    fn session() -> Session {
        let states: StateVectors = serde_json::from_str(STATES).unwrap();
        Session::new(SurfaceConfig::default(), states, (1280.0, 800.0))
    }

    #[test]
    fn test_parse_script() {
        let steps = parse_script(SCRIPT).unwrap();
        assert_eq!(steps.len(), 9);
        assert_eq!(steps[0], Step::Render);
        assert_eq!(
            steps[1],
            Step::Load {
                width: Some(1024.0),
                height: Some(768.0)
            }
        );
        assert!(matches!(
            &steps[3],
            Step::Viewport { interaction, .. } if interaction.is_panning
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_step() {
        assert!(parse_script(r#"[{"step": "teleport"}]"#).is_err());
    }

    #[tokio::test]
    async fn test_full_session() {
        let mut session = session();
        let report = session.run(parse_script(SCRIPT).unwrap()).await;

        assert_eq!(report.selections, vec!["484506".to_string()]);
        assert!(report.overlay_visible);
        assert_eq!(report.overlay_renders, 1);
        assert_eq!(session.icon_state(), RegistrationState::Registered);

        // Render before load draws nothing; Amsterdam is visible, Dublin is not
        assert_eq!(report.visible_aircraft, vec![1, 1]);

        assert_eq!(report.map_changes.len(), 2);
        let first = &report.map_changes[0];
        assert!(first.bounds.contains(52.3, 4.8));
        assert!(first.bounds.northern_latitude >= first.bounds.southern_latitude);
        assert_eq!(report.final_bounds, report.map_changes[1].bounds);
    }

    #[tokio::test]
    async fn test_selection_feeds_back_track() {
        let mut session = session();
        session
            .apply(Step::Load {
                width: None,
                height: None,
            })
            .await;
        session
            .apply(Step::Click {
                features: vec![Feature::with_property("icao24", "4ca7b5")],
            })
            .await;

        let selected = session.surface.selected_aircraft().unwrap();
        assert_eq!(selected.icao24, "4ca7b5");
        assert_eq!(selected.callsign.as_deref(), Some("RYR5AB"));
    }

    #[tokio::test]
    async fn test_unmount_resets_bounds() {
        let mut session = session();
        let report = session
            .run(vec![
                Step::Load {
                    width: None,
                    height: None,
                },
                Step::Unmount,
                Step::Click {
                    features: vec![Feature::with_property("icao24", "484506")],
                },
            ])
            .await;

        assert!(report.selections.is_empty());
        assert_eq!(report.final_bounds, GeoBounds::ZERO);
        assert_eq!(report.icon_state, "Abandoned");
    }
}
