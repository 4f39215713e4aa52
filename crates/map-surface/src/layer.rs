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

//! Rendering collaborators driven by the surface.

use crate::aircraft::{AircraftTrack, StateVectors};

/// Inputs for the aircraft layer on each render.
#[derive(Debug, Clone, Copy)]
pub struct AircraftLayerProps<'a> {
    pub state_vectors: &'a StateVectors,
    /// Current zoom, unset until the first viewport change.
    pub zoom: Option<f64>,
    pub selected_aircraft: Option<&'a AircraftTrack>,
    /// Registry name of the aircraft icon. It may not be registered yet.
    pub icon_name: &'a str,
}

/// Builds aircraft geometry and icons from state vectors.
///
/// Implementations must cope with the icon not being registered yet.
pub trait AircraftLayer {
    fn render(&mut self, props: &AircraftLayerProps<'_>);
}

/// Shows details of the selected aircraft. Only rendered once visible.
pub trait SelectionOverlay {
    fn render(&mut self, selected_aircraft: Option<&AircraftTrack>);
}
