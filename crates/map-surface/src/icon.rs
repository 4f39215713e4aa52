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

//! Aircraft icon loading, rasterization and registration.
//!
//! The icon is an SVG asset rasterized with resvg and registered in the
//! engine's image registry as a signed distance field, so the aircraft layer
//! can recolor it. Loading runs in a background task tied to the mount; the
//! result is applied from the surface's own event loop via [`IconRegistrar::poll`]
//! and only while an engine handle is still present.
//!
//! Failures never reach the host. They are logged and leave the registrar in
//! [`RegistrationState::Failed`].

use std::path::PathBuf;

use image::RgbaImage;
use log::{debug, error, info, warn};
use resvg::tiny_skia;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::engine::{EngineError, ImageOptions, MapEngine};

/// Registry name the aircraft layer references.
pub const AIRCRAFT_ICON_NAME: &str = "aircraft-icon";

/// Raster size of the aircraft icon in pixels.
pub const AIRCRAFT_ICON_SIZE: u32 = 24;

/// Material "airplanemode_active" glyph.
const EMBEDDED_AIRCRAFT_ICON: &[u8] = include_bytes!("../assets/airplanemode_active-24px.svg");

/// Errors that can occur while producing or registering an icon.
#[derive(Debug, Error)]
pub enum IconError {
    #[error("failed to read icon asset: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to fetch icon asset: {0}")]
    Http(#[from] reqwest::Error),

    #[error("icon asset request returned HTTP {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("invalid SVG: {0}")]
    Svg(#[from] usvg::Error),

    #[error("cannot rasterize to {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("engine rejected icon: {0}")]
    Engine(#[from] EngineError),

    #[error("no async runtime available to load the icon")]
    NoRuntime,
}

/// Where the icon's SVG comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconAsset {
    /// SVG bytes compiled into the binary.
    Embedded(&'static [u8]),
    /// SVG file on disk.
    File(PathBuf),
    /// SVG fetched over HTTP(S).
    Url(String),
}

impl Default for IconAsset {
    fn default() -> Self {
        Self::aircraft()
    }
}

impl IconAsset {
    /// The bundled aircraft glyph.
    #[must_use]
    pub fn aircraft() -> Self {
        Self::Embedded(EMBEDDED_AIRCRAFT_ICON)
    }

    /// Interpret a configured source: URLs for `http(s)://`, file paths otherwise.
    #[must_use]
    pub fn from_source(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::Url(source.to_string())
        } else {
            Self::File(PathBuf::from(source))
        }
    }

    /// Read the raw SVG bytes.
    pub async fn load(&self) -> Result<Vec<u8>, IconError> {
        match self {
            IconAsset::Embedded(bytes) => Ok(bytes.to_vec()),
            IconAsset::File(path) => Ok(tokio::fs::read(path).await?),
            IconAsset::Url(url) => {
                let response = reqwest::get(url).await?;
                if !response.status().is_success() {
                    return Err(IconError::HttpStatus(response.status()));
                }
                Ok(response.bytes().await?.to_vec())
            }
        }
    }
}

/// How the rasterized icon is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub sdf: bool,
}

impl Default for IconSpec {
    fn default() -> Self {
        Self {
            name: AIRCRAFT_ICON_NAME.to_string(),
            width: AIRCRAFT_ICON_SIZE,
            height: AIRCRAFT_ICON_SIZE,
            sdf: true,
        }
    }
}

/// Rasterize SVG data to a straight-alpha RGBA image of the given size.
pub fn rasterize_svg(svg: &[u8], width: u32, height: u32) -> Result<RgbaImage, IconError> {
    let tree = usvg::Tree::from_data(svg, &usvg::Options::default())?;
    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(IconError::InvalidSize { width, height })?;

    let size = tree.size();
    let transform = tiny_skia::Transform::from_scale(
        width as f32 / size.width(),
        height as f32 / size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    // tiny-skia stores premultiplied alpha
    let pixels: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let color = pixel.demultiply();
            [color.red(), color.green(), color.blue(), color.alpha()]
        })
        .collect();

    RgbaImage::from_raw(width, height, pixels).ok_or(IconError::InvalidSize { width, height })
}

async fn load_icon(asset: IconAsset, width: u32, height: u32) -> Result<RgbaImage, IconError> {
    let svg = asset.load().await?;
    rasterize_svg(&svg, width, height)
}

/// Progress of the icon registration for the current mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    /// Nothing started for this mount.
    Idle,
    /// Load task running.
    Loading,
    /// Icon is in the engine's registry.
    Registered,
    /// Load, rasterization or registration failed. Not retried.
    Failed,
    /// The mount ended before the icon could be applied.
    Abandoned,
}

/// Background load task. Dropping it cancels the task.
struct IconTask {
    result_rx: oneshot::Receiver<Result<RgbaImage, IconError>>,
    cancel_token: CancellationToken,
}

impl Drop for IconTask {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

/// Loads the aircraft icon once per mount and registers it with the engine.
pub struct IconRegistrar {
    asset: IconAsset,
    spec: IconSpec,
    state: RegistrationState,
    attempts: u32,
    task: Option<IconTask>,
}

impl std::fmt::Debug for IconRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconRegistrar")
            .field("spec", &self.spec)
            .field("state", &self.state)
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

impl Default for IconRegistrar {
    fn default() -> Self {
        Self::new(IconAsset::aircraft(), IconSpec::default())
    }
}

impl IconRegistrar {
    #[must_use]
    pub fn new(asset: IconAsset, spec: IconSpec) -> Self {
        Self {
            asset,
            spec,
            state: RegistrationState::Idle,
            attempts: 0,
            task: None,
        }
    }

    /// Start loading the icon for the current mount.
    ///
    /// Only the first call per mount starts a task; later calls are ignored
    /// until [`reset`](Self::reset). Returns whether a task was started.
    pub fn start(&mut self) -> bool {
        if self.state != RegistrationState::Idle {
            debug!(
                "Icon '{}' already {:?} for this mount, not loading again",
                self.spec.name, self.state
            );
            return false;
        }

        self.attempts += 1;

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(
                    "Cannot load icon '{}': {} ({})",
                    self.spec.name,
                    IconError::NoRuntime,
                    e
                );
                self.state = RegistrationState::Failed;
                return false;
            }
        };

        let (result_tx, result_rx) = oneshot::channel();
        let cancel_token = CancellationToken::new();

        let task_cancel = cancel_token.clone();
        let asset = self.asset.clone();
        let name = self.spec.name.clone();
        let (width, height) = (self.spec.width, self.spec.height);

        runtime.spawn(async move {
            tokio::select! {
                () = task_cancel.cancelled() => {
                    debug!("Icon '{}' load cancelled", name);
                }
                result = load_icon(asset, width, height) => {
                    if result_tx.send(result).is_err() {
                        debug!("Icon '{}' finished after its mount ended", name);
                    }
                }
            }
        });

        debug!("Loading icon '{}' from {:?}", self.spec.name, self.asset);
        self.task = Some(IconTask {
            result_rx,
            cancel_token,
        });
        self.state = RegistrationState::Loading;
        true
    }

    /// Apply a finished load, if any, to `engine`. Never blocks.
    pub fn poll(&mut self, engine: Option<&mut dyn MapEngine>) -> RegistrationState {
        let Some(task) = self.task.as_mut() else {
            return self.state;
        };

        let result = match task.result_rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return self.state,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.task = None;
                warn!("Icon '{}' load task ended without a result", self.spec.name);
                self.state = RegistrationState::Failed;
                return self.state;
            }
        };

        self.task = None;
        self.complete(result, engine)
    }

    /// Wait for a running load to finish and apply it to `engine`.
    pub async fn settle(&mut self, engine: Option<&mut dyn MapEngine>) -> RegistrationState {
        let Some(task) = self.task.as_mut() else {
            return self.state;
        };

        let received = (&mut task.result_rx).await;
        self.task = None;

        match received {
            Ok(result) => self.complete(result, engine),
            Err(e) => {
                warn!("Icon '{}' load task ended without a result: {}", self.spec.name, e);
                self.state = RegistrationState::Failed;
                self.state
            }
        }
    }

    fn complete(
        &mut self,
        result: Result<RgbaImage, IconError>,
        engine: Option<&mut dyn MapEngine>,
    ) -> RegistrationState {
        let image = match result {
            Ok(image) => image,
            Err(e) => {
                warn!("Failed to load icon '{}': {}", self.spec.name, e);
                self.state = RegistrationState::Failed;
                return self.state;
            }
        };

        let Some(engine) = engine else {
            warn!(
                "Icon '{}' loaded but no engine is mounted, discarding",
                self.spec.name
            );
            self.state = RegistrationState::Abandoned;
            return self.state;
        };

        if engine.has_image(&self.spec.name) {
            debug!(
                "Icon '{}' already present on engine, keeping it",
                self.spec.name
            );
            self.state = RegistrationState::Registered;
            return self.state;
        }

        let options = ImageOptions { sdf: self.spec.sdf };
        self.state = match engine.add_image(&self.spec.name, image, options) {
            Ok(()) => {
                info!(
                    "Registered icon '{}' ({}x{}, sdf={})",
                    self.spec.name, self.spec.width, self.spec.height, self.spec.sdf
                );
                RegistrationState::Registered
            }
            Err(e) => {
                warn!("{}", IconError::from(e));
                RegistrationState::Failed
            }
        };
        self.state
    }

    /// Abandon a running load. A result that arrives later is dropped.
    pub fn cancel(&mut self) {
        if self.task.take().is_some() {
            info!("Abandoning icon '{}' load, mount ended", self.spec.name);
            self.state = RegistrationState::Abandoned;
        }
    }

    /// Cancel anything running and allow one new attempt (next mount).
    pub fn reset(&mut self) {
        self.cancel();
        self.state = RegistrationState::Idle;
    }

    #[must_use]
    pub fn state(&self) -> RegistrationState {
        self.state
    }

    /// Number of load attempts across all mounts.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn spec(&self) -> &IconSpec {
        &self.spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::HeadlessEngine;
    use crate::geo::LngLat;

    fn engine() -> HeadlessEngine {
        HeadlessEngine::new(LngLat::new(4.5, 50.5), 6.0, 800.0, 600.0)
    }

    #[test]
    fn test_rasterize_embedded_icon() {
        let image = rasterize_svg(EMBEDDED_AIRCRAFT_ICON, 24, 24).unwrap();
        assert_eq!(image.dimensions(), (24, 24));

        // Fuselage is opaque, the corner is empty
        assert_eq!(image.get_pixel(11, 11)[3], 255);
        assert_eq!(image.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_rasterize_scales_to_requested_size() {
        let image = rasterize_svg(EMBEDDED_AIRCRAFT_ICON, 48, 48).unwrap();
        assert_eq!(image.dimensions(), (48, 48));
        assert_eq!(image.get_pixel(23, 23)[3], 255);
    }

    #[test]
    fn test_rasterize_rejects_garbage() {
        let result = rasterize_svg(b"definitely not svg", 24, 24);
        assert!(matches!(result, Err(IconError::Svg(_))));
    }

    #[test]
    fn test_rasterize_rejects_zero_size() {
        let result = rasterize_svg(EMBEDDED_AIRCRAFT_ICON, 0, 24);
        assert!(matches!(result, Err(IconError::InvalidSize { width: 0, height: 24 })));
    }

    #[test]
    fn test_asset_from_source() {
        assert_eq!(
            IconAsset::from_source("https://example.com/plane.svg"),
            IconAsset::Url("https://example.com/plane.svg".to_string())
        );
        assert_eq!(
            IconAsset::from_source("/usr/share/icons/plane.svg"),
            IconAsset::File(PathBuf::from("/usr/share/icons/plane.svg"))
        );
    }

    #[test]
    fn test_start_without_runtime_fails_quietly() {
        let mut registrar = IconRegistrar::default();
        assert!(!registrar.start());
        assert_eq!(registrar.state(), RegistrationState::Failed);
        assert_eq!(registrar.attempts(), 1);
    }

    #[tokio::test]
    async fn test_registers_icon_as_sdf() {
        let mut engine = engine();
        let mut registrar = IconRegistrar::default();

        assert!(registrar.start());
        assert_eq!(registrar.state(), RegistrationState::Loading);

        let state = registrar.settle(Some(&mut engine)).await;
        assert_eq!(state, RegistrationState::Registered);

        let registered = engine.image(AIRCRAFT_ICON_NAME).unwrap();
        assert!(registered.options.sdf);
        assert_eq!(registered.image.dimensions(), (24, 24));
    }

    #[tokio::test]
    async fn test_start_only_once_per_mount() {
        let mut engine = engine();
        let mut registrar = IconRegistrar::default();

        assert!(registrar.start());
        assert!(!registrar.start());
        registrar.settle(Some(&mut engine)).await;
        assert!(!registrar.start());

        assert_eq!(registrar.attempts(), 1);
        assert_eq!(engine.image_count(), 1);
    }

    #[tokio::test]
    async fn test_poll_applies_when_ready() {
        let mut engine = engine();
        let mut registrar = IconRegistrar::default();
        registrar.start();

        let mut state = registrar.poll(Some(&mut engine));
        for _ in 0..100 {
            if state != RegistrationState::Loading {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            state = registrar.poll(Some(&mut engine));
        }

        assert_eq!(state, RegistrationState::Registered);
        assert!(engine.has_image(AIRCRAFT_ICON_NAME));
    }

    #[tokio::test]
    async fn test_missing_file_fails_without_registering() {
        let mut engine = engine();
        let mut registrar = IconRegistrar::new(
            IconAsset::File(PathBuf::from("/nonexistent/aircraft.svg")),
            IconSpec::default(),
        );

        registrar.start();
        let state = registrar.settle(Some(&mut engine)).await;

        assert_eq!(state, RegistrationState::Failed);
        assert!(!engine.has_image(AIRCRAFT_ICON_NAME));
    }

    #[tokio::test]
    async fn test_cancelled_load_is_never_applied() {
        let mut engine = engine();
        let mut registrar = IconRegistrar::default();

        registrar.start();
        registrar.cancel();
        assert_eq!(registrar.state(), RegistrationState::Abandoned);

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(registrar.poll(Some(&mut engine)), RegistrationState::Abandoned);
        assert!(!engine.has_image(AIRCRAFT_ICON_NAME));
    }

    #[tokio::test]
    async fn test_load_without_engine_is_discarded() {
        let mut registrar = IconRegistrar::default();
        registrar.start();
        assert_eq!(registrar.settle(None).await, RegistrationState::Abandoned);
    }

    #[tokio::test]
    async fn test_engine_rejection_is_a_failure() {
        let mut engine = engine();
        engine
            .add_image(AIRCRAFT_ICON_NAME, RgbaImage::new(1, 1), ImageOptions::default())
            .unwrap();

        let mut registrar = IconRegistrar::default();
        registrar.start();
        assert_eq!(
            registrar.settle(Some(&mut engine)).await,
            RegistrationState::Failed
        );
    }

    #[tokio::test]
    async fn test_reset_allows_next_mount() {
        let mut registrar = IconRegistrar::default();
        registrar.start();
        registrar.reset();
        assert_eq!(registrar.state(), RegistrationState::Idle);

        assert!(registrar.start());
        assert_eq!(registrar.attempts(), 2);
    }
}
