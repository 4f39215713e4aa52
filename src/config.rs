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

//! Application configuration management.
//!
//! Persistent settings are stored in TOML via confy. The map access token can
//! come from the config file, but the environment variable takes precedence.

use map_surface::surface::{DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DEFAULT_MAP_STYLE, DEFAULT_ZOOM};
use map_surface::{IconAsset, SurfaceConfig};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "flightmap";
const CONFIG_NAME: &str = "config";

/// Environment variable holding the map provider access token
pub const ACCESS_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Initial map zoom level (0.0 - 20.0)
    #[serde(default = "default_zoom")]
    pub default_zoom: f64,

    /// Initial map center latitude
    #[serde(default = "default_latitude")]
    pub default_latitude: f64,

    /// Initial map center longitude
    #[serde(default = "default_longitude")]
    pub default_longitude: f64,

    /// Basemap style URL
    #[serde(default = "default_map_style")]
    pub map_style: String,

    /// Aircraft icon SVG, as a file path or http(s) URL. Bundled icon when unset.
    #[serde(default)]
    pub icon_source: Option<String>,

    /// Map provider access token (optional, env var takes precedence)
    #[serde(default)]
    pub mapbox_access_token: Option<String>,

    /// Headless canvas width in pixels
    #[serde(default = "default_canvas_width")]
    pub canvas_width: f64,

    /// Headless canvas height in pixels
    #[serde(default = "default_canvas_height")]
    pub canvas_height: f64,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_zoom() -> f64 {
    DEFAULT_ZOOM
}

fn default_latitude() -> f64 {
    DEFAULT_LATITUDE
}

fn default_longitude() -> f64 {
    DEFAULT_LONGITUDE
}

fn default_map_style() -> String {
    DEFAULT_MAP_STYLE.to_string()
}

fn default_canvas_width() -> f64 {
    1280.0
}

fn default_canvas_height() -> f64 {
    800.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            default_zoom: default_zoom(),
            default_latitude: default_latitude(),
            default_longitude: default_longitude(),
            map_style: default_map_style(),
            icon_source: None,
            mapbox_access_token: None,
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating it with defaults if missing
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Resolve the access token from the process environment, then the file
    pub fn access_token(&self) -> Option<String> {
        self.access_token_with(std::env::var(ACCESS_TOKEN_ENV).ok())
    }

    fn access_token_with(&self, env_token: Option<String>) -> Option<String> {
        env_token
            .filter(|token| !token.is_empty())
            .or_else(|| self.mapbox_access_token.clone())
            .filter(|token| !token.is_empty())
    }

    /// Build the surface configuration for this app
    pub fn surface_config(&self) -> SurfaceConfig {
        SurfaceConfig {
            default_zoom: self.default_zoom,
            default_latitude: self.default_latitude,
            default_longitude: self.default_longitude,
            map_style: self.map_style.clone(),
            access_token: self.access_token(),
            icon_asset: self
                .icon_source
                .as_deref()
                .map_or_else(IconAsset::aircraft, IconAsset::from_source),
            ..SurfaceConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: AppConfig = serde_json::from_str(r#"{"default_zoom": 6.5}"#).unwrap();
        assert!((config.default_zoom - 6.5).abs() < f64::EPSILON);
        assert!((config.default_latitude - DEFAULT_LATITUDE).abs() < f64::EPSILON);
        assert_eq!(config.map_style, DEFAULT_MAP_STYLE);
        assert!(config.icon_source.is_none());
    }

    #[test]
    fn test_env_token_takes_precedence() {
        let config = AppConfig {
            mapbox_access_token: Some("pk.from-file".to_string()),
            ..AppConfig::default()
        };

        assert_eq!(
            config.access_token_with(Some("pk.from-env".to_string())).as_deref(),
            Some("pk.from-env")
        );
        assert_eq!(config.access_token_with(None).as_deref(), Some("pk.from-file"));
        assert_eq!(
            config.access_token_with(Some(String::new())).as_deref(),
            Some("pk.from-file")
        );
        assert_eq!(AppConfig::default().access_token_with(None), None);
    }

    #[test]
    fn test_surface_config_icon_source() {
        let config = AppConfig {
            icon_source: Some("https://example.com/plane.svg".to_string()),
            default_zoom: 9.0,
            ..AppConfig::default()
        };

        let surface = config.surface_config();
        assert!((surface.default_zoom - 9.0).abs() < f64::EPSILON);
        assert_eq!(
            surface.icon_asset,
            IconAsset::Url("https://example.com/plane.svg".to_string())
        );
        assert_eq!(AppConfig::default().surface_config().icon_asset, IconAsset::aircraft());
    }
}
