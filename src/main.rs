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

mod config;
mod replay;

use std::path::PathBuf;

use clap::Parser;
use config::AppConfig;
use log::{info, warn};
use map_surface::{HeadlessEngine, MapSurface, RegistrationState, StateVectors};
use replay::Session;

/// Replay map sessions against a headless flight map surface
#[derive(Parser, Debug)]
#[command(name = "flightmap", version, about)]
struct Args {
    /// Session script: JSON array of steps
    #[arg(required_unless_present = "print_config")]
    script: Option<PathBuf>,

    /// State vector snapshot (JSON) shown on the map
    #[arg(long)]
    states: Option<PathBuf>,

    /// Initial zoom level
    #[arg(long)]
    zoom: Option<f64>,

    /// Initial center latitude
    #[arg(long, allow_hyphen_values = true)]
    latitude: Option<f64>,

    /// Initial center longitude
    #[arg(long, allow_hyphen_values = true)]
    longitude: Option<f64>,

    /// Aircraft icon SVG (file path or URL)
    #[arg(long)]
    icon: Option<String>,

    /// Persist the command-line overrides to the config file
    #[arg(long)]
    save_config: bool,

    /// Print the config path and effective map settings, then exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(zoom) = self.zoom {
            config.default_zoom = zoom;
        }
        if let Some(latitude) = self.latitude {
            config.default_latitude = latitude;
        }
        if let Some(longitude) = self.longitude {
            config.default_longitude = longitude;
        }
        if let Some(ref icon) = self.icon {
            config.icon_source = Some(icon.clone());
        }
    }
}

fn load_config() -> AppConfig {
    match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load configuration, using defaults: {}", e);
            AppConfig::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = load_config();
    args.apply_overrides(&mut config);

    if args.save_config {
        config.save()?;
        info!("Configuration saved to {}", AppConfig::get_config_path()?.display());
    }

    let surface_config = config.surface_config();
    if surface_config.access_token.is_none() {
        warn!(
            "No map access token set (config or {}), tiles would not load",
            config::ACCESS_TOKEN_ENV
        );
    }

    if args.print_config {
        println!("config: {}", AppConfig::get_config_path()?.display());
        let surface: MapSurface<HeadlessEngine> = MapSurface::new(surface_config);
        println!("{}", serde_json::to_string_pretty(&surface.view_settings())?);
        return Ok(());
    }

    let Some(script_path) = args.script else {
        return Err("no session script given".into());
    };

    let state_vectors: StateVectors = match args.states {
        Some(ref path) => serde_json::from_str(&tokio::fs::read_to_string(path).await?)?,
        None => StateVectors::default(),
    };
    info!("Loaded {} state vectors", state_vectors.len());

    let steps = replay::parse_script(&tokio::fs::read_to_string(&script_path).await?)?;
    info!("Replaying {} steps from {}", steps.len(), script_path.display());

    let mut session = Session::new(
        surface_config,
        state_vectors,
        (config.canvas_width, config.canvas_height),
    );
    let report = session.run(steps).await;

    if session.icon_state() == RegistrationState::Failed {
        warn!("Aircraft icon was not registered, see log above");
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
