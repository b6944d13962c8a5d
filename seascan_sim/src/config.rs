// seascan_sim/src/config.rs

//! Loading and validating the scenario configuration from disk.

use figment::{
    providers::{Format, Toml},
    Figment,
};
use seascan_core::prelude::SideScanSonarConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level scenario file layout. Every section falls back to its defaults
/// when omitted, so an empty file is a valid (if dull) survey.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub run: RunConfig,
    pub sensor: SideScanSonarConfig,
    pub scene: SceneConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of simulation ticks (= waterfall rows produced).
    pub ticks: u64,
    /// Master seed for the procedural scene.
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ticks: 720,
            seed: 2024,
        }
    }
}

/// Parameters of the procedural survey scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Depth of the seabed below the sensor, meters.
    pub seafloor_depth: f32,
    /// Amplitude of the sand-ripple perturbation, meters.
    pub ripple_amplitude: f32,
    /// Wavelength of the sand ripples, meters.
    pub ripple_wavelength: f32,
    /// Points sampled per tick across the swath.
    pub points_per_tick: usize,
    /// Cross-track distance from the track to the near edge of the swath.
    pub swath_offset: f32,
    /// Cross-track extent of the swath, meters.
    pub swath_width: f32,
    /// Along-track sensor advance per tick, meters.
    pub tow_speed: f32,
    /// Reflectivity of the bare seabed material.
    pub seabed_reflectivity: f32,
    pub targets: Vec<TargetConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seafloor_depth: 5.0,
            ripple_amplitude: 0.08,
            ripple_wavelength: 1.2,
            points_per_tick: 20_000,
            swath_offset: 6.5,
            swath_width: 2.5,
            tow_speed: 0.05,
            seabed_reflectivity: 0.35,
            targets: vec![
                TargetConfig {
                    along_track: 12.0,
                    cross_track: 7.2,
                    radius: 0.6,
                    reflectivity: 0.95,
                },
                TargetConfig {
                    along_track: 24.0,
                    cross_track: 8.1,
                    radius: 0.4,
                    reflectivity: 0.85,
                },
            ],
        }
    }
}

/// A high-reflectivity object resting on the seabed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub along_track: f32,
    pub cross_track: f32,
    pub radius: f32,
    pub reflectivity: f32,
}

/// Loads a scenario TOML. A missing file yields the defaults.
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig, figment::Error> {
    Figment::new().merge(Toml::file(path)).extract()
}
