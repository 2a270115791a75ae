use anyhow::{Context, Result};
use glam::DVec3;
use serde::Deserialize;
use thiserror::Error;

use crate::geo::{Georeferencing, Hemisphere};
use crate::math::Bounds3;
use crate::planner::{DoubleGridMission, GridMission, Mission};
use crate::survey::{CameraDefinition, SurveyArea};
use crate::terrain::Terrain;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown mission type `{0}`, expected `grid` or `double_grid`")]
    UnknownMissionType(String),
    #[error("{name} overlap must be in [0, 100), got {value}")]
    InvalidOverlap { name: &'static str, value: i32 },
    #[error("UTM zone must be in 1..=60, got {0}")]
    InvalidUtmZone(u8),
    #[error("survey area extents must be positive, got {0} x {1} x {2}")]
    NonPositiveExtents(f64, f64, f64),
    #[error("ground sample distance must be positive, got {0}")]
    NonPositiveGsd(f64),
    #[error("camera {name} must be positive, got {value}")]
    NonPositiveCamera { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SurveyAreaConfig {
    pub width: f64,
    pub distance: f64,
    pub height: f64,
    pub frontal_overlap: i32,
    pub side_overlap: i32,
    /// Center the covered area on the coordinate origin instead of on the
    /// terrain's bounding volume.
    #[serde(default)]
    pub use_coordinate_origin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlightConfig {
    pub mission_type: String,
    /// Cruise speed in m/s and body rotation rate in degrees per second.
    pub speed: f64,
    pub rotation_speed: f64,
    pub altitude1: f64,
    pub camera_angle1: f64,
    pub altitude2: Option<f64>,
    pub camera_angle2: Option<f64>,
    #[serde(default)]
    pub start_position: [f64; 3],
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeoreferencingConfig {
    pub center_easting: f64,
    pub center_northing: f64,
    pub utm_zone: u8,
    pub hemisphere: Hemisphere,
    pub dilution_of_precision: f64,
    #[serde(default)]
    pub noise_seed: u64,
    #[serde(default)]
    pub max_noise: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplingConfig {
    /// Ground sample distance in centimeters per cell.
    pub gsd: f64,
    pub area_width: f64,
    pub area_distance: f64,
    #[serde(default)]
    pub export_arrays: bool,
    /// Which sampling tools to run, in order: `elevation`, `segmentation`,
    /// `tree_crowns`.
    #[serde(default)]
    pub tools: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub folder: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub terrain: String,
    pub survey_area: SurveyAreaConfig,
    pub camera: CameraDefinition,
    pub flight: FlightConfig,
    pub georeferencing: GeoreferencingConfig,
    pub sampling: Option<SamplingConfig>,
    pub output: OutputConfig,
}

pub fn load_config(path: &str) -> Result<Config> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {path}"))?;
    let reader = std::io::BufReader::new(file);
    let config: Config = serde_json::from_reader(reader)?;
    Ok(config)
}

/// The covered volume, centered either on the terrain or on the coordinate
/// origin with its floor at altitude zero.
pub fn build_survey_area(
    config: &SurveyAreaConfig,
    terrain: &Terrain,
) -> Result<SurveyArea, ConfigError> {
    if config.width <= 0.0 || config.height <= 0.0 || config.distance <= 0.0 {
        return Err(ConfigError::NonPositiveExtents(config.width, config.height, config.distance));
    }
    for (name, value) in
        [("frontal", config.frontal_overlap), ("side", config.side_overlap)]
    {
        if !(0..100).contains(&value) {
            return Err(ConfigError::InvalidOverlap { name, value });
        }
    }

    let center = if config.use_coordinate_origin {
        DVec3::new(0.0, config.height / 2.0, 0.0)
    } else {
        let terrain_center = terrain.bounds().center;
        DVec3::new(terrain_center.x, terrain.position.y + config.height / 2.0, terrain_center.z)
    };
    let size = DVec3::new(config.width, config.height, config.distance);
    Ok(SurveyArea::new(
        Bounds3::new(center, size),
        config.frontal_overlap,
        config.side_overlap,
    ))
}

pub fn build_georeferencing(
    config: &GeoreferencingConfig,
    survey_area: &SurveyArea,
) -> Result<Georeferencing, ConfigError> {
    if !(1..=60).contains(&config.utm_zone) {
        return Err(ConfigError::InvalidUtmZone(config.utm_zone));
    }
    Ok(Georeferencing::new(
        config.center_easting,
        config.center_northing,
        config.utm_zone,
        config.hemisphere,
        config.dilution_of_precision,
        config.noise_seed,
        config.max_noise,
        survey_area,
    ))
}

/// A zero or negative camera parameter would poison every footprint and
/// projection computation downstream.
pub fn validate_camera(camera: &CameraDefinition) -> Result<(), ConfigError> {
    for (name, value) in [
        ("focal_length", camera.focal_length),
        ("sensor_size_x", camera.sensor_size_x),
        ("sensor_size_y", camera.sensor_size_y),
        ("resolution_x", f64::from(camera.resolution_x)),
        ("resolution_y", f64::from(camera.resolution_y)),
    ] {
        if value <= 0.0 {
            return Err(ConfigError::NonPositiveCamera { name, value });
        }
    }
    Ok(())
}

/// A non-positive cell size would degenerate the casting grid dimensions.
pub fn validate_sampling(config: &SamplingConfig) -> Result<(), ConfigError> {
    if config.gsd <= 0.0 {
        return Err(ConfigError::NonPositiveGsd(config.gsd));
    }
    Ok(())
}

pub fn build_mission(
    config: &FlightConfig,
    survey_area: SurveyArea,
    camera: CameraDefinition,
) -> Result<Mission, ConfigError> {
    validate_camera(&camera)?;
    match config.mission_type.as_str() {
        "grid" => Ok(Mission::Grid(GridMission::new(
            survey_area,
            camera,
            config.altitude1,
            config.camera_angle1,
        ))),
        "double_grid" => Ok(Mission::DoubleGrid(DoubleGridMission::new(
            survey_area,
            camera,
            config.altitude1,
            config.camera_angle1,
            config.altitude2.unwrap_or(config.altitude1),
            config.camera_angle2.unwrap_or(config.camera_angle1),
        ))),
        other => Err(ConfigError::UnknownMissionType(other.to_string())),
    }
}
