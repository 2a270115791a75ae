use serde::{Deserialize, Serialize};

use crate::math::Bounds3;

/// The volume to photograph plus the image-overlap requirements.
/// Overlaps are percentages in [0, 100).
#[derive(Debug, Clone, Copy)]
pub struct SurveyArea {
    pub area_to_cover: Bounds3,
    pub frontal_overlap: i32,
    pub side_overlap: i32,
}

impl SurveyArea {
    pub fn new(area_to_cover: Bounds3, frontal_overlap: i32, side_overlap: i32) -> Self {
        Self { area_to_cover, frontal_overlap, side_overlap }
    }
}

/// Optical characteristics of the simulated camera. Focal length and sensor
/// sizes are millimeters, resolutions are pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CameraDefinition {
    pub focal_length: f64,
    pub sensor_size_x: f64,
    pub sensor_size_y: f64,
    pub resolution_x: u32,
    pub resolution_y: u32,
}

impl CameraDefinition {
    /// Ground footprint (width, height) in meters at the given altitude
    /// above ground, by similar triangles.
    pub fn footprint(&self, altitude: f64) -> (f64, f64) {
        (
            altitude * self.sensor_size_x / self.focal_length,
            altitude * self.sensor_size_y / self.focal_length,
        )
    }
}
