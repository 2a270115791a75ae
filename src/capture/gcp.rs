use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Result;
use glam::DVec3;
use palette::{FromColor, Hsv, Srgb};

use crate::capture::{CameraModel, CapturedImage};
use crate::geo::Georeferencing;
use crate::survey::SurveyArea;
use crate::terrain::Terrain;

/// Accepted hue distance between a marker color and the pixel under its
/// projection, with hue normalized to [0, 1).
const HUE_EPSILON: f64 = 0.008;

const GCP_LIST_NAME: &str = "gcp_list.txt";

/// A ground marker with a known world position, identified on imagery by
/// its color.
#[derive(Debug, Clone)]
pub struct GroundControlPoint {
    pub position: DVec3,
    pub color: [u8; 3],
}

/// One sighting of a control point on a captured frame. The pixel row is
/// top-down, as photogrammetry suites expect.
#[derive(Debug, Clone)]
struct GcpSighting {
    position: DVec3,
    pixel_x: i32,
    pixel_y: i32,
    image_name: String,
}

/// Control points inside the covered volume, taken from the terrain's
/// marker list.
pub fn locate_gcps(terrain: &Terrain, survey_area: &SurveyArea) -> Vec<GroundControlPoint> {
    terrain
        .control_points
        .iter()
        .filter(|marker| survey_area.area_to_cover.contains(marker.position))
        .map(|marker| GroundControlPoint { position: marker.position, color: marker.color })
        .collect()
}

/// Collects control point sightings over a capture run and writes the
/// ODM-style `gcp_list.txt` once the run finishes.
pub struct GcpManager {
    gcps: Vec<GroundControlPoint>,
    sightings: Vec<GcpSighting>,
    resolution_y: u32,
}

impl GcpManager {
    pub fn new(gcps: Vec<GroundControlPoint>, resolution_y: u32) -> Self {
        Self { gcps, sightings: Vec::new(), resolution_y }
    }

    pub fn gcp_count(&self) -> usize {
        self.gcps.len()
    }

    pub fn sighting_count(&self) -> usize {
        self.sightings.len()
    }

    /// Check every known control point against a captured frame. A point is
    /// recorded when it projects inside the frame and the pixel under it
    /// carries the marker's hue, so occluded markers are skipped.
    pub fn check_for_visible_gcps(
        &mut self,
        image: &CapturedImage,
        camera: &CameraModel,
        image_name: &str,
    ) {
        for gcp in &self.gcps {
            let viewport = camera.world_to_viewport(gcp.position);
            if viewport.z < 0.0
                || !(0.0..=1.0).contains(&viewport.x)
                || !(0.0..=1.0).contains(&viewport.y)
            {
                continue;
            }
            let (pixel_x, pixel_y) = camera.world_to_screen(gcp.position);
            if pixel_x < 0
                || pixel_y < 0
                || pixel_x >= image.width as i32
                || pixel_y >= image.height as i32
            {
                continue;
            }
            let pixel = image.get_pixel(pixel_x as u32, pixel_y as u32);
            if !hues_match(pixel, gcp.color) {
                continue;
            }
            self.sightings.push(GcpSighting {
                position: gcp.position,
                pixel_x,
                pixel_y: self.resolution_y as i32 - pixel_y,
                image_name: image_name.to_string(),
            });
        }
    }

    /// Write the collected sightings if there are any. The first line names
    /// the coordinate reference system, then one line per sighting:
    /// easting, northing, altitude, pixel x, pixel y, image name.
    pub fn write_to_file(&self, georeferencing: &Georeferencing, folder: &Path) -> Result<()> {
        if self.sightings.is_empty() {
            return Ok(());
        }
        let file = File::create(folder.join(GCP_LIST_NAME))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", georeferencing.definition())?;
        for sighting in &self.sightings {
            let utm = georeferencing.map_local_to_utm(sighting.position);
            writeln!(
                writer,
                "{} {} {} {} {} {}",
                utm.easting,
                utm.northing,
                utm.altitude,
                sighting.pixel_x,
                sighting.pixel_y,
                sighting.image_name,
            )?;
        }
        Ok(())
    }
}

/// Normalized hue of an sRGB color, in [0, 1).
pub fn normalized_hue(color: [u8; 3]) -> f64 {
    let rgb = Srgb::new(
        f32::from(color[0]) / 255.0,
        f32::from(color[1]) / 255.0,
        f32::from(color[2]) / 255.0,
    );
    let hsv = Hsv::from_color(rgb);
    f64::from(hsv.hue.to_positive_degrees()) / 360.0
}

/// Hue comparison with wraparound, so near-red hues on both sides of zero
/// still match.
pub fn hues_match(a: [u8; 3], b: [u8; 3]) -> bool {
    let ha = normalized_hue(a);
    let hb = normalized_hue(b);
    let distance = (ha - hb).abs();
    distance.min(1.0 - distance) < HUE_EPSILON
}
