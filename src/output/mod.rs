use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::process::Command;

use anyhow::Result;
use tracing::warn;

use crate::geo::{Georeferencing, utm_to_lat_lng};
use crate::math::euler_angles_deg;
use crate::planner::FlightPlan;
use crate::survey::{CameraDefinition, SurveyArea};

const FLIGHT_MANIFEST_NAME: &str = "droneFlight.xml";

/// Sequential capture file name, 1-based.
pub fn image_name(number: usize) -> String {
    format!("Image_{number:04}.jpg")
}

/// Writes the flight manifest: the camera, the covered area, the UTM origin
/// and the full waypoint sequence with orientations in YXZ euler degrees.
pub fn write_flight_manifest(
    folder: &Path,
    camera: &CameraDefinition,
    survey_area: &SurveyArea,
    georeferencing: &Georeferencing,
    plan: &FlightPlan,
) -> Result<()> {
    let file = File::create(folder.join(FLIGHT_MANIFEST_NAME))?;
    let mut writer = BufWriter::new(file);
    let area_size = survey_area.area_to_cover.size();

    writeln!(writer, "<?xml version=\"1.0\" encoding=\"utf-8\"?>")?;
    writeln!(writer, "<droneFlight>")?;
    writeln!(writer, "  <cameraDefinition>")?;
    writeln!(writer, "    <focalLength>{}</focalLength>", camera.focal_length)?;
    writeln!(writer, "    <sensorSizeX>{}</sensorSizeX>", camera.sensor_size_x)?;
    writeln!(writer, "    <sensorSizeY>{}</sensorSizeY>", camera.sensor_size_y)?;
    writeln!(writer, "    <resolutionX>{}</resolutionX>", camera.resolution_x)?;
    writeln!(writer, "    <resolutionY>{}</resolutionY>", camera.resolution_y)?;
    writeln!(writer, "  </cameraDefinition>")?;
    writeln!(writer, "  <surveyArea>")?;
    writeln!(writer, "    <width>{}</width>", area_size.x)?;
    writeln!(writer, "    <distance>{}</distance>", area_size.z)?;
    writeln!(writer, "    <frontalOverlap>{}</frontalOverlap>", survey_area.frontal_overlap)?;
    writeln!(writer, "    <sideOverlap>{}</sideOverlap>", survey_area.side_overlap)?;
    writeln!(writer, "  </surveyArea>")?;
    writeln!(writer, "  <georeferencing>")?;
    writeln!(writer, "    <eastingCenter>{}</eastingCenter>", georeferencing.center_easting)?;
    writeln!(writer, "    <northingCenter>{}</northingCenter>", georeferencing.center_northing)?;
    writeln!(writer, "    <utmZone>{}</utmZone>", georeferencing.utm_zone)?;
    writeln!(
        writer,
        "    <utmHemisphere>{}</utmHemisphere>",
        georeferencing.hemisphere.letter()
    )?;
    writeln!(writer, "  </georeferencing>")?;
    writeln!(writer, "  <flightPlan>")?;
    writeln!(writer, "    <missionType>{:?}</missionType>", plan.mission_type)?;
    writeln!(writer, "    <totalDistance>{}</totalDistance>", plan.total_distance())?;
    writeln!(writer, "    <waypoints>")?;
    for waypoint in &plan.waypoints {
        let euler = euler_angles_deg(waypoint.rotation);
        writeln!(writer, "      <waypoint>")?;
        writeln!(writer, "        <x>{}</x>", waypoint.position.x)?;
        writeln!(writer, "        <y>{}</y>", waypoint.position.y)?;
        writeln!(writer, "        <z>{}</z>", waypoint.position.z)?;
        writeln!(writer, "        <rotationX>{}</rotationX>", euler.x)?;
        writeln!(writer, "        <rotationY>{}</rotationY>", euler.y)?;
        writeln!(writer, "        <rotationZ>{}</rotationZ>", euler.z)?;
        writeln!(writer, "      </waypoint>")?;
    }
    writeln!(writer, "    </waypoints>")?;
    writeln!(writer, "  </flightPlan>")?;
    writeln!(writer, "</droneFlight>")?;
    Ok(())
}

/// Writes EXIF GPS tags into captured images by shelling out to exiftool.
/// A missing or failing exiftool degrades the run to untagged imagery
/// instead of aborting it.
pub struct GeoTagger {
    focal_length: f64,
}

impl GeoTagger {
    pub fn new(focal_length: f64) -> Self {
        Self { focal_length }
    }

    pub fn tag_image(
        &self,
        georeferencing: &Georeferencing,
        position: glam::DVec3,
        image_path: &Path,
    ) {
        let utm = georeferencing.map_local_to_utm(position);
        let lat_lng = utm_to_lat_lng(
            utm.easting,
            utm.northing,
            georeferencing.utm_zone,
            georeferencing.hemisphere,
        );
        let longitude_ref = if georeferencing.utm_zone <= 30 { "W" } else { "E" };

        let output = Command::new("exiftool")
            .arg("-overwrite_original")
            .arg(format!("-GPSLatitude={}", lat_lng.lat.abs()))
            .arg(format!("-GPSLatitudeRef={}", georeferencing.hemisphere.letter()))
            .arg(format!("-GPSLongitude={}", lat_lng.lng.abs()))
            .arg(format!("-GPSLongitudeRef={longitude_ref}"))
            .arg(format!("-GPSAltitude={}", utm.altitude))
            .arg("-GPSAltitudeRef=Above Sea Level")
            .arg(format!("-GPSDOP={}", georeferencing.dilution_of_precision))
            .arg(format!("-FocalLength={}", self.focal_length))
            .arg(image_path)
            .output();

        match output {
            Ok(result) if !result.status.success() => {
                warn!(
                    image = %image_path.display(),
                    status = %result.status,
                    "exiftool failed, image left untagged"
                );
            }
            Err(err) => {
                warn!(
                    image = %image_path.display(),
                    error = %err,
                    "could not run exiftool, image left untagged"
                );
            }
            Ok(_) => {}
        }
    }
}
