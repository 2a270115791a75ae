use glam::{DQuat, DVec3};
use itertools::Itertools;
use serde::Serialize;

use crate::math::{angle_axis_deg, approximately, look_rotation};
use crate::survey::{CameraDefinition, SurveyArea};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MissionType {
    Grid,
    DoubleGrid,
}

/// A position the drone must reach plus the orientation it must hold there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub position: DVec3,
    pub rotation: DQuat,
}

/// Ordered waypoint sequence. Traversal order is significant; waypoints are
/// visited strictly sequentially.
#[derive(Debug, Clone)]
pub struct FlightPlan {
    pub waypoints: Vec<Waypoint>,
    pub mission_type: MissionType,
}

impl FlightPlan {
    /// Sum of distances between consecutive waypoints.
    pub fn total_distance(&self) -> f64 {
        self.waypoints
            .iter()
            .tuple_windows()
            .map(|(a, b)| a.position.distance(b.position))
            .sum()
    }
}

pub enum Mission {
    Grid(GridMission),
    DoubleGrid(DoubleGridMission),
}

impl Mission {
    pub fn calculate_flight_plan(&self) -> FlightPlan {
        match self {
            Mission::Grid(mission) => FlightPlan {
                waypoints: mission.calculate_waypoints(),
                mission_type: MissionType::Grid,
            },
            Mission::DoubleGrid(mission) => FlightPlan {
                waypoints: mission.calculate_waypoints(),
                mission_type: MissionType::DoubleGrid,
            },
        }
    }
}

/// Orientation toward the next waypoint, composed with the fixed camera
/// pitch. 90 degrees of camera angle means facing straight down.
fn rotation_between_waypoints(from: DVec3, to: DVec3, camera_angle: f64) -> DQuat {
    let direction = to - from;
    look_rotation(direction, DVec3::Y) * angle_axis_deg(camera_angle, DVec3::X)
}

fn positions_to_waypoints(positions: &[DVec3], camera_angle: f64) -> Vec<Waypoint> {
    let mut waypoints: Vec<Waypoint> = Vec::with_capacity(positions.len());
    for pair in positions.windows(2) {
        waypoints.push(Waypoint {
            position: pair[0],
            rotation: rotation_between_waypoints(pair[0], pair[1], camera_angle),
        });
    }

    // The final waypoint has no "next" direction, so it holds the previous
    // orientation. A single position gets the ground-facing default.
    match (positions.last(), waypoints.last()) {
        (Some(last), Some(prev)) => {
            let rotation = prev.rotation;
            waypoints.push(Waypoint { position: *last, rotation });
        }
        (Some(last), None) => {
            waypoints.push(Waypoint {
                position: *last,
                rotation: angle_axis_deg(camera_angle, DVec3::X),
            });
        }
        (None, _) => {}
    }
    waypoints
}

/// Serpentine sweep along +Z, stepping +X between passes. Both bounds of the
/// inner sweep use the tolerant comparison so a pass ending exactly on an
/// edge is not lost to float error.
fn serpentine_z_leading(
    altitude: f64,
    frontal_step: f64,
    side_step: f64,
    bottom_left: (f64, f64),
    top_right: (f64, f64),
) -> Vec<DVec3> {
    let mut positions = Vec::new();
    let (mut x, mut y) = bottom_left;
    let mut y_direction = 1.0;
    while x <= top_right.0 {
        while (bottom_left.1 < y || approximately(bottom_left.1, y))
            && (y < top_right.1 || approximately(y, top_right.1))
        {
            positions.push(DVec3::new(x, altitude, y));
            y += frontal_step * y_direction;
        }
        y_direction = -y_direction;
        x += side_step;
        y += frontal_step * y_direction;
    }
    positions
}

/// Second-grid sweep: leading axis X, stepping -Z from the top-right corner.
fn serpentine_x_leading(
    altitude: f64,
    frontal_step: f64,
    side_step: f64,
    bottom_left: (f64, f64),
    top_right: (f64, f64),
) -> Vec<DVec3> {
    let mut positions = Vec::new();
    let (mut x, mut y) = top_right;
    let mut x_direction = -1.0;
    while y >= bottom_left.1 {
        while (bottom_left.0 < x || approximately(bottom_left.0, x))
            && (x < top_right.0 || approximately(x, top_right.0))
        {
            positions.push(DVec3::new(x, altitude, y));
            x += frontal_step * x_direction;
        }
        x_direction = -x_direction;
        x += frontal_step * x_direction;
        y -= side_step;
    }
    positions
}

fn horizontal_corners(survey_area: &SurveyArea) -> ((f64, f64), (f64, f64)) {
    let area = survey_area.area_to_cover;
    let bottom_left = (area.center.x - area.extents.x, area.center.z - area.extents.z);
    let top_right = (area.center.x + area.extents.x, area.center.z + area.extents.z);
    (bottom_left, top_right)
}

fn grid_steps(
    survey_area: &SurveyArea,
    camera: &CameraDefinition,
    altitude: f64,
) -> (f64, f64) {
    let (image_width, image_height) = camera.footprint(altitude);
    let frontal_step = image_height * f64::from(100 - survey_area.frontal_overlap) / 100.0;
    let side_step = image_width * f64::from(100 - survey_area.side_overlap) / 100.0;
    (frontal_step, side_step)
}

/// Single-grid boustrophedon mission.
pub struct GridMission {
    survey_area: SurveyArea,
    camera: CameraDefinition,
    altitude: f64,
    camera_angle: f64,
}

impl GridMission {
    /// `relative_altitude` is height above the survey area's floor.
    pub fn new(
        survey_area: SurveyArea,
        camera: CameraDefinition,
        relative_altitude: f64,
        camera_angle: f64,
    ) -> Self {
        let floor = survey_area.area_to_cover.center.y - survey_area.area_to_cover.extents.y;
        Self { survey_area, camera, altitude: floor + relative_altitude, camera_angle }
    }

    fn calculate_waypoints(&self) -> Vec<Waypoint> {
        let (frontal_step, side_step) = grid_steps(&self.survey_area, &self.camera, self.altitude);
        let (bottom_left, top_right) = horizontal_corners(&self.survey_area);
        let mut positions =
            serpentine_z_leading(self.altitude, frontal_step, side_step, bottom_left, top_right);

        // A degenerate area/camera combination can exhaust the sweep before
        // producing a single position. Fall back to one waypoint at the grid
        // origin instead of failing the mission.
        if positions.is_empty() {
            positions.push(DVec3::new(bottom_left.0, self.altitude, bottom_left.1));
        }
        positions_to_waypoints(&positions, self.camera_angle)
    }
}

/// Two full grid passes, the second swept along the perpendicular axis from
/// the opposite corner. The passes are concatenated, never interleaved.
pub struct DoubleGridMission {
    survey_area: SurveyArea,
    camera: CameraDefinition,
    altitude1: f64,
    altitude2: f64,
    camera_angle1: f64,
    camera_angle2: f64,
}

impl DoubleGridMission {
    pub fn new(
        survey_area: SurveyArea,
        camera: CameraDefinition,
        relative_altitude1: f64,
        camera_angle1: f64,
        relative_altitude2: f64,
        camera_angle2: f64,
    ) -> Self {
        let floor = survey_area.area_to_cover.center.y - survey_area.area_to_cover.extents.y;
        Self {
            survey_area,
            camera,
            altitude1: floor + relative_altitude1,
            altitude2: floor + relative_altitude2,
            camera_angle1,
            camera_angle2,
        }
    }

    fn calculate_waypoints(&self) -> Vec<Waypoint> {
        let mut waypoints = self.grid_waypoints(self.altitude1, self.camera_angle1, false);
        waypoints.extend(self.grid_waypoints(self.altitude2, self.camera_angle2, true));
        waypoints
    }

    fn grid_waypoints(&self, altitude: f64, camera_angle: f64, second_pass: bool) -> Vec<Waypoint> {
        let (frontal_step, side_step) = grid_steps(&self.survey_area, &self.camera, altitude);
        let (bottom_left, top_right) = horizontal_corners(&self.survey_area);
        let mut positions = if second_pass {
            serpentine_x_leading(altitude, frontal_step, side_step, bottom_left, top_right)
        } else {
            serpentine_z_leading(altitude, frontal_step, side_step, bottom_left, top_right)
        };
        if positions.is_empty() {
            let corner = if second_pass { top_right } else { bottom_left };
            positions.push(DVec3::new(corner.0, altitude, corner.1));
        }
        positions_to_waypoints(&positions, camera_angle)
    }
}
