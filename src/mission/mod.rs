use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use glam::{DQuat, DVec3};
use tracing::{debug, info};

use crate::capture::gcp::{GcpManager, locate_gcps};
use crate::capture::{CameraModel, SceneModel};
use crate::geo::Georeferencing;
use crate::math::{angle_between_deg, look_rotation, move_towards, rotate_towards};
use crate::output::{GeoTagger, image_name, write_flight_manifest};
use crate::planner::{FlightPlan, Mission, Waypoint};
use crate::survey::{CameraDefinition, SurveyArea};
use crate::terrain::Terrain;

/// Speed of the initial transit to the first waypoint, in m/s.
const APPROACH_SPEED: f64 = 100.0;

/// Arrival thresholds. The drone snaps to the exact waypoint pose once it
/// gets inside both.
const POSITION_THRESHOLD: f64 = 1.0;
const ROTATION_THRESHOLD: f64 = 1.0;

#[derive(Debug, Clone)]
pub enum MissionEvent {
    WaypointReached(Waypoint),
    FinalWaypointReached,
}

/// Kinematic flight model. The transit to the first waypoint is flown fast
/// and nose-forward; every later leg moves at the configured speed while
/// the body rotates toward the waypoint's capture orientation.
pub struct DroneMovement {
    waypoints: Vec<Waypoint>,
    next_index: usize,
    position: DVec3,
    rotation: DQuat,
    speed: f64,
    rotation_speed: f64,
    finished: bool,
}

impl DroneMovement {
    /// `speed` in m/s, `rotation_speed` in degrees per second.
    pub fn new(plan: &FlightPlan, start: DVec3, speed: f64, rotation_speed: f64) -> Self {
        Self {
            waypoints: plan.waypoints.clone(),
            next_index: 0,
            position: start,
            rotation: DQuat::IDENTITY,
            speed,
            rotation_speed,
            finished: plan.waypoints.is_empty(),
        }
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn rotation(&self) -> DQuat {
        self.rotation
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Advance the flight by `dt` seconds. Returns the events raised by the
    /// step, in order.
    pub fn advance(&mut self, dt: f64) -> Vec<MissionEvent> {
        if self.finished {
            return Vec::new();
        }
        let target = self.waypoints[self.next_index];

        if self.next_index == 0 {
            // Approach leg: full speed, nose pointed at the waypoint until
            // the transit is done, then the body turns to the capture
            // orientation before the waypoint counts as reached.
            let to_target = target.position - self.position;
            if to_target.length() >= POSITION_THRESHOLD
                && to_target.cross(DVec3::Y).length_squared() > 1e-12
            {
                self.rotation = look_rotation(to_target, DVec3::Y);
            } else {
                self.rotation =
                    rotate_towards(self.rotation, target.rotation, self.rotation_speed * dt);
            }
            self.position = move_towards(self.position, target.position, APPROACH_SPEED * dt);
        } else {
            self.position = move_towards(self.position, target.position, self.speed * dt);
            self.rotation =
                rotate_towards(self.rotation, target.rotation, self.rotation_speed * dt);
        }

        if self.position.distance(target.position) < POSITION_THRESHOLD
            && angle_between_deg(self.rotation, target.rotation) < ROTATION_THRESHOLD
        {
            return self.arrive_at(target);
        }
        Vec::new()
    }

    fn arrive_at(&mut self, waypoint: Waypoint) -> Vec<MissionEvent> {
        self.position = waypoint.position;
        self.rotation = waypoint.rotation;
        self.next_index += 1;
        let mut events = vec![MissionEvent::WaypointReached(waypoint)];
        if self.next_index == self.waypoints.len() {
            self.finished = true;
            events.push(MissionEvent::FinalWaypointReached);
        }
        events
    }
}

/// Captures, tags and records one queued waypoint per call. Queueing is
/// decoupled from flying so a slow capture never stalls the flight model.
pub struct WaypointProcessor {
    queue: VecDeque<(Waypoint, usize)>,
    scene: SceneModel,
    camera: CameraModel,
    gcp_manager: GcpManager,
    geo_tagger: GeoTagger,
    georeferencing: Georeferencing,
    folder: PathBuf,
    captured: usize,
}

impl WaypointProcessor {
    /// Prepares the output folder, wiping any previous run's content.
    pub fn new(
        terrain: Arc<Terrain>,
        camera_definition: CameraDefinition,
        survey_area: &SurveyArea,
        georeferencing: Georeferencing,
        folder: PathBuf,
    ) -> Result<Self> {
        if folder.exists() {
            std::fs::remove_dir_all(&folder)
                .with_context(|| format!("Failed to clear {}", folder.display()))?;
        }
        std::fs::create_dir_all(&folder)
            .with_context(|| format!("Failed to create {}", folder.display()))?;

        let gcps = locate_gcps(&terrain, survey_area);
        info!(count = gcps.len(), "located ground control points in the covered area");
        Ok(Self {
            queue: VecDeque::new(),
            scene: SceneModel::new(terrain),
            camera: CameraModel::new(camera_definition),
            gcp_manager: GcpManager::new(gcps, camera_definition.resolution_y),
            geo_tagger: GeoTagger::new(camera_definition.focal_length),
            georeferencing,
            folder,
            captured: 0,
        })
    }

    pub fn enqueue(&mut self, waypoint: Waypoint) {
        self.captured += 1;
        self.queue.push_back((waypoint, self.captured));
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Process the oldest queued waypoint, if any: render the frame, record
    /// visible control points, save the file and tag it.
    pub fn process_next(&mut self) -> Result<bool> {
        let Some((waypoint, number)) = self.queue.pop_front() else {
            return Ok(false);
        };
        let name = image_name(number);
        debug!(image = %name, "capturing waypoint");

        self.camera.set_pose(waypoint.position, waypoint.rotation);
        let image = self.scene.render(&self.camera);
        self.gcp_manager.check_for_visible_gcps(&image, &self.camera, &name);

        let path = self.folder.join(&name);
        image
            .to_rgb_image()
            .save(&path)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        self.geo_tagger.tag_image(&self.georeferencing, waypoint.position, &path);
        Ok(true)
    }

    /// Write the control point sightings collected over the run.
    pub fn finish(&self) -> Result<()> {
        self.gcp_manager.write_to_file(&self.georeferencing, &self.folder)?;
        info!(
            sightings = self.gcp_manager.sighting_count(),
            images = self.captured,
            "capture run finished"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionStatus {
    InProgress,
    Finished,
}

/// Owns one full survey run: plans the flight, writes the manifest, then
/// ticks the flight model and the capture queue until both drain.
pub struct MissionExecution {
    movement: DroneMovement,
    processor: WaypointProcessor,
    waypoint_count: usize,
    processed: usize,
    final_reached: bool,
    finished: bool,
}

impl MissionExecution {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mission: &Mission,
        terrain: Arc<Terrain>,
        camera_definition: CameraDefinition,
        survey_area: &SurveyArea,
        georeferencing: Georeferencing,
        folder: PathBuf,
        start: DVec3,
        speed: f64,
        rotation_speed: f64,
    ) -> Result<Self> {
        let plan = mission.calculate_flight_plan();
        info!(
            waypoints = plan.waypoints.len(),
            distance = plan.total_distance(),
            "flight plan calculated"
        );

        let processor = WaypointProcessor::new(
            terrain,
            camera_definition,
            survey_area,
            georeferencing,
            folder.clone(),
        )?;
        write_flight_manifest(
            &folder,
            &camera_definition,
            survey_area,
            &processor.georeferencing,
            &plan,
        )?;

        let movement = DroneMovement::new(&plan, start, speed, rotation_speed);
        Ok(Self {
            movement,
            processor,
            waypoint_count: plan.waypoints.len(),
            processed: 0,
            final_reached: false,
            finished: false,
        })
    }

    /// Advance the run by `dt` seconds of flight and at most one capture.
    pub fn tick(&mut self, dt: f64) -> Result<MissionStatus> {
        if self.finished {
            return Ok(MissionStatus::Finished);
        }

        for event in self.movement.advance(dt) {
            match event {
                MissionEvent::WaypointReached(waypoint) => self.processor.enqueue(waypoint),
                MissionEvent::FinalWaypointReached => self.final_reached = true,
            }
        }
        if self.processor.process_next()? {
            self.processed += 1;
            info!(processed = self.processed, total = self.waypoint_count, "image captured");
        }

        if self.final_reached && self.processor.pending() == 0 {
            self.processor.finish()?;
            self.finished = true;
            return Ok(MissionStatus::Finished);
        }
        Ok(MissionStatus::InProgress)
    }
}
