use std::path::PathBuf;
use std::sync::Arc;

use glam::{DVec3, EulerRot};

use crate::capture::gcp::{GcpManager, hues_match, locate_gcps};
use crate::capture::{CameraModel, SceneModel};
use crate::config::{
    ConfigError, FlightConfig, GeoreferencingConfig, SamplingConfig, SurveyAreaConfig,
    build_georeferencing, build_mission, build_survey_area, validate_camera, validate_sampling,
};
use crate::geo::{Georeferencing, Hemisphere, utm_to_lat_lng};
use crate::math::{
    Bounds3, angle_axis_deg, angle_between_deg, euler_angles_deg, look_rotation, move_towards,
};
use crate::mission::{DroneMovement, MissionEvent};
use crate::output::image_name;
use crate::pipeline::crowns::{Tree, TreeCrownDetection};
use crate::pipeline::elevation::{ElevationMap, ElevationMapExporter, ElevationMapGenerator, NO_VALUE};
use crate::pipeline::instantiate::TreeInstantiator;
use crate::pipeline::raycast::{CastingResult, EntityType, RaycastResult, Raycaster};
use crate::pipeline::segmentation::Segmentation;
use crate::pipeline::{Task, TaskIo, TaskList, TaskManager};
use crate::planner::{DoubleGridMission, FlightPlan, GridMission, Mission, MissionType, Waypoint};
use crate::survey::{CameraDefinition, SurveyArea};
use crate::terrain::{ControlPointMarker, Heightmap, Terrain, TreeInstance, TreePrototype};

fn test_camera() -> CameraDefinition {
    CameraDefinition {
        focal_length: 3.61,
        sensor_size_x: 6.24,
        sensor_size_y: 4.68,
        resolution_x: 16,
        resolution_y: 16,
    }
}

fn test_survey_area() -> SurveyArea {
    // 300 x 200 m area with its floor at altitude zero.
    SurveyArea::new(
        Bounds3::new(DVec3::new(0.0, 60.0, 0.0), DVec3::new(300.0, 120.0, 200.0)),
        85,
        80,
    )
}

fn flat_terrain(width: f64, height: f64, distance: f64) -> Terrain {
    Terrain {
        position: DVec3::ZERO,
        size: DVec3::new(width, height, distance),
        heightmap: Heightmap { resolution: 3, heights: vec![vec![0.0; 3]; 3] },
        tree_prototypes: Vec::new(),
        tree_instances: Vec::new(),
        control_points: Vec::new(),
    }
}

fn temp_folder(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("drone_survey_{name}_{}", std::process::id()));
    std::fs::create_dir_all(&path).unwrap();
    path
}

fn run_task(task: &mut dyn Task, input: TaskIo) -> TaskIo {
    task.take_input(input);
    while task.continue_processing() < 1.0 {}
    task.take_result()
}

#[test]
fn test_footprint_by_similar_triangles() {
    let camera = test_camera();
    let (width, height) = camera.footprint(100.0);
    assert!((width - 172.8531855955679).abs() < 1e-9);
    assert!((height - 129.6398891966759).abs() < 1e-9);
}

#[test]
fn test_grid_mission_waypoint_count() {
    let mission = GridMission::new(test_survey_area(), test_camera(), 100.0, 90.0);
    let plan = Mission::Grid(mission).calculate_flight_plan();

    // 9 passes of 11 capture positions each for this area and overlap.
    assert_eq!(plan.waypoints.len(), 99);
    assert_eq!(plan.mission_type, MissionType::Grid);
}

#[test]
fn test_grid_mission_geometry() {
    let mission = GridMission::new(test_survey_area(), test_camera(), 100.0, 90.0);
    let plan = Mission::Grid(mission).calculate_flight_plan();

    let first = plan.waypoints[0].position;
    assert!((first.x - -150.0).abs() < 1e-9);
    assert!((first.y - 100.0).abs() < 1e-9);
    assert!((first.z - -100.0).abs() < 1e-9);

    let mut xs: Vec<f64> = plan.waypoints.iter().map(|w| w.position.x).collect();
    xs.dedup();
    assert_eq!(xs.len(), 9);

    for waypoint in &plan.waypoints {
        assert!((waypoint.position.y - 100.0).abs() < 1e-9);
        assert!(waypoint.position.x >= -150.0 - 1e-6 && waypoint.position.x <= 150.0 + 1e-6);
        assert!(waypoint.position.z >= -100.0 - 1e-6 && waypoint.position.z <= 100.0 + 1e-6);
    }
    assert!(plan.total_distance() > 0.0);
}

#[test]
fn test_double_grid_concatenates_two_passes() {
    let mission =
        DoubleGridMission::new(test_survey_area(), test_camera(), 100.0, 90.0, 80.0, 70.0);
    let plan = Mission::DoubleGrid(mission).calculate_flight_plan();

    // First grid sweeps along Z (99 positions at 100 m), the second along X
    // from the opposite corner with steps recomputed for its own altitude.
    assert_eq!(plan.mission_type, MissionType::DoubleGrid);
    assert_eq!(plan.waypoints.len(), 99 + 160);
    assert!((plan.waypoints[0].position.y - 100.0).abs() < 1e-9);
    assert!((plan.waypoints[99].position.y - 80.0).abs() < 1e-9);
    // Second pass starts at the top-right corner.
    assert!((plan.waypoints[99].position.x - 150.0).abs() < 1e-9);
    assert!((plan.waypoints[99].position.z - 100.0).abs() < 1e-9);
}

#[test]
fn test_single_position_faces_straight_down() {
    // Area smaller than one footprint: a single capture position whose
    // orientation falls back to the configured camera pitch.
    let area = SurveyArea::new(
        Bounds3::new(DVec3::new(0.0, 0.5, 0.0), DVec3::new(1.0, 1.0, 1.0)),
        85,
        80,
    );
    let mission = GridMission::new(area, test_camera(), 100.0, 90.0);
    let plan = Mission::Grid(mission).calculate_flight_plan();

    assert_eq!(plan.waypoints.len(), 1);
    let expected = angle_axis_deg(90.0, DVec3::X);
    assert!(angle_between_deg(plan.waypoints[0].rotation, expected) < 1e-6);
}

#[test]
fn test_utm_inverse_northern_hemisphere() {
    // Zone 31N fixture near Paris.
    let result = utm_to_lat_lng(448251.795, 5411932.678, 31, Hemisphere::North);
    assert!((result.lat - 48.8582000032854).abs() < 1e-6);
    assert!((result.lng - 2.29449999714796).abs() < 1e-6);
}

#[test]
fn test_utm_inverse_southern_hemisphere() {
    // Zone 19S fixture in Patagonia.
    let result = utm_to_lat_lng(277524.5597564102, 5485401.149023914, 19, Hemisphere::South);
    assert!((result.lat - -40.7522732312442).abs() < 1e-6);
    assert!((result.lng - -71.6353379100068).abs() < 1e-6);
}

#[test]
fn test_georeferencing_without_noise_is_exact() {
    let area = test_survey_area();
    let georef =
        Georeferencing::new(500000.0, 4000000.0, 31, Hemisphere::North, 2.0, 0, 0.0, &area);

    let utm = georef.map_local_to_utm(DVec3::new(10.0, 55.0, -20.0));
    assert!((utm.easting - 500010.0).abs() < 1e-9);
    assert!((utm.northing - 3999980.0).abs() < 1e-9);
    assert!((utm.altitude - 55.0).abs() < 1e-9);
    assert_eq!(georef.definition(), "WGS84 UTM 31N");
}

#[test]
fn test_georeferencing_noise_is_seeded_and_bounded() {
    let area = test_survey_area();
    let point = DVec3::new(10.0, 55.0, -20.0);
    let make = || Georeferencing::new(500000.0, 4000000.0, 31, Hemisphere::North, 2.0, 7, 2.0, &area);

    let a = make();
    let b = make();
    for _ in 0..5 {
        let ua = a.map_local_to_utm(point);
        let ub = b.map_local_to_utm(point);
        assert_eq!(ua, ub);

        // Deviation from the exact mapping is exactly one noise radius.
        let deviation = DVec3::new(
            ua.easting - 500010.0,
            ua.altitude - 55.0,
            ua.northing - 3999980.0,
        );
        assert!((deviation.length() - 2.0).abs() < 1e-9);
    }
}

#[test]
fn test_elevation_map_tracks_extremes() {
    let mut map = ElevationMap::new(2, 2);
    assert_eq!(map.max_elevation(), NO_VALUE);
    assert_eq!(map.get(1, 0), NO_VALUE);

    map.set(0, 0, 1.0);
    map.set(1, 1, 4.0);
    assert_eq!(map.min_elevation(), 1.0);
    assert_eq!(map.max_elevation(), 4.0);
    assert_eq!(map.get(1, 0), NO_VALUE);
}

#[test]
fn test_elevation_export_inverts_rows() {
    let folder = temp_folder("elevation");
    let mut map = ElevationMap::new(2, 2);
    map.set(0, 0, 1.0);
    map.set(1, 1, 4.0);

    let mut exporter = ElevationMapExporter::new(10.0, true, folder.clone());
    exporter.take_input(TaskIo::Elevation(map));
    assert!(exporter.continue_processing() < 1.0);
    assert_eq!(exporter.continue_processing(), 1.0);
    assert!(exporter.error().is_none());

    let xml = std::fs::read_to_string(folder.join("elevation_map.xml")).unwrap();
    assert!(xml.contains("<MaxElevation>4</MaxElevation>"));
    assert!(xml.contains("<MinElevation>1</MinElevation>"));
    // Grid row 0 is exported last (bottom of the covered area).
    assert!(xml.contains("-9999,4\n1,-9999"));
    std::fs::remove_dir_all(folder).unwrap();
}

#[test]
fn test_segmentation_export_inverts_rows() {
    let folder = temp_folder("segmentation");
    let mut casting = CastingResult::new(2, 2);
    casting.add_result(
        0,
        0,
        RaycastResult {
            hit_point: DVec3::ZERO,
            entity_type: EntityType::Terrain,
            entity_name: "Terrain".to_string(),
        },
    );
    casting.add_result(
        1,
        1,
        RaycastResult {
            hit_point: DVec3::Y,
            entity_type: EntityType::Tree,
            entity_name: "Tree_0".to_string(),
        },
    );

    let mut segmentation = Segmentation::new(10.0, true, folder.clone());
    segmentation.take_input(TaskIo::Casting(casting));
    assert_eq!(segmentation.continue_processing(), 1.0);
    assert!(segmentation.error().is_none());

    let xml = std::fs::read_to_string(folder.join("segmentation.xml")).unwrap();
    assert!(xml.contains("<Nothing>-1</Nothing>"));
    assert!(xml.contains("<TERRAIN>0</TERRAIN>"));
    assert!(xml.contains("<TREE>1</TREE>"));
    assert!(xml.contains("-1,1\n0,-1"));
    std::fs::remove_dir_all(folder).unwrap();
}

#[test]
fn test_tree_border_pixels() {
    let mut tree = Tree::new();
    for row in 1..=3 {
        for col in 1..=3 {
            let altitude = if (row, col) == (2, 2) { 9.0 } else { 5.0 };
            tree.assign_pixel(row, col, altitude);
        }
    }
    assert_eq!(tree.pixel_count(), 9);
    assert_eq!(tree.highest_pixel(), (2, 2));
    assert!(!tree.is_pixel_border(2, 2));

    let border_count = (1..=3)
        .flat_map(|row| (1..=3).map(move |col| (row, col)))
        .filter(|&(row, col)| tree.is_pixel_border(row, col))
        .count();
    assert_eq!(border_count, 8);
}

#[test]
fn test_crown_detection_groups_by_instance() {
    let mut casting = CastingResult::new(3, 3);
    for (row, col, name, y) in [
        (0, 0, "Tree_1", 4.0),
        (0, 1, "Tree_1", 6.0),
        (2, 2, "Tree_5", 3.0),
    ] {
        casting.add_result(
            row,
            col,
            RaycastResult {
                hit_point: DVec3::new(0.0, y, 0.0),
                entity_type: EntityType::Tree,
                entity_name: name.to_string(),
            },
        );
    }
    casting.add_result(
        1,
        1,
        RaycastResult {
            hit_point: DVec3::ZERO,
            entity_type: EntityType::Terrain,
            entity_name: "Terrain".to_string(),
        },
    );

    let mut detection = TreeCrownDetection::new();
    let TaskIo::Detection(result) = run_task(&mut detection, TaskIo::Casting(casting)) else {
        panic!("crown detection must produce a detection result");
    };
    assert_eq!(result.trees.len(), 2);
    assert_eq!(result.trees["Tree_1"].pixel_count(), 2);
    assert_eq!(result.trees["Tree_1"].highest_pixel(), (0, 1));
    assert_eq!(result.trees["Tree_5"].pixel_count(), 1);
}

#[test]
fn test_task_list_rejects_mismatched_stages() {
    let terrain = Arc::new(flat_terrain(10.0, 5.0, 10.0));
    let list = TaskList::starting_with(Box::new(TreeInstantiator::new(terrain, 10.0, 10.0)))
        .with(Box::new(ElevationMapGenerator::new()));
    assert!(list.is_err());
}

#[test]
fn test_raycaster_classifies_terrain_and_trees() {
    let mut terrain = flat_terrain(10.0, 5.0, 10.0);
    terrain.tree_prototypes.push(TreePrototype {
        name: "Pine".to_string(),
        crown_radius: 2.0,
        crown_height: 2.0,
        trunk_height: 2.0,
    });
    terrain.tree_instances.push(TreeInstance {
        position: DVec3::new(0.5, 0.0, 0.5),
        rotation: 0.0,
        width_scale: 1.0,
        height_scale: 1.0,
        prototype_index: 0,
    });
    let terrain = Arc::new(terrain);

    let mut instantiator = TreeInstantiator::new(terrain.clone(), 10.0, 10.0);
    let instantiation = run_task(&mut instantiator, TaskIo::Empty);

    // 100 cm per cell over a 10 x 10 m bound.
    let mut raycaster = Raycaster::new(terrain, 100.0);
    let TaskIo::Casting(casting) = run_task(&mut raycaster, instantiation) else {
        panic!("raycaster must produce a casting result");
    };
    assert_eq!(casting.width(), 10);
    assert_eq!(casting.height(), 10);

    let corner = casting.get(0, 0).unwrap();
    assert_eq!(corner.entity_type, EntityType::Terrain);
    assert!((corner.hit_point.y - 0.0).abs() < 1e-9);

    // The probe over the trunk lands on top of the crown sphere.
    let center = casting.get(5, 5).unwrap();
    assert_eq!(center.entity_type, EntityType::Tree);
    assert_eq!(center.entity_name, "Tree_0");
    assert!((center.hit_point.y - 5.0).abs() < 1e-9);
}

#[test]
fn test_task_manager_runs_chain_to_completion() {
    let terrain = Arc::new(flat_terrain(10.0, 5.0, 10.0));
    let chain = TaskList::starting_with(Box::new(TreeInstantiator::new(
        terrain.clone(),
        10.0,
        10.0,
    )))
    .with(Box::new(Raycaster::new(terrain, 100.0)))
    .unwrap()
    .with(Box::new(ElevationMapGenerator::new()))
    .unwrap();

    let mut manager = TaskManager::new();
    manager.run(chain);
    assert!(manager.processing());
    let mut guard = 0;
    while manager.progress() < 1.0 {
        manager.continue_if_processing();
        guard += 1;
        assert!(guard < 1000, "chain did not converge");
    }
    assert_eq!(manager.description(), "Finished!");
}

#[test]
fn test_look_rotation_basis() {
    let identity = look_rotation(DVec3::Z, DVec3::Y);
    assert!(angle_between_deg(identity, glam::DQuat::IDENTITY) < 1e-9);

    let toward_x = look_rotation(DVec3::X, DVec3::Y);
    let forward = toward_x * DVec3::Z;
    assert!((forward - DVec3::X).length() < 1e-9);
}

#[test]
fn test_move_towards_lands_exactly() {
    let result = move_towards(DVec3::ZERO, DVec3::new(3.0, 0.0, 0.0), 5.0);
    assert_eq!(result, DVec3::new(3.0, 0.0, 0.0));

    let partial = move_towards(DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0), 4.0);
    assert!((partial.x - 4.0).abs() < 1e-9);
}

#[test]
fn test_euler_angles_normalized() {
    let q = angle_axis_deg(-90.0, DVec3::Y);
    let euler = euler_angles_deg(q);
    assert!((euler.y - 270.0).abs() < 1e-9);

    let (yaw, _, _) = q.to_euler(EulerRot::YXZ);
    assert!((yaw.to_degrees() - -90.0).abs() < 1e-9);
}

#[test]
fn test_hue_match_wraps_around_red() {
    // Hues just on either side of zero still count as the same marker.
    assert!(hues_match([255, 0, 0], [255, 0, 5]));
    assert!(hues_match([255, 0, 0], [255, 5, 0]));
    assert!(!hues_match([255, 0, 0], [34, 139, 34]));
}

#[test]
fn test_camera_viewport_projection() {
    let mut camera = CameraModel::new(test_camera());
    camera.set_pose(DVec3::new(0.0, 100.0, 0.0), angle_axis_deg(90.0, DVec3::X));

    // The point straight below projects to the frame center at depth 100.
    let viewport = camera.world_to_viewport(DVec3::ZERO);
    assert!((viewport.x - 0.5).abs() < 1e-9);
    assert!((viewport.y - 0.5).abs() < 1e-9);
    assert!((viewport.z - 100.0).abs() < 1e-9);

    let (px, py) = camera.world_to_screen(DVec3::ZERO);
    assert_eq!((px, py), (8, 8));
}

#[test]
fn test_render_sees_control_point_marker() {
    let mut terrain = flat_terrain(100.0, 10.0, 100.0);
    terrain.control_points.push(ControlPointMarker {
        position: DVec3::new(50.0, 0.0, 50.0),
        color: [255, 0, 0],
        radius: 5.0,
    });
    let terrain = Arc::new(terrain);
    let area = SurveyArea::new(
        Bounds3::new(DVec3::new(50.0, 5.0, 50.0), DVec3::new(100.0, 10.0, 100.0)),
        85,
        80,
    );

    let scene = SceneModel::new(terrain.clone());
    let mut camera = CameraModel::new(test_camera());
    camera.set_pose(DVec3::new(50.0, 50.0, 50.0), angle_axis_deg(90.0, DVec3::X));
    let image = scene.render(&camera);
    assert_eq!(image.get_pixel(8, 8), [255, 0, 0]);

    let gcps = locate_gcps(&terrain, &area);
    assert_eq!(gcps.len(), 1);
    let mut manager = GcpManager::new(gcps, 16);
    manager.check_for_visible_gcps(&image, &camera, "Image_0001.jpg");
    assert_eq!(manager.sighting_count(), 1);
}

#[test]
fn test_drone_movement_flies_the_plan() {
    let down = angle_axis_deg(90.0, DVec3::X);
    let plan = FlightPlan {
        waypoints: vec![
            Waypoint { position: DVec3::new(0.0, 100.0, 0.0), rotation: down },
            Waypoint { position: DVec3::new(0.0, 100.0, 10.0), rotation: down },
        ],
        mission_type: MissionType::Grid,
    };
    let mut movement = DroneMovement::new(&plan, DVec3::ZERO, 5.0, 90.0);

    // Approach leg covers the 100 m climb in one fast tick.
    let events = movement.advance(1.0);
    assert!(matches!(events.as_slice(), [MissionEvent::WaypointReached(_)]));
    assert_eq!(movement.position(), plan.waypoints[0].position);

    let mut reached_final = false;
    for _ in 0..10 {
        for event in movement.advance(1.0) {
            if matches!(event, MissionEvent::FinalWaypointReached) {
                reached_final = true;
            }
        }
        if movement.finished() {
            break;
        }
    }
    assert!(reached_final);
    assert_eq!(movement.position(), plan.waypoints[1].position);
}

#[test]
fn test_image_name_is_one_based_and_padded() {
    assert_eq!(image_name(1), "Image_0001.jpg");
    assert_eq!(image_name(123), "Image_0123.jpg");
}

#[test]
fn test_config_validation() {
    let terrain = flat_terrain(100.0, 10.0, 100.0);
    let bad_overlap = SurveyAreaConfig {
        width: 100.0,
        distance: 100.0,
        height: 50.0,
        frontal_overlap: 100,
        side_overlap: 80,
        use_coordinate_origin: false,
    };
    assert!(matches!(
        build_survey_area(&bad_overlap, &terrain),
        Err(ConfigError::InvalidOverlap { .. })
    ));

    let bad_zone = GeoreferencingConfig {
        center_easting: 500000.0,
        center_northing: 4000000.0,
        utm_zone: 61,
        hemisphere: Hemisphere::North,
        dilution_of_precision: 2.0,
        noise_seed: 0,
        max_noise: 0.0,
    };
    assert!(matches!(
        build_georeferencing(&bad_zone, &test_survey_area()),
        Err(ConfigError::InvalidUtmZone(61))
    ));

    let bad_mission = FlightConfig {
        mission_type: "spiral".to_string(),
        speed: 5.0,
        rotation_speed: 90.0,
        altitude1: 100.0,
        camera_angle1: 90.0,
        altitude2: None,
        camera_angle2: None,
        start_position: [0.0; 3],
    };
    assert!(matches!(
        build_mission(&bad_mission, test_survey_area(), test_camera()),
        Err(ConfigError::UnknownMissionType(_))
    ));
}

#[test]
fn test_sampling_rejects_non_positive_gsd() {
    let base = SamplingConfig {
        gsd: 0.0,
        area_width: 10.0,
        area_distance: 10.0,
        export_arrays: false,
        tools: Vec::new(),
    };
    assert!(matches!(validate_sampling(&base), Err(ConfigError::NonPositiveGsd(_))));

    let negative = SamplingConfig { gsd: -25.0, ..base.clone() };
    assert!(matches!(validate_sampling(&negative), Err(ConfigError::NonPositiveGsd(_))));

    let valid = SamplingConfig { gsd: 25.0, ..base };
    assert!(validate_sampling(&valid).is_ok());
}

#[test]
fn test_camera_with_zero_focal_length_is_rejected() {
    let mut camera = test_camera();
    camera.focal_length = 0.0;
    assert!(matches!(
        validate_camera(&camera),
        Err(ConfigError::NonPositiveCamera { name: "focal_length", .. })
    ));

    let flight = FlightConfig {
        mission_type: "grid".to_string(),
        speed: 5.0,
        rotation_speed: 90.0,
        altitude1: 100.0,
        camera_angle1: 90.0,
        altitude2: None,
        camera_angle2: None,
        start_position: [0.0; 3],
    };
    assert!(build_mission(&flight, test_survey_area(), camera).is_err());
}

#[test]
fn test_export_failure_is_reported() {
    // A folder that was never created: both export steps fail, the stage
    // still completes, and the failure is available on the stage.
    let folder = std::env::temp_dir()
        .join(format!("drone_survey_missing_{}", std::process::id()))
        .join("nested");
    let mut map = ElevationMap::new(2, 2);
    map.set(0, 0, 1.0);

    let mut exporter = ElevationMapExporter::new(10.0, false, folder);
    exporter.take_input(TaskIo::Elevation(map));
    assert!(exporter.continue_processing() < 1.0);
    assert_eq!(exporter.continue_processing(), 1.0);
    assert!(exporter.error().is_some());
}

#[test]
fn test_approach_waits_for_capture_orientation() {
    let down = angle_axis_deg(90.0, DVec3::X);
    let plan = FlightPlan {
        waypoints: vec![Waypoint { position: DVec3::new(0.0, 100.0, 0.0), rotation: down }],
        mission_type: MissionType::Grid,
    };
    let mut movement = DroneMovement::new(&plan, DVec3::new(0.0, 100.0, -50.0), 5.0, 90.0);

    // The transit lands on the waypoint while the body still faces forward,
    // so the waypoint does not count as reached yet.
    assert!(movement.advance(1.0).is_empty());
    assert!(!movement.finished());

    let events = movement.advance(1.0);
    assert!(matches!(
        events.as_slice(),
        [MissionEvent::WaypointReached(_), MissionEvent::FinalWaypointReached]
    ));
    assert!(angle_between_deg(movement.rotation(), down) < 1e-9);
}

#[test]
fn test_survey_area_centered_on_origin() {
    let terrain = flat_terrain(100.0, 10.0, 100.0);
    let config = SurveyAreaConfig {
        width: 50.0,
        distance: 40.0,
        height: 30.0,
        frontal_overlap: 85,
        side_overlap: 80,
        use_coordinate_origin: true,
    };
    let area = build_survey_area(&config, &terrain).unwrap();
    assert_eq!(area.area_to_cover.center, DVec3::new(0.0, 15.0, 0.0));
    assert_eq!(area.area_to_cover.size(), DVec3::new(50.0, 30.0, 40.0));
}
