use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use glam::DVec3;
use tracing::info;

use drone_survey::config::{
    Config, SamplingConfig, build_georeferencing, build_mission, build_survey_area, load_config,
    validate_sampling,
};
use drone_survey::mission::{MissionExecution, MissionStatus};
use drone_survey::pipeline::crowns::{TreeCrownDetection, TreeCrownDrawing};
use drone_survey::pipeline::elevation::{ElevationMapExporter, ElevationMapGenerator};
use drone_survey::pipeline::instantiate::TreeInstantiator;
use drone_survey::pipeline::raycast::Raycaster;
use drone_survey::pipeline::segmentation::Segmentation;
use drone_survey::pipeline::{TaskList, TaskManager};
use drone_survey::terrain::{Terrain, load_terrain_from_json};

/// Simulation tick length in seconds, matching a 50 Hz flight loop.
const TICK: f64 = 0.02;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config_path =
        std::env::args().nth(1).unwrap_or_else(|| "assets/survey.json".to_string());
    let config = load_config(&config_path)?;
    let terrain = Arc::new(load_terrain_from_json(&config.terrain)?);
    info!(config = %config_path, terrain = %config.terrain, "loaded survey configuration");

    fly_mission(&config, terrain.clone())?;

    if let Some(sampling) = &config.sampling {
        run_sampling_tools(sampling, terrain, PathBuf::from(&config.output.folder))?;
    }
    Ok(())
}

fn fly_mission(config: &Config, terrain: Arc<Terrain>) -> Result<()> {
    let survey_area = build_survey_area(&config.survey_area, &terrain)?;
    let georeferencing = build_georeferencing(&config.georeferencing, &survey_area)?;
    let mission = build_mission(&config.flight, survey_area, config.camera)?;

    let start = DVec3::from_array(config.flight.start_position);
    let mut execution = MissionExecution::new(
        &mission,
        terrain,
        config.camera,
        &survey_area,
        georeferencing,
        PathBuf::from(&config.output.folder),
        start,
        config.flight.speed,
        config.flight.rotation_speed,
    )?;

    while execution.tick(TICK)? == MissionStatus::InProgress {}
    info!("mission finished");
    Ok(())
}

fn run_sampling_tools(
    sampling: &SamplingConfig,
    terrain: Arc<Terrain>,
    folder: PathBuf,
) -> Result<()> {
    validate_sampling(sampling)?;
    for tool in &sampling.tools {
        let sampler = || -> TaskList {
            TaskList::starting_with(Box::new(TreeInstantiator::new(
                terrain.clone(),
                sampling.area_width,
                sampling.area_distance,
            )))
        };
        let chain = match tool.as_str() {
            "elevation" => sampler()
                .with(Box::new(Raycaster::new(terrain.clone(), sampling.gsd)))?
                .with(Box::new(ElevationMapGenerator::new()))?
                .with(Box::new(ElevationMapExporter::new(
                    sampling.gsd,
                    sampling.export_arrays,
                    folder.clone(),
                )))?,
            "segmentation" => sampler()
                .with(Box::new(Raycaster::new(terrain.clone(), sampling.gsd)))?
                .with(Box::new(Segmentation::new(
                    sampling.gsd,
                    sampling.export_arrays,
                    folder.clone(),
                )))?,
            "tree_crowns" => sampler()
                .with(Box::new(Raycaster::new(terrain.clone(), sampling.gsd)))?
                .with(Box::new(TreeCrownDetection::new()))?
                .with(Box::new(TreeCrownDrawing::new(folder.clone())))?,
            other => bail!("unknown sampling tool `{other}`"),
        };

        info!(tool = %tool, "running sampling tool");
        let mut manager = TaskManager::new();
        manager.run(chain);
        let mut last_description = String::new();
        while manager.processing() && manager.progress() < 1.0 {
            manager.continue_if_processing();
            let description = manager.description();
            if description != last_description {
                info!(progress = manager.progress(), "{description}");
                last_description = description;
            }
        }
        manager.stop();
    }
    Ok(())
}
