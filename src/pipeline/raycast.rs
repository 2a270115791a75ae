use std::sync::Arc;

use glam::DVec3;

use crate::pipeline::instantiate::TreeInstantiationResult;
use crate::pipeline::{IoKind, Task, TaskIo};
use crate::terrain::Terrain;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Terrain = 0,
    Tree = 1,
}

impl EntityType {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityType::Terrain => "TERRAIN",
            EntityType::Tree => "TREE",
        }
    }
}

/// One recorded probe hit: where the probe landed, what it landed on, and
/// the struck object's name (distinguishes individual tree instances).
#[derive(Debug, Clone)]
pub struct RaycastResult {
    pub hit_point: DVec3,
    pub entity_type: EntityType,
    pub entity_name: String,
}

/// Dense grid of probe results. Absent cells mean no intersection was found.
pub struct CastingResult {
    width: usize,
    height: usize,
    cells: Vec<Option<RaycastResult>>,
}

impl CastingResult {
    pub fn new(width: usize, height: usize) -> Self {
        let mut cells = Vec::new();
        cells.resize_with(width * height, || None);
        Self { width, height, cells }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> usize {
        self.width * self.height
    }

    pub fn add_result(&mut self, row: usize, col: usize, result: RaycastResult) {
        self.cells[row * self.width + col] = Some(result);
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&RaycastResult> {
        self.cells[row * self.width + col].as_ref()
    }
}

/// Stage 2: casts one grid row of downward sphere-probes per call against
/// the terrain surface and the instantiated tree crowns.
pub struct Raycaster {
    terrain: Arc<Terrain>,
    gsd_meters: f64,
    rows_calculated: usize,
    input: Option<TreeInstantiationResult>,
    result: Option<CastingResult>,
}

impl Raycaster {
    /// `gsd` is supplied in centimeters, as ground-sample distances usually
    /// are, and converted to meters here.
    pub fn new(terrain: Arc<Terrain>, gsd: f64) -> Self {
        Self {
            terrain,
            gsd_meters: gsd / 100.0,
            rows_calculated: 0,
            input: None,
            result: None,
        }
    }

    /// Downward sphere-probe at world (x, z). The probe starts high above
    /// the bound and the first (highest) surface it touches wins.
    fn sphere_probe(&self, x: f64, z: f64) -> Option<RaycastResult> {
        let probe_radius = self.gsd_meters / 2.0;
        let mut best: Option<RaycastResult> = None;

        if let Some(height) = self.terrain.height_at_world(x, z) {
            best = Some(RaycastResult {
                hit_point: DVec3::new(x, height, z),
                entity_type: EntityType::Terrain,
                entity_name: "Terrain".to_string(),
            });
        }

        let input = self.input.as_ref().expect("raycaster polled before input");
        for tree in &input.trees {
            let collider = tree.collider;
            let lateral = DVec3::new(x - collider.crown_center.x, 0.0, z - collider.crown_center.z)
                .length();
            if lateral > collider.crown_radius + probe_radius {
                continue;
            }
            // Contact height on the crown sphere, with the probe radius
            // absorbing near-miss grazes at the rim.
            let lateral_in_crown = (lateral - probe_radius).max(0.0).min(collider.crown_radius);
            let hit_y = collider.crown_center.y
                + (collider.crown_radius * collider.crown_radius
                    - lateral_in_crown * lateral_in_crown)
                    .max(0.0)
                    .sqrt();
            let better = match &best {
                Some(current) => hit_y > current.hit_point.y,
                None => true,
            };
            if better {
                best = Some(RaycastResult {
                    hit_point: DVec3::new(x, hit_y, z),
                    entity_type: EntityType::Tree,
                    entity_name: tree.name.clone(),
                });
            }
        }
        best
    }
}

impl Task for Raycaster {
    fn description(&self) -> String {
        "Raycasting the terrain to find hit points...".to_string()
    }

    fn input_kind(&self) -> IoKind {
        IoKind::Instantiation
    }

    fn output_kind(&self) -> IoKind {
        IoKind::Casting
    }

    fn take_input(&mut self, input: TaskIo) {
        let TaskIo::Instantiation(instantiation) = input else {
            panic!("raycaster fed a non-instantiation input");
        };
        let width = (instantiation.bounds.size().x / self.gsd_meters).floor() as usize;
        let height = (instantiation.bounds.size().z / self.gsd_meters).floor() as usize;
        self.result = Some(CastingResult::new(width, height));
        self.input = Some(instantiation);
    }

    fn continue_processing(&mut self) -> f64 {
        let (width, height, bounds) = {
            let input = self.input.as_ref().expect("raycaster polled before input");
            let result = self.result.as_ref().expect("raycaster polled before input");
            (result.width(), result.height(), input.bounds)
        };
        if height == 0 {
            // Degenerate bound: nothing to probe, the instances can go.
            self.input = None;
            return 1.0;
        }

        let row = self.rows_calculated;
        let z = bounds.center.z - bounds.extents.z + row as f64 * self.gsd_meters;
        for col in 0..width {
            let x = bounds.center.x - bounds.extents.x + col as f64 * self.gsd_meters;
            if let Some(hit) = self.sphere_probe(x, z) {
                self.result
                    .as_mut()
                    .expect("raycaster polled before input")
                    .add_result(row, col, hit);
            }
        }
        self.rows_calculated += 1;
        if self.rows_calculated == height {
            // The materialized vegetation is no longer needed once the last
            // row has been probed.
            self.input = None;
        }

        self.rows_calculated as f64 / height as f64
    }

    fn take_result(&mut self) -> TaskIo {
        TaskIo::Casting(self.result.take().expect("casting result already taken"))
    }
}
