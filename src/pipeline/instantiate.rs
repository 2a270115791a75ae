use std::sync::Arc;

use glam::DVec3;

use crate::math::Bounds3;
use crate::pipeline::{IoKind, Task, TaskIo};
use crate::terrain::Terrain;

/// Instances considered per processing increment.
const TREES_PER_STEP: usize = 100;

/// Crown collision volume of a materialized tree, scaled from its prototype.
#[derive(Debug, Clone, Copy)]
pub struct TreeCollider {
    pub crown_center: DVec3,
    pub crown_radius: f64,
}

/// A vegetation instance materialized inside the capture bound.
#[derive(Debug, Clone)]
pub struct InstantiatedTree {
    pub name: String,
    pub position: DVec3,
    pub scale: DVec3,
    pub collider: TreeCollider,
}

/// Output of the instantiation stage: the capture bound plus the container
/// of materialized trees.
pub struct TreeInstantiationResult {
    pub bounds: Bounds3,
    pub trees: Vec<InstantiatedTree>,
}

/// Stage 1: walks the terrain's vegetation list in bounded batches,
/// materializing every instance whose bounding volume intersects the
/// capture bound, then attaches crown colliders on completion.
pub struct TreeInstantiator {
    terrain: Arc<Terrain>,
    bounds: Bounds3,
    created_trees: usize,
    trees: Vec<InstantiatedTree>,
    // Source instance index per materialized tree, for collider attachment.
    instance_indices: Vec<usize>,
    result: Option<TreeInstantiationResult>,
}

impl TreeInstantiator {
    /// The capture bound is a rectangle of `area_width` x `area_distance`
    /// centered on the terrain's bounding volume, spanning its full height.
    pub fn new(terrain: Arc<Terrain>, area_width: f64, area_distance: f64) -> Self {
        let terrain_bounds = terrain.bounds();
        let bounds = Bounds3::new(
            terrain_bounds.center,
            DVec3::new(area_width, terrain_bounds.size().y, area_distance),
        );
        Self {
            terrain,
            bounds,
            created_trees: 0,
            trees: Vec::new(),
            instance_indices: Vec::new(),
            result: None,
        }
    }

    fn instantiate_next_batch(&mut self) {
        let instance_count = self.terrain.tree_instances.len();
        for _ in 0..TREES_PER_STEP {
            if self.created_trees >= instance_count {
                break;
            }
            let index = self.created_trees;
            self.created_trees += 1;

            let instance = self.terrain.tree_instances[index];
            if instance.prototype_index >= self.terrain.tree_prototypes.len() {
                // Out-of-range prototype: skip the instance, not the run.
                continue;
            }
            let position = self.terrain.tree_world_position(&instance);
            let scale =
                DVec3::new(instance.width_scale, instance.height_scale, instance.width_scale);
            let tree_bounds = Bounds3::new(position, scale);
            if self.bounds.intersects(&tree_bounds) {
                self.trees.push(InstantiatedTree {
                    name: format!("Tree_{index}"),
                    position,
                    scale,
                    // Placeholder; real colliders are attached once all
                    // instances have been considered.
                    collider: TreeCollider { crown_center: position, crown_radius: 0.0 },
                });
                self.instance_indices.push(index);
            }
        }
    }

    fn attach_colliders(&mut self) {
        for (tree, &index) in self.trees.iter_mut().zip(&self.instance_indices) {
            let instance = self.terrain.tree_instances[index];
            let prototype = &self.terrain.tree_prototypes[instance.prototype_index];
            tree.collider = TreeCollider {
                crown_center: tree.position
                    + DVec3::Y
                        * ((prototype.trunk_height + prototype.crown_height / 2.0)
                            * tree.scale.y),
                crown_radius: prototype.crown_radius * tree.scale.x,
            };
        }
    }
}

impl Task for TreeInstantiator {
    fn description(&self) -> String {
        "Copying trees outside of the terrain...".to_string()
    }

    fn input_kind(&self) -> IoKind {
        IoKind::Empty
    }

    fn output_kind(&self) -> IoKind {
        IoKind::Instantiation
    }

    fn take_input(&mut self, _input: TaskIo) {}

    fn continue_processing(&mut self) -> f64 {
        let instance_count = self.terrain.tree_instances.len();
        if instance_count == 0 {
            if self.result.is_none() {
                self.result = Some(TreeInstantiationResult {
                    bounds: self.bounds,
                    trees: Vec::new(),
                });
            }
            return 1.0;
        }

        self.instantiate_next_batch();

        if self.created_trees == instance_count && self.result.is_none() {
            self.attach_colliders();
            self.result = Some(TreeInstantiationResult {
                bounds: self.bounds,
                trees: std::mem::take(&mut self.trees),
            });
        }

        self.created_trees as f64 / instance_count as f64
    }

    fn take_result(&mut self) -> TaskIo {
        TaskIo::Instantiation(self.result.take().expect("instantiation result already taken"))
    }
}
