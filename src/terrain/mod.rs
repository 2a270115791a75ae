use anyhow::{Context, Result};
use glam::DVec3;
use serde::Deserialize;

use crate::math::Bounds3;

/// Normalized square heightfield. Samples are in [0, 1] and scale to the
/// terrain's vertical size; row index runs along +Z, column index along +X.
#[derive(Debug, Clone, Deserialize)]
pub struct Heightmap {
    pub resolution: usize,
    pub heights: Vec<Vec<f64>>,
}

impl Heightmap {
    /// Bilinear sample at local coordinates (0.0 to 1.0) on both axes.
    pub fn sample(&self, u: f64, v: f64) -> f64 {
        let max_idx = (self.resolution - 1) as f64;
        let x = u.clamp(0.0, 1.0) * max_idx;
        let z = v.clamp(0.0, 1.0) * max_idx;

        let x0 = x.floor() as usize;
        let z0 = z.floor() as usize;
        let x1 = (x0 + 1).min(self.resolution - 1);
        let z1 = (z0 + 1).min(self.resolution - 1);

        let tx = x - x0 as f64;
        let tz = z - z0 as f64;

        let h00 = self.heights[z0][x0];
        let h10 = self.heights[z0][x1];
        let h01 = self.heights[z1][x0];
        let h11 = self.heights[z1][x1];

        let h0 = h00 * (1.0 - tx) + h10 * tx;
        let h1 = h01 * (1.0 - tx) + h11 * tx;

        h0 * (1.0 - tz) + h1 * tz
    }
}

/// Renderable vegetation archetype. Dimensions are meters at unit scale;
/// the crown is the collision volume used for probing and occlusion.
#[derive(Debug, Clone, Deserialize)]
pub struct TreePrototype {
    pub name: String,
    pub crown_radius: f64,
    pub crown_height: f64,
    pub trunk_height: f64,
}

/// One placed vegetation instance. Position components are normalized to
/// the terrain's size on each axis, rotation is radians around +Y.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TreeInstance {
    pub position: DVec3,
    pub rotation: f64,
    pub width_scale: f64,
    pub height_scale: f64,
    pub prototype_index: usize,
}

/// A surveyed ground marker with a distinguishing color, placed in world
/// coordinates on the terrain surface.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlPointMarker {
    pub position: DVec3,
    pub color: [u8; 3],
    #[serde(default = "default_marker_radius")]
    pub radius: f64,
}

fn default_marker_radius() -> f64 {
    1.0
}

/// The terrain model: a heightfield, its placed vegetation, and any ground
/// control markers. `position` is the minimum corner of the terrain volume.
#[derive(Debug, Clone, Deserialize)]
pub struct Terrain {
    pub position: DVec3,
    pub size: DVec3,
    pub heightmap: Heightmap,
    #[serde(default)]
    pub tree_prototypes: Vec<TreePrototype>,
    #[serde(default)]
    pub tree_instances: Vec<TreeInstance>,
    #[serde(default)]
    pub control_points: Vec<ControlPointMarker>,
}

impl Terrain {
    pub fn bounds(&self) -> Bounds3 {
        Bounds3::new(self.position + self.size / 2.0, self.size)
    }

    /// Terrain surface altitude at a world (x, z), or None outside the
    /// terrain's horizontal footprint.
    pub fn height_at_world(&self, x: f64, z: f64) -> Option<f64> {
        let u = (x - self.position.x) / self.size.x;
        let v = (z - self.position.z) / self.size.z;
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None;
        }
        Some(self.position.y + self.heightmap.sample(u, v) * self.size.y)
    }

    /// World position of a tree instance (normalized coordinates scaled to
    /// the terrain volume, offset by the terrain origin).
    pub fn tree_world_position(&self, tree: &TreeInstance) -> DVec3 {
        DVec3::new(
            tree.position.x * self.size.x,
            tree.position.y * self.size.y,
            tree.position.z * self.size.z,
        ) + self.position
    }
}

pub fn load_terrain_from_json(path: &str) -> Result<Terrain> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {path}"))?;
    let reader = std::io::BufReader::new(file);
    let terrain: Terrain = serde_json::from_reader(reader)?;
    Ok(terrain)
}
