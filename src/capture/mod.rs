pub mod gcp;

use std::sync::Arc;

use glam::{DQuat, DVec3};
use image::{Rgb, RgbImage};

use crate::survey::CameraDefinition;
use crate::terrain::Terrain;

const SKY_COLOR: [u8; 3] = [135, 206, 235];
const GROUND_COLOR: [u8; 3] = [174, 144, 107];
const CROWN_COLOR: [u8; 3] = [34, 139, 34];

/// Terrain march step in meters; hits are refined by bisection afterwards.
const MARCH_STEP: f64 = 1.0;
const MAX_RAY_DISTANCE: f64 = 10000.0;

/// Pinhole camera with a pose in world space. Projection follows the
/// physical sensor: focal length and sensor sizes share the same unit.
pub struct CameraModel {
    pub definition: CameraDefinition,
    position: DVec3,
    rotation: DQuat,
}

impl CameraModel {
    pub fn new(definition: CameraDefinition) -> Self {
        Self { definition, position: DVec3::ZERO, rotation: DQuat::IDENTITY }
    }

    pub fn set_pose(&mut self, position: DVec3, rotation: DQuat) {
        self.position = position;
        self.rotation = rotation;
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn rotation(&self) -> DQuat {
        self.rotation
    }

    /// Project a world point into viewport coordinates: x and y in [0, 1]
    /// inside the frame with (0, 0) at the bottom-left, z the forward
    /// distance from the camera plane.
    pub fn world_to_viewport(&self, point: DVec3) -> DVec3 {
        let local = self.rotation.inverse() * (point - self.position);
        let x = self.definition.focal_length * local.x
            / (local.z * self.definition.sensor_size_x)
            + 0.5;
        let y = self.definition.focal_length * local.y
            / (local.z * self.definition.sensor_size_y)
            + 0.5;
        DVec3::new(x, y, local.z)
    }

    /// Project a world point to pixel coordinates, bottom-left origin.
    pub fn world_to_screen(&self, point: DVec3) -> (i32, i32) {
        let viewport = self.world_to_viewport(point);
        (
            (viewport.x * f64::from(self.definition.resolution_x)).round() as i32,
            (viewport.y * f64::from(self.definition.resolution_y)).round() as i32,
        )
    }

    /// World-space ray direction through the center of pixel (x, y).
    fn pixel_ray(&self, x: u32, y: u32) -> DVec3 {
        let u = (f64::from(x) + 0.5) / f64::from(self.definition.resolution_x) - 0.5;
        let v = (f64::from(y) + 0.5) / f64::from(self.definition.resolution_y) - 0.5;
        let local = DVec3::new(
            u * self.definition.sensor_size_x / self.definition.focal_length,
            v * self.definition.sensor_size_y / self.definition.focal_length,
            1.0,
        );
        (self.rotation * local).normalize()
    }
}

/// A rendered frame. Pixel row 0 is the bottom of the frame, matching the
/// viewport convention; `to_rgb_image` flips for top-down file formats.
pub struct CapturedImage {
    pub width: u32,
    pub height: u32,
    pixels: Vec<[u8; 3]>,
}

impl CapturedImage {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![SKY_COLOR; width as usize * height as usize],
        }
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.pixels[y as usize * self.width as usize + x as usize] = color;
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        let mut image = RgbImage::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                image.put_pixel(x, self.height - 1 - y, Rgb(self.get_pixel(x, y)));
            }
        }
        image
    }
}

struct CrownSphere {
    center: DVec3,
    radius: f64,
}

/// Renderable view of the terrain: the heightfield, every valid vegetation
/// instance reduced to its crown sphere, and the control point markers.
pub struct SceneModel {
    terrain: Arc<Terrain>,
    crowns: Vec<CrownSphere>,
}

impl SceneModel {
    pub fn new(terrain: Arc<Terrain>) -> Self {
        let mut crowns = Vec::new();
        for instance in &terrain.tree_instances {
            let Some(prototype) = terrain.tree_prototypes.get(instance.prototype_index) else {
                continue;
            };
            let position = terrain.tree_world_position(instance);
            crowns.push(CrownSphere {
                center: position
                    + DVec3::Y
                        * ((prototype.trunk_height + prototype.crown_height / 2.0)
                            * instance.height_scale),
                radius: prototype.crown_radius * instance.width_scale,
            });
        }
        Self { terrain, crowns }
    }

    pub fn render(&self, camera: &CameraModel) -> CapturedImage {
        let mut image =
            CapturedImage::new(camera.definition.resolution_x, camera.definition.resolution_y);
        for y in 0..image.height {
            for x in 0..image.width {
                let direction = camera.pixel_ray(x, y);
                if let Some(color) = self.trace(camera.position(), direction) {
                    image.set_pixel(x, y, color);
                }
            }
        }
        image
    }

    /// Nearest surface along the ray, or None for sky.
    fn trace(&self, origin: DVec3, direction: DVec3) -> Option<[u8; 3]> {
        let terrain_hit = self.march_terrain(origin, direction);
        let crown_hit = self.nearest_crown(origin, direction);

        match (terrain_hit, crown_hit) {
            (Some(t_terrain), Some(t_crown)) if t_crown < t_terrain => Some(CROWN_COLOR),
            (None, Some(_)) => Some(CROWN_COLOR),
            (Some(t_terrain), _) => {
                let point = origin + direction * t_terrain;
                Some(self.ground_color(point))
            }
            (None, None) => None,
        }
    }

    fn march_terrain(&self, origin: DVec3, direction: DVec3) -> Option<f64> {
        let floor = self.terrain.position.y;
        let mut previous_t = 0.0;
        let mut t = MARCH_STEP;
        while t < MAX_RAY_DISTANCE {
            let point = origin + direction * t;
            if let Some(height) = self.terrain.height_at_world(point.x, point.z) {
                if point.y <= height {
                    return Some(self.refine_terrain_hit(origin, direction, previous_t, t));
                }
            }
            if direction.y < 0.0 && point.y < floor {
                // Below the terrain volume and still descending.
                return None;
            }
            previous_t = t;
            t += MARCH_STEP;
        }
        None
    }

    fn refine_terrain_hit(&self, origin: DVec3, direction: DVec3, mut low: f64, mut high: f64) -> f64 {
        for _ in 0..16 {
            let mid = (low + high) / 2.0;
            let point = origin + direction * mid;
            let below = self
                .terrain
                .height_at_world(point.x, point.z)
                .is_some_and(|height| point.y <= height);
            if below {
                high = mid;
            } else {
                low = mid;
            }
        }
        (low + high) / 2.0
    }

    fn nearest_crown(&self, origin: DVec3, direction: DVec3) -> Option<f64> {
        let mut nearest: Option<f64> = None;
        for crown in &self.crowns {
            let oc = origin - crown.center;
            let b = oc.dot(direction);
            let c = oc.length_squared() - crown.radius * crown.radius;
            let discriminant = b * b - c;
            if discriminant < 0.0 {
                continue;
            }
            let t = -b - discriminant.sqrt();
            if t <= 0.0 {
                continue;
            }
            if nearest.is_none_or(|current| t < current) {
                nearest = Some(t);
            }
        }
        nearest
    }

    /// Bare ground shaded by relative altitude, or a marker color when the
    /// hit lands on a control point disc.
    fn ground_color(&self, point: DVec3) -> [u8; 3] {
        for marker in &self.terrain.control_points {
            let lateral = DVec3::new(
                point.x - marker.position.x,
                0.0,
                point.z - marker.position.z,
            )
            .length();
            if lateral <= marker.radius {
                return marker.color;
            }
        }

        let relative = if self.terrain.size.y > 0.0 {
            ((point.y - self.terrain.position.y) / self.terrain.size.y).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let shade = 0.6 + 0.4 * relative;
        [
            (f64::from(GROUND_COLOR[0]) * shade).round() as u8,
            (f64::from(GROUND_COLOR[1]) * shade).round() as u8,
            (f64::from(GROUND_COLOR[2]) * shade).round() as u8,
        ]
    }
}
