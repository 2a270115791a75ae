use glam::{DMat3, DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};

/// Tolerant float comparison for accumulated step sums. Relative tolerance
/// with an absolute floor so values near zero still compare equal.
pub fn approximately(a: f64, b: f64) -> bool {
    (a - b).abs() <= f64::max(1e-6 * f64::max(a.abs(), b.abs()), 8.0 * f64::EPSILON)
}

/// Rotation whose forward (+Z) axis points along `forward`, with `up`
/// resolving the roll. Both the basis construction and the resulting
/// quaternion match the engine formula the flight plans were validated
/// against, so waypoint orientations are part of the numeric contract.
pub fn look_rotation(forward: DVec3, up: DVec3) -> DQuat {
    let f = forward.normalize();
    let r = up.cross(f).normalize();
    let u = f.cross(r);
    DQuat::from_mat3(&DMat3::from_cols(r, u, f))
}

/// Rotation of `angle_deg` degrees around `axis`.
pub fn angle_axis_deg(angle_deg: f64, axis: DVec3) -> DQuat {
    DQuat::from_axis_angle(axis.normalize(), angle_deg.to_radians())
}

/// Angle in degrees between two rotations.
pub fn angle_between_deg(a: DQuat, b: DQuat) -> f64 {
    a.angle_between(b).to_degrees()
}

/// Step from `current` toward `target` by at most `max_delta`, landing
/// exactly on the target instead of overshooting.
pub fn move_towards(current: DVec3, target: DVec3, max_delta: f64) -> DVec3 {
    let to_target = target - current;
    let dist = to_target.length();
    if dist <= max_delta || dist < f64::EPSILON {
        target
    } else {
        current + to_target / dist * max_delta
    }
}

/// Rotate from `current` toward `target` by at most `max_degrees`.
pub fn rotate_towards(current: DQuat, target: DQuat, max_degrees: f64) -> DQuat {
    let angle = angle_between_deg(current, target);
    if angle <= max_degrees || angle < f64::EPSILON {
        target
    } else {
        current.slerp(target, max_degrees / angle)
    }
}

/// Euler angles in degrees, YXZ application order, each normalized to
/// [0, 360). This is the representation the flight manifest stores.
pub fn euler_angles_deg(q: DQuat) -> DVec3 {
    let (y, x, z) = q.to_euler(EulerRot::YXZ);
    DVec3::new(
        normalize_deg(x.to_degrees()),
        normalize_deg(y.to_degrees()),
        normalize_deg(z.to_degrees()),
    )
}

fn normalize_deg(deg: f64) -> f64 {
    let d = deg % 360.0;
    if d < 0.0 { d + 360.0 } else { d }
}

/// Axis-aligned box stored as center + half-extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds3 {
    pub center: DVec3,
    pub extents: DVec3,
}

impl Bounds3 {
    pub fn new(center: DVec3, size: DVec3) -> Self {
        Self { center, extents: size / 2.0 }
    }

    pub fn size(&self) -> DVec3 {
        self.extents * 2.0
    }

    pub fn min(&self) -> DVec3 {
        self.center - self.extents
    }

    pub fn max(&self) -> DVec3 {
        self.center + self.extents
    }

    pub fn contains(&self, point: DVec3) -> bool {
        let min = self.min();
        let max = self.max();
        point.x >= min.x
            && point.x <= max.x
            && point.y >= min.y
            && point.y <= max.y
            && point.z >= min.z
            && point.z <= max.z
    }

    pub fn intersects(&self, other: &Bounds3) -> bool {
        let a_min = self.min();
        let a_max = self.max();
        let b_min = other.min();
        let b_max = other.max();
        a_min.x <= b_max.x
            && a_max.x >= b_min.x
            && a_min.y <= b_max.y
            && a_max.y >= b_min.y
            && a_min.z <= b_max.z
            && a_max.z >= b_min.z
    }
}
