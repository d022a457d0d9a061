use glam::{Quat, Vec3};

use crate::model::Camera;

/// Normal of the ground plane movement is flattened onto.
pub const GROUND_NORMAL: Vec3 = Vec3::Y;

/// Camera-relative movement axes on the ground plane. Not normalized: a camera
/// pitched towards the ground yields shorter vectors, and a camera looking
/// straight down yields zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Directions {
    pub forward: Vec3,
    /// `forward` turned a quarter turn counter-clockwise about up (to the left).
    pub side: Vec3,
}

/// Resolve the movement axes from the camera's current orientation. Must be
/// called every tick; the camera can rotate between frames.
pub fn resolve(camera: &Camera) -> Directions {
    let forward = project_on_ground(camera.forward());
    let side = Quat::from_axis_angle(GROUND_NORMAL, std::f32::consts::FRAC_PI_2) * forward;
    Directions { forward, side }
}

pub fn project_on_ground(v: Vec3) -> Vec3 {
    v - GROUND_NORMAL * v.dot(GROUND_NORMAL)
}
