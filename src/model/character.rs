use glam::{Affine3A, Quat, Vec3};

use super::{Aabb, Camera};

/// Transform of the single controllable character.
///
/// `local_bounds` is the model-space box of the character mesh; the world box
/// used for collision is derived from it on demand.
#[derive(Debug, Clone)]
pub struct CharacterTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub local_bounds: Aabb,
}

impl CharacterTransform {
    pub fn new(position: Vec3, local_bounds: Aabb) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            local_bounds,
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Place the character on the ground plane `distance` units ahead of the
    /// camera's horizontal viewing direction.
    pub fn in_front_of(camera: &Camera, distance: f32, local_bounds: Aabb) -> Self {
        let mut ahead = camera.forward();
        ahead.y = 0.0;
        let ahead = ahead.normalize_or_zero() * distance;
        let ground = Vec3::new(camera.position.x, 0.0, camera.position.z);
        Self::new(ground + ahead, local_bounds)
    }

    pub fn world_transform(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    pub fn bounding_box(&self) -> Aabb {
        self.local_bounds.transformed(&self.world_transform())
    }

    /// Unit vector the model's front (+Z) points along.
    pub fn facing(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Yaw-only rotation turning the model's front towards `target`, or `None`
    /// when `target` is directly above/below the character.
    pub fn rotation_towards(&self, target: Vec3) -> Option<Quat> {
        let dir = target - self.position;
        if dir.x * dir.x + dir.z * dir.z < 1e-12 {
            return None;
        }
        Some(Quat::from_rotation_y(dir.x.atan2(dir.z)))
    }

    /// Turn to face `target` at once. Returns false if there was no usable
    /// direction.
    pub fn face_towards(&mut self, target: Vec3) -> bool {
        match self.rotation_towards(target) {
            Some(rotation) => {
                self.rotation = rotation;
                true
            }
            None => false,
        }
    }
}
