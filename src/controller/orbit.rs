use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Vec2, Vec3};

use crate::model::Camera;

/// Contract of the user-driven orbit control. While enabled it is the only
/// writer of the camera's rotation.
pub trait OrbitControl {
    fn enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
    fn target(&self) -> Vec3;
    fn set_target(&mut self, target: Vec3);
    /// Queue a user drag, in radians (azimuth, polar).
    fn rotate(&mut self, delta: Vec2);
    /// Apply pending drag input and aim the camera at the target. Returns
    /// false when the camera was left untouched.
    fn update(&mut self, camera: &mut Camera, dt: f32) -> bool;
}

/// Spherical orbit around a target point: no panning, no zoom, the polar
/// angle kept above the ground, drag input damped over a few frames.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    enabled: bool,
    target: Vec3,
    pending: Vec2,
    /// Radians per pixel of drag.
    pub rotate_speed: f32,
    /// Fraction of pending rotation consumed per update; 1.0 (or anything
    /// non-positive) applies the whole drag at once.
    pub damping_factor: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
}

const MIN_PENDING: f32 = 1e-6;

/// Default pointer sensitivity.
pub const DRAG_RADIANS_PER_PIXEL: f32 = 0.005;

/// Queued rotation for a pointer drag of (`dx`, `dy`) pixels.
pub fn drag_rotation(dx: f32, dy: f32, radians_per_pixel: f32) -> Vec2 {
    Vec2::new(-dx, -dy) * radians_per_pixel
}

impl OrbitControls {
    pub fn new() -> Self {
        Self {
            enabled: true,
            target: Vec3::ZERO,
            pending: Vec2::ZERO,
            rotate_speed: DRAG_RADIANS_PER_PIXEL,
            damping_factor: 0.2,
            min_polar_angle: 0.0,
            max_polar_angle: FRAC_PI_2,
        }
    }

    /// Convert a pointer drag in pixels into queued rotation.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.rotate(drag_rotation(dx, dy, self.rotate_speed));
    }

    pub fn pending(&self) -> Vec2 {
        self.pending
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new()
    }
}

impl OrbitControl for OrbitControls {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.pending = Vec2::ZERO;
        }
        self.enabled = enabled;
    }

    fn target(&self) -> Vec3 {
        self.target
    }

    fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    fn rotate(&mut self, delta: Vec2) {
        if self.enabled && delta.is_finite() {
            self.pending += delta;
        }
    }

    fn update(&mut self, camera: &mut Camera, _dt: f32) -> bool {
        if !self.enabled {
            return false;
        }
        let offset = camera.position - self.target;
        let radius = offset.length();
        if radius < 1e-6 {
            return false;
        }

        let factor = if self.damping_factor > 0.0 { self.damping_factor.min(1.0) } else { 1.0 };
        let step = self.pending * factor;
        self.pending -= step;
        if self.pending.length_squared() < MIN_PENDING * MIN_PENDING {
            self.pending = Vec2::ZERO;
        }

        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();
        theta += step.x;
        phi += step.y;
        // keep off the poles so look_at stays well defined
        let eps = 1e-4;
        phi = phi.clamp(self.min_polar_angle.max(eps), self.max_polar_angle.min(PI - eps));

        let sin_phi = phi.sin();
        camera.position = self.target
            + Vec3::new(sin_phi * theta.sin(), phi.cos(), sin_phi * theta.cos()) * radius;
        camera.look_at(self.target);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at(position: Vec3) -> Camera {
        let mut camera = Camera::new(800, 600);
        camera.position = position;
        camera
    }

    #[test]
    fn test_update_without_input_only_reaims() {
        let mut controls = OrbitControls::new();
        controls.set_target(Vec3::new(1.5, 0.0, 7.5));
        let mut camera = camera_at(Vec3::new(1.5, 2.0, 12.0));
        controls.update(&mut camera, 0.016);
        assert!(camera.position.abs_diff_eq(Vec3::new(1.5, 2.0, 12.0), 1e-4), "got {:?}", camera.position);
        let aim = (controls.target() - camera.position).normalize();
        assert!(camera.forward().abs_diff_eq(aim, 1e-4));
    }

    #[test]
    fn test_drag_orbits_at_constant_radius() {
        let mut controls = OrbitControls::new();
        let mut camera = camera_at(Vec3::new(0.0, 2.0, 5.0));
        let radius = camera.position.length();
        controls.drag(120.0, 0.0);
        for _ in 0..120 {
            controls.update(&mut camera, 0.016);
        }
        assert!((camera.position.length() - radius).abs() < 1e-3);
        assert!(camera.position.x.abs() > 0.1, "azimuth should have changed");
        assert_eq!(controls.pending(), Vec2::ZERO, "damped input should settle");
    }

    #[test]
    fn test_polar_angle_stays_above_ground() {
        let mut controls = OrbitControls::new();
        let mut camera = camera_at(Vec3::new(0.0, 2.0, 5.0));
        controls.rotate(Vec2::new(0.0, 3.0));
        for _ in 0..100 {
            controls.update(&mut camera, 0.016);
        }
        assert!(camera.position.y >= -1e-3, "got {:?}", camera.position);
    }

    #[test]
    fn test_disabled_control_leaves_camera_alone() {
        let mut controls = OrbitControls::new();
        controls.set_enabled(false);
        controls.rotate(Vec2::new(1.0, 0.0));
        let mut camera = camera_at(Vec3::new(0.0, 2.0, 5.0));
        let before = camera.clone();
        assert!(!controls.update(&mut camera, 0.016));
        assert_eq!(camera.position, before.position);
        assert_eq!(camera.rotation, before.rotation);
    }
}
