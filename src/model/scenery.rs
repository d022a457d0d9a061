//! The forest clearing the controller ships with: a wizard, two rock piles,
//! three trees, a sparkle cloud and lights around a textured ground plane.
//! Mesh bounds are hand-measured approximations of the source models.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Quat, Vec3};

use super::{Aabb, Camera, CharacterTransform, SceneGraph, SceneNode};

pub const CHARACTER_NODE: &str = "character";
pub const GROUND_NODE: &str = "ground";

/// Ground distance between the camera and the character at start-up.
pub const CHARACTER_DISTANCE: f32 = 4.5;

fn tree(at: Vec3, yaw_deg: f32) -> SceneNode {
    SceneNode::group("tree")
        .at(at)
        .rotated(Quat::from_rotation_y(yaw_deg.to_radians()))
        .child(SceneNode::mesh(
            "treeD_graveyard",
            Aabb::new(Vec3::new(-0.6, 0.0, -0.6), Vec3::new(0.6, 3.2, 0.6)),
        ))
}

fn rocks(at: Vec3, yaw: f32) -> SceneNode {
    // model is authored lying on its back
    SceneNode::group("rocks")
        .at(at)
        .rotated(Quat::from_rotation_y(yaw))
        .child(
            SceneNode::mesh(
                "rocksA_forest",
                Aabb::new(Vec3::new(-0.9, -0.7, -0.6), Vec3::new(0.9, 0.7, 0.0)),
            )
            .rotated(Quat::from_rotation_x(FRAC_PI_2)),
        )
}

pub fn character_bounds() -> Aabb {
    Aabb::new(Vec3::new(-0.2, 0.0, -0.2), Vec3::new(0.2, 0.9, 0.2))
}

pub fn demo_scene() -> SceneGraph {
    let mut scene = SceneGraph::new();
    scene
        .add(SceneNode::light("hemisphere"))
        .add(SceneNode::light("ambient"))
        .add(SceneNode::light("sun").at(Vec3::new(4.0, 5.0, 5.0)))
        .add(
            SceneNode::mesh(
                GROUND_NODE,
                Aabb::new(Vec3::new(-25.0, -25.0, 0.0), Vec3::new(25.0, 25.0, 0.1)),
            )
            .at(Vec3::new(0.0, -0.1, 0.0))
            .rotated(Quat::from_rotation_x(-FRAC_PI_2)),
        )
        .add(
            SceneNode::group(CHARACTER_NODE)
                .child(SceneNode::mesh("Chapeau", character_bounds())),
        )
        .add(
            SceneNode::group("wizard")
                .scaled(Vec3::splat(1.91))
                .child(SceneNode::group("root"))
                .child(SceneNode::mesh(
                    "druid",
                    Aabb::new(Vec3::new(-0.3, 0.0, -0.3), Vec3::new(0.3, 1.0, 0.3)),
                )),
        )
        .add(rocks(Vec3::new(2.5, 0.0, -9.0), -2.0))
        .add(rocks(Vec3::new(-1.5, 0.0, 2.0), 0.0))
        .add(tree(Vec3::new(4.0, 0.0, -8.0), 0.0))
        .add(tree(Vec3::new(3.0, 0.0, -12.0), -50.0))
        .add(tree(Vec3::new(6.0, 0.0, -10.0), 140.0))
        .add(SceneNode::points("sparkles").at(Vec3::new(4.0, 2.5, -10.0)));
    scene
}

pub fn demo_camera(width: u32, height: u32) -> Camera {
    let mut camera = Camera::new(width, height);
    camera.position = Vec3::new(1.5, 2.0, 12.0);
    camera.rotation = Quat::from_rotation_x(-0.3);
    camera.fov_y = 45f32.to_radians();
    camera
}

pub fn demo_character(camera: &Camera) -> CharacterTransform {
    CharacterTransform::in_front_of(camera, CHARACTER_DISTANCE, character_bounds())
        .with_rotation(Quat::from_rotation_y(PI))
        .with_scale(Vec3::splat(1.5))
}
