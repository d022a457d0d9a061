// MODEL: Scene, camera, character and control state
pub mod bounds;
pub mod camera;
pub mod character;
pub mod controls;
pub mod scene;
pub mod scenery;

pub use bounds::Aabb;
pub use camera::Camera;
pub use character::CharacterTransform;
pub use controls::{ControlFlag, ControlState, ControlStore, Intent, Intents, SharedControls, SubscriptionId};
pub use scene::{LeafMesh, NodeKind, SceneGraph, SceneNode, Transform};
