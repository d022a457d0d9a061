use once_cell::unsync::OnceCell;

use crate::model::{Aabb, SceneGraph};

/// Collision box built from one static leaf mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingVolume {
    /// Scene path of the mesh the box was built from.
    pub source: String,
    pub bounds: Aabb,
}

/// Lazily-built, write-once set of static collision volumes.
///
/// The scan runs once `settle_delay` seconds of tick time have passed since
/// the first poll, giving nested transforms time to settle. That delay is an
/// approximation of a readiness signal: until it fires, [`SceneVolumes::get`]
/// returns `None` and collision checks let every move through.
#[derive(Debug)]
pub struct SceneVolumes {
    settle_delay: f32,
    reserved: Vec<String>,
    armed_at: Option<f32>,
    volumes: OnceCell<Vec<BoundingVolume>>,
}

impl SceneVolumes {
    pub fn new(settle_delay: f32, reserved: Vec<String>) -> Self {
        Self {
            settle_delay,
            reserved,
            armed_at: None,
            volumes: OnceCell::new(),
        }
    }

    /// Advance the settle timer; builds the volumes when it expires.
    /// Returns whether volumes are available.
    pub fn poll(&mut self, now: f32, scene: &SceneGraph) -> bool {
        if self.volumes.get().is_some() {
            return true;
        }
        let armed_at = *self.armed_at.get_or_insert(now);
        if now - armed_at >= self.settle_delay {
            self.build(scene);
            true
        } else {
            false
        }
    }

    /// Scan the scene now. A no-op once volumes exist.
    pub fn build(&self, scene: &SceneGraph) -> &[BoundingVolume] {
        self.volumes.get_or_init(|| {
            let volumes: Vec<BoundingVolume> = scene
                .leaf_meshes(self.reserved.as_slice())
                .into_iter()
                .map(|leaf| BoundingVolume {
                    source: leaf.path,
                    bounds: leaf.world_bounds,
                })
                .collect();
            tracing::info!(count = volumes.len(), "built scene collision volumes");
            volumes
        })
    }

    pub fn get(&self) -> Option<&[BoundingVolume]> {
        self.volumes.get().map(Vec::as_slice)
    }

    pub fn is_built(&self) -> bool {
        self.volumes.get().is_some()
    }
}
