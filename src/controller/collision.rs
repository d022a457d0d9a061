//! Axis-level collision gate.
//!
//! A candidate displacement is either accepted whole or rejected whole; there
//! is no sliding along a blocked axis. Each query scans every stored volume
//! (no spatial index), which is fine for a small static clearing but grows
//! linearly with the scene.

use glam::Vec3;

use super::volumes::BoundingVolume;
use crate::model::Aabb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Clear,
    /// Index of the first stored volume the moved box touches.
    Blocked(usize),
    /// Volumes not built yet; movement is let through.
    NotReady,
}

impl Probe {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Probe::Blocked(_))
    }
}

/// Tests candidate moves against the scene's static volumes.
#[derive(Debug, Clone, Copy)]
pub struct CollisionGuard<'a> {
    volumes: Option<&'a [BoundingVolume]>,
}

impl<'a> CollisionGuard<'a> {
    /// `None` means the scene has not been scanned yet: every probe fails open.
    pub fn new(volumes: Option<&'a [BoundingVolume]>) -> Self {
        Self { volumes }
    }

    pub fn is_ready(&self) -> bool {
        self.volumes.is_some()
    }

    pub fn probe(&self, body: &Aabb, displacement: Vec3) -> Probe {
        let Some(volumes) = self.volumes else {
            return Probe::NotReady;
        };
        let moved = body.translated(displacement);
        volumes
            .iter()
            .position(|v| v.bounds.intersects(&moved))
            .map_or(Probe::Clear, Probe::Blocked)
    }

    pub fn is_blocked(&self, body: &Aabb, displacement: Vec3) -> bool {
        self.probe(body, displacement).is_blocked()
    }
}
