use bytemuck::{Pod, Zeroable};

use crate::controller::volumes::BoundingVolume;
use crate::model::Aabb;

/// Yellow, as drawn over the scenery.
pub const OUTLINE_COLOR: [f32; 4] = [1.0, 1.0, 0.0, 1.0];

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub color: [f32; 4],
}

/// Indexed line list.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

// corner order follows `Aabb::corners`
const BOX_EDGES: [u32; 24] = [
    0, 1, 1, 2, 2, 3, 3, 0, // min z face
    4, 5, 5, 6, 6, 7, 7, 4, // max z face
    0, 4, 1, 5, 2, 6, 3, 7, // connecting edges
];

impl Mesh {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    /// Append the twelve edges of `bounds`.
    pub fn push_outline(&mut self, bounds: &Aabb, color: [f32; 4]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(bounds.corners().iter().map(|c| Vertex {
            pos: c.to_array(),
            color,
        }));
        self.indices.extend(BOX_EDGES.iter().map(|i| base + i));
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Un-indexed xyz triples, two per line, for hosts that draw plain line
    /// segments.
    pub fn line_positions(&self) -> Vec<f32> {
        self.indices
            .iter()
            .filter_map(|&i| self.vertices.get(i as usize))
            .flat_map(|v| v.pos)
            .collect()
    }
}

/// Outline every collision volume, built once the volumes exist.
pub fn outline_volumes(volumes: &[BoundingVolume]) -> Mesh {
    let mut mesh = Mesh::empty();
    for volume in volumes {
        mesh.push_outline(&volume.bounds, OUTLINE_COLOR);
    }
    mesh
}

/// Debug overlay of the static collision volumes. Hidden until the
/// `ShowBounds` flag is set.
#[derive(Debug, Clone, Default)]
pub struct DebugBounds {
    mesh: Option<Mesh>,
    visible: bool,
}

impl DebugBounds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the overlay the first time volumes are available.
    pub fn refresh(&mut self, volumes: Option<&[BoundingVolume]>, show: bool) {
        if self.mesh.is_none() {
            if let Some(volumes) = volumes {
                let mesh = outline_volumes(volumes);
                tracing::debug!(boxes = volumes.len(), lines = mesh.indices.len() / 2, "debug bounds built");
                self.mesh = Some(mesh);
            }
        }
        if show != self.visible {
            tracing::debug!(show, "debug bounds visibility");
            self.visible = show;
        }
    }

    pub fn is_built(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.visible && self.mesh.is_some()
    }

    /// The mesh to draw this frame, if any.
    pub fn visible_mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref().filter(|_| self.visible)
    }
}
