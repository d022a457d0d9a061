use glam::{Affine3A, Quat, Vec3};

use super::Aabb;

/// What a node is, decided once when the scene is built.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    /// Renderable geometry with its model-space bounds.
    Mesh { bounds: Aabb },
    Light,
    Points,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Self::IDENTITY }
    }

    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    fn with_kind(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Transform::IDENTITY,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, bounds: Aabb) -> Self {
        Self::with_kind(name, NodeKind::Mesh { bounds })
    }

    pub fn light(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Light)
    }

    pub fn points(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Points)
    }

    pub fn at(mut self, translation: Vec3) -> Self {
        self.transform.translation = translation;
        self
    }

    pub fn rotated(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn scaled(mut self, scale: Vec3) -> Self {
        self.transform.scale = scale;
        self
    }

    pub fn child(mut self, node: SceneNode) -> Self {
        self.children.push(node);
        self
    }

    pub fn is_leaf_mesh(&self) -> bool {
        matches!(self.kind, NodeKind::Mesh { .. }) && self.children.is_empty()
    }
}

/// A static leaf mesh resolved to world space.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafMesh {
    /// Slash-separated names from the root, e.g. `rocks/rocksA_forest`.
    pub path: String,
    pub world_bounds: Aabb,
}

/// Read-only scene graph. The root is implicit; `nodes` are its children.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    pub nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: SceneNode) -> &mut Self {
        self.nodes.push(node);
        self
    }

    /// Every leaf mesh outside the `excluded` subtrees, with world bounds.
    /// Nodes whose name is in `excluded` are skipped together with their
    /// children, at any depth.
    pub fn leaf_meshes<S: AsRef<str>>(&self, excluded: &[S]) -> Vec<LeafMesh> {
        let mut out = Vec::new();
        for node in &self.nodes {
            collect_leaves(node, &Affine3A::IDENTITY, "", excluded, &mut out);
        }
        out
    }
}

fn collect_leaves<S: AsRef<str>>(
    node: &SceneNode,
    parent: &Affine3A,
    parent_path: &str,
    excluded: &[S],
    out: &mut Vec<LeafMesh>,
) {
    if excluded.iter().any(|name| name.as_ref() == node.name) {
        return;
    }
    let world = *parent * node.transform.to_affine();
    let path = if parent_path.is_empty() {
        node.name.clone()
    } else {
        format!("{}/{}", parent_path, node.name)
    };

    if let NodeKind::Mesh { bounds } = &node.kind {
        if node.children.is_empty() {
            out.push(LeafMesh {
                path,
                world_bounds: bounds.transformed(&world),
            });
            return;
        }
    }

    for child in &node.children {
        collect_leaves(child, &world, &path, excluded, out);
    }
}
