// VIEW: debug geometry handed to the host renderer
pub mod debug_bounds;

pub use debug_bounds::{DebugBounds, Mesh, Vertex};
