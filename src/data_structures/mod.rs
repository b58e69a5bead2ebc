//! Viewer data structures: meshes, materials, textures and the scene graph.
//!
//! - `model` contains the vertex layout and CPU-side mesh and material definitions
//! - `texture` contains the GPU texture wrapper and creation utilities
//! - `scene_graph` holds the node hierarchy and transform composition

pub mod model;
pub mod scene_graph;
pub mod texture;
