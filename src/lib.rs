//! scene-viewer
//!
//! An interactive viewer for textured polygonal scenes. A scene file (Wavefront
//! obj with its mtl library, or glTF 2.0) is loaded into a scene graph, then
//! every frame the graph is traversed and each mesh is drawn with its world
//! transform, material colour and texture. The keyboard moves the camera and
//! switches between lighting presets.
//!
//! High-level modules
//! - `camera`: camera state, the keyboard camera controller and the projection
//! - `config`: viewer profiles (bounded and free) and asset locations
//! - `context`: the wgpu device that owns surface, buffers, textures and the pipeline
//! - `data_structures`: scene graph, meshes, materials and GPU textures
//! - `error`: the error type shared by loading and rendering
//! - `flow`: the winit event loop and frame pacing
//! - `input`: key bindings
//! - `pipelines`: the render pipeline and the lighting presets
//! - `render`: scene traversal and the device abstraction it draws through
//! - `resources`: obj/glTF loaders, geometry uploads and the texture cache
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod input;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use config::{Profile, ViewerConfig};
pub use error::{Result, ViewerError};
pub use wgpu;
