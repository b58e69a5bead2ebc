//! Error taxonomy shared by the loader, the device and the renderer.
//!
//! Startup failures ([`ViewerError::AssetLoad`] for the scene file,
//! [`ViewerError::ShaderCompile`]) abort before the event loop starts. Everything
//! that can go wrong for a single mesh during a frame is recovered by the
//! [`crate::render::SceneRenderer`] and only logged.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ViewerError>;

#[derive(Error, Debug)]
pub enum ViewerError {
    /// A scene or texture file is missing, unreadable or malformed.
    #[error("failed to load asset {path:?}: {reason}")]
    AssetLoad { path: PathBuf, reason: String },

    #[error("{stage} shader failed to compile: {reason}")]
    ShaderCompile { stage: &'static str, reason: String },

    /// Buffer or texture allocation rejected by the device.
    #[error("device resource error: {0}")]
    DeviceResource(String),

    #[error("mesh {mesh:?} references vertex {index} but only has {vertex_count} vertices")]
    InvalidMesh {
        mesh: String,
        index: u32,
        vertex_count: usize,
    },

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

impl ViewerError {
    pub fn asset(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        ViewerError::AssetLoad {
            path: path.as_ref().to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
