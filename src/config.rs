//! Viewer configuration profiles.
//!
//! The viewer ships two profiles of the same design:
//!
//! - `Bounded` restricts the camera to a corridor around the model, enables
//!   the four shading presets and runs at 30 frames per second
//! - `Free` moves the camera without bounds, uses a fixed light and runs at
//!   15 frames per second
//!
//! [`ViewerConfig::from_env`] lets the binary pick a profile and asset paths
//! via `VIEWER_PROFILE`, `VIEWER_MODEL` and `VIEWER_SHADERS`.

use std::path::PathBuf;

/// Camera and lighting behaviour selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Bounded,
    Free,
}

impl Profile {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bounded" => Some(Profile::Bounded),
            "free" => Some(Profile::Free),
            _ => None,
        }
    }
}

/// Locations of the two shader stages that make up the program.
#[derive(Clone, Debug, PartialEq)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl ShaderPaths {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            vertex: dir.join("vertex_shader.wgsl"),
            fragment: dir.join("fragment_shader.wgsl"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewerConfig {
    pub profile: Profile,
    pub model_path: PathBuf,
    pub shaders: ShaderPaths,
    /// Fixed output surface size in pixels.
    pub viewport: [u32; 2],
    pub frame_rate: u32,
    pub camera_start: [f32; 3],
    /// Initial heading in degrees.
    pub camera_angle: f32,
    pub camera_speed: f32,
}

impl ViewerConfig {
    pub const VIEWPORT: [u32; 2] = [800, 600];

    pub fn bounded() -> Self {
        Self {
            profile: Profile::Bounded,
            model_path: PathBuf::from("./models/hokage/office_2.obj"),
            shaders: ShaderPaths::in_dir("./assets/shaders"),
            viewport: Self::VIEWPORT,
            frame_rate: 30,
            camera_start: [14.283286, 35.90461, 158.73952],
            camera_angle: 340.0,
            camera_speed: 15.0,
        }
    }

    pub fn free() -> Self {
        Self {
            profile: Profile::Free,
            frame_rate: 15,
            camera_angle: 0.0,
            ..Self::bounded()
        }
    }

    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Bounded => Self::bounded(),
            Profile::Free => Self::free(),
        }
    }

    pub fn from_env() -> Self {
        let profile = match std::env::var("VIEWER_PROFILE") {
            Ok(value) => Profile::parse(&value).unwrap_or_else(|| {
                log::warn!("Unknown VIEWER_PROFILE {value:?}, falling back to bounded.");
                Profile::Bounded
            }),
            Err(_) => Profile::Bounded,
        };
        let mut config = Self::for_profile(profile);
        if let Ok(model) = std::env::var("VIEWER_MODEL") {
            config.model_path = PathBuf::from(model);
        }
        if let Ok(dir) = std::env::var("VIEWER_SHADERS") {
            config.shaders = ShaderPaths::in_dir(dir);
        }
        config
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.viewport[0] as f32 / self.viewport[1].max(1) as f32
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::bounded()
    }
}
