//! Keyboard bindings and the interactive state they drive.

use winit::keyboard::KeyCode;

use crate::{
    camera::{CameraController, CameraMove},
    config::{Profile, ViewerConfig},
    pipelines::light::{Lighting, ShadingMode, ShadingState},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerKey {
    Left,
    Right,
    Up,
    Down,
    Forward,
    Back,
    StrafeLeft,
    StrafeRight,
    Shading(ShadingMode),
    Escape,
}

impl ViewerKey {
    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        let key = match code {
            KeyCode::ArrowLeft => ViewerKey::Left,
            KeyCode::ArrowRight => ViewerKey::Right,
            KeyCode::ArrowUp => ViewerKey::Up,
            KeyCode::ArrowDown => ViewerKey::Down,
            KeyCode::KeyW => ViewerKey::Forward,
            KeyCode::KeyS => ViewerKey::Back,
            KeyCode::KeyA => ViewerKey::StrafeLeft,
            KeyCode::KeyD => ViewerKey::StrafeRight,
            KeyCode::Digit1 => ViewerKey::Shading(ShadingMode::Default),
            KeyCode::Digit2 => ViewerKey::Shading(ShadingMode::Sunny),
            KeyCode::Digit3 => ViewerKey::Shading(ShadingMode::Night),
            KeyCode::Digit4 => ViewerKey::Shading(ShadingMode::InvertedSun),
            KeyCode::Escape => ViewerKey::Escape,
            _ => return None,
        };
        Some(key)
    }
}

/// Camera and shading state of one viewer session.
#[derive(Clone, Debug)]
pub struct Controls {
    pub camera: CameraController,
    pub shading: ShadingState,
}

impl Controls {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            camera: CameraController::from_config(config),
            shading: ShadingState::new(config.profile),
        }
    }

    /// Handles one key press (or auto-repeat). Returns whether anything
    /// visible changed. Escape is handled by the event loop on release.
    pub fn key_down(&mut self, key: ViewerKey) -> bool {
        let movement = match (self.camera.profile(), key) {
            (_, ViewerKey::Shading(mode)) => return self.shading.select(mode),
            (_, ViewerKey::Escape) => return false,
            (Profile::Bounded, ViewerKey::StrafeLeft | ViewerKey::StrafeRight) => return false,
            (Profile::Free, ViewerKey::Left | ViewerKey::StrafeLeft) => CameraMove::Left,
            (Profile::Free, ViewerKey::Right | ViewerKey::StrafeRight) => CameraMove::Right,
            (Profile::Free, _) => return false,
            (Profile::Bounded, ViewerKey::Left) => CameraMove::Left,
            (Profile::Bounded, ViewerKey::Right) => CameraMove::Right,
            (Profile::Bounded, ViewerKey::Up) => CameraMove::Up,
            (Profile::Bounded, ViewerKey::Down) => CameraMove::Down,
            (Profile::Bounded, ViewerKey::Forward) => CameraMove::Forward,
            (Profile::Bounded, ViewerKey::Back) => CameraMove::Back,
        };
        self.camera.apply(movement)
    }

    pub fn lighting(&self) -> Lighting {
        self.shading.lighting()
    }

    pub fn view_matrix(&self) -> cgmath::Matrix4<f32> {
        self.camera.view_matrix()
    }
}
