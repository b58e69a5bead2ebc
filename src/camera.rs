//! Camera state, keyboard camera controller and projection.
//!
//! The camera always looks at a fixed point in front of the model. Keys move
//! its position (and, in the bounded profile, its heading) in discrete steps
//! of `speed`. The bounded profile keeps the camera inside a corridor around
//! the model: two bands along z and an open height range for y. Moves that
//! would leave the corridor are dropped without an error.

use std::ops::RangeInclusive;

use cgmath::{EuclideanSpace, Rad};

use crate::config::{Profile, ViewerConfig};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Point the camera looks at.
pub const TARGET: cgmath::Point3<f32> = cgmath::Point3::new(10.0, 10.0, 0.0);
/// Up direction handed to `look_at_rh`. Only its direction matters.
pub const UP: cgmath::Vector3<f32> = cgmath::Vector3::new(0.0, 50.0, 0.0);

/// The two z ranges in which the camera may stand (both ends allowed).
pub const Z_BANDS: [RangeInclusive<f32>; 2] = [-240.0..=-90.0, 90.0..=240.0];
/// Exclusive height limits.
pub const MIN_HEIGHT: f32 = 4.0;
pub const MAX_HEIGHT: f32 = 180.0;

pub fn in_z_band(z: f32) -> bool {
    Z_BANDS.iter().any(|band| band.contains(&z))
}

pub fn in_height_range(y: f32) -> bool {
    y > MIN_HEIGHT && y < MAX_HEIGHT
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub position: cgmath::Vector3<f32>,
    /// Heading in degrees.
    pub angle: f32,
    pub speed: f32,
}

impl CameraState {
    pub fn new<V: Into<cgmath::Vector3<f32>>>(position: V, angle: f32, speed: f32) -> Self {
        Self {
            position: position.into(),
            angle,
            speed,
        }
    }

    pub fn view_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::look_at_rh(cgmath::Point3::from_vec(self.position), TARGET, UP)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMove {
    Left,
    Right,
    Up,
    Down,
    Forward,
    Back,
}

#[derive(Clone, Debug)]
pub struct CameraController {
    state: CameraState,
    profile: Profile,
}

impl CameraController {
    pub fn new(state: CameraState, profile: Profile) -> Self {
        Self { state, profile }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(
            CameraState::new(config.camera_start, config.camera_angle, config.camera_speed),
            config.profile,
        )
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn view_matrix(&self) -> cgmath::Matrix4<f32> {
        self.state.view_matrix()
    }

    /// Applies one key step. Returns whether the camera actually moved.
    pub fn apply(&mut self, movement: CameraMove) -> bool {
        let moved = match self.profile {
            Profile::Bounded => self.apply_bounded(movement),
            Profile::Free => self.apply_free(movement),
        };
        if moved {
            let p = self.state.position;
            log::info!(
                "Camera: ({}, {}, {}) Angle: {}",
                p.x,
                p.y,
                p.z,
                self.state.angle
            );
        }
        moved
    }

    fn apply_bounded(&mut self, movement: CameraMove) -> bool {
        let s = &mut self.state;
        let speed = s.speed;
        match movement {
            CameraMove::Left | CameraMove::Right => {
                let sign = if movement == CameraMove::Left { 1.0 } else { -1.0 };
                s.angle += sign * speed;
                let half = Rad::from(cgmath::Deg(s.angle / 2.0)).0;
                s.position.x += sign * speed * half.cos();
                s.position.z += sign * speed * half.sin();
                true
            }
            CameraMove::Up | CameraMove::Down => {
                if !in_z_band(s.position.z) {
                    return false;
                }
                let sign = if movement == CameraMove::Up { 1.0 } else { -1.0 };
                let y = s.position.y + sign * speed * heading_cos(s.angle);
                if in_height_range(y) {
                    s.position.y = y;
                    true
                } else {
                    false
                }
            }
            CameraMove::Forward | CameraMove::Back => {
                let sign = if movement == CameraMove::Forward { -1.0 } else { 1.0 };
                let z = s.position.z + sign * speed * heading_cos(s.angle);
                if in_z_band(z) {
                    s.position.z = z;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn apply_free(&mut self, movement: CameraMove) -> bool {
        let s = &mut self.state;
        let step = match movement {
            CameraMove::Left => s.speed,
            CameraMove::Right => -s.speed,
            _ => return false,
        };
        s.position.x += step;
        s.position.z += step;
        true
    }
}

fn heading_cos(angle: f32) -> f32 {
    Rad::from(cgmath::Deg(angle)).0.cos()
}

/// Perspective projection fixed at startup from the viewport size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(aspect: f32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// 45 degree vertical field of view, near 0.1, far 1000.
    pub fn for_config(config: &ViewerConfig) -> Self {
        Self::new(config.aspect_ratio(), cgmath::Deg(45.0), 0.1, 1000.0)
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Right-handed GL-style perspective remapped to wgpu's [0, 1] depth range.
    pub fn calc_matrix(&self) -> cgmath::Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}
