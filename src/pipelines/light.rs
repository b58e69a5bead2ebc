//! Light uniform and the shading presets that drive it.
//!
//! The bounded profile offers four presets selected with keys 1-4. Every
//! preset keeps the light at height 300 on the z = 0 plane and varies its x
//! position and its strength (`w`). The free profile uses one fixed light.

use crate::config::Profile;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub position: [f32; 3],
    /// Scales the diffuse term in the fragment shader; negative darkens.
    pub strength: f32,
}

impl LightUniform {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self {
            position: [x, y, z],
            strength: w,
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [
            self.position[0],
            self.position[1],
            self.position[2],
            self.strength,
        ]
    }
}

/// Light used by the free profile, which has no presets.
pub const FIXED_LIGHT: LightUniform = LightUniform::new(-100.0, 300.0, 0.0, 1.0);

pub const DAY_CLEAR: wgpu::Color = wgpu::Color::WHITE;
pub const NIGHT_CLEAR: wgpu::Color = wgpu::Color::BLACK;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ShadingMode {
    #[default]
    Default,
    Sunny,
    Night,
    InvertedSun,
}

/// What a shading mode changes: the clear colour and the light uniform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lighting {
    pub clear_colour: wgpu::Color,
    pub light: LightUniform,
}

impl ShadingMode {
    pub const ALL: [ShadingMode; 4] = [
        ShadingMode::Default,
        ShadingMode::Sunny,
        ShadingMode::Night,
        ShadingMode::InvertedSun,
    ];

    pub fn lighting(self) -> Lighting {
        let (clear_colour, x, w) = match self {
            ShadingMode::Default => (DAY_CLEAR, -200.0, 75.0),
            ShadingMode::Sunny => (DAY_CLEAR, -200.0, 200.0),
            ShadingMode::Night => (NIGHT_CLEAR, -50.0, -75.0),
            ShadingMode::InvertedSun => (DAY_CLEAR, 200.0, 75.0),
        };
        Lighting {
            clear_colour,
            light: LightUniform::new(x, 300.0, 0.0, w),
        }
    }
}

/// The active shading mode of one viewer session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadingState {
    profile: Profile,
    mode: ShadingMode,
}

impl ShadingState {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            mode: ShadingMode::Default,
        }
    }

    pub fn mode(&self) -> ShadingMode {
        self.mode
    }

    /// Switches presets. Returns `false` when the profile has none.
    pub fn select(&mut self, mode: ShadingMode) -> bool {
        match self.profile {
            Profile::Bounded => {
                if self.mode != mode {
                    log::info!("Shading mode: {:?}", mode);
                }
                self.mode = mode;
                true
            }
            Profile::Free => false,
        }
    }

    pub fn lighting(&self) -> Lighting {
        match self.profile {
            Profile::Bounded => self.mode.lighting(),
            Profile::Free => Lighting {
                clear_colour: DAY_CLEAR,
                light: FIXED_LIGHT,
            },
        }
    }
}
