//! Render pipeline definitions.
//!
//! - `basic` builds the single textured, depth-tested pipeline
//! - `light` holds the light uniform and the shading presets

pub mod basic;
pub mod light;
