//! Components of the demo simulation

use gantry_services::AssetHandle;
use glam::{DVec2, UVec2};

/// Position, velocity and orientation of a body.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Physics {
    pub velocity: DVec2,
    pub position: DVec2,
    /// Collision box, centred on `position`.
    pub size: UVec2,
    /// Degrees, independent of the direction of travel.
    pub angle: f64,
}

/// Image and label textures of a body.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Drawing {
    pub image_size: UVec2,
    pub text_size: UVec2,
    pub image: AssetHandle,
    pub text: AssetHandle,
}

gantry_core::define_component!(Physics, Drawing);
