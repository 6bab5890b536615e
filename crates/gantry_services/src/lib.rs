//! Gantry Services Layer
//!
//! Collaborators that plug into the ECS as ordinary services: timekeeping,
//! a headless viewport, an asset store, scripted input, and the scene
//! loader that configures all of them.

pub mod assets;
pub mod input;
pub mod scene;
pub mod stopwatch;
pub mod viewport;

pub use assets::{AssetError, AssetHandle, AssetStore, Font, Texture, TextureKind};
pub use input::{InputEvent, InputScript, ScriptedInput};
pub use scene::{
    Color, EntityConfig, FontConfig, SceneConfig, SceneError, Settings, WindowConfig,
};
pub use stopwatch::Stopwatch;
pub use viewport::{DrawCall, Rect, Viewport};
