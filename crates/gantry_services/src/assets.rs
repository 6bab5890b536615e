//! Asset store
//!
//! Named textures and the single font used for labels. Nothing is decoded
//! or rasterised: an image texture records its path and display size, and a
//! text texture is measured from the font size.

use crate::scene::Color;
use glam::UVec2;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Horizontal advance of one glyph, as a fraction of the font size.
const GLYPH_ADVANCE: f64 = 0.6;

/// Asset handle (opaque ID)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetHandle(u64);

impl AssetHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("texture name `{0}` is already in use")]
    NameTaken(String),

    #[error("no font loaded for text `{0}`")]
    MissingFont(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureKind {
    Image { path: PathBuf },
    Text { label: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub handle: AssetHandle,
    pub kind: TextureKind,
    pub size: UVec2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Font {
    pub path: PathBuf,
    pub color: Color,
    pub size: u32,
}

/// Name-addressed texture storage plus the label font.
#[derive(Debug)]
pub struct AssetStore {
    textures: BTreeMap<String, Texture>,
    font: Option<Font>,
    next_id: u64,
}

gantry_core::define_service!(AssetStore);

impl AssetStore {
    pub fn new() -> Self {
        Self {
            textures: BTreeMap::new(),
            font: None,
            next_id: 1,
        }
    }

    /// Replace the label font.
    pub fn set_font(&mut self, path: impl AsRef<Path>, size: u32, color: Color) {
        let path = path.as_ref().to_path_buf();
        debug!(font = %path.display(), size, "font loaded");
        self.font = Some(Font { path, color, size });
    }

    pub fn font(&self) -> Option<&Font> {
        self.font.as_ref()
    }

    /// Register an image texture under its path.
    pub fn load_image(
        &mut self,
        path: impl AsRef<Path>,
        size: UVec2,
    ) -> Result<AssetHandle, AssetError> {
        let path = path.as_ref();
        let name = path.to_string_lossy().into_owned();
        let kind = TextureKind::Image {
            path: path.to_path_buf(),
        };
        self.insert(name, kind, size)
    }

    /// Register a text texture for `label`, measured with the current font.
    pub fn load_text(&mut self, label: &str) -> Result<(AssetHandle, UVec2), AssetError> {
        let font_size = self
            .font
            .as_ref()
            .map(|font| font.size)
            .ok_or_else(|| AssetError::MissingFont(label.to_string()))?;

        let size = measure_text(label, font_size);
        let kind = TextureKind::Text {
            label: label.to_string(),
        };
        let handle = self.insert(label.to_string(), kind, size)?;
        Ok((handle, size))
    }

    /// Look up a texture by the name it was loaded under.
    pub fn texture(&self, name: &str) -> Option<&Texture> {
        self.textures.get(name)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn insert(
        &mut self,
        name: String,
        kind: TextureKind,
        size: UVec2,
    ) -> Result<AssetHandle, AssetError> {
        if self.textures.contains_key(&name) {
            return Err(AssetError::NameTaken(name));
        }
        let handle = AssetHandle(self.next_id);
        self.next_id = handle.0 + 1;
        debug!(texture = %name, %handle, "texture loaded");
        self.textures.insert(name, Texture { handle, kind, size });
        Ok(handle)
    }
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Headless label measurement: fixed advance per glyph, one line tall.
pub fn measure_text(label: &str, font_size: u32) -> UVec2 {
    let glyphs = label.chars().count() as f64;
    let width = (glyphs * font_size as f64 * GLYPH_ADVANCE).round() as u32;
    UVec2::new(width, font_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_names_are_unique() {
        let mut store = AssetStore::new();
        let first = store.load_image("art/ship.png", UVec2::new(32, 16)).unwrap();
        assert_eq!(
            store.load_image("art/ship.png", UVec2::new(1, 1)),
            Err(AssetError::NameTaken("art/ship.png".into()))
        );

        let texture = store.texture("art/ship.png").unwrap();
        assert_eq!(texture.handle, first);
        assert_eq!(texture.size, UVec2::new(32, 16));
    }

    #[test]
    fn text_requires_a_font() {
        let mut store = AssetStore::new();
        assert_eq!(
            store.load_text("hello"),
            Err(AssetError::MissingFont("hello".into()))
        );

        store.set_font("fonts/mono.ttf", 10, Color::new(255, 255, 255));
        let (handle, size) = store.load_text("hello").unwrap();
        assert_eq!(size, UVec2::new(30, 10));
        assert_eq!(store.texture("hello").map(|t| t.handle), Some(handle));
    }

    #[test]
    fn handles_are_distinct() {
        let mut store = AssetStore::default();
        let a = store.load_image("a.png", UVec2::ONE).unwrap();
        let b = store.load_image("b.png", UVec2::ONE).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.texture_count(), 2);
    }

    #[test]
    fn measurement_counts_characters() {
        assert_eq!(measure_text("", 12), UVec2::new(0, 12));
        assert_eq!(measure_text("ñandú", 20), UVec2::new(60, 20));
    }
}
