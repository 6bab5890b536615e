//! Headless viewport
//!
//! Stands in for a window and renderer: paces draw frames at the configured
//! framerate and records the draw calls of each presented frame.

use crate::assets::AssetHandle;
use crate::scene::Color;
use glam::UVec2;
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// Destination rectangle in window pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

/// A texture queued for the current frame, rotated by `angle` degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawCall {
    pub texture: AssetHandle,
    pub rect: Rect,
    pub angle: f64,
}

#[derive(Debug)]
pub struct Viewport {
    size: UVec2,
    background: Color,
    frame_interval: Duration,
    last_commit: Option<Instant>,
    on_draw_frame: bool,
    queued: Vec<DrawCall>,
    last_frame: Vec<DrawCall>,
    frames_presented: u64,
}

gantry_core::define_service!(Viewport);

impl Viewport {
    /// Create a viewport. A framerate of 0 is treated as 1.
    pub fn new(size: UVec2, framerate: u32, background: Color) -> Self {
        Self {
            size,
            background,
            frame_interval: Duration::from_secs_f64(1.0 / framerate.max(1) as f64),
            last_commit: None,
            on_draw_frame: false,
            queued: Vec::new(),
            last_frame: Vec::new(),
            frames_presented: 0,
        }
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn ms_per_frame(&self) -> f64 {
        self.frame_interval.as_secs_f64() * 1000.0
    }

    /// Enter a draw frame once a full frame interval has passed since the
    /// last commit. Returns whether the viewport is on a draw frame.
    pub fn acquire_draw_frame(&mut self) -> bool {
        let due = self
            .last_commit
            .map_or(true, |at| at.elapsed() >= self.frame_interval);
        if due {
            self.on_draw_frame = true;
        }
        self.on_draw_frame
    }

    pub fn on_draw_frame(&self) -> bool {
        self.on_draw_frame
    }

    /// Queue a texture. Refused outside a draw frame.
    pub fn push_texture(&mut self, texture: AssetHandle, rect: Rect, angle: f64) -> bool {
        if !self.on_draw_frame {
            warn!(%texture, "push_texture called outside a draw frame");
            return false;
        }
        self.queued.push(DrawCall {
            texture,
            rect,
            angle,
        });
        true
    }

    /// Textures queued since the last commit.
    pub fn pushed(&self) -> usize {
        self.queued.len()
    }

    /// Present the queued frame and release the draw frame.
    pub fn commit(&mut self) -> bool {
        if !self.on_draw_frame {
            warn!("commit called outside a draw frame");
            return false;
        }
        self.last_frame = std::mem::take(&mut self.queued);
        self.frames_presented += 1;
        self.last_commit = Some(Instant::now());
        self.on_draw_frame = false;
        trace!(
            frame = self.frames_presented,
            draws = self.last_frame.len(),
            "frame presented"
        );
        true
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Draw calls of the most recently presented frame.
    pub fn last_frame(&self) -> &[DrawCall] {
        &self.last_frame
    }
}
