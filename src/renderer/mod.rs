//! Render contract
//!
//! Each frame the host builds a `DrawList` from a read-only view of the game
//! and hands it to a `Renderer` backend. Building never mutates game state;
//! drawing may fail, and the host loop contains that failure.

pub mod background;
pub mod frame;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

use glam::Vec2;

use crate::assets::SpriteId;
use crate::{Rect, RenderError};

pub use background::BackgroundCache;
pub use frame::{FrameView, build_frame};

/// RGBA, each channel 0..=1
pub type Color = [f32; 4];

pub fn with_alpha(color: Color, alpha: f32) -> Color {
    [color[0], color[1], color[2], color[3] * alpha.clamp(0.0, 1.0)]
}

/// Colors for game elements (fallbacks when sprites are missing)
pub mod colors {
    use super::Color;

    pub const AVATAR: Color = [1.0, 0.85, 0.2, 1.0];
    pub const AVATAR_POWER: Color = [0.3, 0.9, 1.0, 1.0];
    pub const AVATAR_MEGA: Color = [1.0, 0.3, 0.9, 1.0];
    pub const AVATAR_DEBUFF: Color = [0.5, 0.9, 0.3, 1.0];
    pub const OBSTACLE: [Color; 4] = [
        [0.25, 0.65, 0.3, 1.0],
        [0.3, 0.6, 0.35, 1.0],
        [0.2, 0.55, 0.4, 1.0],
        [0.35, 0.7, 0.25, 1.0],
    ];
    pub const DEBRIS: Color = [0.35, 0.3, 0.28, 0.6];
    pub const POWER_PILL: Color = [0.3, 0.9, 1.0, 1.0];
    pub const DEBUFF_PILL: Color = [0.6, 1.0, 0.2, 1.0];
    pub const MEGA_POSTER: Color = [1.0, 0.3, 0.9, 1.0];
    pub const PROJECTILE: Color = [1.0, 1.0, 0.6, 1.0];
    pub const RAIN: Color = [0.6, 1.0, 0.3, 0.55];
    pub const EXPLOSION: Color = [1.0, 0.5, 0.15, 1.0];
    pub const SPLASH: Color = [0.6, 1.0, 0.4, 0.8];
    pub const SAND: Color = [0.85, 0.7, 0.45, 0.8];
    pub const BURST: Color = [1.0, 0.95, 0.7, 1.0];
    pub const STORM_TINT: Color = [0.8, 0.6, 0.3, 0.25];
    pub const WARNING_TINT: Color = [1.0, 0.55, 0.1, 0.3];
    pub const RAIN_TINT: Color = [0.1, 0.3, 0.05, 0.18];
    pub const SHADE: Color = [0.0, 0.0, 0.0, 0.6];
    pub const BOSS_SHADE: Color = [0.02, 0.0, 0.05, 0.85];
    pub const GLITCH: Color = [0.9, 0.1, 0.3, 0.7];
    pub const TEXT: Color = [1.0, 1.0, 1.0, 1.0];
    pub const TEXT_DIM: Color = [0.7, 0.7, 0.75, 1.0];
    pub const HIGHLIGHT: Color = [1.0, 0.85, 0.2, 1.0];
    pub const BOSS_TEXT: Color = [1.0, 0.2, 0.3, 1.0];
    pub const FAULT: Color = [1.0, 0.1, 0.1, 1.0];
    pub const PORTRAIT: Color = [0.5, 0.4, 0.6, 1.0];
}

/// Horizontal anchoring of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// One drawing primitive, in play-area coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Rect {
        rect: Rect,
        color: Color,
    },
    /// Rectangle rotated about its center
    Quad {
        center: Vec2,
        size: Vec2,
        rotation: f32,
        color: Color,
    },
    Sprite {
        id: SpriteId,
        rect: Rect,
        rotation: f32,
        alpha: f32,
    },
    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: Color,
    },
    Text {
        text: String,
        pos: Vec2,
        size: f32,
        color: Color,
        align: Align,
    },
    /// Full-screen tint
    Overlay {
        color: Color,
    },
}

/// Everything to draw for one frame, back to front
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawList {
    pub cmds: Vec<DrawCmd>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: DrawCmd) {
        self.cmds.push(cmd);
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn rect(&mut self, rect: Rect, color: Color) {
        self.push(DrawCmd::Rect { rect, color });
    }

    pub fn text(&mut self, text: impl Into<String>, pos: Vec2, size: f32, color: Color, align: Align) {
        self.push(DrawCmd::Text {
            text: text.into(),
            pos,
            size,
            color,
            align,
        });
    }

    pub fn overlay(&mut self, color: Color) {
        self.push(DrawCmd::Overlay { color });
    }

    /// All text strings, in draw order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.cmds.iter().filter_map(|cmd| match cmd {
            DrawCmd::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }

    pub fn sprites(&self) -> impl Iterator<Item = SpriteId> + '_ {
        self.cmds.iter().filter_map(|cmd| match cmd {
            DrawCmd::Sprite { id, .. } => Some(*id),
            _ => None,
        })
    }
}

/// A drawing backend
pub trait Renderer {
    fn draw(&mut self, frame: &DrawList) -> Result<(), RenderError>;
}

/// Backend that draws nothing and keeps statistics (headless runs)
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    pub frames: u64,
    pub last_cmds: usize,
    pub peak_cmds: usize,
}

impl Renderer for HeadlessRenderer {
    fn draw(&mut self, frame: &DrawList) -> Result<(), RenderError> {
        self.frames += 1;
        self.last_cmds = frame.len();
        self.peak_cmds = self.peak_cmds.max(frame.len());
        Ok(())
    }
}
