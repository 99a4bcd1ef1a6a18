//! Storm Flap - A side-scrolling gap-flying arcade game
//!
//! Core modules:
//! - `sim`: Simulation (avatar physics, entities, hazards, narrative, phases)
//! - `renderer`: Draw-list construction for whatever backend hosts the game
//! - `platform`: Host frame loop, clock and frame scheduling
//! - `settings` / `highscores`: Persisted preferences and leaderboard
//! - `audio` / `assets`: Collaborator boundaries for sound and sprites

pub mod assets;
pub mod audio;
pub mod error;
pub mod highscores;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{AssetError, RenderError, StorageError};
pub use highscores::HighScores;
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    // === Play area ===
    /// Logical play-area width (pixels)
    pub const PLAY_WIDTH: f32 = 480.0;
    /// Logical play-area height including the ground strip
    pub const PLAY_HEIGHT: f32 = 720.0;
    /// Ground strip at the bottom of the play area
    pub const GROUND_HEIGHT: f32 = 60.0;

    // === Avatar ===
    pub const AVATAR_SIZE: f32 = 36.0;
    /// Avatar x is derived from the viewport width
    pub const AVATAR_X_FRACTION: f32 = 0.25;
    /// Downward acceleration per tick
    pub const GRAVITY: f32 = 0.45;
    /// Velocity set by a jump (negative = up)
    pub const JUMP_LIFT: f32 = -7.6;
    /// Low-pass filter weights for the cosmetic tilt
    pub const TILT_KEEP: f32 = 0.9;
    pub const TILT_BLEND: f32 = 0.1;
    /// Tilt target per unit of vertical velocity (radians)
    pub const TILT_PER_VELOCITY: f32 = 0.08;
    /// Spin rate while power-shot is active (radians per tick)
    pub const POWER_SPIN_RATE: f32 = 0.3;
    /// Velocity damping when bouncing off a boundary while invulnerable
    pub const BOUNCE_DAMPING: f32 = 0.5;

    // === Modifiers ===
    pub const DEBUFF_SIZE_MULTIPLIER: f32 = 1.5;
    pub const DEBUFF_SPEED_MULTIPLIER: f32 = 1.4;
    pub const MEGA_SIZE_MULTIPLIER: f32 = 1.25;
    pub const POWER_DURATION_MS: f64 = 5_000.0;
    pub const DEBUFF_DURATION_MS: f64 = 5_000.0;
    pub const MEGA_DURATION_MS: f64 = 6_500.0;
    /// Auto-fire cadence while mega is active
    pub const MEGA_VOLLEY_INTERVAL_MS: f64 = 220.0;
    /// Vertical drift of each projectile in a mega volley
    pub const MEGA_SPREAD: [f32; 5] = [-2.0, -1.0, 0.0, 1.0, 2.0];

    // === Obstacles ===
    pub const OBSTACLE_WIDTH: f32 = 70.0;
    pub const GAP_SIZE: f32 = 180.0;
    /// Minimum distance between a gap edge and the ceiling / ground
    pub const GAP_MIN_MARGIN: f32 = 60.0;
    /// Frames between obstacle spawns
    pub const OBSTACLE_SPAWN_FRAMES: u64 = 95;
    /// Base scroll speed (pixels per tick)
    pub const SCROLL_SPEED: f32 = 2.6;
    /// Number of decorative obstacle variants
    pub const OBSTACLE_VARIANTS: u8 = 4;

    // === Pickups ===
    pub const PICKUP_SIZE: f32 = 30.0;
    pub const PICKUP_SPIN_RATE: f32 = 0.05;

    // === Projectiles ===
    pub const PROJECTILE_SPEED: f32 = 9.0;
    pub const PROJECTILE_WIDTH: f32 = 14.0;
    pub const PROJECTILE_HEIGHT: f32 = 6.0;

    // === Particles ===
    pub const EXPLOSION_PARTICLES: usize = 24;
    pub const EXPLOSION_LIFE_FRAMES: u32 = 40;
    pub const SPLASH_PARTICLES: usize = 5;
    pub const SPLASH_LIFE_FRAMES: u32 = 18;
    pub const BURST_PARTICLES: usize = 16;
    pub const BURST_LIFE_FRAMES: u32 = 30;
    pub const SAND_LIFE_MS: f64 = 1_400.0;
    pub const PARTICLE_GRAVITY: f32 = 0.15;

    // === Hazards ===
    /// Rain starts this long after the session starts
    pub const RAIN_DELAY_MS: f64 = 15_000.0;
    /// World speed multiplier while rain is fully active
    pub const RAIN_SPEED_MULTIPLIER: f32 = 1.15;
    /// Raindrops spawned per tick at full intensity (Medium quality)
    pub const RAIN_DENSITY: f32 = 2.0;
    /// Per-tick step of the rain intensity fade
    pub const RAIN_FADE_STEP: f32 = 0.02;
    pub const RAINDROP_SPEED: f32 = 11.0;
    pub const RAINDROP_LENGTH: f32 = 14.0;
    /// Sandstorm fires on every positive multiple of this score
    pub const SANDSTORM_THRESHOLD: u64 = 60;
    /// Score span before a sandstorm that shows the warning
    pub const SANDSTORM_WARNING_WINDOW: u64 = 5;
    pub const SANDSTORM_DURATION_MS: f64 = 12_000.0;
    pub const SANDSTORM_LONG_DURATION_MS: f64 = 17_000.0;
    pub const SANDSTORM_SPEED_MULTIPLIER: f32 = 1.4;
    /// Sand grains spawned per tick while a storm is active (Medium quality)
    pub const SAND_DENSITY: f32 = 3.0;

    // === Progression ===
    /// Score at which level 2 begins (skin, music, longer storms, boss)
    pub const LEVEL_TWO_SCORE: u64 = 150;
    /// Score thresholds that advance the skin level
    pub const LEVEL_THRESHOLDS: [u64; 2] = [150, 300];

    // === Narrative ===
    pub const TAUNT_EVERY: u64 = 10;
    pub const TAUNT_DURATION_MS: f64 = 3_000.0;
    pub const TAUNT_FADE_MS: f64 = 500.0;
    pub const BOSS_INTRO_SCORE: u64 = 150;
    pub const BOSS_GLITCH_MS: f64 = 3_000.0;
    pub const BOSS_CHAR_INTERVAL_MS: f64 = 45.0;
    pub const BOSS_MESSAGE_PAUSE_MS: f64 = 1_600.0;
}

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle of the given size centered on `center`
    pub fn centered(center: Vec2, w: f32, h: f32) -> Self {
        Self::new(center.x - w / 2.0, center.y - h / 2.0, w, h)
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Strict overlap test (touching edges do not overlap)
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
