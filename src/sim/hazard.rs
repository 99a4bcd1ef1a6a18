//! Weather hazards: acid rain and sandstorms
//!
//! Rain is time-gated (starts a fixed delay after the session starts), the
//! sandstorm is score-gated. They never overlap: rain fades out during the
//! pre-storm warning window and stays off while a storm blows.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entities::Raindrop;
use super::timer::{Deadline, Millis};
use crate::consts::*;

/// The single active hazard, computed once per frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Hazard {
    #[default]
    None,
    Rain,
    /// Pre-storm warning: overlay opacity rising toward 1.0
    Transitioning { warning: f32 },
    Sandstorm,
}

/// An active sandstorm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Storm {
    /// Score value that triggered it
    pub score: u64,
    pub until: Deadline,
}

/// Per-frame inputs to the hazard controller
#[derive(Debug, Clone, Copy)]
pub struct HazardInputs {
    pub now: Millis,
    /// Time since the session started (paused time excluded)
    pub elapsed: Millis,
    pub score: u64,
    pub rain_enabled: bool,
    pub sandstorm_enabled: bool,
}

/// Transitions that happened during one update
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HazardChanges {
    pub rain_started: bool,
    pub rain_stopped: bool,
    /// Duration of a storm that started this frame
    pub storm_started: Option<Millis>,
    pub storm_ended: bool,
}

/// Whether a sandstorm fires at this score
pub fn should_trigger_sandstorm(score: u64, last_triggered: Option<u64>) -> bool {
    score > 0 && score.is_multiple_of(SANDSTORM_THRESHOLD) && last_triggered != Some(score)
}

/// Storm length: longer once level 2 is reached
pub fn sandstorm_duration(score: u64) -> Millis {
    if score >= LEVEL_TWO_SCORE {
        SANDSTORM_LONG_DURATION_MS
    } else {
        SANDSTORM_DURATION_MS
    }
}

/// Warning level in the window `[next_threshold - 5, next_threshold)`, rising from 0.2 to 1.0
pub fn warning_level(score: u64) -> Option<f32> {
    let next = (score / SANDSTORM_THRESHOLD + 1) * SANDSTORM_THRESHOLD;
    let window_start = next - SANDSTORM_WARNING_WINDOW;
    if score >= window_start {
        Some((score - window_start + 1) as f32 / SANDSTORM_WARNING_WINDOW as f32)
    } else {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HazardController {
    pub current: Hazard,
    pub storm: Option<Storm>,
    last_storm_score: Option<u64>,
    /// 0.0 (dry) to 1.0 (full rain), faded per tick
    pub rain_intensity: f32,
    /// Smoothed warning overlay opacity
    pub warning_opacity: f32,
    raining: bool,
}

impl HazardController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn storm_active(&self) -> bool {
        self.storm.is_some()
    }

    /// Ambient world-speed multiplier from weather
    pub fn speed_multiplier(&self) -> f32 {
        if self.storm_active() {
            SANDSTORM_SPEED_MULTIPLIER
        } else {
            crate::lerp(1.0, RAIN_SPEED_MULTIPLIER, self.rain_intensity)
        }
    }

    pub fn update(&mut self, inputs: HazardInputs) -> HazardChanges {
        let mut changes = HazardChanges::default();

        if let Some(storm) = self.storm
            && storm.until.expired(inputs.now)
        {
            self.storm = None;
            changes.storm_ended = true;
            log::info!("Sandstorm ended (triggered at score {})", storm.score);
        }

        if inputs.sandstorm_enabled && should_trigger_sandstorm(inputs.score, self.last_storm_score) {
            let duration = sandstorm_duration(inputs.score);
            self.storm = Some(Storm {
                score: inputs.score,
                until: Deadline::after(inputs.now, duration),
            });
            self.last_storm_score = Some(inputs.score);
            changes.storm_started = Some(duration);
            log::info!("Sandstorm started at score {} for {}ms", inputs.score, duration);
        }

        let warning = if inputs.sandstorm_enabled && !self.storm_active() {
            warning_level(inputs.score)
        } else {
            None
        };

        let rain_wanted = inputs.rain_enabled
            && inputs.elapsed >= RAIN_DELAY_MS
            && warning.is_none()
            && !self.storm_active();

        let rain_target = if rain_wanted { 1.0 } else { 0.0 };
        self.rain_intensity = step_toward(self.rain_intensity, rain_target, RAIN_FADE_STEP);
        let warning_target = warning.unwrap_or(0.0);
        self.warning_opacity = step_toward(self.warning_opacity, warning_target, 0.05);

        if rain_wanted && !self.raining {
            changes.rain_started = true;
            log::info!("Rain started");
        } else if !rain_wanted && self.raining {
            changes.rain_stopped = true;
            log::info!("Rain stopping");
        }
        self.raining = rain_wanted;

        self.current = if self.storm_active() {
            Hazard::Sandstorm
        } else if warning.is_some() {
            Hazard::Transitioning {
                warning: self.warning_opacity,
            }
        } else if rain_wanted {
            Hazard::Rain
        } else {
            Hazard::None
        };

        changes
    }

    /// Spawn new raindrops for the current intensity
    pub fn spawn_rain(
        &self,
        rng: &mut impl Rng,
        drops: &mut Vec<Raindrop>,
        density: f32,
        viewport_width: f32,
    ) {
        if self.rain_intensity <= 0.0 {
            return;
        }
        let expected = self.rain_intensity * density;
        let mut count = expected.floor() as usize;
        if rng.random::<f32>() < expected.fract() {
            count += 1;
        }
        for _ in 0..count {
            drops.push(Raindrop {
                pos: Vec2::new(rng.random_range(0.0..viewport_width + 60.0), -RAINDROP_LENGTH),
                vel: Vec2::new(-1.5, RAINDROP_SPEED + rng.random_range(0.0..3.0)),
            });
        }
    }

    /// Sand grains to emit this frame
    pub fn sand_count(&self, rng: &mut impl Rng, density: f32) -> usize {
        if !self.storm_active() {
            return 0;
        }
        let mut count = density.floor() as usize;
        if rng.random::<f32>() < density.fract() {
            count += 1;
        }
        count
    }

    /// Discount a paused span
    pub fn shift(&mut self, by: Millis) {
        if let Some(storm) = &mut self.storm {
            storm.until.shift(by);
        }
    }
}

fn step_toward(value: f32, target: f32, step: f32) -> f32 {
    if value < target {
        (value + step).min(target)
    } else {
        (value - step).max(target)
    }
}
