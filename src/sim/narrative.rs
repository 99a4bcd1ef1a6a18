//! Narrative sequencer: periodic taunts and the one-shot boss intro
//!
//! The boss intro is its own small state machine:
//! `Dormant -> Glitch -> Typewriter (one entry per message) -> Done`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::timer::{Deadline, Millis};
use crate::consts::*;

/// Taunt lines shown every tenth point
pub const TAUNTS: &[&str] = &[
    "Is that all you've got?",
    "My grandmother flaps better than that.",
    "The pipes are laughing at you.",
    "Gravity is winning.",
    "Keep going. I'm enjoying this.",
    "You call that flying?",
    "Every gap is a little smaller in my heart.",
    "I've seen rocks with better reflexes.",
];

/// Number of taunt portraits the render collaborator can show
pub const PORTRAIT_COUNT: usize = 4;

/// Messages revealed one character at a time during the boss intro
pub const BOSS_MESSAGES: &[&str] = &[
    "SIGNAL INTERCEPTED.",
    "So. You made it this far.",
    "The pipes were only a warm-up.",
    "From here on, the sky belongs to me.",
];

/// A taunt currently on screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Taunt {
    /// Index into `TAUNTS`
    pub message: usize,
    pub portrait: usize,
    pub until: Deadline,
}

impl Taunt {
    pub fn text(&self) -> &'static str {
        TAUNTS.get(self.message).copied().unwrap_or_default()
    }

    /// Opacity: fully visible, fading out over the final `TAUNT_FADE_MS`
    pub fn alpha(&self, now: Millis) -> f32 {
        let remaining = self.until.remaining(now);
        if remaining >= TAUNT_FADE_MS {
            1.0
        } else {
            (remaining / TAUNT_FADE_MS) as f32
        }
    }
}

/// Boss intro sub-phase
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum BossPhase {
    #[default]
    Dormant,
    /// Visual noise only, no text
    Glitch { until: Deadline },
    /// Revealing `BOSS_MESSAGES[message]`
    Typewriter { message: usize, started: Millis },
    /// Finished for the rest of the session
    Done,
}

impl BossPhase {
    pub fn is_active(&self) -> bool {
        matches!(self, BossPhase::Glitch { .. } | BossPhase::Typewriter { .. })
    }
}

/// Time at which message `index` is fully revealed, relative to its start
fn reveal_span(index: usize) -> Millis {
    let chars = BOSS_MESSAGES.get(index).map_or(0, |m| m.chars().count());
    chars as Millis * BOSS_CHAR_INTERVAL_MS
}

/// Transitions that happened during one update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NarrativeChanges {
    pub taunt_shown: bool,
    pub boss_started: bool,
    pub boss_finished: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub taunt: Option<Taunt>,
    pub boss: BossPhase,
    /// Last score value the sequencer has reacted to
    seen_score: u64,
}

impl Narrative {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boss_active(&self) -> bool {
        self.boss.is_active()
    }

    /// Visible part of the current boss message, if in the typewriter phase
    pub fn boss_text(&self, now: Millis) -> Option<&'static str> {
        let BossPhase::Typewriter { message, started } = self.boss else {
            return None;
        };
        let full = BOSS_MESSAGES.get(message)?;
        let shown = ((now - started).max(0.0) / BOSS_CHAR_INTERVAL_MS) as usize;
        let end = full
            .char_indices()
            .nth(shown)
            .map_or(full.len(), |(idx, _)| idx);
        Some(&full[..end])
    }

    pub fn update(
        &mut self,
        rng: &mut impl Rng,
        score: u64,
        now: Millis,
        taunts_enabled: bool,
    ) -> NarrativeChanges {
        let mut changes = NarrativeChanges::default();

        // Threshold check uses >= so an overshooting frame still triggers, once
        if self.boss == BossPhase::Dormant && score >= BOSS_INTRO_SCORE {
            self.boss = BossPhase::Glitch {
                until: Deadline::after(now, BOSS_GLITCH_MS),
            };
            self.taunt = None;
            changes.boss_started = true;
            log::info!("Boss intro started at score {}", score);
        }

        if self.taunt.is_some_and(|t| t.until.expired(now)) {
            self.taunt = None;
        }

        if score > self.seen_score {
            let crossed_taunt = (self.seen_score + 1..=score).any(|s| s.is_multiple_of(TAUNT_EVERY));
            if crossed_taunt && taunts_enabled && !self.boss_active() {
                self.taunt = Some(Taunt {
                    message: rng.random_range(0..TAUNTS.len()),
                    portrait: rng.random_range(0..PORTRAIT_COUNT),
                    until: Deadline::after(now, TAUNT_DURATION_MS),
                });
                changes.taunt_shown = true;
            }
            self.seen_score = score;
        }

        changes.boss_finished = self.advance_boss(now);
        changes
    }

    /// Step the boss sub-phases. Returns true when the intro completes.
    fn advance_boss(&mut self, now: Millis) -> bool {
        loop {
            match self.boss {
                BossPhase::Glitch { until } if until.expired(now) => {
                    self.boss = BossPhase::Typewriter {
                        message: 0,
                        started: until.timestamp(),
                    };
                }
                BossPhase::Typewriter { message, started } => {
                    let done_at = started + reveal_span(message) + BOSS_MESSAGE_PAUSE_MS;
                    if now < done_at {
                        return false;
                    }
                    if message + 1 < BOSS_MESSAGES.len() {
                        self.boss = BossPhase::Typewriter {
                            message: message + 1,
                            started: done_at,
                        };
                    } else {
                        self.boss = BossPhase::Done;
                        log::info!("Boss intro finished");
                        return true;
                    }
                }
                _ => return false,
            }
        }
    }

    /// Discount a paused span
    pub fn shift(&mut self, by: Millis) {
        if let Some(taunt) = &mut self.taunt {
            taunt.until.shift(by);
        }
        match &mut self.boss {
            BossPhase::Glitch { until } => until.shift(by),
            BossPhase::Typewriter { started, .. } => *started += by,
            BossPhase::Dormant | BossPhase::Done => {}
        }
    }
}
