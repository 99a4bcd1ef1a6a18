//! Game state and per-session state
//!
//! Everything owned by one PLAYING run lives in `Session` and is discarded
//! wholesale when a new run starts.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::avatar::Avatar;
use super::entities::{Obstacle, Particles, Pickup, PickupKind, Projectile, Raindrop};
use super::hazard::HazardController;
use super::narrative::Narrative;
use super::phase::{GamePhase, SettingKey};
use super::score::ScoreTracker;
use super::spawn::SpawnScheduler;
use super::timer::{Millis, Stopwatch};
use crate::consts::PLAY_WIDTH;

/// Something the host should react to (audio, persistence, settings)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    SessionStarted,
    Jumped,
    /// Projectiles fired this frame
    Fired { count: usize },
    PickupCollected(PickupKind),
    Explosion,
    Scored(u64),
    /// New skin level (0-based)
    LevelUp(u32),
    PlayTrack(usize),
    RainStarted,
    RainStopped,
    SandstormStarted,
    SandstormEnded,
    Taunt,
    BossIntroStarted,
    BossIntroFinished,
    Paused,
    Resumed,
    /// Final score, emitted once per session
    GameOver { score: u64 },
    SettingToggled(SettingKey),
    MuteToggled,
}

/// All live entities of a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub obstacles: Vec<Obstacle>,
    pub pickups: Vec<Pickup>,
    pub projectiles: Vec<Projectile>,
    pub raindrops: Vec<Raindrop>,
    pub particles: Particles,
}

impl World {
    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
            && self.pickups.is_empty()
            && self.projectiles.is_empty()
            && self.raindrops.is_empty()
            && self.particles.is_empty()
    }
}

/// State of one PLAYING run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub avatar: Avatar,
    pub world: World,
    pub spawner: SpawnScheduler,
    pub hazards: HazardController,
    pub narrative: Narrative,
    pub score: ScoreTracker,
    /// Session start (shifted forward by paused spans)
    pub clock: Stopwatch,
    /// Frames simulated
    pub frame: u64,
    pub viewport_width: f32,
    /// Device speed factor captured when the session started (gravity read site)
    pub device_speed_factor: f32,
    /// When the current pause began
    pub paused_at: Option<Millis>,
    /// Final score has been handed to the persistence collaborator
    pub score_committed: bool,
    /// Autopilot run flown behind the TITLE screen
    pub attract: bool,
}

impl Session {
    pub fn new(now: Millis, viewport_width: f32, device_speed_factor: f32) -> Self {
        Self {
            avatar: Avatar::new(viewport_width),
            world: World::default(),
            spawner: SpawnScheduler::new(),
            hazards: HazardController::new(),
            narrative: Narrative::new(),
            score: ScoreTracker::new(),
            clock: Stopwatch::started_at(now),
            frame: 0,
            viewport_width,
            device_speed_factor,
            paused_at: None,
            score_committed: false,
            attract: false,
        }
    }

    /// Time played, excluding pauses
    pub fn elapsed(&self, now: Millis) -> Millis {
        self.clock.elapsed(now)
    }

    /// Push every wall-clock deadline later by `by`
    pub fn shift_deadlines(&mut self, by: Millis) {
        self.clock.shift(by);
        self.avatar.modifiers.shift(by);
        self.hazards.shift(by);
        self.narrative.shift(by);
        for particle in &mut self.world.particles.sand {
            if let super::entities::Life::Until { born, deadline } = &mut particle.life {
                *born += by;
                deadline.shift(by);
            }
        }
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: GamePhase,
    pub session: Session,
    /// Seed the RNG was created from
    pub seed: u64,
    pub rng: Pcg32,
    /// Events raised since the host last drained them
    pub events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        Self::with_viewport(seed, PLAY_WIDTH)
    }

    pub fn with_viewport(seed: u64, viewport_width: f32) -> Self {
        Self {
            phase: GamePhase::Title,
            session: Session::new(0.0, viewport_width, 1.0),
            seed,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every pending event
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn score(&self) -> u64 {
        self.session.score.score
    }

    /// Reset all per-run state and enter PLAYING
    pub fn start_session(&mut self, now: Millis, device_speed_factor: f32) {
        let viewport_width = self.session.viewport_width;
        self.session = Session::new(now, viewport_width, device_speed_factor);
        self.phase = GamePhase::Playing;
        self.emit(GameEvent::SessionStarted);
        self.emit(GameEvent::PlayTrack(self.session.score.track));
        log::info!("Session started (device speed factor {:.2})", device_speed_factor);
    }

    /// Fresh attract run behind the TITLE screen. Never scored, raises no events.
    pub fn start_attract(&mut self, now: Millis, device_speed_factor: f32) {
        let viewport_width = self.session.viewport_width;
        self.session = Session::new(now, viewport_width, device_speed_factor);
        self.session.attract = true;
        self.session.score_committed = true;
        self.phase = GamePhase::Title;
    }

    /// Enter GAME_OVER, committing the score at most once per session
    pub fn end_session(&mut self) {
        self.phase = GamePhase::GameOver;
        if !self.session.score_committed {
            self.session.score_committed = true;
            let score = self.score();
            self.emit(GameEvent::GameOver { score });
            log::info!("Game over with score {}", score);
        }
    }

    pub fn pause(&mut self, now: Millis) {
        self.session.paused_at = Some(now);
        self.emit(GameEvent::Paused);
    }

    /// Leave PAUSED; paused time is not charged to any deadline
    pub fn resume(&mut self, now: Millis) {
        if let Some(paused_at) = self.session.paused_at.take() {
            self.session.shift_deadlines((now - paused_at).max(0.0));
        }
        self.emit(GameEvent::Resumed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_title() {
        let state = GameState::new(1);
        assert_eq!(state.phase, GamePhase::Title);
        assert!(state.session.world.is_empty());
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn test_end_session_commits_once() {
        let mut state = GameState::new(1);
        state.start_session(0.0, 1.0);
        state.session.score.score = 12;
        state.end_session();
        state.end_session();
        let commits: Vec<_> = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .collect();
        assert_eq!(commits, vec![GameEvent::GameOver { score: 12 }]);
    }

    #[test]
    fn test_resume_shifts_deadlines() {
        let mut state = GameState::new(1);
        state.start_session(1_000.0, 1.0);
        state.session.avatar.modifiers.grant_power(1_000.0);
        state.pause(2_000.0);
        state.resume(12_000.0);
        assert_eq!(state.session.elapsed(12_000.0), 1_000.0);
        state.session.avatar.modifiers.expire(12_000.0);
        assert!(state.session.avatar.modifiers.can_shoot());
    }
}
