//! Per-frame simulation update
//!
//! Input is applied at the top of the frame, then while PLAYING the world is
//! advanced in a fixed order: physics, spawning, collision, hazards,
//! narrative, scoring. Later stages read positions written earlier in the
//! same frame, so the order must not change.

use glam::Vec2;

use super::autopilot;
use super::avatar::BoundsOutcome;
use super::collision;
use super::entities::{PickupKind, Projectile, sweep};
use super::hazard::HazardInputs;
use super::phase::{GamePhase, InputEvent, PhaseAction};
use super::spawn::PickupGates;
use super::state::{GameEvent, GameState};
use super::timer::Millis;
use crate::consts::*;
use crate::settings::Settings;

/// Input sampled between frames
#[derive(Debug, Clone)]
pub struct TickInput {
    /// Discrete events in arrival order
    pub events: Vec<InputEvent>,
    /// The audio collaborator finished the current music track
    pub track_ended: bool,
    /// Live device speed factor (read on every jump)
    pub device_speed_factor: f32,
    /// Demo mode - the autopilot flies
    pub autopilot: bool,
    /// Fly an autopilot run behind the TITLE screen
    pub attract: bool,
}

impl Default for TickInput {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            track_ended: false,
            device_speed_factor: 1.0,
            autopilot: false,
            attract: false,
        }
    }
}

impl TickInput {
    pub fn with_events(events: impl IntoIterator<Item = InputEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            ..Default::default()
        }
    }
}

/// Advance the game by one frame at wall-clock time `now`
pub fn tick(state: &mut GameState, input: &TickInput, settings: &Settings, now: Millis) {
    if input.track_ended {
        let track = state.session.score.track_ended();
        state.emit(GameEvent::PlayTrack(track));
    }

    let mut jump = false;
    let mut started = false;
    for &event in &input.events {
        if event == InputEvent::ToggleMute {
            state.emit(GameEvent::MuteToggled);
            continue;
        }
        let (phase, action) = state.phase.handle(event);
        state.phase = phase;
        match action {
            PhaseAction::None => {}
            PhaseAction::StartSession => {
                state.start_session(now, input.device_speed_factor);
                started = true;
            }
            PhaseAction::Jump => jump = true,
            PhaseAction::Pause => state.pause(now),
            PhaseAction::Resume => state.resume(now),
            PhaseAction::ToggleSetting(key) => state.emit(GameEvent::SettingToggled(key)),
        }
    }

    if state.phase == GamePhase::Title {
        if input.attract {
            attract(state, settings, now, input.device_speed_factor);
        }
        return;
    }

    // Paused, menus and game over freeze the simulation; rendering continues.
    // A fresh session is shown at its start position for one frame.
    if started || !state.phase.is_playing() {
        return;
    }

    if input.autopilot && autopilot::should_jump(&state.session) {
        jump = true;
    }

    step(state, settings, now, jump, input.device_speed_factor);
}

/// One TITLE frame of attract play. The run restarts when it crashes and its events are dropped.
fn attract(state: &mut GameState, settings: &Settings, now: Millis, live_speed_factor: f32) {
    if !state.session.attract {
        state.start_attract(now, live_speed_factor);
        return;
    }
    let raised = state.events.len();
    let jump = autopilot::should_jump(&state.session);
    step(state, settings, now, jump, live_speed_factor);
    state.events.truncate(raised);
    if state.phase == GamePhase::GameOver {
        state.start_attract(now, live_speed_factor);
    }
}

/// One PLAYING frame
fn step(state: &mut GameState, settings: &Settings, now: Millis, jump: bool, live_speed_factor: f32) {
    let budget = settings.max_particles();

    // --- Modifiers ---
    let expired = state.session.avatar.modifiers.expire(now);
    if expired.boost {
        log::debug!("Boost expired");
    }
    if expired.debuff {
        log::debug!("Debuff expired");
    }

    // --- Input actions ---
    if jump {
        state.session.avatar.jump(live_speed_factor);
        state.emit(GameEvent::Jumped);
        if state.session.avatar.modifiers.can_shoot() {
            fire(state, &[0.0]);
        }
    }
    if state.session.avatar.modifiers.take_volley(now) {
        fire(state, &MEGA_SPREAD);
    }

    // --- Physics ---
    let session = &mut state.session;
    session.avatar.integrate(session.device_speed_factor);
    match session.avatar.check_bounds(settings.invulnerable) {
        BoundsOutcome::Crashed => {
            state.end_session();
            return;
        }
        BoundsOutcome::Bounced | BoundsOutcome::Inside => {}
    }

    let speed = SCROLL_SPEED
        * session.avatar.modifiers.speed_multiplier()
        * session.hazards.speed_multiplier();
    let viewport_width = session.viewport_width;
    let world = &mut session.world;
    for obstacle in &mut world.obstacles {
        obstacle.x -= speed;
    }
    for pickup in &mut world.pickups {
        pickup.pos.x -= speed;
        pickup.rotation = (pickup.rotation + PICKUP_SPIN_RATE) % std::f32::consts::TAU;
    }
    for projectile in &mut world.projectiles {
        projectile.advance();
    }
    for drop in &mut world.raindrops {
        drop.advance();
    }
    world.particles.update(now);
    sweep(&mut world.obstacles, |o| !o.is_offscreen());
    sweep(&mut world.pickups, |p| !p.is_offscreen());
    sweep(&mut world.projectiles, |p| !p.is_offscreen(viewport_width));
    sweep(&mut world.raindrops, |d| !d.is_gone());

    // --- Spawning ---
    session
        .spawner
        .spawn_obstacle(&mut state.rng, viewport_width, &mut world.obstacles);
    let storm_blocks = session.hazards.storm_active() && !settings.pickups_in_sandstorm;
    let gates = if storm_blocks {
        PickupGates::ALL_CLOSED
    } else {
        PickupGates {
            power: settings.power_pills,
            debuff: settings.debuff_pills,
            mega: settings.mega_posters,
        }
    };
    session
        .spawner
        .spawn_pickups(&mut state.rng, gates, &world.obstacles, &mut world.pickups);

    // --- Collision ---
    let avatar_box = session.avatar.bounds();
    if let Some(index) = collision::blocking_obstacle(&avatar_box, &world.obstacles) {
        if !settings.invulnerable {
            state.end_session();
            return;
        }
        // Invulnerable: smash through
        let obstacle = &mut world.obstacles[index];
        obstacle.destroyed = true;
        let center = Vec2::new(obstacle.x + OBSTACLE_WIDTH / 2.0, avatar_box.center().y);
        world.particles.spawn_explosion(&mut state.rng, center, budget);
        state.events.push(GameEvent::Explosion);
    }

    for pickup in collision::collect_pickups(&avatar_box, &mut world.pickups) {
        let modifiers = &mut session.avatar.modifiers;
        match pickup.kind {
            PickupKind::PowerPill => modifiers.grant_power(now),
            PickupKind::DebuffPill => modifiers.grant_debuff(now),
            PickupKind::MegaPoster => modifiers.grant_mega(now),
        }
        world.particles.spawn_burst(&mut state.rng, pickup.pos, budget);
        state.events.push(GameEvent::PickupCollected(pickup.kind));
        log::debug!("Collected {}", pickup.kind.as_str());
    }

    for impact in collision::projectile_hits(&mut world.projectiles, &mut world.obstacles) {
        world.particles.spawn_explosion(&mut state.rng, impact, budget);
        state.events.push(GameEvent::Explosion);
    }

    for splash in collision::rain_hits(&avatar_box, &mut world.raindrops) {
        world.particles.spawn_splash(&mut state.rng, splash, budget);
    }

    // --- Hazards ---
    let changes = session.hazards.update(HazardInputs {
        now,
        elapsed: session.clock.elapsed(now),
        score: session.score.score,
        rain_enabled: settings.rain,
        sandstorm_enabled: settings.sandstorm,
    });
    session.hazards.spawn_rain(
        &mut state.rng,
        &mut world.raindrops,
        settings.quality.rain_density(),
        viewport_width,
    );
    let grains = session
        .hazards
        .sand_count(&mut state.rng, settings.quality.sand_density());
    for _ in 0..grains {
        world
            .particles
            .spawn_sand(&mut state.rng, now, viewport_width, budget);
    }
    if changes.rain_started {
        state.events.push(GameEvent::RainStarted);
    }
    if changes.rain_stopped {
        state.events.push(GameEvent::RainStopped);
    }
    if changes.storm_started.is_some() {
        state.events.push(GameEvent::SandstormStarted);
    }
    if changes.storm_ended {
        state.events.push(GameEvent::SandstormEnded);
    }

    // --- Narrative ---
    let story = session
        .narrative
        .update(&mut state.rng, session.score.score, now, settings.taunts);
    if story.taunt_shown {
        state.events.push(GameEvent::Taunt);
    }
    if story.boss_started {
        state.events.push(GameEvent::BossIntroStarted);
    }
    if story.boss_finished {
        state.events.push(GameEvent::BossIntroFinished);
    }

    // --- Scoring ---
    let scored = session
        .score
        .score_passed(&mut world.obstacles, session.avatar.x);
    if scored.gained > 0 {
        state.events.push(GameEvent::Scored(session.score.score));
    }
    if let Some(level) = scored.level_up {
        state.events.push(GameEvent::LevelUp(level));
    }
    if let Some(track) = scored.track {
        state.events.push(GameEvent::PlayTrack(track));
    }

    session.frame += 1;
}

/// Launch projectiles from the avatar's leading edge, one per drift value
fn fire(state: &mut GameState, drifts: &[f32]) {
    let bounds = state.session.avatar.bounds();
    let origin = Vec2::new(bounds.right(), bounds.center().y);
    state
        .session
        .world
        .projectiles
        .extend(drifts.iter().map(|&drift| Projectile { pos: origin, drift }));
    state.emit(GameEvent::Fired {
        count: drifts.len(),
    });
}
