//! Frame composition
//!
//! Turns a read-only view of the game into a back-to-front draw list. Every
//! sprite lookup goes through the asset store and falls back to a flat shape,
//! so a frame can always be built, whatever has loaded so far.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{Align, BackgroundCache, Color, DrawCmd, DrawList, colors, with_alpha};
use crate::Rect;
use crate::assets::{AssetStore, SpriteId};
use crate::consts::*;
use crate::highscores::HighScores;
use crate::settings::Settings;
use crate::sim::{
    Boost, BossPhase, GamePhase, GameState, Hazard, MainItem, MenuScreen, Millis, ParticleKind,
    PickupKind, SettingKey,
};

/// Everything a frame is built from. Holds only shared borrows.
pub struct FrameView<'a> {
    pub state: &'a GameState,
    pub settings: &'a Settings,
    pub scores: &'a HighScores,
    pub assets: &'a AssetStore,
    pub now: Millis,
    /// Leaderboard rank of the last finished run
    pub last_rank: Option<usize>,
    /// A recent draw failed; show the error indicator
    pub fault: bool,
}

/// Build the draw list for the current phase
pub fn build_frame(view: &FrameView, background: &mut BackgroundCache) -> DrawList {
    let state = view.state;
    let session = &state.session;
    let mut list = DrawList::new();

    let level = match state.phase {
        GamePhase::Title | GamePhase::Start(_) => 0,
        _ => session.score.level,
    };
    list.cmds
        .extend_from_slice(background.get(level, session.viewport_width, view.assets));

    match state.phase {
        GamePhase::Title => {
            if session.attract {
                draw_scene(&mut list, view);
                list.overlay(colors::SHADE);
            }
            draw_title(&mut list, view);
        }
        GamePhase::Start(MenuScreen::Main { selected }) => draw_main_menu(&mut list, view, selected),
        GamePhase::Start(MenuScreen::Options { selected }) => draw_options(&mut list, view, selected),
        GamePhase::Playing => draw_world(&mut list, view),
        GamePhase::Paused => {
            draw_world(&mut list, view);
            list.overlay(colors::SHADE);
            list.text("PAUSED", center(view, 0.4), 48.0, colors::TEXT, Align::Center);
            list.text(
                "Press ESC to resume",
                center(view, 0.48),
                18.0,
                colors::TEXT_DIM,
                Align::Center,
            );
        }
        GamePhase::GameOver => {
            draw_world(&mut list, view);
            list.overlay(colors::SHADE);
            draw_game_over(&mut list, view);
        }
    }

    if view.fault {
        list.rect(Rect::new(8.0, 8.0, 14.0, 14.0), colors::FAULT);
        list.text("!", Vec2::new(15.0, 20.0), 12.0, colors::TEXT, Align::Center);
    }
    list
}

/// Horizontal center at a fraction of the play-area height
fn center(view: &FrameView, y_fraction: f32) -> Vec2 {
    Vec2::new(view.state.session.viewport_width / 2.0, PLAY_HEIGHT * y_fraction)
}

fn draw_title(list: &mut DrawList, view: &FrameView) {
    list.text("STORM FLAP", center(view, 0.3), 56.0, colors::HIGHLIGHT, Align::Center);
    // Slow blink
    if (view.now / 600.0) as u64 % 2 == 0 {
        list.text("Press SPACE", center(view, 0.5), 22.0, colors::TEXT, Align::Center);
    }
    if let Some(best) = view.scores.top_score() {
        list.text(
            format!("Best: {}", best),
            center(view, 0.58),
            18.0,
            colors::TEXT_DIM,
            Align::Center,
        );
    }
}

fn draw_main_menu(list: &mut DrawList, view: &FrameView, selected: MainItem) {
    list.text("STORM FLAP", center(view, 0.25), 40.0, colors::HIGHLIGHT, Align::Center);
    for (i, item) in MainItem::ALL.iter().enumerate() {
        let label = match item {
            MainItem::Play => "Play",
            MainItem::Options => "Options",
        };
        let (text, color) = if *item == selected {
            (format!("> {} <", label), colors::HIGHLIGHT)
        } else {
            (label.to_string(), colors::TEXT)
        };
        list.text(text, center(view, 0.45 + i as f32 * 0.07), 28.0, color, Align::Center);
    }
}

fn draw_options(list: &mut DrawList, view: &FrameView, selected: usize) {
    list.text("OPTIONS", center(view, 0.12), 36.0, colors::HIGHLIGHT, Align::Center);
    let left = 40.0;
    for (i, key) in SettingKey::ALL.iter().enumerate() {
        let y = PLAY_HEIGHT * 0.22 + i as f32 * 40.0;
        let color = if i == selected {
            colors::HIGHLIGHT
        } else {
            colors::TEXT
        };
        let marker = if i == selected { "> " } else { "  " };
        list.text(
            format!("{}{}: {}", marker, key.label(), view.settings.value_label(*key)),
            Vec2::new(left, y),
            20.0,
            color,
            Align::Left,
        );
    }
    list.text(
        "SPACE: toggle   ESC: back",
        center(view, 0.9),
        16.0,
        colors::TEXT_DIM,
        Align::Center,
    );
}

fn draw_world(list: &mut DrawList, view: &FrameView) {
    draw_scene(list, view);
    draw_hud(list, view);
    draw_narrative(list, view);
}

/// Entities, weather and hazard warnings without the HUD
fn draw_scene(list: &mut DrawList, view: &FrameView) {
    let session = &view.state.session;
    let world = &session.world;
    let level = session.score.level;

    for obstacle in &world.obstacles {
        for segment in [obstacle.top_segment(), obstacle.bottom_segment()] {
            if segment.is_empty() {
                continue;
            }
            if obstacle.destroyed {
                list.rect(segment, colors::DEBRIS);
                continue;
            }
            let id = SpriteId::Obstacle {
                level,
                variant: obstacle.variant,
            };
            let color = colors::OBSTACLE[obstacle.variant as usize % colors::OBSTACLE.len()];
            sprite_or(list, view.assets, id, segment, 0.0, color);
        }
    }

    for pickup in &world.pickups {
        let color = match pickup.kind {
            PickupKind::PowerPill => colors::POWER_PILL,
            PickupKind::DebuffPill => colors::DEBUFF_PILL,
            PickupKind::MegaPoster => colors::MEGA_POSTER,
        };
        sprite_or(
            list,
            view.assets,
            SpriteId::Pickup(pickup.kind),
            pickup.bounds(),
            pickup.rotation,
            color,
        );
    }

    for projectile in &world.projectiles {
        sprite_or(
            list,
            view.assets,
            SpriteId::Projectile,
            projectile.bounds(),
            0.0,
            colors::PROJECTILE,
        );
    }

    let avatar = &session.avatar;
    let avatar_color = match avatar.modifiers.boost {
        Boost::Mega { .. } => colors::AVATAR_MEGA,
        Boost::PowerShot { .. } => colors::AVATAR_POWER,
        Boost::None if avatar.modifiers.is_debuffed() => colors::AVATAR_DEBUFF,
        Boost::None => colors::AVATAR,
    };
    sprite_or(
        list,
        view.assets,
        SpriteId::Avatar,
        avatar.bounds(),
        avatar.rotation,
        avatar_color,
    );

    for drop in &world.raindrops {
        let tail = drop.pos - drop.vel.normalize_or_zero() * RAINDROP_LENGTH;
        list.push(DrawCmd::Line {
            from: tail,
            to: drop.pos,
            width: 1.5,
            color: colors::RAIN,
        });
    }

    draw_particles(list, view);
    draw_hazard_overlay(list, view);
}

/// Sprite when loaded, otherwise a rotated flat quad
fn sprite_or(
    list: &mut DrawList,
    assets: &AssetStore,
    id: SpriteId,
    rect: Rect,
    rotation: f32,
    color: Color,
) {
    if assets.sprite(id).is_some() {
        list.push(DrawCmd::Sprite {
            id,
            rect,
            rotation,
            alpha: 1.0,
        });
    } else {
        list.push(DrawCmd::Quad {
            center: rect.center(),
            size: Vec2::new(rect.w, rect.h),
            rotation,
            color,
        });
    }
}

fn draw_particles(list: &mut DrawList, view: &FrameView) {
    let particles = &view.state.session.world.particles;
    for (kind, color) in [
        (ParticleKind::Sand, colors::SAND),
        (ParticleKind::Splash, colors::SPLASH),
        (ParticleKind::Explosion, colors::EXPLOSION),
        (ParticleKind::Burst, colors::BURST),
    ] {
        for particle in particles.list(kind) {
            let fade = particle.life.fraction(view.now);
            list.push(DrawCmd::Quad {
                center: particle.pos,
                size: Vec2::splat(particle.size),
                rotation: 0.0,
                color: with_alpha(color, fade),
            });
        }
    }
}

fn draw_hazard_overlay(list: &mut DrawList, view: &FrameView) {
    let hazards = &view.state.session.hazards;
    if hazards.rain_intensity > 0.0 {
        list.overlay(with_alpha(colors::RAIN_TINT, hazards.rain_intensity));
    }
    match hazards.current {
        Hazard::Sandstorm => list.overlay(colors::STORM_TINT),
        Hazard::Transitioning { .. } => {
            let opacity = hazards.warning_opacity;
            list.overlay(with_alpha(colors::WARNING_TINT, opacity));
            list.text(
                "SANDSTORM INCOMING",
                center(view, 0.2),
                30.0,
                with_alpha(colors::HIGHLIGHT, opacity),
                Align::Center,
            );
        }
        Hazard::None | Hazard::Rain => {}
    }
}

fn draw_hud(list: &mut DrawList, view: &FrameView) {
    let session = &view.state.session;
    list.text(
        session.score.score.to_string(),
        center(view, 0.08),
        48.0,
        colors::TEXT,
        Align::Center,
    );

    let modifiers = &session.avatar.modifiers;
    let mut line = PLAY_HEIGHT - GROUND_HEIGHT + 24.0;
    let mut status = |label: &str, remaining: Millis, color: Color| {
        list.text(
            format!("{} {:.1}s", label, remaining / 1000.0),
            Vec2::new(12.0, line),
            16.0,
            color,
            Align::Left,
        );
        line += 18.0;
    };
    match modifiers.boost {
        Boost::PowerShot { until } => status("POWER", until.remaining(view.now), colors::AVATAR_POWER),
        Boost::Mega { until, .. } => status("MEGA", until.remaining(view.now), colors::AVATAR_MEGA),
        Boost::None => {}
    }
    if let Some(until) = modifiers.debuff {
        status("DEBUFF", until.remaining(view.now), colors::AVATAR_DEBUFF);
    }
}

fn draw_narrative(list: &mut DrawList, view: &FrameView) {
    let narrative = &view.state.session.narrative;

    if view.settings.taunts
        && let Some(taunt) = narrative.taunt
    {
        let alpha = taunt.alpha(view.now);
        let portrait = Rect::new(12.0, PLAY_HEIGHT * 0.7, 56.0, 56.0);
        let id = SpriteId::Portrait(taunt.portrait);
        if view.assets.sprite(id).is_some() {
            list.push(DrawCmd::Sprite {
                id,
                rect: portrait,
                rotation: 0.0,
                alpha,
            });
        } else {
            list.rect(portrait, with_alpha(colors::PORTRAIT, alpha));
        }
        list.text(
            taunt.text(),
            Vec2::new(portrait.right() + 10.0, portrait.center().y),
            16.0,
            with_alpha(colors::TEXT, alpha),
            Align::Left,
        );
    }

    match narrative.boss {
        BossPhase::Glitch { .. } => {
            list.overlay(colors::BOSS_SHADE);
            // Noise changes every 50ms but is stable within a frame
            let mut rng = Pcg32::seed_from_u64((view.now / 50.0) as u64);
            let width = view.state.session.viewport_width;
            for _ in 0..rng.random_range(4..10) {
                let y = rng.random_range(0.0..PLAY_HEIGHT);
                let h = rng.random_range(2.0..18.0);
                let x = rng.random_range(-40.0..40.0);
                list.rect(Rect::new(x, y, width, h), colors::GLITCH);
            }
        }
        BossPhase::Typewriter { .. } => {
            list.overlay(colors::BOSS_SHADE);
            if let Some(text) = narrative.boss_text(view.now) {
                list.text(text, center(view, 0.45), 24.0, colors::BOSS_TEXT, Align::Center);
            }
        }
        BossPhase::Dormant | BossPhase::Done => {}
    }
}

fn draw_game_over(list: &mut DrawList, view: &FrameView) {
    list.text("GAME OVER", center(view, 0.2), 48.0, colors::TEXT, Align::Center);
    list.text(
        format!("Score: {}", view.state.score()),
        center(view, 0.28),
        28.0,
        colors::HIGHLIGHT,
        Align::Center,
    );
    if let Some(rank) = view.last_rank {
        list.text(
            format!("New high score! #{}", rank),
            center(view, 0.33),
            20.0,
            colors::HIGHLIGHT,
            Align::Center,
        );
    }
    for (i, score) in view.scores.entries.iter().enumerate() {
        let color = if Some(i + 1) == view.last_rank {
            colors::HIGHLIGHT
        } else {
            colors::TEXT_DIM
        };
        list.text(
            format!("{:>2}. {}", i + 1, score),
            center(view, 0.4 + i as f32 * 0.035),
            18.0,
            color,
            Align::Center,
        );
    }
    list.text(
        "SPACE: play again   ESC: menu",
        center(view, 0.85),
        16.0,
        colors::TEXT_DIM,
        Align::Center,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Sprite;
    use crate::sim::timer::Deadline;
    use crate::sim::{InputEvent, Obstacle, TickInput, tick};

    struct Fixture {
        state: GameState,
        settings: Settings,
        scores: HighScores,
        assets: AssetStore,
        background: BackgroundCache,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                state: GameState::new(5),
                settings: Settings::default(),
                scores: HighScores::new(),
                assets: AssetStore::new(),
                background: BackgroundCache::new(),
            }
        }

        fn playing(now: Millis) -> Self {
            let mut fixture = Self::new();
            fixture.state.start_session(now, 1.0);
            fixture.state.drain_events();
            fixture
        }

        fn build(&mut self, now: Millis) -> DrawList {
            let view = FrameView {
                state: &self.state,
                settings: &self.settings,
                scores: &self.scores,
                assets: &self.assets,
                now,
                last_rank: None,
                fault: false,
            };
            build_frame(&view, &mut self.background)
        }
    }

    #[test]
    fn test_title_shows_best_score() {
        let mut fixture = Fixture::new();
        fixture.scores = HighScores::from_scores([42, 7]);
        let list = fixture.build(0.0);
        assert!(list.contains_text("STORM FLAP"));
        assert!(list.contains_text("Best: 42"));
    }

    #[test]
    fn test_options_lists_every_setting() {
        let mut fixture = Fixture::new();
        fixture.state.phase = GamePhase::Start(MenuScreen::Options { selected: 2 });
        fixture.settings.rain = false;
        let list = fixture.build(0.0);
        for key in SettingKey::ALL {
            assert!(list.contains_text(key.label()), "missing {}", key.label());
        }
        assert!(list.contains_text("> Mega posters"));
        assert!(list.contains_text("Acid rain: Off"));
    }

    #[test]
    fn test_building_does_not_touch_state() {
        let mut fixture = Fixture::playing(0.0);
        fixture.state.session.world.obstacles.push(Obstacle::new(300.0, 200.0, GAP_SIZE, 1));
        let before = fixture.state.session.clone();
        for i in 0..5 {
            fixture.build(i as f64 * 16.0);
        }
        assert_eq!(fixture.state.session, before);
        assert!(fixture.state.events.is_empty());
    }

    #[test]
    fn test_paused_draws_frozen_world_and_label() {
        let mut fixture = Fixture::playing(0.0);
        fixture.state.session.world.obstacles.push(Obstacle::new(300.0, 200.0, GAP_SIZE, 0));
        let input = TickInput::with_events([InputEvent::Pause]);
        tick(&mut fixture.state, &input, &fixture.settings, 16.0);
        assert_eq!(fixture.state.phase, GamePhase::Paused);
        let list = fixture.build(5_000.0);
        assert!(list.contains_text("PAUSED"));
        // Obstacle segments and avatar fall back to quads
        let quads = list
            .cmds
            .iter()
            .filter(|c| matches!(c, DrawCmd::Quad { .. }))
            .count();
        assert!(quads >= 3);
    }

    #[test]
    fn test_title_draws_attract_run_without_hud() {
        let mut fixture = Fixture::new();
        let plain = fixture.build(0.0);
        assert!(!plain.cmds.iter().any(|c| matches!(c, DrawCmd::Quad { .. })));

        fixture.state.start_attract(0.0, 1.0);
        fixture.state.session.score.score = 987;
        fixture.state.session.world.obstacles.push(Obstacle::new(300.0, 200.0, GAP_SIZE, 0));
        let list = fixture.build(0.0);
        assert!(list.contains_text("STORM FLAP"));
        assert!(!list.contains_text("987"));
        let quads = list
            .cmds
            .iter()
            .filter(|c| matches!(c, DrawCmd::Quad { .. }))
            .count();
        assert!(quads >= 3);
        assert!(list.cmds.contains(&DrawCmd::Overlay { color: colors::SHADE }));
    }

    #[test]
    fn test_missing_sprites_fall_back_to_shapes() {
        let mut fixture = Fixture::playing(0.0);
        let list = fixture.build(0.0);
        assert_eq!(list.sprites().count(), 0);

        fixture.assets.insert(
            SpriteId::Avatar,
            Sprite {
                source: "avatar.png".into(),
                width: 36,
                height: 36,
            },
        );
        let list = fixture.build(16.0);
        assert_eq!(list.sprites().collect::<Vec<_>>(), vec![SpriteId::Avatar]);
    }

    #[test]
    fn test_destroyed_obstacle_drawn_as_debris() {
        let mut fixture = Fixture::playing(0.0);
        let mut obstacle = Obstacle::new(300.0, 200.0, GAP_SIZE, 0);
        obstacle.destroyed = true;
        fixture.state.session.world.obstacles.push(obstacle);
        let list = fixture.build(0.0);
        let debris = list
            .cmds
            .iter()
            .filter(|c| matches!(c, DrawCmd::Rect { color, .. } if *color == colors::DEBRIS))
            .count();
        assert_eq!(debris, 2);
    }

    #[test]
    fn test_sandstorm_warning_overlay() {
        let mut fixture = Fixture::playing(0.0);
        fixture.state.session.hazards.current = Hazard::Transitioning { warning: 0.5 };
        fixture.state.session.hazards.warning_opacity = 0.5;
        let list = fixture.build(0.0);
        assert!(list.contains_text("SANDSTORM INCOMING"));
        assert!(list.cmds.iter().any(
            |c| matches!(c, DrawCmd::Overlay { color } if *color == with_alpha(colors::WARNING_TINT, 0.5))
        ));
    }

    #[test]
    fn test_boss_typewriter_reveals_text() {
        let mut fixture = Fixture::playing(0.0);
        fixture.state.session.narrative.boss = BossPhase::Typewriter {
            message: 0,
            started: 1_000.0,
        };
        let list = fixture.build(1_000.0 + BOSS_CHAR_INTERVAL_MS * 6.0);
        assert!(list.contains_text("SIGNAL"));
        assert!(!list.contains_text("SIGNAL INTERCEPTED."));
    }

    #[test]
    fn test_glitch_is_stable_within_a_frame() {
        let mut fixture = Fixture::playing(0.0);
        fixture.state.session.narrative.boss = BossPhase::Glitch {
            until: Deadline::after(0.0, BOSS_GLITCH_MS),
        };
        let a = fixture.build(120.0);
        let b = fixture.build(120.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_taunt_hidden_when_disabled() {
        let mut fixture = Fixture::playing(0.0);
        fixture.state.session.narrative.taunt = Some(crate::sim::narrative::Taunt {
            message: 3,
            portrait: 0,
            until: Deadline::after(0.0, TAUNT_DURATION_MS),
        });
        assert!(fixture.build(10.0).contains_text("Gravity is winning."));
        fixture.settings.taunts = false;
        assert!(!fixture.build(10.0).contains_text("Gravity is winning."));
    }

    #[test]
    fn test_game_over_shows_rank_and_fault() {
        let mut fixture = Fixture::playing(0.0);
        fixture.state.session.score.score = 9;
        fixture.state.end_session();
        fixture.scores = HighScores::from_scores([20, 9]);
        let view = FrameView {
            state: &fixture.state,
            settings: &fixture.settings,
            scores: &fixture.scores,
            assets: &fixture.assets,
            now: 0.0,
            last_rank: Some(2),
            fault: true,
        };
        let list = build_frame(&view, &mut fixture.background);
        assert!(list.contains_text("GAME OVER"));
        assert!(list.contains_text("New high score! #2"));
        assert!(list.contains_text(" 2. 9"));
        assert!(list.cmds.iter().any(
            |c| matches!(c, DrawCmd::Rect { color, .. } if *color == colors::FAULT)
        ));
    }
}
