//! Host frame loop
//!
//! One call to `FrameLoop::frame` per display frame: feed queued input to the
//! simulation, hand its events to audio and persistence, then build and draw
//! the frame. A failing or panicking renderer is logged and flagged on screen;
//! it never stops the loop or touches game state.

use std::panic::{AssertUnwindSafe, catch_unwind};

use super::storage::Storage;
use super::{FrameHandle, FrameScheduler};
use crate::RenderError;
use crate::assets::AssetStore;
use crate::audio::{AudioDirector, AudioSink};
use crate::highscores::{HighScores, ScoreStore};
use crate::renderer::{BackgroundCache, FrameView, Renderer, build_frame};
use crate::settings::Settings;
use crate::sim::{Deadline, GameEvent, GamePhase, GameState, InputEvent, Millis, TickInput, tick};

/// Frame interval the simulation constants are tuned for
const NOMINAL_FRAME_MS: f64 = 1000.0 / 60.0;
/// Weight of the newest sample in the frame interval average
const FRAME_SMOOTHING: f64 = 0.1;
/// Longer gaps (hidden tab, debugger) are not frame-rate samples
const MAX_FRAME_SAMPLE_MS: f64 = 250.0;
const MIN_SPEED_FACTOR: f32 = 0.5;
const MAX_SPEED_FACTOR: f32 = 2.0;
/// How long the error indicator stays up after a render fault
const FAULT_INDICATOR_MS: f64 = 3_000.0;

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub struct FrameLoop<A: AudioSink, R: Renderer, S: Storage> {
    pub state: GameState,
    pub settings: Settings,
    pub scores: HighScores,
    pub assets: AssetStore,
    /// Let the autopilot fly (demo mode)
    pub autopilot: bool,
    /// Attract play behind the TITLE screen
    pub attract: bool,
    audio: AudioDirector<A>,
    renderer: R,
    storage: S,
    background: BackgroundCache,
    input: Vec<InputEvent>,
    /// Leaderboard rank of the last finished run
    last_rank: Option<usize>,
    fault_until: Option<Deadline>,
    faults: u32,
    last_frame_at: Option<Millis>,
    /// Smoothed frame interval
    frame_interval: f64,
    pending: Option<FrameHandle>,
    frames: u64,
}

impl<A: AudioSink, R: Renderer, S: Storage> FrameLoop<A, R, S> {
    pub fn new(
        state: GameState,
        settings: Settings,
        scores: HighScores,
        audio: A,
        renderer: R,
        storage: S,
    ) -> Self {
        let audio = AudioDirector::new(audio, settings.muted);
        Self {
            state,
            settings,
            scores,
            assets: AssetStore::new(),
            autopilot: false,
            attract: true,
            audio,
            renderer,
            storage,
            background: BackgroundCache::new(),
            input: Vec::new(),
            last_rank: None,
            fault_until: None,
            faults: 0,
            last_frame_at: None,
            frame_interval: NOMINAL_FRAME_MS,
            pending: None,
            frames: 0,
        }
    }

    /// Queue an input for the next frame
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Focus lost or page hidden: pause a running session. Repeat calls within a frame are harmless.
    pub fn suspend(&mut self) {
        if self.state.phase == GamePhase::Playing && !self.input.contains(&InputEvent::Suspend) {
            log::info!("Auto-pausing");
            self.input.push(InputEvent::Suspend);
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Render faults seen so far
    pub fn faults(&self) -> u32 {
        self.faults
    }

    pub fn fault_visible(&self, now: Millis) -> bool {
        self.fault_until.is_some_and(|d| !d.expired(now))
    }

    pub fn audio(&self) -> &AudioDirector<A> {
        &self.audio
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Device speed factor from the measured frame rate
    pub fn device_speed_factor(&self) -> f32 {
        ((self.frame_interval / NOMINAL_FRAME_MS) as f32).clamp(MIN_SPEED_FACTOR, MAX_SPEED_FACTOR)
    }

    fn measure(&mut self, now: Millis) {
        if let Some(last) = self.last_frame_at {
            let dt = now - last;
            if dt > 0.0 && dt < MAX_FRAME_SAMPLE_MS {
                self.frame_interval += (dt - self.frame_interval) * FRAME_SMOOTHING;
            }
        }
        self.last_frame_at = Some(now);
    }

    /// Run one frame. Returns the simulation events it produced.
    pub fn frame(&mut self, now: Millis) -> Vec<GameEvent> {
        // The callback that got us here has fired
        self.pending = None;
        self.measure(now);

        let input = TickInput {
            events: std::mem::take(&mut self.input),
            track_ended: self.audio.poll_track_ended(),
            device_speed_factor: self.device_speed_factor(),
            autopilot: self.autopilot,
            attract: self.attract,
        };
        tick(&mut self.state, &input, &self.settings, now);

        let events = self.state.drain_events();
        self.audio.route(&events);
        for event in &events {
            self.apply(event);
        }

        self.render(now);
        self.frames += 1;
        events
    }

    /// Host-side reactions: persistence and settings
    fn apply(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::SessionStarted => self.last_rank = None,
            GameEvent::GameOver { score } => {
                self.last_rank = self.scores.potential_rank(score);
                self.scores.submit(score);
                if let Err(e) = self.storage.save_scores(&self.scores) {
                    log::error!("Failed to save high scores: {}", e);
                }
            }
            GameEvent::SettingToggled(key) => {
                self.settings.toggle(key);
                log::info!("{} -> {}", key.label(), self.settings.value_label(key));
                self.save_settings();
            }
            GameEvent::MuteToggled => {
                self.settings.muted = !self.settings.muted;
                self.audio.set_muted(self.settings.muted);
                log::info!("Muted: {}", self.settings.muted);
                self.save_settings();
            }
            _ => {}
        }
    }

    fn save_settings(&mut self) {
        if let Err(e) = self.storage.save_settings(&self.settings) {
            log::error!("Failed to save settings: {}", e);
        }
    }

    fn render(&mut self, now: Millis) {
        let view = FrameView {
            state: &self.state,
            settings: &self.settings,
            scores: &self.scores,
            assets: &self.assets,
            now,
            last_rank: self.last_rank,
            fault: self.fault_until.is_some_and(|d| !d.expired(now)),
        };
        let renderer = &mut self.renderer;
        let background = &mut self.background;
        let result = catch_unwind(AssertUnwindSafe(|| {
            let list = build_frame(&view, background);
            renderer.draw(&list)
        }));
        let error = match result {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e,
            Err(payload) => RenderError::Panicked(panic_message(payload.as_ref())),
        };
        self.faults += 1;
        log::error!("Frame {} not drawn: {}", self.frames, error);
        self.fault_until = Some(Deadline::after(now, FAULT_INDICATOR_MS));
    }

    /// Request the next frame, replacing any request still pending
    pub fn schedule(&mut self, scheduler: &mut impl FrameScheduler) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel(handle);
        }
        self.pending = Some(scheduler.request());
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending.is_some()
    }

    /// Cancel the pending frame callback
    pub fn shutdown(&mut self, scheduler: &mut impl FrameScheduler) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel(handle);
            log::info!("Frame loop stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::LogAudio;
    use crate::platform::MemoryStorage;
    use crate::renderer::{DrawCmd, DrawList, HeadlessRenderer, colors};
    use crate::sim::SettingKey;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    type TestLoop<R> = FrameLoop<LogAudio, R, MemoryStorage>;

    fn game<R: Renderer>(renderer: R) -> TestLoop<R> {
        let mut settings = Settings::default();
        settings.invulnerable = true;
        FrameLoop::new(
            GameState::new(3),
            settings,
            HighScores::new(),
            LogAudio::default(),
            renderer,
            MemoryStorage::default(),
        )
    }

    fn start<R: Renderer>(game: &mut TestLoop<R>, now: &mut f64) {
        game.push_input(InputEvent::Primary);
        game.frame(*now);
        *now += FRAME_MS;
        game.push_input(InputEvent::Primary);
        game.frame(*now);
        *now += FRAME_MS;
        assert_eq!(game.state.phase, GamePhase::Playing);
    }

    /// Fails or panics on chosen frames, remembers the last list it was given
    #[derive(Default)]
    struct Flaky {
        calls: u32,
        fail_on: Option<u32>,
        panic_on: Option<u32>,
        last: DrawList,
    }

    impl Renderer for Flaky {
        fn draw(&mut self, frame: &DrawList) -> Result<(), RenderError> {
            self.calls += 1;
            self.last = frame.clone();
            if self.panic_on == Some(self.calls) {
                panic!("sprite atlas exploded");
            }
            if self.fail_on == Some(self.calls) {
                return Err(RenderError::SurfaceLost);
            }
            Ok(())
        }
    }

    fn has_fault_marker(list: &DrawList) -> bool {
        list.cmds
            .iter()
            .any(|c| matches!(c, DrawCmd::Rect { color, .. } if *color == colors::FAULT))
    }

    #[derive(Default)]
    struct FakeScheduler {
        next: i32,
        outstanding: Vec<FrameHandle>,
    }

    impl FrameScheduler for FakeScheduler {
        fn request(&mut self) -> FrameHandle {
            self.next += 1;
            let handle = FrameHandle(self.next);
            self.outstanding.push(handle);
            handle
        }

        fn cancel(&mut self, handle: FrameHandle) {
            self.outstanding.retain(|h| *h != handle);
        }
    }

    #[test]
    fn test_render_error_keeps_loop_running() {
        let mut game = game(Flaky {
            fail_on: Some(3),
            ..Default::default()
        });
        let mut now = 0.0;
        start(&mut game, &mut now);
        game.frame(now);
        assert_eq!(game.faults(), 1);
        assert_eq!(game.state.phase, GamePhase::Playing);

        let frame_before = game.state.session.frame;
        now += FRAME_MS;
        game.frame(now);
        assert_eq!(game.state.session.frame, frame_before + 1);
        assert!(has_fault_marker(&game.renderer().last));
    }

    #[test]
    fn test_render_panic_is_contained() {
        let mut game = game(Flaky {
            panic_on: Some(3),
            ..Default::default()
        });
        let mut now = 0.0;
        start(&mut game, &mut now);
        game.frame(now);
        assert_eq!(game.faults(), 1);
        assert!(game.fault_visible(now));
        assert!(!game.fault_visible(now + FAULT_INDICATOR_MS));

        now += FRAME_MS;
        game.frame(now);
        assert_eq!(game.state.phase, GamePhase::Playing);
        assert!(has_fault_marker(&game.renderer().last));
    }

    #[test]
    fn test_game_over_submits_score_once() {
        let mut game = game(HeadlessRenderer::default());
        game.settings.invulnerable = false;
        let mut now = 0.0;
        start(&mut game, &mut now);
        game.state.session.score.score = 17;
        // Free fall into the ground
        for _ in 0..200 {
            game.frame(now);
            now += FRAME_MS;
        }
        assert_eq!(game.state.phase, GamePhase::GameOver);
        assert_eq!(game.scores.entries, vec![17]);
        assert_eq!(game.storage().scores.as_ref().map(|s| s.entries.clone()), Some(vec![17]));
        assert_eq!(game.last_rank, Some(1));
        assert!(game.audio().current_track().is_some());
    }

    #[test]
    fn test_setting_toggle_persists() {
        let mut game = game(HeadlessRenderer::default());
        game.push_input(InputEvent::Primary);
        game.frame(0.0);
        // Main menu: Down to Options, Primary to enter, Primary toggles the first entry
        for event in [InputEvent::Down, InputEvent::Primary, InputEvent::Primary] {
            game.push_input(event);
        }
        let events = game.frame(FRAME_MS);
        assert!(events.contains(&GameEvent::SettingToggled(SettingKey::PowerPills)));
        assert!(!game.settings.power_pills);
        assert_eq!(
            game.storage().settings.as_ref().map(|s| s.power_pills),
            Some(false)
        );
    }

    #[test]
    fn test_mute_toggle_reaches_audio() {
        let mut game = game(HeadlessRenderer::default());
        game.push_input(InputEvent::ToggleMute);
        game.frame(0.0);
        assert!(game.settings.muted);
        assert!(game.audio().is_muted());
        assert_eq!(game.storage().writes, 1);
    }

    #[test]
    fn test_suspend_pauses_only_while_playing() {
        let mut game = game(HeadlessRenderer::default());
        game.suspend();
        game.frame(0.0);
        assert_eq!(game.state.phase, GamePhase::Title);

        let mut now = FRAME_MS;
        start(&mut game, &mut now);
        game.suspend();
        game.frame(now);
        assert_eq!(game.state.phase, GamePhase::Paused);
    }

    #[test]
    fn test_visibility_and_blur_in_one_frame_stay_paused() {
        let mut game = game(HeadlessRenderer::default());
        let mut now = FRAME_MS;
        start(&mut game, &mut now);
        game.suspend();
        game.suspend();
        game.frame(now);
        assert_eq!(game.state.phase, GamePhase::Paused);

        // Player pause and a focus loss in the same frame
        game.push_input(InputEvent::Primary);
        game.frame(now + FRAME_MS);
        assert_eq!(game.state.phase, GamePhase::Playing);
        game.push_input(InputEvent::Pause);
        game.suspend();
        game.frame(now + 2.0 * FRAME_MS);
        assert_eq!(game.state.phase, GamePhase::Paused);
    }

    #[test]
    fn test_only_one_frame_pending() {
        let mut game = game(HeadlessRenderer::default());
        let mut scheduler = FakeScheduler::default();
        game.schedule(&mut scheduler);
        game.schedule(&mut scheduler);
        assert_eq!(scheduler.outstanding, vec![FrameHandle(2)]);

        game.frame(0.0);
        assert!(!game.is_scheduled());
        game.schedule(&mut scheduler);
        assert!(game.is_scheduled());

        game.shutdown(&mut scheduler);
        assert!(!game.is_scheduled());
        // Fired handles are the scheduler's business; the live one was cancelled
        assert!(!scheduler.outstanding.contains(&FrameHandle(3)));
    }

    #[test]
    fn test_speed_factor_tracks_frame_rate() {
        let mut game = game(HeadlessRenderer::default());
        let mut now = 0.0;
        for _ in 0..120 {
            game.frame(now);
            now += FRAME_MS;
        }
        assert!((game.device_speed_factor() - 1.0).abs() < 0.01);

        // 30 fps display
        for _ in 0..120 {
            game.frame(now);
            now += FRAME_MS * 2.0;
        }
        assert!((game.device_speed_factor() - 2.0).abs() < 0.05);

        // A long stall is ignored
        game.frame(now + 5_000.0);
        assert!((game.device_speed_factor() - 2.0).abs() < 0.05);
    }

    #[test]
    fn test_autopilot_plays_through_host() {
        let mut game = game(HeadlessRenderer::default());
        game.settings = Settings::default();
        game.autopilot = true;
        let mut now = 0.0;
        start(&mut game, &mut now);
        let mut jumped = false;
        for _ in 0..60 {
            jumped |= game.frame(now).contains(&GameEvent::Jumped);
            now += FRAME_MS;
        }
        assert!(jumped);
        assert_eq!(game.renderer().frames, 62);
    }
}
