//! Audio collaborator boundary
//!
//! The simulation only emits `GameEvent`s. `AudioDirector` turns them into
//! sound cues and music track changes for whatever `AudioSink` the host
//! provides, and polls the sink for "track ended" so level music can advance.
//! On wasm32 `WebAudio` synthesizes short tones with the Web Audio API; music
//! tracks are timed placeholders on every platform.

use crate::sim::{GameEvent, PickupKind};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Avatar flapped
    Flap,
    /// Projectile(s) fired
    Shot,
    /// Power pill or mega poster collected
    PowerUp,
    /// Debuff pill collected
    PowerDown,
    /// Obstacle destroyed
    Explosion,
    /// Obstacle passed
    Point,
    /// New skin level reached
    LevelUp,
    /// Rain started
    Thunder,
    /// Sandstorm started
    Wind,
    /// Taunt popped up
    Taunt,
    /// Boss intro glitch
    Glitch,
    /// Session ended
    GameOver,
    /// Options menu toggle
    MenuClick,
}

impl SoundEffect {
    /// Sound cue for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        Some(match event {
            GameEvent::Jumped => SoundEffect::Flap,
            GameEvent::Fired { .. } => SoundEffect::Shot,
            GameEvent::PickupCollected(PickupKind::DebuffPill) => SoundEffect::PowerDown,
            GameEvent::PickupCollected(_) => SoundEffect::PowerUp,
            GameEvent::Explosion => SoundEffect::Explosion,
            GameEvent::Scored(_) => SoundEffect::Point,
            GameEvent::LevelUp(_) => SoundEffect::LevelUp,
            GameEvent::RainStarted => SoundEffect::Thunder,
            GameEvent::SandstormStarted => SoundEffect::Wind,
            GameEvent::Taunt => SoundEffect::Taunt,
            GameEvent::BossIntroStarted => SoundEffect::Glitch,
            GameEvent::GameOver { .. } => SoundEffect::GameOver,
            GameEvent::SettingToggled(_) => SoundEffect::MenuClick,
            _ => return None,
        })
    }
}

/// Something that can make noise
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);
    /// Start music track `track` from the beginning
    fn play_track(&mut self, track: usize);
    fn set_muted(&mut self, muted: bool);
    /// Called once per frame. True exactly once when the current track finishes.
    fn take_track_ended(&mut self) -> bool;
}

/// Frames a placeholder music track lasts (90 s at 60 fps)
pub const TRACK_FRAMES: u32 = 90 * 60;

/// Frame-counted stand-in for real track playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackTimer {
    length: u32,
    remaining: Option<u32>,
}

impl TrackTimer {
    pub fn new(length: u32) -> Self {
        Self {
            length,
            remaining: None,
        }
    }

    pub fn start(&mut self) {
        self.remaining = Some(self.length);
    }

    /// Count one frame; true when the track just finished
    pub fn poll(&mut self) -> bool {
        match self.remaining {
            Some(0) => {
                self.remaining = None;
                true
            }
            Some(left) => {
                self.remaining = Some(left - 1);
                false
            }
            None => false,
        }
    }
}

/// Sink that only logs. Used by the native headless host.
#[derive(Debug)]
pub struct LogAudio {
    muted: bool,
    track: TrackTimer,
}

impl LogAudio {
    pub fn new(track_frames: u32) -> Self {
        Self {
            muted: false,
            track: TrackTimer::new(track_frames),
        }
    }
}

impl Default for LogAudio {
    fn default() -> Self {
        Self::new(TRACK_FRAMES)
    }
}

impl AudioSink for LogAudio {
    fn play(&mut self, effect: SoundEffect) {
        if !self.muted {
            log::trace!("sfx {:?}", effect);
        }
    }

    fn play_track(&mut self, track: usize) {
        log::debug!("Music track {}", track);
        self.track.start();
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn take_track_ended(&mut self) -> bool {
        self.track.poll()
    }
}

/// Routes simulation events to an `AudioSink`
pub struct AudioDirector<S: AudioSink> {
    sink: S,
    muted: bool,
    current_track: Option<usize>,
}

impl<S: AudioSink> AudioDirector<S> {
    pub fn new(mut sink: S, muted: bool) -> Self {
        sink.set_muted(muted);
        Self {
            sink,
            muted,
            current_track: None,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn current_track(&self) -> Option<usize> {
        self.current_track
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.sink.set_muted(muted);
    }

    /// React to one frame's events
    pub fn route(&mut self, events: &[GameEvent]) {
        for event in events {
            if let GameEvent::PlayTrack(track) = *event {
                self.current_track = Some(track);
                self.sink.play_track(track);
            } else if let Some(effect) = SoundEffect::for_event(event) {
                self.sink.play(effect);
            }
        }
    }

    /// Whether the music collaborator reported the end of the current track
    pub fn poll_track_ended(&mut self) -> bool {
        self.sink.take_track_ended()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, SoundEffect, TRACK_FRAMES, TrackTimer};

    /// A short synthesized cue: a run of notes with a shared envelope
    struct Tone {
        notes: &'static [f32],
        wave: OscillatorType,
        /// Seconds between note onsets
        step: f64,
        /// Seconds each note takes to decay
        decay: f64,
        level: f32,
        /// Optional pitch glide target for single-note cues
        glide_to: Option<f32>,
    }

    fn tone(
        notes: &'static [f32],
        wave: OscillatorType,
        step: f64,
        decay: f64,
        level: f32,
        glide_to: Option<f32>,
    ) -> Tone {
        Tone {
            notes,
            wave,
            step,
            decay,
            level,
            glide_to,
        }
    }

    fn tone_for(effect: SoundEffect) -> Tone {
        use OscillatorType::*;
        match effect {
            SoundEffect::Flap => tone(&[320.0], Triangle, 0.0, 0.08, 0.2, Some(520.0)),
            SoundEffect::Shot => tone(&[900.0], Square, 0.0, 0.06, 0.12, Some(300.0)),
            SoundEffect::PowerUp => tone(&[600.0, 800.0, 1000.0], Sine, 0.08, 0.15, 0.25, None),
            SoundEffect::PowerDown => tone(&[500.0, 400.0, 300.0], Sawtooth, 0.08, 0.15, 0.2, None),
            SoundEffect::Explosion => tone(&[120.0], Sawtooth, 0.0, 0.4, 0.4, Some(30.0)),
            SoundEffect::Point => tone(&[880.0], Sine, 0.0, 0.1, 0.2, None),
            SoundEffect::LevelUp => tone(&[400.0, 500.0, 600.0, 800.0], Triangle, 0.1, 0.4, 0.3, None),
            SoundEffect::Thunder => tone(&[60.0], Sawtooth, 0.0, 0.9, 0.35, Some(25.0)),
            SoundEffect::Wind => tone(&[200.0], Triangle, 0.0, 1.2, 0.2, Some(90.0)),
            SoundEffect::Taunt => tone(&[300.0, 250.0], Square, 0.12, 0.15, 0.15, None),
            SoundEffect::Glitch => tone(&[1200.0, 90.0, 1500.0, 60.0], Square, 0.05, 0.05, 0.2, None),
            SoundEffect::GameOver => tone(&[400.0, 350.0, 300.0, 200.0], Sine, 0.2, 0.3, 0.3, None),
            SoundEffect::MenuClick => tone(&[700.0], Sine, 0.0, 0.04, 0.15, None),
        }
    }

    /// Web Audio sink with procedurally generated cues
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        volume: f32,
        muted: bool,
        track: TrackTimer,
    }

    impl Default for WebAudio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudio {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                volume: 0.8,
                muted: false,
                track: TrackTimer::new(TRACK_FRAMES),
            }
        }

        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            wave: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;
            osc.set_type(wave);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;
            Some((osc, gain))
        }

        fn play_tone(ctx: &AudioContext, tone: &Tone, vol: f32) {
            for (i, &freq) in tone.notes.iter().enumerate() {
                let Some((osc, gain)) = Self::create_osc(ctx, freq, tone.wave) else {
                    continue;
                };
                let t = ctx.current_time() + i as f64 * tone.step;
                gain.gain().set_value_at_time(vol * tone.level, t).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + tone.decay)
                    .ok();
                if let Some(target) = tone.glide_to {
                    osc.frequency().set_value_at_time(freq, t).ok();
                    osc.frequency()
                        .exponential_ramp_to_value_at_time(target, t + tone.decay)
                        .ok();
                }
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + tone.decay + 0.05).ok();
            }
        }
    }

    impl AudioSink for WebAudio {
        fn play(&mut self, effect: SoundEffect) {
            if self.muted || self.volume <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };
            // Browsers keep the context suspended until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }
            Self::play_tone(ctx, &tone_for(effect), self.volume);
        }

        fn play_track(&mut self, track: usize) {
            log::info!("Music track {}", track);
            self.track.start();
        }

        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        fn take_track_ended(&mut self) -> bool {
            self.track.poll()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        effects: Vec<SoundEffect>,
        tracks: Vec<usize>,
        muted: bool,
        end_next: bool,
    }

    impl AudioSink for Recorder {
        fn play(&mut self, effect: SoundEffect) {
            self.effects.push(effect);
        }

        fn play_track(&mut self, track: usize) {
            self.tracks.push(track);
        }

        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }

        fn take_track_ended(&mut self) -> bool {
            std::mem::take(&mut self.end_next)
        }
    }

    #[test]
    fn test_routes_cues_and_tracks() {
        let mut director = AudioDirector::new(Recorder::default(), false);
        director.route(&[
            GameEvent::SessionStarted,
            GameEvent::PlayTrack(0),
            GameEvent::PickupCollected(PickupKind::DebuffPill),
            GameEvent::Explosion,
            GameEvent::PlayTrack(2),
        ]);
        assert_eq!(
            director.sink().effects,
            vec![SoundEffect::PowerDown, SoundEffect::Explosion]
        );
        assert_eq!(director.sink().tracks, vec![0, 2]);
        assert_eq!(director.current_track(), Some(2));
    }

    #[test]
    fn test_mute_reaches_sink() {
        let mut director = AudioDirector::new(Recorder::default(), true);
        assert!(director.sink().muted);
        director.set_muted(false);
        assert!(!director.is_muted());
        assert!(!director.sink().muted);
    }

    #[test]
    fn test_track_end_reported_once() {
        let mut director = AudioDirector::new(
            Recorder {
                end_next: true,
                ..Default::default()
            },
            false,
        );
        assert!(director.poll_track_ended());
        assert!(!director.poll_track_ended());
    }

    #[test]
    fn test_track_timer() {
        let mut timer = TrackTimer::new(2);
        assert!(!timer.poll());
        timer.start();
        assert!(!timer.poll());
        assert!(!timer.poll());
        assert!(timer.poll());
        assert!(!timer.poll());
    }

    #[test]
    fn test_silent_events() {
        assert_eq!(SoundEffect::for_event(&GameEvent::Paused), None);
        assert_eq!(SoundEffect::for_event(&GameEvent::PlayTrack(1)), None);
        assert_eq!(
            SoundEffect::for_event(&GameEvent::Fired { count: 5 }),
            Some(SoundEffect::Shot)
        );
    }
}
