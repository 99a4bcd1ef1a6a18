//! Storm Flap entry point
//!
//! Handles platform-specific initialization and runs the game loop.
//! On the web the game draws to a Canvas2D context driven by
//! requestAnimationFrame. Natively it runs a headless autopilot demo.

#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, HtmlImageElement, KeyboardEvent};

    use storm_flap::assets::{Sprite, SpriteId};
    use storm_flap::audio::WebAudio;
    use storm_flap::consts::PLAY_HEIGHT;
    use storm_flap::platform::{BrowserStorage, FrameHandle, FrameLoop, FrameScheduler};
    use storm_flap::renderer::canvas::CanvasRenderer;
    use storm_flap::sim::{GameState, InputEvent};

    /// Where sprite images are served from
    const ASSET_ROOT: &str = "assets/";

    type Game = FrameLoop<WebAudio, CanvasRenderer, BrowserStorage>;
    type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

    /// requestAnimationFrame with the single long-lived frame callback
    struct RafScheduler {
        window: web_sys::Window,
        callback: FrameCallback,
    }

    impl FrameScheduler for RafScheduler {
        fn request(&mut self) -> FrameHandle {
            let id = self
                .callback
                .borrow()
                .as_ref()
                .and_then(|cb| {
                    self.window
                        .request_animation_frame(cb.as_ref().unchecked_ref())
                        .ok()
                })
                .unwrap_or_default();
            FrameHandle(id)
        }

        fn cancel(&mut self, handle: FrameHandle) {
            let _ = self.window.cancel_animation_frame(handle.0);
        }
    }

    struct Host {
        game: Game,
        scheduler: RafScheduler,
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Storm Flap starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);
        let viewport_width = (width as f32 * PLAY_HEIGHT / height.max(1) as f32).max(320.0);

        let seed = js_sys::Date::now() as u64;
        let storage = BrowserStorage;
        let (settings, scores) = storage.load();
        let renderer = CanvasRenderer::new(canvas.clone())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let game = FrameLoop::new(
            GameState::with_viewport(seed, viewport_width),
            settings,
            scores,
            WebAudio::new(),
            renderer,
            storage,
        );
        log::info!("Game initialized with seed: {}", seed);

        let callback: FrameCallback = Rc::new(RefCell::new(None));
        let host = Rc::new(RefCell::new(Host {
            game,
            scheduler: RafScheduler {
                window: window.clone(),
                callback: callback.clone(),
            },
        }));
        {
            let host = host.clone();
            *callback.borrow_mut() = Some(Closure::new(move |time: f64| {
                let mut host = host.borrow_mut();
                let Host { game, scheduler } = &mut *host;
                game.frame(time);
                game.schedule(scheduler);
            }));
        }

        load_sprites(host.clone())?;
        setup_input_handlers(&canvas, host.clone())?;
        setup_auto_pause(host.clone())?;

        // Start game loop
        {
            let mut guard = host.borrow_mut();
            let Host { game, scheduler } = &mut *guard;
            game.schedule(scheduler);
        }

        log::info!("Storm Flap running!");
        Ok(())
    }

    /// Start loading every sprite; each one becomes drawable when its image arrives
    fn load_sprites(host: Rc<RefCell<Host>>) -> Result<(), JsValue> {
        for id in SpriteId::manifest() {
            let image = HtmlImageElement::new()?;
            let source = format!("{}{}", ASSET_ROOT, id.path());
            {
                let host = host.clone();
                let loaded = image.clone();
                let source = source.clone();
                let onload = Closure::<dyn FnMut()>::new(move || {
                    let mut host = host.borrow_mut();
                    let sprite = Sprite {
                        source: source.clone(),
                        width: loaded.natural_width(),
                        height: loaded.natural_height(),
                    };
                    host.game.assets.insert(id, sprite);
                    host.game.renderer_mut().register_image(id, loaded.clone());
                });
                image.set_onload(Some(onload.as_ref().unchecked_ref()));
                onload.forget();
            }
            {
                let source = source.clone();
                let onerror = Closure::<dyn FnMut()>::new(move || {
                    log::warn!("Sprite failed to load: {}", source);
                });
                image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
                onerror.forget();
            }
            image.set_src(&source);
        }
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, host: Rc<RefCell<Host>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;

        // Keyboard
        {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let input = match event.key().as_str() {
                    " " | "Enter" => Some(InputEvent::Primary),
                    "Escape" | "p" | "P" => Some(InputEvent::Pause),
                    "ArrowUp" | "w" | "W" => Some(InputEvent::Up),
                    "ArrowDown" | "s" | "S" => Some(InputEvent::Down),
                    "m" | "M" => Some(InputEvent::ToggleMute),
                    "d" | "D" => {
                        let mut host = host.borrow_mut();
                        host.game.autopilot = !host.game.autopilot;
                        log::info!("Autopilot: {}", host.game.autopilot);
                        None
                    }
                    _ => return,
                };
                // Keep space and arrows from scrolling the page
                event.prevent_default();
                if let Some(input) = input {
                    host.borrow_mut().game.push_input(input);
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Tap / click
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
                event.prevent_default();
                host.borrow_mut().game.push_input(InputEvent::Primary);
            });
            canvas.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn setup_auto_pause(host: Rc<RefCell<Host>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        // Visibility change (tab switch, minimize)
        {
            let host = host.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.hidden() {
                    host.borrow_mut().game.suspend();
                }
            });
            document.add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Window blur (click outside)
        {
            let host = host.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                host.borrow_mut().game.suspend();
            });
            window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Page teardown: drop the pending frame
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut guard = host.borrow_mut();
                let Host { game, scheduler } = &mut *guard;
                game.shutdown(scheduler);
            });
            window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use clap::Parser;
    use storm_flap::audio::LogAudio;
    use storm_flap::platform::{
        Clock, FileStorage, FrameLoop, ManualClock, MemoryStorage, Storage, SystemClock,
    };
    use storm_flap::renderer::HeadlessRenderer;
    use storm_flap::sim::{GamePhase, GameState, InputEvent};
    use storm_flap::{HighScores, Settings};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Log a status line this often
    const REPORT_EVERY: u64 = 600;

    /// Headless autopilot demo of Storm Flap
    #[derive(Parser, Debug)]
    #[command(version, about)]
    pub struct Options {
        /// Seed for the session RNG
        #[arg(long, value_name = "N", default_value_t = 0x5702_f1a9)]
        pub seed: u64,
        /// Number of frames to simulate
        #[arg(long, value_name = "N", default_value_t = 3_600)]
        pub frames: u64,
        /// Directory for settings.json / highscores.json
        #[arg(long = "data", value_name = "DIR")]
        pub data_dir: Option<PathBuf>,
        /// Pace frames to the wall clock instead of running flat out
        #[arg(long)]
        pub realtime: bool,
    }

    pub fn run(options: Options) -> Result<(), storm_flap::StorageError> {
        match &options.data_dir {
            Some(dir) => {
                let storage = FileStorage::new(dir)?;
                let (settings, scores) = storage.load();
                play(&options, settings, scores, storage);
            }
            None => play(&options, Settings::default(), HighScores::new(), MemoryStorage::default()),
        }
        Ok(())
    }

    fn play<S: Storage>(options: &Options, settings: Settings, scores: HighScores, storage: S) {
        let mut game = FrameLoop::new(
            GameState::new(options.seed),
            settings,
            scores,
            LogAudio::default(),
            HeadlessRenderer::default(),
            storage,
        );
        game.autopilot = true;
        log::info!("Headless demo: seed {}, {} frames", options.seed, options.frames);

        let manual = ManualClock::new(0.0);
        let system = SystemClock::new();
        let clock: &dyn Clock = if options.realtime { &system } else { &manual };

        // Title -> menu -> playing
        game.push_input(InputEvent::Primary);
        game.push_input(InputEvent::Primary);

        let mut runs = 0u32;
        let mut best = 0u64;
        for _ in 0..options.frames {
            let frame_start = clock.now();
            game.frame(frame_start);

            if game.state.phase == GamePhase::GameOver {
                runs += 1;
                best = best.max(game.state.score());
                log::info!("Run {} ended with score {}", runs, game.state.score());
                game.push_input(InputEvent::Primary);
            }
            if game.frames().is_multiple_of(REPORT_EVERY) {
                let session = &game.state.session;
                log::info!(
                    "frame {}: score {}, level {}, {} obstacles, hazard {:?}",
                    game.frames(),
                    session.score.score,
                    session.score.level,
                    session.world.obstacles.len(),
                    session.hazards.current
                );
            }

            if options.realtime {
                let spent = clock.now() - frame_start;
                if spent < FRAME_MS {
                    std::thread::sleep(std::time::Duration::from_secs_f64((FRAME_MS - spent) / 1000.0));
                }
            } else {
                manual.advance(FRAME_MS);
            }
        }

        best = best.max(game.state.score());
        let renderer = game.renderer();
        log::info!(
            "Done: {} frames drawn (peak {} commands), {} finished runs, best {}, {} render faults",
            renderer.frames,
            renderer.peak_cmds,
            runs,
            best,
            game.faults()
        );
        log::info!("Leaderboard: {:?}", game.scores.entries);
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_options_defaults() {
            let options = Options::try_parse_from(["storm-flap"]).expect("defaults");
            assert_eq!(options.frames, 3_600);
            assert!(options.data_dir.is_none());
            assert!(!options.realtime);
        }

        #[test]
        fn test_options_flags() {
            let options = Options::try_parse_from([
                "storm-flap",
                "--seed",
                "7",
                "--frames",
                "120",
                "--data",
                "saves",
                "--realtime",
            ])
            .expect("flags");
            assert_eq!(options.seed, 7);
            assert_eq!(options.frames, 120);
            assert_eq!(options.data_dir, Some(PathBuf::from("saves")));
            assert!(options.realtime);
        }

        #[test]
        fn test_options_reject_bad_values() {
            assert!(Options::try_parse_from(["storm-flap", "--frames", "many"]).is_err());
            assert!(Options::try_parse_from(["storm-flap", "--bogus"]).is_err());
        }

        #[test]
        fn test_short_demo_runs() {
            let options = Options::try_parse_from(["storm-flap", "--frames", "90"]).expect("flags");
            assert!(run(options).is_ok());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Storm Flap (native) starting...");

    let options = headless::Options::parse();
    if let Err(e) = headless::run(options) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
