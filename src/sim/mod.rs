//! Deterministic simulation module
//!
//! All gameplay logic lives here:
//! - One tick per rendered frame, fixed stage order
//! - Seeded RNG only
//! - Wall-clock time is passed in, never read
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod avatar;
pub mod collision;
pub mod entities;
pub mod hazard;
pub mod narrative;
pub mod phase;
pub mod score;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod timer;

pub use avatar::{Avatar, Boost, Modifiers};
pub use entities::{Obstacle, ParticleKind, Pickup, PickupKind, Projectile, Raindrop};
pub use hazard::Hazard;
pub use narrative::BossPhase;
pub use phase::{GamePhase, InputEvent, MainItem, MenuScreen, SettingKey};
pub use state::{GameEvent, GameState, Session, World};
pub use tick::{TickInput, tick};
pub use timer::{Deadline, Millis, Stopwatch, TickCounter};
