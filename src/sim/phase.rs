//! Game phases and menu navigation
//!
//! `Start` carries its sub-screen and selection so invalid combinations
//! (an options cursor on the main screen, say) cannot be represented.

use serde::{Deserialize, Serialize};

/// Discrete input events, sampled between frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Jump while playing, select in menus
    Primary,
    /// Pause / resume while playing, back in menus
    Pause,
    /// Host lost focus: pause if playing, never resume
    Suspend,
    Up,
    Down,
    ToggleMute,
}

/// Main menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MainItem {
    #[default]
    Play,
    Options,
}

impl MainItem {
    pub const ALL: [MainItem; 2] = [MainItem::Play, MainItem::Options];
}

/// A toggleable setting listed on the options screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettingKey {
    PowerPills,
    DebuffPills,
    MegaPosters,
    Rain,
    Sandstorm,
    PickupsInSandstorm,
    Taunts,
    Invulnerable,
    Quality,
}

impl SettingKey {
    pub const ALL: [SettingKey; 9] = [
        SettingKey::PowerPills,
        SettingKey::DebuffPills,
        SettingKey::MegaPosters,
        SettingKey::Rain,
        SettingKey::Sandstorm,
        SettingKey::PickupsInSandstorm,
        SettingKey::Taunts,
        SettingKey::Invulnerable,
        SettingKey::Quality,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SettingKey::PowerPills => "Power pills",
            SettingKey::DebuffPills => "Debuff pills",
            SettingKey::MegaPosters => "Mega posters",
            SettingKey::Rain => "Acid rain",
            SettingKey::Sandstorm => "Sandstorms",
            SettingKey::PickupsInSandstorm => "Pickups in storms",
            SettingKey::Taunts => "Taunts",
            SettingKey::Invulnerable => "Invulnerable",
            SettingKey::Quality => "Detail level",
        }
    }
}

/// Sub-screen of the start menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuScreen {
    Main { selected: MainItem },
    /// Index into `SettingKey::ALL`
    Options { selected: usize },
}

impl Default for MenuScreen {
    fn default() -> Self {
        MenuScreen::Main {
            selected: MainItem::Play,
        }
    }
}

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Attract mode
    #[default]
    Title,
    Start(MenuScreen),
    Playing,
    Paused,
    GameOver,
}

/// What a phase transition asks the session to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseAction {
    None,
    /// Begin a fresh session (enter Playing with full reset)
    StartSession,
    Jump,
    Pause,
    Resume,
    ToggleSetting(SettingKey),
}

fn cycle(index: usize, len: usize, forward: bool) -> usize {
    if forward {
        (index + 1) % len
    } else {
        (index + len - 1) % len
    }
}

impl GamePhase {
    pub fn is_playing(&self) -> bool {
        matches!(self, GamePhase::Playing)
    }

    /// Apply a menu/phase input. Returns the new phase and what the session must do.
    /// `ToggleMute` is phase-independent and handled by the caller.
    pub fn handle(self, event: InputEvent) -> (GamePhase, PhaseAction) {
        use InputEvent::*;
        match (self, event) {
            (GamePhase::Title, Primary) => (GamePhase::Start(MenuScreen::default()), PhaseAction::None),

            (GamePhase::Start(MenuScreen::Main { selected }), Up | Down) => {
                let idx = MainItem::ALL.iter().position(|&i| i == selected).unwrap_or(0);
                let next = MainItem::ALL[cycle(idx, MainItem::ALL.len(), event == Down)];
                (GamePhase::Start(MenuScreen::Main { selected: next }), PhaseAction::None)
            }
            (GamePhase::Start(MenuScreen::Main { selected: MainItem::Play }), Primary) => {
                (GamePhase::Playing, PhaseAction::StartSession)
            }
            (GamePhase::Start(MenuScreen::Main { selected: MainItem::Options }), Primary) => {
                (GamePhase::Start(MenuScreen::Options { selected: 0 }), PhaseAction::None)
            }
            (GamePhase::Start(MenuScreen::Main { .. }), Pause) => (GamePhase::Title, PhaseAction::None),

            (GamePhase::Start(MenuScreen::Options { selected }), Up | Down) => {
                let next = cycle(selected, SettingKey::ALL.len(), event == Down);
                (GamePhase::Start(MenuScreen::Options { selected: next }), PhaseAction::None)
            }
            (GamePhase::Start(MenuScreen::Options { selected }), Primary) => {
                let action = SettingKey::ALL
                    .get(selected)
                    .map_or(PhaseAction::None, |&key| PhaseAction::ToggleSetting(key));
                (self, action)
            }
            (GamePhase::Start(MenuScreen::Options { .. }), Pause) => (
                GamePhase::Start(MenuScreen::Main {
                    selected: MainItem::Options,
                }),
                PhaseAction::None,
            ),

            (GamePhase::Playing, Primary) => (GamePhase::Playing, PhaseAction::Jump),
            (GamePhase::Playing, Pause | Suspend) => (GamePhase::Paused, PhaseAction::Pause),
            (GamePhase::Paused, Pause | Primary) => (GamePhase::Playing, PhaseAction::Resume),

            (GamePhase::GameOver, Primary) => (GamePhase::Playing, PhaseAction::StartSession),
            (GamePhase::GameOver, Pause) => (GamePhase::Start(MenuScreen::default()), PhaseAction::None),

            _ => (self, PhaseAction::None),
        }
    }
}
