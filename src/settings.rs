//! Game settings and preferences
//!
//! Read by the simulation every frame. Every field has a serde default so a
//! stored blob missing a toggle loads with that toggle enabled.

use serde::{Deserialize, Serialize};

use crate::consts::{RAIN_DENSITY, SAND_DENSITY};
use crate::sim::SettingKey;

/// Visual detail presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Next preset in the options-menu cycle
    pub fn next(&self) -> Self {
        match self {
            QualityPreset::Low => QualityPreset::Medium,
            QualityPreset::Medium => QualityPreset::High,
            QualityPreset::High => QualityPreset::Low,
        }
    }

    /// Maximum live particles across all classes
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 80,
            QualityPreset::Medium => 300,
            QualityPreset::High => 900,
        }
    }

    /// Multiplier on weather particle density
    pub fn weather_scale(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.5,
            QualityPreset::Medium => 1.0,
            QualityPreset::High => 1.5,
        }
    }

    pub fn rain_density(&self) -> f32 {
        RAIN_DENSITY * self.weather_scale()
    }

    pub fn sand_density(&self) -> f32 {
        SAND_DENSITY * self.weather_scale()
    }
}

fn enabled() -> bool {
    true
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // === Pickups ===
    #[serde(default = "enabled")]
    pub power_pills: bool,
    #[serde(default = "enabled")]
    pub debuff_pills: bool,
    #[serde(default = "enabled")]
    pub mega_posters: bool,
    /// Whether pickups keep spawning while a sandstorm blows
    #[serde(default = "enabled")]
    pub pickups_in_sandstorm: bool,

    // === Hazards ===
    #[serde(default = "enabled")]
    pub rain: bool,
    #[serde(default = "enabled")]
    pub sandstorm: bool,

    // === Narrative ===
    #[serde(default = "enabled")]
    pub taunts: bool,

    // === Cheats ===
    /// Boundary and obstacle contact never ends the run
    #[serde(default)]
    pub invulnerable: bool,

    // === Presentation ===
    #[serde(default)]
    pub quality: QualityPreset,
    #[serde(default)]
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            power_pills: true,
            debuff_pills: true,
            mega_posters: true,
            pickups_in_sandstorm: true,
            rain: true,
            sandstorm: true,
            taunts: true,
            invulnerable: false,
            quality: QualityPreset::Medium,
            muted: false,
        }
    }
}

impl Settings {
    /// Apply an options-menu toggle
    pub fn toggle(&mut self, key: SettingKey) {
        match key {
            SettingKey::PowerPills => self.power_pills = !self.power_pills,
            SettingKey::DebuffPills => self.debuff_pills = !self.debuff_pills,
            SettingKey::MegaPosters => self.mega_posters = !self.mega_posters,
            SettingKey::Rain => self.rain = !self.rain,
            SettingKey::Sandstorm => self.sandstorm = !self.sandstorm,
            SettingKey::PickupsInSandstorm => self.pickups_in_sandstorm = !self.pickups_in_sandstorm,
            SettingKey::Taunts => self.taunts = !self.taunts,
            SettingKey::Invulnerable => self.invulnerable = !self.invulnerable,
            SettingKey::Quality => self.quality = self.quality.next(),
        }
    }

    /// Display value for an options-menu entry
    pub fn value_label(&self, key: SettingKey) -> &'static str {
        let on_off = |b: bool| if b { "On" } else { "Off" };
        match key {
            SettingKey::PowerPills => on_off(self.power_pills),
            SettingKey::DebuffPills => on_off(self.debuff_pills),
            SettingKey::MegaPosters => on_off(self.mega_posters),
            SettingKey::Rain => on_off(self.rain),
            SettingKey::Sandstorm => on_off(self.sandstorm),
            SettingKey::PickupsInSandstorm => on_off(self.pickups_in_sandstorm),
            SettingKey::Taunts => on_off(self.taunts),
            SettingKey::Invulnerable => on_off(self.invulnerable),
            SettingKey::Quality => self.quality.as_str(),
        }
    }

    /// Effective particle cap
    pub fn max_particles(&self) -> usize {
        self.quality.max_particles()
    }

    /// Parse settings from JSON, falling back to defaults on any error
    pub fn from_json(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|e| {
            log::warn!("Invalid settings ({}), using defaults", e);
            Self::default()
        })
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "storm_flap_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                log::info!("Loaded settings from LocalStorage");
                return Self::from_json(&json);
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<(), crate::StorageError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(crate::StorageError::Unavailable)?;
        let json = serde_json::to_string(self)?;
        storage
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|_| crate::StorageError::Unavailable)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Load settings from a JSON file; a missing file yields defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Result<Self, crate::StorageError> {
        match std::fs::read_to_string(path) {
            Ok(json) => Ok(Self::from_json(&json)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), crate::StorageError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
