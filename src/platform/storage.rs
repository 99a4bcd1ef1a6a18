//! Persistence backends for settings and the leaderboard

use crate::StorageError;
use crate::highscores::HighScores;
use crate::settings::Settings;

/// Where settings and high scores are written after they change
pub trait Storage {
    fn save_settings(&mut self, settings: &Settings) -> Result<(), StorageError>;
    fn save_scores(&mut self, scores: &HighScores) -> Result<(), StorageError>;
}

/// Keeps the last saved values in memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    pub settings: Option<Settings>,
    pub scores: Option<HighScores>,
    pub writes: u32,
}

impl Storage for MemoryStorage {
    fn save_settings(&mut self, settings: &Settings) -> Result<(), StorageError> {
        self.settings = Some(settings.clone());
        self.writes += 1;
        Ok(())
    }

    fn save_scores(&mut self, scores: &HighScores) -> Result<(), StorageError> {
        self.scores = Some(scores.clone());
        self.writes += 1;
        Ok(())
    }
}

/// JSON files in a directory
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStorage {
    const SETTINGS_FILE: &'static str = "settings.json";
    const SCORES_FILE: &'static str = "highscores.json";

    pub fn new(dir: impl Into<std::path::PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Load both files. Unreadable data is logged and replaced by defaults.
    pub fn load(&self) -> (Settings, HighScores) {
        let settings = Settings::load_from(&self.dir.join(Self::SETTINGS_FILE)).unwrap_or_else(|e| {
            log::warn!("Failed to load settings: {}", e);
            Settings::default()
        });
        let scores = HighScores::load_from(&self.dir.join(Self::SCORES_FILE)).unwrap_or_else(|e| {
            log::warn!("Failed to load high scores: {}", e);
            HighScores::new()
        });
        log::info!(
            "Loaded settings and {} high scores from {}",
            scores.entries.len(),
            self.dir.display()
        );
        (settings, scores)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Storage for FileStorage {
    fn save_settings(&mut self, settings: &Settings) -> Result<(), StorageError> {
        settings.save_to(&self.dir.join(Self::SETTINGS_FILE))
    }

    fn save_scores(&mut self, scores: &HighScores) -> Result<(), StorageError> {
        scores.save_to(&self.dir.join(Self::SCORES_FILE))
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct BrowserStorage;

#[cfg(target_arch = "wasm32")]
impl BrowserStorage {
    pub fn load(&self) -> (Settings, HighScores) {
        (Settings::load(), HighScores::load())
    }
}

#[cfg(target_arch = "wasm32")]
impl Storage for BrowserStorage {
    fn save_settings(&mut self, settings: &Settings) -> Result<(), StorageError> {
        settings.save()
    }

    fn save_scores(&mut self, scores: &HighScores) -> Result<(), StorageError> {
        scores.save()
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = std::env::temp_dir().join(format!("storm_flap_storage_{}", std::process::id()));
        let mut storage = FileStorage::new(&dir).expect("storage dir");
        let (settings, scores) = storage.load();
        assert_eq!(settings, Settings::default());
        assert!(scores.is_empty());

        let mut settings = Settings::default();
        settings.rain = false;
        storage.save_settings(&settings).expect("save settings");
        storage
            .save_scores(&HighScores::from_scores([12, 40]))
            .expect("save scores");

        let (loaded_settings, loaded_scores) = storage.load();
        assert!(!loaded_settings.rain);
        assert_eq!(loaded_scores.entries, vec![40, 12]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_corrupt_scores_fall_back() {
        let dir = std::env::temp_dir().join(format!("storm_flap_corrupt_{}", std::process::id()));
        let storage = FileStorage::new(&dir).expect("storage dir");
        std::fs::write(dir.join("highscores.json"), "not json").expect("write");
        let (_, scores) = storage.load();
        assert!(scores.is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }
}
