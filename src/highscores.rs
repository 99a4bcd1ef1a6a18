//! High score leaderboard
//!
//! Top 10 scores, sorted descending. Ties keep insertion order (the older
//! entry ranks first). Persisted to LocalStorage on the web and to a JSON
//! file natively.

use serde::{Deserialize, Serialize};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// The persistence boundary: hand over a final score, get the updated list back
pub trait ScoreStore {
    fn submit(&mut self, score: u64) -> Vec<u64>;
}

/// High score leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<u64>,
}

impl HighScores {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "storm_flap_highscores";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|&e| score > e).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|&e| score > e);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a new score to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        // Insert after every entry that is >= score
        let pos = self.entries.iter().position(|&e| score > e);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, score);
                i + 1
            }
            None => {
                self.entries.push(score);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().copied()
    }

    /// Rebuild from an arbitrary list (stored data may be unsorted or oversized)
    pub fn from_scores(scores: impl IntoIterator<Item = u64>) -> Self {
        let mut table = Self::new();
        for score in scores {
            table.add_score(score);
        }
        table
    }

    /// Load high scores from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(scores) = serde_json::from_str::<HighScores>(&json) {
                    log::info!("Loaded {} high scores", scores.entries.len());
                    return Self::from_scores(scores.entries);
                }
            }
        }

        log::info!("No high scores found, starting fresh");
        Self::new()
    }

    /// Save high scores to LocalStorage (WASM only)
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
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }

    /// Load high scores from a JSON file; a missing file yields an empty table
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Result<Self, crate::StorageError> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };
        let stored: HighScores = serde_json::from_str(&json)?;
        Ok(Self::from_scores(stored.entries))
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), crate::StorageError> {
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }
}

impl ScoreStore for HighScores {
    fn submit(&mut self, score: u64) -> Vec<u64> {
        if let Some(rank) = self.add_score(score) {
            log::info!("High score #{}: {}", rank, score);
        }
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_submit_keeps_ties_in_insertion_order() {
        let mut table = HighScores::from_scores([50, 80, 30]);
        assert_eq!(table.entries, vec![80, 50, 30]);
        assert_eq!(table.submit(80), vec![80, 80, 50, 30]);
    }

    #[test]
    fn test_capped_at_ten() {
        let mut table = HighScores::from_scores(1..=10);
        assert!(!table.qualifies(1));
        assert_eq!(table.potential_rank(5), Some(7));
        assert_eq!(table.add_score(11), Some(1));
        assert_eq!(table.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(table.entries.last(), Some(&2));
        assert_eq!(table.top_score(), Some(11));
    }

    #[test]
    fn test_zero_never_qualifies() {
        let mut table = HighScores::new();
        assert_eq!(table.add_score(0), None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("storm_flap_scores_{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("scores.json");
        assert!(HighScores::load_from(&path).expect("load").is_empty());
        let table = HighScores::from_scores([3, 9, 4]);
        table.save_to(&path).expect("save");
        assert_eq!(HighScores::load_from(&path).expect("load"), table);
        let _ = std::fs::remove_dir_all(&dir);
    }

    proptest! {
        #[test]
        fn prop_sorted_descending_and_capped(scores in proptest::collection::vec(1u64..500, 0..40)) {
            let table = HighScores::from_scores(scores.iter().copied());
            prop_assert!(table.entries.len() <= MAX_HIGH_SCORES);
            prop_assert!(table.entries.windows(2).all(|w| w[0] >= w[1]));
            let mut expected = scores.clone();
            expected.sort_unstable_by(|a, b| b.cmp(a));
            expected.truncate(MAX_HIGH_SCORES);
            prop_assert_eq!(table.entries, expected);
        }
    }
}
