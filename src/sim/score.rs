//! Scoring and level progression

use serde::{Deserialize, Serialize};

use super::entities::Obstacle;
use crate::consts::*;

/// Music tracks, played in sequence within a level
pub const TRACKS_PER_LEVEL: usize = 2;

/// Level changes detected during a scoring pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreChanges {
    /// Points awarded this frame
    pub gained: u64,
    /// New skin level, if one was crossed
    pub level_up: Option<u32>,
    /// Music track to switch to, if the tracker forced a change
    pub track: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreTracker {
    pub score: u64,
    /// Number of level thresholds crossed (selects the background skin set)
    pub level: u32,
    /// Index of the music track currently playing
    pub track: usize,
}

/// Skin level for a score
pub fn level_for(score: u64) -> u32 {
    LEVEL_THRESHOLDS.iter().filter(|&&t| score >= t).count() as u32
}

/// First track of a level's sequence
pub fn first_track_of(level: u32) -> usize {
    level as usize * TRACKS_PER_LEVEL
}

impl ScoreTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Award a point for every obstacle whose trailing edge has crossed `avatar_x`.
    /// Each obstacle scores once, whether or not it was destroyed.
    pub fn score_passed(&mut self, obstacles: &mut [Obstacle], avatar_x: f32) -> ScoreChanges {
        let mut changes = ScoreChanges::default();
        for obstacle in obstacles.iter_mut() {
            if !obstacle.passed && obstacle.right() < avatar_x {
                obstacle.passed = true;
                self.score += 1;
                changes.gained += 1;
            }
        }

        let level = level_for(self.score);
        if level > self.level {
            // Only the first boundary forces the music; later ones wait for the track to end
            if self.level == 0 {
                self.track = first_track_of(level);
                changes.track = Some(self.track);
            }
            self.level = level;
            changes.level_up = Some(level);
            log::info!("Level {} reached at score {}", level + 1, self.score);
        }
        changes
    }

    /// The audio collaborator reported the current track ended: advance within
    /// the current level's sequence (switching into it if behind).
    pub fn track_ended(&mut self) -> usize {
        let first = first_track_of(self.level);
        self.track = if self.track < first || self.track + 1 >= first + TRACKS_PER_LEVEL {
            first
        } else {
            self.track + 1
        };
        self.track
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passed_obstacle() -> Obstacle {
        Obstacle::new(10.0, 200.0, GAP_SIZE, 0)
    }

    #[test]
    fn test_score_once_per_obstacle() {
        let mut tracker = ScoreTracker::new();
        let mut obstacles = vec![passed_obstacle(), Obstacle::new(300.0, 200.0, GAP_SIZE, 0)];
        let changes = tracker.score_passed(&mut obstacles, 100.0);
        assert_eq!(changes.gained, 1);
        assert_eq!(tracker.score_passed(&mut obstacles, 100.0).gained, 0);
        assert_eq!(tracker.score, 1);
    }

    #[test]
    fn test_destroyed_obstacle_still_scores() {
        let mut tracker = ScoreTracker::new();
        let mut obstacle = passed_obstacle();
        obstacle.destroyed = true;
        let mut obstacles = vec![obstacle];
        assert_eq!(tracker.score_passed(&mut obstacles, 100.0).gained, 1);
    }

    #[test]
    fn test_first_level_forces_track() {
        let mut tracker = ScoreTracker {
            score: LEVEL_TWO_SCORE - 1,
            ..Default::default()
        };
        let mut obstacles = vec![passed_obstacle()];
        let changes = tracker.score_passed(&mut obstacles, 100.0);
        assert_eq!(changes.level_up, Some(1));
        assert_eq!(changes.track, Some(TRACKS_PER_LEVEL));
    }

    #[test]
    fn test_later_levels_wait_for_track_end() {
        let mut tracker = ScoreTracker {
            score: 299,
            level: 1,
            track: first_track_of(1),
        };
        let mut obstacles = vec![passed_obstacle()];
        let changes = tracker.score_passed(&mut obstacles, 100.0);
        assert_eq!(changes.level_up, Some(2));
        assert_eq!(changes.track, None);
        assert_eq!(tracker.track_ended(), first_track_of(2));
    }

    #[test]
    fn test_track_cycles_within_level() {
        let mut tracker = ScoreTracker::new();
        assert_eq!(tracker.track_ended(), 1);
        assert_eq!(tracker.track_ended(), 0);
    }

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0), 0);
        assert_eq!(level_for(149), 0);
        assert_eq!(level_for(150), 1);
        assert_eq!(level_for(300), 2);
    }
}
