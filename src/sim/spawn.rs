//! Spawn scheduling for obstacles and pickups
//!
//! Cadence is frame-counted (`TickCounter`), never wall-clock.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entities::{Obstacle, Pickup, PickupKind};
use super::timer::TickCounter;
use crate::consts::*;

/// Per-type pickup spawn rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickupRule {
    /// Minimum frames between spawns of this type
    pub min_frames: u64,
    /// Chance per eligible frame
    pub chance: f64,
    /// Vertical offset from the anchor gap center, as a fraction of gap size
    pub gap_offset: f32,
}

impl PickupKind {
    pub fn rule(&self) -> PickupRule {
        match self {
            PickupKind::PowerPill => PickupRule {
                min_frames: 420,
                chance: 0.012,
                gap_offset: 0.0,
            },
            PickupKind::DebuffPill => PickupRule {
                min_frames: 540,
                chance: 0.010,
                gap_offset: -0.2,
            },
            // ~60 s at 60 fps: materially stronger, so much rarer
            PickupKind::MegaPoster => PickupRule {
                min_frames: 3_600,
                chance: 0.008,
                gap_offset: 0.2,
            },
        }
    }
}

/// Which pickup types may currently spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickupGates {
    pub power: bool,
    pub debuff: bool,
    pub mega: bool,
}

impl PickupGates {
    pub const ALL_OPEN: PickupGates = PickupGates {
        power: true,
        debuff: true,
        mega: true,
    };

    pub const ALL_CLOSED: PickupGates = PickupGates {
        power: false,
        debuff: false,
        mega: false,
    };

    pub fn allows(&self, kind: PickupKind) -> bool {
        match kind {
            PickupKind::PowerPill => self.power,
            PickupKind::DebuffPill => self.debuff,
            PickupKind::MegaPoster => self.mega,
        }
    }
}

/// Frame counters for every spawnable entity type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnScheduler {
    obstacles: TickCounter,
    power: TickCounter,
    debuff: TickCounter,
    mega: TickCounter,
}

/// Highest legal gap top for a gap of `gap_size`
pub fn max_gap_top(gap_size: f32) -> f32 {
    PLAY_HEIGHT - GROUND_HEIGHT - GAP_MIN_MARGIN - gap_size
}

/// Random gap top within `[GAP_MIN_MARGIN, max_gap_top]`
pub fn random_gap_top(rng: &mut impl Rng, gap_size: f32) -> f32 {
    let max = max_gap_top(gap_size);
    if max <= GAP_MIN_MARGIN {
        return GAP_MIN_MARGIN;
    }
    rng.random_range(GAP_MIN_MARGIN..=max)
}

impl SpawnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter_mut(&mut self, kind: PickupKind) -> &mut TickCounter {
        match kind {
            PickupKind::PowerPill => &mut self.power,
            PickupKind::DebuffPill => &mut self.debuff,
            PickupKind::MegaPoster => &mut self.mega,
        }
    }

    /// Spawn an obstacle off the right edge when the cadence says so, then count the frame
    pub fn spawn_obstacle(
        &mut self,
        rng: &mut impl Rng,
        viewport_width: f32,
        obstacles: &mut Vec<Obstacle>,
    ) -> bool {
        let due = self.obstacles.every(OBSTACLE_SPAWN_FRAMES);
        self.obstacles.advance();
        if !due {
            return false;
        }
        let gap_top = random_gap_top(rng, GAP_SIZE);
        let variant = rng.random_range(0..OBSTACLE_VARIANTS);
        obstacles.push(Obstacle::new(viewport_width, gap_top, GAP_SIZE, variant));
        log::debug!("Obstacle spawned: gap_top={:.0}", gap_top);
        true
    }

    /// Roll each pickup type. Returns the kinds spawned this frame.
    pub fn spawn_pickups(
        &mut self,
        rng: &mut impl Rng,
        gates: PickupGates,
        obstacles: &[Obstacle],
        pickups: &mut Vec<Pickup>,
    ) -> Vec<PickupKind> {
        let mut spawned = Vec::new();
        for kind in PickupKind::ALL {
            let counter = self.counter_mut(kind);
            counter.advance();
            if !gates.allows(kind) || !counter.reached(kind.rule().min_frames) {
                continue;
            }
            // Only one live instance per type
            if pickups.iter().any(|p| p.kind == kind) {
                continue;
            }
            // Needs a gap to sit in; skip the frame otherwise
            let Some(anchor) = newest_obstacle(obstacles) else {
                continue;
            };
            if !rng.random_bool(kind.rule().chance) {
                continue;
            }
            pickups.push(place_pickup(kind, anchor));
            self.counter_mut(kind).reset();
            log::debug!("Pickup spawned: {}", kind.as_str());
            spawned.push(kind);
        }
        spawned
    }
}

/// The rightmost (most recently spawned) obstacle
pub fn newest_obstacle(obstacles: &[Obstacle]) -> Option<&Obstacle> {
    obstacles
        .iter()
        .filter(|o| !o.destroyed)
        .max_by(|a, b| a.x.total_cmp(&b.x))
}

/// Place a pickup inside the anchor obstacle's gap
pub fn place_pickup(kind: PickupKind, anchor: &Obstacle) -> Pickup {
    let offset = kind.rule().gap_offset * anchor.gap_size;
    Pickup {
        kind,
        pos: Vec2::new(
            anchor.x + OBSTACLE_WIDTH / 2.0,
            anchor.gap_center() + offset,
        ),
        rotation: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_obstacle_cadence() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut scheduler = SpawnScheduler::new();
        let mut obstacles = Vec::new();
        for _ in 0..(OBSTACLE_SPAWN_FRAMES * 3) {
            scheduler.spawn_obstacle(&mut rng, PLAY_WIDTH, &mut obstacles);
        }
        assert_eq!(obstacles.len(), 3);
        assert!(obstacles.iter().all(|o| o.x == PLAY_WIDTH));
    }

    #[test]
    fn test_pickups_need_an_obstacle() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut scheduler = SpawnScheduler::new();
        let mut pickups = Vec::new();
        for _ in 0..20_000 {
            scheduler.spawn_pickups(&mut rng, PickupGates::ALL_OPEN, &[], &mut pickups);
        }
        assert!(pickups.is_empty());
    }

    #[test]
    fn test_one_pickup_per_type() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut scheduler = SpawnScheduler::new();
        let obstacles = vec![Obstacle::new(300.0, 200.0, GAP_SIZE, 0)];
        let mut pickups = Vec::new();
        for _ in 0..20_000 {
            scheduler.spawn_pickups(&mut rng, PickupGates::ALL_OPEN, &obstacles, &mut pickups);
        }
        for kind in PickupKind::ALL {
            assert_eq!(pickups.iter().filter(|p| p.kind == kind).count(), 1);
        }
    }

    #[test]
    fn test_closed_gate_suppresses_type() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut scheduler = SpawnScheduler::new();
        let obstacles = vec![Obstacle::new(300.0, 200.0, GAP_SIZE, 0)];
        let mut pickups = Vec::new();
        let gates = PickupGates {
            debuff: false,
            ..PickupGates::ALL_OPEN
        };
        for _ in 0..20_000 {
            scheduler.spawn_pickups(&mut rng, gates, &obstacles, &mut pickups);
        }
        assert!(pickups.iter().all(|p| p.kind != PickupKind::DebuffPill));
    }

    #[test]
    fn test_pickup_sits_inside_gap() {
        let anchor = Obstacle::new(300.0, 200.0, GAP_SIZE, 0);
        for kind in PickupKind::ALL {
            let pickup = place_pickup(kind, &anchor);
            let bounds = pickup.bounds();
            assert!(bounds.y >= anchor.gap_top);
            assert!(bounds.bottom() <= anchor.gap_bottom());
        }
    }

    proptest! {
        #[test]
        fn prop_gap_within_bounds(seed in any::<u64>()) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let gap_top = random_gap_top(&mut rng, GAP_SIZE);
            prop_assert!(gap_top >= GAP_MIN_MARGIN);
            prop_assert!(gap_top + GAP_SIZE <= PLAY_HEIGHT - GAP_MIN_MARGIN - GROUND_HEIGHT);
        }
    }
}
