//! World entities: obstacles, pickups, projectiles, weather and particles
//!
//! Every collection is a plain growable array. Dead entities are removed with
//! `sweep`, which swap-removes in place, so iteration order is not stable.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::timer::{Deadline, Millis};
use crate::Rect;
use crate::consts::*;

/// Remove every element for which `keep` returns false, using O(1) swap-removal
pub fn sweep<T>(items: &mut Vec<T>, mut keep: impl FnMut(&mut T) -> bool) {
    let mut i = 0;
    while i < items.len() {
        if keep(&mut items[i]) {
            i += 1;
        } else {
            items.swap_remove(i);
        }
    }
}

/// A top/bottom pipe pair with a passable gap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Left edge
    pub x: f32,
    /// Bottom edge of the top segment
    pub gap_top: f32,
    pub gap_size: f32,
    /// Scored (trailing edge has crossed the avatar)
    pub passed: bool,
    /// Shot down: no longer blocks, rendered as debris
    pub destroyed: bool,
    /// Decorative variant
    pub variant: u8,
}

impl Obstacle {
    pub fn new(x: f32, gap_top: f32, gap_size: f32, variant: u8) -> Self {
        Self {
            x,
            gap_top,
            gap_size,
            passed: false,
            destroyed: false,
            variant,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + OBSTACLE_WIDTH
    }

    pub fn gap_bottom(&self) -> f32 {
        self.gap_top + self.gap_size
    }

    pub fn gap_center(&self) -> f32 {
        self.gap_top + self.gap_size / 2.0
    }

    pub fn top_segment(&self) -> Rect {
        Rect::new(self.x, 0.0, OBSTACLE_WIDTH, self.gap_top)
    }

    pub fn bottom_segment(&self) -> Rect {
        let floor = PLAY_HEIGHT - GROUND_HEIGHT;
        Rect::new(self.x, self.gap_bottom(), OBSTACLE_WIDTH, floor - self.gap_bottom())
    }

    /// Overlap with either solid segment (ignores the destroyed flag)
    pub fn segments_overlap(&self, rect: &Rect) -> bool {
        self.top_segment().overlaps(rect) || self.bottom_segment().overlaps(rect)
    }

    /// Overlap with a segment that still blocks
    pub fn blocks(&self, rect: &Rect) -> bool {
        !self.destroyed && self.segments_overlap(rect)
    }

    pub fn is_offscreen(&self) -> bool {
        self.right() < 0.0
    }
}

/// Pickup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    /// Enables projectile firing on jump
    PowerPill,
    /// Grows the avatar and speeds up the world
    DebuffPill,
    /// Size growth, power-shot and auto-fire
    MegaPoster,
}

impl PickupKind {
    pub const ALL: [PickupKind; 3] = [
        PickupKind::PowerPill,
        PickupKind::DebuffPill,
        PickupKind::MegaPoster,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PickupKind::PowerPill => "power pill",
            PickupKind::DebuffPill => "debuff pill",
            PickupKind::MegaPoster => "mega poster",
        }
    }
}

/// A collectible entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    pub kind: PickupKind,
    /// Center
    pub pos: Vec2,
    pub rotation: f32,
}

impl Pickup {
    pub fn bounds(&self) -> Rect {
        Rect::centered(self.pos, PICKUP_SIZE, PICKUP_SIZE)
    }

    pub fn is_offscreen(&self) -> bool {
        self.pos.x + PICKUP_SIZE / 2.0 < 0.0
    }
}

/// A shot fired by the avatar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Center
    pub pos: Vec2,
    /// Vertical drift per tick (mega spread)
    pub drift: f32,
}

impl Projectile {
    pub fn bounds(&self) -> Rect {
        Rect::centered(self.pos, PROJECTILE_WIDTH, PROJECTILE_HEIGHT)
    }

    pub fn advance(&mut self) {
        self.pos.x += PROJECTILE_SPEED;
        self.pos.y += self.drift;
    }

    pub fn is_offscreen(&self, viewport_width: f32) -> bool {
        self.pos.x - PROJECTILE_WIDTH / 2.0 > viewport_width
    }
}

/// A falling raindrop (collides with the avatar, cosmetically)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raindrop {
    /// Head of the streak
    pub pos: Vec2,
    pub vel: Vec2,
}

impl Raindrop {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos.x - 1.0, self.pos.y - RAINDROP_LENGTH, 2.0, RAINDROP_LENGTH)
    }

    pub fn advance(&mut self) {
        self.pos += self.vel;
    }

    pub fn is_gone(&self) -> bool {
        self.pos.y - RAINDROP_LENGTH > PLAY_HEIGHT - GROUND_HEIGHT || self.pos.x < 0.0
    }
}

/// Visual particle classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Explosion,
    Splash,
    Sand,
    Burst,
}

/// Remaining lifetime of a particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Life {
    /// Frame-counted
    Frames { left: u32, total: u32 },
    /// Wall-clock
    Until { born: Millis, deadline: Deadline },
}

impl Life {
    pub fn frames(total: u32) -> Self {
        Life::Frames { left: total, total }
    }

    pub fn millis(now: Millis, duration: Millis) -> Self {
        Life::Until {
            born: now,
            deadline: Deadline::after(now, duration),
        }
    }

    /// Fraction of life remaining (1.0 = fresh, 0.0 = dead)
    pub fn fraction(&self, now: Millis) -> f32 {
        match *self {
            Life::Frames { left, total } => left as f32 / total.max(1) as f32,
            Life::Until { born, deadline } => {
                let span = (deadline.timestamp() - born).max(1.0);
                (deadline.remaining(now) / span) as f32
            }
        }
    }

    fn tick(&mut self) {
        if let Life::Frames { left, .. } = self {
            *left = left.saturating_sub(1);
        }
    }

    pub fn is_dead(&self, now: Millis) -> bool {
        match *self {
            Life::Frames { left, .. } => left == 0,
            Life::Until { deadline, .. } => deadline.expired(now),
        }
    }
}

/// A purely visual particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: Life,
    pub size: f32,
}

impl Particle {
    /// Advance one tick. Returns false once the particle should be removed.
    pub fn update(&mut self, kind: ParticleKind, now: Millis) -> bool {
        self.pos += self.vel;
        match kind {
            ParticleKind::Explosion | ParticleKind::Splash => {
                self.vel.y += PARTICLE_GRAVITY;
            }
            ParticleKind::Burst => {
                self.vel *= 0.94;
                self.size *= 0.98;
            }
            ParticleKind::Sand => {}
        }
        self.life.tick();
        !self.life.is_dead(now)
    }
}

/// All four particle classes, each updated and capped independently
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Particles {
    pub explosion: Vec<Particle>,
    pub splash: Vec<Particle>,
    pub sand: Vec<Particle>,
    pub burst: Vec<Particle>,
}

impl Particles {
    pub fn len(&self) -> usize {
        self.explosion.len() + self.splash.len() + self.sand.len() + self.burst.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn list(&self, kind: ParticleKind) -> &[Particle] {
        match kind {
            ParticleKind::Explosion => &self.explosion,
            ParticleKind::Splash => &self.splash,
            ParticleKind::Sand => &self.sand,
            ParticleKind::Burst => &self.burst,
        }
    }

    fn list_mut(&mut self, kind: ParticleKind) -> &mut Vec<Particle> {
        match kind {
            ParticleKind::Explosion => &mut self.explosion,
            ParticleKind::Splash => &mut self.splash,
            ParticleKind::Sand => &mut self.sand,
            ParticleKind::Burst => &mut self.burst,
        }
    }

    /// Add a particle unless the global budget is spent
    pub fn push(&mut self, kind: ParticleKind, particle: Particle, budget: usize) -> bool {
        if self.len() >= budget {
            return false;
        }
        self.list_mut(kind).push(particle);
        true
    }

    /// Advance every particle and drop the dead ones
    pub fn update(&mut self, now: Millis) {
        for kind in [
            ParticleKind::Explosion,
            ParticleKind::Splash,
            ParticleKind::Sand,
            ParticleKind::Burst,
        ] {
            sweep(self.list_mut(kind), |p| p.update(kind, now));
        }
    }

    /// Radial explosion with upward bias
    pub fn spawn_explosion(&mut self, rng: &mut impl Rng, center: Vec2, budget: usize) {
        for _ in 0..EXPLOSION_PARTICLES {
            let angle = rng.random_range(0.0..std::f32::consts::TAU);
            let speed = rng.random_range(1.5..6.0);
            let particle = Particle {
                pos: center,
                vel: Vec2::new(angle.cos() * speed, angle.sin() * speed - 1.5),
                life: Life::frames(EXPLOSION_LIFE_FRAMES),
                size: rng.random_range(3.0..7.0),
            };
            if !self.push(ParticleKind::Explosion, particle, budget) {
                break;
            }
        }
    }

    /// Small droplets kicked up where a raindrop hit the avatar
    pub fn spawn_splash(&mut self, rng: &mut impl Rng, at: Vec2, budget: usize) {
        for _ in 0..SPLASH_PARTICLES {
            let particle = Particle {
                pos: at,
                vel: Vec2::new(rng.random_range(-2.0..2.0), rng.random_range(-3.0..-1.0)),
                life: Life::frames(SPLASH_LIFE_FRAMES),
                size: 2.0,
            };
            if !self.push(ParticleKind::Splash, particle, budget) {
                break;
            }
        }
    }

    /// Ring burst around a collected pickup
    pub fn spawn_burst(&mut self, rng: &mut impl Rng, center: Vec2, budget: usize) {
        for i in 0..BURST_PARTICLES {
            let angle = std::f32::consts::TAU * (i as f32 / BURST_PARTICLES as f32);
            let speed = rng.random_range(2.0..4.0);
            let particle = Particle {
                pos: center,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                life: Life::frames(BURST_LIFE_FRAMES),
                size: 4.0,
            };
            if !self.push(ParticleKind::Burst, particle, budget) {
                break;
            }
        }
    }

    /// A sand grain blown in from the right edge
    pub fn spawn_sand(&mut self, rng: &mut impl Rng, now: Millis, viewport_width: f32, budget: usize) {
        let particle = Particle {
            pos: Vec2::new(
                viewport_width + rng.random_range(0.0..20.0),
                rng.random_range(0.0..PLAY_HEIGHT - GROUND_HEIGHT),
            ),
            vel: Vec2::new(rng.random_range(-14.0..-8.0), rng.random_range(-0.5..0.5)),
            life: Life::millis(now, SAND_LIFE_MS),
            size: rng.random_range(1.0..3.0),
        };
        self.push(ParticleKind::Sand, particle, budget);
    }

    pub fn clear(&mut self) {
        self.explosion.clear();
        self.splash.clear();
        self.sand.clear();
        self.burst.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_sweep_removes_dead() {
        let mut items = vec![1, 2, 3, 4, 5, 6];
        sweep(&mut items, |n| *n % 2 == 0);
        items.sort();
        assert_eq!(items, vec![2, 4, 6]);
    }

    #[test]
    fn test_obstacle_segments() {
        let obstacle = Obstacle::new(100.0, 200.0, GAP_SIZE, 0);
        let in_gap = Rect::new(110.0, 250.0, 30.0, 30.0);
        assert!(!obstacle.blocks(&in_gap));
        let hits_top = Rect::new(110.0, 190.0, 30.0, 30.0);
        assert!(obstacle.blocks(&hits_top));
        let hits_bottom = Rect::new(110.0, 200.0 + GAP_SIZE - 10.0, 30.0, 30.0);
        assert!(obstacle.blocks(&hits_bottom));
        let beside = Rect::new(10.0, 190.0, 30.0, 30.0);
        assert!(!obstacle.blocks(&beside));
    }

    #[test]
    fn test_destroyed_obstacle_does_not_block() {
        let mut obstacle = Obstacle::new(100.0, 200.0, GAP_SIZE, 0);
        let hits_top = Rect::new(110.0, 190.0, 30.0, 30.0);
        obstacle.destroyed = true;
        assert!(!obstacle.blocks(&hits_top));
        assert!(obstacle.segments_overlap(&hits_top));
    }

    #[test]
    fn test_frame_particles_expire() {
        let mut particles = Particles::default();
        let mut rng = Pcg32::seed_from_u64(7);
        particles.spawn_burst(&mut rng, Vec2::new(50.0, 50.0), 1_000);
        assert_eq!(particles.burst.len(), BURST_PARTICLES);
        for _ in 0..BURST_LIFE_FRAMES {
            particles.update(0.0);
        }
        assert!(particles.is_empty());
    }

    #[test]
    fn test_sand_particles_expire_by_clock() {
        let mut particles = Particles::default();
        let mut rng = Pcg32::seed_from_u64(7);
        particles.spawn_sand(&mut rng, 1_000.0, PLAY_WIDTH, 1_000);
        particles.update(1_100.0);
        assert_eq!(particles.sand.len(), 1);
        particles.update(1_000.0 + SAND_LIFE_MS);
        assert!(particles.sand.is_empty());
    }

    #[test]
    fn test_particle_budget() {
        let mut particles = Particles::default();
        let mut rng = Pcg32::seed_from_u64(7);
        particles.spawn_explosion(&mut rng, Vec2::ZERO, 10);
        particles.spawn_splash(&mut rng, Vec2::ZERO, 10);
        assert_eq!(particles.len(), 10);
    }
}
