//! Collision detection between the avatar and every live entity class
//!
//! All checks are axis-aligned box overlaps. These functions only detect and
//! remove; the caller applies outcomes (effects, particles, events).

use glam::Vec2;

use super::entities::{Obstacle, Pickup, Projectile, Raindrop, sweep};
use crate::Rect;

/// Index of the first obstacle that blocks `avatar`, if any
pub fn blocking_obstacle(avatar: &Rect, obstacles: &[Obstacle]) -> Option<usize> {
    obstacles.iter().position(|o| o.blocks(avatar))
}

/// Remove and return every pickup overlapping the avatar
pub fn collect_pickups(avatar: &Rect, pickups: &mut Vec<Pickup>) -> Vec<Pickup> {
    let mut collected = Vec::new();
    sweep(pickups, |pickup| {
        if pickup.bounds().overlaps(avatar) {
            collected.push(pickup.clone());
            false
        } else {
            true
        }
    });
    collected
}

/// Resolve projectile hits: each hit removes the projectile and destroys the
/// obstacle. Returns the impact points for explosion effects.
pub fn projectile_hits(projectiles: &mut Vec<Projectile>, obstacles: &mut [Obstacle]) -> Vec<Vec2> {
    let mut impacts = Vec::new();
    sweep(projectiles, |projectile| {
        let bounds = projectile.bounds();
        match obstacles.iter_mut().find(|o| o.blocks(&bounds)) {
            Some(obstacle) => {
                obstacle.destroyed = true;
                impacts.push(projectile.pos);
                false
            }
            None => true,
        }
    });
    impacts
}

/// Remove raindrops touching the avatar. Returns splash points.
pub fn rain_hits(avatar: &Rect, drops: &mut Vec<Raindrop>) -> Vec<Vec2> {
    let mut splashes = Vec::new();
    sweep(drops, |drop| {
        if drop.bounds().overlaps(avatar) {
            splashes.push(drop.pos);
            false
        } else {
            true
        }
    });
    splashes
}
