//! Asset collaborator boundary
//!
//! Sprites are purely decorative and always optional. The store never blocks:
//! a sprite that was never registered (or is still loading on the host side)
//! resolves to `None` and the renderer draws a flat colored shape instead.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::AssetError;
use crate::consts::{LEVEL_THRESHOLDS, OBSTACLE_VARIANTS};
use crate::sim::PickupKind;
use crate::sim::narrative::PORTRAIT_COUNT;

/// Every decorative sprite the renderer may ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteId {
    Avatar,
    /// Obstacle art, per skin level and decorative variant
    Obstacle { level: u32, variant: u8 },
    Pickup(PickupKind),
    Projectile,
    /// Background art for a skin level
    Background(u32),
    /// Taunt speaker portrait
    Portrait(usize),
}

impl SpriteId {
    pub fn name(&self) -> &'static str {
        match self {
            SpriteId::Avatar => "avatar",
            SpriteId::Obstacle { .. } => "obstacle",
            SpriteId::Pickup(PickupKind::PowerPill) => "power_pill",
            SpriteId::Pickup(PickupKind::DebuffPill) => "debuff_pill",
            SpriteId::Pickup(PickupKind::MegaPoster) => "mega_poster",
            SpriteId::Projectile => "projectile",
            SpriteId::Background(_) => "background",
            SpriteId::Portrait(_) => "portrait",
        }
    }

    /// Image file, relative to the asset root
    pub fn path(&self) -> String {
        match self {
            SpriteId::Obstacle { level, variant } => format!("obstacle_{}_{}.png", level, variant),
            SpriteId::Background(level) => format!("background_{}.png", level),
            SpriteId::Portrait(index) => format!("portrait_{}.png", index),
            other => format!("{}.png", other.name()),
        }
    }

    /// Every sprite the renderer can ask for
    pub fn manifest() -> Vec<SpriteId> {
        let levels = LEVEL_THRESHOLDS.len() as u32 + 1;
        let mut ids = vec![SpriteId::Avatar, SpriteId::Projectile];
        ids.extend(PickupKind::ALL.map(SpriteId::Pickup));
        for level in 0..levels {
            ids.push(SpriteId::Background(level));
            for variant in 0..OBSTACLE_VARIANTS {
                ids.push(SpriteId::Obstacle { level, variant });
            }
        }
        ids.extend((0..PORTRAIT_COUNT).map(SpriteId::Portrait));
        ids
    }
}

/// A loaded image, referenced by the host-side handle it was registered with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    /// Host handle (URL on the web, path natively)
    pub source: String,
    pub width: u32,
    pub height: u32,
}

/// Registry of loaded sprites
#[derive(Debug, Default)]
pub struct AssetStore {
    sprites: HashMap<SpriteId, Sprite>,
    /// Missing sprites already reported
    warned: RefCell<HashSet<SpriteId>>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sprite once the host has finished loading it
    pub fn insert(&mut self, id: SpriteId, sprite: Sprite) {
        log::debug!("Sprite ready: {} ({})", id.name(), sprite.source);
        self.sprites.insert(id, sprite);
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Strict lookup
    pub fn get(&self, id: SpriteId) -> Result<&Sprite, AssetError> {
        self.sprites
            .get(&id)
            .ok_or(AssetError::MissingSprite(id.name()))
    }

    /// Lookup for drawing: a missing sprite is logged once, then silently skipped
    pub fn sprite(&self, id: SpriteId) -> Option<&Sprite> {
        match self.get(id) {
            Ok(sprite) => Some(sprite),
            Err(e) => {
                if self.warned.borrow_mut().insert(id) {
                    log::warn!("{}, drawing fallback shape", e);
                }
                None
            }
        }
    }

    /// Number of distinct missing sprites reported so far
    pub fn missing_reported(&self) -> usize {
        self.warned.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprite(source: &str) -> Sprite {
        Sprite {
            source: source.to_string(),
            width: 32,
            height: 32,
        }
    }

    #[test]
    fn test_missing_sprite_falls_back() {
        let store = AssetStore::new();
        assert!(store.is_empty());
        assert!(store.sprite(SpriteId::Avatar).is_none());
        assert!(matches!(
            store.get(SpriteId::Avatar),
            Err(AssetError::MissingSprite("avatar"))
        ));
    }

    #[test]
    fn test_missing_sprite_reported_once() {
        let store = AssetStore::new();
        for _ in 0..5 {
            store.sprite(SpriteId::Projectile);
        }
        store.sprite(SpriteId::Background(1));
        assert_eq!(store.missing_reported(), 2);
    }

    #[test]
    fn test_registered_sprite_found() {
        let mut store = AssetStore::new();
        store.insert(SpriteId::Pickup(PickupKind::MegaPoster), sprite("mega.png"));
        let found = store
            .sprite(SpriteId::Pickup(PickupKind::MegaPoster))
            .map(|s| s.source.as_str());
        assert_eq!(found, Some("mega.png"));
        assert_eq!(store.len(), 1);
        // Keys are distinct per variant
        assert!(store.sprite(SpriteId::Pickup(PickupKind::PowerPill)).is_none());
    }

    #[test]
    fn test_manifest_paths_are_unique() {
        let manifest = SpriteId::manifest();
        let paths: HashSet<String> = manifest.iter().map(SpriteId::path).collect();
        assert_eq!(paths.len(), manifest.len());
        assert!(paths.contains("avatar.png"));
        assert!(paths.contains("obstacle_2_3.png"));
        assert!(paths.contains("mega_poster.png"));
    }
}
