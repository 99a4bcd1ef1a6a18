//! Cached background layer
//!
//! The sky, skyline and ground only change with the skin level (or when the
//! background sprite finishes loading), so they are built once per key and
//! reused every frame.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{Color, DrawCmd};
use crate::Rect;
use crate::assets::{AssetStore, SpriteId};
use crate::consts::{GROUND_HEIGHT, PLAY_HEIGHT};

/// Sky bands (top to bottom), skyline and ground colors per skin level
struct Palette {
    sky: [Color; 4],
    skyline: Color,
    ground: Color,
    ground_stripe: Color,
}

fn palette(level: u32) -> Palette {
    match level {
        0 => Palette {
            sky: [
                [0.10, 0.12, 0.30, 1.0],
                [0.20, 0.22, 0.45, 1.0],
                [0.45, 0.35, 0.55, 1.0],
                [0.85, 0.55, 0.45, 1.0],
            ],
            skyline: [0.08, 0.08, 0.18, 1.0],
            ground: [0.35, 0.25, 0.15, 1.0],
            ground_stripe: [0.45, 0.75, 0.3, 1.0],
        },
        1 => Palette {
            sky: [
                [0.05, 0.15, 0.08, 1.0],
                [0.10, 0.28, 0.12, 1.0],
                [0.30, 0.45, 0.15, 1.0],
                [0.65, 0.70, 0.25, 1.0],
            ],
            skyline: [0.03, 0.10, 0.05, 1.0],
            ground: [0.25, 0.22, 0.12, 1.0],
            ground_stripe: [0.6, 0.8, 0.1, 1.0],
        },
        _ => Palette {
            sky: [
                [0.18, 0.02, 0.05, 1.0],
                [0.35, 0.05, 0.08, 1.0],
                [0.60, 0.15, 0.10, 1.0],
                [0.95, 0.45, 0.15, 1.0],
            ],
            skyline: [0.10, 0.01, 0.03, 1.0],
            ground: [0.20, 0.10, 0.08, 1.0],
            ground_stripe: [0.9, 0.3, 0.1, 1.0],
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CacheKey {
    level: u32,
    viewport_width: f32,
    sprite_ready: bool,
}

#[derive(Debug, Default)]
pub struct BackgroundCache {
    key: Option<CacheKey>,
    cmds: Vec<DrawCmd>,
    rebuilds: u32,
}

impl BackgroundCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Times the layer has been rebuilt
    pub fn rebuilds(&self) -> u32 {
        self.rebuilds
    }

    /// Background commands for `level`, rebuilt only when the key changes
    pub fn get(&mut self, level: u32, viewport_width: f32, assets: &AssetStore) -> &[DrawCmd] {
        let key = CacheKey {
            level,
            viewport_width,
            sprite_ready: assets.sprite(SpriteId::Background(level)).is_some(),
        };
        if self.key != Some(key) {
            self.cmds = build(key);
            self.key = Some(key);
            self.rebuilds += 1;
            log::debug!("Background rebuilt for level {}", level);
        }
        &self.cmds
    }
}

fn build(key: CacheKey) -> Vec<DrawCmd> {
    let width = key.viewport_width;
    let floor = PLAY_HEIGHT - GROUND_HEIGHT;
    let palette = palette(key.level);
    let mut cmds = Vec::new();

    if key.sprite_ready {
        cmds.push(DrawCmd::Sprite {
            id: SpriteId::Background(key.level),
            rect: Rect::new(0.0, 0.0, width, floor),
            rotation: 0.0,
            alpha: 1.0,
        });
    } else {
        let band = floor / palette.sky.len() as f32;
        for (i, color) in palette.sky.iter().enumerate() {
            cmds.push(DrawCmd::Rect {
                rect: Rect::new(0.0, i as f32 * band, width, band + 1.0),
                color: *color,
            });
        }
        // Same skyline every time for a given level
        let mut rng = Pcg32::seed_from_u64(0x5eed ^ key.level as u64);
        let mut x = 0.0;
        while x < width {
            let w = rng.random_range(24.0..56.0);
            let h = rng.random_range(40.0..160.0);
            cmds.push(DrawCmd::Rect {
                rect: Rect::new(x, floor - h, w, h),
                color: palette.skyline,
            });
            x += w + rng.random_range(0.0..8.0);
        }
    }

    cmds.push(DrawCmd::Rect {
        rect: Rect::new(0.0, floor, width, GROUND_HEIGHT),
        color: palette.ground,
    });
    cmds.push(DrawCmd::Line {
        from: Vec2::new(0.0, floor),
        to: Vec2::new(width, floor),
        width: 4.0,
        color: palette.ground_stripe,
    });
    cmds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Sprite;
    use crate::consts::PLAY_WIDTH;

    #[test]
    fn test_rebuilds_only_on_level_change() {
        let assets = AssetStore::new();
        let mut cache = BackgroundCache::new();
        let first = cache.get(0, PLAY_WIDTH, &assets).to_vec();
        for _ in 0..10 {
            cache.get(0, PLAY_WIDTH, &assets);
        }
        assert_eq!(cache.rebuilds(), 1);
        let second = cache.get(1, PLAY_WIDTH, &assets).to_vec();
        assert_eq!(cache.rebuilds(), 2);
        assert_ne!(first, second);
    }

    #[test]
    fn test_skyline_is_stable() {
        let assets = AssetStore::new();
        let a = BackgroundCache::new().get(2, PLAY_WIDTH, &assets).to_vec();
        let b = BackgroundCache::new().get(2, PLAY_WIDTH, &assets).to_vec();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sprite_arrival_invalidates() {
        let mut assets = AssetStore::new();
        let mut cache = BackgroundCache::new();
        cache.get(0, PLAY_WIDTH, &assets);
        assets.insert(
            SpriteId::Background(0),
            Sprite {
                source: "bg0.png".into(),
                width: 480,
                height: 660,
            },
        );
        let cmds = cache.get(0, PLAY_WIDTH, &assets);
        assert!(matches!(cmds[0], DrawCmd::Sprite { .. }));
        assert_eq!(cache.rebuilds(), 2);
    }
}
