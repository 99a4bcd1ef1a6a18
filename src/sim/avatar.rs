//! The player avatar and its timed modifiers

use serde::{Deserialize, Serialize};

use super::timer::{Deadline, Millis};
use crate::Rect;
use crate::consts::*;

/// The "good" timed modifier slot. Mega implies power-shot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Boost {
    #[default]
    None,
    /// Jump also fires a projectile
    PowerShot { until: Deadline },
    /// Power-shot plus size growth and a timed auto-fire stream
    Mega {
        until: Deadline,
        next_volley: Deadline,
    },
}

/// Active modifiers: at most one boost and one debuff at a time
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub boost: Boost,
    /// Debuff pill: grown size and faster world
    pub debuff: Option<Deadline>,
}

/// Which modifiers ran out during `Modifiers::expire`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Expired {
    pub boost: bool,
    pub debuff: bool,
}

impl Modifiers {
    /// Whether jump input fires projectiles
    pub fn can_shoot(&self) -> bool {
        !matches!(self.boost, Boost::None)
    }

    pub fn is_mega(&self) -> bool {
        matches!(self.boost, Boost::Mega { .. })
    }

    pub fn is_debuffed(&self) -> bool {
        self.debuff.is_some()
    }

    /// Size multiplier: debuff and mega stack multiplicatively
    pub fn size_multiplier(&self) -> f32 {
        let mut mult = 1.0;
        if self.is_debuffed() {
            mult *= DEBUFF_SIZE_MULTIPLIER;
        }
        if self.is_mega() {
            mult *= MEGA_SIZE_MULTIPLIER;
        }
        mult
    }

    /// Avatar-side contribution to world speed (and gravity/lift scale)
    pub fn speed_multiplier(&self) -> f32 {
        if self.is_debuffed() {
            DEBUFF_SPEED_MULTIPLIER
        } else {
            1.0
        }
    }

    /// Grant power-shot. Absorbed while mega is active (mega already shoots).
    pub fn grant_power(&mut self, now: Millis) {
        if self.is_mega() {
            return;
        }
        self.boost = Boost::PowerShot {
            until: Deadline::after(now, POWER_DURATION_MS),
        };
    }

    pub fn grant_debuff(&mut self, now: Millis) {
        self.debuff = Some(Deadline::after(now, DEBUFF_DURATION_MS));
    }

    /// Grant mega; replaces any power-shot. First volley fires immediately.
    pub fn grant_mega(&mut self, now: Millis) {
        self.boost = Boost::Mega {
            until: Deadline::after(now, MEGA_DURATION_MS),
            next_volley: Deadline::at(now),
        };
    }

    /// Drop every modifier whose deadline has passed
    pub fn expire(&mut self, now: Millis) -> Expired {
        let mut expired = Expired::default();
        let boost_done = match self.boost {
            Boost::None => false,
            Boost::PowerShot { until } | Boost::Mega { until, .. } => until.expired(now),
        };
        if boost_done {
            self.boost = Boost::None;
            expired.boost = true;
        }
        if self.debuff.is_some_and(|d| d.expired(now)) {
            self.debuff = None;
            expired.debuff = true;
        }
        expired
    }

    /// Returns true when a mega volley is due, rescheduling the next one
    pub fn take_volley(&mut self, now: Millis) -> bool {
        if let Boost::Mega {
            ref mut next_volley,
            ..
        } = self.boost
            && next_volley.expired(now)
        {
            *next_volley = Deadline::after(now, MEGA_VOLLEY_INTERVAL_MS);
            return true;
        }
        false
    }

    /// Discount a paused span from every deadline
    pub fn shift(&mut self, by: Millis) {
        match &mut self.boost {
            Boost::None => {}
            Boost::PowerShot { until } => until.shift(by),
            Boost::Mega { until, next_volley } => {
                until.shift(by);
                next_volley.shift(by);
            }
        }
        if let Some(debuff) = &mut self.debuff {
            debuff.shift(by);
        }
    }
}

/// Outcome of the avatar hitting the top or bottom of the play area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsOutcome {
    Inside,
    Bounced,
    Crashed,
}

/// The player-controlled avatar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Avatar {
    /// Fixed horizontal position (derived from viewport width)
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Vertical velocity (pixels per tick, positive = down)
    pub vel: f32,
    /// Cosmetic rotation (radians)
    pub rotation: f32,
    pub modifiers: Modifiers,
}

impl Avatar {
    /// Canonical start: a third of the way down, at rest
    pub fn new(viewport_width: f32) -> Self {
        Self {
            x: viewport_width * AVATAR_X_FRACTION,
            y: (PLAY_HEIGHT - GROUND_HEIGHT) / 3.0,
            vel: 0.0,
            rotation: 0.0,
            modifiers: Modifiers::default(),
        }
    }

    /// Current edge length after modifiers
    pub fn size(&self) -> f32 {
        AVATAR_SIZE * self.modifiers.size_multiplier()
    }

    pub fn bounds(&self) -> Rect {
        let size = self.size();
        Rect::new(self.x, self.y, size, size)
    }

    /// Integrate gravity for one tick
    pub fn integrate(&mut self, device_speed_factor: f32) {
        let scale = self.modifiers.speed_multiplier();
        self.vel += GRAVITY * scale * device_speed_factor;
        self.y += self.vel;
        self.update_rotation();
    }

    /// Set velocity to the (scaled) lift
    pub fn jump(&mut self, device_speed_factor: f32) {
        let scale = self.modifiers.speed_multiplier();
        self.vel = JUMP_LIFT * scale * device_speed_factor;
    }

    fn update_rotation(&mut self) {
        if self.modifiers.can_shoot() {
            self.rotation = (self.rotation + POWER_SPIN_RATE) % std::f32::consts::TAU;
        } else {
            // First-order low-pass toward a velocity-proportional tilt
            let target = (self.vel * TILT_PER_VELOCITY)
                .clamp(-std::f32::consts::FRAC_PI_4, std::f32::consts::FRAC_PI_2);
            self.rotation = self.rotation * TILT_KEEP + target * TILT_BLEND;
        }
    }

    /// Check the ceiling and ground. Invulnerable avatars bounce instead of crashing.
    pub fn check_bounds(&mut self, invulnerable: bool) -> BoundsOutcome {
        let floor = PLAY_HEIGHT - GROUND_HEIGHT;
        let size = self.size();
        let above = self.y < 0.0;
        let below = self.y + size > floor;
        if !above && !below {
            return BoundsOutcome::Inside;
        }
        if !invulnerable {
            return BoundsOutcome::Crashed;
        }
        self.y = if above { 0.0 } else { floor - size };
        self.vel = -self.vel * BOUNCE_DAMPING;
        BoundsOutcome::Bounced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_size_multipliers_stack() {
        let mut mods = Modifiers::default();
        assert_eq!(mods.size_multiplier(), 1.0);
        mods.grant_debuff(0.0);
        assert_eq!(mods.size_multiplier(), 1.5);
        mods.grant_mega(0.0);
        assert!((mods.size_multiplier() - 1.875).abs() < 1e-6);
        assert!(mods.can_shoot());
    }

    #[test]
    fn test_power_absorbed_by_mega() {
        let mut mods = Modifiers::default();
        mods.grant_mega(0.0);
        mods.grant_power(100.0);
        assert!(mods.is_mega());
    }

    #[test]
    fn test_modifiers_expire_independently() {
        let mut mods = Modifiers::default();
        mods.grant_power(0.0);
        mods.grant_debuff(1_000.0);
        let expired = mods.expire(5_000.0);
        assert!(expired.boost);
        assert!(!expired.debuff);
        assert!(!mods.can_shoot());
        assert!(mods.is_debuffed());
        let expired = mods.expire(6_000.0);
        assert!(expired.debuff);
        assert_eq!(mods, Modifiers::default());
    }

    #[test]
    fn test_mega_volley_cadence() {
        let mut mods = Modifiers::default();
        mods.grant_mega(1_000.0);
        assert!(mods.take_volley(1_000.0));
        assert!(!mods.take_volley(1_100.0));
        assert!(mods.take_volley(1_000.0 + MEGA_VOLLEY_INTERVAL_MS));
    }

    #[test]
    fn test_gravity_and_jump() {
        let mut avatar = Avatar::new(PLAY_WIDTH);
        let start_y = avatar.y;
        avatar.integrate(1.0);
        assert_eq!(avatar.vel, GRAVITY);
        assert_eq!(avatar.y, start_y + GRAVITY);
        avatar.jump(1.0);
        assert_eq!(avatar.vel, JUMP_LIFT);
        avatar.modifiers.grant_debuff(0.0);
        avatar.jump(1.0);
        assert!((avatar.vel - JUMP_LIFT * DEBUFF_SPEED_MULTIPLIER).abs() < 1e-5);
    }

    #[test]
    fn test_tilt_is_low_pass() {
        let mut avatar = Avatar::new(PLAY_WIDTH);
        avatar.vel = 5.0;
        avatar.update_rotation();
        let expected = 5.0 * TILT_PER_VELOCITY * TILT_BLEND;
        assert!((avatar.rotation - expected).abs() < 1e-6);
    }

    #[test]
    fn test_bounds_crash_or_bounce() {
        let mut avatar = Avatar::new(PLAY_WIDTH);
        avatar.y = -5.0;
        avatar.vel = -6.0;
        assert_eq!(avatar.check_bounds(false), BoundsOutcome::Crashed);
        assert_eq!(avatar.check_bounds(true), BoundsOutcome::Bounced);
        assert_eq!(avatar.y, 0.0);
        assert_eq!(avatar.vel, 3.0);

        avatar.y = PLAY_HEIGHT;
        avatar.vel = 8.0;
        assert_eq!(avatar.check_bounds(true), BoundsOutcome::Bounced);
        assert_eq!(avatar.y, PLAY_HEIGHT - GROUND_HEIGHT - avatar.size());
        assert_eq!(avatar.vel, -4.0);
    }

    proptest! {
        #[test]
        fn prop_size_is_product_of_active(debuff in any::<bool>(), mega in any::<bool>()) {
            let mut mods = Modifiers::default();
            if debuff { mods.grant_debuff(0.0); }
            if mega { mods.grant_mega(0.0); }
            let expected = if debuff { 1.5 } else { 1.0 } * if mega { 1.25 } else { 1.0 };
            prop_assert!((mods.size_multiplier() - expected).abs() < 1e-6);
            prop_assert_eq!(mods.can_shoot(), mega);
        }
    }
}
