//! Demo/attract-mode controller: flies toward the next gap

use super::state::Session;
use crate::consts::*;

/// How far below the target the avatar may sink before flapping
const SINK_TOLERANCE: f32 = 12.0;
/// Beyond this distance below the target, flap again before the apex
const CATCH_UP_DISTANCE: f32 = 80.0;

/// Vertical center the autopilot aims for this frame
pub fn target_y(session: &Session) -> f32 {
    let avatar = &session.avatar;
    session
        .world
        .obstacles
        .iter()
        .filter(|o| !o.destroyed && o.right() > avatar.x)
        .min_by(|a, b| a.x.total_cmp(&b.x))
        .map_or((PLAY_HEIGHT - GROUND_HEIGHT) / 2.0, |o| o.gap_center())
}

/// Whether to jump this frame
pub fn should_jump(session: &Session) -> bool {
    let avatar = &session.avatar;
    let center = avatar.y + avatar.size() / 2.0;
    // Don't flap into the ceiling
    if avatar.y < avatar.size() {
        return false;
    }
    let below = center - target_y(session);
    if below > CATCH_UP_DISTANCE {
        return avatar.vel > JUMP_LIFT / 2.0;
    }
    below > SINK_TOLERANCE && avatar.vel >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entities::Obstacle;

    #[test]
    fn test_jumps_when_below_gap() {
        let mut session = Session::new(0.0, PLAY_WIDTH, 1.0);
        session
            .world
            .obstacles
            .push(Obstacle::new(300.0, 100.0, GAP_SIZE, 0));
        session.avatar.y = 400.0;
        session.avatar.vel = 1.0;
        assert!(should_jump(&session));
        session.avatar.y = 150.0;
        assert!(!should_jump(&session));
    }

    #[test]
    fn test_catches_up_from_far_below() {
        let mut session = Session::new(0.0, PLAY_WIDTH, 1.0);
        session
            .world
            .obstacles
            .push(Obstacle::new(300.0, 60.0, GAP_SIZE, 0));
        session.avatar.y = 500.0;
        session.avatar.vel = -2.0;
        assert!(should_jump(&session));
        session.avatar.vel = JUMP_LIFT;
        assert!(!should_jump(&session));
    }

    #[test]
    fn test_ignores_passed_obstacles() {
        let mut session = Session::new(0.0, PLAY_WIDTH, 1.0);
        session
            .world
            .obstacles
            .push(Obstacle::new(-50.0, 100.0, GAP_SIZE, 0));
        assert_eq!(target_y(&session), (PLAY_HEIGHT - GROUND_HEIGHT) / 2.0);
    }
}
