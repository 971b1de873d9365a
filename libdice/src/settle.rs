//! Settlement detection: a roll is settled when every die in the session is
//! at rest. Detection is polled on a fixed cadence by the session rather
//! than driven by engine events, decoupling simulation accuracy from
//! decision latency.

use crate::body::DieBody;
use crate::Real;

/// Squared-magnitude rest thresholds (no square root taken).
pub const LINEAR_REST_EPS_SQ: Real = 0.01;
pub const ANGULAR_REST_EPS_SQ: Real = 0.01;

/// Cadence of the settlement poll, independent of the physics step.
pub const POLL_INTERVAL_MS: u64 = 100;

/// A die is at rest when both squared velocity magnitudes are below the
/// thresholds.
pub fn die_at_rest(die: &DieBody) -> bool {
    die.velocity.norm_squared() < LINEAR_REST_EPS_SQ
        && die.angular_velocity.norm_squared() < ANGULAR_REST_EPS_SQ
}

/// True only when every die is at rest and the list is non-empty. A roll
/// with zero dice never settles.
pub fn all_settled(dice: &[DieBody]) -> bool {
    !dice.is_empty() && dice.iter().all(die_at_rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use rand::rngs::OsRng;

    fn still_die() -> DieBody {
        let mut rng = OsRng;
        let mut die = DieBody::spawn(0, &mut rng);
        die.velocity = Vector3::zeros();
        die.angular_velocity = Vector3::zeros();
        die
    }

    #[test]
    fn test_empty_list_never_settles() {
        assert!(!all_settled(&[]));
    }

    #[test]
    fn test_still_dice_are_settled() {
        assert!(all_settled(&[still_die(), still_die()]));
    }

    #[test]
    fn test_threshold_is_strict() {
        // |v| = 0.1 gives a squared magnitude of exactly 0.01: not at rest
        let mut die = still_die();
        die.velocity = Vector3::new(0.1, 0.0, 0.0);
        assert!(!die_at_rest(&die));

        die.velocity = Vector3::new(0.09, 0.0, 0.0);
        assert!(die_at_rest(&die));
    }

    #[test]
    fn test_angular_motion_blocks_settlement() {
        let mut spinning = still_die();
        spinning.angular_velocity = Vector3::new(0.0, 2.0, 0.0);
        assert!(!die_at_rest(&spinning));
        assert!(!all_settled(&[still_die(), spinning]));
    }
}
