//! libdice: rigid-body d6 dice-roll simulation engine.
//!
//! - Cuboid dice dropped into a walled table box, stepped at a fixed 1/60 s
//! - Settlement detection by squared-velocity thresholds, polled every 100 ms
//! - Per-gravity-profile failsafe deadline that forces a stuck roll to resolve
//! - Face-up determination from the final orientation
//! - OsRng for non-deterministic randomness (no seed)
//!
//! Public API:
//! - DiceEngine: owns the physics world and the active roll session
//! - engine.roll(count, profile), engine.tick(STEP_DT) once per frame
//! - engine.last_outcome() -> Option<&RollOutcome> once state() is Resolved
//!
//! Example (one roll, driven to completion):
//! let mut engine = DiceEngine::new();
//! engine.roll(2, GravityProfile::Normal);
//! while engine.state() == RollState::Rolling {
//!     engine.tick(STEP_DT);
//! }
//! let total = engine.last_outcome().unwrap().total;

pub use nalgebra::{Matrix3, Point3, Quaternion, UnitQuaternion, Vector3};

pub mod body;
pub mod engine;
pub mod profile;
pub mod session;
pub mod settle;
pub mod world;

pub use body::{DieBody, FACE_VALUES};
pub use engine::{DiceEngine, RollEffects};
pub use profile::GravityProfile;
pub use session::{ResolvedBy, RollOutcome, RollState, SessionToken};
pub use world::PhysicsWorld;

pub type Real = f32;

/// Fixed physics increment: one step per rendering frame at 60 fps.
pub const STEP_DT: Real = 1.0 / 60.0;

/// Upper bound on dice per roll accepted from callers.
pub const MAX_DICE: u32 = 6;

#[derive(Debug, thiserror::Error)]
pub enum DiceError {
    #[error("invalid dice count: {given} (expected 1..={MAX_DICE})")]
    InvalidDiceCount { given: u32 },
}

/// Caller-side guard for roll sizes. `DiceEngine::roll` itself assumes the
/// count has already been validated.
pub fn validate_count(count: u32) -> Result<u32, DiceError> {
    if count == 0 || count > MAX_DICE {
        return Err(DiceError::InvalidDiceCount { given: count });
    }
    Ok(count)
}
