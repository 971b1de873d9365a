//! Gravity presets and their failsafe ceilings.
//!
//! Each profile pairs a downward acceleration with the maximum time a roll
//! may run before it is forced to resolve. Lower gravity means more bounce
//! and a lower terminal velocity, so the ceiling scales up with floatiness.

use crate::Real;

/// Named gravity preset. Selecting one mutates the active world's gravity
/// and the failsafe deadline armed for the next roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GravityProfile {
    Normal,
    Floaty,
    SuperFloaty,
    Moon,
}

impl GravityProfile {
    pub const ALL: [GravityProfile; 4] = [
        GravityProfile::Normal,
        GravityProfile::Floaty,
        GravityProfile::SuperFloaty,
        GravityProfile::Moon,
    ];

    /// Downward acceleration applied to all free bodies.
    pub fn gravity_y(self) -> Real {
        match self {
            GravityProfile::Normal => -90.0,
            GravityProfile::Floaty => -50.0,
            GravityProfile::SuperFloaty => -20.0,
            GravityProfile::Moon => -5.0,
        }
    }

    /// Maximum wait before a roll is forced into `Resolved`.
    pub fn failsafe_millis(self) -> u64 {
        match self {
            GravityProfile::Normal => 2500,
            GravityProfile::Floaty => 4000,
            GravityProfile::SuperFloaty => 6000,
            GravityProfile::Moon => 8000,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GravityProfile::Normal => "normal",
            GravityProfile::Floaty => "floaty",
            GravityProfile::SuperFloaty => "super-floaty",
            GravityProfile::Moon => "moon",
        }
    }

    /// Case-insensitive lookup. Unknown or empty names fall back to the
    /// `Normal` profile rather than failing.
    pub fn from_name(name: &str) -> GravityProfile {
        match name.to_lowercase().as_str() {
            "floaty" => GravityProfile::Floaty,
            "super-floaty" | "superfloaty" => GravityProfile::SuperFloaty,
            "moon" => GravityProfile::Moon,
            _ => GravityProfile::Normal,
        }
    }
}

impl Default for GravityProfile {
    fn default() -> Self {
        GravityProfile::Normal
    }
}
