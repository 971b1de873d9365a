//! RollSession: the state machine for a single roll.
//!
//! Idle -> Rolling -> Resolved, with Resolved terminal until the next roll
//! supersedes it. Timer decisions are guarded by a monotonically increasing
//! session token instead of cleared timer handles, so a stale poll or
//! failsafe can never resolve a superseded session.

use crate::profile::GravityProfile;
use crate::settle::POLL_INTERVAL_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollState {
    Idle,
    Rolling,
    Resolved,
}

/// Identity of one roll session. Compared before any deferred decision acts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionToken(pub u64);

/// Which path won the race to resolution. Both run the identical resolution
/// procedure; the failsafe path may read still-moving orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBy {
    Settled,
    Failsafe,
}

/// Final report of a roll: per-die face values and their sum.
#[derive(Debug, Clone)]
pub struct RollOutcome {
    pub session: SessionToken,
    pub faces: Vec<u32>,
    pub total: u32,
    pub resolved_by: ResolvedBy,
}

/// One in-flight (or just-resolved) roll. Dice bodies themselves live in
/// the world; the session owns only the timing state.
#[derive(Debug)]
pub struct RollSession {
    pub token: SessionToken,
    pub profile: GravityProfile,
    pub started_at_ms: f64,
    pub failsafe_deadline_ms: f64,
    pub next_poll_ms: f64,
    pub state: RollState,
}

impl RollSession {
    /// Arm a new session: failsafe deadline from the profile table, first
    /// settlement poll one interval out.
    pub fn begin(token: SessionToken, profile: GravityProfile, now_ms: f64) -> RollSession {
        RollSession {
            token,
            profile,
            started_at_ms: now_ms,
            failsafe_deadline_ms: now_ms + profile.failsafe_millis() as f64,
            next_poll_ms: now_ms + POLL_INTERVAL_MS as f64,
            state: RollState::Rolling,
        }
    }

    pub fn poll_due(&self, now_ms: f64) -> bool {
        self.state == RollState::Rolling && now_ms >= self.next_poll_ms
    }

    pub fn failsafe_due(&self, now_ms: f64) -> bool {
        self.state == RollState::Rolling && now_ms >= self.failsafe_deadline_ms
    }

    pub fn schedule_next_poll(&mut self, now_ms: f64) {
        self.next_poll_ms = now_ms + POLL_INTERVAL_MS as f64;
    }
}
