//! DiceEngine: the single object owning the physics world, the current roll
//! session, and the frame clock. Constructed once per application lifetime
//! and driven by an external frame loop calling `tick(STEP_DT)`.
//!
//! Scheduling is single-threaded and cooperative: the "timers" (settlement
//! poll, failsafe) are deadlines on the engine's own millisecond clock,
//! checked after the physics step of each frame. Nothing blocks; waiting
//! for settlement is repeated non-blocking checks.

use rand::rngs::OsRng;

use crate::body::DieBody;
use crate::profile::GravityProfile;
use crate::session::{ResolvedBy, RollOutcome, RollSession, RollState, SessionToken};
use crate::settle;
use crate::world::PhysicsWorld;
use crate::Real;

/// Effect hooks for external collaborators (the audio service). Playback
/// failure is the implementor's concern and must never reach simulation
/// state; implementations should swallow and log their own errors.
pub trait RollEffects {
    fn on_roll_start(&mut self) {}
    fn on_roll_resolved(&mut self, _outcome: &RollOutcome) {}
}

struct NoEffects;

impl RollEffects for NoEffects {}

pub struct DiceEngine {
    world: PhysicsWorld,
    session: Option<RollSession>,
    outcome: Option<RollOutcome>,
    clock_ms: f64,
    next_token: u64,
    rng: OsRng,
    effects: Box<dyn RollEffects>,
}

impl DiceEngine {
    pub fn new() -> Self {
        Self::with_effects(Box::new(NoEffects))
    }

    pub fn with_effects(effects: Box<dyn RollEffects>) -> Self {
        DiceEngine {
            world: PhysicsWorld::new(),
            session: None,
            outcome: None,
            clock_ms: 0.0,
            next_token: 0,
            rng: OsRng,
            effects,
        }
    }

    /// Start a roll. Cancels any in-flight session first: its dice are
    /// removed from the world and its token retired, so no stale timer can
    /// resolve it. `count` is assumed validated (see `validate_count`).
    pub fn roll(&mut self, count: u32, profile: GravityProfile) {
        if let Some(prev) = self.session.take() {
            if prev.state == RollState::Rolling {
                tracing::debug!(token = prev.token.0, "superseding active roll");
            }
            self.world.clear_dice();
        }
        self.outcome = None;

        self.world.set_gravity_y(profile.gravity_y());
        for i in 0..count {
            self.world.add_die(DieBody::spawn(i as usize, &mut self.rng));
        }

        let token = SessionToken(self.next_token);
        self.next_token += 1;
        self.session = Some(RollSession::begin(token, profile, self.clock_ms));

        self.effects.on_roll_start();
        tracing::info!(
            token = token.0,
            count,
            profile = profile.name(),
            "roll started"
        );
    }

    /// Advance one frame: physics first, then the due settlement poll, then
    /// the failsafe check. Whichever deadline fires first wins the race;
    /// both converge on the same resolution procedure.
    pub fn tick(&mut self, dt: Real) {
        self.world.step(dt);
        self.clock_ms += dt as f64 * 1000.0;
        let now = self.clock_ms;

        let fired = {
            let Some(session) = self.session.as_mut() else {
                return;
            };
            let mut fired = None;
            if session.poll_due(now) {
                session.schedule_next_poll(now);
                if settle::all_settled(self.world.dice()) {
                    fired = Some(ResolvedBy::Settled);
                }
            }
            if fired.is_none() && session.failsafe_due(now) {
                fired = Some(ResolvedBy::Failsafe);
            }
            fired
        };

        if let Some(by) = fired {
            self.resolve(by);
        }
    }

    /// Shared resolution path: face value per die via the face resolver,
    /// summed. The failsafe path reads current, possibly still-moving
    /// orientations.
    fn resolve(&mut self, by: ResolvedBy) {
        let faces: Vec<u32> = self.world.dice().iter().map(DieBody::up_value).collect();
        let total = faces.iter().sum();

        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.state = RollState::Resolved;
        let outcome = RollOutcome {
            session: session.token,
            faces,
            total,
            resolved_by: by,
        };
        tracing::info!(
            token = session.token.0,
            total,
            resolved_by = ?by,
            elapsed_ms = self.clock_ms - session.started_at_ms,
            "roll resolved"
        );
        self.effects.on_roll_resolved(&outcome);
        self.outcome = Some(outcome);
    }

    pub fn state(&self) -> RollState {
        self.session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(RollState::Idle)
    }

    pub fn session(&self) -> Option<&RollSession> {
        self.session.as_ref()
    }

    pub fn last_outcome(&self) -> Option<&RollOutcome> {
        self.outcome.as_ref()
    }

    /// Engine-internal clock, in milliseconds of simulated time.
    pub fn now_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Live dice for renderer sync: current position and orientation after
    /// each step. The engine has no opinion on how these are drawn.
    pub fn dice(&self) -> &[DieBody] {
        self.world.dice()
    }

    pub fn dice_mut(&mut self) -> &mut [DieBody] {
        self.world.dice_mut()
    }
}

impl Default for DiceEngine {
    fn default() -> Self {
        Self::new()
    }
}
