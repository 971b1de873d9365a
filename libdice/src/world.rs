//! PhysicsWorld: gravity, the static table boundary (floor plus four walls),
//! and the fixed-step integrator / contact solver for the active dice.
//!
//! Semi-implicit integration, impulse contacts with Coulomb friction against
//! the boundary planes, a bounding-sphere response between dice, and a
//! rolling-resistance term so cuboids come to rest on a face.

use nalgebra::{Point3, Quaternion, UnitQuaternion, Vector3};

use crate::body::DieBody;
use crate::profile::GravityProfile;
use crate::Real;

const EPS: Real = 1e-6;

/// Table bounds: walls at x = +/-10 and z = +/-10, floor at y = 0.
pub const TABLE_HALF_EXTENT: Real = 10.0;

/// Below this closing speed a contact has no bounce; resting contacts then
/// cancel the per-step gravity kick instead of re-injecting it.
const RESTITUTION_MIN_SPEED: Real = 2.0;

const SOLVER_ITERS: usize = 8;
const CORRECTION_PERCENT: Real = 0.2;
const CORRECTION_SLOP: Real = 0.01;
const ROLL_RESISTANCE: Real = 0.05;

/// Static half-space `normal . p >= offset`, normal pointing into the table.
#[derive(Clone, Copy, Debug)]
pub struct BoundaryPlane {
    pub normal: Vector3<Real>,
    pub offset: Real,
}

impl BoundaryPlane {
    fn distance(&self, p: &Point3<Real>) -> Real {
        self.normal.dot(&p.coords) - self.offset
    }
}

/// Single aggregated contact between a die and a boundary plane: centroid of
/// the penetrating corners, so a flat resting face produces no net torque.
struct Contact {
    penetration: Real,
    r: Vector3<Real>,
    normal: Vector3<Real>,
}

/// Owns every simulated body. Dice are added and removed by the roll
/// session; the stepping logic lives here alone. The boundary planes are
/// created once and never removed.
pub struct PhysicsWorld {
    pub gravity: Vector3<Real>,
    dice: Vec<DieBody>,
    planes: [BoundaryPlane; 5],
    stepping: bool,
    drain_queued: bool,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        let t = TABLE_HALF_EXTENT;
        let planes = [
            // floor
            BoundaryPlane {
                normal: Vector3::y(),
                offset: 0.0,
            },
            // walls, normals facing inward
            BoundaryPlane {
                normal: Vector3::x(),
                offset: -t,
            },
            BoundaryPlane {
                normal: -Vector3::x(),
                offset: -t,
            },
            BoundaryPlane {
                normal: Vector3::z(),
                offset: -t,
            },
            BoundaryPlane {
                normal: -Vector3::z(),
                offset: -t,
            },
        ];
        PhysicsWorld {
            gravity: Vector3::new(0.0, GravityProfile::Normal.gravity_y(), 0.0),
            dice: Vec::new(),
            planes,
            stepping: false,
            drain_queued: false,
        }
    }

    /// Replace the downward acceleration applied to all free bodies. No
    /// wake/sleep side effects beyond the integrator's own behavior.
    pub fn set_gravity_y(&mut self, g: Real) {
        self.gravity = Vector3::new(0.0, g, 0.0);
    }

    pub fn add_die(&mut self, die: DieBody) {
        self.dice.push(die);
    }

    /// Remove every die. Safe to call mid-step: the drain is queued and
    /// applied once the step returns.
    pub fn clear_dice(&mut self) {
        if self.stepping {
            self.drain_queued = true;
        } else {
            self.dice.clear();
        }
    }

    pub fn dice(&self) -> &[DieBody] {
        &self.dice
    }

    pub fn dice_mut(&mut self) -> &mut [DieBody] {
        &mut self.dice
    }

    /// Advance every active body by one fixed increment (dt = 1/60 s):
    /// gravity, collision response against floor, walls, and other dice.
    pub fn step(&mut self, dt: Real) {
        self.stepping = true;

        // semi-implicit integration
        for die in &mut self.dice {
            die.velocity += self.gravity * dt;
            die.position += die.velocity * dt;

            // quaternion derivative q' = 0.5 * w_quat * q
            let w = die.angular_velocity;
            let q = die.orientation.quaternion();
            let dq = Quaternion::from_parts(0.0, w) * q * 0.5 * dt;
            let qnew = Quaternion::new(q.w + dq.w, q.i + dq.i, q.j + dq.j, q.k + dq.k);
            die.orientation = UnitQuaternion::new_normalize(qnew);
        }

        // contacts & solver
        for _iter in 0..SOLVER_ITERS {
            for die in &mut self.dice {
                for plane in &self.planes {
                    if let Some(c) = plane_contact(die, plane) {
                        resolve_plane_contact(die, &c);
                        positional_correction(die, &c);
                    }
                }
            }
            self.resolve_die_pairs();
        }

        // rolling resistance: angular damping towards rest
        for die in &mut self.dice {
            let inv_iw = die.inv_inertia_world();
            let tau = -die.angular_velocity * ROLL_RESISTANCE / die.inv_mass;
            die.angular_velocity += inv_iw * tau * dt;
        }

        self.stepping = false;
        if self.drain_queued {
            self.drain_queued = false;
            self.dice.clear();
        }
    }

    /// Bounding-sphere response between dice: equal-and-opposite normal
    /// impulse plus a positional split. Coarse, but dice only touch briefly
    /// while tumbling.
    fn resolve_die_pairs(&mut self) {
        let n = self.dice.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (head, tail) = self.dice.split_at_mut(j);
                let a = &mut head[i];
                let b = &mut tail[0];

                let delta = b.position - a.position;
                let dist = delta.norm();
                let min_dist = a.contact_radius() + b.contact_radius();
                if dist >= min_dist || dist < EPS {
                    continue;
                }
                let normal = delta / dist;

                let rel = b.velocity - a.velocity;
                let vn = rel.dot(&normal);
                if vn < 0.0 {
                    let e = if -vn < RESTITUTION_MIN_SPEED {
                        0.0
                    } else {
                        a.restitution.min(b.restitution)
                    };
                    let jn = -(1.0 + e) * vn / (a.inv_mass + b.inv_mass);
                    let impulse = normal * jn;
                    a.velocity -= impulse * a.inv_mass;
                    b.velocity += impulse * b.inv_mass;
                }

                let penetration = min_dist - dist;
                let correction = normal * (penetration * CORRECTION_PERCENT * 0.5);
                a.position -= correction;
                b.position += correction;
            }
        }
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate the penetrating corners of a die against one plane into a
/// single contact at their centroid with the average penetration.
fn plane_contact(die: &DieBody, plane: &BoundaryPlane) -> Option<Contact> {
    let mut centroid = Vector3::zeros();
    let mut depth = 0.0;
    let mut count = 0.0;
    for corner in die.corners() {
        let d = plane.distance(&corner);
        if d < 0.0 {
            centroid += corner.coords;
            depth += -d;
            count += 1.0;
        }
    }
    if count == 0.0 {
        return None;
    }
    centroid /= count;
    Some(Contact {
        penetration: depth / count,
        r: centroid - die.position.coords,
        normal: plane.normal,
    })
}

/// Normal + Coulomb friction impulse for a die against a static plane.
fn resolve_plane_contact(die: &mut DieBody, c: &Contact) {
    let n = c.normal;
    let v_rel = die.velocity + die.angular_velocity.cross(&c.r);
    let vn = v_rel.dot(&n);
    if vn >= 0.0 {
        return;
    }

    let inv_i = die.inv_inertia_world();
    let r_cross_n = c.r.cross(&n);
    let angular = (inv_i * r_cross_n).cross(&c.r).dot(&n);
    let denom = die.inv_mass + angular;

    let e = if -vn < RESTITUTION_MIN_SPEED {
        0.0
    } else {
        die.restitution
    };
    let jn = (-(1.0 + e) * vn / denom.max(EPS)).max(0.0);
    die.apply_impulse_at(n * jn, c.r);

    // friction against the post-impulse tangential velocity
    let v_post = die.velocity + die.angular_velocity.cross(&c.r);
    let vt = v_post - n * v_post.dot(&n);
    let vt_len = vt.norm();
    if vt_len > EPS {
        let t = vt / vt_len;
        let r_cross_t = c.r.cross(&t);
        let ang_t = (inv_i * r_cross_t).cross(&c.r).dot(&t);
        let denom_t = die.inv_mass + ang_t;
        let jt = -v_post.dot(&t) / denom_t.max(EPS);
        let max_friction = die.friction * jn;
        let jf = jt.clamp(-max_friction, max_friction);
        die.apply_impulse_at(t * jf, c.r);
    }
}

/// Baumgarte-style positional correction to keep dice from sinking.
fn positional_correction(die: &mut DieBody, c: &Contact) {
    let corr = (c.penetration - CORRECTION_SLOP).max(0.0) * CORRECTION_PERCENT;
    if corr > 0.0 {
        die.position += c.normal * corr;
    }
}
