//! DieBody: one rigid cuboid die, its spawn randomization, and the face
//! resolver that maps an orientation to the pip value facing up.

use nalgebra::{Matrix3, Point3, Quaternion, UnitQuaternion, Vector3};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::Real;

/// Half-extent of the fixed die cube (edge length 4 world units).
pub const DIE_HALF_EXTENT: Real = 2.0;
pub const DIE_MASS: Real = 1.0;

/// Pip values assigned to the canonical local face-normal order
/// [+X, -X, +Y, -Y, +Z, -Z]. Opposite faces sum to 7 like a standard die.
/// This ordering is a fixed contract consumed by the face resolver.
pub const FACE_VALUES: [u32; 6] = [6, 1, 2, 5, 3, 4];

/// Canonical local face-normal axes, same order as `FACE_VALUES`.
pub fn face_axes() -> [Vector3<Real>; 6] {
    [
        Vector3::x(),
        -Vector3::x(),
        Vector3::y(),
        -Vector3::y(),
        Vector3::z(),
        -Vector3::z(),
    ]
}

/// Rigid cuboid body. Position, orientation, and velocities are owned and
/// mutated exclusively by the physics step; `face_values` is assigned once
/// at creation and immutable thereafter.
#[derive(Clone, Debug)]
pub struct DieBody {
    pub position: Point3<Real>,
    pub orientation: UnitQuaternion<Real>,
    pub velocity: Vector3<Real>,
    pub angular_velocity: Vector3<Real>,

    pub half_extent: Real,
    pub inv_mass: Real,
    pub inv_inertia_body: Matrix3<Real>,

    pub restitution: Real,
    pub friction: Real,

    pub face_values: [u32; 6],
}

impl DieBody {
    /// Create a die for slot `index` of a roll: random horizontal position
    /// within the table bounds, vertical offset staggered by index so
    /// simultaneously spawned dice do not overlap, uniformly random
    /// orientation, and a random angular impulse.
    pub fn spawn(index: usize, rng: &mut OsRng) -> DieBody {
        let h = DIE_HALF_EXTENT;
        // solid cube inertia: m * (2h)^2 / 6 about each axis
        let inertia = DIE_MASS * (2.0 * h) * (2.0 * h) / 6.0;

        let px = unit(rng) * 6.0 - 3.0;
        let pz = unit(rng) * 6.0 - 3.0;
        let py = 5.0 + index as Real * 4.0;

        let (w, x, y, z) = random_unit_quaternion(rng);
        let orientation = UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z));

        let angular_velocity = Vector3::new(
            unit(rng) * 20.0 - 10.0,
            unit(rng) * 20.0 - 10.0,
            unit(rng) * 20.0 - 10.0,
        );

        DieBody {
            position: Point3::new(px, py, pz),
            orientation,
            velocity: Vector3::zeros(),
            angular_velocity,
            half_extent: h,
            inv_mass: 1.0 / DIE_MASS,
            inv_inertia_body: Matrix3::identity() / inertia,
            restitution: 0.25,
            friction: 0.4,
            face_values: FACE_VALUES,
        }
    }

    /// Face resolver: rotate each local face axis into world space, dot with
    /// world up, and take the maximum. Ties break by lowest axis index
    /// (strict comparison); a die balanced exactly on an edge is physically
    /// improbable post-settlement and gets no special handling.
    ///
    /// Pure in the orientation: the same quaternion always yields the same
    /// pip, and the result is always one of the six assigned values.
    pub fn up_value(&self) -> u32 {
        let up = Vector3::y();
        let mut best = 0usize;
        let mut best_dot = Real::MIN;
        for (i, axis) in face_axes().iter().enumerate() {
            let world_axis = self.orientation * axis;
            let d = world_axis.dot(&up);
            if d > best_dot {
                best_dot = d;
                best = i;
            }
        }
        self.face_values[best]
    }

    /// World-space corners of the cube, used by the contact solver.
    pub fn corners(&self) -> [Point3<Real>; 8] {
        let h = self.half_extent;
        let r = self.orientation.to_rotation_matrix();
        let mut out = [self.position; 8];
        let mut i = 0;
        for &sx in &[-h, h] {
            for &sy in &[-h, h] {
                for &sz in &[-h, h] {
                    out[i] = self.position + r * Vector3::new(sx, sy, sz);
                    i += 1;
                }
            }
        }
        out
    }

    /// Contact radius for the die-vs-die sphere approximation. Slightly more
    /// than the inscribed sphere so face-to-face stacks still push apart.
    pub fn contact_radius(&self) -> Real {
        self.half_extent * 1.1
    }

    pub(crate) fn inv_inertia_world(&self) -> Matrix3<Real> {
        let binding = self.orientation.to_rotation_matrix();
        let r = binding.matrix();
        r * self.inv_inertia_body * r.transpose()
    }

    pub(crate) fn apply_impulse_at(&mut self, impulse: Vector3<Real>, r: Vector3<Real>) {
        self.velocity += impulse * self.inv_mass;
        let inv_iw = self.inv_inertia_world();
        self.angular_velocity += inv_iw * r.cross(&impulse);
    }
}

fn unit(rng: &mut OsRng) -> Real {
    rng.next_u32() as Real / u32::MAX as Real
}

/// Uniform unit quaternion sampling (Shoemake's subgroup method).
fn random_unit_quaternion(rng: &mut OsRng) -> (Real, Real, Real, Real) {
    let u1 = unit(rng);
    let u2 = unit(rng);
    let u3 = unit(rng);
    let q1 = (1.0 - u1).sqrt();
    let q2 = u1.sqrt();
    let theta1 = 2.0 * std::f32::consts::PI * u2;
    let theta2 = 2.0 * std::f32::consts::PI * u3;
    let w = q1 * theta1.cos();
    let x = q1 * theta1.sin();
    let y = q2 * theta2.cos();
    let z = q2 * theta2.sin();
    (w, x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resting_die() -> DieBody {
        let mut rng = OsRng;
        let mut die = DieBody::spawn(0, &mut rng);
        die.position = Point3::new(0.0, DIE_HALF_EXTENT, 0.0);
        die.orientation = UnitQuaternion::identity();
        die.velocity = Vector3::zeros();
        die.angular_velocity = Vector3::zeros();
        die
    }

    #[test]
    fn test_opposite_faces_sum_to_seven() {
        for pair in FACE_VALUES.chunks(2) {
            assert_eq!(pair[0] + pair[1], 7);
        }
    }

    #[test]
    fn test_identity_orientation_resolves_plus_y() {
        // no rotation: the +Y slot (index 2 of the canonical table) is up
        let die = resting_die();
        assert_eq!(die.up_value(), FACE_VALUES[2]);
        assert_eq!(die.up_value(), 2);
    }

    #[test]
    fn test_up_value_pure_in_orientation() {
        let mut rng = OsRng;
        for _ in 0..32 {
            let die = DieBody::spawn(0, &mut rng);
            let copy = die.clone();
            assert_eq!(die.up_value(), copy.up_value());
            assert_eq!(die.up_value(), die.up_value());
        }
    }

    #[test]
    fn test_up_value_always_a_pip() {
        let mut rng = OsRng;
        for _ in 0..64 {
            let die = DieBody::spawn(0, &mut rng);
            let v = die.up_value();
            assert!((1..=6).contains(&v), "got {}", v);
        }
    }

    #[test]
    fn test_quarter_turn_about_x_lifts_minus_z() {
        // Rx(90 deg) maps local -Z onto world +Y
        let mut die = resting_die();
        die.orientation =
            UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::FRAC_PI_2);
        assert_eq!(die.up_value(), FACE_VALUES[5]);
    }

    #[test]
    fn test_spawn_staggers_height() {
        let mut rng = OsRng;
        let a = DieBody::spawn(0, &mut rng);
        let b = DieBody::spawn(1, &mut rng);
        let c = DieBody::spawn(2, &mut rng);
        assert_eq!(a.position.y, 5.0);
        assert_eq!(b.position.y, 9.0);
        assert_eq!(c.position.y, 13.0);
        for die in [&a, &b, &c] {
            assert!(die.position.x > -3.0 && die.position.x < 3.0);
            assert!(die.position.z > -3.0 && die.position.z < 3.0);
        }
    }

    #[test]
    fn test_spawn_orientation_is_unit() {
        let mut rng = OsRng;
        for _ in 0..16 {
            let die = DieBody::spawn(0, &mut rng);
            let n = die.orientation.quaternion().norm();
            assert!((n - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_corners_span_the_cube() {
        let die = resting_die();
        let corners = die.corners();
        let min_y = corners.iter().map(|c| c.y).fold(Real::INFINITY, Real::min);
        let max_y = corners
            .iter()
            .map(|c| c.y)
            .fold(Real::NEG_INFINITY, Real::max);
        assert!((min_y - 0.0).abs() < 1e-5);
        assert!((max_y - 2.0 * DIE_HALF_EXTENT).abs() < 1e-5);
    }
}
