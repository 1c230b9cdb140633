//! Spatial rigid-body inertia.
//!
//! Stored in the compact `(mass, lever, I_c)` form: total mass, centre of
//! mass expressed in the body frame, and the rotational inertia about the
//! centre of mass in body-frame axes. The 6x6 matrix about the frame origin
//! is assembled on demand by [`Inertia::matrix`].

use nalgebra::{Matrix3, Matrix6, Vector3};

use crate::force::Force;
use crate::motion::Motion;
use crate::transform::{SpatialAction, SpatialTransform};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Spatial inertia of a rigid body (or of a set of rigidly fused bodies).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Inertia {
    /// Total mass.
    pub mass: f64,
    /// Centre of mass in the frame the inertia is expressed in.
    pub lever: Vector3<f64>,
    /// Rotational inertia about the centre of mass (symmetric).
    pub rotational: Matrix3<f64>,
}

impl Default for Inertia {
    fn default() -> Self {
        Self::zero()
    }
}

impl Inertia {
    /// Create an inertia from mass, centre of mass and rotational inertia about it.
    #[must_use]
    pub fn new(mass: f64, lever: Vector3<f64>, rotational: Matrix3<f64>) -> Self {
        Self {
            mass,
            lever,
            rotational,
        }
    }

    /// Inertia of nothing.
    #[must_use]
    pub fn zero() -> Self {
        Self::new(0.0, Vector3::zeros(), Matrix3::zeros())
    }

    /// Unit mass at the origin with identity rotational inertia.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(1.0, Vector3::zeros(), Matrix3::identity())
    }

    /// Inertia with every entry NaN (unwritten workspace sentinel).
    #[must_use]
    pub fn nan() -> Self {
        Self::new(
            f64::NAN,
            Vector3::from_element(f64::NAN),
            Matrix3::from_element(f64::NAN),
        )
    }

    /// Point mass located at `lever`.
    #[must_use]
    pub fn point_mass(mass: f64, lever: Vector3<f64>) -> Self {
        Self::new(mass, lever, Matrix3::zeros())
    }

    /// Solid sphere of the given radius centred at `lever`.
    #[must_use]
    pub fn from_sphere(mass: f64, radius: f64, lever: Vector3<f64>) -> Self {
        let i = 0.4 * mass * radius * radius;
        Self::new(mass, lever, Matrix3::from_diagonal_element(i))
    }

    /// Solid box with full side lengths `(x, y, z)` centred at `lever`.
    #[must_use]
    pub fn from_box(mass: f64, size: Vector3<f64>, lever: Vector3<f64>) -> Self {
        let (x2, y2, z2) = (size.x * size.x, size.y * size.y, size.z * size.z);
        let k = mass / 12.0;
        Self::new(
            mass,
            lever,
            Matrix3::from_diagonal(&Vector3::new(k * (y2 + z2), k * (x2 + z2), k * (x2 + y2))),
        )
    }

    /// Solid cylinder of given radius and length, axis along z, centred at `lever`.
    #[must_use]
    pub fn from_cylinder(mass: f64, radius: f64, length: f64, lever: Vector3<f64>) -> Self {
        let r2 = radius * radius;
        let side = mass * (3.0 * r2 + length * length) / 12.0;
        Self::new(
            mass,
            lever,
            Matrix3::from_diagonal(&Vector3::new(side, side, 0.5 * mass * r2)),
        )
    }

    /// 6x6 spatial inertia about the frame origin, angular-first:
    ///
    /// ```text
    /// I = [ I_c + m (|c|² I₃ - c cᵀ)   m [c]x ]
    ///     [ m [c]xᵀ                    m I₃   ]
    /// ```
    #[must_use]
    pub fn matrix(&self) -> Matrix6<f64> {
        let m = self.mass;
        let c = self.lever;
        let skew_mc = (c * m).cross_matrix();
        let about_origin = self.rotational + (Matrix3::identity() * c.norm_squared() - c * c.transpose()) * m;

        let mut out = Matrix6::zeros();
        out.fixed_view_mut::<3, 3>(0, 0).copy_from(&about_origin);
        out.fixed_view_mut::<3, 3>(0, 3).copy_from(&skew_mc);
        out.fixed_view_mut::<3, 3>(3, 0).copy_from(&skew_mc.transpose());
        out.fixed_view_mut::<3, 3>(3, 3).copy_from(&Matrix3::from_diagonal_element(m));
        out
    }

    /// Momentum produced by a motion: `f = m (v - c × ω)`, `n = I_c ω + c × f`.
    #[must_use]
    pub fn apply(&self, v: &Motion) -> Force {
        let linear = (v.linear - self.lever.cross(&v.angular)) * self.mass;
        let angular = self.rotational * v.angular + self.lever.cross(&linear);
        Force::new(angular, linear)
    }

    /// Kinetic energy `½ vᵀ I v` of the body moving with `v`.
    #[must_use]
    pub fn kinetic_energy(&self, v: &Motion) -> f64 {
        0.5 * v.dot(&self.apply(v))
    }

    /// Whether every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.mass.is_finite()
            && self.lever.iter().all(|v| v.is_finite())
            && self.rotational.iter().all(|v| v.is_finite())
    }

    /// Component-wise comparison of the 6x6 matrices within `eps`.
    #[must_use]
    pub fn is_approx(&self, other: &Self, eps: f64) -> bool {
        (self.matrix() - other.matrix()).amax() <= eps
    }
}

impl SpatialAction for Inertia {
    /// Mass unchanged, `c_a = R c + t`, `I_a = R I_c Rᵀ`.
    fn act_by(&self, m: &SpatialTransform) -> Self {
        let r = m.rotation.matrix();
        Self::new(
            self.mass,
            m.rotation * self.lever + m.translation,
            r * self.rotational * r.transpose(),
        )
    }

    fn act_inverse_by(&self, m: &SpatialTransform) -> Self {
        let r = m.rotation.matrix();
        Self::new(
            self.mass,
            m.rotation.inverse() * (self.lever - m.translation),
            r.transpose() * self.rotational * r,
        )
    }
}

impl std::ops::Add for Inertia {
    type Output = Self;

    /// Fuse two inertias expressed in the same frame.
    #[allow(clippy::float_cmp)]
    fn add(self, rhs: Self) -> Self {
        let mass = self.mass + rhs.mass;
        if mass == 0.0 {
            return Self::new(0.0, Vector3::zeros(), self.rotational + rhs.rotational);
        }
        let lever = (self.lever * self.mass + rhs.lever * rhs.mass) / mass;
        let d = self.lever - rhs.lever;
        let coupling = (Matrix3::identity() * d.norm_squared() - d * d.transpose())
            * (self.mass * rhs.mass / mass);
        Self::new(mass, lever, self.rotational + rhs.rotational + coupling)
    }
}

impl std::ops::AddAssign for Inertia {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::Mul<&Motion> for &Inertia {
    type Output = Force;

    fn mul(self, v: &Motion) -> Force {
        self.apply(v)
    }
}

impl std::fmt::Display for Inertia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  m = {:.6}", self.mass)?;
        writeln!(
            f,
            "  c = {:.6} {:.6} {:.6}",
            self.lever.x, self.lever.y, self.lever.z
        )?;
        write!(f, "  I = {}", self.rotational)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Rotation3;

    fn body() -> Inertia {
        Inertia::new(
            2.5,
            Vector3::new(0.1, -0.3, 0.4),
            Matrix3::new(0.6, 0.05, 0.0, 0.05, 0.4, -0.02, 0.0, -0.02, 0.3),
        )
    }

    fn transform() -> SpatialTransform {
        SpatialTransform::new(
            Rotation3::from_euler_angles(0.5, -0.2, 1.4),
            Vector3::new(-1.0, 0.3, 0.8),
        )
    }

    #[test]
    fn test_matrix_is_symmetric_positive_definite() {
        let i = body().matrix();
        assert_relative_eq!(i, i.transpose(), epsilon = 1e-14);
        assert!(i.cholesky().is_some());
    }

    #[test]
    fn test_apply_matches_matrix() {
        let y = body();
        let v = Motion::new(Vector3::new(0.3, 1.0, -0.5), Vector3::new(-2.0, 0.1, 0.7));
        assert_relative_eq!(y.apply(&v).to_vector(), y.matrix() * v.to_vector(), epsilon = 1e-12);
    }

    #[test]
    fn test_act_is_congruence() {
        // I_a = X^-T I_b X^-1
        let y = body();
        let m = transform();
        let x_inv = m.inverse().action_matrix();
        let expected = x_inv.transpose() * y.matrix() * x_inv;
        assert_relative_eq!(y.act_by(&m).matrix(), expected, epsilon = 1e-12);
        assert_relative_eq!(y.act_by(&m).act_inverse_by(&m).matrix(), y.matrix(), epsilon = 1e-12);
    }

    #[test]
    fn test_add_matches_matrix_sum() {
        let a = body();
        let b = Inertia::from_box(1.2, Vector3::new(0.2, 0.4, 0.1), Vector3::new(-0.5, 0.2, 0.0));
        assert_relative_eq!((a + b).matrix(), a.matrix() + b.matrix(), epsilon = 1e-12);
    }

    #[test]
    fn test_add_zero_mass() {
        let rotor = Inertia::new(0.0, Vector3::zeros(), Matrix3::from_diagonal_element(0.1));
        let sum = rotor + Inertia::zero();
        assert_relative_eq!(sum.matrix(), rotor.matrix(), epsilon = 1e-15);
        let sum = body() + Inertia::zero();
        assert_relative_eq!(sum.matrix(), body().matrix(), epsilon = 1e-14);
    }

    #[test]
    fn test_kinetic_energy_of_translation() {
        let y = Inertia::from_sphere(3.0, 0.2, Vector3::new(1.0, 0.0, 0.0));
        let v = Motion::new(Vector3::zeros(), Vector3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(y.kinetic_energy(&v), 0.5 * 3.0 * 4.0, epsilon = 1e-12);
    }
}
