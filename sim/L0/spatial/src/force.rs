//! Spatial force vectors (wrenches).

use nalgebra::{Vector3, Vector6};

use crate::motion::Motion;
use crate::transform::{SpatialAction, SpatialTransform};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Spatial force `[n; f]`: moment about the frame origin and linear force.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Force {
    /// Angular part n (moment about the frame origin).
    pub angular: Vector3<f64>,
    /// Linear part f.
    pub linear: Vector3<f64>,
}

impl Force {
    /// Create a force from its angular and linear parts.
    #[must_use]
    pub fn new(angular: Vector3<f64>, linear: Vector3<f64>) -> Self {
        Self { angular, linear }
    }

    /// Zero force.
    #[must_use]
    pub fn zero() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }

    /// Build from an angular-first 6-vector.
    #[must_use]
    pub fn from_vector(v: &Vector6<f64>) -> Self {
        Self::new(
            Vector3::new(v[0], v[1], v[2]),
            Vector3::new(v[3], v[4], v[5]),
        )
    }

    /// Angular-first 6-vector.
    #[must_use]
    pub fn to_vector(&self) -> Vector6<f64> {
        Vector6::new(
            self.angular.x,
            self.angular.y,
            self.angular.z,
            self.linear.x,
            self.linear.y,
            self.linear.z,
        )
    }

    /// Power pairing with a motion.
    #[must_use]
    pub fn dot(&self, m: &Motion) -> f64 {
        m.dot(self)
    }

    /// Whether every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.angular.iter().chain(self.linear.iter()).all(|v| v.is_finite())
    }
}

impl SpatialAction for Force {
    /// `f_a = R f`, `n_a = R n + t × (R f)`.
    fn act_by(&self, m: &SpatialTransform) -> Self {
        let linear = m.rotation * self.linear;
        let angular = m.rotation * self.angular + m.translation.cross(&linear);
        Self::new(angular, linear)
    }

    fn act_inverse_by(&self, m: &SpatialTransform) -> Self {
        let rt = m.rotation.inverse();
        Self::new(
            rt * (self.angular - m.translation.cross(&self.linear)),
            rt * self.linear,
        )
    }
}

impl std::ops::Add for Force {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.angular + rhs.angular, self.linear + rhs.linear)
    }
}

impl std::ops::AddAssign for Force {
    fn add_assign(&mut self, rhs: Self) {
        self.angular += rhs.angular;
        self.linear += rhs.linear;
    }
}

impl std::ops::Sub for Force {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.angular - rhs.angular, self.linear - rhs.linear)
    }
}

impl std::ops::Neg for Force {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.angular, -self.linear)
    }
}

impl std::ops::Mul<f64> for Force {
    type Output = Self;

    fn mul(self, s: f64) -> Self {
        Self::new(self.angular * s, self.linear * s)
    }
}

impl std::fmt::Display for Force {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n = [{:.6} {:.6} {:.6}]  f = [{:.6} {:.6} {:.6}]",
            self.angular.x, self.angular.y, self.angular.z, self.linear.x, self.linear.y, self.linear.z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Rotation3;

    #[test]
    fn test_act_matches_inverse_transpose_of_motion_action() {
        let m = SpatialTransform::new(
            Rotation3::from_euler_angles(-0.3, 0.8, 0.2),
            Vector3::new(0.2, -1.5, 1.0),
        );
        let f = Force::new(Vector3::new(0.5, 1.0, -1.0), Vector3::new(2.0, 0.0, 3.0));
        let x = m.action_matrix();
        let x_star = x.try_inverse().map(|xi| xi.transpose());
        assert!(x_star.is_some());
        if let Some(x_star) = x_star {
            assert_relative_eq!(f.act_by(&m).to_vector(), x_star * f.to_vector(), epsilon = 1e-10);
        }
    }

    #[test]
    fn test_lever_arm_moment() {
        // A unit force along y applied at b's origin, seen from a where b sits at +x.
        let m = SpatialTransform::from_translation(Vector3::new(1.0, 0.0, 0.0));
        let f = Force::new(Vector3::zeros(), Vector3::y());
        let fa = m.act(&f);
        assert_relative_eq!(fa.linear, Vector3::y(), epsilon = 1e-15);
        assert_relative_eq!(fa.angular, Vector3::z(), epsilon = 1e-15);
    }

    #[test]
    fn test_power_is_frame_invariant() {
        let m = SpatialTransform::new(
            Rotation3::from_euler_angles(1.2, -0.4, 0.6),
            Vector3::new(-0.3, 0.7, 2.2),
        );
        let f = Force::new(Vector3::new(1.0, -2.0, 0.5), Vector3::new(0.3, 0.3, -1.0));
        let v = Motion::new(Vector3::new(-0.6, 0.1, 0.9), Vector3::new(1.5, -0.2, 0.4));
        assert_relative_eq!(f.act_by(&m).dot(&v), f.dot(&v.act_inverse_by(&m)), epsilon = 1e-12);
        assert_relative_eq!(f.act_by(&m).dot(&v.act_by(&m)), f.dot(&v), epsilon = 1e-12);
    }
}
