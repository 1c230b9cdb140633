//! Spatial motion vectors (twists).

use nalgebra::{Vector3, Vector6};

use crate::force::Force;
use crate::transform::{SpatialAction, SpatialTransform};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Spatial motion `[ω; v]`: angular velocity and the linear velocity of the
/// point at the frame origin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Motion {
    /// Angular part ω.
    pub angular: Vector3<f64>,
    /// Linear part v.
    pub linear: Vector3<f64>,
}

impl Motion {
    /// Create a motion from its angular and linear parts.
    #[must_use]
    pub fn new(angular: Vector3<f64>, linear: Vector3<f64>) -> Self {
        Self { angular, linear }
    }

    /// Zero motion.
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

    /// Power pairing with a force: `ω·n + v·f`.
    #[must_use]
    pub fn dot(&self, f: &Force) -> f64 {
        self.angular.dot(&f.angular) + self.linear.dot(&f.linear)
    }

    /// Spatial cross product for motions: `self × m`.
    #[must_use]
    pub fn cross_motion(&self, m: &Motion) -> Motion {
        Motion::new(
            self.angular.cross(&m.angular),
            self.angular.cross(&m.linear) + self.linear.cross(&m.angular),
        )
    }

    /// Spatial cross product for forces: `self ×* f`.
    #[must_use]
    pub fn cross_force(&self, f: &Force) -> Force {
        Force::new(
            self.angular.cross(&f.angular) + self.linear.cross(&f.linear),
            self.angular.cross(&f.linear),
        )
    }

    /// Whether every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.angular.iter().chain(self.linear.iter()).all(|v| v.is_finite())
    }
}

impl SpatialAction for Motion {
    /// `ω_a = R ω`, `v_a = R v + t × (R ω)`.
    fn act_by(&self, m: &SpatialTransform) -> Self {
        let angular = m.rotation * self.angular;
        let linear = m.rotation * self.linear + m.translation.cross(&angular);
        Self::new(angular, linear)
    }

    fn act_inverse_by(&self, m: &SpatialTransform) -> Self {
        let rt = m.rotation.inverse();
        Self::new(
            rt * self.angular,
            rt * (self.linear - m.translation.cross(&self.angular)),
        )
    }
}

impl std::ops::Add for Motion {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.angular + rhs.angular, self.linear + rhs.linear)
    }
}

impl std::ops::AddAssign for Motion {
    fn add_assign(&mut self, rhs: Self) {
        self.angular += rhs.angular;
        self.linear += rhs.linear;
    }
}

impl std::ops::Sub for Motion {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.angular - rhs.angular, self.linear - rhs.linear)
    }
}

impl std::ops::Neg for Motion {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.angular, -self.linear)
    }
}

impl std::ops::Mul<f64> for Motion {
    type Output = Self;

    fn mul(self, s: f64) -> Self {
        Self::new(self.angular * s, self.linear * s)
    }
}

impl std::fmt::Display for Motion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "w = [{:.6} {:.6} {:.6}]  v = [{:.6} {:.6} {:.6}]",
            self.angular.x, self.angular.y, self.angular.z, self.linear.x, self.linear.y, self.linear.z
        )
    }
}
