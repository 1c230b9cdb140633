//! Rigid displacements between frames and their action on spatial quantities.
//!
//! A [`SpatialTransform`] `aMb` maps coordinates expressed in frame `b` into
//! frame `a`: a point `p_b` becomes `p_a = R * p_b + t`. The same transform
//! moves motions, forces and inertias from `b` to `a` through
//! [`SpatialAction`].

use nalgebra::{Isometry3, Matrix3, Matrix4, Matrix6, Rotation3, Translation3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A quantity that can be re-expressed in another frame by a rigid displacement.
///
/// `q.act_by(&m)` takes `q` expressed in frame `b` and returns it expressed in
/// frame `a` when `m = aMb`. `act_inverse_by` is the exact algebraic inverse,
/// so `q.act_by(&m).act_inverse_by(&m) == q` up to rounding.
pub trait SpatialAction: Sized {
    /// Express `self` (given in frame `b`) in frame `a`, where `m = aMb`.
    #[must_use]
    fn act_by(&self, m: &SpatialTransform) -> Self;

    /// Express `self` (given in frame `a`) in frame `b`, where `m = aMb`.
    #[must_use]
    fn act_inverse_by(&self, m: &SpatialTransform) -> Self;
}

/// Rigid displacement: rotation followed by translation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpatialTransform {
    /// Orientation of frame `b` axes in frame `a`.
    pub rotation: Rotation3<f64>,
    /// Origin of frame `b` expressed in frame `a`.
    pub translation: Vector3<f64>,
}

impl Default for SpatialTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl SpatialTransform {
    /// Create a transform from its rotation and translation.
    #[must_use]
    pub fn new(rotation: Rotation3<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Identity displacement.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(Rotation3::identity(), Vector3::zeros())
    }

    /// Pure translation.
    #[must_use]
    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self::new(Rotation3::identity(), translation)
    }

    /// Pure rotation.
    #[must_use]
    pub fn from_rotation(rotation: Rotation3<f64>) -> Self {
        Self::new(rotation, Vector3::zeros())
    }

    /// Rotation given as a unit quaternion plus a translation.
    #[must_use]
    pub fn from_quaternion(quat: &UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self::new(quat.to_rotation_matrix(), translation)
    }

    /// Transform with every entry set to NaN.
    ///
    /// Used to fill workspace buffers at allocation so that a read before the
    /// first write shows up as NaN instead of stale data.
    #[must_use]
    pub fn nan() -> Self {
        Self::new(
            Rotation3::from_matrix_unchecked(Matrix3::from_element(f64::NAN)),
            Vector3::from_element(f64::NAN),
        )
    }

    /// Compose two displacements: `aMc = aMb * bMc`.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self::new(
            self.rotation * other.rotation,
            self.translation + self.rotation * other.translation,
        )
    }

    /// Inverse displacement: `bMa` from `aMb`.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let rt = self.rotation.inverse();
        Self::new(rt, -(rt * self.translation))
    }

    /// Act on a spatial quantity (frame `b` to frame `a`).
    #[must_use]
    pub fn act<Q: SpatialAction>(&self, quantity: &Q) -> Q {
        quantity.act_by(self)
    }

    /// Inverse action on a spatial quantity (frame `a` to frame `b`).
    #[must_use]
    pub fn act_inverse<Q: SpatialAction>(&self, quantity: &Q) -> Q {
        quantity.act_inverse_by(self)
    }

    /// Map a point from frame `b` into frame `a`.
    #[must_use]
    pub fn transform_point(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * p + self.translation
    }

    /// Map a point from frame `a` into frame `b`.
    #[must_use]
    pub fn inverse_transform_point(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.inverse() * (p - self.translation)
    }

    /// 4x4 homogeneous matrix.
    #[must_use]
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        let mut h = self.rotation.to_homogeneous();
        h.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.translation);
        h
    }

    /// 6x6 motion action matrix in angular-first layout.
    ///
    /// ```text
    /// X = [ R      0 ]
    ///     [ [t]x R R ]
    /// ```
    ///
    /// The force action matrix is `X^-T`.
    #[must_use]
    pub fn action_matrix(&self) -> Matrix6<f64> {
        let r = self.rotation.matrix();
        let tr = self.translation.cross_matrix() * r;
        let mut x = Matrix6::zeros();
        x.fixed_view_mut::<3, 3>(0, 0).copy_from(r);
        x.fixed_view_mut::<3, 3>(3, 3).copy_from(r);
        x.fixed_view_mut::<3, 3>(3, 0).copy_from(&tr);
        x
    }

    /// Whether every component is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.rotation.matrix().iter().all(|v| v.is_finite())
            && self.translation.iter().all(|v| v.is_finite())
    }

    /// Component-wise comparison within `eps`.
    #[must_use]
    pub fn is_approx(&self, other: &Self, eps: f64) -> bool {
        (self.rotation.matrix() - other.rotation.matrix()).amax() <= eps
            && (self.translation - other.translation).amax() <= eps
    }
}

impl std::ops::Mul for SpatialTransform {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.compose(&rhs)
    }
}

impl std::ops::Mul<&SpatialTransform> for &SpatialTransform {
    type Output = SpatialTransform;

    fn mul(self, rhs: &SpatialTransform) -> SpatialTransform {
        self.compose(rhs)
    }
}

impl From<Isometry3<f64>> for SpatialTransform {
    fn from(iso: Isometry3<f64>) -> Self {
        Self::from_quaternion(&iso.rotation, iso.translation.vector)
    }
}

impl From<SpatialTransform> for Isometry3<f64> {
    fn from(m: SpatialTransform) -> Self {
        Self::from_parts(
            Translation3::from(m.translation),
            UnitQuaternion::from_rotation_matrix(&m.rotation),
        )
    }
}

impl std::fmt::Display for SpatialTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  R =")?;
        write!(f, "{}", self.rotation.matrix())?;
        writeln!(
            f,
            "  p = {:.6} {:.6} {:.6}",
            self.translation.x, self.translation.y, self.translation.z
        )
    }
}
