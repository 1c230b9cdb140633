//! Joint models and the capability interface the tree algorithms consume.
//!
//! Every joint kind exposes the same small capability set through
//! [`JointCapability`]: its configuration and velocity dimensions, the
//! placement it produces for a given configuration, and the columns of its
//! motion subspace `S` (expressed in the joint's output frame). CRBA, the
//! kinematics pass and the Jacobians only ever talk to that trait; the
//! concrete kind is chosen once when a body is added to the model.

use nalgebra::{Quaternion, Rotation3, Unit, UnitQuaternion, Vector3};
use sim_spatial::{Motion, SpatialTransform};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Capability set shared by all joint kinds.
pub trait JointCapability {
    /// Number of configuration coordinates (nq contribution).
    fn nq(&self) -> usize;

    /// Number of velocity coordinates / DOFs (nv contribution).
    fn nv(&self) -> usize;

    /// Displacement of the joint output frame relative to its input frame.
    ///
    /// `q` holds exactly `nq()` coordinates.
    fn joint_transform(&self, q: &[f64]) -> SpatialTransform;

    /// Column `k < nv()` of the motion subspace, in the joint output frame.
    fn subspace_column(&self, k: usize) -> Motion;

    /// Write the neutral configuration into `q` (length `nq()`).
    fn neutral(&self, q: &mut [f64]);
}

/// Welded joint: no degrees of freedom. Also used for the universe body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fixed;

impl JointCapability for Fixed {
    fn nq(&self) -> usize {
        0
    }

    fn nv(&self) -> usize {
        0
    }

    fn joint_transform(&self, _q: &[f64]) -> SpatialTransform {
        SpatialTransform::identity()
    }

    fn subspace_column(&self, _k: usize) -> Motion {
        Motion::zero()
    }

    fn neutral(&self, _q: &mut [f64]) {}
}

/// Revolute joint: rotation by `q[0]` radians about a unit axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Revolute {
    /// Rotation axis in the joint frame.
    pub axis: Unit<Vector3<f64>>,
}

impl Revolute {
    /// Revolute joint about an arbitrary axis (normalized here).
    #[must_use]
    pub fn new(axis: Vector3<f64>) -> Self {
        Self {
            axis: Unit::new_normalize(axis),
        }
    }

    /// Revolute joint about x.
    #[must_use]
    pub fn x() -> Self {
        Self { axis: Vector3::x_axis() }
    }

    /// Revolute joint about y.
    #[must_use]
    pub fn y() -> Self {
        Self { axis: Vector3::y_axis() }
    }

    /// Revolute joint about z.
    #[must_use]
    pub fn z() -> Self {
        Self { axis: Vector3::z_axis() }
    }
}

impl JointCapability for Revolute {
    fn nq(&self) -> usize {
        1
    }

    fn nv(&self) -> usize {
        1
    }

    fn joint_transform(&self, q: &[f64]) -> SpatialTransform {
        SpatialTransform::from_rotation(Rotation3::from_axis_angle(&self.axis, q[0]))
    }

    fn subspace_column(&self, _k: usize) -> Motion {
        Motion::new(self.axis.into_inner(), Vector3::zeros())
    }

    fn neutral(&self, q: &mut [f64]) {
        q[0] = 0.0;
    }
}

/// Prismatic joint: translation by `q[0]` along a unit axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Prismatic {
    /// Sliding axis in the joint frame.
    pub axis: Unit<Vector3<f64>>,
}

impl Prismatic {
    /// Prismatic joint along an arbitrary axis (normalized here).
    #[must_use]
    pub fn new(axis: Vector3<f64>) -> Self {
        Self {
            axis: Unit::new_normalize(axis),
        }
    }
}

impl JointCapability for Prismatic {
    fn nq(&self) -> usize {
        1
    }

    fn nv(&self) -> usize {
        1
    }

    fn joint_transform(&self, q: &[f64]) -> SpatialTransform {
        SpatialTransform::from_translation(self.axis.into_inner() * q[0])
    }

    fn subspace_column(&self, _k: usize) -> Motion {
        Motion::new(Vector3::zeros(), self.axis.into_inner())
    }

    fn neutral(&self, q: &mut [f64]) {
        q[0] = 0.0;
    }
}

/// Spherical joint: orientation as a quaternion `(w, x, y, z)`, velocity as
/// the angular velocity in the output frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Spherical;

impl JointCapability for Spherical {
    fn nq(&self) -> usize {
        4
    }

    fn nv(&self) -> usize {
        3
    }

    fn joint_transform(&self, q: &[f64]) -> SpatialTransform {
        SpatialTransform::from_quaternion(&quaternion_wxyz(&q[0..4]), Vector3::zeros())
    }

    fn subspace_column(&self, k: usize) -> Motion {
        let mut angular = Vector3::zeros();
        angular[k] = 1.0;
        Motion::new(angular, Vector3::zeros())
    }

    fn neutral(&self, q: &mut [f64]) {
        q[..4].copy_from_slice(&[1.0, 0.0, 0.0, 0.0]);
    }
}

/// Free-flyer joint: position `(x, y, z)` then quaternion `(w, x, y, z)`;
/// velocity `[v; ω]` in the output frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FreeFlyer;

impl JointCapability for FreeFlyer {
    fn nq(&self) -> usize {
        7
    }

    fn nv(&self) -> usize {
        6
    }

    fn joint_transform(&self, q: &[f64]) -> SpatialTransform {
        SpatialTransform::from_quaternion(
            &quaternion_wxyz(&q[3..7]),
            Vector3::new(q[0], q[1], q[2]),
        )
    }

    fn subspace_column(&self, k: usize) -> Motion {
        let mut unit = Vector3::zeros();
        unit[k % 3] = 1.0;
        if k < 3 {
            Motion::new(Vector3::zeros(), unit)
        } else {
            Motion::new(unit, Vector3::zeros())
        }
    }

    fn neutral(&self, q: &mut [f64]) {
        q[..7].copy_from_slice(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
    }
}

fn quaternion_wxyz(q: &[f64]) -> UnitQuaternion<f64> {
    UnitQuaternion::from_quaternion(Quaternion::new(q[0], q[1], q[2], q[3]))
}

/// Joint kind attached to a body, chosen once when the body is added.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointModel {
    /// No degrees of freedom.
    Fixed(Fixed),
    /// 1 DOF rotation.
    Revolute(Revolute),
    /// 1 DOF translation.
    Prismatic(Prismatic),
    /// 3 DOF rotation.
    Spherical(Spherical),
    /// 6 DOF floating base.
    FreeFlyer(FreeFlyer),
}

impl Default for JointModel {
    fn default() -> Self {
        Self::Fixed(Fixed)
    }
}

impl JointModel {
    fn capability(&self) -> &dyn JointCapability {
        match self {
            Self::Fixed(j) => j,
            Self::Revolute(j) => j,
            Self::Prismatic(j) => j,
            Self::Spherical(j) => j,
            Self::FreeFlyer(j) => j,
        }
    }

    /// Short name of the joint kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fixed(_) => "fixed",
            Self::Revolute(_) => "revolute",
            Self::Prismatic(_) => "prismatic",
            Self::Spherical(_) => "spherical",
            Self::FreeFlyer(_) => "free-flyer",
        }
    }
}

impl JointCapability for JointModel {
    #[inline]
    fn nq(&self) -> usize {
        self.capability().nq()
    }

    #[inline]
    fn nv(&self) -> usize {
        self.capability().nv()
    }

    #[inline]
    fn joint_transform(&self, q: &[f64]) -> SpatialTransform {
        self.capability().joint_transform(q)
    }

    #[inline]
    fn subspace_column(&self, k: usize) -> Motion {
        self.capability().subspace_column(k)
    }

    #[inline]
    fn neutral(&self, q: &mut [f64]) {
        self.capability().neutral(q);
    }
}

impl From<Fixed> for JointModel {
    fn from(j: Fixed) -> Self {
        Self::Fixed(j)
    }
}

impl From<Revolute> for JointModel {
    fn from(j: Revolute) -> Self {
        Self::Revolute(j)
    }
}

impl From<Prismatic> for JointModel {
    fn from(j: Prismatic) -> Self {
        Self::Prismatic(j)
    }
}

impl From<Spherical> for JointModel {
    fn from(j: Spherical) -> Self {
        Self::Spherical(j)
    }
}

impl From<FreeFlyer> for JointModel {
    fn from(j: FreeFlyer) -> Self {
        Self::FreeFlyer(j)
    }
}
