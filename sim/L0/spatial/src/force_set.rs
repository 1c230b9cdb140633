//! Batches of spatial forces stored as paired 3xN blocks.
//!
//! A [`ForceSet`] holds one force per column: the linear parts in one 3xN
//! block and the angular parts in another. CRBA uses one set per body to hold
//! the momentum columns of every joint in that body's subtree. Contiguous
//! column ranges are addressed through [`ForceSetSlice`] (read) and
//! [`ForceSetSliceMut`] (write-through) views so partial subtree results can
//! be moved between sets without copying whole sets.

use nalgebra::{Matrix3xX, Matrix6xX};

use crate::error::SpatialError;
use crate::force::Force;
use crate::transform::{SpatialAction, SpatialTransform};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// N spatial forces, column-major.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ForceSet {
    linear: Matrix3xX<f64>,
    angular: Matrix3xX<f64>,
}

impl ForceSet {
    /// Allocate `ncols` columns filled with NaN.
    #[must_use]
    pub fn new(ncols: usize) -> Self {
        Self {
            linear: Matrix3xX::from_element(ncols, f64::NAN),
            angular: Matrix3xX::from_element(ncols, f64::NAN),
        }
    }

    /// Allocate `ncols` zero columns.
    #[must_use]
    pub fn zeros(ncols: usize) -> Self {
        Self {
            linear: Matrix3xX::zeros(ncols),
            angular: Matrix3xX::zeros(ncols),
        }
    }

    /// Build from separate linear and angular blocks.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::ShapeMismatch`] if the blocks have different
    /// column counts.
    pub fn from_blocks(linear: Matrix3xX<f64>, angular: Matrix3xX<f64>) -> Result<Self, SpatialError> {
        if linear.ncols() != angular.ncols() {
            return Err(SpatialError::shape_mismatch(
                "ForceSet::from_blocks",
                linear.ncols(),
                angular.ncols(),
            ));
        }
        Ok(Self { linear, angular })
    }

    /// Build from a list of forces.
    #[must_use]
    pub fn from_forces(forces: &[Force]) -> Self {
        let mut set = Self::zeros(forces.len());
        for (k, f) in forces.iter().enumerate() {
            set.set_column(k, f);
        }
        set
    }

    /// Number of force columns.
    #[must_use]
    pub fn ncols(&self) -> usize {
        self.linear.ncols()
    }

    /// Whether the set holds no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ncols() == 0
    }

    /// Linear block (3 x N).
    #[must_use]
    pub fn linear(&self) -> &Matrix3xX<f64> {
        &self.linear
    }

    /// Angular block (3 x N).
    #[must_use]
    pub fn angular(&self) -> &Matrix3xX<f64> {
        &self.angular
    }

    /// Force stored in column `k`.
    ///
    /// # Panics
    ///
    /// Panics if `k >= ncols()`.
    #[must_use]
    pub fn column(&self, k: usize) -> Force {
        Force::new(self.angular.column(k).into_owned(), self.linear.column(k).into_owned())
    }

    /// Overwrite column `k`.
    ///
    /// # Panics
    ///
    /// Panics if `k >= ncols()`.
    pub fn set_column(&mut self, k: usize, f: &Force) {
        self.linear.set_column(k, &f.linear);
        self.angular.set_column(k, &f.angular);
    }

    /// Set every entry to `value`.
    pub fn fill(&mut self, value: f64) {
        self.linear.fill(value);
        self.angular.fill(value);
    }

    /// 6 x N matrix, angular rows first.
    #[must_use]
    pub fn to_matrix(&self) -> Matrix6xX<f64> {
        let mut out = Matrix6xX::zeros(self.ncols());
        out.fixed_rows_mut::<3>(0).copy_from(&self.angular);
        out.fixed_rows_mut::<3>(3).copy_from(&self.linear);
        out
    }

    /// Whether every entry is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.linear.iter().chain(self.angular.iter()).all(|v| v.is_finite())
    }

    /// Read-only view over columns `offset..offset + len`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::ShapeMismatch`] if the range exceeds the set.
    pub fn slice(&self, offset: usize, len: usize) -> Result<ForceSetSlice<'_>, SpatialError> {
        check_range("ForceSet::slice", self.ncols(), offset, len)?;
        Ok(ForceSetSlice {
            set: self,
            offset,
            len,
        })
    }

    /// Write-through view over columns `offset..offset + len`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::ShapeMismatch`] if the range exceeds the set.
    pub fn slice_mut(&mut self, offset: usize, len: usize) -> Result<ForceSetSliceMut<'_>, SpatialError> {
        check_range("ForceSet::slice_mut", self.ncols(), offset, len)?;
        Ok(ForceSetSliceMut {
            set: self,
            offset,
            len,
        })
    }
}

impl SpatialAction for ForceSet {
    fn act_by(&self, m: &SpatialTransform) -> Self {
        let r = m.rotation.matrix();
        let linear = r * &self.linear;
        let angular = r * &self.angular + m.translation.cross_matrix() * &linear;
        Self { linear, angular }
    }

    fn act_inverse_by(&self, m: &SpatialTransform) -> Self {
        let rt = m.rotation.matrix().transpose();
        let angular = &rt * (&self.angular - m.translation.cross_matrix() * &self.linear);
        let linear = rt * &self.linear;
        Self { linear, angular }
    }
}

impl std::fmt::Display for ForceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "F =")?;
        write!(f, "{}", self.linear)?;
        writeln!(f, "Tau =")?;
        write!(f, "{}", self.angular)
    }
}

fn check_range(context: &'static str, ncols: usize, offset: usize, len: usize) -> Result<(), SpatialError> {
    match offset.checked_add(len) {
        Some(end) if end <= ncols => Ok(()),
        _ => Err(SpatialError::shape_mismatch(context, ncols, offset.saturating_add(len))),
    }
}

/// Read-only view over a contiguous column range of a [`ForceSet`].
#[derive(Debug, Clone, Copy)]
pub struct ForceSetSlice<'a> {
    set: &'a ForceSet,
    offset: usize,
    len: usize,
}

impl ForceSetSlice<'_> {
    /// Number of columns in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Force in column `k` of the view.
    ///
    /// # Panics
    ///
    /// Panics if `k >= len()`.
    #[must_use]
    pub fn column(&self, k: usize) -> Force {
        assert!(k < self.len, "column {k} out of view of width {}", self.len);
        self.set.column(self.offset + k)
    }

    /// Copy the viewed columns into a new set.
    #[must_use]
    pub fn to_owned(&self) -> ForceSet {
        ForceSet {
            linear: self.set.linear.columns(self.offset, self.len).into_owned(),
            angular: self.set.angular.columns(self.offset, self.len).into_owned(),
        }
    }

    /// `aMb` acting on the viewed columns; returns a new set.
    #[must_use]
    pub fn act_by(&self, m: &SpatialTransform) -> ForceSet {
        let r = m.rotation.matrix();
        let linear = r * self.set.linear.columns(self.offset, self.len);
        let angular =
            r * self.set.angular.columns(self.offset, self.len) + m.translation.cross_matrix() * &linear;
        ForceSet { linear, angular }
    }

    /// `aMb` acting inversely on the viewed columns; returns a new set.
    #[must_use]
    pub fn act_inverse_by(&self, m: &SpatialTransform) -> ForceSet {
        let rt = m.rotation.matrix().transpose();
        let lin = self.set.linear.columns(self.offset, self.len);
        let ang = self.set.angular.columns(self.offset, self.len);
        let angular = &rt * (ang - m.translation.cross_matrix() * lin);
        let linear = rt * lin;
        ForceSet { linear, angular }
    }

    /// Write `m` acting on the viewed columns into `out` without allocating.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::ShapeMismatch`] if the widths differ.
    pub fn act_by_into(&self, m: &SpatialTransform, out: &mut ForceSetSliceMut<'_>) -> Result<(), SpatialError> {
        if out.len != self.len {
            return Err(SpatialError::shape_mismatch("ForceSetSlice::act_by_into", out.len, self.len));
        }
        for k in 0..self.len {
            out.set_column(k, &self.column(k).act_by(m));
        }
        Ok(())
    }
}

/// Write-through view over a contiguous column range of a [`ForceSet`].
#[derive(Debug)]
pub struct ForceSetSliceMut<'a> {
    set: &'a mut ForceSet,
    offset: usize,
    len: usize,
}

impl ForceSetSliceMut<'_> {
    /// Number of columns in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Force in column `k` of the view.
    ///
    /// # Panics
    ///
    /// Panics if `k >= len()`.
    #[must_use]
    pub fn column(&self, k: usize) -> Force {
        assert!(k < self.len, "column {k} out of view of width {}", self.len);
        self.set.column(self.offset + k)
    }

    /// Overwrite column `k` of the view in the parent set.
    ///
    /// # Panics
    ///
    /// Panics if `k >= len()`.
    pub fn set_column(&mut self, k: usize, f: &Force) {
        assert!(k < self.len, "column {k} out of view of width {}", self.len);
        self.set.set_column(self.offset + k, f);
    }

    /// Copy `src` into the viewed columns.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::ShapeMismatch`] if `src` has a different width.
    pub fn assign(&mut self, src: &ForceSet) -> Result<(), SpatialError> {
        if src.ncols() != self.len {
            return Err(SpatialError::shape_mismatch("ForceSetSliceMut::assign", self.len, src.ncols()));
        }
        self.set.linear.columns_mut(self.offset, self.len).copy_from(&src.linear);
        self.set.angular.columns_mut(self.offset, self.len).copy_from(&src.angular);
        Ok(())
    }

    /// Set every viewed entry to `value`.
    pub fn fill(&mut self, value: f64) {
        self.set.linear.columns_mut(self.offset, self.len).fill(value);
        self.set.angular.columns_mut(self.offset, self.len).fill(value);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Rotation3, Vector3};

    fn sample_set() -> ForceSet {
        ForceSet::from_forces(&[
            Force::new(Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 2.0, 0.0)),
            Force::new(Vector3::new(0.5, -1.0, 0.3), Vector3::new(1.0, 1.0, -1.0)),
            Force::new(Vector3::new(0.0, 0.0, 4.0), Vector3::new(-3.0, 0.2, 0.1)),
        ])
    }

    fn transform() -> SpatialTransform {
        SpatialTransform::new(
            Rotation3::from_euler_angles(0.2, 0.9, -0.4),
            Vector3::new(0.4, 1.1, -0.6),
        )
    }

    #[test]
    fn test_new_is_nan_filled() {
        let set = ForceSet::new(4);
        assert_eq!(set.ncols(), 4);
        assert!(!set.is_finite());
        assert!(set.linear().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_from_blocks_rejects_mismatched_widths() {
        let err = ForceSet::from_blocks(Matrix3xX::zeros(2), Matrix3xX::zeros(3)).unwrap_err();
        assert!(err.is_shape_mismatch());
        assert!(ForceSet::from_blocks(Matrix3xX::zeros(3), Matrix3xX::zeros(3)).is_ok());
    }

    #[test]
    fn test_act_is_columnwise_force_action() {
        let set = sample_set();
        let m = transform();
        let acted = set.act_by(&m);
        for k in 0..set.ncols() {
            assert_relative_eq!(
                acted.column(k).to_vector(),
                set.column(k).act_by(&m).to_vector(),
                epsilon = 1e-12
            );
        }
        let back = acted.act_inverse_by(&m);
        assert_relative_eq!(back.to_matrix(), set.to_matrix(), epsilon = 1e-12);
    }

    #[test]
    fn test_slice_act_matches_full_act() {
        let set = sample_set();
        let m = transform();
        let full = set.act_by(&m);
        let part = set.slice(1, 2).unwrap().act_by(&m);
        assert_eq!(part.ncols(), 2);
        assert_relative_eq!(part.to_matrix(), full.slice(1, 2).unwrap().to_owned().to_matrix(), epsilon = 1e-12);
        let inv = set.slice(0, 2).unwrap().act_inverse_by(&m);
        assert_relative_eq!(
            inv.column(1).to_vector(),
            set.column(1).act_inverse_by(&m).to_vector(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_slice_mut_writes_through() {
        let mut set = ForceSet::zeros(5);
        let src = sample_set();
        set.slice_mut(2, 3).unwrap().assign(&src).unwrap();
        assert_relative_eq!(set.column(0).to_vector().norm(), 0.0);
        assert_relative_eq!(set.column(3).to_vector(), src.column(1).to_vector());

        let mut view = set.slice_mut(0, 2).unwrap();
        view.set_column(1, &src.column(2));
        assert_relative_eq!(set.column(1).to_vector(), src.column(2).to_vector());
    }

    #[test]
    fn test_act_by_into_matches_allocating_path() {
        let src = sample_set();
        let m = transform();
        let mut dst = ForceSet::new(6);
        {
            let view = src.slice(0, 3).unwrap();
            let mut out = dst.slice_mut(3, 3).unwrap();
            view.act_by_into(&m, &mut out).unwrap();
        }
        let expected = src.act_by(&m);
        assert_relative_eq!(
            dst.slice(3, 3).unwrap().to_owned().to_matrix(),
            expected.to_matrix(),
            epsilon = 1e-12
        );
        // Untouched columns keep the sentinel.
        assert!(dst.column(0).angular.x.is_nan());
    }

    #[test]
    fn test_slice_bounds_and_width_checks() {
        let mut set = ForceSet::zeros(3);
        assert!(set.slice(2, 2).is_err());
        assert!(set.slice_mut(usize::MAX, 2).is_err());
        let err = set.slice_mut(0, 2).unwrap().assign(&ForceSet::zeros(3)).unwrap_err();
        assert!(err.is_shape_mismatch());
    }

    #[test]
    fn test_to_matrix_is_angular_first() {
        let set = sample_set();
        let mat = set.to_matrix();
        assert_relative_eq!(mat[(2, 2)], 4.0);
        assert_relative_eq!(mat[(3, 2)], -3.0);
    }
}
