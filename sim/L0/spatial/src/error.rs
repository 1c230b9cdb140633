//! Error types for spatial algebra operations.

use thiserror::Error;

/// Errors raised by spatial quantity containers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpatialError {
    /// Column counts of two blocks (or a block and a view) disagree, or a
    /// view was requested outside the parent's column range.
    #[error("shape mismatch in {context}: expected {expected} columns, got {actual}")]
    ShapeMismatch {
        /// Which operation detected the mismatch.
        context: &'static str,
        /// Expected column count.
        expected: usize,
        /// Column count actually supplied.
        actual: usize,
    },
}

impl SpatialError {
    /// Create a shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(context: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            context,
            expected,
            actual,
        }
    }

    /// Check if this is a shape mismatch.
    #[must_use]
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, Self::ShapeMismatch { .. })
    }
}
