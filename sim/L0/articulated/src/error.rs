//! Error types for kinematic-tree dynamics.

use sim_spatial::SpatialError;
use thiserror::Error;

/// Errors raised while building a model or running the dynamics algorithms.
///
/// All errors are reported synchronously at the point of detection; none are
/// silently recovered.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DynamicsError {
    /// A vector, configuration or workspace does not have the size the model expects.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Which operation detected the mismatch.
        context: &'static str,
        /// Expected size.
        expected: usize,
        /// Size actually supplied.
        actual: usize,
    },

    /// Shape error raised by a spatial container.
    #[error(transparent)]
    Spatial(#[from] SpatialError),

    /// A parent index does not precede its child (cycle or forward reference).
    #[error("invalid topology: body {body} has parent {parent}, parents must precede children")]
    InvalidTopology {
        /// Offending body.
        body: usize,
        /// Its recorded parent.
        parent: usize,
    },

    /// A factorization pivot was not above the configured tolerance (or was NaN).
    #[error("matrix is not positive definite: pivot {pivot} at row {row}")]
    NonPositiveDefinite {
        /// Row of the rejected pivot.
        row: usize,
        /// Pivot value.
        pivot: f64,
    },

    /// A solve was requested before a successful factorization of the current matrix.
    #[error("solve requested before the joint-space inertia matrix was factorized")]
    UnfactorizedMatrix,

    /// A factorization was requested before CRBA ran for the current placements.
    #[error("factorization requested before the joint-space inertia matrix was computed for the current placements")]
    StaleMassMatrix,

    /// Name lookup miss.
    #[error("body not found: {name}")]
    NotFound {
        /// Requested name.
        name: String,
    },

    /// The parent index given to `add_body` does not name an existing body.
    #[error("invalid parent {parent}: model has {nbody} bodies")]
    DuplicateOrInvalidParent {
        /// Requested parent.
        parent: usize,
        /// Number of bodies at the time of the call.
        nbody: usize,
    },

    /// A body with this name already exists.
    #[error("duplicate body name: {name}")]
    DuplicateName {
        /// The clashing name.
        name: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

impl DynamicsError {
    /// Create a shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(context: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            context,
            expected,
            actual,
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a name lookup error.
    #[must_use]
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Check if this is a shape error, from either this crate or a spatial container.
    #[must_use]
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, Self::ShapeMismatch { .. })
            || matches!(self, Self::Spatial(e) if e.is_shape_mismatch())
    }

    /// Check if this error comes from model construction.
    #[must_use]
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateOrInvalidParent { .. } | Self::DuplicateName { .. }
        )
    }

    /// Check if this is a numerical failure of the factorization.
    #[must_use]
    pub fn is_non_positive_definite(&self) -> bool {
        matches!(self, Self::NonPositiveDefinite { .. })
    }
}
