//! Numerical configuration of the dynamics algorithms.

use crate::error::DynamicsError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default pivot tolerance for the tree-sparse factorization.
pub const DEFAULT_PIVOT_TOLERANCE: f64 = 1e-12;

/// Tolerances and checks used by CRBA and the factorization.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DynamicsConfig {
    /// A factorization pivot `<=` this value (or non-finite) is rejected
    /// with `NonPositiveDefinite`.
    pub pivot_tolerance: f64,
    /// Scan the assembled joint-space inertia matrix for NaN/inf after CRBA.
    pub check_finite: bool,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            pivot_tolerance: DEFAULT_PIVOT_TOLERANCE,
            check_finite: true,
        }
    }
}

impl DynamicsConfig {
    /// Set the pivot tolerance.
    #[must_use]
    pub fn with_pivot_tolerance(mut self, tolerance: f64) -> Self {
        self.pivot_tolerance = tolerance;
        self
    }

    /// Enable or disable the post-CRBA finiteness scan.
    #[must_use]
    pub fn with_finite_check(mut self, enabled: bool) -> Self {
        self.check_finite = enabled;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DynamicsError::InvalidConfig`] if the pivot tolerance is
    /// negative or not finite.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.pivot_tolerance.is_finite() || self.pivot_tolerance < 0.0 {
            return Err(DynamicsError::invalid_config(format!(
                "pivot_tolerance must be finite and >= 0, got {}",
                self.pivot_tolerance
            )));
        }
        Ok(())
    }
}
