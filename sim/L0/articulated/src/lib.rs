//! Joint-space inertia of articulated rigid-body trees.
//!
//! A [`Model`] describes a kinematic tree: body 0 is the fixed universe and
//! every other body hangs from an earlier one through a joint. A [`Data`]
//! workspace made from the model holds everything that changes with the
//! configuration. The pipeline for one configuration is:
//!
//! 1. [`forward_kinematics`] (or externally written placements)
//! 2. [`crba`]: joint-space inertia matrix `M`
//! 3. [`factorize`] then [`solve`]: tree-sparse `M = U D Uᵀ` solves
//!
//! # Example
//!
//! ```
//! use nalgebra::DVector;
//! use sim_articulated::{Model, crba, factorize, forward_kinematics, solve};
//!
//! let model = Model::binary_tree(3);
//! let mut data = model.make_data();
//! let q = vec![0.2; model.nq];
//! forward_kinematics(&model, &mut data, &q)?;
//! let m = crba(&model, &mut data)?.clone();
//! factorize(&model, &mut data)?;
//!
//! let x = DVector::from_element(model.nv, 1.0);
//! let recovered = solve(&model, &data, &(&m * &x))?;
//! assert!((recovered - x).amax() < 1e-8);
//! # Ok::<(), sim_articulated::DynamicsError>(())
//! ```
//!
//! # Conventions
//!
//! Spatial vectors are angular-first (`[ω; v]`, `[n; f]`) throughout, as in
//! [`sim_spatial`]. Bodies may come in any topological order; subtrees do not
//! have to be contiguous.

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_panics_doc,
    clippy::suboptimal_flops
)]

pub mod batch;
pub mod config;
pub mod dynamics;
pub mod error;
pub mod joint;
pub mod types;

pub use batch::BatchDynamics;
pub use config::{DEFAULT_PIVOT_TOLERANCE, DynamicsConfig};
pub use dynamics::{
    body_jacobian, center_of_mass, compute_com_jacobian, compute_jacobians, crba, factorize,
    forward_kinematics, inverse, mass_matrix_product, solve, solve_batch, solve_in_place,
    update_absolute_placements,
};
pub use error::DynamicsError;
pub use joint::{FreeFlyer, Fixed, JointCapability, JointModel, Prismatic, Revolute, Spherical};
pub use types::{ColumnSegment, Data, Model, UNIVERSE_NAME};

/// Result type for dynamics operations.
pub type Result<T> = std::result::Result<T, DynamicsError>;
