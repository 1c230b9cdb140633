//! Tree algorithms over a [`Model`](crate::Model) / [`Data`](crate::Data) pair.
//!
//! - [`forward_kinematics`]: configuration to body placements
//! - [`crba`]: joint-space inertia matrix
//! - [`factorize`] / [`solve`]: tree-sparse `U D Uᵀ` factorization and solves
//! - [`center_of_mass`], [`compute_com_jacobian`], [`compute_jacobians`], [`body_jacobian`]

mod com;
mod crba;
mod factor;
mod jacobian;
mod kinematics;

pub use com::{center_of_mass, compute_com_jacobian};
pub use crba::crba;
pub use factor::{factorize, inverse, mass_matrix_product, solve, solve_batch, solve_in_place};
pub use jacobian::{body_jacobian, compute_jacobians};
pub use kinematics::{forward_kinematics, update_absolute_placements};
