//! Spatial algebra for articulated rigid bodies.
//!
//! This crate provides the 6D quantities used by the joint-space dynamics in
//! `sim-articulated`:
//!
//! - [`SpatialTransform`] - rigid displacement `aMb` (rotation + translation)
//! - [`Motion`] - twist `[ω; v]`
//! - [`Force`] - wrench `[n; f]`
//! - [`Inertia`] - rigid-body spatial inertia in `(mass, lever, I_c)` form
//! - [`ForceSet`] - N forces as paired 3xN blocks with column-range views
//!
//! Every quantity changes frame through the [`SpatialAction`] trait. Motions
//! and forces are dual: for any transform `m`, force `f` and motion `v`,
//!
//! ```text
//! f.act_by(m) · v == f · v.act_inverse_by(m)
//! ```
//!
//! # Conventions
//!
//! 6-vectors and 6x6 matrices stack the angular part first:
//! `[ω; v]`, `[n; f]`. This matches the layout used by the dynamics crate.
//!
//! # Example
//!
//! ```
//! use nalgebra::{Rotation3, Vector3};
//! use sim_spatial::{Force, Motion, SpatialAction, SpatialTransform};
//!
//! let m = SpatialTransform::new(
//!     Rotation3::from_axis_angle(&Vector3::z_axis(), 0.5),
//!     Vector3::new(1.0, 0.0, 0.0),
//! );
//! let f = Force::new(Vector3::zeros(), Vector3::y());
//! let v = Motion::new(Vector3::z(), Vector3::zeros());
//!
//! let lhs = f.act_by(&m).dot(&v);
//! let rhs = f.dot(&v.act_inverse_by(&m));
//! assert!((lhs - rhs).abs() < 1e-12);
//! ```

#![doc(html_root_url = "https://docs.rs/sim-spatial/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,     // mul_add style changes aren't always clearer
    clippy::many_single_char_names,
    clippy::doc_markdown,
)]

mod error;
mod force;
mod force_set;
mod inertia;
mod motion;
mod transform;

pub use error::SpatialError;
pub use force::Force;
pub use force_set::{ForceSet, ForceSetSlice, ForceSetSliceMut};
pub use inertia::Inertia;
pub use motion::Motion;
pub use transform::{SpatialAction, SpatialTransform};

/// Result type for spatial operations.
pub type Result<T> = std::result::Result<T, SpatialError>;
