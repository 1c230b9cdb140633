//! Factory methods for canonical tree shapes.
//!
//! Used by inline tests, integration tests and the benches. Every body is a
//! small box hanging half a link below its joint, so all composite inertias
//! are positive definite and neighbouring joints are coupled.

use nalgebra::Vector3;
use sim_spatial::{Inertia, SpatialTransform};
use tracing::warn;

use super::model::Model;
use crate::joint::{JointModel, Revolute};

/// Link length used by the factories.
pub const FACTORY_LINK_LENGTH: f64 = 0.5;

fn factory_link(mass: f64) -> Inertia {
    Inertia::from_box(
        mass,
        Vector3::new(0.05, 0.08, FACTORY_LINK_LENGTH),
        Vector3::new(0.0, 0.0, 0.5 * FACTORY_LINK_LENGTH),
    )
}

/// Revolute axes cycle through x, y, z so consecutive joints are not parallel.
fn cycling_revolute(i: usize) -> JointModel {
    match i % 3 {
        0 => Revolute::x().into(),
        1 => Revolute::y().into(),
        _ => Revolute::z().into(),
    }
}

/// `2^depth - 1`, saturating at `usize::MAX`.
fn binary_tree_size(depth: usize) -> usize {
    u32::try_from(depth)
        .ok()
        .and_then(|d| 1usize.checked_shl(d))
        .map_or(usize::MAX, |n| n - 1)
}

/// Append one factory body; `false` stops the caller's loop on rejection.
fn attach(
    model: &mut Model,
    parent: usize,
    joint: JointModel,
    placement: SpatialTransform,
    inertia: Inertia,
    name: &str,
) -> bool {
    match model.add_body(parent, joint, placement, inertia, Some(name)) {
        Ok(_) => true,
        Err(err) => {
            warn!(%err, name, "factory body rejected");
            false
        }
    }
}

#[allow(clippy::cast_precision_loss)]
impl Model {
    /// Serial chain of `n` revolute links, each attached to the previous one.
    ///
    /// # Example
    /// ```
    /// use sim_articulated::Model;
    ///
    /// let model = Model::chain(4);
    /// assert_eq!(model.nbody, 5);
    /// assert_eq!(model.nv, 4);
    /// ```
    #[must_use]
    pub fn chain(n: usize) -> Self {
        let mut model = Self::new();
        let below = SpatialTransform::from_translation(Vector3::new(0.0, 0.0, FACTORY_LINK_LENGTH));
        for i in 0..n {
            let placement = if i == 0 { SpatialTransform::identity() } else { below };
            if !attach(
                &mut model,
                i,
                cycling_revolute(i),
                placement,
                factory_link(1.0 + 0.1 * i as f64),
                &format!("link_{i}"),
            ) {
                break;
            }
        }
        model
    }

    /// `k` revolute bodies all attached directly to the universe.
    #[must_use]
    pub fn star(k: usize) -> Self {
        let mut model = Self::new();
        for i in 0..k {
            let angle = std::f64::consts::TAU * i as f64 / k.max(1) as f64;
            let placement = SpatialTransform::from_translation(Vector3::new(angle.cos(), angle.sin(), 0.0));
            if !attach(&mut model, 0, cycling_revolute(i), placement, factory_link(1.0), &format!("spoke_{i}")) {
                break;
            }
        }
        model
    }

    /// Complete binary tree of revolute bodies with `depth` levels below the
    /// universe (`2^depth - 1` bodies), numbered breadth-first.
    ///
    /// Breadth-first numbering keeps parents before children but does not
    /// keep subtrees contiguous. Depths past the pointer width saturate.
    #[must_use]
    pub fn binary_tree(depth: usize) -> Self {
        let mut model = Self::new();
        let count = binary_tree_size(depth);
        for b in 1..=count {
            let parent = b / 2;
            let side = if b % 2 == 0 { -0.2 } else { 0.2 };
            let placement = if parent == 0 {
                SpatialTransform::identity()
            } else {
                SpatialTransform::from_translation(Vector3::new(side, 0.0, FACTORY_LINK_LENGTH))
            };
            if !attach(&mut model, parent, cycling_revolute(b), placement, factory_link(1.0), &format!("node_{b}")) {
                break;
            }
        }
        model
    }
}
