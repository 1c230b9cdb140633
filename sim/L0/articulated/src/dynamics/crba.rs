//! Composite Rigid Body Algorithm for the joint-space inertia matrix.
//!
//! One backward sweep over the bodies (children before parents):
//!
//! 1. `composite[i]` starts as the body's own inertia and has already
//!    received every child subtree when body `i` is reached.
//! 2. The joint's own momentum columns `composite[i] * S_i` are written into
//!    the first `nv_i` columns of `forces[i]`; the remaining columns hold the
//!    descendant joints' columns, already expressed in frame `i`.
//! 3. Row block `i` of M is `S_iᵀ forces[i]` against every row of the subtree.
//! 4. `composite[i]` and the columns of `forces[i]` are carried into the
//!    parent frame through `relative[i]`.
//!
//! Only the upper triangle is formed; it is mirrored at the end. Rows whose
//! bodies are not ancestor-related are never written and stay exactly zero.
//!
//! Reference: Featherstone, "Rigid Body Dynamics Algorithms", Chapter 6

use nalgebra::DMatrix;
use sim_spatial::SpatialAction;
use tracing::trace;

use crate::error::DynamicsError;
use crate::joint::JointCapability;
use crate::types::{Data, Model};

/// Fill `data.mass_matrix` from the current `relative` placements.
///
/// Works for any topological body order; subtrees need not be contiguous.
///
/// # Errors
///
/// - [`DynamicsError::ShapeMismatch`] if `data` was made for another model.
/// - [`DynamicsError::InvalidTopology`] if a parent does not precede its child.
/// - [`DynamicsError::NonPositiveDefinite`] if `config.check_finite` is set
///   and the result holds a non-finite entry (e.g. unset placements).
#[allow(clippy::similar_names, clippy::needless_range_loop)]
pub fn crba<'a>(model: &Model, data: &'a mut Data) -> crate::Result<&'a DMatrix<f64>> {
    model.check_topology()?;
    data.check_model(model)?;
    trace!(nbody = model.nbody, nv = model.nv, "crba pass");

    data.invalidate();
    data.mass_matrix.fill(0.0);
    data.composite.copy_from_slice(&model.inertias);

    for i in (1..model.nbody).rev() {
        let joint = &model.joints[i];
        let nv_i = joint.nv();
        let iv = model.idx_v[i];
        let parent = model.parents[i];
        let composite = data.composite[i];

        // ==================== Own momentum columns ====================
        for k in 0..nv_i {
            data.forces[i].set_column(k, &composite.apply(&joint.subspace_column(k)));
        }

        // ==================== Row block of M ====================
        for k in 0..nv_i {
            let s = joint.subspace_column(k);
            for seg in &data.segments[i] {
                for j in 0..seg.len {
                    let value = s.dot(&data.forces[i].column(seg.local_offset + j));
                    data.mass_matrix[(iv + k, seg.dof_start + j)] = value;
                }
            }
        }

        // ==================== Carry subtree to parent ====================
        let relative = data.relative[i];
        data.composite[parent] += composite.act_by(&relative);

        let (head, tail) = data.forces.split_at_mut(i);
        let child = &tail[0];
        let parent_set = &mut head[parent];
        for seg in &data.segments[i] {
            let src = child.slice(seg.local_offset, seg.len)?;
            let mut dst = parent_set.slice_mut(seg.parent_offset, seg.len)?;
            src.act_by_into(&relative, &mut dst)?;
        }
    }

    let nv = model.nv;
    for c in 0..nv {
        for r in (c + 1)..nv {
            data.mass_matrix[(r, c)] = data.mass_matrix[(c, r)];
        }
    }

    if model.config.check_finite {
        if let Some(row) = data.first_non_finite_row() {
            let pivot = data.mass_matrix[(row, row)];
            return Err(DynamicsError::NonPositiveDefinite { row, pivot });
        }
    }

    data.mass_matrix_valid = true;
    Ok(&data.mass_matrix)
}
