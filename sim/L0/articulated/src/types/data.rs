//! Data struct definition and tree-sparsity precomputation.
//!
//! [`Data`] is the per-configuration workspace paired with a [`Model`]: body
//! placements, composite inertias, the joint-space inertia matrix and its
//! factorization. All buffers are sized once in [`Data::new`] and overwritten
//! in place afterwards; nothing is resized by the algorithms.

use nalgebra::{DMatrix, DVector, Matrix3xX, Matrix6xX, Vector3};
use sim_spatial::{ForceSet, Inertia, SpatialTransform};
use tracing::{debug, warn};

use crate::error::DynamicsError;

use super::model::Model;

/// Contiguous run of global velocity rows inside one body's subtree.
///
/// Subtrees are not required to occupy contiguous rows (any topological body
/// order is accepted), so each body keeps the runs of its subtree in
/// ascending row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSegment {
    /// First global velocity row of the run.
    pub dof_start: usize,
    /// Number of rows in the run.
    pub len: usize,
    /// Column of `dof_start` in this body's own force set.
    pub local_offset: usize,
    /// Column of `dof_start` in the parent body's force set.
    pub parent_offset: usize,
}

/// Per-configuration dynamics workspace (one per model per thread).
///
/// # Key Invariant
///
/// `mass_matrix` is meaningful only while `mass_matrix_valid` is set, i.e.
/// after a CRBA pass for the current placements; `factor_u`/`factor_d` only
/// while `factor_valid` is set. Buffers never written yet hold NaN.
#[derive(Debug, Clone)]
pub struct Data {
    // ==================== Pairing ====================
    nbody: usize,
    nv: usize,
    parents: Vec<usize>,
    joint_nv: Vec<usize>,

    // ==================== Kinematics ====================
    /// Placement of each body in the world frame (`oMi`).
    pub absolute: Vec<SpatialTransform>,
    /// Placement of each body in its parent's frame (`liMi`).
    pub relative: Vec<SpatialTransform>,

    // ==================== CRBA ====================
    /// Composite inertia of each subtree, in the subtree root's frame.
    pub composite: Vec<Inertia>,
    /// Momentum columns of each subtree's joints, in the body's frame.
    /// Width `subtree_nv[i]`, columns in ascending global row order.
    pub forces: Vec<ForceSet>,
    /// Joint-space inertia matrix (nv x nv, symmetric).
    pub mass_matrix: DMatrix<f64>,
    /// Set by CRBA, cleared by anything that changes the placements.
    pub mass_matrix_valid: bool,

    // ==================== Factorization ====================
    /// Unit upper-triangular factor with `M = U D Uᵀ`.
    pub factor_u: DMatrix<f64>,
    /// Diagonal factor.
    pub factor_d: DVector<f64>,
    /// Set by a successful factorization of the current matrix.
    pub factor_valid: bool,

    // ==================== Sparsity (fixed after construction) ====================
    /// Largest body index in each subtree.
    pub last_descendant: Vec<usize>,
    /// Velocity dimension of each subtree.
    pub subtree_nv: Vec<usize>,
    /// For each row, the nearest ancestor row (previous row of the same
    /// joint, else last row of the nearest moving ancestor body).
    pub ancestor_row: Vec<Option<usize>>,
    /// For each row, the number of rows having it as ancestor-or-self.
    pub ancestor_subtree_nv: Vec<usize>,
    /// Body owning each row.
    pub row_body: Vec<usize>,
    /// Runs of global rows in each body's subtree.
    pub segments: Vec<Vec<ColumnSegment>>,

    // ==================== Centre of mass ====================
    /// Mass of each subtree.
    pub subtree_mass: Vec<f64>,
    /// World-frame centre of mass of each subtree (index 0: whole system).
    pub subtree_com: Vec<Vector3<f64>>,
    /// Jacobian of the whole-system centre of mass (3 x nv, world frame).
    pub com_jacobian: Matrix3xX<f64>,

    // ==================== Jacobian ====================
    /// World-frame joint Jacobian, angular rows first (6 x nv).
    pub jacobian: Matrix6xX<f64>,
}

impl Data {
    /// Allocate a workspace for `model` and precompute its sparsity metadata.
    ///
    /// A model with an invalid topology still yields a workspace; the
    /// algorithms reject it with [`DynamicsError::InvalidTopology`].
    #[must_use]
    pub fn new(model: &Model) -> Self {
        let nbody = model.nbody;
        let nv = model.nv;

        let subtree_dofs = subtree_dofs(model);
        let subtree_nv: Vec<usize> = subtree_dofs.iter().map(Vec::len).collect();
        let last_descendant = last_descendants(model);
        let segments = column_segments(model, &subtree_dofs);

        let mut row_body = vec![0; nv];
        for i in 1..nbody {
            let iv = model.idx_v[i];
            row_body[iv..iv + model.joint_nv(i)].fill(i);
        }
        let ancestor_row = ancestor_rows(model, &row_body);
        let ancestor_subtree_nv = (0..nv)
            .map(|r| {
                let body = row_body[r];
                subtree_nv[body] - (r - model.idx_v[body])
            })
            .collect();

        let mut relative = vec![SpatialTransform::nan(); nbody];
        let mut absolute = vec![SpatialTransform::nan(); nbody];
        relative[0] = SpatialTransform::identity();
        absolute[0] = SpatialTransform::identity();

        let forces = subtree_nv.iter().map(|&w| ForceSet::new(w)).collect();

        debug!(
            nbody,
            nv,
            max_subtree_nv = subtree_nv.first().copied().unwrap_or(0),
            nsegments = segments.iter().map(Vec::len).sum::<usize>(),
            "allocated dynamics workspace"
        );

        Self {
            nbody,
            nv,
            parents: model.parents.clone(),
            joint_nv: (0..nbody).map(|i| model.joint_nv(i)).collect(),
            absolute,
            relative,
            composite: vec![Inertia::nan(); nbody],
            forces,
            mass_matrix: DMatrix::from_element(nv, nv, f64::NAN),
            mass_matrix_valid: false,
            factor_u: DMatrix::identity(nv, nv),
            factor_d: DVector::from_element(nv, f64::NAN),
            factor_valid: false,
            last_descendant,
            subtree_nv,
            ancestor_row,
            ancestor_subtree_nv,
            row_body,
            segments,
            subtree_mass: vec![f64::NAN; nbody],
            subtree_com: vec![Vector3::from_element(f64::NAN); nbody],
            com_jacobian: Matrix3xX::from_element(nv, f64::NAN),
            jacobian: Matrix6xX::from_element(nv, f64::NAN),
        }
    }

    /// Number of bodies this workspace was allocated for.
    #[must_use]
    pub fn nbody(&self) -> usize {
        self.nbody
    }

    /// Number of velocity coordinates this workspace was allocated for.
    #[must_use]
    pub fn nv(&self) -> usize {
        self.nv
    }

    /// Verify that this workspace was allocated for a model of this topology.
    ///
    /// # Errors
    ///
    /// Returns [`DynamicsError::ShapeMismatch`] if the body count, velocity
    /// dimension, any parent index or any joint's velocity dimension differ.
    pub fn check_model(&self, model: &Model) -> crate::Result<()> {
        if self.nbody != model.nbody {
            return Err(DynamicsError::shape_mismatch("Data body count", model.nbody, self.nbody));
        }
        if self.nv != model.nv {
            return Err(DynamicsError::shape_mismatch("Data velocity dimension", model.nv, self.nv));
        }
        for i in 1..self.nbody {
            if self.parents[i] != model.parents[i] {
                return Err(DynamicsError::shape_mismatch(
                    "Data parent table",
                    model.parents[i],
                    self.parents[i],
                ));
            }
            let nv_i = model.joint_nv(i);
            if self.joint_nv[i] != nv_i {
                return Err(DynamicsError::shape_mismatch(
                    "Data joint velocity dimension",
                    nv_i,
                    self.joint_nv[i],
                ));
            }
        }
        Ok(())
    }

    /// Mark placement-dependent results as stale.
    pub fn invalidate(&mut self) {
        self.mass_matrix_valid = false;
        self.factor_valid = false;
    }

    /// Ancestor rows of `r`, nearest first.
    pub fn ancestors_of_row(&self, r: usize) -> AncestorRows<'_> {
        AncestorRows {
            ancestor_row: &self.ancestor_row,
            next: self.ancestor_row[r],
        }
    }

    /// Index of the first row holding a non-finite value, if any.
    #[must_use]
    pub fn first_non_finite_row(&self) -> Option<usize> {
        let row = (0..self.nv).find(|&r| self.mass_matrix.row(r).iter().any(|v| !v.is_finite()));
        if let Some(row) = row {
            warn!(row, "non-finite entry in joint-space inertia matrix");
        }
        row
    }
}

/// Iterator over the ancestor chain of a velocity row.
#[derive(Debug, Clone)]
pub struct AncestorRows<'a> {
    ancestor_row: &'a [Option<usize>],
    next: Option<usize>,
}

impl Iterator for AncestorRows<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self.ancestor_row[current];
        Some(current)
    }
}

// ============================================================================
// Sparsity precomputation
// ============================================================================

/// Ascending global rows of each body's subtree.
///
/// Children have higher indices than parents, so one descending sweep sees
/// every child before its parent. Bodies with an out-of-order parent are not
/// merged upward; CRBA reports them.
fn subtree_dofs(model: &Model) -> Vec<Vec<usize>> {
    let mut dofs: Vec<Vec<usize>> = (0..model.nbody)
        .map(|i| {
            let iv = model.idx_v[i];
            (iv..iv + model.joint_nv(i)).collect()
        })
        .collect();
    for i in (1..model.nbody).rev() {
        let parent = model.parents[i];
        if parent >= i {
            continue;
        }
        let child = std::mem::take(&mut dofs[i]);
        dofs[parent].extend_from_slice(&child);
        dofs[i] = child;
    }
    for list in &mut dofs {
        list.sort_unstable();
    }
    dofs
}

fn last_descendants(model: &Model) -> Vec<usize> {
    let mut last: Vec<usize> = (0..model.nbody).collect();
    for i in (1..model.nbody).rev() {
        let parent = model.parents[i];
        if parent < i {
            last[parent] = last[parent].max(last[i]);
        }
    }
    last
}

fn column_segments(model: &Model, subtree_dofs: &[Vec<usize>]) -> Vec<Vec<ColumnSegment>> {
    let mut segments = Vec::with_capacity(model.nbody);
    for (i, dofs) in subtree_dofs.iter().enumerate() {
        let parent = model.parents[i];
        let parent_dofs = subtree_dofs.get(parent).filter(|_| i > 0 && parent < i);
        let mut runs: Vec<ColumnSegment> = Vec::new();
        for (local, &dof) in dofs.iter().enumerate() {
            match runs.last_mut() {
                Some(run) if run.dof_start + run.len == dof => run.len += 1,
                _ => runs.push(ColumnSegment {
                    dof_start: dof,
                    len: 1,
                    local_offset: local,
                    parent_offset: parent_dofs
                        .and_then(|p| p.binary_search(&dof).ok())
                        .unwrap_or(0),
                }),
            }
        }
        segments.push(runs);
    }
    segments
}

fn ancestor_rows(model: &Model, row_body: &[usize]) -> Vec<Option<usize>> {
    (0..model.nv)
        .map(|r| {
            let body = row_body[r];
            if r > model.idx_v[body] {
                return Some(r - 1);
            }
            let mut a = model.parents[body];
            while a > 0 && a < body {
                let nv = model.joint_nv(a);
                if nv > 0 {
                    return Some(model.idx_v[a] + nv - 1);
                }
                let next = model.parents[a];
                if next >= a {
                    break;
                }
                a = next;
            }
            None
        })
        .collect()
}
