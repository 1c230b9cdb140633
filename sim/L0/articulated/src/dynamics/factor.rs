//! Tree-sparse `U D Uᵀ` factorization of the joint-space inertia matrix.
//!
//! `U` is unit upper-triangular and its only off-diagonal nonzeros are
//! `U[a, r]` with `a` an ancestor row of `r` (see `Data::ancestor_row`).
//! Elimination runs from the last row to the first and each row only touches
//! its own ancestor chain, so factorize costs `O(Σ depth²)` and each solve
//! `O(Σ depth)` instead of the dense `O(nv³)` / `O(nv²)`.

use nalgebra::{DMatrix, DVector};
use tracing::{trace, warn};

use crate::error::DynamicsError;
use crate::types::{Data, Model};

/// Factorize `data.mass_matrix` in place into `data.factor_u` / `data.factor_d`.
///
/// Requires a CRBA pass for the current placements.
///
/// # Errors
///
/// - [`DynamicsError::ShapeMismatch`] if `data` was made for another model.
/// - [`DynamicsError::StaleMassMatrix`] if `mass_matrix_valid` is not set.
/// - [`DynamicsError::NonPositiveDefinite`] if a pivot is `<=`
///   `config.pivot_tolerance` or NaN. The factor is left invalid.
#[allow(clippy::many_single_char_names)]
pub fn factorize(model: &Model, data: &mut Data) -> crate::Result<()> {
    data.check_model(model)?;
    let nv = model.nv;
    let tolerance = model.config.pivot_tolerance;
    trace!(nv, "tree-sparse factorization");

    data.factor_valid = false;
    if !data.mass_matrix_valid {
        return Err(DynamicsError::StaleMassMatrix);
    }

    // Phase 1: copy the ancestor entries of M; everything else in U stays identity.
    for r in 0..nv {
        data.factor_d[r] = data.mass_matrix[(r, r)];
        let mut next = data.ancestor_row[r];
        while let Some(a) = next {
            data.factor_u[(a, r)] = data.mass_matrix[(a, r)];
            next = data.ancestor_row[a];
        }
    }

    // Phase 2: eliminate from the leaves up. Row r's rank-1 update only
    // reaches pairs (b, a) on its own ancestor chain.
    for r in (0..nv).rev() {
        let d = data.factor_d[r];
        if d.is_nan() || d <= tolerance {
            warn!(row = r, pivot = d, tolerance, "factorization pivot rejected");
            return Err(DynamicsError::NonPositiveDefinite { row: r, pivot: d });
        }

        let mut next = data.ancestor_row[r];
        while let Some(a) = next {
            data.factor_u[(a, r)] /= d;
            next = data.ancestor_row[a];
        }

        let mut next = data.ancestor_row[r];
        while let Some(a) = next {
            let u_ar = data.factor_u[(a, r)];
            data.factor_d[a] -= u_ar * u_ar * d;
            let mut inner = data.ancestor_row[a];
            while let Some(b) = inner {
                let u_br = data.factor_u[(b, r)];
                data.factor_u[(b, a)] -= u_ar * d * u_br;
                inner = data.ancestor_row[b];
            }
            next = data.ancestor_row[a];
        }
    }

    data.factor_valid = true;
    Ok(())
}

fn check_factorized(model: &Model, data: &Data, len: usize, context: &'static str) -> crate::Result<()> {
    data.check_model(model)?;
    if !data.factor_valid {
        return Err(DynamicsError::UnfactorizedMatrix);
    }
    if len != model.nv {
        return Err(DynamicsError::shape_mismatch(context, model.nv, len));
    }
    Ok(())
}

/// Solve `M x = b` in place using the current factorization.
///
/// # Errors
///
/// - [`DynamicsError::UnfactorizedMatrix`] if no successful [`factorize`]
///   happened since the placements last changed.
/// - [`DynamicsError::ShapeMismatch`] if `x.len() != nv`.
pub fn solve_in_place(model: &Model, data: &Data, x: &mut DVector<f64>) -> crate::Result<()> {
    check_factorized(model, data, x.len(), "solve right-hand side")?;
    substitute(data, x.as_mut_slice());
    Ok(())
}

/// Solve `M x = b`, returning `x`.
///
/// # Errors
///
/// Same as [`solve_in_place`].
pub fn solve(model: &Model, data: &Data, b: &DVector<f64>) -> crate::Result<DVector<f64>> {
    let mut x = b.clone();
    solve_in_place(model, data, &mut x)?;
    Ok(x)
}

/// Solve `M X = B` for every column of `rhs`, in place.
///
/// # Errors
///
/// Same as [`solve_in_place`], with the row count of `rhs` checked.
pub fn solve_batch(model: &Model, data: &Data, rhs: &mut DMatrix<f64>) -> crate::Result<()> {
    check_factorized(model, data, rhs.nrows(), "solve_batch right-hand side rows")?;
    for j in 0..rhs.ncols() {
        let mut column = rhs.column(j).clone_owned();
        substitute(data, column.as_mut_slice());
        rhs.set_column(j, &column);
    }
    Ok(())
}

/// `M⁻¹`, one unit right-hand side per column.
///
/// # Errors
///
/// Same as [`solve_in_place`].
pub fn inverse(model: &Model, data: &Data) -> crate::Result<DMatrix<f64>> {
    let mut out = DMatrix::identity(model.nv, model.nv);
    solve_batch(model, data, &mut out)?;
    Ok(out)
}

/// `U D Uᵀ x` using only ancestor links (reproduces `M x`).
///
/// # Errors
///
/// Same as [`solve_in_place`].
pub fn mass_matrix_product(model: &Model, data: &Data, x: &DVector<f64>) -> crate::Result<DVector<f64>> {
    check_factorized(model, data, x.len(), "mass_matrix_product operand")?;
    let nv = model.nv;

    // w = D Uᵀ x
    let mut w = x.clone();
    for c in (0..nv).rev() {
        let mut acc = w[c];
        for a in data.ancestors_of_row(c) {
            acc += data.factor_u[(a, c)] * x[a];
        }
        w[c] = acc * data.factor_d[c];
    }

    // y = U w
    let mut y = w.clone();
    for c in 0..nv {
        for a in data.ancestors_of_row(c) {
            y[a] += data.factor_u[(a, c)] * w[c];
        }
    }
    Ok(y)
}

/// `x ← (U D Uᵀ)⁻¹ x`.
#[allow(clippy::float_cmp)]
fn substitute(data: &Data, x: &mut [f64]) {
    let nv = x.len();

    // Phase 1: U y = b (scatter each row into its ancestors, leaves first).
    for c in (0..nv).rev() {
        let xc = x[c];
        if xc == 0.0 {
            continue;
        }
        for a in data.ancestors_of_row(c) {
            x[a] -= data.factor_u[(a, c)] * xc;
        }
    }

    // Phase 2: D z = y.
    for (xi, d) in x.iter_mut().zip(data.factor_d.iter()) {
        *xi /= d;
    }

    // Phase 3: Uᵀ x = z (gather from ancestors, root first).
    for c in 0..nv {
        let mut acc = x[c];
        for a in data.ancestors_of_row(c) {
            acc -= data.factor_u[(a, c)] * x[a];
        }
        x[c] = acc;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::dynamics::{crba, forward_kinematics};
    use approx::assert_relative_eq;

    fn factorized(model: &Model) -> Data {
        let mut data = model.make_data();
        let q: Vec<f64> = (0..model.nq).map(|k| (0.37 * k as f64).sin()).collect();
        forward_kinematics(model, &mut data, &q).unwrap();
        crba(model, &mut data).unwrap();
        factorize(model, &mut data).unwrap();
        data
    }

    #[test]
    fn test_factor_reproduces_matrix() {
        let model = Model::binary_tree(3);
        let data = factorized(&model);
        let u = &data.factor_u;
        let rebuilt = u * DMatrix::from_diagonal(&data.factor_d) * u.transpose();
        assert_relative_eq!(rebuilt, data.mass_matrix.clone(), epsilon = 1e-12);
    }

    #[test]
    fn test_factor_respects_ancestor_sparsity() {
        let model = Model::binary_tree(3);
        let data = factorized(&model);
        for r in 0..model.nv {
            let ancestors: Vec<usize> = data.ancestors_of_row(r).collect();
            for a in 0..r {
                if !ancestors.contains(&a) {
                    assert_eq!(data.factor_u[(a, r)], 0.0, "U[{a}, {r}]");
                }
            }
            assert_eq!(data.factor_u[(r, r)], 1.0);
        }
    }

    #[test]
    fn test_solve_matches_dense() {
        let model = Model::chain(6);
        let data = factorized(&model);
        let b = DVector::from_fn(model.nv, |i, _| 1.0 - 0.25 * i as f64);
        let x = solve(&model, &data, &b).unwrap();
        let dense = data.mass_matrix.clone().cholesky().unwrap().solve(&b);
        assert_relative_eq!(x, dense, epsilon = 1e-10);
    }

    #[test]
    fn test_inverse_times_matrix_is_identity() {
        let model = Model::star(4);
        let data = factorized(&model);
        let inv = inverse(&model, &data).unwrap();
        assert_relative_eq!(
            &data.mass_matrix * inv,
            DMatrix::identity(model.nv, model.nv),
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_solve_batch_matches_columnwise_solve() {
        let model = Model::binary_tree(2);
        let data = factorized(&model);
        let mut rhs = DMatrix::from_fn(model.nv, 2, |i, j| (i + 2 * j) as f64 - 1.5);
        let first = solve(&model, &data, &rhs.column(0).into_owned()).unwrap();
        solve_batch(&model, &data, &mut rhs).unwrap();
        assert_relative_eq!(rhs.column(0).into_owned(), first, epsilon = 1e-14);
    }

    #[test]
    fn test_mass_matrix_product() {
        let model = Model::binary_tree(3);
        let data = factorized(&model);
        let x = DVector::from_fn(model.nv, |i, _| (i as f64).cos());
        let y = mass_matrix_product(&model, &data, &x).unwrap();
        assert_relative_eq!(y, &data.mass_matrix * &x, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_before_factorize() {
        let model = Model::chain(3);
        let mut data = model.make_data();
        let b = DVector::zeros(3);
        assert_eq!(solve(&model, &data, &b).unwrap_err(), DynamicsError::UnfactorizedMatrix);

        forward_kinematics(&model, &mut data, &[0.0; 3]).unwrap();
        crba(&model, &mut data).unwrap();
        factorize(&model, &mut data).unwrap();
        assert!(solve(&model, &data, &b).is_ok());

        // New placements invalidate the factor.
        forward_kinematics(&model, &mut data, &[0.1; 3]).unwrap();
        assert_eq!(solve(&model, &data, &b).unwrap_err(), DynamicsError::UnfactorizedMatrix);
    }

    #[test]
    fn test_wrong_rhs_length() {
        let model = Model::chain(3);
        let data = factorized(&model);
        let err = solve(&model, &data, &DVector::zeros(2)).unwrap_err();
        assert!(err.is_shape_mismatch());
    }

    #[test]
    fn test_singular_pivot_rejected() {
        let model = Model::chain(2);
        let mut data = model.make_data();
        data.mass_matrix = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        data.mass_matrix_valid = true;
        let err = factorize(&model, &mut data).unwrap_err();
        assert!(matches!(err, DynamicsError::NonPositiveDefinite { row: 0, .. }));
        assert!(!data.factor_valid);
    }

    #[test]
    fn test_unwritten_matrix_rejected() {
        let model = Model::chain(2);
        let mut data = model.make_data();
        assert_eq!(factorize(&model, &mut data).unwrap_err(), DynamicsError::StaleMassMatrix);

        // A NaN pivot is rejected even when the matrix is flagged current.
        data.mass_matrix_valid = true;
        let err = factorize(&model, &mut data).unwrap_err();
        assert!(matches!(err, DynamicsError::NonPositiveDefinite { row: 1, pivot } if pivot.is_nan()));
    }

    #[test]
    fn test_new_placements_require_crba_before_factorize() {
        let model = Model::chain(3);
        let mut data = model.make_data();
        forward_kinematics(&model, &mut data, &[0.0; 3]).unwrap();
        crba(&model, &mut data).unwrap();
        factorize(&model, &mut data).unwrap();

        forward_kinematics(&model, &mut data, &[1.0, -1.2, 0.7]).unwrap();
        assert_eq!(factorize(&model, &mut data).unwrap_err(), DynamicsError::StaleMassMatrix);
        assert!(!data.factor_valid);
        let b = DVector::from_element(3, 1.0);
        assert_eq!(solve(&model, &data, &b).unwrap_err(), DynamicsError::UnfactorizedMatrix);

        crba(&model, &mut data).unwrap();
        factorize(&model, &mut data).unwrap();
        let x = solve(&model, &data, &b).unwrap();
        assert_relative_eq!(&data.mass_matrix * x, b, epsilon = 1e-10);
    }

    #[test]
    fn test_pivot_tolerance_is_configurable() {
        let mut model = Model::chain(1);
        let mut data = model.make_data();
        data.mass_matrix = DMatrix::from_element(1, 1, 1e-6);
        data.mass_matrix_valid = true;
        assert!(factorize(&model, &mut data).is_ok());

        model.config.pivot_tolerance = 1e-3;
        assert!(factorize(&model, &mut data).is_err());
    }
}
