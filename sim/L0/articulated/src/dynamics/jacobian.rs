//! World-frame joint Jacobians.
//!
//! Column `idx_v[i] + k` is joint `i`'s `k`-th subspace column carried to
//! the world frame by `absolute[i]`, angular rows first. A body's Jacobian
//! keeps only the columns of its ancestor chain.

use nalgebra::Matrix6xX;
use sim_spatial::SpatialAction;

use crate::error::DynamicsError;
use crate::joint::JointCapability;
use crate::types::{Data, Model};

/// Fill `data.jacobian` with every joint's world-frame columns.
///
/// # Errors
///
/// Pairing and topology errors as in [`forward_kinematics`](super::forward_kinematics).
pub fn compute_jacobians<'a>(model: &Model, data: &'a mut Data) -> crate::Result<&'a Matrix6xX<f64>> {
    model.check_topology()?;
    data.check_model(model)?;
    for i in 1..model.nbody {
        let joint = &model.joints[i];
        let iv = model.idx_v[i];
        for k in 0..joint.nv() {
            let column = joint.subspace_column(k).act_by(&data.absolute[i]).to_vector();
            data.jacobian.set_column(iv + k, &column);
        }
    }
    Ok(&data.jacobian)
}

/// World-frame Jacobian of `body`: nonzero only on its ancestor chain.
///
/// Maps joint velocities to the spatial velocity of `body` expressed in the
/// world frame (at the world origin).
///
/// # Errors
///
/// - [`DynamicsError::ShapeMismatch`] if `body >= nbody` or `data` was made
///   for another model.
/// - [`DynamicsError::InvalidTopology`] if a parent does not precede its child.
pub fn body_jacobian(model: &Model, data: &Data, body: usize) -> crate::Result<Matrix6xX<f64>> {
    model.check_topology()?;
    data.check_model(model)?;
    if body >= model.nbody {
        return Err(DynamicsError::shape_mismatch("body_jacobian body index", model.nbody, body));
    }

    let mut out = Matrix6xX::zeros(model.nv);
    let mut i = body;
    while i > 0 {
        let joint = &model.joints[i];
        let iv = model.idx_v[i];
        for k in 0..joint.nv() {
            let column = joint.subspace_column(k).act_by(&data.absolute[i]).to_vector();
            out.set_column(iv + k, &column);
        }
        i = model.parents[i];
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::dynamics::{crba, forward_kinematics};
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, Vector3};

    #[test]
    fn test_planar_two_link_tip_velocity() {
        // Two z-axis hinges one unit apart: linear velocity of the second
        // joint's origin point under the first joint is ω × r.
        let mut model = Model::new();
        let y = sim_spatial::Inertia::from_sphere(1.0, 0.1, Vector3::zeros());
        model
            .add_body(0, crate::joint::Revolute::z(), sim_spatial::SpatialTransform::identity(), y, None)
            .unwrap();
        model
            .add_body(
                1,
                crate::joint::Revolute::z(),
                sim_spatial::SpatialTransform::from_translation(Vector3::x()),
                y,
                None,
            )
            .unwrap();
        let mut data = model.make_data();
        forward_kinematics(&model, &mut data, &[0.0, 0.0]).unwrap();
        let j = body_jacobian(&model, &data, 2).unwrap();

        // Velocity of the world point at body 2's origin, from joint 1.
        let twist = j.column(0);
        let omega = Vector3::new(twist[0], twist[1], twist[2]);
        let v_origin = Vector3::new(twist[3], twist[4], twist[5]);
        let v_point = v_origin + omega.cross(&Vector3::x());
        assert_relative_eq!(v_point, Vector3::y(), epsilon = 1e-15);
    }

    #[test]
    fn test_body_jacobian_zero_off_chain() {
        let model = Model::binary_tree(2);
        let mut data = model.make_data();
        forward_kinematics(&model, &mut data, &[0.3, 0.1, -0.4]).unwrap();
        let j = body_jacobian(&model, &data, 2).unwrap();
        assert!(j.column(2).iter().all(|v| *v == 0.0));
        let full = compute_jacobians(&model, &mut data).unwrap();
        assert_relative_eq!(j.column(0).into_owned(), full.column(0).into_owned(), epsilon = 1e-15);
    }

    #[test]
    fn test_mass_matrix_from_jacobians() {
        // M = Σ_i J_iᵀ Y_i J_i with each body's inertia in the world frame.
        let model = Model::binary_tree(3);
        let mut data = model.make_data();
        let q: Vec<f64> = (0..model.nq).map(|k| 0.5 - 0.15 * k as f64).collect();
        forward_kinematics(&model, &mut data, &q).unwrap();
        let mut expected = DMatrix::zeros(model.nv, model.nv);
        for i in 1..model.nbody {
            let j = body_jacobian(&model, &data, i).unwrap();
            let y = model.inertias[i].act_by(&data.absolute[i]).matrix();
            expected += j.transpose() * y * &j;
        }
        let m = crba(&model, &mut data).unwrap();
        assert_relative_eq!(m.clone(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_body_out_of_range() {
        let model = Model::chain(2);
        let data = model.make_data();
        assert!(body_jacobian(&model, &data, 3).unwrap_err().is_shape_mismatch());
    }
}
