//! Forward kinematics: joint configuration to body placements.

use tracing::trace;

use crate::error::DynamicsError;
use crate::joint::JointCapability;
use crate::types::{Data, Model};

/// Compute `relative[i] = placement[i] * joint_i(q)` and
/// `absolute[i] = absolute[parent] * relative[i]` for every body.
///
/// Clears the mass-matrix and factor validity flags.
///
/// # Errors
///
/// - [`DynamicsError::ShapeMismatch`] if `q.len() != nq` or `data` was made
///   for a different model.
/// - [`DynamicsError::InvalidTopology`] if a parent does not precede its child.
pub fn forward_kinematics(model: &Model, data: &mut Data, q: &[f64]) -> crate::Result<()> {
    model.check_topology()?;
    data.check_model(model)?;
    if q.len() != model.nq {
        return Err(DynamicsError::shape_mismatch(
            "forward_kinematics configuration",
            model.nq,
            q.len(),
        ));
    }
    trace!(nbody = model.nbody, "forward kinematics");

    data.invalidate();
    for i in 1..model.nbody {
        let joint = &model.joints[i];
        let iq = model.idx_q[i];
        let relative = model.joint_placements[i] * joint.joint_transform(&q[iq..iq + joint.nq()]);
        data.relative[i] = relative;
        data.absolute[i] = data.absolute[model.parents[i]] * relative;
    }
    Ok(())
}

/// Recompute `absolute` from externally written `relative` placements.
///
/// # Errors
///
/// Same pairing and topology errors as [`forward_kinematics`].
pub fn update_absolute_placements(model: &Model, data: &mut Data) -> crate::Result<()> {
    model.check_topology()?;
    data.check_model(model)?;
    data.invalidate();
    for i in 1..model.nbody {
        data.absolute[i] = data.absolute[model.parents[i]] * data.relative[i];
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::FACTORY_LINK_LENGTH;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_chain_neutral_stacks_links() {
        let model = Model::chain(3);
        let mut data = model.make_data();
        forward_kinematics(&model, &mut data, &model.neutral_configuration()).unwrap();
        assert_relative_eq!(
            data.absolute[3].translation,
            Vector3::new(0.0, 0.0, 2.0 * FACTORY_LINK_LENGTH),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_first_joint_rotates_descendants() {
        // Chain axes cycle x, y, z: a quarter turn about x swings +z onto -y.
        let model = Model::chain(2);
        let mut data = model.make_data();
        forward_kinematics(&model, &mut data, &[FRAC_PI_2, 0.0]).unwrap();
        assert_relative_eq!(
            data.absolute[2].translation,
            Vector3::new(0.0, -FACTORY_LINK_LENGTH, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_wrong_configuration_length() {
        let model = Model::chain(2);
        let mut data = model.make_data();
        let err = forward_kinematics(&model, &mut data, &[0.0]).unwrap_err();
        assert_eq!(
            err,
            DynamicsError::shape_mismatch("forward_kinematics configuration", 2, 1)
        );
    }

    #[test]
    fn test_update_absolute_from_relative() {
        let model = Model::chain(3);
        let mut data = model.make_data();
        forward_kinematics(&model, &mut data, &[0.3, -0.2, 0.9]).unwrap();
        let expected = data.absolute.clone();
        for placement in data.absolute.iter_mut().skip(1) {
            *placement = sim_spatial::SpatialTransform::nan();
        }
        update_absolute_placements(&model, &mut data).unwrap();
        for (a, b) in data.absolute.iter().zip(&expected) {
            assert!(a.is_approx(b, 1e-14));
        }
    }
}
