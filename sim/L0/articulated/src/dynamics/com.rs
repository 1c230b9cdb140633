//! Subtree mass, centre of mass and its Jacobian.

use nalgebra::{Matrix3xX, Vector3};
use sim_spatial::SpatialAction;

use crate::joint::JointCapability;
use crate::types::{Data, Model};

/// Fill `data.subtree_mass` and `data.subtree_com` (world frame) from the
/// absolute placements and return the whole-system centre of mass.
///
/// Massless subtrees report their root's origin as centre of mass.
///
/// # Errors
///
/// Pairing and topology errors as in [`forward_kinematics`](super::forward_kinematics).
pub fn center_of_mass(model: &Model, data: &mut Data) -> crate::Result<Vector3<f64>> {
    model.check_topology()?;
    data.check_model(model)?;

    for i in 0..model.nbody {
        let inertia = &model.inertias[i];
        data.subtree_mass[i] = inertia.mass;
        data.subtree_com[i] = data.absolute[i].transform_point(&inertia.lever) * inertia.mass;
    }

    for i in (1..model.nbody).rev() {
        let parent = model.parents[i];
        let (mass, weighted) = (data.subtree_mass[i], data.subtree_com[i]);
        data.subtree_mass[parent] += mass;
        data.subtree_com[parent] += weighted;
    }

    for i in 0..model.nbody {
        let mass = data.subtree_mass[i];
        data.subtree_com[i] = if mass > 0.0 {
            data.subtree_com[i] / mass
        } else {
            data.absolute[i].translation
        };
    }
    Ok(data.subtree_com[0])
}

/// Fill `data.com_jacobian`, mapping joint velocities to the world-frame
/// velocity of the whole-system centre of mass.
///
/// Joint `i` moves its whole subtree rigidly, so its column `S` (world
/// frame) contributes `m_i / m (v + ω × c_i)` with `c_i` the subtree's
/// centre of mass. Refreshes `subtree_mass`/`subtree_com` first. A massless
/// model yields zeros.
///
/// # Errors
///
/// Pairing and topology errors as in [`forward_kinematics`](super::forward_kinematics).
pub fn compute_com_jacobian<'a>(model: &Model, data: &'a mut Data) -> crate::Result<&'a Matrix3xX<f64>> {
    center_of_mass(model, data)?;
    let total = data.subtree_mass[0];
    if total <= 0.0 {
        data.com_jacobian.fill(0.0);
        return Ok(&data.com_jacobian);
    }

    for i in 1..model.nbody {
        let joint = &model.joints[i];
        let iv = model.idx_v[i];
        let share = data.subtree_mass[i] / total;
        let com = data.subtree_com[i];
        for k in 0..joint.nv() {
            let s = joint.subspace_column(k).act_by(&data.absolute[i]);
            let column = (s.linear + s.angular.cross(&com)) * share;
            data.com_jacobian.set_column(iv + k, &column);
        }
    }
    Ok(&data.com_jacobian)
}
