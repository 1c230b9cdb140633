//! Model construction, name lookup and workspace pairing.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use nalgebra::Vector3;
use sim_articulated::{
    DynamicsError, FreeFlyer, Model, Prismatic, Revolute, UNIVERSE_NAME, crba, forward_kinematics,
};
use sim_spatial::{Inertia, SpatialTransform};

fn humanoid_fragment() -> Model {
    let y = Inertia::from_cylinder(2.0, 0.05, 0.4, Vector3::new(0.0, 0.0, -0.2));
    let down = SpatialTransform::from_translation(Vector3::new(0.0, 0.0, -0.4));
    let mut model = Model::new();
    let torso = model
        .add_body(0, FreeFlyer, SpatialTransform::identity(), y, Some("torso"))
        .unwrap();
    let hip = model.add_body(torso, Revolute::y(), down, y, Some("hip")).unwrap();
    model.add_body(hip, Revolute::y(), down, y, Some("knee")).unwrap();
    model
        .add_body(torso, Prismatic::new(Vector3::z()), down, y, None)
        .unwrap();
    model
}

#[test]
fn names_resolve_both_ways() {
    let model = humanoid_fragment();
    assert_eq!(model.body_id(UNIVERSE_NAME).unwrap(), 0);
    for (index, name) in [(1, "torso"), (2, "hip"), (3, "knee"), (4, "body_4")] {
        assert_eq!(model.body_id(name).unwrap(), index);
        assert_eq!(model.body_name(index), Some(name));
        assert!(model.exist_body_name(name));
    }
    assert!(matches!(model.body_id("elbow"), Err(DynamicsError::NotFound { .. })));
}

#[test]
fn dimensions_accumulate() {
    let model = humanoid_fragment();
    assert_eq!(model.nq, 7 + 1 + 1 + 1);
    assert_eq!(model.nv, 6 + 1 + 1 + 1);
    assert_eq!(model.idx_v, vec![0, 0, 6, 7, 8]);
}

#[test]
fn invalid_parent_is_rejected_without_mutation() {
    let mut model = humanoid_fragment();
    let snapshot = model.clone();
    let err = model
        .add_body(
            model.nbody,
            Revolute::x(),
            SpatialTransform::identity(),
            Inertia::identity(),
            Some("late"),
        )
        .unwrap_err();
    assert_eq!(
        err,
        DynamicsError::DuplicateOrInvalidParent {
            parent: snapshot.nbody,
            nbody: snapshot.nbody
        }
    );
    assert_eq!(model.nbody, snapshot.nbody);
    assert_eq!(model.nq, snapshot.nq);
    assert_eq!(model.parents, snapshot.parents);
    assert_eq!(model.names, snapshot.names);
    assert!(!model.exist_body_name("late"));
}

#[test]
fn display_lists_every_joint() {
    let text = humanoid_fragment().to_string();
    assert!(text.starts_with("Nb bodies = 5 (nq=10,nv=9)"));
    assert_eq!(text.lines().count(), 5);
    assert!(text.contains("Joint knee: parent=2"));
}

#[test]
fn workspace_from_other_model_is_rejected() {
    let model = humanoid_fragment();
    let mut data = Model::chain(3).make_data();
    let q = model.neutral_configuration();
    assert!(forward_kinematics(&model, &mut data, &q).unwrap_err().is_shape_mismatch());
    assert!(crba(&model, &mut data).unwrap_err().is_shape_mismatch());
}

#[test]
fn workspace_from_same_shape_other_topology_is_rejected() {
    let chain = Model::chain(3);
    let tree = Model::binary_tree(2);
    assert_eq!((chain.nbody, chain.nv), (tree.nbody, tree.nv));

    let mut tree_data = tree.make_data();
    let err = forward_kinematics(&chain, &mut tree_data, &[0.2, -0.4, 0.6]).unwrap_err();
    assert_eq!(err, DynamicsError::shape_mismatch("Data parent table", 2, 1));
    assert!(crba(&chain, &mut tree_data).unwrap_err().is_shape_mismatch());

    let mut chain_data = chain.make_data();
    assert!(crba(&tree, &mut chain_data).unwrap_err().is_shape_mismatch());
    assert!(!chain_data.mass_matrix_valid);
}

#[test]
fn shared_model_across_threads() {
    let model = std::sync::Arc::new(Model::binary_tree(3));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let model = std::sync::Arc::clone(&model);
            std::thread::spawn(move || {
                let mut data = model.make_data();
                let q = vec![0.1 * f64::from(t); model.nq];
                forward_kinematics(&model, &mut data, &q).unwrap();
                let m = crba(&model, &mut data).unwrap();
                m[(0, 0)]
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap() > 0.0);
    }
}
