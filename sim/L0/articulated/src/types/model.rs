//! Model struct definition, incremental construction and name lookup.
//!
//! [`Model`] is the static description of a kinematic tree: parent indices,
//! joint placements, body inertias, joint kinds and the configuration/velocity
//! offsets derived from them. It is built once through [`Model::add_body`]
//! and then shared read-only by every [`Data`] created from it.

use std::collections::HashMap;

use sim_spatial::{Inertia, SpatialTransform};
use tracing::debug;

use crate::config::DynamicsConfig;
use crate::error::DynamicsError;
use crate::joint::{Fixed, JointCapability, JointModel};

use super::data::Data;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Name given to body 0.
pub const UNIVERSE_NAME: &str = "universe";

/// Static kinematic-tree description.
///
/// # Memory Layout
///
/// Every per-body array is indexed by body id, with body 0 the fixed universe
/// frame. Bodies are stored in a topological order: `parents[i] < i` for every
/// `i >= 1`. Subtrees need not be contiguous.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Model {
    // ==================== Dimensions ====================
    /// Number of configuration coordinates.
    pub nq: usize,
    /// Number of velocity coordinates (DOFs).
    pub nv: usize,
    /// Number of bodies, universe included.
    pub nbody: usize,

    // ==================== Tree ====================
    /// Parent body of each body (`parents[0] == 0`).
    pub parents: Vec<usize>,
    /// Placement of each joint's input frame in its parent body's frame.
    pub joint_placements: Vec<SpatialTransform>,
    /// Body spatial inertia, expressed in the body's joint frame.
    pub inertias: Vec<Inertia>,
    /// Joint connecting each body to its parent.
    pub joints: Vec<JointModel>,
    /// First configuration coordinate of each joint.
    pub idx_q: Vec<usize>,
    /// First velocity coordinate of each joint.
    pub idx_v: Vec<usize>,

    // ==================== Names ====================
    /// Display name of each body.
    pub names: Vec<String>,
    name_to_id: HashMap<String, usize>,

    // ==================== Options ====================
    /// Numerical settings used by CRBA and the factorization.
    pub config: DynamicsConfig,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Model containing only the universe body.
    #[must_use]
    pub fn new() -> Self {
        let mut name_to_id = HashMap::new();
        name_to_id.insert(UNIVERSE_NAME.to_string(), 0);
        Self {
            nq: 0,
            nv: 0,
            nbody: 1,
            parents: vec![0],
            joint_placements: vec![SpatialTransform::identity()],
            inertias: vec![Inertia::zero()],
            joints: vec![JointModel::Fixed(Fixed)],
            idx_q: vec![0],
            idx_v: vec![0],
            names: vec![UNIVERSE_NAME.to_string()],
            name_to_id,
            config: DynamicsConfig::default(),
        }
    }

    /// Append a body attached to `parent` through `joint`.
    ///
    /// `placement` locates the joint input frame in the parent's frame and
    /// `inertia` is the body inertia in the joint output frame. Unnamed bodies
    /// get `body_<index>`. Returns the new body index.
    ///
    /// # Errors
    ///
    /// - [`DynamicsError::DuplicateOrInvalidParent`] if `parent >= nbody`.
    /// - [`DynamicsError::DuplicateName`] if `name` is already taken.
    ///
    /// The model is left untouched on error.
    pub fn add_body(
        &mut self,
        parent: usize,
        joint: impl Into<JointModel>,
        placement: SpatialTransform,
        inertia: Inertia,
        name: Option<&str>,
    ) -> crate::Result<usize> {
        if parent >= self.nbody {
            return Err(DynamicsError::DuplicateOrInvalidParent {
                parent,
                nbody: self.nbody,
            });
        }
        let index = self.nbody;
        let name = match name {
            Some(name) if self.name_to_id.contains_key(name) => {
                return Err(DynamicsError::DuplicateName {
                    name: name.to_string(),
                });
            }
            Some(name) => name.to_string(),
            None => self.generated_name(index),
        };

        let joint = joint.into();
        self.idx_q.push(self.nq);
        self.idx_v.push(self.nv);
        self.nq += joint.nq();
        self.nv += joint.nv();

        self.parents.push(parent);
        self.joint_placements.push(placement);
        self.inertias.push(inertia);
        self.joints.push(joint);
        self.name_to_id.insert(name.clone(), index);
        self.names.push(name);
        self.nbody += 1;

        debug!(
            body = index,
            parent,
            joint = joint.kind(),
            nq = self.nq,
            nv = self.nv,
            "added body {}",
            self.names[index]
        );
        Ok(index)
    }

    fn generated_name(&self, index: usize) -> String {
        let base = format!("body_{index}");
        if !self.name_to_id.contains_key(&base) {
            return base;
        }
        let mut suffix = 1;
        loop {
            let candidate = format!("{base}_{suffix}");
            if !self.name_to_id.contains_key(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Index of the body called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DynamicsError::NotFound`] if no body has that name.
    pub fn body_id(&self, name: &str) -> crate::Result<usize> {
        self.name_to_id
            .get(name)
            .copied()
            .ok_or_else(|| DynamicsError::not_found(name))
    }

    /// Whether a body called `name` exists.
    #[must_use]
    pub fn exist_body_name(&self, name: &str) -> bool {
        self.name_to_id.contains_key(name)
    }

    /// Name of body `index`, if it exists.
    #[must_use]
    pub fn body_name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Number of velocity coordinates of body `i`'s joint.
    #[must_use]
    pub fn joint_nv(&self, i: usize) -> usize {
        self.joints[i].nv()
    }

    /// Configuration with every joint at its neutral value.
    #[must_use]
    pub fn neutral_configuration(&self) -> Vec<f64> {
        let mut q = vec![0.0; self.nq];
        for (joint, &iq) in self.joints.iter().zip(&self.idx_q) {
            joint.neutral(&mut q[iq..iq + joint.nq()]);
        }
        q
    }

    /// Replace the numerical settings.
    ///
    /// # Errors
    ///
    /// Returns [`DynamicsError::InvalidConfig`] if `config` fails validation;
    /// the current settings are kept.
    pub fn set_config(&mut self, config: DynamicsConfig) -> crate::Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Check that parents precede children.
    ///
    /// # Errors
    ///
    /// Returns [`DynamicsError::InvalidTopology`] for the first body whose
    /// parent index is not smaller than its own.
    pub fn check_topology(&self) -> crate::Result<()> {
        for (body, &parent) in self.parents.iter().enumerate().skip(1) {
            if parent >= body {
                return Err(DynamicsError::InvalidTopology { body, parent });
            }
        }
        Ok(())
    }

    /// Allocate a workspace for this model.
    #[must_use]
    pub fn make_data(&self) -> Data {
        Data::new(self)
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Nb bodies = {} (nq={},nv={})",
            self.nbody, self.nq, self.nv
        )?;
        for i in 1..self.nbody {
            writeln!(
                f,
                "  Joint {}: parent={} ({}, nv={})",
                self.names[i],
                self.parents[i],
                self.joints[i].kind(),
                self.joints[i].nv()
            )?;
        }
        Ok(())
    }
}
