//! Batched evaluation: N independent workspaces sharing one [`Model`].
//!
//! Every environment owns its own [`Data`]; the model is shared read-only
//! through an [`Arc`]. Evaluation is parallelized across environments via
//! rayon when the `parallel` feature is enabled and runs sequentially
//! otherwise, with identical results.
//!
//! # Examples
//!
//! ```
//! use sim_articulated::{BatchDynamics, Model};
//! use std::sync::Arc;
//!
//! let model = Arc::new(Model::chain(3));
//! let mut batch = BatchDynamics::new(model, 2);
//! let configs = vec![vec![0.0; 3], vec![0.5, -0.2, 1.0]];
//! let results = batch.compute_all(&configs);
//! assert!(results.iter().all(Result::is_ok));
//! ```

use std::sync::Arc;

use crate::dynamics::{crba, factorize, forward_kinematics};
use crate::error::DynamicsError;
use crate::types::{Data, Model};

/// N dynamics workspaces sharing one [`Model`].
#[derive(Debug, Clone)]
pub struct BatchDynamics {
    model: Arc<Model>,
    envs: Vec<Data>,
}

impl BatchDynamics {
    /// Create `n` workspaces for `model`.
    #[must_use]
    pub fn new(model: Arc<Model>, n: usize) -> Self {
        let envs = (0..n).map(|_| model.make_data()).collect();
        Self { model, envs }
    }

    /// Number of environments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.envs.len()
    }

    /// Whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.envs.is_empty()
    }

    /// Shared model.
    #[must_use]
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Workspace of environment `i`, if it exists.
    #[must_use]
    pub fn env(&self, i: usize) -> Option<&Data> {
        self.envs.get(i)
    }

    /// Iterator over all workspaces.
    pub fn envs(&self) -> impl ExactSizeIterator<Item = &Data> {
        self.envs.iter()
    }

    /// Run forward kinematics, CRBA and factorization for every environment,
    /// environment `i` using `configs[i]`.
    ///
    /// Returns one result per environment. Environments without a matching
    /// configuration report a [`DynamicsError::ShapeMismatch`]; extra
    /// configurations are ignored.
    pub fn compute_all(&mut self, configs: &[Vec<f64>]) -> Vec<crate::Result<()>> {
        let model = &self.model;
        let run = |(i, data): (usize, &mut Data)| -> crate::Result<()> {
            let q = configs
                .get(i)
                .ok_or_else(|| DynamicsError::shape_mismatch("compute_all configurations", i + 1, configs.len()))?;
            forward_kinematics(model, data, q)?;
            crba(model, data)?;
            factorize(model, data)
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::iter::{IndexedParallelIterator, IntoParallelRefMutIterator, ParallelIterator};
            self.envs.par_iter_mut().enumerate().map(run).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.envs.iter_mut().enumerate().map(run).collect()
        }
    }
}
