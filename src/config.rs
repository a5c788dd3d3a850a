//! Forest configuration.

use crate::error::{IsolationForestError, Result};
use serde::{Deserialize, Serialize};

/// Default number of trees in the ensemble.
pub const DEFAULT_N_TREES: usize = 100;

/// Default number of records drawn for each tree.
pub const DEFAULT_SUBSAMPLE_SIZE: usize = 256;

/// Options controlling how a forest is built.
///
/// Missing fields take their defaults when deserialized, so a collaborator can
/// ship `{"n_trees": 50}` and get the documented subsample size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of isolation trees (default: 100).
    pub n_trees: usize,
    /// Records drawn without replacement for each tree (default: 256).
    pub subsample_size: usize,
    /// Seed for the forest's master RNG. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Build trees and score points on the rayon pool (default: true).
    pub parallel: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: DEFAULT_N_TREES,
            subsample_size: DEFAULT_SUBSAMPLE_SIZE,
            seed: None,
            parallel: true,
        }
    }
}

impl ForestConfig {
    pub fn new(n_trees: usize, subsample_size: usize) -> Self {
        Self {
            n_trees,
            subsample_size,
            ..Self::default()
        }
    }

    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn with_subsample_size(mut self, subsample_size: usize) -> Self {
        self.subsample_size = subsample_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Maximum tree height, `ceil(log2(subsample_size))`.
    pub fn height_limit(&self) -> usize {
        (usize::BITS - self.subsample_size.saturating_sub(1).leading_zeros()) as usize
    }

    /// Check the configuration against a dataset of `n_rows` x `n_features`.
    pub fn validate(&self, n_rows: usize, n_features: usize) -> Result<()> {
        if self.n_trees == 0 {
            return Err(IsolationForestError::invalid_configuration(
                "n_trees",
                "must be at least 1",
            ));
        }
        if self.subsample_size == 0 {
            return Err(IsolationForestError::invalid_configuration(
                "subsample_size",
                "must be at least 1",
            ));
        }
        if self.subsample_size > n_rows {
            return Err(IsolationForestError::invalid_configuration(
                "subsample_size",
                format!(
                    "must not exceed the number of records ({}), got {}",
                    n_rows, self.subsample_size
                ),
            ));
        }
        if n_features == 0 {
            return Err(IsolationForestError::invalid_configuration(
                "dataset",
                "records must have at least one feature",
            ));
        }
        Ok(())
    }
}
