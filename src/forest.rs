//! Forest construction and per-point path length aggregation.

use crate::config::ForestConfig;
use crate::error::{IsolationForestError, Result};
use crate::path_length::average_path_length;
use crate::scores::{raw_anomaly_score, standard_anomaly_score};
use crate::tree::IsolationTree;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, trace};

/// An immutable ensemble of isolation trees.
///
/// Scoring only borrows the forest, so one instance can serve any number of
/// query batches, from any number of threads.
#[derive(Debug, Clone)]
pub struct Forest {
    trees: Vec<IsolationTree>,
    n_features: usize,
    subsample_size: usize,
    parallel: bool,
}

impl PartialEq for Forest {
    fn eq(&self, other: &Self) -> bool {
        self.n_features == other.n_features
            && self.subsample_size == other.subsample_size
            && self.trees == other.trees
    }
}

/// Build `config.n_trees` independent trees over `dataset`.
///
/// Every tree draws its own `config.subsample_size` rows without replacement
/// and owns its own RNG, seeded from a master RNG before any tree is grown.
/// The resulting forest therefore depends only on the seed, not on whether
/// trees were built sequentially or on the rayon pool.
pub fn build_forest(dataset: &Array2<f64>, config: &ForestConfig) -> Result<Forest> {
    let (n_rows, n_features) = dataset.dim();
    config.validate(n_rows, n_features)?;
    check_finite(dataset)?;

    let height_limit = config.height_limit();
    let subsample_size = config.subsample_size;

    info!(
        n_trees = config.n_trees,
        subsample_size,
        height_limit,
        n_rows,
        n_features,
        parallel = config.parallel,
        "building isolation forest"
    );
    let start = Instant::now();

    let mut master = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_os_rng(),
    };
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master.random()).collect();

    let grow = |(i, seed): (usize, u64)| -> IsolationTree {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let rows = index::sample(&mut rng, n_rows, subsample_size).into_vec();
        let sample = dataset.select(Axis(0), &rows);
        let tree = IsolationTree::grow(sample.view(), height_limit, &mut rng);
        trace!(tree = i, depth = tree.depth(), leaves = tree.n_leaves(), "grew tree");
        tree
    };

    let trees: Vec<IsolationTree> = if config.parallel {
        tree_seeds.into_par_iter().enumerate().map(grow).collect()
    } else {
        tree_seeds.into_iter().enumerate().map(grow).collect()
    };

    info!(
        n_trees = trees.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "isolation forest built"
    );

    Ok(Forest {
        trees,
        n_features,
        subsample_size,
        parallel: config.parallel,
    })
}

fn check_finite(dataset: &Array2<f64>) -> Result<()> {
    match dataset.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((row, column), _)) => Err(IsolationForestError::NonFiniteValue { row, column }),
        None => Ok(()),
    }
}

impl Forest {
    pub fn trees(&self) -> &[IsolationTree] {
        &self.trees
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of features every query record must have.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn subsample_size(&self) -> usize {
        self.subsample_size
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Switch between rayon and sequential scoring. Scores are identical
    /// either way.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Mean corrected path length of `point` over all trees.
    ///
    /// `point` is not checked against [`Forest::n_features`]; the batch
    /// methods do that.
    pub fn mean_path_length(&self, point: ArrayView1<f64>) -> f64 {
        let total: f64 = self.trees.iter().map(|tree| tree.path_length(point)).sum();
        total / self.trees.len() as f64
    }

    /// Mean path length of every row of `batch`.
    pub fn average_path_lengths(&self, batch: &Array2<f64>) -> Result<Array1<f64>> {
        self.check_dimensions(batch)?;
        let n = batch.nrows();
        debug!(n_points = n, n_trees = self.trees.len(), "scoring batch");

        let lengths: Vec<f64> = if self.parallel {
            (0..n)
                .into_par_iter()
                .map(|i| self.mean_path_length(batch.row(i)))
                .collect()
        } else {
            batch
                .outer_iter()
                .map(|row| self.mean_path_length(row))
                .collect()
        };
        Ok(Array1::from_vec(lengths))
    }

    /// Raw anomaly score `2^-h` of every row, where `h` is its mean path length.
    pub fn score(&self, batch: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.average_path_lengths(batch)?.mapv(raw_anomaly_score))
    }

    /// Scores `2^(-h / c(subsample_size))`, bounded in `(0, 1]` and comparable
    /// across forests trained with different subsample sizes.
    pub fn standard_scores(&self, batch: &Array2<f64>) -> Result<Array1<f64>> {
        let c = average_path_length(self.subsample_size);
        Ok(self
            .average_path_lengths(batch)?
            .mapv(|h| standard_anomaly_score(h, c)))
    }

    /// Raw score of each record, with a separate dimension error for every
    /// record whose length does not match the forest.
    pub fn score_records(&self, records: &[Vec<f64>]) -> Vec<Result<f64>> {
        records
            .iter()
            .enumerate()
            .map(|(row, record)| {
                if record.len() != self.n_features {
                    return Err(IsolationForestError::DimensionMismatch {
                        row,
                        expected: self.n_features,
                        got: record.len(),
                    });
                }
                let point = ArrayView1::from(record.as_slice());
                Ok(raw_anomaly_score(self.mean_path_length(point)))
            })
            .collect()
    }

    /// How many internal nodes split on each feature, across all trees.
    pub fn feature_split_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_features];
        for tree in &self.trees {
            tree.accumulate_feature_splits(&mut counts);
        }
        counts
    }

    /// Share of all internal splits that used each feature. All zeros when no
    /// tree split at all.
    pub fn feature_split_shares(&self) -> Vec<f64> {
        let counts = self.feature_split_counts();
        let total: usize = counts.iter().sum();
        if total == 0 {
            return vec![0.0; counts.len()];
        }
        counts
            .iter()
            .map(|&c| c as f64 / total as f64)
            .collect()
    }

    fn check_dimensions(&self, batch: &Array2<f64>) -> Result<()> {
        if batch.nrows() > 0 && batch.ncols() != self.n_features {
            return Err(IsolationForestError::DimensionMismatch {
                row: 0,
                expected: self.n_features,
                got: batch.ncols(),
            });
        }
        Ok(())
    }
}
