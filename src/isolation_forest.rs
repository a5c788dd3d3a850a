//! Training and detection entry points.

use crate::config::ForestConfig;
use crate::error::{IsolationForestError, Result};
use crate::forest::{Forest, build_forest};
use crate::scores::{ANOMALY, labels, normalize};
use ndarray::{Array1, Array2};

/// Build a forest over `dataset` and score the training records.
///
/// Returns the forest together with the min-max normalized scores of
/// `dataset`, in row order. The configuration is checked before any tree is
/// built.
///
/// # Example
///
/// ```
/// use isoforest_rs::{ForestConfig, labels, train};
/// use ndarray::array;
///
/// let data = array![[1.0], [2.0], [3.0], [4.0], [100.0]];
/// let config = ForestConfig::new(50, 5).with_seed(42);
/// let (forest, scores) = train(&data, &config).unwrap();
///
/// assert_eq!(forest.n_trees(), 50);
/// assert_eq!(labels(&scores)[4], -1);
/// ```
pub fn train(dataset: &Array2<f64>, config: &ForestConfig) -> Result<(Forest, Array1<f64>)> {
    let forest = build_forest(dataset, config)?;
    let scores = normalize(&forest.score(dataset)?);
    Ok((forest, scores))
}

/// Scores and labels for one query batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Raw `2^-h` scores.
    pub raw_scores: Array1<f64>,
    /// Batch min-max normalized scores.
    pub scores: Array1<f64>,
    /// `-1` for anomalies, `+1` for normal records.
    pub labels: Array1<i8>,
}

impl Detection {
    /// Row indices labelled as anomalies.
    pub fn anomaly_indices(&self) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(i, &l)| if l == ANOMALY { Some(i) } else { None })
            .collect()
    }

    pub fn anomaly_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == ANOMALY).count()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Score, normalize and label `batch` against a trained forest.
pub fn detect(forest: &Forest, batch: &Array2<f64>) -> Result<Detection> {
    let raw_scores = forest.score(batch)?;
    let scores = normalize(&raw_scores);
    let labels = labels(&scores);
    Ok(Detection {
        raw_scores,
        scores,
        labels,
    })
}

/// Stack row-major records into a matrix.
///
/// Every record must have the length of the first one; the first record that
/// does not is reported.
pub fn dataset_from_records(records: &[Vec<f64>]) -> Result<Array2<f64>> {
    let n_features = records.first().map_or(0, |r| r.len());
    let mut flat = Vec::with_capacity(records.len() * n_features);

    for (row, record) in records.iter().enumerate() {
        if record.len() != n_features {
            return Err(IsolationForestError::DimensionMismatch {
                row,
                expected: n_features,
                got: record.len(),
            });
        }
        flat.extend_from_slice(record);
    }

    Array2::from_shape_vec((records.len(), n_features), flat).map_err(|e| {
        IsolationForestError::invalid_configuration("dataset", e.to_string())
    })
}
