//! Turning path lengths into anomaly scores and labels.
//!
//! Raw scores are `2^-h` for a mean path length `h`. A query batch is then
//! min-max normalized and thresholded at 0.5 into the `-1` (anomaly) / `+1`
//! (normal) convention used by common isolation forest libraries.

use crate::error::Result;
use crate::forest::Forest;
use ndarray::{Array1, Array2};
use tracing::debug;

/// Label of an anomalous record.
pub const ANOMALY: i8 = -1;

/// Label of a normal record.
pub const NORMAL: i8 = 1;

/// Normalized scores at or above this value are labelled [`ANOMALY`].
pub const LABEL_THRESHOLD: f64 = 0.5;

/// Raw anomaly scores for every row of `batch`.
pub fn score(forest: &Forest, batch: &Array2<f64>) -> Result<Array1<f64>> {
    forest.score(batch)
}

/// `2^-h`. Shorter mean paths give higher scores.
///
/// This is deliberately not divided by `c(subsample_size)`; see
/// [`standard_anomaly_score`] for the form from the literature.
pub fn raw_anomaly_score(avg_path_length: f64) -> f64 {
    2.0_f64.powf(-avg_path_length)
}

/// `2^(-h / c)` where `c` is the expected path length of the subsample.
/// Falls back to [`raw_anomaly_score`] when `c` is zero (a subsample of one).
pub fn standard_anomaly_score(avg_path_length: f64, c: f64) -> f64 {
    if c <= 0.0 {
        return raw_anomaly_score(avg_path_length);
    }
    2.0_f64.powf(-avg_path_length / c)
}

/// Min-max normalize a batch of scores into `[0, 1]`.
///
/// When every score is equal there is no range to divide by, and the scores
/// are returned unchanged. Raw scores already lie in `(0, 1]`.
pub fn normalize(scores: &Array1<f64>) -> Array1<f64> {
    let (min, max) = scores
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
            (lo.min(s), hi.max(s))
        });

    let range = max - min;
    if range.is_nan() || range <= 0.0 {
        debug!(n_scores = scores.len(), "degenerate score range, skipping normalization");
        return scores.clone();
    }

    scores.mapv(|s| (s - min) / range)
}

/// [`ANOMALY`] when `normalized_score >= 0.5`, [`NORMAL`] otherwise.
pub fn label(normalized_score: f64) -> i8 {
    if normalized_score >= LABEL_THRESHOLD {
        ANOMALY
    } else {
        NORMAL
    }
}

pub fn labels(normalized_scores: &Array1<f64>) -> Array1<i8> {
    normalized_scores.mapv(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_raw_anomaly_score() {
        assert_eq!(raw_anomaly_score(0.0), 1.0);
        assert_eq!(raw_anomaly_score(1.0), 0.5);
        assert_relative_eq!(raw_anomaly_score(3.0), 0.125, epsilon = 1e-15);
    }

    #[test]
    fn test_raw_score_decreases_with_path_length() {
        let scores: Vec<f64> = (0..20).map(|h| raw_anomaly_score(h as f64 * 0.5)).collect();
        assert!(scores.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_standard_anomaly_score() {
        assert_relative_eq!(standard_anomaly_score(4.0, 4.0), 0.5, epsilon = 1e-15);
        assert_eq!(standard_anomaly_score(0.0, 0.0), 1.0);
    }

    #[test]
    fn test_normalize_min_max() {
        let normalized = normalize(&array![0.2, 0.6, 0.4, 1.0]);
        assert_relative_eq!(normalized[0], 0.0);
        assert_relative_eq!(normalized[1], 0.5, epsilon = 1e-12);
        assert_relative_eq!(normalized[2], 0.25, epsilon = 1e-12);
        assert_relative_eq!(normalized[3], 1.0);
    }

    #[test]
    fn test_normalize_is_monotonic() {
        let scores = array![0.31, 0.05, 0.77, 0.31, 0.42, 0.9, 0.12];
        let normalized = normalize(&scores);
        for i in 0..scores.len() {
            for j in 0..scores.len() {
                if scores[i] <= scores[j] {
                    assert!(normalized[i] <= normalized[j]);
                }
            }
        }
    }

    #[test]
    fn test_normalize_equal_scores_pass_through() {
        let scores = array![0.25, 0.25, 0.25];
        let normalized = normalize(&scores);
        assert_eq!(normalized, scores);
        assert!(normalized.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_normalize_single_and_empty() {
        assert_eq!(normalize(&array![0.7]), array![0.7]);
        assert_eq!(normalize(&Array1::<f64>::zeros(0)).len(), 0);
    }

    #[test]
    fn test_label_boundary_is_anomalous() {
        assert_eq!(label(0.5), ANOMALY);
        assert_eq!(label(0.499999), NORMAL);
        assert_eq!(label(1.0), ANOMALY);
        assert_eq!(label(0.0), NORMAL);
    }

    #[test]
    fn test_labels_vector() {
        assert_eq!(labels(&array![0.0, 0.5, 0.2, 0.95]), array![1, -1, 1, -1]);
    }
}
