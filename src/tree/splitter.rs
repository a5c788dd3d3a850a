//! Random feature and threshold selection for a single cut.

use ndarray::ArrayView2;
use rand::Rng;

/// Result of asking the splitter for a cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitOutcome {
    /// Records with `partition[feature] < value` go left, the rest go right.
    Split { feature: usize, value: f64 },
    /// The chosen feature is constant across the partition.
    Degenerate { feature: usize },
}

/// Picks a uniformly random feature and a uniformly random threshold inside
/// that feature's observed range.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSplitter;

impl RandomSplitter {
    pub fn split<R: Rng + ?Sized>(&self, partition: ArrayView2<f64>, rng: &mut R) -> SplitOutcome {
        let feature = rng.random_range(0..partition.ncols());
        let (min, max) = feature_range(partition, feature);

        // Also covers an empty partition, where min stays at +inf.
        if min >= max {
            return SplitOutcome::Degenerate { feature };
        }

        SplitOutcome::Split {
            feature,
            value: interpolate(min, max, rng.random::<f64>()),
        }
    }
}

/// Point `t` of the way from `min` to `max`. Stays finite when `max - min`
/// overflows.
fn interpolate(min: f64, max: f64, t: f64) -> f64 {
    (min * (1.0 - t) + max * t).clamp(min, max)
}

fn feature_range(partition: ArrayView2<f64>, feature: usize) -> (f64, f64) {
    partition
        .column(feature)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}
