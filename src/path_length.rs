//! Path length of a point through an isolation tree.

use crate::tree::Node;
use ndarray::ArrayView1;
use statrs::consts::EULER_MASCHERONI;

/// Expected path length `c(n)` needed to isolate `n` points that were left
/// unsplit in a leaf:
///
/// `c(n) = 2 (ln(n - 1) + γ) - 2 (n - 1) / n`
///
/// Returns 0 for `n <= 1`, where a point is already isolated.
pub fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * ((n - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (n - 1.0) / n
}

/// Walk `node` for `point`, counting edges from `edge_count`.
///
/// - a missing node stops the walk with the edges counted so far;
/// - a leaf of one record adds nothing;
/// - a leaf of `n > 1` records adds `c(n)`;
/// - an internal node sends the point left when `point[feature] < threshold`.
///
/// `point` must have at least as many features as the tree was grown on.
pub fn path_length(point: ArrayView1<f64>, node: Option<&Node>, edge_count: usize) -> f64 {
    let mut edges = edge_count;
    let mut current = node;

    loop {
        match current {
            None => return edges as f64,
            Some(Node::External { records }) => {
                let n = records.nrows();
                if n <= 1 {
                    return edges as f64;
                }
                return edges as f64 + average_path_length(n);
            }
            Some(Node::Internal {
                feature,
                threshold,
                left,
                right,
            }) => {
                let next = if point[*feature] < *threshold { left } else { right };
                current = next.as_deref();
                edges += 1;
            }
        }
    }
}
