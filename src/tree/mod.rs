//! Isolation trees.
//!
//! A tree is grown once from a subsample by recursively cutting it at random
//! thresholds, and is read-only afterwards.

pub mod splitter;

pub use splitter::{RandomSplitter, SplitOutcome};

use crate::path_length::path_length;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;

/// A node of an isolation tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Routes a point left when `point[feature] < threshold`, right otherwise.
    /// A `None` child means no training record reached that side.
    Internal {
        feature: usize,
        threshold: f64,
        left: Option<Box<Node>>,
        right: Option<Box<Node>>,
    },
    /// Holds the records left unsplit at the end of a branch.
    External { records: Array2<f64> },
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::External { .. })
    }

    /// Number of records stored beneath this node.
    pub fn size(&self) -> usize {
        match self {
            Node::External { records } => records.nrows(),
            Node::Internal { left, right, .. } => child_size(left) + child_size(right),
        }
    }

    fn depth(&self) -> usize {
        match self {
            Node::External { .. } => 0,
            Node::Internal { left, right, .. } => {
                let l = left.as_ref().map_or(0, |n| n.depth());
                let r = right.as_ref().map_or(0, |n| n.depth());
                1 + l.max(r)
            }
        }
    }

    fn count(&self, leaves: &mut usize, internal: &mut usize) {
        match self {
            Node::External { .. } => *leaves += 1,
            Node::Internal { left, right, .. } => {
                *internal += 1;
                for child in [left, right].into_iter().flatten() {
                    child.count(leaves, internal);
                }
            }
        }
    }

    fn accumulate_splits(&self, counts: &mut [usize]) {
        if let Node::Internal {
            feature,
            left,
            right,
            ..
        } = self
        {
            counts[*feature] += 1;
            for child in [left, right].into_iter().flatten() {
                child.accumulate_splits(counts);
            }
        }
    }
}

fn child_size(child: &Option<Box<Node>>) -> usize {
    child.as_ref().map_or(0, |n| n.size())
}

/// Recursively partition `partition` starting at `depth`.
///
/// Returns `None` for an empty partition. Stops with a leaf on a single
/// record, on reaching `height_limit`, or when the drawn feature is constant.
pub fn build_node<R: Rng + ?Sized>(
    partition: ArrayView2<f64>,
    depth: usize,
    height_limit: usize,
    rng: &mut R,
) -> Option<Node> {
    if partition.nrows() == 0 {
        return None;
    }
    if partition.nrows() == 1 || depth >= height_limit {
        return Some(Node::External {
            records: partition.to_owned(),
        });
    }

    let (feature, threshold) = match RandomSplitter.split(partition, rng) {
        SplitOutcome::Split { feature, value } => (feature, value),
        SplitOutcome::Degenerate { .. } => {
            return Some(Node::External {
                records: partition.to_owned(),
            });
        }
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
        (0..partition.nrows()).partition(|&i| partition[[i, feature]] < threshold);

    let left_data = partition.select(Axis(0), &left_idx);
    let right_data = partition.select(Axis(0), &right_idx);

    let left = build_node(left_data.view(), depth + 1, height_limit, rng).map(Box::new);
    let right = build_node(right_data.view(), depth + 1, height_limit, rng).map(Box::new);

    Some(Node::Internal {
        feature,
        threshold,
        left,
        right,
    })
}

/// A single randomized partition tree.
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationTree {
    root: Node,
    height_limit: usize,
}

impl IsolationTree {
    /// Grow a tree over `sample`. A sample without rows gives a single empty
    /// leaf, which every point reaches in zero edges.
    pub fn grow<R: Rng + ?Sized>(sample: ArrayView2<f64>, height_limit: usize, rng: &mut R) -> Self {
        let root = build_node(sample, 0, height_limit, rng).unwrap_or_else(|| Node::External {
            records: sample.to_owned(),
        });
        IsolationTree { root, height_limit }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn height_limit(&self) -> usize {
        self.height_limit
    }

    /// Corrected path length of `point`, starting from zero edges at the root.
    pub fn path_length(&self, point: ArrayView1<f64>) -> f64 {
        path_length(point, Some(&self.root), 0)
    }

    /// Length in edges of the longest root-to-node path.
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn n_leaves(&self) -> usize {
        let (mut leaves, mut internal) = (0, 0);
        self.root.count(&mut leaves, &mut internal);
        leaves
    }

    pub fn n_internal(&self) -> usize {
        let (mut leaves, mut internal) = (0, 0);
        self.root.count(&mut leaves, &mut internal);
        internal
    }

    /// Add one to `counts[f]` for every internal node splitting on feature `f`.
    pub fn accumulate_feature_splits(&self, counts: &mut [usize]) {
        self.root.accumulate_splits(counts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn leaf_sizes(node: &Node, out: &mut Vec<usize>) {
        match node {
            Node::External { records } => out.push(records.nrows()),
            Node::Internal { left, right, .. } => {
                for child in [left, right].into_iter().flatten() {
                    leaf_sizes(child, out);
                }
            }
        }
    }

    #[test]
    fn test_empty_partition_yields_no_node() {
        let data = Array2::<f64>::zeros((0, 3));
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(build_node(data.view(), 0, 4, &mut rng).is_none());
    }

    #[test]
    fn test_empty_sample_grows_empty_leaf() {
        let data = Array2::<f64>::zeros((0, 2));
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let tree = IsolationTree::grow(data.view(), 3, &mut rng);
        assert!(tree.root().is_leaf());
        assert_eq!(tree.root().size(), 0);
        assert_eq!(tree.path_length(array![1.0, 2.0].view()), 0.0);
    }

    #[test]
    fn test_single_record_is_leaf() {
        let data = array![[1.0, 2.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let tree = IsolationTree::grow(data.view(), 0, &mut rng);
        assert!(tree.root().is_leaf());
        assert_eq!(tree.root().size(), 1);
    }

    #[test]
    fn test_height_limit_zero_makes_root_leaf() {
        let data = array![[1.0], [2.0], [3.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let tree = IsolationTree::grow(data.view(), 0, &mut rng);
        assert_eq!(tree.root(), &Node::External { records: data });
    }

    #[test]
    fn test_constant_data_becomes_single_leaf() {
        let data = array![[5.0, 5.0], [5.0, 5.0], [5.0, 5.0], [5.0, 5.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let tree = IsolationTree::grow(data.view(), 2, &mut rng);
        assert!(tree.root().is_leaf());
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.n_internal(), 0);
    }

    #[test]
    fn test_depth_never_exceeds_height_limit() {
        let data = Array2::from_shape_fn((64, 3), |(i, j)| ((i * 7 + j * 13) % 29) as f64);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..20 {
            let tree = IsolationTree::grow(data.view(), 6, &mut rng);
            assert!(tree.depth() <= 6);
        }
    }

    #[test]
    fn test_leaves_partition_the_sample() {
        let data = Array2::from_shape_fn((32, 2), |(i, j)| (i as f64) * (j as f64 + 1.0));
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let tree = IsolationTree::grow(data.view(), 5, &mut rng);

        let mut sizes = Vec::new();
        leaf_sizes(tree.root(), &mut sizes);
        assert_eq!(sizes.iter().sum::<usize>(), 32);
        assert_eq!(tree.root().size(), 32);
        assert_eq!(sizes.len(), tree.n_leaves());
    }

    #[test]
    fn test_internal_nodes_route_by_threshold() {
        fn check(node: &Node) {
            if let Node::Internal {
                feature,
                threshold,
                left,
                right,
            } = node
            {
                let mut stack: Vec<(&Node, bool)> = Vec::new();
                if let Some(l) = left {
                    stack.push((l.as_ref(), true));
                }
                if let Some(r) = right {
                    stack.push((r.as_ref(), false));
                }
                while let Some((n, is_left)) = stack.pop() {
                    match n {
                        Node::External { records } => {
                            for v in records.column(*feature) {
                                assert_eq!(*v < *threshold, is_left);
                            }
                        }
                        Node::Internal { left, right, .. } => {
                            for c in [left, right].into_iter().flatten() {
                                stack.push((c.as_ref(), is_left));
                            }
                        }
                    }
                }
                for c in [left, right].into_iter().flatten() {
                    check(c);
                }
            }
        }

        let data = Array2::from_shape_fn((40, 2), |(i, j)| ((i * 31 + j * 17) % 23) as f64);
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let tree = IsolationTree::grow(data.view(), 6, &mut rng);
        check(tree.root());
    }

    #[test]
    fn test_feature_split_counts_match_internal_nodes() {
        let data = Array2::from_shape_fn((16, 3), |(i, j)| (i * (j + 1)) as f64);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let tree = IsolationTree::grow(data.view(), 4, &mut rng);
        let mut counts = vec![0; 3];
        tree.accumulate_feature_splits(&mut counts);
        assert_eq!(counts.iter().sum::<usize>(), tree.n_internal());
    }
}
