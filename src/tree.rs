//! The bundled collaborator: a CART decision tree classifier.
//!
//! Implements [`TreeLearner`]/[`TreeModel`] so the ensemble works out of the
//! box, with exact Gini splits. Classes are supplied externally as a dense
//! count, so leaf distributions always cover the full registered class set
//! (classes absent from the training data get probability zero).

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::error::LearnerError;
use crate::learner::{TreeLearner, TreeModel};
use crate::node::Node;
use crate::split::{find_best_split, gini};

/// A single-tree learner growing CART trees with exact Gini splits.
///
/// Construct via [`CartLearner::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default            |
/// |---------------------|--------------------|
/// | `max_depth`         | `None` (unlimited) |
/// | `min_samples_split` | 2                  |
/// | `min_samples_leaf`  | 1                  |
#[derive(Debug, Clone)]
pub struct CartLearner {
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
}

impl CartLearner {
    /// Create a learner with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }

    /// Set the maximum tree depth. `None` means grow until leaves are pure
    /// or stopping conditions are met; the root is depth 0.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of samples required in each leaf after a split.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }
}

impl Default for CartLearner {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeLearner for CartLearner {
    type Model = CartTree;

    fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        seed: u64,
    ) -> Result<CartTree, LearnerError> {
        if features.is_empty() {
            return Err(LearnerError::new("training dataset has zero samples"));
        }
        let n_samples = features.len();
        let n_features = features[0].len();
        if n_features == 0 {
            return Err(LearnerError::new("training dataset has zero feature columns"));
        }
        if labels.len() != n_samples {
            return Err(LearnerError::new(format!(
                "got {} labels for {} samples",
                labels.len(),
                n_samples
            )));
        }
        for (i, row) in features.iter().enumerate() {
            if row.len() != n_features {
                return Err(LearnerError::new(format!(
                    "sample {i} has {} features, expected {n_features}",
                    row.len()
                )));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(LearnerError::new(format!(
                    "non-finite value in sample {i}"
                )));
            }
        }
        if n_classes == 0 {
            return Err(LearnerError::new("n_classes must be at least 1"));
        }
        if let Some(&bad) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(LearnerError::new(format!(
                "label {bad} is outside the registered class range [0, {n_classes})"
            )));
        }
        if self.min_samples_split < 2 {
            return Err(LearnerError::new(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf < 1 {
            return Err(LearnerError::new("min_samples_leaf must be at least 1"));
        }
        if self.max_depth == Some(0) {
            return Err(LearnerError::new("max_depth must be at least 1"));
        }

        // Column-major layout for the split search.
        let col_features: Vec<Vec<f64>> = (0..n_features)
            .map(|f| features.iter().map(|row| row[f]).collect())
            .collect();

        let sample_indices: Vec<usize> = (0..n_samples).collect();
        // The seed only shuffles feature scan order, which decides ties
        // between equally good splits.
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut arena: Vec<Node> = Vec::new();

        build_tree(
            &col_features,
            labels,
            &sample_indices,
            n_classes,
            self,
            0,
            &mut rng,
            &mut arena,
        );

        debug!(n_nodes = arena.len(), n_samples, "cart tree built");

        Ok(CartTree {
            nodes: arena,
            n_features,
            n_classes,
        })
    }
}

/// Recursively build the arena-based tree; returns the node's arena index.
#[allow(clippy::too_many_arguments)]
fn build_tree(
    col_features: &[Vec<f64>],
    labels: &[usize],
    sample_indices: &[usize],
    n_classes: usize,
    learner: &CartLearner,
    depth: usize,
    rng: &mut ChaCha8Rng,
    arena: &mut Vec<Node>,
) -> usize {
    let n_samples = sample_indices.len();

    let mut class_counts = vec![0usize; n_classes];
    for &si in sample_indices {
        class_counts[labels[si]] += 1;
    }

    let make_leaf = |arena: &mut Vec<Node>| -> usize {
        let total = n_samples as f64;
        let distribution: Vec<f64> = class_counts.iter().map(|&c| c as f64 / total).collect();
        let idx = arena.len();
        arena.push(Node::Leaf { distribution });
        idx
    };

    let depth_exceeded = learner.max_depth.is_some_and(|max_d| depth >= max_d);
    let too_few = n_samples < learner.min_samples_split;
    let pure = gini(&class_counts, n_samples) == 0.0;

    if too_few || pure || depth_exceeded {
        return make_leaf(arena);
    }

    let split = match find_best_split(
        col_features,
        labels,
        sample_indices,
        n_classes,
        learner.min_samples_leaf,
        rng,
    ) {
        Some(s) => s,
        None => return make_leaf(arena),
    };

    // Arena pattern: reserve the index, recurse, then overwrite with the split.
    let node_idx = arena.len();
    arena.push(Node::Leaf {
        distribution: vec![0.0; n_classes],
    });

    let left = build_tree(
        col_features,
        labels,
        &split.left_indices,
        n_classes,
        learner,
        depth + 1,
        rng,
        arena,
    );
    let right = build_tree(
        col_features,
        labels,
        &split.right_indices,
        n_classes,
        learner,
        depth + 1,
        rng,
        arena,
    );

    arena[node_idx] = Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
    };

    node_idx
}

/// A fitted CART decision tree.
#[derive(Debug, Clone)]
pub struct CartTree {
    nodes: Vec<Node>,
    n_features: usize,
    n_classes: usize,
}

impl CartTree {
    /// Return the number of features this tree was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the class count this tree emits distributions over.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the total number of nodes (both splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth; a single-leaf tree has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((0usize, 0usize));
        while let Some((node_idx, d)) = queue.pop_front() {
            match &self.nodes[node_idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    queue.push_back((*left, d + 1));
                    queue.push_back((*right, d + 1));
                }
            }
        }
        max_depth
    }

    /// Traverse from the root and return the arena index of the leaf.
    fn traverse(&self, sample: &[f64]) -> usize {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { .. } => return idx,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if sample[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

impl TreeModel for CartTree {
    fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>, LearnerError> {
        if sample.len() != self.n_features {
            return Err(LearnerError::new(format!(
                "prediction input has {} features, expected {}",
                sample.len(),
                self.n_features
            )));
        }
        let leaf = self.traverse(sample);
        match &self.nodes[leaf] {
            Node::Leaf { distribution } => Ok(distribution.clone()),
            Node::Split { .. } => unreachable!("traverse always ends at a leaf"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CartLearner, TreeLearner, TreeModel};

    #[test]
    fn empty_dataset_error() {
        let features: Vec<Vec<f64>> = vec![];
        let labels: Vec<usize> = vec![];
        assert!(CartLearner::new().fit(&features, &labels, 2, 42).is_err());
    }

    #[test]
    fn pure_dataset_single_leaf() {
        let features = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let labels = vec![0, 0, 0];
        let tree = CartLearner::new().fit(&features, &labels, 1, 42).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.predict_proba(&[2.0, 3.0]).unwrap(), vec![1.0]);
    }

    #[test]
    fn linearly_separable_correct_split() {
        let features = vec![
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![3.0, 0.0],
            vec![10.0, 0.0],
            vec![11.0, 0.0],
            vec![12.0, 0.0],
        ];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let tree = CartLearner::new().fit(&features, &labels, 2, 42).unwrap();
        assert_eq!(tree.predict_proba(&[2.0, 0.0]).unwrap(), vec![1.0, 0.0]);
        assert_eq!(tree.predict_proba(&[11.0, 0.0]).unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn xor_needs_depth_at_least_2() {
        let features = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let labels = vec![0, 1, 1, 0];
        let tree = CartLearner::new().fit(&features, &labels, 2, 42).unwrap();
        assert!(tree.depth() >= 2);
    }

    #[test]
    fn distribution_padded_to_registered_classes() {
        // Only classes 0 and 1 appear, but 3 classes are registered.
        let features = vec![vec![1.0], vec![2.0], vec![10.0], vec![11.0]];
        let labels = vec![0, 0, 1, 1];
        let tree = CartLearner::new().fit(&features, &labels, 3, 42).unwrap();
        let proba = tree.predict_proba(&[1.5]).unwrap();
        assert_eq!(proba.len(), 3);
        assert_eq!(proba[2], 0.0);
        let sum: f64 = proba.iter().sum();
        assert!((sum - 1.0).abs() < 1e-10);
    }

    #[test]
    fn adjacent_float_values_fit_terminates() {
        // Values one ulp apart used to yield a threshold equal to the larger
        // value, an empty right child, and unbounded recursion.
        let a = f64::from_bits(1.0f64.to_bits() + 1);
        let b = f64::from_bits(1.0f64.to_bits() + 2);
        let features = vec![vec![a], vec![b]];
        let labels = vec![0, 1];
        let tree = CartLearner::new().fit(&features, &labels, 2, 42).unwrap();
        assert_eq!(tree.predict_proba(&[a]).unwrap(), vec![1.0, 0.0]);
        assert_eq!(tree.predict_proba(&[b]).unwrap(), vec![0.0, 1.0]);
    }

    #[test]
    fn max_depth_limits_tree() {
        let features = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let labels = vec![0, 1, 1, 0];
        let tree = CartLearner::new()
            .with_max_depth(Some(1))
            .fit(&features, &labels, 2, 42)
            .unwrap();
        assert!(tree.depth() <= 1);
    }

    #[test]
    fn out_of_range_label_rejected() {
        let features = vec![vec![1.0], vec![2.0]];
        let labels = vec![0, 5];
        assert!(CartLearner::new().fit(&features, &labels, 2, 42).is_err());
    }

    #[test]
    fn non_finite_value_rejected() {
        let features = vec![vec![1.0, f64::NAN], vec![3.0, 4.0]];
        let labels = vec![0, 1];
        assert!(CartLearner::new().fit(&features, &labels, 2, 42).is_err());
    }

    #[test]
    fn prediction_feature_mismatch() {
        let features = vec![vec![1.0, 2.0], vec![10.0, 2.0]];
        let labels = vec![0, 1];
        let tree = CartLearner::new().fit(&features, &labels, 2, 42).unwrap();
        assert!(tree.predict_proba(&[1.0]).is_err());
    }

    #[test]
    fn deterministic_with_same_seed() {
        let features = vec![
            vec![1.0, 5.0],
            vec![2.0, 6.0],
            vec![3.0, 7.0],
            vec![10.0, 15.0],
            vec![11.0, 16.0],
            vec![12.0, 17.0],
        ];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let tree1 = CartLearner::new().fit(&features, &labels, 2, 123).unwrap();
        let tree2 = CartLearner::new().fit(&features, &labels, 2, 123).unwrap();
        for sample in &features {
            assert_eq!(
                tree1.predict_proba(sample).unwrap(),
                tree2.predict_proba(sample).unwrap()
            );
        }
    }
}
