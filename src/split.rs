//! Gini impurity and exact best-split search for the bundled CART tree.

use rand::seq::SliceRandom;
use rand::Rng;

/// Gini impurity of a node from its class counts: 1 - sum(p_i^2).
///
/// Zero when `n_samples` is zero (treated as pure).
pub(crate) fn gini(class_counts: &[usize], n_samples: usize) -> f64 {
    if n_samples == 0 {
        return 0.0;
    }
    let n = n_samples as f64;
    let sum_sq: f64 = class_counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum();
    1.0 - sum_sq
}

/// Result of finding the best split for a node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    /// Feature used for the split (column index in the training matrix).
    pub(crate) feature: usize,
    /// Threshold value.
    pub(crate) threshold: f64,
    /// Sample indices going to the left child.
    pub(crate) left_indices: Vec<usize>,
    /// Sample indices going to the right child.
    pub(crate) right_indices: Vec<usize>,
}

/// Find the best split over all feature columns.
///
/// For each feature, sorts the `(value, label)` pairs, scans left-to-right
/// with incremental class count updates, and tracks the globally best split
/// by weighted impurity decrease. Feature scan order is shuffled with the
/// caller's RNG so ties among equally good splits break reproducibly per
/// seed rather than always toward low column indices.
///
/// Returns `None` when no valid split exists (all values identical, or any
/// split would violate `min_samples_leaf`).
///
/// # Column-major layout
///
/// `features` is column-major: `features[feature_idx][sample_idx]`.
/// `sample_indices` index into the inner vectors.
pub(crate) fn find_best_split(
    features: &[Vec<f64>],
    labels: &[usize],
    sample_indices: &[usize],
    n_classes: usize,
    min_samples_leaf: usize,
    rng: &mut impl Rng,
) -> Option<SplitResult> {
    let n_features = features.len();
    let n_samples = sample_indices.len();

    if n_samples < 2 || n_features == 0 {
        return None;
    }

    let mut parent_counts = vec![0usize; n_classes];
    for &si in sample_indices {
        parent_counts[labels[si]] += 1;
    }
    let parent_impurity = gini(&parent_counts, n_samples);

    let mut feature_order: Vec<usize> = (0..n_features).collect();
    feature_order.shuffle(rng);

    let mut best_decrease = f64::NEG_INFINITY;
    let mut best: Option<(usize, f64)> = None;

    for &feat_idx in &feature_order {
        let feat_col = &features[feat_idx];

        let mut sorted: Vec<(f64, usize)> = sample_indices
            .iter()
            .map(|&si| (feat_col[si], si))
            .collect();
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        // Incremental scan: left grows from empty, right shrinks from full.
        let mut left_counts = vec![0usize; n_classes];
        let mut right_counts = parent_counts.clone();

        for i in 0..(n_samples - 1) {
            let (val_i, si) = sorted[i];
            let class_i = labels[si];

            left_counts[class_i] += 1;
            right_counts[class_i] -= 1;

            let n_left = i + 1;
            let n_right = n_samples - n_left;

            // No valid boundary between identical values.
            let val_next = sorted[i + 1].0;
            if val_i == val_next {
                continue;
            }

            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }

            let decrease = (n_samples as f64) * parent_impurity
                - (n_left as f64) * gini(&left_counts, n_left)
                - (n_right as f64) * gini(&right_counts, n_right);

            if decrease > best_decrease {
                best_decrease = decrease;
                // The midpoint of adjacent representable values can round
                // up to val_next itself; fall back to the left value so the
                // partition below matches the counts scanned here.
                let mut threshold = (val_i + val_next) / 2.0;
                if !(threshold < val_next) {
                    threshold = val_i;
                }
                best = Some((feat_idx, threshold));
            }
        }
    }

    let (feature, threshold) = best?;

    let feat_col = &features[feature];
    let mut left_indices = Vec::with_capacity(n_samples / 2);
    let mut right_indices = Vec::with_capacity(n_samples / 2);
    for &si in sample_indices {
        if feat_col[si] <= threshold {
            left_indices.push(si);
        } else {
            right_indices.push(si);
        }
    }

    Some(SplitResult {
        feature,
        threshold,
        left_indices,
        right_indices,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{find_best_split, gini};

    #[test]
    fn gini_pure() {
        assert!((gini(&[10, 0, 0], 10) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn gini_binary_balanced() {
        assert!((gini(&[5, 5], 10) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn gini_three_class_uniform() {
        let expected = 1.0 - 3.0 * (1.0 / 3.0_f64).powi(2);
        assert!((gini(&[100, 100, 100], 300) - expected).abs() < 1e-10);
    }

    #[test]
    fn separable_data_finds_correct_split() {
        let features = vec![vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let sample_indices: Vec<usize> = (0..6).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let split =
            find_best_split(&features, &labels, &sample_indices, 2, 1, &mut rng)
                .expect("should find a split");
        assert_eq!(split.feature, 0);
        assert!(split.threshold > 3.0 && split.threshold < 10.0);
        assert_eq!(split.left_indices.len(), 3);
        assert_eq!(split.right_indices.len(), 3);
    }

    #[test]
    fn constant_feature_returns_none() {
        let features = vec![vec![5.0, 5.0, 5.0, 5.0]];
        let labels = vec![0, 0, 1, 1];
        let sample_indices: Vec<usize> = (0..4).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        assert!(find_best_split(&features, &labels, &sample_indices, 2, 1, &mut rng).is_none());
    }

    #[test]
    fn adjacent_float_values_split_cleanly() {
        // With values one ulp apart the midpoint rounds up to the larger
        // value; the threshold must still put exactly one sample on each side.
        let a = f64::from_bits(1.0f64.to_bits() + 1);
        let b = f64::from_bits(1.0f64.to_bits() + 2);
        let features = vec![vec![a, b]];
        let labels = vec![0, 1];
        let sample_indices: Vec<usize> = (0..2).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let split =
            find_best_split(&features, &labels, &sample_indices, 2, 1, &mut rng)
                .expect("should find a split");
        assert!(split.threshold < b, "threshold {} >= {b}", split.threshold);
        assert_eq!(split.left_indices, vec![0]);
        assert_eq!(split.right_indices, vec![1]);
    }

    #[test]
    fn min_samples_leaf_enforced() {
        // Each child would get one sample, violating the minimum of 2.
        let features = vec![vec![1.0, 10.0]];
        let labels = vec![0, 1];
        let sample_indices: Vec<usize> = (0..2).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        assert!(find_best_split(&features, &labels, &sample_indices, 2, 2, &mut rng).is_none());
    }
}
