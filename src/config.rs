//! Configuration builder for ensemble training.

use crate::error::ForestError;
use crate::forest::Forest;
use crate::learner::TreeLearner;
use crate::tree::{CartLearner, CartTree};

/// Strategy for determining the number of feature columns each tree sees.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum MaxFeatures {
    /// Square root of total features, rounded up.
    Sqrt,
    /// A fixed count.
    Fixed(usize),
    /// All features (no subsampling).
    All,
}

/// Configuration for ensemble training.
///
/// Construct via [`EnsembleConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter      | Default |
/// |----------------|---------|
/// | `max_features` | `Sqrt`  |
/// | `max_depth`    | `None`  |
/// | `seed`         | 42      |
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EnsembleConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) max_depth: Option<usize>,
    pub(crate) seed: u64,
}

impl EnsembleConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, ForestError> {
        if n_trees == 0 {
            return Err(ForestError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_features: MaxFeatures::Sqrt,
            max_depth: None,
            seed: 42,
        })
    }

    // --- Setters ---

    /// Set the per-tree feature subsampling strategy.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the maximum tree depth for the bundled learner. `None` means unlimited.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the base random seed. Slot `i` derives its own seed as `seed + i`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the feature subsampling strategy.
    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    /// Return the maximum depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the base random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Train an ensemble of bundled CART trees.
    ///
    /// `features[sample_idx][feature_idx]` — row-major layout.
    /// `labels[sample_idx]` — class labels (any distinct values; sorted into
    /// the [`ClassRegistry`](crate::ClassRegistry)).
    /// `n_workers` — worker pool size for this call, at least 1.
    ///
    /// # Errors
    ///
    /// See [`EnsembleConfig::fit_with`].
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        n_workers: usize,
    ) -> Result<Forest<CartTree>, ForestError> {
        let learner = CartLearner::new().with_max_depth(self.max_depth);
        self.fit_with(&learner, features, labels, n_workers)
    }

    /// Train an ensemble driven by an arbitrary [`TreeLearner`].
    ///
    /// All validation happens before any task is submitted, and a single
    /// tree's failure aborts the whole call — a previously fitted
    /// [`Forest`] held by the caller is never affected.
    ///
    /// # Errors
    ///
    /// | Variant                                | When                                             |
    /// |----------------------------------------|--------------------------------------------------|
    /// | [`ForestError::InvalidWorkerCount`]    | `n_workers` is zero                              |
    /// | [`ForestError::EmptyDataset`]          | `features` is empty                              |
    /// | [`ForestError::ZeroFeatures`]          | rows have zero feature columns                   |
    /// | [`ForestError::LabelCountMismatch`]    | `labels.len() != features.len()`                 |
    /// | [`ForestError::FeatureCountMismatch`]  | rows have inconsistent lengths                   |
    /// | [`ForestError::NonFiniteValue`]        | any value is NaN or infinite                     |
    /// | [`ForestError::InvalidMaxFeatures`]    | resolved max_features is outside [1, n_features] |
    /// | [`ForestError::WorkerPool`]            | the rayon pool cannot be built                   |
    /// | [`ForestError::TreeFit`]               | any single tree's learner fails                  |
    pub fn fit_with<L: TreeLearner>(
        &self,
        learner: &L,
        features: &[Vec<f64>],
        labels: &[usize],
        n_workers: usize,
    ) -> Result<Forest<L::Model>, ForestError> {
        crate::forest::train(self, learner, features, labels, n_workers)
    }
}

#[cfg(test)]
mod tests {
    use super::{EnsembleConfig, MaxFeatures};

    #[test]
    fn zero_trees_rejected() {
        assert!(EnsembleConfig::new(0).is_err());
    }

    #[test]
    fn builder_defaults() {
        let config = EnsembleConfig::new(10).unwrap();
        assert_eq!(config.n_trees(), 10);
        assert_eq!(config.max_features(), MaxFeatures::Sqrt);
        assert_eq!(config.max_depth(), None);
        assert_eq!(config.seed(), 42);
    }

    #[test]
    fn builder_chaining() {
        let config = EnsembleConfig::new(5)
            .unwrap()
            .with_max_features(MaxFeatures::Fixed(2))
            .with_max_depth(Some(4))
            .with_seed(7);
        assert_eq!(config.max_features(), MaxFeatures::Fixed(2));
        assert_eq!(config.max_depth(), Some(4));
        assert_eq!(config.seed(), 7);
    }
}
