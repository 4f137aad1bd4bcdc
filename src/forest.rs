//! Ensemble training with parallel per-tree tasks.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::classes::ClassRegistry;
use crate::config::{EnsembleConfig, MaxFeatures};
use crate::error::ForestError;
use crate::learner::TreeLearner;

/// One ensemble member: a feature subset and the model fitted on it.
///
/// The model is exclusively owned by its slot; slots share nothing.
#[derive(Debug, Clone)]
pub struct TreeSlot<M> {
    pub(crate) feature_ids: Vec<usize>,
    pub(crate) model: M,
}

impl<M> TreeSlot<M> {
    /// Return the feature columns this slot's model was trained on.
    #[must_use]
    pub fn feature_ids(&self) -> &[usize] {
        &self.feature_ids
    }

    /// Borrow the fitted model.
    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Restrict a full-width sample to this slot's feature columns.
    pub(crate) fn project(&self, sample: &[f64]) -> Vec<f64> {
        self.feature_ids.iter().map(|&f| sample[f]).collect()
    }
}

/// A fitted bagging ensemble.
///
/// Produced whole by a successful fit call and immutable afterwards. A
/// failed re-fit returns an error without touching any previously fitted
/// `Forest` the caller still holds.
#[derive(Debug, Clone)]
pub struct Forest<M> {
    pub(crate) slots: Vec<TreeSlot<M>>,
    pub(crate) classes: ClassRegistry,
    pub(crate) n_features: usize,
}

impl<M> Forest<M> {
    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.slots.len()
    }

    /// Return the number of features the ensemble was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the class registry fixing probability-column order.
    #[must_use]
    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    /// Return the ensemble members in tree-index order.
    #[must_use]
    pub fn slots(&self) -> &[TreeSlot<M>] {
        &self.slots
    }
}

/// Resolve a `MaxFeatures` strategy to a concrete count.
pub(crate) fn resolve_max_features(
    max_features: MaxFeatures,
    n_features: usize,
) -> Result<usize, ForestError> {
    let resolved = match max_features {
        MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
        MaxFeatures::Fixed(n) => n,
        MaxFeatures::All => n_features,
    };
    if resolved == 0 || resolved > n_features {
        return Err(ForestError::InvalidMaxFeatures {
            max_features: resolved,
            n_features,
        });
    }
    Ok(resolved)
}

/// Sample `count` distinct column indices from `[0, n_features)`.
///
/// Partial Fisher-Yates: only the first `count` positions are shuffled.
fn sample_feature_ids(n_features: usize, count: usize, rng: &mut impl Rng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n_features).collect();
    for i in 0..count {
        let j = rng.gen_range(i..n_features);
        order.swap(i, j);
    }
    order.truncate(count);
    order
}

/// Draw `n_samples` row indices with replacement.
fn bootstrap_indices(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Validate the training matrix: rectangular, finite, labels aligned.
fn validate_dataset(
    features: &[Vec<f64>],
    labels: &[usize],
) -> Result<(usize, usize), ForestError> {
    if features.is_empty() {
        return Err(ForestError::EmptyDataset);
    }
    let n_samples = features.len();
    let n_features = features[0].len();
    if n_features == 0 {
        return Err(ForestError::ZeroFeatures);
    }
    if labels.len() != n_samples {
        return Err(ForestError::LabelCountMismatch {
            samples: n_samples,
            labels: labels.len(),
        });
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(ForestError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        for (feature_index, &val) in row.iter().enumerate() {
            if !val.is_finite() {
                return Err(ForestError::NonFiniteValue {
                    sample_index,
                    feature_index,
                });
            }
        }
    }
    Ok((n_samples, n_features))
}

/// Build a worker pool of exactly `n_workers` threads for one call.
pub(crate) fn worker_pool(n_workers: usize) -> Result<rayon::ThreadPool, ForestError> {
    if n_workers == 0 {
        return Err(ForestError::InvalidWorkerCount);
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_workers)
        .build()
        .map_err(|source| ForestError::WorkerPool { source })
}

/// Train the ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len(), n_workers = n_workers))]
pub(crate) fn train<L: TreeLearner>(
    config: &EnsembleConfig,
    learner: &L,
    features: &[Vec<f64>],
    labels: &[usize],
    n_workers: usize,
) -> Result<Forest<L::Model>, ForestError> {
    // All validation happens here, before any task is submitted.
    if n_workers == 0 {
        return Err(ForestError::InvalidWorkerCount);
    }
    let (n_samples, n_features) = validate_dataset(features, labels)?;
    let max_features = resolve_max_features(config.max_features, n_features)?;
    let pool = worker_pool(n_workers)?;

    let classes = ClassRegistry::from_labels(labels);
    let n_classes = classes.n_classes();
    // The registry was built from these exact labels, so every lookup hits.
    let encoded: Vec<usize> = labels
        .iter()
        .map(|&l| {
            classes
                .index_of(l)
                .expect("registry contains every training label")
        })
        .collect();

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features,
        n_workers,
        "training ensemble"
    );

    let base_seed = config.seed;
    let n_trees = config.n_trees;

    // One task per tree. Each slot derives its seed purely from
    // (base_seed, tree_index), so sampling is independent of worker count
    // and completion order. Collecting Results gives the fail-fast join.
    let slots: Vec<TreeSlot<L::Model>> = pool.install(|| {
        (0..n_trees)
            .into_par_iter()
            .map(|tree_index| {
                let slot_seed = base_seed.wrapping_add(tree_index as u64);
                let mut rng = ChaCha8Rng::seed_from_u64(slot_seed);

                let feature_ids = sample_feature_ids(n_features, max_features, &mut rng);
                let rows = bootstrap_indices(n_samples, &mut rng);

                // Bootstrap view restricted to this slot's columns.
                let boot_features: Vec<Vec<f64>> = rows
                    .iter()
                    .map(|&r| feature_ids.iter().map(|&f| features[r][f]).collect())
                    .collect();
                let boot_labels: Vec<usize> = rows.iter().map(|&r| encoded[r]).collect();

                let model = learner
                    .fit(&boot_features, &boot_labels, n_classes, slot_seed)
                    .map_err(|source| ForestError::TreeFit { tree_index, source })?;

                Ok(TreeSlot { feature_ids, model })
            })
            .collect::<Result<Vec<_>, ForestError>>()
    })?;

    debug!(n_trees_trained = slots.len(), "tree training complete");

    Ok(Forest {
        slots,
        classes,
        n_features,
    })
}
