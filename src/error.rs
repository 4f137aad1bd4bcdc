/// Errors from ensemble training and prediction.
#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when max_features resolves to 0 or exceeds n_features.
    #[error("max_features resolved to {max_features}, but must be in [1, {n_features}]")]
    InvalidMaxFeatures {
        /// The resolved max_features value.
        max_features: usize,
        /// The number of features in the dataset.
        n_features: usize,
    },

    /// Returned when the caller-supplied worker count is zero.
    #[error("n_workers must be at least 1, got 0")]
    InvalidWorkerCount,

    /// Returned when the training dataset has zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when the label vector length differs from the sample count.
    #[error("got {labels} labels for {samples} samples")]
    LabelCountMismatch {
        /// Number of training samples.
        samples: usize,
        /// Number of labels provided.
        labels: usize,
    },

    /// Returned when a sample has a different number of features than expected.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when a sample has a different number of features at prediction time.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when a model emits a distribution over the wrong number of classes.
    #[error("tree {tree_index} emitted {got} probability columns, expected {expected}")]
    ClassCountMismatch {
        /// The zero-based ensemble slot index.
        tree_index: usize,
        /// The registered class count.
        expected: usize,
        /// The number of columns the model actually produced.
        got: usize,
    },

    /// Returned when a single tree's learner fails to fit. Aborts the whole
    /// training call; no partial ensemble is returned.
    #[error("tree {tree_index} failed to fit")]
    TreeFit {
        /// The zero-based ensemble slot index.
        tree_index: usize,
        /// The learner's own error.
        #[source]
        source: LearnerError,
    },

    /// Returned when a single tree's model fails to predict. Aborts the whole
    /// prediction call.
    #[error("tree {tree_index} failed to predict")]
    TreePredict {
        /// The zero-based ensemble slot index.
        tree_index: usize,
        /// The model's own error.
        #[source]
        source: LearnerError,
    },

    /// Returned when the worker pool cannot be constructed.
    #[error("failed to build worker pool")]
    WorkerPool {
        /// The underlying rayon error.
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

/// Opaque error produced by a [`TreeLearner`](crate::TreeLearner) or
/// [`TreeModel`](crate::TreeModel) implementation.
///
/// Collaborators report failures through this type so they do not depend on
/// the orchestrator's error enum.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct LearnerError {
    message: String,
}

impl LearnerError {
    /// Create a learner error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
