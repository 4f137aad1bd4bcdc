//! The collaborator seam: traits a single-tree learner must implement.

use crate::error::LearnerError;

/// A single-tree learning algorithm the ensemble can train.
///
/// The orchestrator hands each slot a bootstrap sample already restricted to
/// that slot's feature columns, labels encoded as dense registry indices in
/// `[0, n_classes)`, and a per-slot seed for any internal randomness.
///
/// # Contract
///
/// The fitted model must emit probability distributions over all `n_classes`
/// columns in registry order, padding classes absent from its bootstrap with
/// zero. The orchestrator enforces the column count at aggregation time.
pub trait TreeLearner: Sync {
    /// The fitted model type this learner produces.
    type Model: TreeModel;

    /// Fit a fresh model on a row-major feature matrix and encoded labels.
    ///
    /// # Errors
    ///
    /// Returns a [`LearnerError`] on any training failure; the ensemble
    /// aborts the whole fit call in response.
    fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        n_classes: usize,
        seed: u64,
    ) -> Result<Self::Model, LearnerError>;
}

/// A fitted single-tree model that reports class probabilities.
pub trait TreeModel: Send + Sync {
    /// Return the class probability distribution for one feature vector.
    ///
    /// The slice holds only this model's own feature columns, in the order
    /// they were presented at fit time. The returned vector must have one
    /// entry per class registered at fit time.
    ///
    /// # Errors
    ///
    /// Returns a [`LearnerError`] on any prediction failure; the ensemble
    /// aborts the whole prediction call in response.
    fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>, LearnerError>;
}
