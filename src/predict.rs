//! Prediction: per-slot fan-out and probability aggregation.

use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use tracing::debug;

use crate::error::ForestError;
use crate::forest::{worker_pool, Forest, TreeSlot};
use crate::learner::TreeModel;

/// Column index of the row maximum; ties go to the lowest index.
fn argmax(row: &[f64]) -> usize {
    let mut best = 0;
    for (i, &p) in row.iter().enumerate().skip(1) {
        if p > row[best] {
            best = i;
        }
    }
    best
}

impl<M: TreeModel> TreeSlot<M> {
    /// Probability matrix for a full-width query matrix, restricted to this
    /// slot's columns. Enforces the collaborator contract that every model
    /// emits exactly `n_classes` probability columns.
    fn predict_matrix(
        &self,
        features: &[Vec<f64>],
        n_classes: usize,
        tree_index: usize,
    ) -> Result<Vec<Vec<f64>>, ForestError> {
        features
            .iter()
            .map(|sample| {
                let proba = self
                    .model()
                    .predict_proba(&self.project(sample))
                    .map_err(|source| ForestError::TreePredict { tree_index, source })?;
                if proba.len() != n_classes {
                    return Err(ForestError::ClassCountMismatch {
                        tree_index,
                        expected: n_classes,
                        got: proba.len(),
                    });
                }
                Ok(proba)
            })
            .collect()
    }
}

impl<M: TreeModel> Forest<M> {
    /// Return the averaged class probability distribution for a single sample.
    ///
    /// Columns follow [`classes`](Forest::classes) order.
    ///
    /// # Errors
    ///
    /// | Variant                                     | When                                     |
    /// |---------------------------------------------|------------------------------------------|
    /// | [`ForestError::PredictionFeatureMismatch`]  | `sample.len() != n_features`             |
    /// | [`ForestError::TreePredict`]                | any single model fails                   |
    /// | [`ForestError::ClassCountMismatch`]         | a model emits the wrong column count     |
    pub fn predict_proba(&self, sample: &[f64]) -> Result<Vec<f64>, ForestError> {
        if sample.len() != self.n_features {
            return Err(ForestError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let n_classes = self.classes.n_classes();
        let mut avg = vec![0.0f64; n_classes];
        for (tree_index, slot) in self.slots.iter().enumerate() {
            let proba = slot
                .model()
                .predict_proba(&slot.project(sample))
                .map_err(|source| ForestError::TreePredict { tree_index, source })?;
            if proba.len() != n_classes {
                return Err(ForestError::ClassCountMismatch {
                    tree_index,
                    expected: n_classes,
                    got: proba.len(),
                });
            }
            for (acc, p) in avg.iter_mut().zip(&proba) {
                *acc += p;
            }
        }
        let n = self.slots.len() as f64;
        avg.iter_mut().for_each(|v| *v /= n);
        Ok(avg)
    }

    /// Predict the class label for a single sample.
    ///
    /// Argmax of the averaged distribution, ties broken by the lowest
    /// registry index, mapped back to the label value seen at fit time.
    ///
    /// # Errors
    ///
    /// Same as [`Forest::predict_proba`].
    pub fn predict(&self, sample: &[f64]) -> Result<usize, ForestError> {
        let proba = self.predict_proba(sample)?;
        let label = self
            .classes
            .label(argmax(&proba))
            .expect("argmax index is within the registry");
        Ok(label)
    }

    /// Return the averaged probability matrix for a batch of samples.
    ///
    /// Fans out one task per tree on a pool of `n_workers` threads; each
    /// task produces a `rows x n_classes` matrix over its slot's columns,
    /// and the matrices are summed in slot order then divided by the tree
    /// count. Results do not depend on `n_workers` or task completion order.
    ///
    /// # Errors
    ///
    /// Same as [`Forest::predict_proba`], plus
    /// [`ForestError::InvalidWorkerCount`] and [`ForestError::WorkerPool`].
    pub fn predict_proba_batch(
        &self,
        features: &[Vec<f64>],
        n_workers: usize,
    ) -> Result<Vec<Vec<f64>>, ForestError> {
        let pool = worker_pool(n_workers)?;
        for sample in features {
            if sample.len() != self.n_features {
                return Err(ForestError::PredictionFeatureMismatch {
                    expected: self.n_features,
                    got: sample.len(),
                });
            }
        }
        if features.is_empty() {
            return Ok(Vec::new());
        }

        let n_rows = features.len();
        let n_classes = self.classes.n_classes();

        // One task per slot; matrices come back in slot order and are summed
        // serially, so the result is bit-identical for any worker count.
        let per_slot: Vec<Vec<Vec<f64>>> = pool.install(|| {
            self.slots
                .par_iter()
                .enumerate()
                .map(|(tree_index, slot)| slot.predict_matrix(features, n_classes, tree_index))
                .collect::<Result<Vec<_>, ForestError>>()
        })?;

        let mut summed = vec![vec![0.0f64; n_classes]; n_rows];
        for matrix in &per_slot {
            for (acc_row, row) in summed.iter_mut().zip(matrix) {
                for (a, p) in acc_row.iter_mut().zip(row) {
                    *a += p;
                }
            }
        }

        let n = self.slots.len() as f64;
        for row in &mut summed {
            row.iter_mut().for_each(|v| *v /= n);
        }

        debug!(n_rows, n_classes, "batch probability prediction complete");
        Ok(summed)
    }

    /// Predict class labels for a batch of samples.
    ///
    /// # Errors
    ///
    /// Same as [`Forest::predict_proba_batch`].
    pub fn predict_batch(
        &self,
        features: &[Vec<f64>],
        n_workers: usize,
    ) -> Result<Vec<usize>, ForestError> {
        let probas = self.predict_proba_batch(features, n_workers)?;
        Ok(probas
            .iter()
            .map(|row| {
                self.classes
                    .label(argmax(row))
                    .expect("argmax index is within the registry")
            })
            .collect())
    }
}
