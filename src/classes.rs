//! Class label bookkeeping for the ensemble.

/// The sorted set of distinct labels observed at fit time.
///
/// Fixes the column order of every probability matrix the ensemble produces
/// and maps probability-column indices back to label values. Built once at
/// the start of training and never mutated afterwards; labels unseen at fit
/// time are never predicted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRegistry {
    labels: Vec<usize>,
}

impl ClassRegistry {
    /// Build the registry from the training labels: sorted, deduplicated.
    pub(crate) fn from_labels(labels: &[usize]) -> Self {
        let mut sorted = labels.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        Self { labels: sorted }
    }

    /// Return the number of registered classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.labels.len()
    }

    /// Return the registered labels in sorted order.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Return the label for a probability-column index, if in range.
    #[must_use]
    pub fn label(&self, index: usize) -> Option<usize> {
        self.labels.get(index).copied()
    }

    /// Return the probability-column index for a label, if registered.
    #[must_use]
    pub fn index_of(&self, label: usize) -> Option<usize> {
        self.labels.binary_search(&label).ok()
    }
}
