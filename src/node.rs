//! Arena node for the bundled CART tree.

/// A node in a decision tree arena.
///
/// Trees are stored as `Vec<Node>` with children referenced by arena index
/// rather than pointers, which keeps traversal cache-friendly.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    /// An interior split node.
    Split {
        /// Feature column used for the split (slot-local index).
        feature: usize,
        /// Threshold value: samples with feature <= threshold go left.
        threshold: f64,
        /// Arena index of the left child.
        left: usize,
        /// Arena index of the right child.
        right: usize,
    },
    /// A terminal leaf node.
    Leaf {
        /// Normalized class distribution over the full registered class set.
        distribution: Vec<f64>,
    },
}

impl Node {
    /// Return `true` if this node is a leaf.
    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}
