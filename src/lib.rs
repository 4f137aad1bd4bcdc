//! Parallel bagging ensemble classification.
//!
//! Trains many independent decision trees on bootstrap-resampled,
//! feature-subsampled views of a dataset and averages their class
//! probabilities. Tree induction itself sits behind the [`TreeLearner`]
//! trait; [`CartLearner`] is the bundled implementation, and any
//! compatible learner (including mocks) can be substituted.
//!
//! Training and batch prediction fan out one task per tree on a
//! caller-sized rayon pool. All sampling is derived per tree index from
//! the base seed, so results are bit-identical regardless of worker
//! count or task completion order.

mod classes;
mod config;
mod error;
mod forest;
mod learner;
mod node;
mod predict;
mod split;
mod tree;

pub use classes::ClassRegistry;
pub use config::{EnsembleConfig, MaxFeatures};
pub use error::{ForestError, LearnerError};
pub use forest::{Forest, TreeSlot};
pub use learner::{TreeLearner, TreeModel};
pub use tree::{CartLearner, CartTree};
