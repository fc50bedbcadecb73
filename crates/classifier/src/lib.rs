//! Posewatch Classifier
//!
//! The sequence classifier is an opaque capability behind
//! [`SequenceClassifier`]: windows in, class probabilities out, plus the
//! training surface (fit, evaluate, save, load). The pipeline owns the
//! tensor contract (`[batch, N, 17, 3]` inputs, `[batch]` labels), not the
//! model.
//!
//! [`CentroidClassifier`] is a small baseline implementation with JSON
//! persistence, usable end to end without an ML runtime.

pub mod batch;
pub mod centroid;
pub mod classifier;
pub mod training;

pub use batch::BatchTensor;
pub use centroid::CentroidClassifier;
pub use classifier::{ClassProbabilities, SequenceClassifier};
pub use training::{EpochMetrics, Evaluation, TrainingConfig, TrainingHistory};
