//! Posewatch Processing Core
//!
//! Turns raw detections into training-ready examples:
//! - **Normalization:** Map any estimator output onto the 17-joint frame
//! - **Mirroring:** Horizontal flip augmentation that preserves labels
//! - **Label convention:** Derive class labels from video file names
//! - **Segmentation:** Cut long keypoint sequences into fixed-length windows
//! - **Partitioning:** Fisher–Yates shuffle and train/validation/test split
//!
//! This crate is pure computation. No I/O, no processes, no async.

pub mod label_convention;
pub mod mirror;
pub mod normalizer;
pub mod partition;
pub mod segment;

pub use label_convention::LabelConvention;
pub use mirror::MirrorAugmenter;
pub use normalizer::{KeypointNormalizer, NormalizeOutcome, PoseSelection};
pub use partition::{fisher_yates_shuffle, partition, Partition, SplitRatios};
pub use segment::{default_min_tail, segment_frames};
