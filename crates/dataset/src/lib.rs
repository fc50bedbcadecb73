//! Posewatch Dataset
//!
//! Walks a labeled video collection and assembles a shuffled, partitioned
//! pool of labeled windows:
//!
//! 1. Discover videos under label-bucket directories
//! 2. Derive each label from the file naming convention
//! 3. Extract frames, estimate and normalize poses (or reuse cached keypoints)
//! 4. Segment into fixed-length windows and add mirrored counterparts
//! 5. Fisher–Yates shuffle, then split into train/validation/test
//!
//! Each video's intermediate frames live in their own namespace directory
//! and are removed once the video is done.

pub mod assembler;
pub mod cache;
pub mod report;

pub use assembler::{AssembledDataset, AssemblerConfig, DatasetAssembler, VideoEntry};
pub use cache::KeypointCache;
pub use report::{AssemblyReport, SkippedVideo};
