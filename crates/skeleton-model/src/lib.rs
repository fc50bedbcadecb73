//! Posewatch Skeleton Model
//!
//! Defines the data contracts shared by every pipeline stage:
//! - **Joints:** The canonical 17-joint COCO layout and per-joint samples
//! - **Frames:** Exactly 17 joints per image, with a sentinel for "no pose"
//! - **Pose detections:** Raw pose-estimator output before normalization
//! - **Windows:** Fixed-length frame sequences, batch and rolling
//! - **Datasets:** Labeled examples, partitions, and their on-disk format
//!
//! All joint coordinates are normalized to `[0.0, 1.0]` relative to the
//! source frame so windows from differently sized videos share one space.

pub mod dataset;
pub mod frame;
pub mod joint;
pub mod label;
pub mod pose;
pub mod window;

pub use dataset::*;
pub use frame::*;
pub use joint::*;
pub use label::*;
pub use pose::*;
pub use window::*;
