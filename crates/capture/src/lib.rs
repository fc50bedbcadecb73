//! Posewatch Capture
//!
//! Contracts for the external collaborators the pipeline depends on, and
//! process-backed adapters for them:
//! - **Offline frame source:** video file to an ordered list of frames
//!   ([`FfmpegFrameExtractor`])
//! - **Live frame source:** the current frame of a running stream
//!   ([`LatestFrameFile`])
//! - **Pose estimator:** one frame to zero or more poses
//!   ([`CommandPoseEstimator`])

pub mod estimator;
pub mod frame;
pub mod live;
pub mod source;
pub mod tools;

pub use estimator::{CommandPoseEstimator, PoseEstimator};
pub use frame::{Frame, FrameImage};
pub use live::{FrameSample, LatestFrameFile, LiveFrameSource};
pub use source::{FfmpegFrameExtractor, FrameSource};
