//! Raw pose-estimator output.
//!
//! These types are the input side of keypoint normalization. They carry
//! whatever the estimator produced: any number of poses, keypoints in any
//! order, names that may or may not be present, and coordinates in either
//! pixel or normalized space.

use serde::{Deserialize, Serialize};

/// Coordinate space an estimator reports keypoints in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeypointSpace {
    /// Pixel coordinates relative to the frame's top-left corner.
    #[default]
    Pixel,
    /// Coordinates already normalized to `[0.0, 1.0]`.
    Normalized,
}

/// One keypoint as reported by the estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawKeypoint {
    /// Joint name, when the estimator labels its keypoints.
    #[serde(default)]
    pub name: Option<String>,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub score: f32,
}

impl RawKeypoint {
    pub fn new(x: f32, y: f32, score: f32) -> Self {
        Self {
            name: None,
            x,
            y,
            score,
        }
    }

    pub fn named(name: impl Into<String>, x: f32, y: f32, score: f32) -> Self {
        Self {
            name: Some(name.into()),
            x,
            y,
            score,
        }
    }
}

/// One detected person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DetectedPose {
    /// Overall pose confidence, when the estimator ranks its poses.
    #[serde(default)]
    pub score: Option<f32>,
    pub keypoints: Vec<RawKeypoint>,
}

/// Everything the estimator returned for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseDetection {
    /// Frame width in pixels.
    pub frame_width: u32,
    /// Frame height in pixels.
    pub frame_height: u32,
    /// Coordinate space of every keypoint in `poses`.
    #[serde(default)]
    pub space: KeypointSpace,
    /// Detected poses; empty when nobody was found.
    #[serde(default)]
    pub poses: Vec<DetectedPose>,
}

impl PoseDetection {
    /// A detection result with no poses.
    pub fn empty(frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width,
            frame_height,
            space: KeypointSpace::Pixel,
            poses: vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}
