//! Per-frame keypoint sets and the keypoint stream format.
//!
//! Keypoint streams are stored as JSONL: an optional `# {header}` comment
//! line followed by one frame per line, each frame a 17-element array of
//! `[x, y, score]` triples.

use serde::{Deserialize, Serialize};

use crate::joint::{CocoJoint, Joint, JOINT_COUNT};

/// Exactly 17 joints extracted from one image, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameKeypoints {
    joints: [Joint; JOINT_COUNT],
}

impl FrameKeypoints {
    pub fn new(joints: [Joint; JOINT_COUNT]) -> Self {
        Self { joints }
    }

    /// Placeholder frame used whenever no pose was detected.
    pub fn sentinel() -> Self {
        Self {
            joints: [Joint::SENTINEL; JOINT_COUNT],
        }
    }

    /// Whether every joint is the sentinel placeholder.
    pub fn is_sentinel(&self) -> bool {
        self.joints.iter().all(|j| *j == Joint::SENTINEL)
    }

    pub fn joints(&self) -> &[Joint; JOINT_COUNT] {
        &self.joints
    }

    pub fn joint(&self, joint: CocoJoint) -> Joint {
        self.joints[joint.index()]
    }

    /// Iterate joints together with their canonical identity.
    pub fn iter(&self) -> impl Iterator<Item = (CocoJoint, &Joint)> {
        CocoJoint::ALL.into_iter().zip(self.joints.iter())
    }

    /// Build a new frame by transforming every joint.
    pub fn map_joints(&self, mut f: impl FnMut(CocoJoint, Joint) -> Joint) -> Self {
        let mut joints = self.joints;
        for (joint, value) in CocoJoint::ALL.into_iter().zip(joints.iter_mut()) {
            *value = f(joint, *value);
        }
        Self { joints }
    }

    /// Number of joints with a non-zero score.
    pub fn detected_count(&self) -> usize {
        self.joints.iter().filter(|j| j.score > 0.0).count()
    }

    /// Mean joint confidence.
    pub fn mean_score(&self) -> f32 {
        self.joints.iter().map(|j| j.score).sum::<f32>() / JOINT_COUNT as f32
    }
}

impl Default for FrameKeypoints {
    fn default() -> Self {
        Self::sentinel()
    }
}

/// Metadata line at the top of a keypoint stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeypointStreamHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Identifier of the source video.
    pub video: String,

    /// Sampling rate the frames were extracted at.
    pub sample_rate_hz: u32,
}

impl KeypointStreamHeader {
    pub fn new(video: impl Into<String>, sample_rate_hz: u32) -> Self {
        Self {
            schema_version: "1.0".to_string(),
            video: video.into(),
            sample_rate_hz,
        }
    }
}

/// A parsed keypoint stream.
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointStream {
    pub header: Option<KeypointStreamHeader>,
    pub frames: Vec<FrameKeypoints>,
}

/// Parse a keypoint stream from JSONL content.
pub fn parse_keypoint_stream(jsonl: &str) -> Result<KeypointStream, serde_json::Error> {
    let mut header = None;
    let mut frames = Vec::new();
    for line in jsonl.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(comment) = line.strip_prefix('#') {
            if header.is_none() {
                header = serde_json::from_str(comment.trim()).ok();
            }
            continue;
        }
        frames.push(serde_json::from_str(line)?);
    }
    Ok(KeypointStream { header, frames })
}

/// Serialize a keypoint stream to JSONL.
pub fn serialize_keypoint_stream(
    header: &KeypointStreamHeader,
    frames: &[FrameKeypoints],
) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    output.push_str("# ");
    output.push_str(&serde_json::to_string(header)?);
    output.push('\n');
    for frame in frames {
        output.push_str(&serde_json::to_string(frame)?);
        output.push('\n');
    }
    Ok(output)
}
