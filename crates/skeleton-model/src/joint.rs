//! Canonical joint layout.
//!
//! The pipeline uses the 17-joint COCO ordering everywhere. A joint's
//! position in a frame is its identity; nothing downstream looks joints up
//! by name.

use serde::{Deserialize, Serialize};

/// Number of joints in every frame.
pub const JOINT_COUNT: usize = 17;

/// Values stored per joint: x, y, score.
pub const JOINT_CHANNELS: usize = 3;

/// The 17 canonical joints in COCO order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CocoJoint {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl CocoJoint {
    /// All joints in canonical order.
    pub const ALL: [CocoJoint; JOINT_COUNT] = [
        CocoJoint::Nose,
        CocoJoint::LeftEye,
        CocoJoint::RightEye,
        CocoJoint::LeftEar,
        CocoJoint::RightEar,
        CocoJoint::LeftShoulder,
        CocoJoint::RightShoulder,
        CocoJoint::LeftElbow,
        CocoJoint::RightElbow,
        CocoJoint::LeftWrist,
        CocoJoint::RightWrist,
        CocoJoint::LeftHip,
        CocoJoint::RightHip,
        CocoJoint::LeftKnee,
        CocoJoint::RightKnee,
        CocoJoint::LeftAnkle,
        CocoJoint::RightAnkle,
    ];

    /// Canonical index in `[0, 17)`.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Snake-case name as reported by MoveNet-style estimators.
    pub fn name(self) -> &'static str {
        match self {
            CocoJoint::Nose => "nose",
            CocoJoint::LeftEye => "left_eye",
            CocoJoint::RightEye => "right_eye",
            CocoJoint::LeftEar => "left_ear",
            CocoJoint::RightEar => "right_ear",
            CocoJoint::LeftShoulder => "left_shoulder",
            CocoJoint::RightShoulder => "right_shoulder",
            CocoJoint::LeftElbow => "left_elbow",
            CocoJoint::RightElbow => "right_elbow",
            CocoJoint::LeftWrist => "left_wrist",
            CocoJoint::RightWrist => "right_wrist",
            CocoJoint::LeftHip => "left_hip",
            CocoJoint::RightHip => "right_hip",
            CocoJoint::LeftKnee => "left_knee",
            CocoJoint::RightKnee => "right_knee",
            CocoJoint::LeftAnkle => "left_ankle",
            CocoJoint::RightAnkle => "right_ankle",
        }
    }

    /// Look a joint up by name. Accepts snake_case, camelCase and
    /// space-separated spellings.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|joint| joint.name().replace('_', "") == normalized)
    }

    /// The left/right partner of this joint. The nose maps to itself.
    pub fn mirrored(self) -> Self {
        match self {
            CocoJoint::Nose => CocoJoint::Nose,
            CocoJoint::LeftEye => CocoJoint::RightEye,
            CocoJoint::RightEye => CocoJoint::LeftEye,
            CocoJoint::LeftEar => CocoJoint::RightEar,
            CocoJoint::RightEar => CocoJoint::LeftEar,
            CocoJoint::LeftShoulder => CocoJoint::RightShoulder,
            CocoJoint::RightShoulder => CocoJoint::LeftShoulder,
            CocoJoint::LeftElbow => CocoJoint::RightElbow,
            CocoJoint::RightElbow => CocoJoint::LeftElbow,
            CocoJoint::LeftWrist => CocoJoint::RightWrist,
            CocoJoint::RightWrist => CocoJoint::LeftWrist,
            CocoJoint::LeftHip => CocoJoint::RightHip,
            CocoJoint::RightHip => CocoJoint::LeftHip,
            CocoJoint::LeftKnee => CocoJoint::RightKnee,
            CocoJoint::RightKnee => CocoJoint::LeftKnee,
            CocoJoint::LeftAnkle => CocoJoint::RightAnkle,
            CocoJoint::RightAnkle => CocoJoint::LeftAnkle,
        }
    }
}

/// One joint sample. Serialized compactly as `[x, y, score]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Joint {
    /// Normalized X coordinate.
    pub x: f32,
    /// Normalized Y coordinate.
    pub y: f32,
    /// Detection confidence in `[0.0, 1.0]`. Zero means "not detected".
    pub score: f32,
}

impl Joint {
    /// Placeholder for a joint with no detection.
    pub const SENTINEL: Joint = Joint {
        x: 1.0,
        y: 1.0,
        score: 0.0,
    };

    pub fn new(x: f32, y: f32, score: f32) -> Self {
        Self { x, y, score }
    }

    pub fn as_array(&self) -> [f32; JOINT_CHANNELS] {
        [self.x, self.y, self.score]
    }
}

impl From<[f32; 3]> for Joint {
    fn from([x, y, score]: [f32; 3]) -> Self {
        Self { x, y, score }
    }
}

impl From<Joint> for [f32; 3] {
    fn from(joint: Joint) -> Self {
        joint.as_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_roundtrip() {
        for (i, joint) in CocoJoint::ALL.iter().enumerate() {
            assert_eq!(joint.index(), i);
            assert_eq!(CocoJoint::from_index(i), Some(*joint));
        }
        assert_eq!(CocoJoint::from_index(JOINT_COUNT), None);
    }

    #[test]
    fn test_from_name_spellings() {
        assert_eq!(
            CocoJoint::from_name("left_shoulder"),
            Some(CocoJoint::LeftShoulder)
        );
        assert_eq!(
            CocoJoint::from_name("leftShoulder"),
            Some(CocoJoint::LeftShoulder)
        );
        assert_eq!(
            CocoJoint::from_name("Right Ankle"),
            Some(CocoJoint::RightAnkle)
        );
        assert_eq!(CocoJoint::from_name("left_pinky"), None);
    }

    #[test]
    fn test_mirrored_is_involution() {
        for joint in CocoJoint::ALL {
            assert_eq!(joint.mirrored().mirrored(), joint);
        }
        assert_eq!(CocoJoint::LeftWrist.mirrored(), CocoJoint::RightWrist);
    }

    #[test]
    fn test_joint_serializes_as_triple() {
        let json = serde_json::to_string(&Joint::new(0.25, 0.5, 0.9)).unwrap();
        assert_eq!(json, "[0.25,0.5,0.9]");
        let parsed: Joint = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Joint::new(0.25, 0.5, 0.9));
    }
}
