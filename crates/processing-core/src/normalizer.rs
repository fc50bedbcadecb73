//! Keypoint normalization.
//!
//! Maps one frame's raw pose-estimator output onto the canonical 17-joint
//! layout. Normalization never fails: empty or malformed input becomes the
//! sentinel frame and the reason is reported through [`NormalizeOutcome`].

use posewatch_skeleton_model::{
    CocoJoint, DetectedPose, FrameKeypoints, Joint, KeypointSpace, PoseDetection, JOINT_COUNT,
};

/// Which pose to keep when the estimator reports several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoseSelection {
    /// Highest pose score. Falls back to the first pose when no pose is
    /// scored; ties keep the earlier pose.
    #[default]
    HighestScore,
    /// Always the first pose reported.
    First,
}

/// What happened while normalizing one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizeOutcome {
    /// A pose was mapped onto the canonical layout.
    Detected {
        /// Index of the selected pose in the estimator output.
        pose_index: usize,
        /// Canonical joints filled from the estimator output.
        mapped_joints: usize,
        /// Keypoints that did not map to a canonical joint.
        dropped_keypoints: usize,
    },
    /// No pose was detected; the sentinel frame was emitted.
    Empty,
    /// The detection was unusable; the sentinel frame was emitted.
    Malformed(String),
}

impl NormalizeOutcome {
    pub fn is_detected(&self) -> bool {
        matches!(self, Self::Detected { .. })
    }
}

/// A normalized frame plus its diagnostic outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub frame: FrameKeypoints,
    pub outcome: NormalizeOutcome,
}

/// Keypoint normalizer.
#[derive(Debug, Clone, Default)]
pub struct KeypointNormalizer {
    selection: PoseSelection,
}

impl KeypointNormalizer {
    pub fn new(selection: PoseSelection) -> Self {
        Self { selection }
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> PoseSelection {
        self.selection
    }

    /// Normalize one detection, discarding the diagnostic.
    pub fn normalize_frame(&self, detection: &PoseDetection) -> FrameKeypoints {
        self.normalize(detection).frame
    }

    /// Normalize one detection into exactly 17 joints.
    pub fn normalize(&self, detection: &PoseDetection) -> Normalized {
        let Some(pose_index) = self.select(&detection.poses) else {
            tracing::debug!("No pose detected, emitting sentinel frame");
            return Normalized {
                frame: FrameKeypoints::sentinel(),
                outcome: NormalizeOutcome::Empty,
            };
        };

        match map_pose(&detection.poses[pose_index], detection) {
            Ok((frame, mapped_joints, dropped_keypoints)) => Normalized {
                frame,
                outcome: NormalizeOutcome::Detected {
                    pose_index,
                    mapped_joints,
                    dropped_keypoints,
                },
            },
            Err(reason) => {
                tracing::warn!(pose_index, reason = %reason, "Malformed detection, emitting sentinel frame");
                Normalized {
                    frame: FrameKeypoints::sentinel(),
                    outcome: NormalizeOutcome::Malformed(reason),
                }
            }
        }
    }

    fn select(&self, poses: &[DetectedPose]) -> Option<usize> {
        if poses.is_empty() {
            return None;
        }
        match self.selection {
            PoseSelection::First => Some(0),
            PoseSelection::HighestScore => {
                let mut best: Option<(usize, f32)> = None;
                for (i, pose) in poses.iter().enumerate() {
                    let Some(score) = pose.score.filter(|s| s.is_finite()) else {
                        continue;
                    };
                    if best.map_or(true, |(_, b)| score > b) {
                        best = Some((i, score));
                    }
                }
                Some(best.map_or(0, |(i, _)| i))
            }
        }
    }
}

/// Map one pose onto canonical joints. Returns the frame, the number of
/// mapped joints, and the number of dropped keypoints.
fn map_pose(
    pose: &DetectedPose,
    detection: &PoseDetection,
) -> Result<(FrameKeypoints, usize, usize), String> {
    let (scale_x, scale_y) = match detection.space {
        KeypointSpace::Normalized => (1.0, 1.0),
        KeypointSpace::Pixel => {
            if detection.frame_width == 0 || detection.frame_height == 0 {
                return Err(format!(
                    "pixel keypoints with zero frame size {}x{}",
                    detection.frame_width, detection.frame_height
                ));
            }
            (
                1.0 / detection.frame_width as f32,
                1.0 / detection.frame_height as f32,
            )
        }
    };

    let mut joints = [Joint::SENTINEL; JOINT_COUNT];
    let mut filled = [false; JOINT_COUNT];
    let mut dropped = 0;

    for (position, keypoint) in pose.keypoints.iter().enumerate() {
        let canonical = match &keypoint.name {
            Some(name) => CocoJoint::from_name(name),
            None => CocoJoint::from_index(position),
        };
        let Some(joint) = canonical else {
            dropped += 1;
            continue;
        };
        if filled[joint.index()] {
            dropped += 1;
            continue;
        }
        if !(keypoint.x.is_finite() && keypoint.y.is_finite() && keypoint.score.is_finite()) {
            return Err(format!("non-finite values for joint {}", joint.name()));
        }
        joints[joint.index()] = Joint::new(
            keypoint.x * scale_x,
            keypoint.y * scale_y,
            keypoint.score.clamp(0.0, 1.0),
        );
        filled[joint.index()] = true;
    }

    let mapped = filled.iter().filter(|f| **f).count();
    Ok((FrameKeypoints::new(joints), mapped, dropped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use posewatch_skeleton_model::RawKeypoint;

    fn pose(score: Option<f32>, keypoints: Vec<RawKeypoint>) -> DetectedPose {
        DetectedPose { score, keypoints }
    }

    fn full_pose(score: Option<f32>, x: f32) -> DetectedPose {
        pose(
            score,
            (0..JOINT_COUNT).map(|_| RawKeypoint::new(x, 0.5, 0.9)).collect(),
        )
    }

    fn normalized(poses: Vec<DetectedPose>) -> PoseDetection {
        PoseDetection {
            frame_width: 640,
            frame_height: 480,
            space: KeypointSpace::Normalized,
            poses,
        }
    }

    #[test]
    fn test_zero_poses_yield_sentinel() {
        let result = KeypointNormalizer::with_defaults().normalize(&PoseDetection::empty(640, 480));
        assert!(result.frame.is_sentinel());
        assert_eq!(result.outcome, NormalizeOutcome::Empty);
    }

    #[test]
    fn test_pixel_coordinates_are_scaled() {
        let detection = PoseDetection {
            frame_width: 640,
            frame_height: 480,
            space: KeypointSpace::Pixel,
            poses: vec![pose(None, vec![RawKeypoint::new(320.0, 120.0, 0.7)])],
        };
        let result = KeypointNormalizer::with_defaults().normalize(&detection);
        let nose = result.frame.joint(CocoJoint::Nose);
        assert!((nose.x - 0.5).abs() < 1e-6);
        assert!((nose.y - 0.25).abs() < 1e-6);
        assert_eq!(result.frame.joint(CocoJoint::LeftEye), Joint::SENTINEL);
        assert_eq!(
            result.outcome,
            NormalizeOutcome::Detected {
                pose_index: 0,
                mapped_joints: 1,
                dropped_keypoints: 0
            }
        );
    }

    #[test]
    fn test_named_joints_map_regardless_of_order() {
        let detection = normalized(vec![pose(
            Some(0.9),
            vec![
                RawKeypoint::named("right_ankle", 0.9, 0.9, 0.5),
                RawKeypoint::named("nose", 0.1, 0.1, 0.6),
                RawKeypoint::named("tail", 0.3, 0.3, 0.9),
                RawKeypoint::named("nose", 0.7, 0.7, 0.9),
            ],
        )]);
        let result = KeypointNormalizer::with_defaults().normalize(&detection);
        assert_eq!(result.frame.joint(CocoJoint::RightAnkle).x, 0.9);
        assert_eq!(result.frame.joint(CocoJoint::Nose).x, 0.1);
        assert_eq!(
            result.outcome,
            NormalizeOutcome::Detected {
                pose_index: 0,
                mapped_joints: 2,
                dropped_keypoints: 2
            }
        );
    }

    #[test]
    fn test_positional_keypoints_beyond_17_are_dropped() {
        let mut keypoints: Vec<_> = (0..20).map(|i| RawKeypoint::new(i as f32 * 0.01, 0.5, 0.1)).collect();
        keypoints[3].score = 0.0;
        let detection = normalized(vec![pose(None, keypoints)]);
        let result = KeypointNormalizer::with_defaults().normalize(&detection);
        assert_eq!(result.frame.detected_count(), 16);
        assert!((result.frame.joint(CocoJoint::RightAnkle).x - 0.16).abs() < 1e-6);
    }

    #[test]
    fn test_highest_score_selection() {
        let detection = normalized(vec![
            full_pose(Some(0.4), 0.1),
            full_pose(Some(0.8), 0.2),
            full_pose(Some(0.8), 0.3),
        ]);
        let result = KeypointNormalizer::new(PoseSelection::HighestScore).normalize(&detection);
        assert_eq!(result.frame.joint(CocoJoint::Nose).x, 0.2);

        let first = KeypointNormalizer::new(PoseSelection::First).normalize(&detection);
        assert_eq!(first.frame.joint(CocoJoint::Nose).x, 0.1);
    }

    #[test]
    fn test_unscored_poses_fall_back_to_first() {
        let detection = normalized(vec![full_pose(None, 0.1), full_pose(None, 0.2)]);
        let result = KeypointNormalizer::with_defaults().normalize(&detection);
        assert_eq!(result.frame.joint(CocoJoint::Nose).x, 0.1);
    }

    #[test]
    fn test_low_confidence_joints_kept_and_scores_clamped() {
        let detection = normalized(vec![pose(
            None,
            vec![
                RawKeypoint::named("nose", 0.2, 0.2, 0.01),
                RawKeypoint::named("left_eye", 0.2, 0.2, 1.7),
            ],
        )]);
        let frame = KeypointNormalizer::with_defaults().normalize_frame(&detection);
        assert_eq!(frame.joint(CocoJoint::Nose).score, 0.01);
        assert_eq!(frame.joint(CocoJoint::LeftEye).score, 1.0);
    }

    #[test]
    fn test_non_finite_input_is_malformed() {
        let detection = normalized(vec![pose(None, vec![RawKeypoint::new(f32::NAN, 0.2, 0.5)])]);
        let result = KeypointNormalizer::with_defaults().normalize(&detection);
        assert!(result.frame.is_sentinel());
        assert!(matches!(result.outcome, NormalizeOutcome::Malformed(_)));
    }

    #[test]
    fn test_zero_sized_pixel_frame_is_malformed() {
        let detection = PoseDetection {
            frame_width: 0,
            frame_height: 480,
            space: KeypointSpace::Pixel,
            poses: vec![full_pose(None, 10.0)],
        };
        let result = KeypointNormalizer::with_defaults().normalize(&detection);
        assert!(result.frame.is_sentinel());
        assert!(!result.outcome.is_detected());
    }
}
