//! Horizontal mirror augmentation.
//!
//! Every joint's `x` becomes `reference_width - x`; `y` and `score` are
//! untouched. Joint identities are not swapped, so a mirrored left wrist
//! still sits in the left-wrist slot. Windows are stored in normalized
//! coordinates, so the reference width is always [`REFERENCE_WIDTH`].

use posewatch_skeleton_model::{FrameKeypoints, Joint, LabeledExample, SequenceWindow};

/// Mirror reference width in normalized frame coordinates.
pub const REFERENCE_WIDTH: f32 = 1.0;

/// Label-preserving horizontal flip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorAugmenter {
    reference_width: f32,
}

impl Default for MirrorAugmenter {
    fn default() -> Self {
        Self {
            reference_width: REFERENCE_WIDTH,
        }
    }
}

impl MirrorAugmenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reference_width(&self) -> f32 {
        self.reference_width
    }

    pub fn mirror_joint(&self, joint: Joint) -> Joint {
        Joint::new(self.reference_width - joint.x, joint.y, joint.score)
    }

    pub fn mirror_frame(&self, frame: &FrameKeypoints) -> FrameKeypoints {
        frame.map_joints(|_, joint| self.mirror_joint(joint))
    }

    pub fn mirror_window(&self, window: &SequenceWindow) -> SequenceWindow {
        window.map_frames(|frame| self.mirror_frame(frame))
    }

    /// The mirrored counterpart of an example, with the same label.
    pub fn mirror_example(&self, example: &LabeledExample) -> LabeledExample {
        example.map_window(|window| self.mirror_window(window))
    }

    /// Each example followed by its mirrored counterpart.
    pub fn augment(&self, examples: Vec<LabeledExample>) -> Vec<LabeledExample> {
        let mut out = Vec::with_capacity(examples.len() * 2);
        for example in examples {
            let mirrored = self.mirror_example(&example);
            out.push(example);
            out.push(mirrored);
        }
        out
    }
}
