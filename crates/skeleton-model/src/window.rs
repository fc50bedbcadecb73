//! Fixed-length frame sequences.
//!
//! A [`SequenceWindow`] always holds exactly `N` frames. Short inputs are
//! padded by repeating the last available frame, or with sentinel frames
//! when there is nothing to repeat. The same rule backs both the batch
//! constructor and [`RollingWindow::snapshot`], so training and inference
//! see identically shaped input.

use std::collections::VecDeque;

use posewatch_common::{PosewatchError, PosewatchResult};
use serde::{Deserialize, Serialize};

use crate::frame::FrameKeypoints;
use crate::joint::{Joint, JOINT_CHANNELS, JOINT_COUNT};

/// An ordered, non-empty sequence of frames of fixed length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FrameKeypoints>", into = "Vec<FrameKeypoints>")]
pub struct SequenceWindow {
    frames: Vec<FrameKeypoints>,
}

impl SequenceWindow {
    /// Build a window of length `len` from the start of `frames`.
    ///
    /// Takes the first `len` frames; if fewer exist, repeats the last one
    /// until the window is full. An empty input yields `len` sentinel frames.
    pub fn from_frames(frames: &[FrameKeypoints], len: usize) -> PosewatchResult<Self> {
        if len == 0 {
            return Err(PosewatchError::config("window length must be at least 1"));
        }
        let mut out: Vec<FrameKeypoints> = frames.iter().take(len).copied().collect();
        let fill = out.last().copied().unwrap_or_else(FrameKeypoints::sentinel);
        out.resize(len, fill);
        Ok(Self { frames: out })
    }

    /// A window of `len` sentinel frames.
    pub fn sentinel(len: usize) -> PosewatchResult<Self> {
        Self::from_frames(&[], len)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false; windows are never empty.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[FrameKeypoints] {
        &self.frames
    }

    pub fn last(&self) -> &FrameKeypoints {
        // Non-empty by construction.
        &self.frames[self.frames.len() - 1]
    }

    /// Transform every frame, preserving length and order.
    pub fn map_frames(&self, f: impl FnMut(&FrameKeypoints) -> FrameKeypoints) -> Self {
        Self {
            frames: self.frames.iter().map(f).collect(),
        }
    }

    /// Flatten into a `[N, 17, 3]` tensor.
    pub fn to_tensor(&self) -> WindowTensor {
        let mut data = Vec::with_capacity(self.frames.len() * JOINT_COUNT * JOINT_CHANNELS);
        for frame in &self.frames {
            for joint in frame.joints() {
                data.extend_from_slice(&joint.as_array());
            }
        }
        WindowTensor {
            shape: [self.frames.len(), JOINT_COUNT, JOINT_CHANNELS],
            data,
        }
    }

    /// Rebuild a window from a tensor, validating its declared shape.
    pub fn from_tensor(tensor: &WindowTensor) -> PosewatchResult<Self> {
        tensor.validate()?;
        let [n, joints, channels] = tensor.shape;
        if n == 0 || joints != JOINT_COUNT || channels != JOINT_CHANNELS {
            return Err(PosewatchError::shape_mismatch(
                format!("[N>0, {JOINT_COUNT}, {JOINT_CHANNELS}]"),
                format!("{:?}", tensor.shape),
            ));
        }
        let frames = tensor
            .data
            .chunks_exact(JOINT_COUNT * JOINT_CHANNELS)
            .map(|chunk| {
                let mut joints = [Joint::SENTINEL; JOINT_COUNT];
                for (joint, values) in joints.iter_mut().zip(chunk.chunks_exact(JOINT_CHANNELS)) {
                    *joint = Joint::new(values[0], values[1], values[2]);
                }
                FrameKeypoints::new(joints)
            })
            .collect();
        Ok(Self { frames })
    }
}

impl TryFrom<Vec<FrameKeypoints>> for SequenceWindow {
    type Error = String;

    fn try_from(frames: Vec<FrameKeypoints>) -> Result<Self, Self::Error> {
        if frames.is_empty() {
            return Err("a window must contain at least one frame".to_string());
        }
        Ok(Self { frames })
    }
}

impl From<SequenceWindow> for Vec<FrameKeypoints> {
    fn from(window: SequenceWindow) -> Self {
        window.frames
    }
}

/// Dense `[N, 17, 3]` numeric view of a window, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowTensor {
    pub shape: [usize; 3],
    pub data: Vec<f32>,
}

impl WindowTensor {
    pub fn frames(&self) -> usize {
        self.shape[0]
    }

    /// Check that `data` holds exactly as many values as `shape` declares.
    pub fn validate(&self) -> PosewatchResult<()> {
        let expected: usize = self.shape.iter().product();
        if self.data.len() != expected {
            return Err(PosewatchError::shape_mismatch(
                format!("{expected} values for shape {:?}", self.shape),
                format!("{} values", self.data.len()),
            ));
        }
        Ok(())
    }
}

/// Fixed-capacity ring of the most recent frames.
///
/// Owned by exactly one live loop cycle at a time.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    frames: VecDeque<FrameKeypoints>,
    pushed: u64,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> PosewatchResult<Self> {
        if capacity == 0 {
            return Err(PosewatchError::config("rolling window capacity must be at least 1"));
        }
        Ok(Self {
            capacity,
            frames: VecDeque::with_capacity(capacity),
            pushed: 0,
        })
    }

    /// Append a frame, evicting the oldest once full.
    pub fn push(&mut self, frame: FrameKeypoints) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
        self.pushed += 1;
    }

    /// Whether the ring holds `capacity` real frames.
    pub fn is_ready(&self) -> bool {
        self.frames.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total frames pushed since creation or the last clear.
    pub fn frames_seen(&self) -> u64 {
        self.pushed
    }

    /// Full-length view of the current contents, padded with the newest frame
    /// during warm-up.
    pub fn snapshot(&self) -> SequenceWindow {
        let mut frames: Vec<FrameKeypoints> = self.frames.iter().copied().collect();
        let fill = frames.last().copied().unwrap_or_else(FrameKeypoints::sentinel);
        frames.resize(self.capacity, fill);
        SequenceWindow { frames }
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.pushed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame(tag: f32) -> FrameKeypoints {
        FrameKeypoints::new([Joint::new(tag, tag / 2.0, 0.9); JOINT_COUNT])
    }

    #[test]
    fn test_two_frames_pad_to_five() {
        let f0 = frame(0.1);
        let f1 = frame(0.2);
        let window = SequenceWindow::from_frames(&[f0, f1], 5).unwrap();
        assert_eq!(window.frames(), &[f0, f1, f1, f1, f1]);
    }

    #[test]
    fn test_empty_input_is_all_sentinel() {
        let window = SequenceWindow::from_frames(&[], 5).unwrap();
        assert_eq!(window.len(), 5);
        assert!(window.frames().iter().all(FrameKeypoints::is_sentinel));
    }

    #[test]
    fn test_long_input_is_truncated() {
        let frames: Vec<_> = (0..8).map(|i| frame(i as f32 * 0.1)).collect();
        let window = SequenceWindow::from_frames(&frames, 3).unwrap();
        assert_eq!(window.frames(), &frames[..3]);
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(SequenceWindow::from_frames(&[frame(0.1)], 0).is_err());
        assert!(RollingWindow::new(0).is_err());
    }

    #[test]
    fn test_tensor_layout() {
        let window = SequenceWindow::from_frames(&[frame(0.4)], 2).unwrap();
        let tensor = window.to_tensor();
        assert_eq!(tensor.shape, [2, 17, 3]);
        assert_eq!(&tensor.data[..3], &[0.4, 0.2, 0.9]);
        assert_eq!(SequenceWindow::from_tensor(&tensor).unwrap(), window);
    }

    #[test]
    fn test_from_tensor_shape_mismatch() {
        let tensor = WindowTensor {
            shape: [2, 17, 3],
            data: vec![0.0; 10],
        };
        let err = SequenceWindow::from_tensor(&tensor).unwrap_err();
        assert!(matches!(err, PosewatchError::ShapeMismatch { .. }));

        let tensor = WindowTensor {
            shape: [1, 16, 3],
            data: vec![0.0; 48],
        };
        assert!(SequenceWindow::from_tensor(&tensor).is_err());
    }

    #[test]
    fn test_deserialize_rejects_empty_window() {
        assert!(serde_json::from_str::<SequenceWindow>("[]").is_err());
    }

    #[test]
    fn test_rolling_warm_up_pads_with_newest() {
        let mut rolling = RollingWindow::new(4).unwrap();
        assert!(rolling.snapshot().frames().iter().all(FrameKeypoints::is_sentinel));

        rolling.push(frame(0.1));
        rolling.push(frame(0.2));
        assert!(!rolling.is_ready());
        let snapshot = rolling.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert_eq!(snapshot.frames()[3], frame(0.2));
    }

    #[test]
    fn test_rolling_evicts_oldest() {
        let mut rolling = RollingWindow::new(3).unwrap();
        for i in 0..5 {
            rolling.push(frame(i as f32));
        }
        assert!(rolling.is_ready());
        assert_eq!(rolling.len(), 3);
        assert_eq!(rolling.frames_seen(), 5);
        assert_eq!(
            rolling.snapshot().frames(),
            &[frame(2.0), frame(3.0), frame(4.0)]
        );

        rolling.clear();
        assert!(rolling.is_empty());
        assert_eq!(rolling.frames_seen(), 0);
    }

    proptest! {
        #[test]
        fn prop_padding_shape_and_fill(n in 1usize..40, k in 0usize..40) {
            let k = k.min(n);
            let frames: Vec<_> = (0..k).map(|i| frame(i as f32)).collect();
            let window = SequenceWindow::from_frames(&frames, n).unwrap();
            let tensor = window.to_tensor();

            prop_assert_eq!(tensor.shape, [n, JOINT_COUNT, JOINT_CHANNELS]);
            prop_assert_eq!(tensor.data.len(), n * JOINT_COUNT * JOINT_CHANNELS);

            let fill = frames.last().copied().unwrap_or_else(FrameKeypoints::sentinel);
            for padded in &window.frames()[k..] {
                prop_assert_eq!(*padded, fill);
            }
            prop_assert_eq!(&window.frames()[..k], &frames[..]);
        }

        #[test]
        fn prop_rolling_snapshot_is_full_length(cap in 1usize..20, pushes in 0usize..50) {
            let mut rolling = RollingWindow::new(cap).unwrap();
            for i in 0..pushes {
                rolling.push(frame(i as f32));
            }
            prop_assert_eq!(rolling.snapshot().len(), cap);
            prop_assert_eq!(rolling.is_ready(), pushes >= cap);
        }
    }
}
