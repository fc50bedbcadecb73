//! Batched input tensors.

use posewatch_common::{PosewatchError, PosewatchResult};
use posewatch_skeleton_model::{LabeledExample, JOINT_CHANNELS, JOINT_COUNT};

/// `[batch, N, 17, 3]` inputs with `[batch]` label indices.
///
/// Built inside each fit/evaluate call and dropped before it returns.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchTensor {
    pub shape: [usize; 4],
    pub inputs: Vec<f32>,
    pub labels: Vec<usize>,
}

impl BatchTensor {
    pub fn from_examples(examples: &[LabeledExample], window_len: usize) -> PosewatchResult<Self> {
        let sample_len = window_len * JOINT_COUNT * JOINT_CHANNELS;
        let mut inputs = Vec::with_capacity(examples.len() * sample_len);
        let mut labels = Vec::with_capacity(examples.len());

        for (i, example) in examples.iter().enumerate() {
            let tensor = example.window.to_tensor();
            if tensor.shape != [window_len, JOINT_COUNT, JOINT_CHANNELS] {
                return Err(PosewatchError::shape_mismatch(
                    format!("[{window_len}, {JOINT_COUNT}, {JOINT_CHANNELS}]"),
                    format!("{:?} at example {i}", tensor.shape),
                ));
            }
            inputs.extend_from_slice(&tensor.data);
            labels.push(example.label.index());
        }

        Ok(Self {
            shape: [examples.len(), window_len, JOINT_COUNT, JOINT_CHANNELS],
            inputs,
            labels,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.shape[0]
    }

    /// Values per example.
    pub fn sample_len(&self) -> usize {
        self.shape[1..].iter().product()
    }

    /// Flattened input of example `i`.
    pub fn sample(&self, i: usize) -> &[f32] {
        let len = self.sample_len();
        &self.inputs[i * len..(i + 1) * len]
    }
}
