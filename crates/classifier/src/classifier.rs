//! The classifier facade.

use std::path::Path;

use posewatch_common::{PosewatchError, PosewatchResult};
use posewatch_skeleton_model::{Label, LabeledExample, SequenceWindow};
use serde::{Deserialize, Serialize};

use crate::training::{Evaluation, TrainingConfig, TrainingHistory};

/// Trainable window classifier.
///
/// `predict` takes `&self` so one trained model can serve several live
/// loops at once.
#[async_trait::async_trait]
pub trait SequenceClassifier: Send + Sync {
    /// Frames per window this model accepts.
    fn window_len(&self) -> usize;

    /// Class probabilities for one window.
    async fn predict(&self, window: &SequenceWindow) -> PosewatchResult<ClassProbabilities>;

    /// Train on `train`, monitoring `validation` (which may be empty).
    fn fit(
        &mut self,
        train: &[LabeledExample],
        validation: &[LabeledExample],
        config: &TrainingConfig,
    ) -> PosewatchResult<TrainingHistory>;

    /// Loss and accuracy over a labeled set.
    fn evaluate(&self, examples: &[LabeledExample]) -> PosewatchResult<Evaluation>;

    /// Persist model state.
    fn save(&self, path: &Path) -> PosewatchResult<()>;

    /// Restore model state written by [`SequenceClassifier::save`].
    fn load(path: &Path) -> PosewatchResult<Self>
    where
        Self: Sized;
}

/// Per-class probability vector, indexed by [`Label::index`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct ClassProbabilities {
    values: [f32; Label::COUNT],
}

impl ClassProbabilities {
    pub fn new(values: [f32; Label::COUNT]) -> PosewatchResult<Self> {
        if values.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(PosewatchError::classifier(format!(
                "probabilities must be finite and non-negative, got {values:?}"
            )));
        }
        Ok(Self { values })
    }

    /// Build from a model's raw output vector.
    pub fn from_slice(values: &[f32]) -> PosewatchResult<Self> {
        let values: [f32; Label::COUNT] = values.try_into().map_err(|_| {
            PosewatchError::shape_mismatch(
                format!("{} class probabilities", Label::COUNT),
                format!("{} values", values.len()),
            )
        })?;
        Self::new(values)
    }

    pub fn probability(&self, label: Label) -> f32 {
        self.values[label.index()]
    }

    /// Most likely class. Ties resolve to the lower index.
    pub fn predicted(&self) -> Label {
        if self.values[1] > self.values[0] {
            Label::Anomalous
        } else {
            Label::Normal
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

impl TryFrom<Vec<f32>> for ClassProbabilities {
    type Error = PosewatchError;

    fn try_from(values: Vec<f32>) -> PosewatchResult<Self> {
        Self::from_slice(&values)
    }
}

impl From<ClassProbabilities> for Vec<f32> {
    fn from(probabilities: ClassProbabilities) -> Self {
        probabilities.values.to_vec()
    }
}
