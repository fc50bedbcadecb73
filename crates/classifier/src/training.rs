//! Training control and evaluation results.

use posewatch_common::{PosewatchError, PosewatchResult};
use serde::{Deserialize, Serialize};

/// Settings for one `fit` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Maximum number of passes over the training set.
    pub epochs: usize,

    /// Examples per mini-batch.
    pub batch_size: usize,

    /// Step size in `(0, 1]`.
    pub learning_rate: f32,

    /// Stop after this many epochs without validation-loss improvement.
    pub early_stopping_patience: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 50,
            batch_size: 32,
            learning_rate: 0.2,
            early_stopping_patience: Some(10),
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> PosewatchResult<()> {
        if self.epochs == 0 {
            return Err(PosewatchError::config("epochs must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(PosewatchError::config("batch_size must be at least 1"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(PosewatchError::config(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if self.early_stopping_patience == Some(0) {
            return Err(PosewatchError::config("early_stopping_patience must be at least 1"));
        }
        Ok(())
    }
}

/// Metrics recorded after one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// One-based epoch number.
    pub epoch: usize,
    pub loss: f32,
    pub accuracy: f32,
    pub val_loss: Option<f32>,
    pub val_accuracy: Option<f32>,
}

/// Training curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochMetrics>,
    pub stopped_early: bool,
    /// Epoch whose state the model kept.
    pub best_epoch: usize,
}

impl TrainingHistory {
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }
}

/// Loss and accuracy over a labeled set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub loss: f32,
    pub accuracy: f32,
    pub samples: usize,
}
