//! Nearest-centroid baseline classifier.
//!
//! Keeps one centroid tensor per class. Each mini-batch pulls a class's
//! centroid toward that class's batch mean by the learning rate. Class
//! probabilities are a softmax over negative mean squared distances.

use std::path::Path;

use posewatch_common::{PosewatchError, PosewatchResult};
use posewatch_skeleton_model::{Label, LabeledExample, SequenceWindow, JOINT_CHANNELS, JOINT_COUNT};
use serde::{Deserialize, Serialize};

use crate::batch::BatchTensor;
use crate::classifier::{ClassProbabilities, SequenceClassifier};
use crate::training::{EpochMetrics, Evaluation, TrainingConfig, TrainingHistory};

const MODEL_VERSION: &str = "1.0";

/// Smallest validation-loss decrease that counts as improvement.
const MIN_IMPROVEMENT: f32 = 1e-4;

/// Probability floor inside the cross-entropy log.
const LOSS_EPSILON: f32 = 1e-7;

/// Baseline classifier with JSON persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidClassifier {
    version: String,
    window_len: usize,
    /// Softmax temperature over mean squared distances.
    temperature: f32,
    /// One flattened `[N, 17, 3]` centroid per class.
    centroids: Vec<Vec<f32>>,
}

impl CentroidClassifier {
    pub fn new(window_len: usize) -> PosewatchResult<Self> {
        Self::with_temperature(window_len, 0.02)
    }

    pub fn with_temperature(window_len: usize, temperature: f32) -> PosewatchResult<Self> {
        if window_len == 0 {
            return Err(PosewatchError::config("window length must be at least 1"));
        }
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(PosewatchError::config("temperature must be positive"));
        }
        let sample_len = window_len * JOINT_COUNT * JOINT_CHANNELS;
        Ok(Self {
            version: MODEL_VERSION.to_string(),
            window_len,
            temperature,
            centroids: vec![vec![0.0; sample_len]; Label::COUNT],
        })
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    fn sample_len(&self) -> usize {
        self.window_len * JOINT_COUNT * JOINT_CHANNELS
    }

    fn validate(&self) -> PosewatchResult<()> {
        let sample_len = self.sample_len();
        if self.window_len == 0 || self.centroids.len() != Label::COUNT {
            return Err(PosewatchError::classifier(format!(
                "model needs {} centroids for a non-empty window, found {}",
                Label::COUNT,
                self.centroids.len()
            )));
        }
        if let Some(bad) = self.centroids.iter().find(|c| c.len() != sample_len) {
            return Err(PosewatchError::shape_mismatch(
                format!("centroid of {sample_len} values"),
                format!("centroid of {} values", bad.len()),
            ));
        }
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(PosewatchError::classifier("temperature must be positive"));
        }
        Ok(())
    }

    fn probabilities(&self, sample: &[f32]) -> [f32; Label::COUNT] {
        let mut logits = [0.0f32; Label::COUNT];
        for (logit, centroid) in logits.iter_mut().zip(&self.centroids) {
            let msd = sample
                .iter()
                .zip(centroid)
                .map(|(s, c)| (s - c) * (s - c))
                .sum::<f32>()
                / sample.len() as f32;
            *logit = -msd / self.temperature;
        }
        softmax(logits)
    }

    /// Mean cross-entropy loss and accuracy over a batch.
    fn score(&self, batch: &BatchTensor) -> (f32, f32) {
        let n = batch.batch_size();
        if n == 0 {
            return (0.0, 0.0);
        }
        let mut loss = 0.0;
        let mut correct = 0usize;
        for (i, label) in batch.labels.iter().enumerate() {
            let probs = self.probabilities(batch.sample(i));
            loss -= probs[*label].max(LOSS_EPSILON).ln();
            let predicted = if probs[1] > probs[0] { 1 } else { 0 };
            if predicted == *label {
                correct += 1;
            }
        }
        (loss / n as f32, correct as f32 / n as f32)
    }

    /// One pass of centroid updates over `batch`, `batch_size` examples at a time.
    fn train_epoch(&mut self, batch: &BatchTensor, batch_size: usize, learning_rate: f32) {
        let sample_len = self.sample_len();
        let mut sums = vec![vec![0.0f32; sample_len]; Label::COUNT];
        let indices: Vec<usize> = (0..batch.batch_size()).collect();

        for chunk in indices.chunks(batch_size) {
            let mut counts = [0usize; Label::COUNT];
            for sum in sums.iter_mut() {
                sum.fill(0.0);
            }
            for &i in chunk {
                let label = batch.labels[i];
                counts[label] += 1;
                for (acc, value) in sums[label].iter_mut().zip(batch.sample(i)) {
                    *acc += value;
                }
            }
            for (class, centroid) in self.centroids.iter_mut().enumerate() {
                if counts[class] == 0 {
                    continue;
                }
                let count = counts[class] as f32;
                for (c, sum) in centroid.iter_mut().zip(&sums[class]) {
                    *c += learning_rate * (sum / count - *c);
                }
            }
        }
    }
}

fn softmax(logits: [f32; Label::COUNT]) -> [f32; Label::COUNT] {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut out = logits.map(|l| (l - max).exp());
    let sum: f32 = out.iter().sum();
    for p in out.iter_mut() {
        *p /= sum;
    }
    out
}

#[async_trait::async_trait]
impl SequenceClassifier for CentroidClassifier {
    fn window_len(&self) -> usize {
        self.window_len
    }

    async fn predict(&self, window: &SequenceWindow) -> PosewatchResult<ClassProbabilities> {
        let tensor = window.to_tensor();
        if tensor.frames() != self.window_len {
            return Err(PosewatchError::shape_mismatch(
                format!("[{}, {JOINT_COUNT}, {JOINT_CHANNELS}]", self.window_len),
                format!("{:?}", tensor.shape),
            ));
        }
        ClassProbabilities::new(self.probabilities(&tensor.data))
    }

    fn fit(
        &mut self,
        train: &[LabeledExample],
        validation: &[LabeledExample],
        config: &TrainingConfig,
    ) -> PosewatchResult<TrainingHistory> {
        config.validate()?;
        if train.is_empty() {
            return Err(PosewatchError::classifier("training set is empty"));
        }

        let train_batch = BatchTensor::from_examples(train, self.window_len)?;
        let val_batch = if validation.is_empty() {
            None
        } else {
            Some(BatchTensor::from_examples(validation, self.window_len)?)
        };

        let mut history = TrainingHistory::default();
        let mut best_loss = f32::INFINITY;
        let mut best_centroids = self.centroids.clone();
        let mut epochs_without_improvement = 0;

        for epoch in 1..=config.epochs {
            self.train_epoch(&train_batch, config.batch_size, config.learning_rate);

            let (loss, accuracy) = self.score(&train_batch);
            let val = val_batch.as_ref().map(|b| self.score(b));
            history.epochs.push(EpochMetrics {
                epoch,
                loss,
                accuracy,
                val_loss: val.map(|(l, _)| l),
                val_accuracy: val.map(|(_, a)| a),
            });
            tracing::debug!(epoch, loss, accuracy, val_loss = ?val.map(|(l, _)| l), "Epoch complete");

            let monitored = val.map_or(loss, |(l, _)| l);
            if monitored < best_loss - MIN_IMPROVEMENT {
                best_loss = monitored;
                best_centroids.clone_from(&self.centroids);
                history.best_epoch = epoch;
                epochs_without_improvement = 0;
            } else {
                epochs_without_improvement += 1;
                if config
                    .early_stopping_patience
                    .is_some_and(|patience| epochs_without_improvement >= patience)
                {
                    tracing::info!(epoch, best_epoch = history.best_epoch, "Early stopping");
                    history.stopped_early = true;
                    break;
                }
            }
        }

        self.centroids = best_centroids;
        tracing::debug!(
            examples = train_batch.batch_size(),
            bytes = train_batch.inputs.len() * std::mem::size_of::<f32>(),
            "Releasing training tensors"
        );
        Ok(history)
    }

    fn evaluate(&self, examples: &[LabeledExample]) -> PosewatchResult<Evaluation> {
        if examples.is_empty() {
            return Err(PosewatchError::classifier("cannot evaluate an empty set"));
        }
        let batch = BatchTensor::from_examples(examples, self.window_len)?;
        let (loss, accuracy) = self.score(&batch);
        Ok(Evaluation {
            loss,
            accuracy,
            samples: batch.batch_size(),
        })
    }

    fn save(&self, path: &Path) -> PosewatchResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string(self)?)?;
        tracing::debug!(path = %path.display(), "Model saved");
        Ok(())
    }

    fn load(path: &Path) -> PosewatchResult<Self> {
        if !path.exists() {
            return Err(PosewatchError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let model: Self = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        model.validate()?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posewatch_skeleton_model::{FrameKeypoints, Joint};

    const LEN: usize = 4;

    fn example(x: f32, label: Label) -> LabeledExample {
        let frame = FrameKeypoints::new([Joint::new(x, 0.5, 0.9); JOINT_COUNT]);
        LabeledExample::new(SequenceWindow::from_frames(&[frame], LEN).unwrap(), label)
    }

    fn toy_set() -> Vec<LabeledExample> {
        let mut set = Vec::new();
        for i in 0..10 {
            let jitter = i as f32 * 0.005;
            set.push(example(0.2 + jitter, Label::Normal));
            set.push(example(0.8 - jitter, Label::Anomalous));
        }
        set
    }

    fn trained() -> CentroidClassifier {
        let mut model = CentroidClassifier::new(LEN).unwrap();
        let data = toy_set();
        model
            .fit(&data[..16], &data[16..], &TrainingConfig::default())
            .unwrap();
        model
    }

    #[test]
    fn test_untrained_model_is_uninformative() {
        let model = CentroidClassifier::new(LEN).unwrap();
        let probs = model.probabilities(&vec![0.3; LEN * JOINT_COUNT * JOINT_CHANNELS]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_separable_data_reaches_full_accuracy() {
        let model = trained();
        let eval = model.evaluate(&toy_set()).unwrap();
        assert_eq!(eval.accuracy, 1.0);
        assert_eq!(eval.samples, 20);
        assert!(eval.loss < 0.1);
    }

    #[tokio::test]
    async fn test_predict_probabilities() {
        let model = trained();
        let probs = model.predict(&example(0.82, Label::Anomalous).window).await.unwrap();
        assert!(probs.probability(Label::Anomalous) > 0.8);
        assert!((probs.as_slice().iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_predict_rejects_wrong_window_length() {
        let model = CentroidClassifier::new(LEN).unwrap();
        let window = SequenceWindow::sentinel(LEN + 1).unwrap();
        let err = model.predict(&window).await.unwrap_err();
        assert!(matches!(err, PosewatchError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_early_stopping() {
        let mut model = CentroidClassifier::new(LEN).unwrap();
        let data = toy_set();
        let config = TrainingConfig {
            epochs: 500,
            early_stopping_patience: Some(3),
            ..TrainingConfig::default()
        };
        let history = model.fit(&data, &data, &config).unwrap();
        assert!(history.stopped_early);
        assert!(history.epochs.len() < 500);
        assert!(history.best_epoch <= history.epochs.len());
    }

    #[test]
    fn test_fit_and_evaluate_reject_empty_sets() {
        let mut model = CentroidClassifier::new(LEN).unwrap();
        assert!(model.fit(&[], &[], &TrainingConfig::default()).is_err());
        assert!(matches!(
            model.evaluate(&[]).unwrap_err(),
            PosewatchError::Classifier { .. }
        ));
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let dir = std::env::temp_dir().join("posewatch_test_centroid_model");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("model.json");

        let model = trained();
        model.save(&path).unwrap();
        let loaded = CentroidClassifier::load(&path).unwrap();
        assert_eq!(loaded.window_len(), LEN);
        assert_eq!(loaded.temperature(), model.temperature());

        for x in [0.1, 0.3, 0.7, 0.9] {
            let window = example(x, Label::Normal).window;
            let a = loaded.predict(&window).await.unwrap();
            let b = model.predict(&window).await.unwrap();
            assert_eq!(a.predicted(), b.predicted());
            assert!((a.probability(Label::Normal) - b.probability(Label::Normal)).abs() < 1e-6);
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_rejects_corrupt_centroids() {
        let dir = std::env::temp_dir().join("posewatch_test_centroid_corrupt");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.json");

        let mut model = CentroidClassifier::new(LEN).unwrap();
        model.centroids[1].pop();
        std::fs::write(&path, serde_json::to_string(&model).unwrap()).unwrap();
        assert!(CentroidClassifier::load(&path).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
