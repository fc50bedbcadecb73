//! Labeled examples, partitions, and the dataset file.

use std::path::Path;

use posewatch_common::{PosewatchError, PosewatchResult};
use serde::{Deserialize, Serialize};

use crate::label::{ClassBalance, Label};
use crate::window::SequenceWindow;

/// Current dataset file schema version.
pub const DATASET_VERSION: &str = "1.0";

/// One training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub window: SequenceWindow,
    pub label: Label,
}

impl LabeledExample {
    pub fn new(window: SequenceWindow, label: Label) -> Self {
        Self { window, label }
    }

    /// A new example with a transformed window and the same label.
    pub fn map_window(&self, f: impl FnOnce(&SequenceWindow) -> SequenceWindow) -> Self {
        Self {
            window: f(&self.window),
            label: self.label,
        }
    }
}

/// Train/validation/test partition of a shuffled example pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetSplit {
    pub train: Vec<LabeledExample>,
    pub validation: Vec<LabeledExample>,
    pub test: Vec<LabeledExample>,
}

impl DatasetSplit {
    pub fn len(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All examples, train first, then validation, then test.
    pub fn all(&self) -> impl Iterator<Item = &LabeledExample> {
        self.train
            .iter()
            .chain(self.validation.iter())
            .chain(self.test.iter())
    }

    pub fn balance(&self) -> ClassBalance {
        ClassBalance::from_labels(self.all().map(|e| e.label))
    }
}

/// Assembled dataset as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Schema version.
    pub version: String,

    /// Creation timestamp (RFC 3339).
    pub created_at: String,

    /// Frames per window. Every example's window has exactly this length.
    pub window_len: usize,

    /// Frame sampling rate used during extraction.
    pub sample_rate_hz: u32,

    /// Train/validation/test ratios used for the partition.
    pub ratios: [f64; 3],

    /// The partitioned examples.
    pub split: DatasetSplit,

    /// Class counts over all partitions.
    pub balance: ClassBalance,
}

impl Dataset {
    pub fn new(window_len: usize, sample_rate_hz: u32, ratios: [f64; 3], split: DatasetSplit) -> Self {
        let balance = split.balance();
        Self {
            version: DATASET_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            window_len,
            sample_rate_hz,
            ratios,
            split,
            balance,
        }
    }

    pub fn len(&self) -> usize {
        self.split.len()
    }

    pub fn is_empty(&self) -> bool {
        self.split.is_empty()
    }

    /// Check that every window has the declared length and the stored
    /// balance matches the examples.
    pub fn validate(&self) -> PosewatchResult<()> {
        if self.window_len == 0 {
            return Err(PosewatchError::dataset("window_len must be at least 1"));
        }
        if let Some(bad) = self.split.all().find(|e| e.window.len() != self.window_len) {
            return Err(PosewatchError::shape_mismatch(
                format!("window of {} frames", self.window_len),
                format!("window of {} frames", bad.window.len()),
            ));
        }
        if self.balance != self.split.balance() {
            return Err(PosewatchError::dataset(format!(
                "stored class balance ({}) does not match examples ({})",
                self.balance,
                self.split.balance()
            )));
        }
        Ok(())
    }

    /// Write the dataset as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> PosewatchResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), examples = self.len(), "Dataset saved");
        Ok(())
    }

    /// Load and validate a dataset file.
    pub fn load(path: impl AsRef<Path>) -> PosewatchResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PosewatchError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let json = std::fs::read_to_string(path)?;
        let dataset: Dataset = serde_json::from_str(&json)?;
        dataset.validate()?;
        Ok(dataset)
    }
}
