//! Error types shared across Posewatch crates.
//!
//! Two conditions from the pipeline taxonomy are deliberately absent here:
//! an empty pose detection is recovered with the sentinel frame, and an
//! overlapping live tick is dropped and counted. Neither ever surfaces as an
//! error value.

use std::path::PathBuf;

/// Top-level error type for Posewatch operations.
#[derive(Debug, thiserror::Error)]
pub enum PosewatchError {
    /// A video or stream is missing, unreadable, or corrupt.
    #[error("Source unavailable ({source_id}): {message}")]
    SourceUnavailable { source_id: String, message: String },

    /// A video file name does not follow the labeled-video naming convention.
    #[error("Label convention violated by {name}: {message}")]
    LabelConvention { name: String, message: String },

    /// An assembled tensor does not match the declared shape.
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Dataset error: {message}")]
    Dataset { message: String },

    #[error("Classifier error: {message}")]
    Classifier { message: String },

    #[error("Pose estimator error: {message}")]
    Estimator { message: String },

    #[error("Live loop error: {message}")]
    Live { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using PosewatchError.
pub type PosewatchResult<T> = Result<T, PosewatchError>;

impl PosewatchError {
    pub fn source_unavailable(source_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_id: source_id.into(),
            message: msg.into(),
        }
    }

    pub fn label_convention(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::LabelConvention {
            name: name.into(),
            message: msg.into(),
        }
    }

    pub fn shape_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset {
            message: msg.into(),
        }
    }

    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier {
            message: msg.into(),
        }
    }

    pub fn estimator(msg: impl Into<String>) -> Self {
        Self::Estimator {
            message: msg.into(),
        }
    }

    pub fn live(msg: impl Into<String>) -> Self {
        Self::Live {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether this error should skip one item of a batch rather than abort it.
    ///
    /// Unreadable sources and naming violations are per-video problems; a
    /// shape mismatch is a pipeline bug and is always fatal.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. }
                | Self::LabelConvention { .. }
                | Self::Estimator { .. }
                | Self::FileNotFound { .. }
        )
    }
}
