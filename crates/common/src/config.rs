//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PosewatchError, PosewatchResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scratch directory for per-video frame artifacts.
    pub work_dir: PathBuf,

    /// Frame sampling and window shape shared by training and inference.
    pub pipeline: PipelineDefaults,

    /// Dataset assembly settings.
    pub dataset: DatasetDefaults,

    /// Live inference loop settings.
    pub live: LiveDefaults,

    /// External pose estimator invocation.
    pub estimator: Option<EstimatorCommand>,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Window shape and sampling rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineDefaults {
    /// Frames per window (`N`).
    pub window_len: usize,

    /// Frames per second requested from the frame extractor.
    pub sample_rate_hz: u32,
}

/// Dataset assembly defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetDefaults {
    /// Train/validation/test ratios. Must sum to 1.0.
    pub split: SplitDefaults,

    /// Minimum length of a trailing partial segment to keep.
    /// `None` means half the window length, rounded up.
    pub min_tail_frames: Option<usize>,

    /// File naming convention that encodes labels.
    pub label_convention: LabelConventionDefaults,

    /// Seed for the dataset shuffle. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

/// Partition ratios.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitDefaults {
    pub train: f64,
    pub validation: f64,
    pub test: f64,
}

/// Filename label convention, e.g. `video_clip_normal_01.mp4`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConventionDefaults {
    /// Token delimiter within the file stem.
    pub delimiter: char,

    /// Zero-based token position that carries the label.
    pub label_token: usize,

    /// Token value that marks the normal class. Anything else is anomalous.
    pub normal_token: String,

    /// Reject files whose bucket directory names a different label.
    pub check_bucket: bool,
}

/// Live loop defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveDefaults {
    /// Polling cadence in milliseconds.
    pub tick_ms: u64,

    /// Rolling window length used for live inference.
    pub window_len: usize,

    /// Probability of the anomalous class at or above which an alert fires.
    pub alert_threshold: f32,
}

/// Command line for an external pose estimator process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorCommand {
    /// Executable to run.
    pub program: String,

    /// Arguments placed before the frame path.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "posewatch_live=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            pipeline: PipelineDefaults::default(),
            dataset: DatasetDefaults::default(),
            live: LiveDefaults::default(),
            estimator: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PipelineDefaults {
    fn default() -> Self {
        Self {
            window_len: 30,
            sample_rate_hz: 3,
        }
    }
}

impl Default for DatasetDefaults {
    fn default() -> Self {
        Self {
            split: SplitDefaults::default(),
            min_tail_frames: None,
            label_convention: LabelConventionDefaults::default(),
            seed: None,
        }
    }
}

impl Default for SplitDefaults {
    fn default() -> Self {
        Self {
            train: 0.8,
            validation: 0.1,
            test: 0.1,
        }
    }
}

impl Default for LabelConventionDefaults {
    fn default() -> Self {
        Self {
            delimiter: '_',
            label_token: 2,
            normal_token: "normal".to_string(),
            check_bucket: true,
        }
    }
}

impl Default for LiveDefaults {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            window_len: 30,
            alert_threshold: 0.8,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Unlike [`AppConfig::load`], errors
    /// are returned instead of replaced with defaults.
    pub fn load_from(path: impl AsRef<Path>) -> PosewatchResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PosewatchError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }

    /// Check values that serde cannot reject on its own.
    pub fn validate(&self) -> PosewatchResult<()> {
        if self.pipeline.window_len == 0 {
            return Err(PosewatchError::config("pipeline.window_len must be > 0"));
        }
        if self.pipeline.sample_rate_hz == 0 {
            return Err(PosewatchError::config("pipeline.sample_rate_hz must be > 0"));
        }
        if self.live.window_len == 0 {
            return Err(PosewatchError::config("live.window_len must be > 0"));
        }
        if self.live.tick_ms == 0 {
            return Err(PosewatchError::config("live.tick_ms must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.live.alert_threshold) {
            return Err(PosewatchError::config(
                "live.alert_threshold must be within [0, 1]",
            ));
        }
        let split = self.dataset.split;
        let sum = split.train + split.validation + split.test;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(PosewatchError::config(format!(
                "dataset.split must sum to 1.0 (got {sum})"
            )));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("posewatch").join("config.json")
}

/// Default scratch directory.
fn default_work_dir() -> PathBuf {
    let base = std::env::var("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".cache")
        });
    base.join("posewatch").join("frames")
}
