//! The dataset assembler.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use posewatch_capture::{FrameSource, PoseEstimator};
use posewatch_common::{AppConfig, PosewatchError, PosewatchResult, RunClock};
use posewatch_processing_core::{
    default_min_tail, fisher_yates_shuffle, partition, segment_frames, KeypointNormalizer,
    LabelConvention, MirrorAugmenter, NormalizeOutcome, SplitRatios,
};
use posewatch_skeleton_model::{ClassBalance, Dataset, FrameKeypoints, Label, LabeledExample};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cache::KeypointCache;
use crate::report::{AssemblyReport, SkippedVideo};

/// Settings for one assembly run.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Frames per window.
    pub window_len: usize,

    /// Frames per second requested from the frame source.
    pub sample_rate_hz: u32,

    /// Minimum trailing segment length; `None` means half the window.
    pub min_tail: Option<usize>,

    /// Train/validation/test ratios.
    pub ratios: SplitRatios,

    /// Filename label convention.
    pub convention: LabelConvention,

    /// Shuffle seed; `None` draws from OS entropy.
    pub seed: Option<u64>,

    /// Add a mirrored copy of every window.
    pub mirror: bool,

    /// Parent of the per-video artifact namespaces.
    pub work_dir: PathBuf,

    /// Keypoint cache location, if caching is enabled.
    pub cache_dir: Option<PathBuf>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        let defaults = AppConfig::default();
        Self {
            window_len: defaults.pipeline.window_len,
            sample_rate_hz: defaults.pipeline.sample_rate_hz,
            min_tail: None,
            ratios: SplitRatios::default(),
            convention: LabelConvention::default(),
            seed: None,
            mirror: true,
            work_dir: defaults.work_dir,
            cache_dir: None,
        }
    }
}

impl AssemblerConfig {
    pub fn from_app_config(config: &AppConfig) -> PosewatchResult<Self> {
        Ok(Self {
            window_len: config.pipeline.window_len,
            sample_rate_hz: config.pipeline.sample_rate_hz,
            min_tail: config.dataset.min_tail_frames,
            ratios: SplitRatios::try_from(&config.dataset.split)?,
            convention: LabelConvention::from(&config.dataset.label_convention),
            seed: config.dataset.seed,
            mirror: true,
            work_dir: config.work_dir.clone(),
            cache_dir: None,
        })
    }

    fn min_tail(&self) -> usize {
        self.min_tail.unwrap_or_else(|| default_min_tail(self.window_len))
    }
}

/// A video found under a label bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEntry {
    pub path: PathBuf,
    /// Name of the bucket directory the video lives in.
    pub bucket: String,
}

/// Result of [`DatasetAssembler::assemble`].
#[derive(Debug, Clone)]
pub struct AssembledDataset {
    pub dataset: Dataset,
    pub report: AssemblyReport,
}

/// Keypoints for one video plus frame diagnostics.
struct VideoKeypoints {
    frames: Vec<FrameKeypoints>,
    empty: usize,
    malformed: usize,
    cache_hit: bool,
}

/// Turns a labeled video collection into a partitioned dataset.
///
/// Each call to [`DatasetAssembler::assemble`] builds its own example pool
/// and returns it; the assembler keeps no state between runs.
pub struct DatasetAssembler {
    config: AssemblerConfig,
    source: Arc<dyn FrameSource>,
    estimator: Arc<dyn PoseEstimator>,
    normalizer: KeypointNormalizer,
    mirror: MirrorAugmenter,
    cache: Option<KeypointCache>,
}

impl DatasetAssembler {
    pub fn new(
        config: AssemblerConfig,
        source: Arc<dyn FrameSource>,
        estimator: Arc<dyn PoseEstimator>,
    ) -> Self {
        let cache = config.cache_dir.clone().map(KeypointCache::new);
        Self {
            config,
            source,
            estimator,
            normalizer: KeypointNormalizer::with_defaults(),
            mirror: MirrorAugmenter::new(),
            cache,
        }
    }

    pub fn with_normalizer(mut self, normalizer: KeypointNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Videos under `root`, one level of bucket directories deep, in sorted
    /// order. Hidden entries are skipped.
    pub fn discover(&self, root: &Path) -> PosewatchResult<Vec<VideoEntry>> {
        if !root.is_dir() {
            return Err(PosewatchError::source_unavailable(
                root.display().to_string(),
                "video collection root is not a directory",
            ));
        }

        let mut videos = Vec::new();
        for bucket_dir in sorted_entries(root)? {
            if !bucket_dir.is_dir() {
                tracing::debug!(path = %bucket_dir.display(), "Ignoring file outside a label bucket");
                continue;
            }
            let bucket = file_name(&bucket_dir);
            for path in sorted_entries(&bucket_dir)? {
                if path.is_file() {
                    videos.push(VideoEntry {
                        path,
                        bucket: bucket.clone(),
                    });
                }
            }
        }
        Ok(videos)
    }

    /// Assemble the dataset for the collection at `root`.
    pub async fn assemble(&self, root: &Path) -> PosewatchResult<AssembledDataset> {
        let clock = RunClock::start();
        let videos = self.discover(root)?;
        tracing::info!(
            root = %root.display(),
            videos = videos.len(),
            run_id = clock.run_id(),
            window_len = self.config.window_len,
            sample_rate_hz = self.config.sample_rate_hz,
            "Assembling dataset"
        );

        let mut report = AssemblyReport::default();
        let mut pool: Vec<LabeledExample> = Vec::new();
        let min_tail = self.config.min_tail();

        for (index, video) in videos.iter().enumerate() {
            let label = match self.config.convention.label_for_path(&video.path) {
                Ok(label) => label,
                Err(e) => {
                    skip(&mut report, video, &e);
                    continue;
                }
            };

            let keypoints = match self.keypoints_for(&clock, index, video).await {
                Ok(keypoints) => keypoints,
                Err(e) if e.is_skippable() => {
                    skip(&mut report, video, &e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let windows = segment_frames(&keypoints.frames, self.config.window_len, min_tail)?;
            tracing::debug!(
                video = %video.path.display(),
                label = %label,
                frames = keypoints.frames.len(),
                windows = windows.len(),
                cache_hit = keypoints.cache_hit,
                "Video processed"
            );

            report.videos_processed += 1;
            report.windows += windows.len();
            report.empty_frames += keypoints.empty;
            report.malformed_frames += keypoints.malformed;
            report.cache_hits += usize::from(keypoints.cache_hit);
            pool.extend(windows.into_iter().map(|w| LabeledExample::new(w, label)));
        }

        if report.videos_processed == 0 {
            return Err(PosewatchError::dataset(format!(
                "no valid videos under {} ({} skipped)",
                root.display(),
                report.skipped.len()
            )));
        }

        if self.config.mirror {
            pool = self.mirror.augment(pool);
        }

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        fisher_yates_shuffle(&mut pool, &mut rng);

        report.examples = pool.len();
        report.balance = ClassBalance::from_labels(pool.iter().map(|e| e.label));
        let split = partition(pool, &self.config.ratios).into_split();
        report.partition = [split.train.len(), split.validation.len(), split.test.len()];

        log_balance(&report);
        tracing::info!(
            videos_processed = report.videos_processed,
            skipped = report.skipped.len(),
            examples = report.examples,
            train = report.partition[0],
            validation = report.partition[1],
            test = report.partition[2],
            elapsed_secs = clock.elapsed_secs(),
            "Dataset assembled"
        );

        let dataset = Dataset::new(
            self.config.window_len,
            self.config.sample_rate_hz,
            self.config.ratios.as_array(),
            split,
        );
        Ok(AssembledDataset { dataset, report })
    }

    async fn keypoints_for(
        &self,
        clock: &RunClock,
        index: usize,
        video: &VideoEntry,
    ) -> PosewatchResult<VideoKeypoints> {
        if let Some(frames) = self
            .cache
            .as_ref()
            .and_then(|c| c.load(&video.bucket, &video.path, self.config.sample_rate_hz))
        {
            let empty = frames.iter().filter(|f| f.is_sentinel()).count();
            return Ok(VideoKeypoints {
                frames,
                empty,
                malformed: 0,
                cache_hit: true,
            });
        }

        let stem = video
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let artifact_dir = self.config.work_dir.join(clock.namespace(index, &stem));

        let result = self.extract_and_estimate(video, &artifact_dir).await;
        remove_artifacts(&artifact_dir).await;
        let keypoints = result?;

        // Only clean extractions are cached; a transient estimator failure
        // must not be replayed on the next run.
        if keypoints.malformed > 0 {
            tracing::debug!(
                video = %video.path.display(),
                malformed = keypoints.malformed,
                "Not caching keypoints with malformed frames"
            );
        } else if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(
                &video.bucket,
                &video.path,
                self.config.sample_rate_hz,
                &keypoints.frames,
            ) {
                tracing::warn!(video = %video.path.display(), error = %e, "Failed to write keypoint cache");
            }
        }
        Ok(keypoints)
    }

    async fn extract_and_estimate(
        &self,
        video: &VideoEntry,
        artifact_dir: &Path,
    ) -> PosewatchResult<VideoKeypoints> {
        let frames = self
            .source
            .extract(&video.path, self.config.sample_rate_hz, artifact_dir)
            .await?;

        let mut keypoints = VideoKeypoints {
            frames: Vec::with_capacity(frames.len()),
            empty: 0,
            malformed: 0,
            cache_hit: false,
        };
        let mut failed = 0;
        let mut last_error = None;
        for frame in &frames {
            let normalized = match self.estimator.estimate(frame).await {
                Ok(detection) => self.normalizer.normalize(&detection),
                Err(e) => {
                    tracing::warn!(
                        video = %video.path.display(),
                        frame = frame.index,
                        estimator = self.estimator.name(),
                        error = %e,
                        "Pose estimation failed, using sentinel frame"
                    );
                    failed += 1;
                    last_error = Some(e);
                    keypoints.malformed += 1;
                    keypoints.frames.push(FrameKeypoints::sentinel());
                    continue;
                }
            };
            match normalized.outcome {
                NormalizeOutcome::Empty => keypoints.empty += 1,
                NormalizeOutcome::Malformed(_) => keypoints.malformed += 1,
                NormalizeOutcome::Detected { .. } => {}
            }
            keypoints.frames.push(normalized.frame);
        }

        if failed > 0 && failed == frames.len() {
            let cause = last_error.map(|e| e.to_string()).unwrap_or_default();
            return Err(PosewatchError::estimator(format!(
                "pose estimation failed on all {failed} frames: {cause}"
            )));
        }
        Ok(keypoints)
    }
}

fn skip(report: &mut AssemblyReport, video: &VideoEntry, error: &PosewatchError) {
    tracing::warn!(video = %video.path.display(), error = %error, "Skipping video");
    report.skipped.push(SkippedVideo {
        path: video.path.clone(),
        reason: error.to_string(),
    });
}

fn log_balance(report: &AssemblyReport) {
    for label in Label::ALL {
        tracing::info!(
            label = %label,
            count = report.balance.count(label),
            fraction = report.balance.fraction(label),
            "Class balance"
        );
    }
    if report.balance.count(Label::Normal) == 0 || report.balance.count(Label::Anomalous) == 0 {
        tracing::warn!(balance = %report.balance, "Dataset contains a single class");
    }
}

async fn remove_artifacts(dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "Failed to remove frame artifacts");
        }
    }
}

fn sorted_entries(dir: &Path) -> PosewatchResult<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !file_name(&path).starts_with('.') {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
