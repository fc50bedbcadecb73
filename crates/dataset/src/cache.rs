//! On-disk keypoint cache.
//!
//! Stores each video's normalized frames as a keypoint JSONL stream at
//! `{root}/{bucket}/{stem}.jsonl`, so re-assembling with different window or
//! split settings skips frame extraction and pose estimation.

use std::path::{Path, PathBuf};

use posewatch_common::PosewatchResult;
use posewatch_skeleton_model::{
    parse_keypoint_stream, serialize_keypoint_stream, FrameKeypoints, KeypointStreamHeader,
};

#[derive(Debug, Clone)]
pub struct KeypointCache {
    root: PathBuf,
}

impl KeypointCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache file for a video in a bucket.
    pub fn entry_path(&self, bucket: &str, video: &Path) -> PathBuf {
        let stem = video
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        self.root.join(bucket).join(format!("{stem}.jsonl"))
    }

    /// Cached frames, if present and sampled at `sample_rate_hz`.
    ///
    /// Unreadable or stale entries are treated as misses.
    pub fn load(&self, bucket: &str, video: &Path, sample_rate_hz: u32) -> Option<Vec<FrameKeypoints>> {
        let path = self.entry_path(bucket, video);
        let content = std::fs::read_to_string(&path).ok()?;
        match parse_keypoint_stream(&content) {
            Ok(stream) => match stream.header {
                Some(header) if header.sample_rate_hz == sample_rate_hz => Some(stream.frames),
                _ => {
                    tracing::debug!(path = %path.display(), "Ignoring cache entry with different sample rate");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring corrupt cache entry");
                None
            }
        }
    }

    pub fn store(
        &self,
        bucket: &str,
        video: &Path,
        sample_rate_hz: u32,
        frames: &[FrameKeypoints],
    ) -> PosewatchResult<()> {
        let path = self.entry_path(bucket, video);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let header = KeypointStreamHeader::new(video.display().to_string(), sample_rate_hz);
        std::fs::write(&path, serialize_keypoint_stream(&header, frames)?)?;
        Ok(())
    }
}
