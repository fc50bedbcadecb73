//! Offline frame sources.

use std::path::{Path, PathBuf};

use posewatch_common::{PosewatchError, PosewatchResult};

use crate::frame::Frame;
use crate::tools::{probe_dimensions, stderr_tail};

/// Produces an ordered sequence of frames from a recorded video.
///
/// A missing or unreadable video is a [`PosewatchError::SourceUnavailable`],
/// never an empty result.
#[async_trait::async_trait]
pub trait FrameSource: Send + Sync {
    /// Sample `video` at `sample_rate_hz`, writing any intermediate artifacts
    /// under `artifact_dir`. The caller owns `artifact_dir` and removes it.
    async fn extract(
        &self,
        video: &Path,
        sample_rate_hz: u32,
        artifact_dir: &Path,
    ) -> PosewatchResult<Vec<Frame>>;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

/// Frame extraction via the `ffmpeg` and `ffprobe` command-line tools.
#[derive(Debug, Clone)]
pub struct FfmpegFrameExtractor {
    ffmpeg: String,
    ffprobe: String,
    /// JPEG quality scale passed as `-qscale:v` (2 is near-lossless).
    quality: u32,
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
            quality: 2,
        }
    }
}

impl FfmpegFrameExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use explicit binaries instead of resolving them on `PATH`.
    pub fn with_binaries(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            ..Self::default()
        }
    }

    /// The ffmpeg argument list for one extraction.
    pub fn ffmpeg_args(&self, video: &Path, sample_rate_hz: u32, artifact_dir: &Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            video.display().to_string(),
            "-vf".to_string(),
            format!("fps={sample_rate_hz}"),
            "-qscale:v".to_string(),
            self.quality.to_string(),
            artifact_dir.join("frame-%05d.jpg").display().to_string(),
        ]
    }
}

#[async_trait::async_trait]
impl FrameSource for FfmpegFrameExtractor {
    async fn extract(
        &self,
        video: &Path,
        sample_rate_hz: u32,
        artifact_dir: &Path,
    ) -> PosewatchResult<Vec<Frame>> {
        let source_id = video.display().to_string();
        if !video.is_file() {
            return Err(PosewatchError::source_unavailable(source_id, "video file does not exist"));
        }
        if sample_rate_hz == 0 {
            return Err(PosewatchError::config("sample rate must be at least 1 Hz"));
        }

        let (width, height) = probe_dimensions(&self.ffprobe, video)
            .await
            .ok_or_else(|| PosewatchError::source_unavailable(&source_id, "ffprobe found no video stream"))?;

        tokio::fs::create_dir_all(artifact_dir).await?;

        let args = self.ffmpeg_args(video, sample_rate_hz, artifact_dir);
        tracing::debug!(video = %source_id, args = ?args, "Running ffmpeg frame extraction");
        let output = tokio::process::Command::new(&self.ffmpeg)
            .args(&args)
            .output()
            .await
            .map_err(|e| PosewatchError::source_unavailable(&source_id, format!("failed to start ffmpeg: {e}")))?;

        if !output.status.success() {
            return Err(PosewatchError::source_unavailable(
                source_id,
                format!("ffmpeg exited with {}: {}", output.status, stderr_tail(&output.stderr, 3)),
            ));
        }

        let paths = list_frames(artifact_dir).await?;
        tracing::debug!(
            video = %source_id,
            frames = paths.len(),
            width,
            height,
            "Frames extracted"
        );
        Ok(paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| Frame::from_file(i as u64, width, height, path))
            .collect())
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Extracted frame files in `dir`, in frame order.
pub async fn list_frames(dir: &Path) -> PosewatchResult<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut frames = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_frame = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("frame-") && n.ends_with(".jpg"));
        if is_frame {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffmpeg_args() {
        let extractor = FfmpegFrameExtractor::new();
        let args = extractor.ffmpeg_args(Path::new("in/video.mp4"), 3, Path::new("work/run-0001-video"));
        let joined = args.join(" ");
        assert!(joined.contains("-i in/video.mp4"));
        assert!(joined.contains("-vf fps=3"));
        assert!(joined.contains("-qscale:v 2"));
        assert!(joined.ends_with("work/run-0001-video/frame-%05d.jpg"));
    }

    #[tokio::test]
    async fn test_missing_video_is_source_unavailable() {
        let extractor = FfmpegFrameExtractor::new();
        let err = extractor
            .extract(Path::new("/nonexistent/clip.mp4"), 3, &std::env::temp_dir())
            .await
            .unwrap_err();
        assert!(matches!(err, PosewatchError::SourceUnavailable { .. }));
        assert!(err.is_skippable());
    }

    #[tokio::test]
    async fn test_list_frames_sorted_and_filtered() {
        let dir = std::env::temp_dir().join("posewatch_test_list_frames");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        for name in ["frame-00002.jpg", "frame-00001.jpg", "notes.txt", "frame-00010.jpg"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }

        let frames = list_frames(&dir).await.unwrap();
        let names: Vec<_> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["frame-00001.jpg", "frame-00002.jpg", "frame-00010.jpg"]);

        std::fs::remove_dir_all(&dir).ok();
    }
}
