//! Live frame sources.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::SystemTime;

use posewatch_common::{PosewatchError, PosewatchResult};

use crate::frame::Frame;
use crate::tools::probe_dimensions;

/// Result of sampling a live source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameSample {
    /// The source has not buffered enough data yet.
    NotReady,
    /// The current frame.
    Ready(Frame),
}

/// A stream that yields its current frame on demand.
#[async_trait::async_trait]
pub trait LiveFrameSource: Send + Sync {
    /// Check that the source can be read at all. Called once before the
    /// live loop starts; an error prevents the loop from starting.
    async fn probe(&self) -> PosewatchResult<()>;

    /// Sample the current frame.
    async fn sample(&self) -> PosewatchResult<FrameSample>;

    /// Identifier for logs and errors.
    fn id(&self) -> &str;
}

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Reads the newest image in a directory that an external capture process
/// keeps overwriting, e.g. `ffmpeg -i <stream> -update 1 dir/latest.jpg`.
#[derive(Debug)]
pub struct LatestFrameFile {
    dir: PathBuf,
    id: String,
    ffprobe: String,
    dimensions: Mutex<Option<(u32, u32)>>,
    next_index: AtomicU64,
}

impl LatestFrameFile {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            id: dir.display().to_string(),
            dir,
            ffprobe: "ffprobe".to_string(),
            dimensions: Mutex::new(None),
            next_index: AtomicU64::new(0),
        }
    }

    /// Fix the frame size instead of probing the first image with ffprobe.
    pub fn with_dimensions(self, width: u32, height: u32) -> Self {
        if let Ok(mut dims) = self.dimensions.lock() {
            *dims = Some((width, height));
        }
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Most recently modified non-empty image in the directory.
    async fn newest_image(&self) -> PosewatchResult<Option<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| PosewatchError::source_unavailable(&self.id, e.to_string()))?;
        let mut newest: Option<(SystemTime, PathBuf)> = None;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
            if !is_image {
                continue;
            }
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if meta.len() == 0 {
                continue;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
                newest = Some((modified, path));
            }
        }
        Ok(newest.map(|(_, path)| path))
    }

    async fn dimensions_for(&self, path: &Path) -> (u32, u32) {
        let cached = self.dimensions.lock().ok().and_then(|d| *d);
        if let Some(dims) = cached {
            return dims;
        }
        match probe_dimensions(&self.ffprobe, path).await {
            Some(dims) => {
                if let Ok(mut cached) = self.dimensions.lock() {
                    *cached = Some(dims);
                }
                dims
            }
            None => {
                tracing::debug!(path = %path.display(), "Could not probe frame size");
                (0, 0)
            }
        }
    }
}

#[async_trait::async_trait]
impl LiveFrameSource for LatestFrameFile {
    async fn probe(&self) -> PosewatchResult<()> {
        match tokio::fs::metadata(&self.dir).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(PosewatchError::source_unavailable(&self.id, "not a directory")),
            Err(e) => Err(PosewatchError::source_unavailable(&self.id, e.to_string())),
        }
    }

    async fn sample(&self) -> PosewatchResult<FrameSample> {
        let Some(path) = self.newest_image().await? else {
            return Ok(FrameSample::NotReady);
        };
        // Read the bytes now: the writer may replace the file at any moment.
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => return Ok(FrameSample::NotReady),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(FrameSample::NotReady),
            Err(e) => return Err(e.into()),
        };
        let (width, height) = self.dimensions_for(&path).await;
        let index = self.next_index.fetch_add(1, Ordering::Relaxed);
        Ok(FrameSample::Ready(Frame::from_bytes(index, width, height, bytes)))
    }

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameImage;

    #[tokio::test]
    async fn test_missing_directory_fails_probe() {
        let source = LatestFrameFile::new("/nonexistent/posewatch/live");
        let err = source.probe().await.unwrap_err();
        assert!(matches!(err, PosewatchError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_not_ready_until_image_written() {
        let dir = std::env::temp_dir().join("posewatch_test_latest_frame");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let source = LatestFrameFile::new(&dir).with_dimensions(640, 480);
        source.probe().await.unwrap();
        assert_eq!(source.sample().await.unwrap(), FrameSample::NotReady);

        std::fs::write(dir.join("latest.jpg"), b"").unwrap();
        std::fs::write(dir.join("notes.txt"), b"ignored").unwrap();
        assert_eq!(source.sample().await.unwrap(), FrameSample::NotReady);

        std::fs::write(dir.join("latest.jpg"), b"jpeg-bytes").unwrap();
        match source.sample().await.unwrap() {
            FrameSample::Ready(frame) => {
                assert_eq!(frame.index, 0);
                assert_eq!((frame.width, frame.height), (640, 480));
                assert_eq!(frame.image, FrameImage::Encoded(b"jpeg-bytes".to_vec()));
            }
            FrameSample::NotReady => panic!("expected a ready frame"),
        }
        match source.sample().await.unwrap() {
            FrameSample::Ready(frame) => assert_eq!(frame.index, 1),
            FrameSample::NotReady => panic!("expected a ready frame"),
        }

        std::fs::remove_dir_all(&dir).ok();
    }
}
