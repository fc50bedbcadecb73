//! Extracted frames.

use std::path::PathBuf;

/// Where a frame's pixels live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameImage {
    /// An image file on disk, owned by the frame's namespace directory.
    File(PathBuf),
    /// An encoded image held in memory (e.g. JPEG bytes).
    Encoded(Vec<u8>),
}

/// One sampled image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Position in the sampled sequence, starting at 0.
    pub index: u64,
    /// Width in pixels, or 0 when unknown.
    pub width: u32,
    /// Height in pixels, or 0 when unknown.
    pub height: u32,
    pub image: FrameImage,
}

impl Frame {
    pub fn from_file(index: u64, width: u32, height: u32, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            width,
            height,
            image: FrameImage::File(path.into()),
        }
    }

    pub fn from_bytes(index: u64, width: u32, height: u32, bytes: Vec<u8>) -> Self {
        Self {
            index,
            width,
            height,
            image: FrameImage::Encoded(bytes),
        }
    }

    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}
