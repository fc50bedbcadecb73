//! Assembly diagnostics.

use std::fmt;
use std::path::PathBuf;

use posewatch_skeleton_model::ClassBalance;
use serde::Serialize;

/// A video left out of the dataset, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedVideo {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of one assembly run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssemblyReport {
    /// Videos that contributed windows.
    pub videos_processed: usize,
    /// Videos skipped because they were unreadable or misnamed.
    pub skipped: Vec<SkippedVideo>,
    /// Windows cut from processed videos, before augmentation.
    pub windows: usize,
    /// Examples in the final pool, including mirrored ones.
    pub examples: usize,
    /// Class counts over the final pool.
    pub balance: ClassBalance,
    /// Frames in which no pose was detected.
    pub empty_frames: usize,
    /// Frames whose detection was unusable or failed.
    pub malformed_frames: usize,
    /// Videos whose keypoints came from the cache.
    pub cache_hits: usize,
    /// Train, validation and test sizes.
    pub partition: [usize; 3],
}

impl fmt::Display for AssemblyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Videos processed: {}", self.videos_processed)?;
        writeln!(f, "Videos skipped:   {}", self.skipped.len())?;
        for skipped in &self.skipped {
            writeln!(f, "  - {}: {}", skipped.path.display(), skipped.reason)?;
        }
        writeln!(f, "Windows:          {}", self.windows)?;
        writeln!(f, "Examples:         {}", self.examples)?;
        writeln!(f, "Class balance:    {}", self.balance)?;
        writeln!(
            f,
            "Frames:           {} empty, {} malformed",
            self.empty_frames, self.malformed_frames
        )?;
        writeln!(f, "Cache hits:       {}", self.cache_hits)?;
        write!(
            f,
            "Partition:        train={} validation={} test={}",
            self.partition[0], self.partition[1], self.partition[2]
        )
    }
}
