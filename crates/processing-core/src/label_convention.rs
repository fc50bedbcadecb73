//! Labels from the video file naming convention.
//!
//! Files are named with delimiter-separated tokens, e.g.
//! `video_clip_normal_01.mp4`. One token position carries the class: the
//! normal token means [`Label::Normal`], anything else [`Label::Anomalous`].

use std::path::Path;

use posewatch_common::{LabelConventionDefaults, PosewatchError, PosewatchResult};
use posewatch_skeleton_model::Label;

/// Declared filename convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelConvention {
    /// Token delimiter within the file stem.
    pub delimiter: char,
    /// Zero-based token position holding the class.
    pub label_token: usize,
    /// Token value for the normal class, compared case-insensitively.
    pub normal_token: String,
    /// Reject files whose bucket directory names the other class.
    pub check_bucket: bool,
}

impl Default for LabelConvention {
    fn default() -> Self {
        Self::from(&LabelConventionDefaults::default())
    }
}

impl From<&LabelConventionDefaults> for LabelConvention {
    fn from(defaults: &LabelConventionDefaults) -> Self {
        Self {
            delimiter: defaults.delimiter,
            label_token: defaults.label_token,
            normal_token: defaults.normal_token.clone(),
            check_bucket: defaults.check_bucket,
        }
    }
}

impl LabelConvention {
    /// Label for a file name (extension optional).
    pub fn label_for_name(&self, file_name: &str) -> PosewatchResult<Label> {
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name);
        let token = stem.split(self.delimiter).nth(self.label_token).ok_or_else(|| {
            PosewatchError::label_convention(
                file_name,
                format!(
                    "expected a label token at position {} when split on '{}'",
                    self.label_token, self.delimiter
                ),
            )
        })?;
        if token.trim().is_empty() {
            return Err(PosewatchError::label_convention(
                file_name,
                format!("label token at position {} is empty", self.label_token),
            ));
        }
        if token.eq_ignore_ascii_case(&self.normal_token) {
            Ok(Label::Normal)
        } else {
            Ok(Label::Anomalous)
        }
    }

    /// Label for a video path, cross-checked against its bucket directory
    /// when that directory names a class.
    pub fn label_for_path(&self, path: &Path) -> PosewatchResult<Label> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PosewatchError::label_convention(path.display().to_string(), "file name is not valid UTF-8"))?;
        let label = self.label_for_name(name)?;

        if self.check_bucket {
            let bucket = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .and_then(Label::from_bucket_name);
            if let Some(bucket_label) = bucket.filter(|b| *b != label) {
                return Err(PosewatchError::label_convention(
                    path.display().to_string(),
                    format!("file name says {label} but bucket directory says {bucket_label}"),
                ));
            }
        }
        Ok(label)
    }
}
