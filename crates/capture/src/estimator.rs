//! Pose estimators.
//!
//! The estimator is an opaque capability: one frame in, zero or more poses
//! out. [`CommandPoseEstimator`] runs any external program that honors the
//! JSON contract below, so a model can be swapped without touching the
//! pipeline.
//!
//! The program receives the frame path as its last argument, or `-` with
//! the encoded image on stdin for in-memory frames. It prints either a full
//! detection object or a bare pose array:
//!
//! ```json
//! {"space": "pixel", "poses": [{"score": 0.93, "keypoints": [{"name": "nose", "x": 312.0, "y": 88.5, "score": 0.97}]}]}
//! ```

use std::process::Stdio;
use std::time::Duration;

use posewatch_common::{EstimatorCommand, PosewatchError, PosewatchResult};
use posewatch_skeleton_model::{DetectedPose, KeypointSpace, PoseDetection};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use crate::frame::{Frame, FrameImage};
use crate::tools::stderr_tail;

/// Image to poses.
#[async_trait::async_trait]
pub trait PoseEstimator: Send + Sync {
    /// Detect poses in one frame. An empty `poses` list is a valid result.
    async fn estimate(&self, frame: &Frame) -> PosewatchResult<PoseDetection>;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

/// Pose estimation by an external process.
#[derive(Debug, Clone)]
pub struct CommandPoseEstimator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandPoseEstimator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(command: &EstimatorCommand) -> Self {
        Self::new(command.program.clone(), command.args.clone())
    }

    /// Parse a shell-like command line, splitting on whitespace.
    pub fn from_command_line(line: &str) -> PosewatchResult<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| PosewatchError::config("estimator command is empty"))?;
        Ok(Self::new(program, parts.collect()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, frame: &Frame) -> PosewatchResult<Vec<u8>> {
        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let stdin_bytes = match &frame.image {
            FrameImage::File(path) => {
                command.arg(path).stdin(Stdio::null());
                None
            }
            FrameImage::Encoded(bytes) => {
                command.arg("-").stdin(Stdio::piped());
                Some(bytes)
            }
        };

        let mut child = command
            .spawn()
            .map_err(|e| PosewatchError::estimator(format!("failed to start {}: {e}", self.program)))?;

        // The write and the wait share one deadline: a program that never
        // drains stdin would otherwise block the write forever.
        let stdin = child.stdin.take();
        let write = async move {
            match (stdin_bytes, stdin) {
                (Some(bytes), Some(mut stdin)) => stdin.write_all(bytes).await,
                _ => Ok(()),
            }
        };
        let (written, output) = tokio::time::timeout(self.timeout, async {
            tokio::join!(write, child.wait_with_output())
        })
        .await
        .map_err(|_| PosewatchError::estimator(format!("{} timed out after {:?}", self.program, self.timeout)))?;
        let output = output?;

        // A program may exit without reading its whole input; the exit
        // status decides in that case.
        match written {
            Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                return Err(PosewatchError::estimator(format!(
                    "failed to write frame to {}: {e}",
                    self.program
                )));
            }
            _ => {}
        }

        if !output.status.success() {
            return Err(PosewatchError::estimator(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr_tail(&output.stderr, 3)
            )));
        }
        Ok(output.stdout)
    }
}

#[async_trait::async_trait]
impl PoseEstimator for CommandPoseEstimator {
    async fn estimate(&self, frame: &Frame) -> PosewatchResult<PoseDetection> {
        let stdout = self.run(frame).await?;
        parse_estimator_output(&stdout, frame.width, frame.height)
    }

    fn name(&self) -> &str {
        &self.program
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EstimatorOutput {
    Detection {
        #[serde(default)]
        frame_width: Option<u32>,
        #[serde(default)]
        frame_height: Option<u32>,
        #[serde(default)]
        space: KeypointSpace,
        poses: Vec<DetectedPose>,
    },
    Poses(Vec<DetectedPose>),
}

/// Parse estimator stdout. Frame dimensions reported by the estimator take
/// precedence over the frame's own.
pub fn parse_estimator_output(stdout: &[u8], width: u32, height: u32) -> PosewatchResult<PoseDetection> {
    let output: EstimatorOutput = serde_json::from_slice(stdout)
        .map_err(|e| PosewatchError::estimator(format!("unparseable estimator output: {e}")))?;
    Ok(match output {
        EstimatorOutput::Detection {
            frame_width,
            frame_height,
            space,
            poses,
        } => PoseDetection {
            frame_width: frame_width.unwrap_or(width),
            frame_height: frame_height.unwrap_or(height),
            space,
            poses,
        },
        EstimatorOutput::Poses(poses) => PoseDetection {
            frame_width: width,
            frame_height: height,
            space: KeypointSpace::Pixel,
            poses,
        },
    })
}
