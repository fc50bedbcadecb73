//! Alert events.

use std::fmt;

use posewatch_classifier::ClassProbabilities;
use posewatch_skeleton_model::Label;
use serde::Serialize;

/// Emitted when the watched class reaches the alert threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    /// Nanoseconds since the loop started.
    pub at_ns: u64,
    /// Wall-clock time (RFC 3339).
    pub wall_time: String,
    /// Class that crossed the threshold.
    pub label: Label,
    /// Its probability.
    pub probability: f32,
    /// Full probability vector of the prediction.
    pub probabilities: ClassProbabilities,
    /// Frames pushed into the rolling window so far.
    pub frames_seen: u64,
}

impl fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} p={:.3} after {} frames",
            self.wall_time, self.label, self.probability, self.frames_seen
        )
    }
}
