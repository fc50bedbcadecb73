//! Run clock and artifact namespaces.
//!
//! Every assembly run and live session is anchored to a monotonic epoch
//! captured at start. The clock also hands out a run identifier that is
//! embedded in intermediate artifact names so that two runs, or two videos
//! within one run, never write to the same frame files.

use std::time::Instant;

/// A run clock that provides monotonic timestamps relative to a fixed epoch.
#[derive(Debug, Clone)]
pub struct RunClock {
    /// The instant the run started.
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,

    /// Identifier unique to this run.
    run_id: String,
}

impl RunClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        let now = chrono::Utc::now();
        Self {
            epoch: Instant::now(),
            epoch_wall: now.to_rfc3339(),
            run_id: format!("{}-{}", now.format("%Y%m%dT%H%M%S%3f"), std::process::id()),
        }
    }

    /// Get nanoseconds elapsed since the run started.
    pub fn elapsed_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Get seconds elapsed since the run started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at run start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Current wall-clock time as an RFC 3339 string.
    pub fn wall_now(&self) -> String {
        chrono::Utc::now().to_rfc3339()
    }

    /// Identifier unique to this run.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Artifact namespace for one item of this run.
    ///
    /// The result only contains `[A-Za-z0-9_-]` so it is safe as a file or
    /// directory name.
    pub fn namespace(&self, index: usize, label: &str) -> String {
        let label: String = label
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}-{index:04}-{label}", self.run_id)
    }

    /// Convert an elapsed nanosecond value to seconds.
    pub fn ns_to_secs(ns: u64) -> f64 {
        ns as f64 / 1_000_000_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_elapsed() {
        let clock = RunClock::start();
        assert!(clock.elapsed_ns() < 1_000_000_000);
    }

    #[test]
    fn test_ns_to_secs_conversion() {
        assert!((RunClock::ns_to_secs(1_500_000_000) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_namespaces_are_distinct_per_item() {
        let clock = RunClock::start();
        let a = clock.namespace(0, "fight_01");
        let b = clock.namespace(1, "fight_01");
        assert_ne!(a, b);
        assert!(a.starts_with(clock.run_id()));
    }

    #[test]
    fn test_namespace_sanitizes_label() {
        let clock = RunClock::start();
        let ns = clock.namespace(3, "my clip/01.mp4");
        assert!(ns.ends_with("-0003-my_clip_01_mp4"));
        assert!(ns
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
