//! Live loop configuration.

use std::time::Duration;

use posewatch_common::{LiveDefaults, PosewatchError, PosewatchResult};
use posewatch_skeleton_model::Label;

/// Default capacity of the alert channel.
pub const DEFAULT_ALERT_CAPACITY: usize = 64;

/// Settings for one [`LiveInferenceLoop`](crate::LiveInferenceLoop).
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// Polling cadence.
    pub tick_interval: Duration,
    /// Rolling window length. Must match the classifier's window length.
    pub window_len: usize,
    /// Probability at or above which an alert fires.
    pub alert_threshold: f32,
    /// Class watched for alerts.
    pub alert_label: Label,
    /// Alerts buffered before new ones are dropped.
    pub alert_capacity: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self::from(&LiveDefaults::default())
    }
}

impl From<&LiveDefaults> for LiveConfig {
    fn from(defaults: &LiveDefaults) -> Self {
        Self {
            tick_interval: Duration::from_millis(defaults.tick_ms),
            window_len: defaults.window_len,
            alert_threshold: defaults.alert_threshold,
            alert_label: Label::Anomalous,
            alert_capacity: DEFAULT_ALERT_CAPACITY,
        }
    }
}

impl LiveConfig {
    pub fn validate(&self) -> PosewatchResult<()> {
        if self.tick_interval.is_zero() {
            return Err(PosewatchError::config("tick interval must be > 0"));
        }
        if self.window_len == 0 {
            return Err(PosewatchError::config("live window length must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.alert_threshold) {
            return Err(PosewatchError::config(format!(
                "alert threshold must be within [0, 1] (got {})",
                self.alert_threshold
            )));
        }
        if self.alert_capacity == 0 {
            return Err(PosewatchError::config("alert channel capacity must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_defaults() {
        let config = LiveConfig::default();
        assert_eq!(config.tick_interval, Duration::from_millis(100));
        assert_eq!(config.window_len, 30);
        assert_eq!(config.alert_label, Label::Anomalous);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = LiveConfig {
            tick_interval: Duration::ZERO,
            ..LiveConfig::default()
        };
        assert!(config.validate().is_err());

        config.tick_interval = Duration::from_millis(10);
        config.alert_threshold = 1.5;
        assert!(config.validate().is_err());
    }
}
