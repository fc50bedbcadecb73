pub mod assemble;
pub mod check;
pub mod evaluate;
pub mod info;
pub mod train;
pub mod watch;

use posewatch_capture::CommandPoseEstimator;
use posewatch_common::AppConfig;

/// Estimator from the command line, falling back to the config file.
pub fn resolve_estimator(
    command_line: Option<&str>,
    config: &AppConfig,
) -> anyhow::Result<CommandPoseEstimator> {
    match (command_line, &config.estimator) {
        (Some(line), _) => Ok(CommandPoseEstimator::from_command_line(line)?),
        (None, Some(command)) => Ok(CommandPoseEstimator::from_config(command)),
        (None, None) => anyhow::bail!(
            "No pose estimator configured. Pass --estimator or set \"estimator\" in the config file."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posewatch_common::EstimatorCommand;

    #[test]
    fn test_estimator_required() {
        let config = AppConfig::default();
        assert!(resolve_estimator(None, &config).is_err());
        assert!(resolve_estimator(Some("python3 movenet.py"), &config).is_ok());
    }

    #[test]
    fn test_estimator_from_config() {
        let mut config = AppConfig::default();
        config.estimator = Some(EstimatorCommand {
            program: "movenet".to_string(),
            args: vec![],
        });
        assert!(resolve_estimator(None, &config).is_ok());
    }
}
