//! Error types for task-env.

use thiserror::Error;

use task_datagen::DatagenError;
use task_reward::RewardError;
use task_types::TaskError;

/// Errors from building, loading or binding a task configuration.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Randomization range is inverted or non-finite.
    #[error("invalid range for {name}: ({lo}, {hi})")]
    InvalidRange {
        /// Axis or parameter name.
        name: String,
        /// Lower bound.
        lo: f64,
        /// Upper bound.
        hi: f64,
    },

    /// Policy action of the wrong length.
    #[error("action has {actual} values, expected {expected}")]
    ActionDimension {
        /// Values the action terms consume.
        expected: usize,
        /// Values received.
        actual: usize,
    },

    /// An observation term needs an entity pose the frame does not carry.
    #[error("no pose for entity '{0}' in observation frame")]
    MissingPose(String),

    /// Joint name pattern does not compile.
    #[error("invalid joint pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Scene data error.
    #[error(transparent)]
    Task(#[from] TaskError),

    /// Reward, termination or curriculum error.
    #[error(transparent)]
    Reward(#[from] RewardError),

    /// Sub-task or dataset error.
    #[error(transparent)]
    Datagen(#[from] DatagenError),

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EnvError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Create an invalid range error.
    #[must_use]
    pub fn invalid_range(name: impl Into<String>, lo: f64, hi: f64) -> Self {
        Self::InvalidRange {
            name: name.into(),
            lo,
            hi,
        }
    }

    /// Whether the error was raised while reading or writing a file.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_lower_layers() {
        let err: EnvError = TaskError::entity_not_found("mustard").into();
        assert!(err.to_string().contains("mustard"));
        assert!(!err.is_io());

        let err: EnvError = RewardError::unknown("joint_vel").into();
        assert!(err.to_string().contains("joint_vel"));

        let err = EnvError::invalid_range("yaw", 0.3, -0.3);
        assert!(err.to_string().contains("yaw"));
    }

    #[test]
    fn test_json_error_is_io() {
        let parse = serde_json::from_str::<u32>("not json");
        let err: EnvError = match parse {
            Ok(_) => EnvError::invalid_config("parsed"),
            Err(e) => e.into(),
        };
        assert!(err.is_io());
    }
}
