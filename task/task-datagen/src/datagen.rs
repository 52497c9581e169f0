//! Demonstration generation settings.

use serde::{Deserialize, Serialize};

use crate::error::DatagenError;
use crate::Result;

/// Settings handed to the external demonstration generator.
///
/// # Example
///
/// ```
/// use task_datagen::DatagenConfig;
///
/// let config = DatagenConfig::default();
/// assert_eq!(config.generation_num_trials, 10);
/// assert_eq!(config.max_num_failures, 25);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatagenConfig {
    /// Dataset name.
    pub name: String,
    /// Keep generating until `generation_num_trials` successes are collected.
    pub generation_guarantee: bool,
    /// Also store failed attempts.
    pub generation_keep_failed: bool,
    /// Number of demonstrations to generate.
    pub generation_num_trials: u32,
    /// Select a fresh source demonstration for every sub-task.
    pub generation_select_src_per_subtask: bool,
    /// Transform the first robot pose of each segment.
    pub generation_transform_first_robot_pose: bool,
    /// Interpolate from the last commanded target pose instead of the current pose.
    pub generation_interpolate_from_last_target_pose: bool,
    /// Generate relative actions.
    pub generation_relative: bool,
    /// Give up after this many failed attempts.
    pub max_num_failures: u32,
    /// RNG seed.
    pub seed: u64,
}

impl Default for DatagenConfig {
    fn default() -> Self {
        Self {
            name: "demo_src_desktop_organizer_isaac_lab_task_D0".to_owned(),
            generation_guarantee: true,
            generation_keep_failed: true,
            generation_num_trials: 10,
            generation_select_src_per_subtask: true,
            generation_transform_first_robot_pose: false,
            generation_interpolate_from_last_target_pose: true,
            generation_relative: true,
            max_num_failures: 25,
            seed: 1,
        }
    }
}

impl DatagenConfig {
    /// Set the number of demonstrations to generate.
    #[must_use]
    pub fn with_num_trials(mut self, n: u32) -> Self {
        self.generation_num_trials = n;
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DatagenError::InvalidParameter(
                "dataset name must not be empty".into(),
            ));
        }
        if self.generation_num_trials == 0 {
            return Err(DatagenError::InvalidParameter(
                "generation_num_trials must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = DatagenConfig::default();
        assert!(c.generation_guarantee);
        assert!(c.generation_keep_failed);
        assert!(c.generation_select_src_per_subtask);
        assert!(!c.generation_transform_first_robot_pose);
        assert!(c.generation_interpolate_from_last_target_pose);
        assert!(c.generation_relative);
        assert_eq!(c.seed, 1);
        c.validate().unwrap();
    }

    #[test]
    fn test_validation() {
        assert!(DatagenConfig::default().with_num_trials(0).validate().is_err());
        let mut c = DatagenConfig::default().with_seed(9);
        c.name = " ".into();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let c = DatagenConfig::default().with_num_trials(100);
        let json = serde_json::to_string(&c).unwrap();
        let back: DatagenConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
