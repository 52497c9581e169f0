//! Goal pose command in the robot-root frame.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use task_types::FrameTransform;

use crate::error::EnvError;
use crate::events::PoseRange;
use crate::Result;

/// Uniform pose command expressed relative to the robot base.
///
/// The goal moves rigidly with the robot root; it is resampled from
/// `ranges` every `resampling_time_range` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseCommandConfig {
    /// Asset whose root frame the goal is expressed in.
    pub asset_name: String,
    /// Body the command is addressed to.
    pub body_name: String,
    /// Resampling period bounds in seconds.
    pub resampling_time_range: (f64, f64),
    /// Goal sampling ranges in the root frame.
    pub ranges: PoseRange,
}

impl Default for PoseCommandConfig {
    fn default() -> Self {
        Self::above_basket()
    }
}

impl PoseCommandConfig {
    /// Fixed goal above the basket: (0.406, 0.222, 0.375) in the root frame.
    #[must_use]
    pub fn above_basket() -> Self {
        Self {
            asset_name: "robot".to_owned(),
            body_name: "panda_hand".to_owned(),
            resampling_time_range: (5.0, 5.0),
            ranges: PoseRange::fixed([0.406, 0.222, 0.375], 0.0, 0.0, 0.0),
        }
    }

    /// Validate the ranges and resampling period.
    pub fn validate(&self) -> Result<()> {
        let (lo, hi) = self.resampling_time_range;
        if !(lo.is_finite() && hi.is_finite()) || lo <= 0.0 || lo > hi {
            return Err(EnvError::invalid_range("resampling_time_range", lo, hi));
        }
        self.ranges.validate()
    }
}

/// Live goal command of one environment instance.
///
/// # Example
///
/// ```
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use task_env::{PoseCommand, PoseCommandConfig};
///
/// let mut rng = ChaCha8Rng::seed_from_u64(0);
/// let mut command = PoseCommand::new(PoseCommandConfig::above_basket(), &mut rng);
///
/// assert!((command.goal_local().position.x - 0.406).abs() < 1e-12);
///
/// // 250 steps of 0.02 s reach the 5 s resampling period
/// let resampled = (0..250).filter(|_| command.advance(0.02, &mut rng)).count();
/// assert_eq!(resampled, 1);
/// ```
#[derive(Debug, Clone)]
pub struct PoseCommand {
    config: PoseCommandConfig,
    goal: FrameTransform,
    time_left: f64,
}

impl PoseCommand {
    /// Create a command and draw the first goal.
    pub fn new<R: Rng + ?Sized>(config: PoseCommandConfig, rng: &mut R) -> Self {
        let mut command = Self {
            goal: FrameTransform::identity(),
            time_left: 0.0,
            config,
        };
        command.resample(rng);
        command
    }

    /// Draw a new goal and resampling period.
    pub fn resample<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.goal = self.config.ranges.sample(rng);
        let (lo, hi) = self.config.resampling_time_range;
        self.time_left = if lo < hi { rng.gen_range(lo..=hi) } else { lo };
        debug!(
            x = self.goal.position.x,
            y = self.goal.position.y,
            z = self.goal.position.z,
            period = self.time_left,
            "Goal command resampled"
        );
    }

    /// Advance time by `dt` seconds. Returns `true` if the goal was resampled.
    pub fn advance<R: Rng + ?Sized>(&mut self, dt: f64, rng: &mut R) -> bool {
        self.time_left -= dt;
        // Absorb float drift from summing many small steps
        if self.time_left <= 1e-9 {
            self.resample(rng);
            true
        } else {
            false
        }
    }

    /// Goal in the robot-root frame.
    #[must_use]
    pub const fn goal_local(&self) -> &FrameTransform {
        &self.goal
    }

    /// Seconds until the next resample.
    #[must_use]
    pub const fn time_left(&self) -> f64 {
        self.time_left
    }

    /// Command settings.
    #[must_use]
    pub const fn config(&self) -> &PoseCommandConfig {
        &self.config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use task_types::{Point3, Pose};

    #[test]
    fn test_fixed_goal() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut command = PoseCommand::new(PoseCommandConfig::above_basket(), &mut rng);
        let first = *command.goal_local();
        command.resample(&mut rng);
        assert_eq!(*command.goal_local(), first);
        assert_relative_eq!(first.position.z, 0.375);
        assert_eq!(command.time_left(), 5.0);
    }

    #[test]
    fn test_goal_world_is_above_basket() {
        // Robot yawed -90 degrees: local (0.406, 0.222) lands near the basket
        let root = Pose::from_wxyz(
            [1.53773, 1.88609, 0.42492],
            [0.707_106_78, 0.0, 0.0, -0.707_106_78],
        );
        let goal = Pose::from_position(Point3::new(0.406, 0.222, 0.375));
        let world = root.compose(&goal);
        assert_relative_eq!(world.position.x, 1.75973, epsilon = 1e-6);
        assert_relative_eq!(world.position.y, 1.48009, epsilon = 1e-6);
        assert_relative_eq!(world.position.z, 0.79992, epsilon = 1e-9);
    }

    #[test]
    fn test_resampling_period() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut command = PoseCommand::new(PoseCommandConfig::above_basket(), &mut rng);
        for _ in 0..249 {
            assert!(!command.advance(0.02, &mut rng));
        }
        assert!(command.advance(0.02, &mut rng));
        assert_relative_eq!(command.time_left(), 5.0);
    }

    #[test]
    fn test_validation() {
        PoseCommandConfig::above_basket().validate().unwrap();
        let mut config = PoseCommandConfig::above_basket();
        config.resampling_time_range = (0.0, 5.0);
        assert!(config.validate().is_err());
        config.resampling_time_range = (6.0, 5.0);
        assert!(config.validate().is_err());
    }
}
