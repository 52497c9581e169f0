//! Goal progress reward.
//!
//! Scores how close the lifted object is to the goal, where the goal is stored
//! in the robot-root frame and re-resolved from the robot's current root pose
//! on every call.
//!
//! The distance is normalized by a fixed scene-scale constant
//! (`max_distance_norm`, 1.0 m by default) rather than by the object's
//! distance at episode start. Changing that normalization changes the reward
//! landscape a policy was trained against, so it is kept as a parameter.

use serde::{Deserialize, Serialize};
use task_types::{FrameTransform, Pose};

use crate::error::RewardError;
use crate::Result;

/// Default progress normalizer: rough scene scale in meters.
pub const DEFAULT_MAX_DISTANCE_NORM: f64 = 1.0;

/// Progress reward in `[0, 1)`.
///
/// Returns `1 - tanh((d / max_distance_norm) / sigma)` when the object is
/// above `min_lift_height`, otherwise `0`. `d` is the distance from the object
/// to `goal_pose_local` resolved through `robot_root_pose`.
///
/// `sigma` and `max_distance_norm` must be positive; this function does not
/// check. Use [`ProgressScorer`] for validated parameters.
///
/// # Example
///
/// ```
/// use task_reward::score_progress;
/// use task_types::{Pose, Point3};
///
/// let root = Pose::from_position(Point3::new(1.354, 1.258, 0.425));
/// let goal_local = Pose::from_position(Point3::new(0.406, 0.222, 0.375));
/// let object = Pose::from_position(Point3::new(1.76, 1.48, 0.8));
///
/// let r = score_progress(&object, &root, &goal_local, 0.8, 0.52, 1.0);
/// assert!((r - 1.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn score_progress(
    object_pose: &Pose,
    robot_root_pose: &Pose,
    goal_pose_local: &FrameTransform,
    sigma: f64,
    min_lift_height: f64,
    max_distance_norm: f64,
) -> f64 {
    if !is_lifted(object_pose, min_lift_height) {
        return 0.0;
    }
    let goal_world = robot_root_pose.compose(goal_pose_local);
    let progress = goal_world.distance_to(object_pose) / max_distance_norm;
    1.0 - (progress / sigma).tanh()
}

/// Strict height gate: `z > min_lift_height`.
///
/// No hysteresis. An object hovering at the threshold flips every step.
#[must_use]
pub fn is_lifted(object_pose: &Pose, min_lift_height: f64) -> bool {
    object_pose.position.z > min_lift_height
}

/// Validated parameters for [`score_progress`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressScorer {
    /// Bandwidth of the tanh kernel.
    pub sigma: f64,
    /// Object height above which progress is rewarded.
    pub min_lift_height: f64,
    /// Distance normalizer.
    #[serde(default = "default_max_distance_norm")]
    pub max_distance_norm: f64,
}

fn default_max_distance_norm() -> f64 {
    DEFAULT_MAX_DISTANCE_NORM
}

impl ProgressScorer {
    /// Create a scorer with the default distance normalizer.
    pub fn new(sigma: f64, min_lift_height: f64) -> Result<Self> {
        Self::with_norm(sigma, min_lift_height, DEFAULT_MAX_DISTANCE_NORM)
    }

    /// Create a scorer with an explicit distance normalizer.
    pub fn with_norm(sigma: f64, min_lift_height: f64, max_distance_norm: f64) -> Result<Self> {
        let scorer = Self {
            sigma,
            min_lift_height,
            max_distance_norm,
        };
        scorer.validate()?;
        Ok(scorer)
    }

    /// Check that the kernel is well defined.
    pub fn validate(&self) -> Result<()> {
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(RewardError::invalid(
                "progress",
                format!("sigma must be positive, got {}", self.sigma),
            ));
        }
        if !self.max_distance_norm.is_finite() || self.max_distance_norm <= 0.0 {
            return Err(RewardError::invalid(
                "progress",
                format!(
                    "max_distance_norm must be positive, got {}",
                    self.max_distance_norm
                ),
            ));
        }
        if !self.min_lift_height.is_finite() {
            return Err(RewardError::invalid("progress", "min_lift_height must be finite"));
        }
        Ok(())
    }

    /// Score one object/robot/goal configuration.
    #[must_use]
    pub fn score(&self, object: &Pose, robot_root: &Pose, goal_local: &FrameTransform) -> f64 {
        score_progress(
            object,
            robot_root,
            goal_local,
            self.sigma,
            self.min_lift_height,
            self.max_distance_norm,
        )
    }
}
