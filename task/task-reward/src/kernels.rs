//! Companion reward kernels used by the task's reward table.

use serde::{Deserialize, Serialize};
use task_types::{GripperConfig, Pose, Point3};

use crate::error::RewardError;
use crate::progress::is_lifted;
use crate::Result;

/// `1 - tanh(‖ee - object‖ / std)`: dense reward for reaching the object.
#[must_use]
pub fn object_ee_distance(object: &Pose, ee_position: &Point3<f64>, std: f64) -> f64 {
    let d = (object.position - ee_position).norm();
    1.0 - (d / std).tanh()
}

/// `1.0` if the object is above `minimal_height`, else `0.0`.
#[must_use]
pub fn object_is_lifted(object: &Pose, minimal_height: f64) -> f64 {
    if is_lifted(object, minimal_height) {
        1.0
    } else {
        0.0
    }
}

/// Goal tracking: `1 - tanh(d / std)` while lifted, where `d` is the distance
/// from the object to the goal resolved through the robot root.
#[must_use]
pub fn object_goal_distance(
    object: &Pose,
    robot_root: &Pose,
    goal_local: &Pose,
    std: f64,
    minimal_height: f64,
) -> f64 {
    if !is_lifted(object, minimal_height) {
        return 0.0;
    }
    let d = robot_root.compose(goal_local).distance_to(object);
    1.0 - (d / std).tanh()
}

/// Geometry for deciding whether an object rests inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerCheck {
    /// Maximum horizontal distance between object and container origins.
    pub xy_threshold: f64,
    /// Maximum vertical distance (after subtracting `height_diff`).
    pub height_threshold: f64,
    /// Expected vertical offset between the two origins.
    pub height_diff: f64,
}

impl Default for ContainerCheck {
    fn default() -> Self {
        Self {
            xy_threshold: 0.11,
            height_threshold: 0.20,
            height_diff: 0.0,
        }
    }
}

impl ContainerCheck {
    /// Check that both thresholds are finite and positive.
    pub fn validate(&self, term: &str) -> Result<()> {
        for (name, value) in [
            ("xy_threshold", self.xy_threshold),
            ("height_threshold", self.height_threshold),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(RewardError::invalid(
                    term,
                    format!("{name} must be positive, got {value}"),
                ));
            }
        }
        if !self.height_diff.is_finite() {
            return Err(RewardError::invalid(term, "height_diff must be finite"));
        }
        Ok(())
    }

    /// Whether `object` is inside `container` and the gripper has let go.
    ///
    /// Both fingers must be back within tolerance of the open position; an
    /// object still held over the basket does not count.
    #[must_use]
    pub fn is_inside(
        &self,
        object: &Pose,
        container: &Pose,
        fingers: [f64; 2],
        gripper: &GripperConfig,
    ) -> bool {
        let diff = object.position - container.position;
        let xy = diff.xy().norm();
        let height = diff.z.abs();
        xy < self.xy_threshold
            && height - self.height_diff < self.height_threshold
            && gripper.is_fully_open(fingers)
    }
}

/// Squared L2 norm of the action change between two steps.
///
/// Vectors of different lengths are compared over their common prefix.
#[must_use]
pub fn action_rate_l2(action: &[f64], previous_action: &[f64]) -> f64 {
    action
        .iter()
        .zip(previous_action)
        .map(|(a, b)| (a - b) * (a - b))
        .sum()
}

/// Squared L2 norm of the joint velocities.
#[must_use]
pub fn joint_vel_l2(joint_velocities: &[f64]) -> f64 {
    joint_velocities.iter().map(|v| v * v).sum()
}
