//! Release penalty: object at the goal while the gripper is still closed.
//!
//! The detector only signals the condition. The reward manager multiplies the
//! signal by a negative weight.

use serde::{Deserialize, Serialize};
use task_types::{FrameTransform, GripperConfig, GripperState, Pose};

use crate::error::RewardError;
use crate::Result;

/// Whether the object sits at the goal while both fingers are still closed.
///
/// The goal is resolved from `robot_root_pose` exactly as in
/// [`score_progress`](crate::score_progress). The object is at the goal when
/// its distance is strictly below `distance_threshold`. A finger is closed when
/// `| |q| - gripper_open_value | > gripper_tolerance`; the gripper counts as
/// closed only if both fingers are.
///
/// # Example
///
/// ```
/// use task_reward::detect_hold_at_goal;
/// use task_types::{Pose, Point3};
///
/// let root = Pose::identity();
/// let goal_local = Pose::from_position(Point3::new(0.0, 0.0, 0.8));
/// let object = Pose::from_position(Point3::new(0.05, 0.0, 0.8));
///
/// assert!(detect_hold_at_goal(&object, &root, &goal_local, 0.08, [0.0, 0.0], 0.04, 0.01));
/// assert!(!detect_hold_at_goal(&object, &root, &goal_local, 0.08, [0.04, 0.0], 0.04, 0.01));
/// ```
#[must_use]
pub fn detect_hold_at_goal(
    object_pose: &Pose,
    robot_root_pose: &Pose,
    goal_pose_local: &FrameTransform,
    distance_threshold: f64,
    gripper_joint_positions: [f64; 2],
    gripper_open_value: f64,
    gripper_tolerance: f64,
) -> bool {
    let goal_world = robot_root_pose.compose(goal_pose_local);
    let at_goal = goal_world.distance_to(object_pose) < distance_threshold;

    let finger_closed = |q: f64| (q.abs() - gripper_open_value).abs() > gripper_tolerance;
    let gripper_closed =
        finger_closed(gripper_joint_positions[0]) && finger_closed(gripper_joint_positions[1]);

    at_goal && gripper_closed
}

/// Release-penalty detector with a validated distance threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReleaseDetector {
    /// Distance below which the object counts as at the goal (meters).
    pub distance_threshold: f64,
}

impl Default for ReleaseDetector {
    fn default() -> Self {
        Self {
            distance_threshold: 0.08,
        }
    }
}

impl ReleaseDetector {
    /// Create a detector with the given goal distance threshold.
    pub fn new(distance_threshold: f64) -> Result<Self> {
        let detector = Self { distance_threshold };
        detector.validate()?;
        Ok(detector)
    }

    /// Check the threshold is positive.
    pub fn validate(&self) -> Result<()> {
        if !self.distance_threshold.is_finite() || self.distance_threshold <= 0.0 {
            return Err(RewardError::invalid(
                "release",
                format!(
                    "distance_threshold must be positive, got {}",
                    self.distance_threshold
                ),
            ));
        }
        Ok(())
    }

    /// Evaluate against a gripper classification config.
    #[must_use]
    pub fn detect(
        &self,
        object: &Pose,
        robot_root: &Pose,
        goal_local: &FrameTransform,
        fingers: [f64; 2],
        gripper: &GripperConfig,
    ) -> bool {
        let result = detect_hold_at_goal(
            object,
            robot_root,
            goal_local,
            self.distance_threshold,
            fingers,
            gripper.open_value,
            gripper.tolerance,
        );
        debug_assert!(!result || gripper.classify(fingers) == GripperState::Closed);
        result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use task_types::Point3;

    fn goal_setup() -> (Pose, Pose) {
        (
            Pose::from_position(Point3::new(1.354, 1.258, 0.425)),
            Pose::from_position(Point3::new(0.406, 0.222, 0.375)),
        )
    }

    fn object_offset(dx: f64) -> Pose {
        Pose::from_position(Point3::new(1.76 + dx, 1.48, 0.8))
    }

    #[test]
    fn test_closed_at_goal() {
        let (root, goal) = goal_setup();
        assert!(detect_hold_at_goal(
            &object_offset(0.05),
            &root,
            &goal,
            0.08,
            [0.0, 0.0],
            0.04,
            0.01
        ));
    }

    #[test]
    fn test_half_open_is_not_penalized() {
        let (root, goal) = goal_setup();
        assert!(!detect_hold_at_goal(
            &object_offset(0.0),
            &root,
            &goal,
            0.08,
            [0.04, 0.0],
            0.04,
            0.01
        ));
    }

    #[test]
    fn test_open_at_goal() {
        let (root, goal) = goal_setup();
        assert!(!detect_hold_at_goal(
            &object_offset(0.0),
            &root,
            &goal,
            0.08,
            [0.04, 0.04],
            0.04,
            0.01
        ));
    }

    #[test]
    fn test_closed_away_from_goal() {
        let (root, goal) = goal_setup();
        assert!(!detect_hold_at_goal(
            &object_offset(0.2),
            &root,
            &goal,
            0.08,
            [0.0, 0.0],
            0.04,
            0.01
        ));
    }

    #[test]
    fn test_threshold_is_strict() {
        let root = Pose::identity();
        let goal = Pose::from_position(Point3::new(0.0, 0.0, 0.5));
        let object = Pose::from_position(Point3::new(0.0, 0.0, 0.625));
        assert!(!detect_hold_at_goal(&object, &root, &goal, 0.125, [0.0, 0.0], 0.04, 0.01));
    }

    #[test]
    fn test_detector_uses_gripper_config() {
        let (root, goal) = goal_setup();
        let detector = ReleaseDetector::default();
        let gripper = GripperConfig::franka();
        assert!(detector.detect(&object_offset(0.0), &root, &goal, [0.01, 0.005], &gripper));
        assert!(!detector.detect(&object_offset(0.0), &root, &goal, [0.035, 0.005], &gripper));
    }

    #[test]
    fn test_detector_validation() {
        assert!(ReleaseDetector::new(0.08).is_ok());
        assert!(ReleaseDetector::new(0.0).is_err());
        assert!(ReleaseDetector::new(f64::INFINITY).is_err());
    }
}
