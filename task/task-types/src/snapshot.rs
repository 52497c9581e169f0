//! Per-step world state handed to task logic.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::TaskError;
use crate::pose::{FrameTransform, Pose};
use crate::Result;

/// Immutable snapshot of one environment instance at one step.
///
/// The simulator fills this in once per step. Reward, termination and phase
/// logic read it without touching any shared simulator state.
///
/// # Example
///
/// ```
/// use task_types::{Pose, Point3, StepSnapshot};
///
/// let snap = StepSnapshot::new(
///     0,
///     Pose::from_position(Point3::new(1.3, 1.45, 0.6)),
///     Pose::from_position(Point3::new(1.35, 1.26, 0.425)),
///     Pose::from_position(Point3::new(0.406, 0.222, 0.375)),
///     [0.0, 0.0],
/// );
///
/// let goal = snap.goal_world();
/// assert!((goal.position.z - 0.8).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepSnapshot {
    /// Steps since the episode started.
    pub step: u64,
    /// World pose of the tracked object.
    pub object: Pose,
    /// World pose of the robot base.
    pub robot_root: Pose,
    /// Goal pose in the robot-root frame.
    pub goal_local: FrameTransform,
    /// Positions of the two gripper finger joints.
    pub gripper: [f64; 2],
    /// World position of the end-effector frame.
    pub ee_position: Point3<f64>,
    /// World pose of the container the object is placed into.
    pub container: Pose,
    /// Joint velocities of the robot.
    pub joint_velocities: Vec<f64>,
    /// Action applied this step.
    pub action: Vec<f64>,
    /// Action applied on the previous step.
    pub previous_action: Vec<f64>,
}

impl StepSnapshot {
    /// Create a snapshot with the state the progress and release terms need.
    ///
    /// The remaining fields start at identity/empty; fill them with the
    /// `with_*` builders.
    #[must_use]
    pub fn new(
        step: u64,
        object: Pose,
        robot_root: Pose,
        goal_local: FrameTransform,
        gripper: [f64; 2],
    ) -> Self {
        Self {
            step,
            object,
            robot_root,
            goal_local,
            gripper,
            ee_position: Point3::origin(),
            container: Pose::identity(),
            joint_velocities: Vec::new(),
            action: Vec::new(),
            previous_action: Vec::new(),
        }
    }

    /// Set the end-effector position.
    #[must_use]
    pub fn with_ee_position(mut self, ee_position: Point3<f64>) -> Self {
        self.ee_position = ee_position;
        self
    }

    /// Set the container pose.
    #[must_use]
    pub fn with_container(mut self, container: Pose) -> Self {
        self.container = container;
        self
    }

    /// Set the joint velocities.
    #[must_use]
    pub fn with_joint_velocities(mut self, joint_velocities: Vec<f64>) -> Self {
        self.joint_velocities = joint_velocities;
        self
    }

    /// Set the current and previous actions.
    #[must_use]
    pub fn with_actions(mut self, action: Vec<f64>, previous_action: Vec<f64>) -> Self {
        self.action = action;
        self.previous_action = previous_action;
        self
    }

    /// Goal resolved into the world frame from the current robot root.
    #[must_use]
    pub fn goal_world(&self) -> Pose {
        self.robot_root.compose(&self.goal_local)
    }

    /// Distance from the object to the world-frame goal.
    #[must_use]
    pub fn object_goal_distance(&self) -> f64 {
        self.goal_world().distance_to(&self.object)
    }

    /// Check every pose and vector for `NaN` or `Inf`.
    pub fn check_finite(&self) -> Result<()> {
        let poses = [
            ("object", &self.object),
            ("robot_root", &self.robot_root),
            ("goal_local", &self.goal_local),
            ("container", &self.container),
        ];
        for (name, pose) in poses {
            if !pose.is_finite() {
                return Err(TaskError::non_finite(format!("{name} pose")));
            }
        }
        if !self.gripper.iter().all(|q| q.is_finite()) {
            return Err(TaskError::non_finite("gripper joints"));
        }
        if !self.ee_position.coords.iter().all(|x| x.is_finite()) {
            return Err(TaskError::non_finite("end-effector position"));
        }
        let vectors = [
            ("joint velocities", &self.joint_velocities),
            ("action", &self.action),
            ("previous action", &self.previous_action),
        ];
        for (name, v) in vectors {
            if !v.iter().all(|x| x.is_finite()) {
                return Err(TaskError::non_finite(name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn snapshot() -> StepSnapshot {
        StepSnapshot::new(
            3,
            Pose::from_position(Point3::new(1.76, 1.48, 0.8)),
            Pose::from_position(Point3::new(1.354, 1.258, 0.425)),
            Pose::from_position(Point3::new(0.406, 0.222, 0.375)),
            [0.04, 0.04],
        )
    }

    #[test]
    fn test_goal_world_and_distance() {
        let snap = snapshot();
        let goal = snap.goal_world();
        assert_relative_eq!(goal.position, Point3::new(1.76, 1.48, 0.8), epsilon = 1e-9);
        assert_relative_eq!(snap.object_goal_distance(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_builders() {
        let snap = snapshot()
            .with_ee_position(Point3::new(1.0, 1.0, 1.0))
            .with_joint_velocities(vec![0.1; 9])
            .with_actions(vec![0.0; 7], vec![0.1; 7]);
        assert_eq!(snap.joint_velocities.len(), 9);
        assert_eq!(snap.previous_action[0], 0.1);
        assert!(snap.check_finite().is_ok());
    }

    #[test]
    fn test_check_finite_reports_field() {
        let mut snap = snapshot();
        snap.gripper[1] = f64::INFINITY;
        let err = snap.check_finite().unwrap_err();
        assert!(err.to_string().contains("gripper"));

        let snap = snapshot().with_actions(vec![f64::NAN], vec![0.0]);
        assert!(snap.check_finite().is_err());
    }
}
