//! Declarative reward term configuration.

use serde::{Deserialize, Serialize};
use task_types::{GripperConfig, StepSnapshot};

use crate::error::RewardError;
use crate::kernels::{
    action_rate_l2, joint_vel_l2, object_ee_distance, object_goal_distance, object_is_lifted,
    ContainerCheck,
};
use crate::progress::ProgressScorer;
use crate::release::ReleaseDetector;
use crate::Result;

/// Which kernel a reward term evaluates, with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardKind {
    /// End-effector approaching the object.
    ReachObject {
        /// Kernel bandwidth.
        std: f64,
    },
    /// Object above a height.
    ObjectLifted {
        /// Lift threshold (world z).
        minimal_height: f64,
    },
    /// Normalized progress toward the goal while lifted.
    CommandProgress(ProgressScorer),
    /// Goal tracking kernel while lifted.
    GoalTracking {
        /// Kernel bandwidth.
        std: f64,
        /// Lift threshold (world z).
        minimal_height: f64,
    },
    /// Object released inside the container.
    ObjectInContainer(ContainerCheck),
    /// Object at the goal with the gripper still closed.
    HoldAtGoal(ReleaseDetector),
    /// Squared action change.
    ActionRate,
    /// Squared joint velocity.
    JointVelocity,
}

impl RewardKind {
    /// Evaluate the raw (unweighted) term value.
    #[must_use]
    pub fn evaluate(&self, snap: &StepSnapshot, gripper: &GripperConfig) -> f64 {
        match self {
            Self::ReachObject { std } => object_ee_distance(&snap.object, &snap.ee_position, *std),
            Self::ObjectLifted { minimal_height } => object_is_lifted(&snap.object, *minimal_height),
            Self::CommandProgress(scorer) => {
                scorer.score(&snap.object, &snap.robot_root, &snap.goal_local)
            }
            Self::GoalTracking {
                std,
                minimal_height,
            } => object_goal_distance(
                &snap.object,
                &snap.robot_root,
                &snap.goal_local,
                *std,
                *minimal_height,
            ),
            Self::ObjectInContainer(check) => {
                indicator(check.is_inside(&snap.object, &snap.container, snap.gripper, gripper))
            }
            Self::HoldAtGoal(detector) => indicator(detector.detect(
                &snap.object,
                &snap.robot_root,
                &snap.goal_local,
                snap.gripper,
                gripper,
            )),
            Self::ActionRate => action_rate_l2(&snap.action, &snap.previous_action),
            Self::JointVelocity => joint_vel_l2(&snap.joint_velocities),
        }
    }

    /// Validate kernel parameters.
    pub fn validate(&self, term: &str) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(RewardError::invalid(term, format!("{name} must be positive, got {v}")))
            }
        };
        match self {
            Self::ReachObject { std } => positive("std", *std),
            Self::ObjectLifted { minimal_height } => {
                if minimal_height.is_finite() {
                    Ok(())
                } else {
                    Err(RewardError::invalid(term, "minimal_height must be finite"))
                }
            }
            Self::CommandProgress(scorer) => scorer
                .validate()
                .map_err(|e| RewardError::invalid(term, e.to_string())),
            Self::GoalTracking { std, .. } => positive("std", *std),
            Self::ObjectInContainer(check) => check.validate(term),
            Self::HoldAtGoal(detector) => detector
                .validate()
                .map_err(|e| RewardError::invalid(term, e.to_string())),
            Self::ActionRate | Self::JointVelocity => Ok(()),
        }
    }
}

fn indicator(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

/// A named, weighted reward term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardTerm {
    /// Unique term name.
    pub name: String,
    /// Multiplier applied to the raw value.
    pub weight: f64,
    /// Kernel and parameters.
    #[serde(flatten)]
    pub kind: RewardKind,
}

impl RewardTerm {
    /// Create a term.
    #[must_use]
    pub fn new(name: impl Into<String>, weight: f64, kind: RewardKind) -> Self {
        Self {
            name: name.into(),
            weight,
            kind,
        }
    }

    /// Validate weight and kernel parameters.
    pub fn validate(&self) -> Result<()> {
        if !self.weight.is_finite() {
            return Err(RewardError::invalid(&self.name, "weight must be finite"));
        }
        self.kind.validate(&self.name)
    }
}

/// Reward table of the pick-and-place task.
///
/// | Term | Weight |
/// |---|---|
/// | `reaching_object` | 5 |
/// | `lifting_object` | 10 |
/// | `command_progress` | 30 |
/// | `object_goal_tracking` | 10 |
/// | `object_goal_tracking_fine_grained` | 50 |
/// | `success_reward` | 20000 |
/// | `gripper_closed_penalty` | -100 |
/// | `action_rate` | -1e-4 |
/// | `joint_vel` | -1e-4 |
#[must_use]
pub fn pick_place_terms() -> Vec<RewardTerm> {
    let lift_height = 0.52;
    vec![
        RewardTerm::new("reaching_object", 5.0, RewardKind::ReachObject { std: 0.1 }),
        RewardTerm::new(
            "lifting_object",
            10.0,
            RewardKind::ObjectLifted {
                minimal_height: lift_height,
            },
        ),
        RewardTerm::new(
            "command_progress",
            30.0,
            RewardKind::CommandProgress(ProgressScorer {
                sigma: 0.8,
                min_lift_height: lift_height,
                max_distance_norm: crate::DEFAULT_MAX_DISTANCE_NORM,
            }),
        ),
        RewardTerm::new(
            "object_goal_tracking",
            10.0,
            RewardKind::GoalTracking {
                std: 0.3,
                minimal_height: lift_height,
            },
        ),
        RewardTerm::new(
            "object_goal_tracking_fine_grained",
            50.0,
            RewardKind::GoalTracking {
                std: 0.05,
                minimal_height: lift_height,
            },
        ),
        RewardTerm::new(
            "success_reward",
            20000.0,
            RewardKind::ObjectInContainer(ContainerCheck::default()),
        ),
        RewardTerm::new(
            "gripper_closed_penalty",
            -100.0,
            RewardKind::HoldAtGoal(ReleaseDetector::default()),
        ),
        RewardTerm::new("action_rate", -1e-4, RewardKind::ActionRate),
        RewardTerm::new("joint_vel", -1e-4, RewardKind::JointVelocity),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_place_table_validates() {
        let terms = pick_place_terms();
        assert_eq!(terms.len(), 9);
        for term in &terms {
            term.validate().unwrap();
        }
        let penalty = terms
            .iter()
            .find(|t| t.name == "gripper_closed_penalty")
            .unwrap();
        assert_eq!(penalty.weight, -100.0);
    }

    #[test]
    fn test_invalid_kernel_parameter() {
        let term = RewardTerm::new("reach", 1.0, RewardKind::ReachObject { std: 0.0 });
        let err = term.validate().unwrap_err();
        assert!(err.to_string().contains("reach"));

        let term = RewardTerm::new("nan", f64::NAN, RewardKind::ActionRate);
        assert!(term.validate().is_err());
    }

    #[test]
    fn test_term_json_shape() {
        let term = RewardTerm::new(
            "object_goal_tracking",
            10.0,
            RewardKind::GoalTracking {
                std: 0.3,
                minimal_height: 0.52,
            },
        );
        let json = serde_json::to_value(&term).unwrap();
        assert_eq!(json["kind"], "goal_tracking");
        assert_eq!(json["std"], 0.3);

        let back: RewardTerm = serde_json::from_value(json).unwrap();
        assert_eq!(back, term);
    }

    #[test]
    fn test_progress_term_from_json() {
        let json = r#"{
            "name": "command_progress",
            "weight": 30.0,
            "kind": "command_progress",
            "sigma": 0.8,
            "min_lift_height": 0.52
        }"#;
        let term: RewardTerm = serde_json::from_str(json).unwrap();
        match term.kind {
            RewardKind::CommandProgress(scorer) => assert_eq!(scorer.max_distance_norm, 1.0),
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
