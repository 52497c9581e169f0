//! Action terms: relative end-effector IK for the arm and a binary gripper.
//!
//! A policy action is a flat vector: six arm values (position and
//! axis-angle delta of the IK body) followed by one gripper value. Joint
//! sets are written as patterns that must match a joint name in full.

use regex::Regex;
use serde::{Deserialize, Serialize};

use task_types::JointPositions;

use crate::error::EnvError;
use crate::Result;

/// Quantity the IK controller tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IkCommandType {
    /// Position and orientation (six values).
    Pose,
    /// Position only (three values).
    Position,
}

impl IkCommandType {
    /// Arm action size for this command type.
    #[must_use]
    pub const fn dim(self) -> usize {
        match self {
            Self::Pose => 6,
            Self::Position => 3,
        }
    }
}

/// Inverse kinematics solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IkMethod {
    /// Damped least squares.
    Dls,
    /// Jacobian pseudo-inverse.
    Pinv,
    /// Jacobian transpose.
    Transpose,
}

/// Differential IK controller settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifferentialIkConfig {
    /// Tracked quantity.
    pub command_type: IkCommandType,
    /// Interpret commands as deltas from the current pose.
    pub use_relative_mode: bool,
    /// Solver.
    pub ik_method: IkMethod,
}

impl Default for DifferentialIkConfig {
    fn default() -> Self {
        Self {
            command_type: IkCommandType::Pose,
            use_relative_mode: true,
            ik_method: IkMethod::Dls,
        }
    }
}

/// Arm action: IK target on a body of the robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmActionConfig {
    /// Articulation the action drives.
    pub asset_name: String,
    /// Joint patterns the controller may move.
    pub joint_names: Vec<String>,
    /// Body whose pose is commanded.
    pub body_name: String,
    /// Controller settings.
    pub controller: DifferentialIkConfig,
    /// Multiplier applied to raw actions.
    pub scale: f64,
    /// Commanded point in the body frame (meters).
    pub body_offset: [f64; 3],
}

impl ArmActionConfig {
    /// Relative pose IK on the Franka hand.
    #[must_use]
    pub fn franka_ik_rel() -> Self {
        Self {
            asset_name: "robot".to_owned(),
            joint_names: vec!["panda_joint.*".to_owned()],
            body_name: "panda_hand".to_owned(),
            controller: DifferentialIkConfig::default(),
            scale: 0.5,
            body_offset: [0.0, 0.0, 0.107],
        }
    }

    /// Number of action values consumed.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.controller.command_type.dim()
    }

    /// Validate scale and offset.
    pub fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(EnvError::invalid_config(format!(
                "arm action scale must be positive, got {}",
                self.scale
            )));
        }
        if !self.body_offset.iter().all(|v| v.is_finite()) {
            return Err(EnvError::invalid_config("arm body offset must be finite"));
        }
        if self.joint_names.is_empty() {
            return Err(EnvError::invalid_config("arm action has no joints"));
        }
        Ok(())
    }
}

/// Binary gripper: negative action closes, anything else opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GripperActionConfig {
    /// Articulation the action drives.
    pub asset_name: String,
    /// Finger joint patterns.
    pub joint_names: Vec<String>,
    /// Joint target when opening.
    pub open_command: f64,
    /// Joint target when closing.
    pub close_command: f64,
}

impl GripperActionConfig {
    /// Franka fingers: open at 0.04, closed at 0.0.
    #[must_use]
    pub fn franka() -> Self {
        Self {
            asset_name: "robot".to_owned(),
            joint_names: vec!["panda_finger.*".to_owned()],
            open_command: 0.04,
            close_command: 0.0,
        }
    }

    /// Finger target for one gripper action value.
    #[must_use]
    pub fn target(&self, action: f64) -> f64 {
        if action < 0.0 {
            self.close_command
        } else {
            self.open_command
        }
    }

    /// Validate the two targets.
    pub fn validate(&self) -> Result<()> {
        if !(self.open_command.is_finite() && self.close_command.is_finite()) {
            return Err(EnvError::invalid_config("gripper commands must be finite"));
        }
        if self.open_command == self.close_command {
            return Err(EnvError::invalid_config(
                "gripper open and close commands are identical",
            ));
        }
        if self.joint_names.is_empty() {
            return Err(EnvError::invalid_config("gripper action has no joints"));
        }
        Ok(())
    }
}

/// Arm and gripper action terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    /// Arm term.
    pub arm: ArmActionConfig,
    /// Gripper term.
    pub gripper: GripperActionConfig,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self::franka_ik_rel()
    }
}

impl ActionConfig {
    /// Franka with relative IK and a binary gripper.
    #[must_use]
    pub fn franka_ik_rel() -> Self {
        Self {
            arm: ArmActionConfig::franka_ik_rel(),
            gripper: GripperActionConfig::franka(),
        }
    }

    /// Length of a policy action vector.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.arm.dim() + 1
    }

    /// Validate both terms and their joint patterns.
    pub fn validate(&self) -> Result<()> {
        self.arm.validate()?;
        self.gripper.validate()?;
        compile_patterns(&self.arm.joint_names)?;
        compile_patterns(&self.gripper.joint_names)?;
        Ok(())
    }

    /// Resolve the joint patterns against a robot's joints.
    pub fn bind(&self, joints: &JointPositions) -> Result<BoundActions> {
        self.validate()?;
        let arm_joints = match_joints(joints, &self.arm.joint_names)?;
        let gripper_joints = match_joints(joints, &self.gripper.joint_names)?;
        if arm_joints.iter().any(|i| gripper_joints.contains(i)) {
            return Err(EnvError::invalid_config(
                "arm and gripper actions share a joint",
            ));
        }
        Ok(BoundActions {
            config: self.clone(),
            arm_joints,
            gripper_joints,
        })
    }
}

/// Arm and gripper commands decoded from one policy action.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedAction {
    /// Scaled IK delta of the commanded body.
    pub arm_delta: Vec<f64>,
    /// Target for every gripper joint.
    pub gripper_target: f64,
}

/// Action terms resolved to joint indices.
#[derive(Debug, Clone)]
pub struct BoundActions {
    config: ActionConfig,
    arm_joints: Vec<usize>,
    gripper_joints: Vec<usize>,
}

impl BoundActions {
    /// Split and scale a raw policy action.
    pub fn process(&self, action: &[f64]) -> Result<ProcessedAction> {
        let expected = self.config.dim();
        if action.len() != expected {
            return Err(EnvError::ActionDimension {
                expected,
                actual: action.len(),
            });
        }
        let (arm, gripper) = action.split_at(self.config.arm.dim());
        let scale = self.config.arm.scale;
        Ok(ProcessedAction {
            arm_delta: arm.iter().map(|a| a * scale).collect(),
            gripper_target: self.config.gripper.target(gripper[0]),
        })
    }

    /// Joints driven by the arm term, in articulation order.
    #[must_use]
    pub fn arm_joints(&self) -> &[usize] {
        &self.arm_joints
    }

    /// Joints driven by the gripper term, in articulation order.
    #[must_use]
    pub fn gripper_joints(&self) -> &[usize] {
        &self.gripper_joints
    }

    /// Action configuration.
    #[must_use]
    pub const fn config(&self) -> &ActionConfig {
        &self.config
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Ok(Regex::new(&format!("^(?:{p})$"))?))
        .collect()
}

fn match_joints(joints: &JointPositions, patterns: &[String]) -> Result<Vec<usize>> {
    let compiled = compile_patterns(patterns)?;
    let indices: Vec<usize> = joints
        .names()
        .iter()
        .enumerate()
        .filter(|(_, name)| compiled.iter().any(|re| re.is_match(name)))
        .map(|(i, _)| i)
        .collect();
    if indices.is_empty() {
        return Err(EnvError::invalid_config(format!(
            "no joint matches {patterns:?}"
        )));
    }
    Ok(indices)
}
