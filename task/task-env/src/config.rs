//! Task configuration and presets.
//!
//! [`TaskConfig`] gathers everything needed to run the pick-and-place task:
//! scene, goal command, gripper classification, action and observation
//! terms, reward/termination tables, curriculum and reset events. Three
//! presets mirror how the task is used:
//!
//! - [`TaskConfig::rl`] - Training with 4096 instances
//! - [`TaskConfig::play`] - Evaluation with 50 instances, no observation noise
//! - [`TaskConfig::mimic`] - Demonstration generation with narrowed
//!   randomization and named dataset observations

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use task_datagen::{DatagenConfig, SubtaskSequence};
use task_reward::{
    pick_place_curriculum, pick_place_terminations, pick_place_terms, RewardTerm,
    TerminationTerm, WeightSchedule,
};
use task_types::{EntityKind, GripperConfig};

use crate::actions::ActionConfig;
use crate::command::PoseCommandConfig;
use crate::error::EnvError;
use crate::events::EventConfig;
use crate::observations::ObservationConfig;
use crate::scene::SceneConfig;
use crate::Result;

/// Simulation timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Physics step in seconds.
    pub sim_dt: f64,
    /// Physics steps per environment step.
    pub decimation: u32,
    /// Episode length in seconds.
    pub episode_length_s: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sim_dt: 0.01,
            decimation: 2,
            episode_length_s: 5.0,
        }
    }
}

impl TimingConfig {
    /// Environment step duration: `sim_dt * decimation`.
    #[must_use]
    pub fn step_dt(&self) -> f64 {
        self.sim_dt * f64::from(self.decimation)
    }

    /// Steps per episode: `ceil(episode_length_s / step_dt)`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn max_episode_steps(&self) -> u64 {
        // Round before ceil so 5.0 / 0.02 = 250.00000000000003 stays 250
        let steps = self.episode_length_s / self.step_dt();
        let rounded = (steps * 1e9).round() / 1e9;
        rounded.ceil() as u64
    }

    /// Validate timing.
    pub fn validate(&self) -> Result<()> {
        if !(self.sim_dt.is_finite() && self.sim_dt > 0.0) {
            return Err(EnvError::invalid_config(format!(
                "sim_dt must be positive, got {}",
                self.sim_dt
            )));
        }
        if self.decimation == 0 {
            return Err(EnvError::invalid_config("decimation must be at least 1"));
        }
        if !(self.episode_length_s.is_finite() && self.episode_length_s > 0.0) {
            return Err(EnvError::invalid_config(format!(
                "episode_length_s must be positive, got {}",
                self.episode_length_s
            )));
        }
        Ok(())
    }
}

/// Complete task configuration.
///
/// # Example
///
/// ```
/// use task_env::TaskConfig;
///
/// let config = TaskConfig::rl();
/// config.validate().unwrap();
///
/// assert_eq!(config.timing.max_episode_steps(), 250);
/// assert!((config.timing.step_dt() - 0.02).abs() < 1e-12);
///
/// let play = TaskConfig::play();
/// assert_eq!(play.scene.num_envs, 50);
/// assert!(!play.observations.policy.enable_corruption);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Scene layout and initial state.
    pub scene: SceneConfig,
    /// Timing.
    pub timing: TimingConfig,
    /// Goal pose command.
    pub command: PoseCommandConfig,
    /// Gripper open/closed classification.
    pub gripper: GripperConfig,
    /// Object the task manipulates.
    pub tracked_object: String,
    /// Container the object is placed into.
    pub container: String,
    /// Reward table.
    pub rewards: Vec<RewardTerm>,
    /// Termination table.
    pub terminations: Vec<TerminationTerm>,
    /// Reward weight schedules.
    pub curriculum: Vec<WeightSchedule>,
    /// Reset events.
    pub events: EventConfig,
    /// Policy action terms.
    #[serde(default)]
    pub actions: ActionConfig,
    /// Policy observation terms.
    #[serde(default)]
    pub observations: ObservationConfig,
    /// Demonstration generation settings.
    #[serde(default)]
    pub datagen: Option<DatagenConfig>,
    /// Sub-task decomposition for demonstration generation and phase tracking.
    #[serde(default)]
    pub subtasks: Option<SubtaskSequence>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self::rl()
    }
}

impl TaskConfig {
    /// Reinforcement learning preset.
    #[must_use]
    pub fn rl() -> Self {
        Self {
            scene: SceneConfig::desktop_organizer(),
            timing: TimingConfig::default(),
            command: PoseCommandConfig::above_basket(),
            gripper: GripperConfig::franka(),
            tracked_object: "ketchup".to_owned(),
            container: "basket".to_owned(),
            rewards: pick_place_terms(),
            terminations: pick_place_terminations(),
            curriculum: pick_place_curriculum(),
            events: EventConfig::rl(),
            actions: ActionConfig::franka_ik_rel(),
            observations: ObservationConfig::rl("ketchup"),
            datagen: None,
            subtasks: None,
        }
    }

    /// Evaluation preset: 50 instances, observation noise off.
    #[must_use]
    pub fn play() -> Self {
        let mut config = Self::rl();
        config.scene.num_envs = 50;
        config.scene.env_spacing = 2.5;
        config.observations.policy = config.observations.policy.without_corruption();
        config
    }

    /// Demonstration generation preset.
    #[must_use]
    pub fn mimic() -> Self {
        let mut config = Self::rl();
        config.events = EventConfig::mimic();
        config.observations = ObservationConfig::demo("ketchup", "basket");
        config.datagen = Some(DatagenConfig::default());
        config.subtasks = Some(SubtaskSequence::pick_place());
        config
    }

    /// Set the number of instances.
    #[must_use]
    pub fn with_num_envs(mut self, num_envs: usize) -> Self {
        self.scene.num_envs = num_envs;
        self
    }

    /// Environment step duration in seconds.
    #[must_use]
    pub fn step_dt(&self) -> f64 {
        self.timing.step_dt()
    }

    /// Validate every section and the names they reference.
    pub fn validate(&self) -> Result<()> {
        self.scene.validate()?;
        self.timing.validate()?;
        self.command.validate()?;
        self.gripper.validate()?;
        self.events.validate()?;
        self.actions.validate()?;
        self.observations.validate()?;
        for term in &self.rewards {
            term.validate()?;
        }

        let registry = self.scene.registry()?;
        registry.resolve_kind(&self.tracked_object, EntityKind::Object)?;
        registry.resolve_kind(&self.container, EntityKind::Container)?;
        registry.resolve_kind(&self.command.asset_name, EntityKind::Robot)?;
        for asset in self.events.assets() {
            registry.resolve(asset)?;
        }
        self.scene.robot.gripper_joints(&self.gripper)?;
        registry.resolve_kind(&self.actions.arm.asset_name, EntityKind::Robot)?;
        registry.resolve_kind(&self.actions.gripper.asset_name, EntityKind::Robot)?;
        self.actions.bind(&self.scene.robot.joint_positions())?;
        for name in self.observations.policy.entities() {
            registry.resolve(name)?;
        }

        if let Some(subtasks) = &self.subtasks {
            subtasks.validate()?;
            for name in subtasks.object_refs() {
                registry.resolve(name)?;
            }
        }
        if let Some(datagen) = &self.datagen {
            if self.subtasks.is_none() {
                return Err(EnvError::invalid_config(
                    "datagen settings need a sub-task sequence",
                ));
            }
            datagen.validate()?;
        }
        Ok(())
    }

    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_json_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        info!(path = %path.display(), num_envs = config.scene.num_envs, "Task configuration loaded");
        Ok(config)
    }

    /// Write the configuration as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json_string()?)?;
        info!(path = %path.display(), "Task configuration saved");
        Ok(())
    }
}
