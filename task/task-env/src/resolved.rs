//! A task configuration bound to its scene.
//!
//! Binding resolves every entity name once and builds the reward,
//! termination and curriculum managers. Per-step work then runs on
//! [`EntityHandle`]s and [`StepSnapshot`]s only.

use rand::Rng;
use tracing::{debug, info, warn};

use task_datagen::{Phase, PhaseTracker, SignalSource, SubtaskSequence};
use task_reward::{
    evaluate_batch, Curriculum, RewardBreakdown, RewardManager, StepEvaluation,
    TerminationManager, TerminationOutcome,
};
use task_types::{
    EntityHandle, EntityKind, FrameTransform, GripperJoints, JointPositions, Point3, Pose,
    SceneRegistry, StepSnapshot,
};

use crate::actions::{BoundActions, ProcessedAction};
use crate::config::TaskConfig;
use crate::events::{sample_object_poses, PoseRange};
use crate::observations::{Observation, ObservationFrame, ObservationPipeline};
use crate::Result;

/// Outcome of one environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Per-term and total reward.
    pub reward: RewardBreakdown,
    /// Termination decision.
    pub termination: TerminationOutcome,
    /// Active phase after this step's signals.
    pub phase: Option<Phase>,
    /// Phases completed on this step.
    pub phases_completed: usize,
}

/// Entity poses chosen by a reset, indexed by handle.
///
/// `None` means the entity keeps its current pose.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResetState {
    poses: Vec<Option<Pose>>,
}

impl ResetState {
    /// Pose assigned to an entity.
    #[must_use]
    pub fn pose(&self, handle: EntityHandle) -> Option<Pose> {
        self.poses.get(handle.index()).copied().flatten()
    }

    /// Number of entities with an assigned pose.
    #[must_use]
    pub fn assigned(&self) -> usize {
        self.poses.iter().filter(|p| p.is_some()).count()
    }
}

#[derive(Debug, Clone)]
struct BoundRandomizer {
    name: String,
    handles: Vec<EntityHandle>,
    range: PoseRange,
    min_separation: f64,
}

/// Scene-bound task: handles, managers and phase state of one instance.
///
/// # Example
///
/// ```
/// use task_env::{ResolvedTask, TaskConfig};
/// use task_types::{Pose, Point3};
///
/// let mut task = ResolvedTask::bind(TaskConfig::rl()).unwrap();
///
/// let root = task.robot_root_default();
/// let ketchup = Pose::from_position(Point3::new(1.385, 1.602, 0.508));
/// let snap = task.snapshot(1, ketchup, root, [0.04, 0.04]);
///
/// let result = task.step(&snap, &[("reach", false)]).unwrap();
/// assert!(!result.termination.is_done());
/// ```
#[derive(Debug, Clone)]
pub struct ResolvedTask {
    config: TaskConfig,
    registry: SceneRegistry,
    robot: EntityHandle,
    object: EntityHandle,
    container: EntityHandle,
    gripper_joints: GripperJoints,
    actions: BoundActions,
    observations: ObservationPipeline,
    rewards: RewardManager,
    terminations: TerminationManager,
    curriculum: Curriculum,
    defaults: Vec<Option<Pose>>,
    container_pose: Pose,
    randomizers: Vec<BoundRandomizer>,
    tracker: PhaseTracker,
    goal_local: FrameTransform,
    common_step_counter: u64,
}

impl ResolvedTask {
    /// Validate `config`, resolve its names and build the managers.
    pub fn bind(config: TaskConfig) -> Result<Self> {
        config.validate()?;

        let registry = config.scene.registry()?;
        let robot = registry.resolve_kind(&config.scene.robot.name, EntityKind::Robot)?;
        let object = registry.resolve_kind(&config.tracked_object, EntityKind::Object)?;
        let container = registry.resolve_kind(&config.container, EntityKind::Container)?;
        let gripper_joints = config.scene.robot.gripper_joints(&config.gripper)?;
        let actions = config.actions.bind(&config.scene.robot.joint_positions())?;
        let observations = config.observations.policy.bind(&registry)?;

        let rewards = RewardManager::new(
            config.rewards.clone(),
            config.step_dt(),
            config.gripper.clone(),
        )?;
        let terminations = TerminationManager::new(
            config.terminations.clone(),
            config.timing.max_episode_steps(),
            config.gripper.clone(),
        )?;
        let curriculum = Curriculum::new(config.curriculum.clone(), &rewards)?;

        let mut defaults = vec![None; registry.len()];
        for (name, handle) in registry.iter() {
            defaults[handle.index()] = config.scene.initial_pose(name);
        }

        let randomizers = config
            .events
            .randomize
            .iter()
            .map(|event| -> Result<BoundRandomizer> {
                let handles = event
                    .assets
                    .iter()
                    .map(|asset| registry.resolve(asset))
                    .collect::<task_types::Result<Vec<_>>>()?;
                Ok(BoundRandomizer {
                    name: event.name.clone(),
                    handles,
                    range: event.pose_range,
                    min_separation: event.min_separation,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let sequence = config
            .subtasks
            .clone()
            .unwrap_or_else(SubtaskSequence::pick_place);
        let goal_local = config.command.ranges.center();
        let container_pose = defaults
            .get(container.index())
            .copied()
            .flatten()
            .unwrap_or_default();

        info!(
            entities = registry.len(),
            reward_terms = config.rewards.len(),
            max_episode_steps = terminations.max_episode_steps(),
            step_dt = config.step_dt(),
            "Task bound"
        );

        Ok(Self {
            registry,
            robot,
            object,
            container,
            gripper_joints,
            actions,
            observations,
            rewards,
            terminations,
            curriculum,
            defaults,
            container_pose,
            randomizers,
            tracker: PhaseTracker::new(sequence),
            goal_local,
            common_step_counter: 0,
            config,
        })
    }

    /// Start a new episode: choose reset poses and rewind the phase tracker.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> ResetState {
        let mut poses = if self.config.events.reset_to_default {
            self.defaults.clone()
        } else {
            vec![None; self.registry.len()]
        };

        for randomizer in &self.randomizers {
            let sampled = sample_object_poses(
                randomizer.handles.len(),
                randomizer.min_separation,
                &randomizer.range,
                rng,
                self.config.events.max_tries,
            );
            for (handle, pose) in randomizer.handles.iter().zip(sampled) {
                poses[handle.index()] = Some(pose);
            }
            debug!(event = %randomizer.name, "Reset randomizer applied");
        }

        if let Some(pose) = poses.get(self.container.index()).copied().flatten() {
            self.container_pose = pose;
        }
        self.tracker.reset();
        ResetState { poses }
    }

    /// Build a snapshot of the tracked object against the current goal.
    ///
    /// The container sits where the last reset put it (its scene pose before
    /// any reset); the end-effector, velocities and actions are left for the
    /// caller to fill in.
    #[must_use]
    pub fn snapshot(
        &self,
        step: u64,
        object: Pose,
        robot_root: Pose,
        gripper: [f64; 2],
    ) -> StepSnapshot {
        StepSnapshot::new(step, object, robot_root, self.goal_local, gripper)
            .with_container(self.container_pose)
    }

    /// Observation frame for the current goal with the robot at rest in its
    /// reset configuration. Callers overwrite the joint state and record
    /// entity poses.
    #[must_use]
    pub fn observation_frame(
        &self,
        robot_root: Pose,
        ee: Pose,
        gripper: [f64; 2],
    ) -> ObservationFrame {
        let defaults = self.config.scene.robot.joint_positions().values().to_vec();
        let velocities = vec![0.0; defaults.len()];
        ObservationFrame::new(robot_root, ee, gripper, self.goal_local)
            .with_joints(defaults.clone(), defaults, velocities)
            .with_last_action(vec![0.0; self.config.actions.dim()])
    }

    /// Compute the policy observation.
    pub fn observe<R: Rng + ?Sized>(
        &self,
        frame: &ObservationFrame,
        rng: &mut R,
    ) -> Result<Observation> {
        self.observations.compute(frame, rng)
    }

    /// Decode a raw policy action into arm and gripper commands.
    pub fn process_action(&self, action: &[f64]) -> Result<ProcessedAction> {
        self.actions.process(action)
    }

    /// Action terms bound to the robot's joints.
    #[must_use]
    pub const fn actions(&self) -> &BoundActions {
        &self.actions
    }

    /// Finger positions read from a full joint vector.
    #[must_use]
    pub fn read_gripper(&self, joints: &JointPositions) -> Option<[f64; 2]> {
        self.gripper_joints.read(joints)
    }

    /// Evaluate one step: curriculum, reward, termination, phase.
    ///
    /// The common step counter advances first, so a schedule with
    /// `num_steps = n` applies from step `n + 1` on.
    pub fn step<S: SignalSource + ?Sized>(
        &mut self,
        snap: &StepSnapshot,
        signals: &S,
    ) -> Result<StepResult> {
        if snap.check_finite().is_err() {
            warn!(step = snap.step, "Non-finite snapshot");
        }

        self.common_step_counter += 1;
        self.curriculum
            .update(self.common_step_counter, &mut self.rewards)?;

        let reward = self.rewards.compute(snap);
        let termination = self.terminations.check(snap);
        let phases_completed = self.tracker.observe(signals);

        Ok(StepResult {
            reward,
            termination,
            phase: self.tracker.phase(),
            phases_completed,
        })
    }

    /// Evaluate many independent instances in parallel. Does not touch the
    /// curriculum or phase state.
    #[must_use]
    pub fn evaluate_batch(&self, snapshots: &[StepSnapshot]) -> Vec<StepEvaluation> {
        evaluate_batch(&self.rewards, &self.terminations, snapshots)
    }

    /// Replace the goal, e.g. after a command resample.
    pub fn set_goal_local(&mut self, goal_local: FrameTransform) {
        self.goal_local = goal_local;
    }

    /// Current goal in the robot-root frame.
    #[must_use]
    pub const fn goal_local(&self) -> &FrameTransform {
        &self.goal_local
    }

    /// Container pose of the current episode.
    #[must_use]
    pub const fn container_pose(&self) -> &Pose {
        &self.container_pose
    }

    /// Reset pose of the robot root.
    #[must_use]
    pub fn robot_root_default(&self) -> Pose {
        self.defaults
            .get(self.robot.index())
            .copied()
            .flatten()
            .unwrap_or_default()
    }

    /// World position of the end-effector for a given hand body pose.
    #[must_use]
    pub fn ee_position(&self, hand: &Pose) -> Point3<f64> {
        self.config.scene.robot.ee_position(hand)
    }

    /// Resolve a scene entity by name.
    pub fn handle(&self, name: &str) -> Result<EntityHandle> {
        Ok(self.registry.resolve(name)?)
    }

    /// Robot handle.
    #[must_use]
    pub const fn robot(&self) -> EntityHandle {
        self.robot
    }

    /// Tracked object handle.
    #[must_use]
    pub const fn object(&self) -> EntityHandle {
        self.object
    }

    /// Container handle.
    #[must_use]
    pub const fn container(&self) -> EntityHandle {
        self.container
    }

    /// Scene registry.
    #[must_use]
    pub const fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    /// Reward manager with its current weights.
    #[must_use]
    pub const fn rewards(&self) -> &RewardManager {
        &self.rewards
    }

    /// Termination manager.
    #[must_use]
    pub const fn terminations(&self) -> &TerminationManager {
        &self.terminations
    }

    /// Phase tracker.
    #[must_use]
    pub const fn tracker(&self) -> &PhaseTracker {
        &self.tracker
    }

    /// Steps evaluated since binding, across episodes.
    #[must_use]
    pub const fn common_step_counter(&self) -> u64 {
        self.common_step_counter
    }

    /// The bound configuration.
    #[must_use]
    pub const fn config(&self) -> &TaskConfig {
        &self.config
    }
}
