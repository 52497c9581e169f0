//! Scene layout: robot, objects and their initial state.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use task_types::{
    EntityKind, GripperConfig, GripperJoints, JointPositions, Pose, SceneRegistry,
};

use crate::error::EnvError;
use crate::Result;

/// Initial pose as written in configuration files.
///
/// Orientation uses the simulator's `(w, x, y, z)` quaternion order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialPose {
    /// Position in meters.
    pub pos: [f64; 3],
    /// Orientation quaternion `(w, x, y, z)`.
    pub rot: [f64; 4],
}

impl InitialPose {
    /// Pose at `pos` with no rotation.
    #[must_use]
    pub const fn at(pos: [f64; 3]) -> Self {
        Self {
            pos,
            rot: [1.0, 0.0, 0.0, 0.0],
        }
    }

    /// Pose at `pos` with a `(w, x, y, z)` rotation.
    #[must_use]
    pub const fn new(pos: [f64; 3], rot: [f64; 4]) -> Self {
        Self { pos, rot }
    }

    /// Convert to a normalized [`Pose`].
    #[must_use]
    pub fn to_pose(&self) -> Pose {
        Pose::from_wxyz(self.pos, self.rot)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !self.pos.iter().chain(&self.rot).all(|v| v.is_finite()) {
            return Err(EnvError::invalid_config(format!(
                "{name}: initial pose must be finite"
            )));
        }
        let norm_sq: f64 = self.rot.iter().map(|v| v * v).sum();
        if norm_sq < 1e-12 {
            return Err(EnvError::invalid_config(format!(
                "{name}: initial rotation has zero norm"
            )));
        }
        Ok(())
    }
}

/// Articulated robot and its end-effector frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Scene name of the robot.
    pub name: String,
    /// Root pose at reset.
    pub init: InitialPose,
    /// Joint positions at reset, in articulation order.
    pub joint_pos: Vec<(String, f64)>,
    /// Body the end-effector frame is attached to.
    pub ee_body: String,
    /// End-effector offset in the body frame (meters).
    pub ee_offset: [f64; 3],
}

impl RobotConfig {
    /// Franka Panda on the desk, facing the objects.
    #[must_use]
    pub fn franka() -> Self {
        let joint_pos = [
            ("panda_joint1", 0.0),
            ("panda_joint2", -0.79),
            ("panda_joint3", 0.0),
            ("panda_joint4", -2.356),
            ("panda_joint5", 0.0),
            ("panda_joint6", 1.57),
            ("panda_joint7", 0.785),
            ("panda_finger_joint1", 0.04),
            ("panda_finger_joint2", 0.04),
        ]
        .into_iter()
        .map(|(n, v)| (n.to_owned(), v))
        .collect();

        Self {
            name: "robot".to_owned(),
            init: InitialPose::new(
                [1.53773, 1.88609, 0.42492],
                [0.707_106_78, 0.0, 0.0, -0.707_106_78],
            ),
            joint_pos,
            ee_body: "panda_hand".to_owned(),
            ee_offset: [0.0, 0.0, 0.1034],
        }
    }

    /// Joint positions at reset.
    #[must_use]
    pub fn joint_positions(&self) -> JointPositions {
        JointPositions::from_pairs(self.joint_pos.iter().map(|(n, v)| (n.as_str(), *v)))
    }

    /// Resolve the gripper finger joints in the reset joint list.
    pub fn gripper_joints(&self, gripper: &GripperConfig) -> Result<GripperJoints> {
        Ok(GripperJoints::resolve(
            &self.joint_positions(),
            &gripper.joint_names,
        )?)
    }

    /// World position of the end-effector given the world pose of [`ee_body`](Self::ee_body).
    #[must_use]
    pub fn ee_position(&self, body: &Pose) -> Point3<f64> {
        body.transform_point(&Point3::from(Vector3::from(self.ee_offset)))
    }
}

/// A non-robot scene entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Scene name.
    pub name: String,
    /// Role in the task.
    pub kind: EntityKind,
    /// Pose at reset. `None` for assets placed by the scene file.
    #[serde(default)]
    pub init: Option<InitialPose>,
}

impl EntityConfig {
    /// Create an entity with an initial pose.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: EntityKind, init: InitialPose) -> Self {
        Self {
            name: name.into(),
            kind,
            init: Some(init),
        }
    }

    /// Create a fixture placed by the scene file.
    #[must_use]
    pub fn fixture(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntityKind::Fixture,
            init: None,
        }
    }
}

/// The scene: parallel instance layout, robot and objects.
///
/// # Example
///
/// ```
/// use task_env::SceneConfig;
///
/// let scene = SceneConfig::desktop_organizer();
/// let registry = scene.registry().unwrap();
///
/// assert!(registry.resolve("ketchup").is_ok());
/// assert!(registry.resolve("mustard").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Number of parallel environment instances.
    pub num_envs: usize,
    /// Spacing between instance origins (meters).
    pub env_spacing: f64,
    /// The robot.
    pub robot: RobotConfig,
    /// Objects, containers and fixtures.
    pub entities: Vec<EntityConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::desktop_organizer()
    }
}

impl SceneConfig {
    /// Franka, three grocery items, a basket and the table.
    #[must_use]
    pub fn desktop_organizer() -> Self {
        let lying = [0.707_106_78, 0.707_106_78, 0.0, 0.0];
        Self {
            num_envs: 4096,
            env_spacing: 2.5,
            robot: RobotConfig::franka(),
            entities: vec![
                EntityConfig::new(
                    "orange_juice",
                    EntityKind::Object,
                    InitialPose::new([1.39764, 1.38226, 0.52], lying),
                ),
                EntityConfig::new(
                    "ketchup",
                    EntityKind::Object,
                    InitialPose::new([1.38508, 1.60167, 0.50771], lying),
                ),
                EntityConfig::new(
                    "cream_cheese",
                    EntityKind::Object,
                    InitialPose::new([1.1565, 1.46713, 0.45974], lying),
                ),
                EntityConfig::new(
                    "basket",
                    EntityKind::Container,
                    InitialPose::at([1.77, 1.48, 0.48]),
                ),
                EntityConfig::fixture("table"),
            ],
        }
    }

    /// Set the number of instances.
    #[must_use]
    pub const fn with_num_envs(mut self, num_envs: usize) -> Self {
        self.num_envs = num_envs;
        self
    }

    /// Look up a non-robot entity by name.
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&EntityConfig> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Reset pose of any entity, robot included.
    #[must_use]
    pub fn initial_pose(&self, name: &str) -> Option<Pose> {
        if name == self.robot.name {
            return Some(self.robot.init.to_pose());
        }
        self.entity(name).and_then(|e| e.init).map(|p| p.to_pose())
    }

    /// Register the robot and every entity. Fails on duplicate names.
    pub fn registry(&self) -> Result<SceneRegistry> {
        let mut registry = SceneRegistry::new();
        registry.register(self.robot.name.clone(), EntityKind::Robot)?;
        for entity in &self.entities {
            if entity.kind == EntityKind::Robot {
                return Err(EnvError::invalid_config(format!(
                    "{}: only one robot is supported",
                    entity.name
                )));
            }
            registry.register(entity.name.clone(), entity.kind)?;
        }
        debug!(entities = registry.len(), "Scene registered");
        Ok(registry)
    }

    /// Validate layout and initial state.
    pub fn validate(&self) -> Result<()> {
        if self.num_envs == 0 {
            return Err(EnvError::invalid_config("num_envs must be at least 1"));
        }
        if !(self.env_spacing.is_finite() && self.env_spacing > 0.0) {
            return Err(EnvError::invalid_config(format!(
                "env_spacing must be positive, got {}",
                self.env_spacing
            )));
        }
        self.robot.init.validate(&self.robot.name)?;
        if !self.robot.joint_pos.iter().all(|(_, v)| v.is_finite()) {
            return Err(EnvError::invalid_config("robot joint positions must be finite"));
        }
        for entity in &self.entities {
            if let Some(init) = &entity.init {
                init.validate(&entity.name)?;
            } else if entity.kind.is_movable() {
                return Err(EnvError::invalid_config(format!(
                    "{}: movable entities need an initial pose",
                    entity.name
                )));
            }
        }
        self.registry()?;
        Ok(())
    }
}
