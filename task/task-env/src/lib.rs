//! Scene, goal command, reset randomization and task presets for the
//! desktop organizer pick-and-place task.
//!
//! # Overview
//!
//! - [`SceneConfig`] - Franka robot, grocery items, basket and their reset poses
//! - [`PoseCommandConfig`] / [`PoseCommand`] - Goal pose in the robot-root frame
//! - [`ActionConfig`] - Relative IK arm action and binary gripper
//! - [`ObservationConfig`] - Policy observation terms
//! - [`EventConfig`] / [`sample_object_poses`] - Reset-time pose randomization
//! - [`TaskConfig`] - Everything above plus reward, termination and curriculum tables
//! - [`ResolvedTask`] - A configuration bound to its scene, ready to step
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use task_env::{ResolvedTask, TaskConfig};
//!
//! let mut task = ResolvedTask::bind(TaskConfig::mimic()).unwrap();
//! let mut rng = ChaCha8Rng::seed_from_u64(1);
//!
//! let reset = task.reset(&mut rng);
//! let ketchup = reset.pose(task.object()).unwrap();
//! assert!((1.315..=1.345).contains(&ketchup.position.x));
//! ```

#![doc(html_root_url = "https://docs.rs/task-env/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_errors_doc,   // Error docs added where non-obvious
    clippy::module_name_repetitions,
)]

mod actions;
mod command;
mod config;
mod error;
mod events;
mod observations;
mod resolved;
mod scene;

pub use actions::{
    ActionConfig, ArmActionConfig, BoundActions, DifferentialIkConfig, GripperActionConfig,
    IkCommandType, IkMethod, ProcessedAction,
};
pub use command::{PoseCommand, PoseCommandConfig};
pub use config::{TaskConfig, TimingConfig};
pub use error::EnvError;
pub use events::{sample_object_poses, EventConfig, PoseRange, RandomizeEvent, DEFAULT_MAX_TRIES};
pub use observations::{
    Observation, ObservationConfig, ObservationFrame, ObservationGroup, ObservationKind,
    ObservationPipeline, ObservationTerm,
};
pub use resolved::{ResetState, ResolvedTask, StepResult};
pub use scene::{EntityConfig, InitialPose, RobotConfig, SceneConfig};

/// Result type for task-env operations.
pub type Result<T> = std::result::Result<T, EnvError>;
