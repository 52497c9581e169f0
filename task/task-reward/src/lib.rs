//! Reward shaping and episode termination for the desktop organizer task.
//!
//! # Kernels
//!
//! - [`score_progress`] - Normalized goal progress, gated on the object being lifted
//! - [`detect_hold_at_goal`] - Object at the goal but the gripper still closed
//! - [`object_ee_distance`], [`object_is_lifted`], [`object_goal_distance`],
//!   [`ContainerCheck`], [`action_rate_l2`], [`joint_vel_l2`] - Companion terms
//!
//! Kernels are pure functions of a [`StepSnapshot`](task_types::StepSnapshot):
//! no state is kept between calls and instances never interact.
//!
//! # Managers
//!
//! - [`RewardManager`] - Weighted sum of [`RewardTerm`]s, scaled by the step duration
//! - [`TerminationManager`] - ORs [`TerminationTerm`]s into terminated/truncated flags
//! - [`Curriculum`] - Switches term weights once training passes a step count
//! - [`evaluate_batch`] - Rayon-parallel evaluation over many instances
//!
//! # Example
//!
//! ```
//! use task_reward::{detect_hold_at_goal, score_progress};
//! use task_types::{Pose, Point3};
//!
//! let root = Pose::from_position(Point3::new(1.354, 1.258, 0.425));
//! let goal = Pose::from_position(Point3::new(0.406, 0.222, 0.375));
//!
//! // Ketchup still on the table: no progress reward
//! let ketchup = Pose::from_position(Point3::new(1.30, 1.45, 0.30));
//! assert_eq!(score_progress(&ketchup, &root, &goal, 0.8, 0.52, 1.0), 0.0);
//!
//! // Ketchup at the goal, fingers closed: release penalty fires
//! let ketchup = Pose::from_position(Point3::new(1.76, 1.48, 0.8));
//! assert!(detect_hold_at_goal(&ketchup, &root, &goal, 0.08, [0.0, 0.0], 0.04, 0.01));
//! ```

#![doc(html_root_url = "https://docs.rs/task-reward/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_errors_doc,   // Error docs added where non-obvious
    clippy::module_name_repetitions,
)]

mod batch;
mod curriculum;
mod error;
mod kernels;
mod manager;
mod progress;
mod release;
mod termination;
mod terms;

pub use batch::{evaluate_batch, score_progress_batch, StepEvaluation};
pub use curriculum::{pick_place_curriculum, Curriculum, WeightSchedule};
pub use error::RewardError;
pub use kernels::{
    action_rate_l2, joint_vel_l2, object_ee_distance, object_goal_distance, object_is_lifted,
    ContainerCheck,
};
pub use manager::{RewardBreakdown, RewardManager, TermValue};
pub use progress::{is_lifted, score_progress, ProgressScorer, DEFAULT_MAX_DISTANCE_NORM};
pub use release::{detect_hold_at_goal, ReleaseDetector};
pub use termination::{
    pick_place_terminations, TerminationKind, TerminationManager, TerminationOutcome,
    TerminationTerm,
};
pub use terms::{pick_place_terms, RewardKind, RewardTerm};

/// Result type for reward configuration.
pub type Result<T> = std::result::Result<T, RewardError>;
