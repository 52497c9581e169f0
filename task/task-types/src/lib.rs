//! Core types for the desktop organizer manipulation task.
//!
//! This crate provides the data the task logic operates on:
//!
//! - [`Pose`] / [`FrameTransform`] - Position and orientation, frame composition
//! - [`EntityHandle`] / [`SceneRegistry`] - Typed scene references resolved once by name
//! - [`JointPositions`] / [`GripperJoints`] - Ordered robot joint state
//! - [`GripperConfig`] / [`GripperState`] - Open/closed classification of the two-finger gripper
//! - [`StepSnapshot`] - Immutable per-step world state handed to the reward kernels
//!
//! # Design Philosophy
//!
//! These types are **pure data**. The simulator produces a [`StepSnapshot`] every
//! step; reward, termination and phase logic read it and never reach back into
//! the simulator. Scene entities are looked up by name exactly once, at
//! configuration time, and carried as [`EntityHandle`]s afterwards.
//!
//! # Coordinate System
//!
//! - X: right
//! - Y: forward
//! - Z: up
//! - Right-handed, meters
//!
//! Quaternions read from configuration use the simulator's `(w, x, y, z)` order.
//!
//! # Example
//!
//! ```
//! use task_types::{Pose, Point3};
//!
//! let root = Pose::from_position(Point3::new(1.0, 2.0, 0.5));
//! let goal_local = Pose::from_position(Point3::new(0.5, 0.0, 0.25));
//!
//! let goal_world = root.compose(&goal_local);
//! assert_eq!(goal_world.position, Point3::new(1.5, 2.0, 0.75));
//! ```

#![doc(html_root_url = "https://docs.rs/task-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod entity;
mod error;
mod joint;
mod pose;
mod registry;
mod snapshot;

pub use entity::{EntityHandle, EntityKind};
pub use error::TaskError;
pub use joint::{GripperConfig, GripperJoints, GripperState, JointPositions};
pub use pose::{FrameTransform, Pose};
pub use registry::SceneRegistry;
pub use snapshot::StepSnapshot;

// Re-export math types for convenience
pub use nalgebra::{Point3, UnitQuaternion, Vector3};

/// Result type for task type operations.
pub type Result<T> = std::result::Result<T, TaskError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_follows_robot_root() {
        let goal_local = Pose::from_position(Point3::new(0.406, 0.222, 0.375));

        let root_a = Pose::from_position(Point3::new(1.0, 1.0, 0.4));
        let root_b = Pose::from_position(Point3::new(2.0, 1.0, 0.4));

        let goal_a = root_a.compose(&goal_local);
        let goal_b = root_b.compose(&goal_local);

        assert!((goal_b.position.x - goal_a.position.x - 1.0).abs() < 1e-12);
        assert!((goal_b.position.y - goal_a.position.y).abs() < 1e-12);
    }
}
