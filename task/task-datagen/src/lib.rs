//! Sub-task decomposition and demonstration data tooling for the desktop
//! organizer task.
//!
//! - [`SubtaskSequence`] - Ordered sub-tasks with termination signals and offsets
//! - [`PhaseTracker`] - Reach, grasp, lift, place state machine over live signals
//! - [`segment_boundaries`] - Cut a recorded demonstration into sub-task segments
//! - [`DatagenConfig`] - Generation settings for the external data generator
//! - [`DemoSplit`] - Train/validation masks over generated demonstrations
//!
//! # Example
//!
//! ```
//! use task_datagen::{Phase, PhaseTracker, SubtaskSequence};
//!
//! let mut tracker = PhaseTracker::new(SubtaskSequence::pick_place());
//! tracker.observe(&[("reach", true), ("grasp", true)]);
//! assert_eq!(tracker.phase(), Some(Phase::Lift));
//! ```

#![doc(html_root_url = "https://docs.rs/task-datagen/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_errors_doc,   // Error docs added where non-obvious
    clippy::module_name_repetitions,
)]

mod datagen;
mod error;
mod phase;
mod segment;
mod split;
mod subtask;

pub use datagen::DatagenConfig;
pub use error::DatagenError;
pub use phase::{Phase, PhaseTracker, SignalSource};
pub use segment::{first_rise, segment_boundaries, SubtaskSegment};
pub use split::{DemoMask, DemoSplit};
pub use subtask::{SelectionStrategy, SubtaskConfig, SubtaskSequence};

/// Result type for task-datagen operations.
pub type Result<T> = std::result::Result<T, DatagenError>;
