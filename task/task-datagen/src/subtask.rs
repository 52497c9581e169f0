//! Sub-task configuration for demonstration generation.
//!
//! A demonstration is cut into an ordered list of sub-tasks. Each non-terminal
//! sub-task ends when its termination signal rises; the terminal one ends with
//! the episode.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::DatagenError;
use crate::Result;

/// How a source segment is chosen for each generated sub-task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Uniformly random source demonstration.
    Random,
    /// Pick among the `nn_k` demos whose reference object pose is closest.
    NearestNeighborObject {
        /// Neighbourhood size.
        nn_k: usize,
    },
    /// Pick among the `nn_k` demos whose end-effector pose is closest.
    NearestNeighborRobotDistance {
        /// Neighbourhood size.
        nn_k: usize,
    },
}

impl Default for SelectionStrategy {
    fn default() -> Self {
        Self::NearestNeighborObject { nn_k: 3 }
    }
}

impl SelectionStrategy {
    /// Neighbourhood size, if the strategy uses one.
    #[must_use]
    pub const fn k(self) -> Option<usize> {
        match self {
            Self::Random => None,
            Self::NearestNeighborObject { nn_k } | Self::NearestNeighborRobotDistance { nn_k } => {
                Some(nn_k)
            }
        }
    }
}

/// One sub-task of a manipulation episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskConfig {
    /// Scene entity the sub-task's motion is expressed relative to.
    pub object_ref: String,
    /// Signal marking the end of this sub-task. `None` for the terminal sub-task.
    pub term_signal: Option<String>,
    /// Random offset range (steps) added to the detected end boundary.
    pub term_offset_range: (u32, u32),
    /// Source segment selection.
    pub selection_strategy: SelectionStrategy,
    /// Action noise magnitude applied while executing the segment.
    pub action_noise: f64,
    /// Interpolation steps used to bridge into the segment start.
    pub num_interpolation_steps: u32,
    /// Extra steps holding the segment start pose.
    pub num_fixed_steps: u32,
    /// Whether action noise is also applied during interpolation.
    pub apply_noise_during_interpolation: bool,
    /// Human-readable description.
    pub description: String,
    /// Description of the sub-task that follows, if any.
    #[serde(default)]
    pub next_subtask_description: Option<String>,
}

impl SubtaskConfig {
    /// Create a sub-task with the task's default datagen parameters.
    ///
    /// Offsets `(3, 8)`, nearest-neighbour k = 3, noise 0.03, 5 interpolation
    /// steps, no fixed steps, no noise during interpolation.
    #[must_use]
    pub fn new(
        object_ref: impl Into<String>,
        term_signal: Option<&str>,
        description: impl Into<String>,
    ) -> Self {
        let terminal = term_signal.is_none();
        Self {
            object_ref: object_ref.into(),
            term_signal: term_signal.map(str::to_owned),
            term_offset_range: if terminal { (0, 0) } else { (3, 8) },
            selection_strategy: SelectionStrategy::default(),
            action_noise: 0.03,
            num_interpolation_steps: 5,
            num_fixed_steps: 0,
            apply_noise_during_interpolation: false,
            description: description.into(),
            next_subtask_description: None,
        }
    }

    /// Set the description of the following sub-task.
    #[must_use]
    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next_subtask_description = Some(next.into());
        self
    }

    /// Set the offset range.
    #[must_use]
    pub const fn with_offset_range(mut self, lo: u32, hi: u32) -> Self {
        self.term_offset_range = (lo, hi);
        self
    }

    /// Set the action noise.
    #[must_use]
    pub const fn with_action_noise(mut self, action_noise: f64) -> Self {
        self.action_noise = action_noise;
        self
    }

    /// Whether this sub-task ends the episode.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.term_signal.is_none()
    }

    fn validate(&self, index: usize, terminal: bool) -> Result<()> {
        match (&self.term_signal, terminal) {
            (None, false) => {
                return Err(DatagenError::MissingSignal {
                    index,
                    description: self.description.clone(),
                })
            }
            (Some(signal), true) => {
                return Err(DatagenError::TerminalSignal {
                    signal: signal.clone(),
                })
            }
            _ => {}
        }

        let (lo, hi) = self.term_offset_range;
        if lo > hi || (terminal && (lo, hi) != (0, 0)) {
            return Err(DatagenError::InvalidOffsetRange { index, lo, hi });
        }
        if !self.action_noise.is_finite() || self.action_noise < 0.0 {
            return Err(DatagenError::InvalidParameter(format!(
                "sub-task {index}: action noise must be non-negative, got {}",
                self.action_noise
            )));
        }
        if self.selection_strategy.k() == Some(0) {
            return Err(DatagenError::InvalidParameter(format!(
                "sub-task {index}: nearest-neighbour k must be at least 1"
            )));
        }
        Ok(())
    }
}

/// Ordered sub-tasks for one end-effector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskSequence {
    /// End-effector the sub-tasks are generated for.
    pub eef_name: String,
    /// Sub-tasks in execution order. The last one is terminal.
    pub subtasks: Vec<SubtaskConfig>,
}

impl SubtaskSequence {
    /// Create and validate a sequence.
    pub fn new(eef_name: impl Into<String>, subtasks: Vec<SubtaskConfig>) -> Result<Self> {
        let seq = Self {
            eef_name: eef_name.into(),
            subtasks,
        };
        seq.validate()?;
        Ok(seq)
    }

    /// Reach, grasp and lift the ketchup, then place it in the basket.
    #[must_use]
    pub fn pick_place() -> Self {
        Self {
            eef_name: "franka".to_owned(),
            subtasks: vec![
                SubtaskConfig::new("ketchup", Some("reach"), "Reach ketchup")
                    .with_next("Grasp ketchup"),
                SubtaskConfig::new("ketchup", Some("grasp"), "Grasp ketchup")
                    .with_next("Lift ketchup"),
                SubtaskConfig::new("ketchup", Some("lift"), "Lift ketchup")
                    .with_next("Place ketchup into basket"),
                SubtaskConfig::new("basket", None, "Place ketchup into basket"),
            ],
        }
    }

    /// Check the signal and offset contract of every sub-task.
    pub fn validate(&self) -> Result<()> {
        if self.subtasks.is_empty() {
            return Err(DatagenError::EmptySequence);
        }
        let last = self.subtasks.len() - 1;
        let mut seen = HashSet::new();
        for (i, subtask) in self.subtasks.iter().enumerate() {
            subtask.validate(i, i == last)?;
            if let Some(signal) = &subtask.term_signal {
                if !seen.insert(signal.as_str()) {
                    return Err(DatagenError::DuplicateSignal(signal.clone()));
                }
            }
        }
        Ok(())
    }

    /// Number of sub-tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subtasks.len()
    }

    /// Whether the sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subtasks.is_empty()
    }

    /// Termination signals of the non-terminal sub-tasks, in order.
    pub fn signals(&self) -> impl Iterator<Item = &str> {
        self.subtasks
            .iter()
            .filter_map(|s| s.term_signal.as_deref())
    }

    /// Names of every entity referenced by a sub-task.
    pub fn object_refs(&self) -> impl Iterator<Item = &str> {
        self.subtasks.iter().map(|s| s.object_ref.as_str())
    }
}
