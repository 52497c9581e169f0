//! Error types for task-datagen.

use thiserror::Error;

/// Errors from sub-task configuration, segmentation and dataset splitting.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DatagenError {
    /// No sub-tasks configured.
    #[error("sub-task sequence is empty")]
    EmptySequence,

    /// A non-terminal sub-task has no termination signal.
    #[error("sub-task {index} ({description}) needs a termination signal")]
    MissingSignal {
        /// Position in the sequence.
        index: usize,
        /// Sub-task description.
        description: String,
    },

    /// The terminal sub-task declares a termination signal.
    #[error("terminal sub-task must not have a termination signal, found {signal}")]
    TerminalSignal {
        /// The unexpected signal.
        signal: String,
    },

    /// Offset range is inverted, or non-zero on the terminal sub-task.
    #[error("invalid offset range ({lo}, {hi}) for sub-task {index}")]
    InvalidOffsetRange {
        /// Position in the sequence.
        index: usize,
        /// Lower bound.
        lo: u32,
        /// Upper bound.
        hi: u32,
    },

    /// Two sub-tasks use the same termination signal.
    #[error("duplicate termination signal: {0}")]
    DuplicateSignal(String),

    /// A numeric parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Recorded demonstration has no trace for a signal.
    #[error("no trace recorded for signal {0}")]
    MissingTrace(String),

    /// A signal trace never rises from low to high.
    #[error("signal {0} never rises in the demonstration")]
    SignalNeverRaised(String),

    /// Sub-task boundaries do not strictly increase.
    #[error("sub-task {index} ends at step {end}, not after its start {start}")]
    OutOfOrder {
        /// Position in the sequence.
        index: usize,
        /// Segment start.
        start: usize,
        /// Segment end.
        end: usize,
    },

    /// A signal trace length differs from the trajectory length.
    #[error("signal {name} has {actual} steps, trajectory has {expected}")]
    TraceLengthMismatch {
        /// Signal name.
        name: String,
        /// Trajectory length.
        expected: usize,
        /// Trace length.
        actual: usize,
    },

    /// Train ratio outside `(0, 1)`.
    #[error("train ratio must be in (0, 1), got {0}")]
    InvalidSplitRatio(f64),
}

impl DatagenError {
    /// Whether the error comes from a recorded demonstration rather than configuration.
    #[must_use]
    pub fn is_demo_error(&self) -> bool {
        matches!(
            self,
            Self::MissingTrace(_)
                | Self::SignalNeverRaised(_)
                | Self::OutOfOrder { .. }
                | Self::TraceLengthMismatch { .. }
        )
    }
}
