//! Error types for task data operations.

use thiserror::Error;

use crate::entity::EntityKind;

/// Errors that can occur while building or reading task data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TaskError {
    /// No entity with this name is registered in the scene.
    #[error("entity not found: {name}")]
    EntityNotFound {
        /// Name that failed to resolve.
        name: String,
    },

    /// An entity with this name is already registered.
    #[error("duplicate entity: {name}")]
    DuplicateEntity {
        /// The duplicated name.
        name: String,
    },

    /// Entity resolved, but has the wrong kind for its use.
    #[error("entity {name} is a {actual}, expected {expected}")]
    KindMismatch {
        /// Entity name.
        name: String,
        /// Kind the caller asked for.
        expected: EntityKind,
        /// Kind the entity was registered with.
        actual: EntityKind,
    },

    /// Joint not present in the robot's joint list.
    #[error("joint not found: {name}")]
    JointNotFound {
        /// Name of the missing joint.
        name: String,
    },

    /// Joint names and values have different lengths.
    #[error("joint list mismatch: {names} names, {values} values")]
    JointCountMismatch {
        /// Number of names supplied.
        names: usize,
        /// Number of values supplied.
        values: usize,
    },

    /// Invalid gripper classification parameters.
    #[error("invalid gripper configuration: {reason}")]
    InvalidGripper {
        /// Description of what's wrong.
        reason: String,
    },

    /// Snapshot contains `NaN` or `Inf`.
    #[error("non-finite state: {reason}")]
    NonFinite {
        /// Which quantity was non-finite.
        reason: String,
    },
}

impl TaskError {
    /// Create an entity-not-found error.
    #[must_use]
    pub fn entity_not_found(name: impl Into<String>) -> Self {
        Self::EntityNotFound { name: name.into() }
    }

    /// Create a joint-not-found error.
    #[must_use]
    pub fn joint_not_found(name: impl Into<String>) -> Self {
        Self::JointNotFound { name: name.into() }
    }

    /// Create an invalid gripper configuration error.
    #[must_use]
    pub fn invalid_gripper(reason: impl Into<String>) -> Self {
        Self::InvalidGripper {
            reason: reason.into(),
        }
    }

    /// Create a non-finite state error.
    #[must_use]
    pub fn non_finite(reason: impl Into<String>) -> Self {
        Self::NonFinite {
            reason: reason.into(),
        }
    }

    /// Check if this is a name lookup failure (entity or joint).
    #[must_use]
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            Self::EntityNotFound { .. } | Self::JointNotFound { .. } | Self::KindMismatch { .. }
        )
    }
}
