//! Typed references to scene entities.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What role an entity plays in the task scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EntityKind {
    /// Articulated robot (the Franka arm).
    Robot,
    /// Graspable rigid object (ketchup, orange juice, ...).
    Object,
    /// Rigid object that receives placed objects (the basket).
    Container,
    /// Static scene geometry (table, ground).
    Fixture,
}

impl EntityKind {
    /// Whether the entity has a pose that is randomized or tracked per step.
    #[must_use]
    pub const fn is_movable(self) -> bool {
        matches!(self, Self::Robot | Self::Object | Self::Container)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Robot => write!(f, "robot"),
            Self::Object => write!(f, "object"),
            Self::Container => write!(f, "container"),
            Self::Fixture => write!(f, "fixture"),
        }
    }
}

/// Handle to an entity registered in a [`SceneRegistry`](crate::SceneRegistry).
///
/// Handles are cheap to copy and are only produced by the registry, so a
/// handle always refers to an entity that exists in that registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityHandle {
    index: u32,
    kind: EntityKind,
}

impl EntityHandle {
    pub(crate) const fn new(index: u32, kind: EntityKind) -> Self {
        Self { index, kind }
    }

    /// Position of the entity in registration order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Kind the entity was registered with.
    #[must_use]
    pub const fn kind(self) -> EntityKind {
        self.kind
    }
}

impl std::fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({}, {})", self.index, self.kind)
    }
}
