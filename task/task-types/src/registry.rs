//! Name-to-handle resolution for scene entities.

use std::collections::HashMap;

use crate::entity::{EntityHandle, EntityKind};
use crate::error::TaskError;
use crate::Result;

/// Registry of named scene entities.
///
/// Names are resolved here once, when a task is configured. Everything that
/// runs per step works with [`EntityHandle`]s.
///
/// # Example
///
/// ```
/// use task_types::{EntityKind, SceneRegistry};
///
/// let mut registry = SceneRegistry::new();
/// registry.register("robot", EntityKind::Robot).unwrap();
/// let ketchup = registry.register("ketchup", EntityKind::Object).unwrap();
///
/// assert_eq!(registry.resolve("ketchup").unwrap(), ketchup);
/// assert!(registry.resolve("mustard").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SceneRegistry {
    names: Vec<String>,
    handles: Vec<EntityHandle>,
    lookup: HashMap<String, EntityHandle>,
}

impl SceneRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new entity and return its handle.
    pub fn register(&mut self, name: impl Into<String>, kind: EntityKind) -> Result<EntityHandle> {
        let name = name.into();
        if self.lookup.contains_key(&name) {
            return Err(TaskError::DuplicateEntity { name });
        }

        #[allow(clippy::cast_possible_truncation)]
        let handle = EntityHandle::new(self.handles.len() as u32, kind);
        self.lookup.insert(name.clone(), handle);
        self.names.push(name);
        self.handles.push(handle);
        Ok(handle)
    }

    /// Resolve a name to its handle.
    pub fn resolve(&self, name: &str) -> Result<EntityHandle> {
        self.lookup
            .get(name)
            .copied()
            .ok_or_else(|| TaskError::entity_not_found(name))
    }

    /// Resolve a name and check that it has the expected kind.
    pub fn resolve_kind(&self, name: &str, expected: EntityKind) -> Result<EntityHandle> {
        let handle = self.resolve(name)?;
        if handle.kind() == expected {
            Ok(handle)
        } else {
            Err(TaskError::KindMismatch {
                name: name.to_owned(),
                expected,
                actual: handle.kind(),
            })
        }
    }

    /// Name an entity was registered under.
    #[must_use]
    pub fn name(&self, handle: EntityHandle) -> Option<&str> {
        self.names.get(handle.index()).map(String::as_str)
    }

    /// Number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Iterate `(name, handle)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, EntityHandle)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.handles.iter().copied())
    }

    /// Handles of every entity with the given kind.
    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = EntityHandle> + '_ {
        self.handles.iter().copied().filter(move |h| h.kind() == kind)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn scene() -> SceneRegistry {
        let mut registry = SceneRegistry::new();
        registry.register("robot", EntityKind::Robot).unwrap();
        registry.register("ketchup", EntityKind::Object).unwrap();
        registry.register("orange_juice", EntityKind::Object).unwrap();
        registry.register("basket", EntityKind::Container).unwrap();
        registry
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = scene();
        assert_eq!(registry.len(), 4);

        let basket = registry.resolve("basket").unwrap();
        assert_eq!(basket.kind(), EntityKind::Container);
        assert_eq!(registry.name(basket), Some("basket"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = scene();
        let err = registry.register("ketchup", EntityKind::Object).unwrap_err();
        assert!(matches!(err, TaskError::DuplicateEntity { .. }));
    }

    #[test]
    fn test_unknown_name() {
        let registry = scene();
        let err = registry.resolve("cream_cheese").unwrap_err();
        assert!(err.is_lookup_error());
    }

    #[test]
    fn test_resolve_kind_mismatch() {
        let registry = scene();
        assert!(registry.resolve_kind("ketchup", EntityKind::Object).is_ok());
        let err = registry
            .resolve_kind("basket", EntityKind::Object)
            .unwrap_err();
        assert!(matches!(err, TaskError::KindMismatch { .. }));
    }

    #[test]
    fn test_of_kind() {
        let registry = scene();
        assert_eq!(registry.of_kind(EntityKind::Object).count(), 2);
        let names: Vec<_> = registry.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["robot", "ketchup", "orange_juice", "basket"]);
    }
}
