//! Registry of named faces, keyed by face identifier.

use crate::types::FaceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("registry storage: {0}")]
    Storage(String),
}

/// A stored face name with metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub face_id: FaceId,
    pub name: String,
    pub registered_at: DateTime<Utc>,
}

/// Mapping from face identifier to display name.
///
/// Entries are only created through [`register`](Self::register); re-registering
/// an identifier overwrites its name (last write wins, no history).
pub trait FaceRegistry {
    /// The registered name for `face_id`, if any.
    fn lookup(&self, face_id: &FaceId) -> Result<Option<String>, RegistryError>;

    /// Store `name` (trimmed) for `face_id`.
    ///
    /// Fails with [`RegistryError::EmptyName`] if the trimmed name is empty,
    /// leaving the registry unchanged.
    fn register(&mut self, face_id: &FaceId, name: &str) -> Result<(), RegistryError>;

    /// All registrations, oldest first.
    fn entries(&self) -> Result<Vec<Registration>, RegistryError>;

    /// Delete the registration for `face_id`. Returns whether one existed.
    fn remove(&mut self, face_id: &FaceId) -> Result<bool, RegistryError>;
}

/// Trim a user-supplied name, rejecting blank input.
pub fn normalize_name(name: &str) -> Result<&str, RegistryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::EmptyName);
    }
    Ok(trimmed)
}

/// Process-lifetime registry backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    entries: HashMap<FaceId, Registration>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FaceRegistry for InMemoryRegistry {
    fn lookup(&self, face_id: &FaceId) -> Result<Option<String>, RegistryError> {
        Ok(self.entries.get(face_id).map(|r| r.name.clone()))
    }

    fn register(&mut self, face_id: &FaceId, name: &str) -> Result<(), RegistryError> {
        let name = normalize_name(name)?;
        self.entries.insert(
            face_id.clone(),
            Registration {
                face_id: face_id.clone(),
                name: name.to_string(),
                registered_at: Utc::now(),
            },
        );
        Ok(())
    }

    fn entries(&self) -> Result<Vec<Registration>, RegistryError> {
        let mut all: Vec<Registration> = self.entries.values().cloned().collect();
        all.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.face_id.as_str().cmp(b.face_id.as_str()))
        });
        Ok(all)
    }

    fn remove(&mut self, face_id: &FaceId) -> Result<bool, RegistryError> {
        Ok(self.entries.remove(face_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn id(s: &str) -> FaceId {
        FaceId::new(s)
    }

    #[test]
    fn test_lookup_unknown_face() {
        let registry = InMemoryRegistry::new();
        assert_eq!(registry.lookup(&id("f1")), Ok(None));
    }

    #[test]
    fn test_register_then_lookup() {
        let mut registry = InMemoryRegistry::new();
        registry.register(&id("f1"), "Alice").unwrap();
        assert_eq!(registry.lookup(&id("f1")), Ok(Some("Alice".to_string())));
    }

    #[test]
    fn test_register_trims_name() {
        let mut registry = InMemoryRegistry::new();
        registry.register(&id("f1"), "  Alice \n").unwrap();
        assert_eq!(registry.lookup(&id("f1")), Ok(Some("Alice".to_string())));
    }

    #[test]
    fn test_last_write_wins() {
        let mut registry = InMemoryRegistry::new();
        registry.register(&id("f1"), "Alice").unwrap();
        registry.register(&id("f1"), "Bob").unwrap();
        assert_eq!(registry.lookup(&id("f1")), Ok(Some("Bob".to_string())));
        assert_eq!(registry.len(), 1);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn test_blank_name_rejected_and_registry_unchanged(#[case] name: &str) {
        let mut registry = InMemoryRegistry::new();
        registry.register(&id("f1"), "Alice").unwrap();

        assert_eq!(registry.register(&id("f1"), name), Err(RegistryError::EmptyName));
        assert_eq!(registry.register(&id("f2"), name), Err(RegistryError::EmptyName));

        assert_eq!(registry.lookup(&id("f1")), Ok(Some("Alice".to_string())));
        assert_eq!(registry.lookup(&id("f2")), Ok(None));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_entries_with_equal_timestamps_ordered_by_face_id() {
        let mut registry = InMemoryRegistry::new();
        let at = Utc::now();
        for face_id in ["f3", "f1", "f2"] {
            registry.entries.insert(
                id(face_id),
                Registration {
                    face_id: id(face_id),
                    name: face_id.to_uppercase(),
                    registered_at: at,
                },
            );
        }
        let order: Vec<String> = registry
            .entries()
            .unwrap()
            .into_iter()
            .map(|r| r.face_id.to_string())
            .collect();
        assert_eq!(order, vec!["f1", "f2", "f3"]);
    }

    #[test]
    fn test_entries_and_remove() {
        let mut registry = InMemoryRegistry::new();
        registry.register(&id("f1"), "Alice").unwrap();
        registry.register(&id("f2"), "Bob").unwrap();

        let names: Vec<String> = registry.entries().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"Alice".to_string()));

        assert_eq!(registry.remove(&id("f1")), Ok(true));
        assert_eq!(registry.remove(&id("f1")), Ok(false));
        assert_eq!(registry.lookup(&id("f1")), Ok(None));
        assert!(!registry.is_empty());
    }
}
