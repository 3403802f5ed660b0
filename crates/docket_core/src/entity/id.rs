//! Entity identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an entity.
///
/// Entity IDs are opaque strings that are:
/// - Unique within a record store
/// - Immutable once assigned
/// - Never reused
///
/// Fresh IDs are UUIDv4 strings; IDs handed out by the remote store (or
/// fixtures such as `"c1"`) are accepted verbatim.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Creates a new random entity ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Creates an entity ID from an existing string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_unique() {
        let id1 = EntityId::new();
        let id2 = EntityId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn fixed_id_roundtrip() {
        let id = EntityId::from("c1");
        assert_eq!(id.as_str(), "c1");
        assert_eq!(format!("{id}"), "c1");
    }

    #[test]
    fn ordering_is_lexicographic() {
        assert!(EntityId::from("a") < EntityId::from("b"));
    }

    #[test]
    fn serde_transparent() {
        let id = EntityId::from("c1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"c1\"");
        let back: EntityId = serde_json::from_str("\"c1\"").unwrap();
        assert_eq!(back, id);
    }
}
