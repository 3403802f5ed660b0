//! The entity record and its field values.

use crate::entity::EntityId;
use crate::types::{Timestamp, Version};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A workflow status value.
///
/// Statuses are opaque, case-preserving strings compared exactly. The set
/// of valid statuses and the legal transitions between them live in the
/// workflow configuration, not here.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(String);

impl Status {
    /// Creates a status from a string.
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    /// Returns the status as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Status({})", self.0)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Status {
    fn from(status: &str) -> Self {
        Self(status.to_string())
    }
}

impl From<String> for Status {
    fn from(status: String) -> Self {
        Self(status)
    }
}

impl AsRef<str> for Status {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A value in the open field map of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Free text (titles, names, notes).
    Text(String),
    /// Numeric value (amounts, counts).
    Number(f64),
    /// Boolean flag.
    Flag(bool),
    /// A date, as epoch milliseconds.
    Date(Timestamp),
}

impl FieldValue {
    /// Returns the text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the date, if this is a date value.
    #[must_use]
    pub fn as_date(&self) -> Option<Timestamp> {
        match self {
            FieldValue::Date(t) => Some(*t),
            _ => None,
        }
    }

    /// Total order used by the filter engine's sort pass.
    ///
    /// Values of the same variant compare by content (`f64` via
    /// `total_cmp`); values of different variants compare by variant rank
    /// so mixed-type fields still order deterministically.
    #[must_use]
    pub fn sort_cmp(&self, other: &FieldValue) -> Ordering {
        use FieldValue::{Date, Flag, Number, Text};
        match (self, other) {
            (Text(a), Text(b)) => a.cmp(b),
            (Number(a), Number(b)) => a.total_cmp(b),
            (Flag(a), Flag(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            FieldValue::Text(_) => 0,
            FieldValue::Number(_) => 1,
            FieldValue::Flag(_) => 2,
            FieldValue::Date(_) => 3,
        }
    }
}

/// A case or client record.
///
/// Entities are value types: the record store replaces them wholesale on
/// `put`, so mutation helpers here return new records rather than editing
/// in place. `BTreeMap`/`BTreeSet` keep field and tag iteration
/// deterministic, which the filter engine relies on for stable ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Immutable identifier.
    pub id: EntityId,
    /// Current workflow status.
    pub status: Status,
    /// Open field map (title, client name, amounts, dates, ...).
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    /// Tag set.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Last confirmed remote version.
    pub version: Version,
    /// Last remote modification time.
    #[serde(rename = "updatedAt")]
    pub updated_at: Timestamp,
}

impl Entity {
    /// Creates an entity with the given id and status and no fields.
    pub fn new(id: impl Into<EntityId>, status: impl Into<Status>) -> Self {
        Self {
            id: id.into(),
            status: status.into(),
            fields: BTreeMap::new(),
            tags: BTreeSet::new(),
            version: Version::INITIAL,
            updated_at: Timestamp::default(),
        }
    }

    /// Returns a field value by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Returns the text content of a field, if present and textual.
    #[must_use]
    pub fn text_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_text)
    }

    /// Returns true if the entity carries the tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Returns a copy with the field set.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Returns a copy with a text field set.
    #[must_use]
    pub fn with_text(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_field(name, FieldValue::Text(text.into()))
    }

    /// Returns a copy with the tag added.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Returns a copy with the version set.
    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Returns a copy with the update time set.
    #[must_use]
    pub fn with_updated_at(mut self, at: Timestamp) -> Self {
        self.updated_at = at;
        self
    }
}

/// Payload for creating a new entity.
///
/// The id and version are assigned by the pipeline; the draft carries only
/// user-provided content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDraft {
    /// Initial workflow status.
    pub status: Status,
    /// Open field map.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    /// Tag set.
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl EntityDraft {
    /// Creates a draft with the given initial status.
    pub fn new(status: impl Into<Status>) -> Self {
        Self {
            status: status.into(),
            fields: BTreeMap::new(),
            tags: BTreeSet::new(),
        }
    }

    /// Returns a copy with a text field set.
    #[must_use]
    pub fn with_text(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.fields.insert(name.into(), FieldValue::Text(text.into()));
        self
    }

    /// Returns a copy with the tag added.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Materializes the draft into an entity with the given id.
    #[must_use]
    pub fn into_entity(self, id: EntityId) -> Entity {
        Entity {
            id,
            status: self.status,
            fields: self.fields,
            tags: self.tags,
            version: Version::INITIAL,
            updated_at: Timestamp::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields_and_tags() {
        let entity = Entity::new("c1", "new")
            .with_text("title", "Contract A")
            .with_tag("priority");

        assert_eq!(entity.text_field("title"), Some("Contract A"));
        assert!(entity.has_tag("priority"));
        assert!(!entity.has_tag("archived"));
        assert_eq!(entity.version, Version::INITIAL);
    }

    #[test]
    fn field_value_sort_order() {
        let a = FieldValue::Text("alpha".into());
        let b = FieldValue::Text("beta".into());
        assert_eq!(a.sort_cmp(&b), Ordering::Less);

        let n1 = FieldValue::Number(1.5);
        let n2 = FieldValue::Number(2.0);
        assert_eq!(n1.sort_cmp(&n2), Ordering::Less);

        // Mixed variants order by rank, text first.
        assert_eq!(a.sort_cmp(&n1), Ordering::Less);
    }

    #[test]
    fn nan_ordering_is_total() {
        let nan = FieldValue::Number(f64::NAN);
        let one = FieldValue::Number(1.0);
        // total_cmp puts NaN after all finite values; either way it must
        // be consistent in both directions.
        let forward = nan.sort_cmp(&one);
        let backward = one.sort_cmp(&nan);
        assert_eq!(forward, backward.reverse());
    }

    #[test]
    fn entity_serde_roundtrip() {
        let entity = Entity::new("c1", "accepted")
            .with_text("title", "Contract A")
            .with_field("amount", FieldValue::Number(120.5))
            .with_field("filed", FieldValue::Date(Timestamp::from_millis(1_000)))
            .with_tag("commercial")
            .with_version(Version::new(3))
            .with_updated_at(Timestamp::from_millis(9_000));

        let json = serde_json::to_string(&entity).unwrap();
        assert!(json.contains("\"updatedAt\""));
        let back: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entity);
    }

    #[test]
    fn draft_materializes_with_initial_version() {
        let draft = EntityDraft::new("new").with_text("title", "Dispute B");
        let entity = draft.into_entity(EntityId::from("d1"));
        assert_eq!(entity.id.as_str(), "d1");
        assert_eq!(entity.status.as_str(), "new");
        assert_eq!(entity.version, Version::INITIAL);
    }
}
