//! Filter criteria: a pure, serializable description of a list view.

use crate::entity::Status;
use crate::error::{CoreError, CoreResult};
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// The field a view is sorted by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Last remote modification time.
    UpdatedAt,
    /// Entity id.
    Id,
    /// Workflow status.
    Status,
    /// A named entry of the open field map.
    Field(String),
}

/// Sort field and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Primary sort key. Ties always break on entity id, ascending.
    pub key: SortKey,
    /// Direction applied to the primary key.
    pub direction: SortDirection,
}

impl SortSpec {
    /// Creates a sort spec.
    #[must_use]
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            key: SortKey::UpdatedAt,
            direction: SortDirection::Descending,
        }
    }
}

/// Inclusive range over `updated_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    /// Inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Timestamp>,
    /// Inclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Timestamp>,
}

impl DateRange {
    /// Creates a range with both bounds.
    #[must_use]
    pub const fn between(from: Timestamp, to: Timestamp) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Creates a range open at the top.
    #[must_use]
    pub const fn since(from: Timestamp) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    /// Creates a range open at the bottom.
    #[must_use]
    pub const fn until(to: Timestamp) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }

    /// Shape check: `from` must not be after `to`.
    pub fn validate(&self, field: &str) -> CoreResult<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(CoreError::validation(
                    field,
                    format!("from ({from}) is after to ({to})"),
                ));
            }
        }
        Ok(())
    }

    /// Returns true if the timestamp falls inside the range.
    #[must_use]
    pub fn contains(&self, at: Timestamp) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
    }
}

/// A pure, serializable description of a filtered list view.
///
/// Identical criteria applied to the same store snapshot always yield the
/// same ordered result. Keys this version does not know (serialized by a
/// newer or older UI build) are preserved in `unknown` and ignored with a
/// warning by the engine, never treated as an error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Search text; empty or whitespace-only means "match everything".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Statuses to include; empty means no status filter.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub statuses: BTreeSet<Status>,
    /// Tags to match (an entity matches if it carries any of them);
    /// empty means no tag filter.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    /// Range filter over `updated_at`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_range: Option<DateRange>,
    /// Sort field and direction.
    #[serde(default)]
    pub sort: SortSpec,
    /// Criterion keys this version does not recognize.
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_json::Value>,
}

impl FilterCriteria {
    /// Creates empty criteria (match everything, default sort).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Adds a status to the status filter.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<Status>) -> Self {
        self.statuses.insert(status.into());
        self
    }

    /// Adds a tag to the tag filter.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Sets the `updated_at` range filter.
    #[must_use]
    pub fn with_updated_range(mut self, range: DateRange) -> Self {
        self.updated_range = Some(range);
        self
    }

    /// Sets the sort spec.
    #[must_use]
    pub fn sorted_by(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort = SortSpec::new(key, direction);
        self
    }

    /// Returns the search text if it is non-empty after trimming.
    #[must_use]
    pub fn effective_text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_range_validation() {
        let ok = DateRange::between(Timestamp::from_millis(1), Timestamp::from_millis(2));
        assert!(ok.validate("updated_range").is_ok());

        let bad = DateRange::between(Timestamp::from_millis(2), Timestamp::from_millis(1));
        let err = bad.validate("updated_range").unwrap_err();
        assert!(err.to_string().contains("updated_range"));
    }

    #[test]
    fn date_range_bounds_are_inclusive() {
        let range = DateRange::between(Timestamp::from_millis(10), Timestamp::from_millis(20));
        assert!(range.contains(Timestamp::from_millis(10)));
        assert!(range.contains(Timestamp::from_millis(20)));
        assert!(!range.contains(Timestamp::from_millis(9)));
        assert!(!range.contains(Timestamp::from_millis(21)));
    }

    #[test]
    fn open_ranges() {
        assert!(DateRange::since(Timestamp::from_millis(5)).contains(Timestamp::from_millis(999)));
        assert!(DateRange::until(Timestamp::from_millis(5)).contains(Timestamp::from_millis(0)));
    }

    #[test]
    fn effective_text_trims_whitespace() {
        assert_eq!(FilterCriteria::new().effective_text(), None);
        assert_eq!(
            FilterCriteria::new().with_text("   ").effective_text(),
            None
        );
        assert_eq!(
            FilterCriteria::new().with_text(" smith ").effective_text(),
            Some("smith")
        );
    }

    #[test]
    fn serde_roundtrip_preserves_unknown_keys() {
        let json = r#"{
            "text": "smith",
            "statuses": ["new", "accepted"],
            "view_density": "compact"
        }"#;
        let criteria: FilterCriteria = serde_json::from_str(json).unwrap();
        assert_eq!(criteria.effective_text(), Some("smith"));
        assert_eq!(criteria.statuses.len(), 2);
        assert!(criteria.unknown.contains_key("view_density"));

        let back = serde_json::to_string(&criteria).unwrap();
        assert!(back.contains("view_density"));
    }

    #[test]
    fn default_sort_is_recent_first() {
        let criteria = FilterCriteria::new();
        assert_eq!(criteria.sort.key, SortKey::UpdatedAt);
        assert_eq!(criteria.sort.direction, SortDirection::Descending);
    }
}
