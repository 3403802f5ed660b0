//! The filter engine: one narrowing pass over the record store.
//!
//! Criteria apply in a fixed order (text → status → date range → tags) so
//! performance is predictable and the cheapest, most selective filters run
//! first. Shape-invalid criteria are reported and skipped rather than
//! failing the whole view; unknown criterion keys are logged and ignored.
//! Sort runs once, after filtering, with an id tiebreak so equal-key items
//! order deterministically.

use crate::entity::Entity;
use crate::filter::criteria::{FilterCriteria, SortDirection, SortKey};
use crate::index::SearchIndex;
use crate::store::RecordStore;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

/// A criterion that failed its shape check and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriterionFault {
    /// The criterion field the fault is scoped to.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

/// Result of applying filter criteria.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// Matching entities in final sorted order.
    pub items: Vec<Entity>,
    /// Number of matching entities.
    pub matched_count: usize,
    /// Criteria that failed their shape check and did not participate.
    /// Unrelated criteria still applied.
    pub invalid: Vec<CriterionFault>,
    /// Generation of this query; compare with
    /// [`FilterEngine::latest_generation`] to detect supersession.
    pub generation: u64,
}

impl FilterOutcome {
    /// Returns true if every criterion passed its shape check.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }
}

/// Applies [`FilterCriteria`] to the record store, producing a view.
pub struct FilterEngine {
    store: Arc<RecordStore>,
    index: Arc<SearchIndex>,
    generation: AtomicU64,
}

impl FilterEngine {
    /// Creates an engine over a store and its search index.
    ///
    /// The index is expected to be subscribed to the store so text queries
    /// see the same snapshot the scans do.
    #[must_use]
    pub fn new(store: Arc<RecordStore>, index: Arc<SearchIndex>) -> Self {
        Self {
            store,
            index,
            generation: AtomicU64::new(0),
        }
    }

    /// Generation of the most recently started query.
    ///
    /// A caller holding a [`FilterOutcome`] whose `generation` is older
    /// than this has been superseded and should discard the result instead
    /// of rendering it.
    #[must_use]
    pub fn latest_generation(&self) -> u64 {
        self.generation.load(AtomicOrdering::SeqCst)
    }

    /// Applies criteria and returns the matching entities, sorted.
    pub fn apply(&self, criteria: &FilterCriteria) -> FilterOutcome {
        let generation = self.generation.fetch_add(1, AtomicOrdering::SeqCst) + 1;

        for key in criteria.unknown.keys() {
            tracing::warn!(criterion = %key, "ignoring unknown filter criterion");
        }

        let mut invalid = Vec::new();

        // Text first: the index narrows the candidate set without touching
        // non-matching entities at all.
        let mut items: Vec<Entity> = match criteria.effective_text() {
            Some(text) => {
                let ids = self.index.query(text);
                ids.iter().filter_map(|id| self.store.get(id)).collect()
            }
            None => self.store.all(),
        };

        if !criteria.statuses.is_empty() {
            items.retain(|entity| criteria.statuses.contains(&entity.status));
        }

        if let Some(range) = &criteria.updated_range {
            match range.validate("updated_range") {
                Ok(()) => items.retain(|entity| range.contains(entity.updated_at)),
                Err(err) => {
                    tracing::warn!(%err, "skipping invalid date range criterion");
                    invalid.push(CriterionFault {
                        field: "updated_range".to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }

        if !criteria.tags.is_empty() {
            items.retain(|entity| criteria.tags.iter().any(|tag| entity.has_tag(tag)));
        }

        let matched_count = items.len();
        sort_items(&mut items, &criteria.sort.key, criteria.sort.direction);

        FilterOutcome {
            items,
            matched_count,
            invalid,
            generation,
        }
    }
}

impl std::fmt::Debug for FilterEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterEngine")
            .field("generation", &self.latest_generation())
            .finish_non_exhaustive()
    }
}

fn sort_items(items: &mut [Entity], key: &SortKey, direction: SortDirection) {
    items.sort_by(|a, b| {
        let primary = match key {
            SortKey::UpdatedAt => directed(a.updated_at.cmp(&b.updated_at), direction),
            SortKey::Id => directed(a.id.cmp(&b.id), direction),
            SortKey::Status => directed(a.status.cmp(&b.status), direction),
            SortKey::Field(name) => match (a.field(name), b.field(name)) {
                // Missing values sort last regardless of direction.
                (Some(av), Some(bv)) => directed(av.sort_cmp(bv), direction),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };
        primary.then_with(|| a.id.cmp(&b.id))
    });
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::FieldValue;
    use crate::filter::criteria::DateRange;
    use crate::types::Timestamp;

    fn engine_with(entities: Vec<Entity>) -> FilterEngine {
        let store = Arc::new(RecordStore::new());
        let index = Arc::new(SearchIndex::default());
        store.subscribe(index.clone());
        for entity in entities {
            store.put(entity);
        }
        FilterEngine::new(store, index)
    }

    fn case(id: &str, status: &str, title: &str, at: u64) -> Entity {
        Entity::new(id, status)
            .with_text("title", title)
            .with_updated_at(Timestamp::from_millis(at))
    }

    fn item_ids(outcome: &FilterOutcome) -> Vec<&str> {
        outcome.items.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn empty_criteria_match_everything() {
        let engine = engine_with(vec![
            case("1", "new", "Contract A", 10),
            case("2", "accepted", "Dispute B", 20),
        ]);

        let outcome = engine.apply(&FilterCriteria::new());
        assert_eq!(outcome.matched_count, 2);
        assert!(outcome.is_valid());
        // Default sort: most recently updated first.
        assert_eq!(item_ids(&outcome), vec!["2", "1"]);
    }

    #[test]
    fn text_and_status_narrow_together() {
        let engine = engine_with(vec![
            case("1", "new", "Smith contract", 10),
            case("2", "accepted", "Smith dispute", 20),
            case("3", "new", "Jones contract", 30),
        ]);

        let criteria = FilterCriteria::new().with_text("smith").with_status("new");
        let outcome = engine.apply(&criteria);
        assert_eq!(item_ids(&outcome), vec!["1"]);
    }

    #[test]
    fn tag_filter_matches_any_listed_tag() {
        let engine = engine_with(vec![
            case("1", "new", "A", 1).with_tag("urgent"),
            case("2", "new", "B", 2).with_tag("pro-bono"),
            case("3", "new", "C", 3),
        ]);

        let criteria = FilterCriteria::new().with_tag("urgent").with_tag("pro-bono");
        let outcome = engine.apply(&criteria);
        assert_eq!(outcome.matched_count, 2);
        assert_eq!(item_ids(&outcome), vec!["2", "1"]);
    }

    #[test]
    fn date_range_narrows_by_updated_at() {
        let engine = engine_with(vec![
            case("1", "new", "A", 10),
            case("2", "new", "B", 20),
            case("3", "new", "C", 30),
        ]);

        let criteria = FilterCriteria::new().with_updated_range(DateRange::between(
            Timestamp::from_millis(15),
            Timestamp::from_millis(25),
        ));
        let outcome = engine.apply(&criteria);
        assert_eq!(item_ids(&outcome), vec!["2"]);
    }

    #[test]
    fn inverted_date_range_is_reported_not_applied() {
        let engine = engine_with(vec![
            case("1", "new", "A", 10),
            case("2", "accepted", "B", 20),
        ]);

        let criteria = FilterCriteria::new()
            .with_status("accepted")
            .with_updated_range(DateRange::between(
                Timestamp::from_millis(100),
                Timestamp::from_millis(1),
            ));
        let outcome = engine.apply(&criteria);

        assert!(!outcome.is_valid());
        assert_eq!(outcome.invalid.len(), 1);
        assert_eq!(outcome.invalid[0].field, "updated_range");
        // The status criterion still applied; the broken range did not
        // hide the remaining data.
        assert_eq!(item_ids(&outcome), vec!["2"]);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let engine = engine_with(vec![case("1", "new", "A", 10)]);

        let criteria: FilterCriteria =
            serde_json::from_str(r#"{"view_density": "compact"}"#).unwrap();
        let outcome = engine.apply(&criteria);
        assert_eq!(outcome.matched_count, 1);
        assert!(outcome.is_valid());
    }

    #[test]
    fn sort_ties_break_on_id() {
        let engine = engine_with(vec![
            case("b", "new", "Same", 50),
            case("a", "new", "Same", 50),
            case("c", "new", "Same", 50),
        ]);

        let ascending = engine.apply(
            &FilterCriteria::new().sorted_by(SortKey::UpdatedAt, SortDirection::Ascending),
        );
        assert_eq!(item_ids(&ascending), vec!["a", "b", "c"]);

        // The tiebreak does not flip with the direction.
        let descending = engine.apply(
            &FilterCriteria::new().sorted_by(SortKey::UpdatedAt, SortDirection::Descending),
        );
        assert_eq!(item_ids(&descending), vec!["a", "b", "c"]);
    }

    #[test]
    fn field_sort_puts_missing_values_last() {
        let engine = engine_with(vec![
            Entity::new("1", "new").with_field("amount", FieldValue::Number(5.0)),
            Entity::new("2", "new"),
            Entity::new("3", "new").with_field("amount", FieldValue::Number(1.0)),
        ]);

        let outcome = engine.apply(&FilterCriteria::new().sorted_by(
            SortKey::Field("amount".to_string()),
            SortDirection::Descending,
        ));
        assert_eq!(item_ids(&outcome), vec!["1", "3", "2"]);
    }

    #[test]
    fn apply_is_idempotent_for_same_snapshot() {
        let engine = engine_with(vec![
            case("1", "new", "Smith contract", 10),
            case("2", "accepted", "Smith dispute", 20),
            case("3", "new", "Jones filing", 30),
        ]);

        let criteria = FilterCriteria::new()
            .with_text("smith")
            .sorted_by(SortKey::Id, SortDirection::Ascending);
        let first = engine.apply(&criteria);
        let second = engine.apply(&criteria);
        assert_eq!(first.items, second.items);
        assert_eq!(first.matched_count, second.matched_count);
    }

    #[test]
    fn generations_increase_and_supersede() {
        let engine = engine_with(vec![case("1", "new", "A", 10)]);

        let first = engine.apply(&FilterCriteria::new());
        let second = engine.apply(&FilterCriteria::new());
        assert!(second.generation > first.generation);
        assert_eq!(engine.latest_generation(), second.generation);
        // The first outcome is stale and should be discarded by callers.
        assert_ne!(first.generation, engine.latest_generation());
    }
}
