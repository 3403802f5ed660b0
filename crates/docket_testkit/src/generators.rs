//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data that maintains
//! required invariants (statuses drawn from the configured workflow,
//! timestamps within sane bounds).

use docket_core::{
    DateRange, Entity, EntityId, FieldValue, FilterCriteria, SortDirection, SortKey, Status,
    Timestamp, Version,
};
use proptest::prelude::*;

/// Strategy for short lowercase identifiers.
fn ident() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9]{0,11}").expect("Invalid regex")
}

/// Strategy for entity ids.
pub fn entity_id_strategy() -> impl Strategy<Value = EntityId> {
    prop::string::string_regex("[a-z0-9]{4,12}")
        .expect("Invalid regex")
        .prop_map(EntityId::from)
}

/// Strategy for statuses of the standard legal-practice workflow.
pub fn status_strategy() -> impl Strategy<Value = Status> {
    prop::sample::select(vec![
        "new",
        "accepted",
        "investigation",
        "preparation",
        "negotiation",
        "trial",
        "completed",
    ])
    .prop_map(Status::from)
}

/// Strategy for timestamps.
pub fn timestamp_strategy() -> impl Strategy<Value = Timestamp> {
    (0u64..10_000_000).prop_map(Timestamp::from_millis)
}

/// Strategy for field values.
pub fn field_value_strategy() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        prop::string::string_regex("[A-Za-z ]{0,24}")
            .expect("Invalid regex")
            .prop_map(FieldValue::Text),
        prop::num::f64::NORMAL.prop_map(FieldValue::Number),
        any::<bool>().prop_map(FieldValue::Flag),
        timestamp_strategy().prop_map(FieldValue::Date),
    ]
}

/// Strategy for entities with up to four fields and three tags.
pub fn entity_strategy() -> impl Strategy<Value = Entity> {
    (
        entity_id_strategy(),
        status_strategy(),
        prop::collection::btree_map(ident(), field_value_strategy(), 0..4),
        prop::collection::btree_set(ident(), 0..3),
        0u64..100,
        timestamp_strategy(),
    )
        .prop_map(|(id, status, fields, tags, version, updated_at)| Entity {
            id,
            status,
            fields,
            tags,
            version: Version::new(version),
            updated_at,
        })
}

/// Strategy for filter criteria (shape-valid and shape-invalid ranges
/// alike, since the engine must tolerate both).
pub fn criteria_strategy() -> impl Strategy<Value = FilterCriteria> {
    (
        prop::option::of(prop::string::string_regex("[a-z ]{0,12}").expect("Invalid regex")),
        prop::collection::btree_set(status_strategy(), 0..3),
        prop::collection::btree_set(ident(), 0..3),
        prop::option::of((timestamp_strategy(), timestamp_strategy())),
        sort_strategy(),
    )
        .prop_map(|(text, statuses, tags, range, (key, direction))| {
            let mut criteria = FilterCriteria::new().sorted_by(key, direction);
            criteria.text = text;
            criteria.statuses = statuses;
            criteria.tags = tags;
            criteria.updated_range = range.map(|(from, to)| DateRange {
                from: Some(from),
                to: Some(to),
            });
            criteria
        })
}

fn sort_strategy() -> impl Strategy<Value = (SortKey, SortDirection)> {
    (
        prop_oneof![
            Just(SortKey::UpdatedAt),
            Just(SortKey::Id),
            Just(SortKey::Status),
            ident().prop_map(SortKey::Field),
        ],
        prop_oneof![Just(SortDirection::Ascending), Just(SortDirection::Descending)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_entities_roundtrip_through_json(entity in entity_strategy()) {
            let json = serde_json::to_string(&entity).unwrap();
            let back: Entity = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, entity);
        }

        #[test]
        fn generated_criteria_are_serializable(criteria in criteria_strategy()) {
            let json = serde_json::to_string(&criteria).unwrap();
            let back: FilterCriteria = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, criteria);
        }
    }
}
