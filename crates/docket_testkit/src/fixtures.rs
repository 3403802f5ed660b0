//! Deterministic fixtures for tests.

use docket_core::{
    Entity, FieldValue, RecordStore, SearchIndex, Timestamp, TransitionGraph, Version,
};
use std::sync::Arc;

/// Builds a case entity with the fields every list view renders.
#[must_use]
pub fn case(id: &str, status: &str, title: &str, client: &str, updated_at: u64) -> Entity {
    Entity::new(id, status)
        .with_text("title", title)
        .with_text("client", client)
        .with_version(Version::new(1))
        .with_updated_at(Timestamp::from_millis(updated_at))
}

/// A small docket of cases spanning the whole workflow.
#[must_use]
pub fn sample_cases() -> Vec<Entity> {
    vec![
        case("case-1", "new", "Contract review", "Meridian Logistics", 1_000),
        case("case-2", "accepted", "Lease dispute", "Harbor Realty", 2_000).with_tag("urgent"),
        case(
            "case-3",
            "investigation",
            "Employment claim",
            "Sarah O'Neill",
            3_000,
        )
        .with_tag("pro-bono"),
        case("case-4", "negotiation", "Merger filing", "Meridian Logistics", 4_000)
            .with_field("amount", FieldValue::Number(125_000.0)),
        case("case-5", "trial", "Patent infringement", "Quill & Sons", 5_000).with_tag("urgent"),
        case("case-6", "completed", "Estate settlement", "Harbor Realty", 6_000),
    ]
}

/// A record store and subscribed search index loaded with
/// [`sample_cases`].
#[must_use]
pub fn loaded_store() -> (Arc<RecordStore>, Arc<SearchIndex>) {
    let store = Arc::new(RecordStore::new());
    let index = Arc::new(SearchIndex::default());
    store.subscribe(index.clone());
    for entity in sample_cases() {
        store.put(entity);
    }
    (store, index)
}

/// The standard legal-practice transition graph.
#[must_use]
pub fn workflow() -> Arc<TransitionGraph> {
    Arc::new(TransitionGraph::legal_practice())
}
