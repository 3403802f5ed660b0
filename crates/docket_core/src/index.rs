//! Token search index over entity text.
//!
//! The index maps normalized tokens to posting sets of entity ids.
//! Tokens are drawn from an entity's text fields, tags, and status.
//! Queries tokenize the search term the same way, match each query token
//! as a prefix of an indexed token, and intersect the per-token posting
//! sets (AND semantics). Infix containment is deliberately unsupported so
//! a query costs O(tokens), not O(entities).
//!
//! On bulk load the index is rebuilt in full; a single-entity change
//! removes that entity's prior tokens and inserts the new ones. Registered
//! as a [`StoreObserver`], the index is patched synchronously with every
//! store write and is never stale beyond the current tick.

use crate::entity::{Entity, EntityId, FieldValue};
use crate::store::StoreObserver;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Configuration for the tokenizer.
#[derive(Debug, Clone)]
pub struct TokenizerConfig {
    /// Minimum token length to index.
    pub min_token_length: usize,
    /// Maximum token length to index.
    pub max_token_length: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            min_token_length: 1,
            max_token_length: 256,
        }
    }
}

impl TokenizerConfig {
    /// Creates a tokenizer configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum token length.
    #[must_use]
    pub const fn min_length(mut self, len: usize) -> Self {
        self.min_token_length = len;
        self
    }

    /// Sets the maximum token length.
    #[must_use]
    pub const fn max_length(mut self, len: usize) -> Self {
        self.max_token_length = len;
        self
    }
}

#[derive(Default)]
struct IndexState {
    /// Inverted index: normalized token → posting set.
    inverted: HashMap<String, HashSet<EntityId>>,
    /// Forward index: entity id → indexed tokens, for incremental updates.
    forward: HashMap<EntityId, HashSet<String>>,
}

/// Token index over entity text fields, tags, and status.
pub struct SearchIndex {
    config: TokenizerConfig,
    state: RwLock<IndexState>,
}

impl SearchIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new(config: TokenizerConfig) -> Self {
        Self {
            config,
            state: RwLock::new(IndexState::default()),
        }
    }

    /// Tokenizes text: split on whitespace and ASCII punctuation,
    /// lowercase, drop tokens outside the configured length bounds.
    fn tokenize_into(&self, text: &str, tokens: &mut HashSet<String>) {
        let mut current = String::new();
        for c in text.chars() {
            if c.is_whitespace() || c.is_ascii_punctuation() {
                self.flush_token(&mut current, tokens);
            } else {
                current.push(c);
            }
        }
        self.flush_token(&mut current, tokens);
    }

    fn flush_token(&self, current: &mut String, tokens: &mut HashSet<String>) {
        if !current.is_empty()
            && current.len() >= self.config.min_token_length
            && current.len() <= self.config.max_token_length
        {
            tokens.insert(current.to_lowercase());
        }
        current.clear();
    }

    /// Derives the token set for an entity.
    fn tokens_of(&self, entity: &Entity) -> HashSet<String> {
        let mut tokens = HashSet::new();
        for value in entity.fields.values() {
            if let FieldValue::Text(text) = value {
                self.tokenize_into(text, &mut tokens);
            }
        }
        for tag in &entity.tags {
            self.tokenize_into(tag, &mut tokens);
        }
        self.tokenize_into(entity.status.as_str(), &mut tokens);
        tokens
    }

    /// Rebuilds the index from scratch.
    ///
    /// Reserved for bulk load; single-entity changes go through
    /// [`SearchIndex::insert`] and [`SearchIndex::remove`].
    pub fn rebuild<'a, I>(&self, entities: I)
    where
        I: IntoIterator<Item = &'a Entity>,
    {
        let mut state = self.state.write();
        state.inverted.clear();
        state.forward.clear();
        for entity in entities {
            let tokens = self.tokens_of(entity);
            Self::insert_tokens(&mut state, entity.id.clone(), tokens);
        }
        tracing::debug!(entities = state.forward.len(), "search index rebuilt");
    }

    /// Indexes one entity, replacing whatever was indexed for it before.
    pub fn insert(&self, entity: &Entity) {
        let tokens = self.tokens_of(entity);
        let mut state = self.state.write();
        if state.forward.get(&entity.id) == Some(&tokens) {
            // Indexed text unchanged; skip the churn.
            return;
        }
        Self::remove_tokens(&mut state, &entity.id);
        Self::insert_tokens(&mut state, entity.id.clone(), tokens);
    }

    /// Removes an entity from the index. Returns true if it was indexed.
    pub fn remove(&self, id: &EntityId) -> bool {
        let mut state = self.state.write();
        let was_indexed = state.forward.contains_key(id);
        Self::remove_tokens(&mut state, id);
        was_indexed
    }

    fn insert_tokens(state: &mut IndexState, id: EntityId, tokens: HashSet<String>) {
        for token in &tokens {
            state.inverted.entry(token.clone()).or_default().insert(id.clone());
        }
        state.forward.insert(id, tokens);
    }

    fn remove_tokens(state: &mut IndexState, id: &EntityId) {
        let Some(tokens) = state.forward.remove(id) else {
            return;
        };
        for token in &tokens {
            if let Some(postings) = state.inverted.get_mut(token) {
                postings.remove(id);
                if postings.is_empty() {
                    state.inverted.remove(token);
                }
            }
        }
    }

    /// Queries the index.
    ///
    /// The term is tokenized like indexed text. Each query token matches
    /// indexed tokens by prefix (whole-token match included); posting sets
    /// are intersected across query tokens. An empty or whitespace-only
    /// term matches every indexed entity.
    #[must_use]
    pub fn query(&self, term: &str) -> BTreeSet<EntityId> {
        let mut query_tokens = HashSet::new();
        self.tokenize_into(term, &mut query_tokens);

        let state = self.state.read();
        if query_tokens.is_empty() {
            return state.forward.keys().cloned().collect();
        }

        let mut result: Option<HashSet<EntityId>> = None;
        for query_token in &query_tokens {
            let mut postings: HashSet<EntityId> = HashSet::new();
            for (token, ids) in &state.inverted {
                if token.starts_with(query_token.as_str()) {
                    postings.extend(ids.iter().cloned());
                }
            }
            result = Some(match result {
                None => postings,
                Some(mut acc) => {
                    acc.retain(|id| postings.contains(id));
                    acc
                }
            });
            if result.as_ref().is_some_and(HashSet::is_empty) {
                break;
            }
        }

        result.unwrap_or_default().into_iter().collect()
    }

    /// Returns the number of indexed entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.state.read().forward.len()
    }

    /// Returns the number of distinct indexed tokens.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.state.read().inverted.len()
    }

    /// Returns true if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().forward.is_empty()
    }
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}

impl StoreObserver for SearchIndex {
    fn entity_put(&self, _before: Option<&Entity>, after: &Entity) {
        self.insert(after);
    }

    fn entity_removed(&self, before: &Entity) {
        self.remove(&before.id);
    }
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("entities", &self.entity_count())
            .field("tokens", &self.token_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordStore;
    use std::sync::Arc;

    fn indexed(entities: &[Entity]) -> SearchIndex {
        let index = SearchIndex::default();
        index.rebuild(entities.iter());
        index
    }

    fn ids(result: &BTreeSet<EntityId>) -> Vec<&str> {
        result.iter().map(EntityId::as_str).collect()
    }

    #[test]
    fn whole_token_match() {
        let index = indexed(&[
            Entity::new("1", "new").with_text("title", "Contract A"),
            Entity::new("2", "new").with_text("title", "Dispute B"),
        ]);

        assert_eq!(ids(&index.query("contract")), vec!["1"]);
        assert_eq!(ids(&index.query("dispute")), vec!["2"]);
    }

    #[test]
    fn prefix_match_but_not_infix() {
        let index = indexed(&[Entity::new("1", "new").with_text("title", "Contract A")]);

        assert_eq!(ids(&index.query("contr")), vec!["1"]);
        // "tract" is contained in "contract" but is not a prefix.
        assert!(index.query("tract").is_empty());
    }

    #[test]
    fn multi_token_query_uses_and_semantics() {
        let index = indexed(&[
            Entity::new("1", "new").with_text("title", "Smith employment contract"),
            Entity::new("2", "new").with_text("title", "Smith lease dispute"),
        ]);

        assert_eq!(ids(&index.query("smith contract")), vec!["1"]);
        assert_eq!(ids(&index.query("smith")), vec!["1", "2"]);
        assert!(index.query("smith probate").is_empty());
    }

    #[test]
    fn empty_term_returns_full_id_set() {
        let entities = [
            Entity::new("1", "new").with_text("title", "Contract A"),
            Entity::new("2", "new").with_text("title", "Dispute B"),
        ];
        let index = indexed(&entities);

        assert_eq!(index.query("").len(), 2);
        assert_eq!(index.query("   ").len(), 2);
    }

    #[test]
    fn query_is_case_insensitive_and_splits_punctuation() {
        let index = indexed(&[Entity::new("1", "new").with_text("client", "O'Neill, Sarah")]);

        assert_eq!(ids(&index.query("NEILL")), vec!["1"]);
        assert_eq!(ids(&index.query("sarah")), vec!["1"]);
    }

    #[test]
    fn tags_and_status_are_indexed() {
        let index = indexed(&[Entity::new("1", "negotiation").with_tag("pro-bono")]);

        assert_eq!(ids(&index.query("negotiation")), vec!["1"]);
        assert_eq!(ids(&index.query("bono")), vec!["1"]);
    }

    #[test]
    fn incremental_update_drops_stale_tokens() {
        let index = SearchIndex::default();
        let v1 = Entity::new("1", "new").with_text("title", "Contract A");
        index.insert(&v1);
        assert_eq!(ids(&index.query("contract")), vec!["1"]);

        let v2 = Entity::new("1", "new").with_text("title", "Settlement A");
        index.insert(&v2);
        assert!(index.query("contract").is_empty());
        assert_eq!(ids(&index.query("settlement")), vec!["1"]);
    }

    #[test]
    fn remove_clears_postings() {
        let index = indexed(&[Entity::new("1", "new").with_text("title", "Contract A")]);

        assert!(index.remove(&EntityId::from("1")));
        assert!(!index.remove(&EntityId::from("1")));
        assert!(index.query("contract").is_empty());
        assert!(index.is_empty());
        assert_eq!(index.token_count(), 0);
    }

    #[test]
    fn store_subscription_keeps_index_current() {
        let store = RecordStore::new();
        let index = Arc::new(SearchIndex::default());
        store.subscribe(index.clone());

        store.put(Entity::new("1", "new").with_text("title", "Contract A"));
        assert_eq!(ids(&index.query("contract")), vec!["1"]);

        store.put(Entity::new("1", "new").with_text("title", "Dispute A"));
        assert!(index.query("contract").is_empty());
        assert_eq!(ids(&index.query("dispute")), vec!["1"]);

        store.remove(&EntityId::from("1"));
        assert!(index.is_empty());
    }

    #[test]
    fn query_subset_of_empty_query() {
        let entities = [
            Entity::new("1", "new").with_text("title", "Contract A"),
            Entity::new("2", "accepted").with_text("title", "Contract B"),
            Entity::new("3", "trial").with_text("title", "Dispute C"),
        ];
        let index = indexed(&entities);

        let all = index.query("");
        for term in ["contract", "dispute", "trial", "a", "zzz"] {
            assert!(index.query(term).is_subset(&all), "query({term})");
        }
    }
}
