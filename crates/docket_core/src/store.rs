//! In-memory authoritative cache of entities.
//!
//! The record store is a pure keyed container: no validation, no partial
//! merges. `put` replaces the stored entity wholesale, so callers follow a
//! read-modify-write discipline.
//!
//! Derived state (search index, filter views) subscribes as an observer
//! and is notified synchronously on every write, so within a single tick
//! no subscriber ever sees the store ahead of its own state.

use crate::entity::{Entity, EntityId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Observer of record store writes.
///
/// Notifications fire synchronously from `put`/`remove`, after the map
/// write and outside the map lock. Observers may read the store from
/// within a callback.
pub trait StoreObserver: Send + Sync {
    /// An entity was inserted or replaced.
    ///
    /// `before` is the replaced entity for updates, `None` for inserts.
    fn entity_put(&self, before: Option<&Entity>, after: &Entity);

    /// An entity was removed.
    fn entity_removed(&self, before: &Entity);
}

/// In-memory keyed container for entities.
pub struct RecordStore {
    entities: RwLock<HashMap<EntityId, Entity>>,
    observers: RwLock<Vec<Arc<dyn StoreObserver>>>,
}

impl RecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribes an observer to all subsequent writes.
    pub fn subscribe(&self, observer: Arc<dyn StoreObserver>) {
        self.observers.write().push(observer);
    }

    /// Gets an entity by ID.
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<Entity> {
        self.entities.read().get(id).cloned()
    }

    /// Returns true if the entity is present.
    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.read().contains_key(id)
    }

    /// Inserts or replaces an entity.
    ///
    /// Total overwrite, never a partial merge. Observers are notified
    /// before this returns.
    pub fn put(&self, entity: Entity) {
        let before = {
            let mut entities = self.entities.write();
            entities.insert(entity.id.clone(), entity.clone())
        };
        for observer in self.observers.read().iter() {
            observer.entity_put(before.as_ref(), &entity);
        }
    }

    /// Removes an entity, returning it if it was present.
    ///
    /// Observers are notified before this returns.
    pub fn remove(&self, id: &EntityId) -> Option<Entity> {
        let removed = self.entities.write().remove(id);
        if let Some(entity) = &removed {
            for observer in self.observers.read().iter() {
                observer.entity_removed(entity);
            }
        }
        removed
    }

    /// Returns all entities.
    ///
    /// Iteration order is unspecified; callers that need ordering sort
    /// downstream (the filter engine always does).
    #[must_use]
    pub fn all(&self) -> Vec<Entity> {
        self.entities.read().values().cloned().collect()
    }

    /// Returns all entity ids.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.read().keys().cloned().collect()
    }

    /// Returns the number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    /// Returns true if the store holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
