//! Optimistic mutation pipeline.
//!
//! Every mutation follows the same shape: snapshot the entity, apply the
//! change to the record store immediately (so the UI reflects it), issue
//! the remote call carrying the base version, then reconcile. On success
//! the authoritative server entity replaces the optimistic one; on
//! conflict or transport failure the pre-optimistic snapshot is restored
//! before the caller is told, so the UI never keeps showing a write that
//! did not durably succeed.
//!
//! Confirmations may resolve out of order on an async host. Validity is
//! decided by base-version comparison, never arrival order: a confirmation
//! (or rollback) whose base version no longer matches the store is
//! discarded as superseded instead of applied.
//!
//! The pipeline never retries. Retry policy belongs to the caller, which
//! keeps the failure contract here simple and total.

use crate::error::{MutationError, MutationResult};
use crate::transport::RemoteTransport;
use docket_core::{
    Entity, EntityDraft, EntityId, FieldValue, RecordStore, Status, TransitionGraph, Version,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A partial change to an entity.
///
/// Patches are applied to a snapshot read from the record store
/// (read-modify-write); `version` and `updated_at` are never touched
/// locally — they change only when the server confirms.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityPatch {
    /// New workflow status, validated against the transition graph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// Fields to set or overwrite.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldValue>,
    /// Fields to remove.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub clear_fields: BTreeSet<String>,
    /// Tags to add.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub add_tags: BTreeSet<String>,
    /// Tags to remove.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub remove_tags: BTreeSet<String>,
}

impl EntityPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<Status>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets a field value.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Sets a text field.
    #[must_use]
    pub fn with_text(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_field(name, FieldValue::Text(text.into()))
    }

    /// Removes a field.
    #[must_use]
    pub fn clearing_field(mut self, name: impl Into<String>) -> Self {
        self.clear_fields.insert(name.into());
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn adding_tag(mut self, tag: impl Into<String>) -> Self {
        self.add_tags.insert(tag.into());
        self
    }

    /// Removes a tag.
    #[must_use]
    pub fn removing_tag(mut self, tag: impl Into<String>) -> Self {
        self.remove_tags.insert(tag.into());
        self
    }

    /// Applies the patch to a snapshot, producing the optimistic entity.
    #[must_use]
    pub fn apply_to(&self, snapshot: &Entity) -> Entity {
        let mut entity = snapshot.clone();
        if let Some(status) = &self.status {
            entity.status = status.clone();
        }
        for name in &self.clear_fields {
            entity.fields.remove(name);
        }
        for (name, value) in &self.fields {
            entity.fields.insert(name.clone(), value.clone());
        }
        for tag in &self.remove_tags {
            entity.tags.remove(tag);
        }
        for tag in &self.add_tags {
            entity.tags.insert(tag.clone());
        }
        entity
    }
}

/// The operation a mutation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    /// Entity creation.
    Create,
    /// Entity replacement.
    Update,
    /// Entity deletion.
    Delete,
}

/// Lifecycle state of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    /// Optimistically applied, awaiting the server.
    Pending,
    /// Server accepted; the authoritative entity is in the store.
    Confirmed,
    /// Server rejected or unreachable; the snapshot was restored.
    RolledBack,
    /// Resolved after a later mutation replaced the optimistic write;
    /// the outcome was discarded rather than applied.
    Superseded,
}

/// Journal record of one mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation {
    /// Monotonic mutation id, in optimistic-application order.
    pub id: u64,
    /// Target entity.
    pub entity_id: EntityId,
    /// Version the mutation was based on.
    pub base_version: Version,
    /// Operation kind.
    pub operation: MutationOp,
    /// The optimistic entity sent to the server; `None` for deletes.
    pub payload: Option<Entity>,
    /// Current lifecycle state.
    pub state: MutationState,
}

/// Executes create/update/delete against the remote store with optimistic
/// local application, version-conflict detection, and rollback.
pub struct MutationPipeline<T: RemoteTransport> {
    store: Arc<RecordStore>,
    graph: Arc<TransitionGraph>,
    transport: Arc<T>,
    journal: Mutex<Vec<PendingMutation>>,
    next_id: AtomicU64,
}

impl<T: RemoteTransport> MutationPipeline<T> {
    /// Creates a pipeline over a store, a transition graph, and a remote
    /// transport.
    pub fn new(store: Arc<RecordStore>, graph: Arc<TransitionGraph>, transport: Arc<T>) -> Self {
        Self {
            store,
            graph,
            transport,
            journal: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the remote transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Returns a copy of the mutation journal.
    #[must_use]
    pub fn journal(&self) -> Vec<PendingMutation> {
        self.journal.lock().clone()
    }

    /// Returns the number of mutations still awaiting the server.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.journal
            .lock()
            .iter()
            .filter(|m| m.state == MutationState::Pending)
            .count()
    }

    fn journal_begin(
        &self,
        entity_id: &EntityId,
        base_version: Version,
        op: MutationOp,
        payload: Option<Entity>,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().push(PendingMutation {
            id,
            entity_id: entity_id.clone(),
            base_version,
            operation: op,
            payload,
            state: MutationState::Pending,
        });
        id
    }

    fn journal_resolve(&self, mutation_id: u64, state: MutationState) {
        if let Some(mutation) = self
            .journal
            .lock()
            .iter_mut()
            .find(|m| m.id == mutation_id)
        {
            mutation.state = state;
        }
    }

    /// Creates an entity.
    ///
    /// The draft is applied optimistically under a fresh id with the
    /// initial version; the server assigns the first confirmed version.
    /// On failure the optimistic entity is removed again.
    pub fn create(&self, draft: EntityDraft) -> MutationResult<Entity> {
        let entity = draft.into_entity(EntityId::new());
        let mutation_id = self.journal_begin(
            &entity.id,
            entity.version,
            MutationOp::Create,
            Some(entity.clone()),
        );
        self.store.put(entity.clone());

        match self.transport.create(&entity) {
            Ok(confirmed) => {
                self.store.put(confirmed.clone());
                self.journal_resolve(mutation_id, MutationState::Confirmed);
                Ok(confirmed)
            }
            Err(err) => {
                self.store.remove(&entity.id);
                self.journal_resolve(mutation_id, MutationState::RolledBack);
                tracing::debug!(entity_id = %entity.id, %err, "create rolled back");
                Err(err)
            }
        }
    }

    /// Updates an entity.
    ///
    /// Status changes are validated against the transition graph before
    /// anything else happens: an illegal transition is rejected locally
    /// with no network call and no store write.
    pub fn update(
        &self,
        id: &EntityId,
        patch: &EntityPatch,
        base_version: Version,
    ) -> MutationResult<Entity> {
        let snapshot = self.store.get(id).ok_or_else(|| MutationError::NotFound {
            entity_id: id.clone(),
        })?;

        if let Some(target) = &patch.status {
            if *target != snapshot.status && !self.graph.is_legal(&snapshot.status, target) {
                return Err(MutationError::InvalidTransition {
                    from: snapshot.status.clone(),
                    to: target.clone(),
                });
            }
        }

        let optimistic = patch.apply_to(&snapshot);
        let mutation_id = self.journal_begin(
            id,
            base_version,
            MutationOp::Update,
            Some(optimistic.clone()),
        );
        self.store.put(optimistic.clone());

        match self.transport.update(id, &optimistic, base_version) {
            Ok(confirmed) => {
                if self.is_still_based_on(id, base_version) {
                    self.store.put(confirmed.clone());
                    self.journal_resolve(mutation_id, MutationState::Confirmed);
                } else {
                    // A later mutation already replaced this optimistic
                    // write; applying the confirmation would reorder it.
                    tracing::debug!(entity_id = %id, %base_version, "stale confirmation discarded");
                    self.journal_resolve(mutation_id, MutationState::Superseded);
                }
                Ok(confirmed)
            }
            Err(err) => {
                if self.is_still_based_on(id, base_version) {
                    self.store.put(snapshot);
                    self.journal_resolve(mutation_id, MutationState::RolledBack);
                    tracing::debug!(entity_id = %id, %err, "update rolled back");
                } else {
                    self.journal_resolve(mutation_id, MutationState::Superseded);
                }
                Err(err)
            }
        }
    }

    /// Deletes an entity.
    ///
    /// The entity is removed optimistically and reinserted from the
    /// snapshot on conflict or transport failure.
    pub fn delete(&self, id: &EntityId, base_version: Version) -> MutationResult<()> {
        let snapshot = self.store.get(id).ok_or_else(|| MutationError::NotFound {
            entity_id: id.clone(),
        })?;

        let mutation_id = self.journal_begin(id, base_version, MutationOp::Delete, None);
        self.store.remove(id);

        match self.transport.delete(id, base_version) {
            Ok(()) => {
                self.journal_resolve(mutation_id, MutationState::Confirmed);
                Ok(())
            }
            Err(err) => {
                if !self.store.contains(id) {
                    self.store.put(snapshot);
                    self.journal_resolve(mutation_id, MutationState::RolledBack);
                    tracing::debug!(entity_id = %id, %err, "delete rolled back");
                } else {
                    // Something recreated the id while the delete was in
                    // flight; leave the newer entity alone.
                    self.journal_resolve(mutation_id, MutationState::Superseded);
                }
                Err(err)
            }
        }
    }

    /// True while the store still holds the state this mutation was based
    /// on. Optimistic writes leave `version` unchanged, so a differing
    /// version means a later mutation has confirmed in the meantime.
    fn is_still_based_on(&self, id: &EntityId, base_version: Version) -> bool {
        self.store
            .get(id)
            .is_some_and(|current| current.version == base_version)
    }
}

impl<T: RemoteTransport> std::fmt::Debug for MutationPipeline<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationPipeline")
            .field("journaled", &self.journal.lock().len())
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}
