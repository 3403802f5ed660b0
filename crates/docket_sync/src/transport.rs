//! Transport abstraction for the remote entity store.
//!
//! The pipeline talks to the server through [`RemoteTransport`]; the HTTP
//! mapping lives in [`crate::http`], and [`MockRemote`] provides a
//! scriptable in-memory server for tests.

use crate::error::{MutationError, MutationResult};
use docket_core::{Entity, EntityId, Timestamp, Version};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Network boundary of the mutation pipeline.
///
/// Every call is one remote round-trip. On success the server returns the
/// authoritative entity (with its new version); a version conflict
/// surfaces as [`MutationError::VersionConflict`] carrying the server's
/// current version.
pub trait RemoteTransport: Send + Sync {
    /// Creates an entity. The server assigns the first confirmed version.
    fn create(&self, entity: &Entity) -> MutationResult<Entity>;

    /// Replaces an entity, predicated on `base_version` being current.
    fn update(&self, id: &EntityId, entity: &Entity, base_version: Version)
        -> MutationResult<Entity>;

    /// Deletes an entity, predicated on `base_version` being current.
    fn delete(&self, id: &EntityId, base_version: Version) -> MutationResult<()>;
}

/// In-memory remote store for tests.
///
/// Behaves like the real endpoint: versions increase on every accepted
/// write, stale base versions are rejected with the current server
/// version, and timestamps advance monotonically. Failures can be
/// scripted globally (`fail_next`) or per entity (`fail_entity`), and
/// every accepted or rejected call is recorded in a log so tests can
/// assert that no network call was issued.
#[derive(Default)]
pub struct MockRemote {
    entities: Mutex<HashMap<EntityId, Entity>>,
    fail_next: Mutex<Vec<MutationError>>,
    entity_failures: Mutex<HashMap<EntityId, MutationError>>,
    calls: Mutex<Vec<String>>,
    clock: AtomicU64,
}

impl MockRemote {
    /// Creates an empty mock server.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: AtomicU64::new(1_000),
            ..Self::default()
        }
    }

    /// Seeds the server with an entity as-is (version untouched).
    pub fn seed(&self, entity: Entity) {
        self.entities.lock().insert(entity.id.clone(), entity);
    }

    /// Returns the server's copy of an entity.
    #[must_use]
    pub fn entity(&self, id: &EntityId) -> Option<Entity> {
        self.entities.lock().get(id).cloned()
    }

    /// Queues an error for the next call, regardless of target.
    pub fn fail_next(&self, error: MutationError) {
        self.fail_next.lock().push(error);
    }

    /// Fails every call that targets the given entity.
    pub fn fail_entity(&self, id: impl Into<EntityId>, error: MutationError) {
        self.entity_failures.lock().insert(id.into(), error);
    }

    /// Returns the call log.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Returns the number of calls that reached the server.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn next_timestamp(&self) -> Timestamp {
        Timestamp::from_millis(self.clock.fetch_add(1_000, Ordering::SeqCst))
    }

    fn check_scripted_failure(&self, id: &EntityId) -> MutationResult<()> {
        let mut queued = self.fail_next.lock();
        if !queued.is_empty() {
            return Err(queued.remove(0));
        }
        drop(queued);
        if let Some(error) = self.entity_failures.lock().get(id) {
            return Err(clone_error(error));
        }
        Ok(())
    }
}

// MutationError does not implement Clone (error sources rarely do), so the
// scripted per-entity failures are re-materialized on each call.
fn clone_error(error: &MutationError) -> MutationError {
    match error {
        MutationError::InvalidTransition { from, to } => MutationError::InvalidTransition {
            from: from.clone(),
            to: to.clone(),
        },
        MutationError::VersionConflict {
            entity_id,
            base_version,
            server_version,
        } => MutationError::VersionConflict {
            entity_id: entity_id.clone(),
            base_version: *base_version,
            server_version: *server_version,
        },
        MutationError::Transport { message, retryable } => MutationError::Transport {
            message: message.clone(),
            retryable: *retryable,
        },
        MutationError::NotFound { entity_id } => MutationError::NotFound {
            entity_id: entity_id.clone(),
        },
        MutationError::Protocol(message) => MutationError::Protocol(message.clone()),
    }
}

impl RemoteTransport for MockRemote {
    fn create(&self, entity: &Entity) -> MutationResult<Entity> {
        self.calls.lock().push(format!("create {}", entity.id));
        self.check_scripted_failure(&entity.id)?;

        let mut confirmed = entity.clone();
        confirmed.version = Version::INITIAL.next();
        confirmed.updated_at = self.next_timestamp();
        self.entities
            .lock()
            .insert(confirmed.id.clone(), confirmed.clone());
        Ok(confirmed)
    }

    fn update(
        &self,
        id: &EntityId,
        entity: &Entity,
        base_version: Version,
    ) -> MutationResult<Entity> {
        self.calls.lock().push(format!("update {id}@{base_version}"));
        self.check_scripted_failure(id)?;

        let mut entities = self.entities.lock();
        let current = entities.get(id).ok_or_else(|| MutationError::NotFound {
            entity_id: id.clone(),
        })?;
        if current.version != base_version {
            return Err(MutationError::VersionConflict {
                entity_id: id.clone(),
                base_version,
                server_version: current.version,
            });
        }

        let mut confirmed = entity.clone();
        confirmed.version = base_version.next();
        confirmed.updated_at = self.next_timestamp();
        entities.insert(id.clone(), confirmed.clone());
        Ok(confirmed)
    }

    fn delete(&self, id: &EntityId, base_version: Version) -> MutationResult<()> {
        self.calls.lock().push(format!("delete {id}@{base_version}"));
        self.check_scripted_failure(id)?;

        let mut entities = self.entities.lock();
        let current = entities.get(id).ok_or_else(|| MutationError::NotFound {
            entity_id: id.clone(),
        })?;
        if current.version != base_version {
            return Err(MutationError::VersionConflict {
                entity_id: id.clone(),
                base_version,
                server_version: current.version,
            });
        }
        entities.remove(id);
        Ok(())
    }
}

impl std::fmt::Debug for MockRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRemote")
            .field("entities", &self.entities.lock().len())
            .field("calls", &self.call_count())
            .finish_non_exhaustive()
    }
}
