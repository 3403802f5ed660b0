//! Multi-select state and bulk operation fan-out.
//!
//! The selection is scoped to one list view and cleared on filter reset,
//! fully successful bulk operation, or explicit user action. Bulk
//! operations fan out over the selection as independent calls: one
//! entity's failure never aborts the others, and the aggregated outcome
//! reports partial success ("18 of 20 archived, 2 failed").

use crate::error::{MutationError, MutationResult};
use docket_core::EntityId;
use parking_lot::RwLock;
use std::collections::BTreeSet;

/// One failed entry of a bulk operation.
#[derive(Debug)]
pub struct BulkFailure {
    /// The entity the operation failed for.
    pub id: EntityId,
    /// Why it failed.
    pub error: MutationError,
}

/// Aggregated result of a bulk operation.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    /// Entities the operation succeeded for, in selection order.
    pub succeeded: Vec<EntityId>,
    /// Entities the operation failed for, with their errors.
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    /// Returns true if every entity succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of entities the operation was applied to.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Renders the partial-success report line.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_complete() {
            format!("{} of {} succeeded", self.succeeded.len(), self.total())
        } else {
            let reasons: Vec<String> = self
                .failed
                .iter()
                .map(|failure| format!("{}: {}", failure.id, failure.error))
                .collect();
            format!(
                "{} of {} succeeded, {} failed: {}",
                self.succeeded.len(),
                self.total(),
                self.failed.len(),
                reasons.join("; ")
            )
        }
    }
}

/// Tracks multi-select state and fans bulk operations out over it.
#[derive(Debug, Default)]
pub struct SelectionCoordinator {
    selected: RwLock<BTreeSet<EntityId>>,
}

impl SelectionCoordinator {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles an entity; returns true if it is now selected.
    pub fn toggle(&self, id: impl Into<EntityId>) -> bool {
        let id = id.into();
        let mut selected = self.selected.write();
        if selected.remove(&id) {
            false
        } else {
            selected.insert(id);
            true
        }
    }

    /// Selects every currently visible entity.
    pub fn select_all<I>(&self, visible_ids: I)
    where
        I: IntoIterator<Item = EntityId>,
    {
        self.selected.write().extend(visible_ids);
    }

    /// Selects the entities between two indices of the rendered order,
    /// bounds inclusive and order-insensitive, indices clamped to the
    /// list. Existing selection is kept (shift-click extends).
    pub fn range(&self, from_index: usize, to_index: usize, ordered_ids: &[EntityId]) {
        if ordered_ids.is_empty() {
            return;
        }
        let last = ordered_ids.len() - 1;
        let (lo, hi) = if from_index <= to_index {
            (from_index, to_index)
        } else {
            (to_index, from_index)
        };
        let (lo, hi) = (lo.min(last), hi.min(last));
        self.selected
            .write()
            .extend(ordered_ids[lo..=hi].iter().cloned());
    }

    /// Clears the selection.
    pub fn clear(&self) {
        self.selected.write().clear();
    }

    /// Returns true if the entity is selected.
    #[must_use]
    pub fn is_selected(&self, id: &EntityId) -> bool {
        self.selected.read().contains(id)
    }

    /// Returns the selected ids in stable (id) order.
    #[must_use]
    pub fn selected(&self) -> Vec<EntityId> {
        self.selected.read().iter().cloned().collect()
    }

    /// Number of selected entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.read().len()
    }

    /// Returns true if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.read().is_empty()
    }

    /// Applies an operation to every selected entity.
    ///
    /// Calls are independent: a failure is recorded and the fan-out moves
    /// on, so legal workflows get their partial-success report instead of
    /// an aborted batch. On full success the selection clears; on partial
    /// success the failed ids stay selected so they remain actionable.
    pub fn bulk_apply<F>(&self, mut operation: F) -> BulkOutcome
    where
        F: FnMut(&EntityId) -> MutationResult<()>,
    {
        let targets = self.selected();
        let mut outcome = BulkOutcome::default();

        for id in targets {
            match operation(&id) {
                Ok(()) => outcome.succeeded.push(id),
                Err(error) => outcome.failed.push(BulkFailure { id, error }),
            }
        }

        {
            let mut selected = self.selected.write();
            for id in &outcome.succeeded {
                selected.remove(id);
            }
        }

        tracing::info!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "bulk operation finished"
        );
        outcome
    }
}
