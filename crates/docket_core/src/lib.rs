//! # Docket Core
//!
//! Client-side entity layer for the Docket legal-practice application.
//!
//! This crate provides:
//! - [`RecordStore`]: in-memory authoritative cache of entities with
//!   synchronous observer notification
//! - [`SearchIndex`]: token index over entity text with prefix/AND queries
//! - [`FilterEngine`]: composable filter criteria applied in one pass
//! - [`TransitionGraph`]: configurable status-transition state machine
//! - [`PreferenceStore`]: injected persistence for UI preferences
//!
//! The mutation pipeline and selection coordinator that drive writes
//! against the remote store live in `docket_sync`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod entity;
mod error;
mod filter;
mod index;
mod prefs;
mod store;
mod types;
mod workflow;

pub use entity::{Entity, EntityDraft, EntityId, FieldValue, Status};
pub use error::{CoreError, CoreResult};
pub use filter::{
    CriterionFault, DateRange, FilterCriteria, FilterEngine, FilterOutcome, SortDirection, SortKey,
    SortSpec,
};
pub use index::{SearchIndex, TokenizerConfig};
pub use prefs::{JsonPreferenceStore, MemoryPreferenceStore, PreferenceStore, Preferences, ViewMode};
pub use store::{RecordStore, StoreObserver};
pub use types::{Timestamp, Version};
pub use workflow::{TransitionGraph, TransitionRule, WorkflowConfig};
