//! # Docket Sync
//!
//! Optimistic mutation layer for the Docket legal-practice application.
//!
//! This crate provides:
//! - [`MutationPipeline`]: create/update/delete against the remote store
//!   with optimistic local application, version-conflict detection, and
//!   snapshot rollback
//! - [`RemoteTransport`]: the network boundary, with an HTTP mapping
//!   ([`HttpRemote`]) and a scriptable test double ([`MockRemote`])
//! - [`SelectionCoordinator`]: multi-select state with partial-success
//!   bulk fan-out
//!
//! ## Key invariants
//!
//! - Illegal status transitions are rejected locally, before any network
//!   call
//! - Every failed mutation restores the pre-optimistic snapshot before
//!   the caller is informed
//! - Confirmation validity is decided by base-version comparison, never
//!   arrival order
//! - The pipeline never retries; retry policy belongs to the caller

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod http;
mod pipeline;
mod selection;
mod transport;

pub use config::SyncConfig;
pub use error::{MutationError, MutationResult};
pub use http::{HttpClient, HttpRemote, HttpResponse};
pub use pipeline::{EntityPatch, MutationOp, MutationPipeline, MutationState, PendingMutation};
pub use selection::{BulkFailure, BulkOutcome, SelectionCoordinator};
pub use transport::{MockRemote, RemoteTransport};
