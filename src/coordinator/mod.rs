// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Sync engine coordinator.
//!
//! The [`SyncEngine`] ties together:
//! - a [`SourceProvider`] that puts a FitNotes snapshot on local disk
//! - the read-only [`crate::source::SnapshotReader`] over that snapshot
//! - a [`RemoteStore`] holding one collection per [`EntityKind`]
//!
//! A run syncs every kind in dependency order and only ever creates remote
//! records; nothing is updated or deleted on either side.
//!
//! # Lifecycle
//!
//! ```text
//! NotStarted → AcquiringSource → { Indexing(kind) → Diffing(kind) → Creating(kind) }* → Complete
//!                                                                            (or Failed)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fitnotes_sync::{Collections, EngineState, InMemoryRemoteStore, LocalBackup, SyncConfig, SyncEngine};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = SyncConfig::new(
//!     "secret",
//!     Collections {
//!         bodyweight: "bw".into(),
//!         exercise: "ex".into(),
//!         workout: "wo".into(),
//!     },
//! );
//! let engine = SyncEngine::new(
//!     config,
//!     Arc::new(InMemoryRemoteStore::new()),
//!     Arc::new(LocalBackup::new("FitNotes_Backup.fitnotes")),
//! );
//! assert_eq!(engine.state(), EngineState::NotStarted);
//!
//! let report = engine.run().await.expect("sync failed");
//! println!("created {} records", report.created());
//! # }
//! ```

mod diff;
mod lifecycle;
mod sync;
mod types;

pub use diff::unsynced_rows;
pub use types::{EngineState, KindReport, RowFailure, RunReport, SyncError};

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;
use tracing::debug;

use crate::config::SyncConfig;
use crate::entity::EntityKind;
use crate::index::CrossReferenceIndex;
use crate::remote::RemoteStore;
use crate::source::SourceProvider;

/// Main sync engine coordinator.
///
/// Calls are strictly sequential: every remote request is awaited before the
/// next is issued. Runs against the same collections must not overlap.
pub struct SyncEngine {
    pub(super) config: SyncConfig,

    pub(super) remote: Arc<dyn RemoteStore>,

    pub(super) source: Arc<dyn SourceProvider>,

    /// Engine state (broadcast to watchers)
    pub(super) state: watch::Sender<EngineState>,

    /// Engine state receiver (for internal use)
    pub(super) state_rx: watch::Receiver<EngineState>,

    /// Records created during the current run, per kind
    pub(super) created: DashMap<EntityKind, CrossReferenceIndex>,
}

impl SyncEngine {
    /// Create a new sync engine in `NotStarted` state.
    ///
    /// The configuration is validated when [`run()`](Self::run) starts.
    pub fn new(
        config: SyncConfig,
        remote: Arc<dyn RemoteStore>,
        source: Arc<dyn SourceProvider>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(EngineState::NotStarted);

        Self {
            config,
            remote,
            source,
            state: state_tx,
            state_rx,
            created: DashMap::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Get current engine state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        *self.state_rx.borrow()
    }

    /// Get a receiver to watch state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<EngineState> {
        self.state_rx.clone()
    }

    pub(super) fn set_state(&self, state: EngineState) {
        debug!(state = %state, "Engine state");
        self.state.send_replace(state);
    }
}
