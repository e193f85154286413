// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # FitNotes Sync
//!
//! Incremental, append-only sync of a FitNotes SQLite backup into Notion
//! databases.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Source Acquisition                      │
//! │  • Local path, or newest backup on Google Drive            │
//! │  • Snapshot opened read-only, deleted after the run        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Per kind, in dependency order              │
//! │  • Index: every remote record, cursor by cursor            │
//! │  • Diff: local rows whose origin id is not indexed         │
//! │  • Map: row → property set (kg → lbs, exercise relation)   │
//! │  • Create: one remote record per unsynced row              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each remote record carries the local row id in its `sql_id` property; that
//! is the only dedup key. A row whose create failed is simply picked up again
//! by the next run.
//!
//! ## Modules
//!
//! - [`coordinator`]: the [`SyncEngine`] run loop and reports
//! - [`source`]: snapshot acquisition (local, Google Drive) and reading
//! - [`remote`]: remote store trait, Notion client, in-memory store
//! - [`index`]: remote pagination, known ids, cross-references
//! - [`mapping`]: local row to remote property set
//! - [`resilience`]: retry with backoff for acquisition

pub mod config;
pub mod entity;
pub mod record;
pub mod mapping;
pub mod index;
pub mod remote;
pub mod source;
pub mod resilience;
pub mod coordinator;
pub mod metrics;

pub use config::{BackupConfig, Collections, ConfigError, SyncConfig};
pub use coordinator::{EngineState, KindReport, RowFailure, RunReport, SyncEngine, SyncError};
pub use entity::{dependency_order, EntityKind};
pub use index::{CrossReferenceIndex, IndexError, KnownIds};
pub use mapping::{map_row, MappingError};
pub use record::{LocalRow, PropertySet, PropertyValue, RemoteRecord};
pub use remote::{InMemoryRemoteStore, NotionStore, QueryPage, RemoteError, RemoteStore};
pub use source::{
    AcquisitionError, DriveBackup, LocalBackup, LocalStoreError, SnapshotReader, SourceFile, SourceProvider,
};
pub use resilience::retry::RetryConfig;
