// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Public types for the sync engine coordinator.

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::entity::EntityKind;
use crate::index::IndexError;
use crate::mapping::MappingError;
use crate::remote::RemoteError;
use crate::source::{AcquisitionError, LocalStoreError};

/// Engine run state.
///
/// Use [`super::SyncEngine::state()`] to check current state or
/// [`super::SyncEngine::state_receiver()`] to watch for changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Created, no run yet
    NotStarted,
    /// Obtaining the local snapshot
    AcquiringSource,
    /// Reading the remote records of a kind
    Indexing(EntityKind),
    /// Reading local rows and computing the unsynced subset
    Diffing(EntityKind),
    /// Creating remote records for unsynced rows
    Creating(EntityKind),
    /// Last run finished (possibly with per-row failures)
    Complete,
    /// Last run aborted
    Failed,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "NotStarted"),
            Self::AcquiringSource => write!(f, "AcquiringSource"),
            Self::Indexing(kind) => write!(f, "Indexing({})", kind),
            Self::Diffing(kind) => write!(f, "Diffing({})", kind),
            Self::Creating(kind) => write!(f, "Creating({})", kind),
            Self::Complete => write!(f, "Complete"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// A local row whose remote create was rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowFailure {
    pub origin_id: i64,
    #[serde(serialize_with = "serialize_display")]
    pub error: RemoteError,
}

fn serialize_display<S: serde::Serializer>(error: &RemoteError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(error)
}

/// Outcome of syncing one kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindReport {
    pub kind: EntityKind,
    /// Remote records found while indexing
    pub remote_records: usize,
    /// Remote records without a usable origin id
    pub untracked: usize,
    /// Rows returned by the local query
    pub local_rows: usize,
    /// Rows with no remote counterpart
    pub unsynced: usize,
    pub created: usize,
    pub failures: Vec<RowFailure>,
}

impl KindReport {
    #[must_use]
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            remote_records: 0,
            untracked: 0,
            local_rows: 0,
            unsynced: 0,
            created: 0,
            failures: Vec::new(),
        }
    }

    /// Check if every unsynced row was created
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    /// One entry per synced kind, in processing order
    pub kinds: Vec<KindReport>,
}

impl RunReport {
    #[must_use]
    pub fn kind(&self, kind: EntityKind) -> Option<&KindReport> {
        self.kinds.iter().find(|k| k.kind == kind)
    }

    #[must_use]
    pub fn created(&self) -> usize {
        self.kinds.iter().map(|k| k.created).sum()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.kinds.iter().map(|k| k.failures.len()).sum()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.kinds.iter().all(KindReport::is_success)
    }
}

/// Errors that abort a run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Source acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),
    #[error("Local snapshot error: {0}")]
    Local(#[from] LocalStoreError),
    #[error("Remote index error: {0}")]
    Index(#[from] IndexError),
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),
}

impl SyncError {
    /// Phase label for metrics and logs.
    #[must_use]
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Acquisition(_) => "acquire",
            Self::Local(_) => "local",
            Self::Index(_) => "index",
            Self::Mapping(_) => "mapping",
        }
    }
}
