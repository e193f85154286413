// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Source snapshot acquisition and reading.
//!
//! The engine only sees [`SourceProvider::get_local_file`]: how the FitNotes
//! backup gets onto local disk (a fixed path, a Google Drive download) is the
//! provider's business.

pub mod drive;
pub mod snapshot;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::TempDir;
use thiserror::Error;

pub use drive::DriveBackup;
pub use snapshot::{LocalStoreError, SnapshotReader};

#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("No valid credentials found")]
    NoCredentials,
    #[error("Credential refresh failed: {0}")]
    CredentialRefresh(String),
    #[error("Authorization failed: {0}")]
    Authorization(String),
    #[error("No backup files matching {pattern} found")]
    NoBackupFound { pattern: String },
    #[error("Drive request failed{}: {message}", http_suffix(.status))]
    Drive { status: Option<u16>, message: String },
    #[error("Download failed: {0}")]
    Download(String),
    #[error("Backup file {0} does not exist")]
    NotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn http_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

impl AcquisitionError {
    /// Whether another attempt could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Drive { status: None, .. } | Self::Download(_) => true,
            Self::Drive { status: Some(status), .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// A local copy of the source database.
///
/// When the copy was downloaded into a temporary directory, that directory is
/// owned here and removed on drop.
#[derive(Debug)]
pub struct SourceFile {
    path: PathBuf,
    workdir: Option<TempDir>,
}

impl SourceFile {
    /// A caller-owned file that must outlive the run and is never deleted.
    pub fn borrowed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            workdir: None,
        }
    }

    /// A file inside `workdir`, deleted together with it.
    pub fn temporary(path: impl Into<PathBuf>, workdir: TempDir) -> Self {
        Self {
            path: path.into(),
            workdir: Some(workdir),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.workdir.is_some()
    }
}

/// Supplies the snapshot the engine reads from.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    async fn get_local_file(&self) -> Result<SourceFile, AcquisitionError>;
}

/// A snapshot already on local disk.
#[derive(Debug, Clone)]
pub struct LocalBackup {
    path: PathBuf,
}

impl LocalBackup {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SourceProvider for LocalBackup {
    async fn get_local_file(&self) -> Result<SourceFile, AcquisitionError> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if meta.is_file() => Ok(SourceFile::borrowed(&self.path)),
            Ok(_) => Err(AcquisitionError::NotFound(self.path.clone())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AcquisitionError::NotFound(self.path.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
