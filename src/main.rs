// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fitnotes_sync::{DriveBackup, LocalBackup, NotionStore, SourceProvider, SyncConfig, SyncEngine};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match SyncConfig::from_env() {
        Ok(config) => config,
        Err(e) if e.is_missing() => {
            warn!(error = %e, "Sync not configured, exiting");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            error!(error = %e, "Invalid sync configuration");
            return ExitCode::FAILURE;
        }
    };

    let remote = match NotionStore::new(&config) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(error = %e, "Failed to build Notion client");
            return ExitCode::FAILURE;
        }
    };

    let source: Arc<dyn SourceProvider> = match &config.backup.local_path {
        Some(path) => {
            info!(path = %path.display(), "Using local backup");
            Arc::new(LocalBackup::new(path))
        }
        None => match DriveBackup::new(config.backup.clone()) {
            Ok(drive) => Arc::new(drive),
            Err(e) => {
                error!(error = %e, "Failed to build Drive client");
                return ExitCode::FAILURE;
            }
        },
    };

    let engine = SyncEngine::new(config, remote, source);
    match engine.run().await {
        Ok(report) => {
            for kind in &report.kinds {
                info!(
                    kind = %kind.kind,
                    remote_records = kind.remote_records,
                    unsynced = kind.unsynced,
                    created = kind.created,
                    failed = kind.failures.len(),
                    "Kind summary"
                );
            }
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}
