// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Run lifecycle: acquire the snapshot, sync each kind, release the snapshot.

use std::time::Instant;

use tracing::{error, info, warn};

use crate::entity::{dependency_order, EntityKind};
use crate::metrics;
use crate::source::SnapshotReader;

use super::{EngineState, RunReport, SyncEngine, SyncError};

impl SyncEngine {
    /// Sync every kind.
    ///
    /// Run flow:
    /// 1. Validate configuration (no I/O happens on failure)
    /// 2. Acquire the snapshot from the source provider
    /// 3. Sync kinds in dependency order; the first fatal error stops the run
    /// 4. Close the snapshot and drop it (a downloaded copy is deleted)
    ///
    /// Per-row create failures don't abort; they're listed in the report.
    pub async fn run(&self) -> Result<RunReport, SyncError> {
        self.run_kinds(&EntityKind::ALL).await
    }

    /// Sync a subset of kinds, reordered so references come first.
    #[tracing::instrument(skip(self))]
    pub async fn run_kinds(&self, kinds: &[EntityKind]) -> Result<RunReport, SyncError> {
        let run_start = Instant::now();
        self.created.clear();

        let result = self.execute(kinds).await;

        match &result {
            Ok(report) => {
                self.set_state(EngineState::Complete);
                metrics::record_run("success", run_start.elapsed());
                if report.is_success() {
                    info!(
                        created = report.created(),
                        duration_ms = run_start.elapsed().as_millis() as u64,
                        "Sync run complete"
                    );
                } else {
                    warn!(
                        created = report.created(),
                        failed = report.failed(),
                        "Sync run complete with failed rows, they will be retried next run"
                    );
                }
            }
            Err(e) => {
                self.set_state(EngineState::Failed);
                metrics::record_fatal(e.phase());
                metrics::record_run("failed", run_start.elapsed());
                error!(phase = e.phase(), error = %e, "Sync run aborted");
            }
        }

        result
    }

    async fn execute(&self, kinds: &[EntityKind]) -> Result<RunReport, SyncError> {
        self.config.validate()?;

        self.set_state(EngineState::AcquiringSource);
        let source = self.source.get_local_file().await?;
        info!(path = %source.path().display(), temporary = source.is_temporary(), "Snapshot acquired");

        let snapshot = SnapshotReader::open(source.path()).await?;

        let mut report = RunReport::default();
        let mut outcome = Ok(());
        for kind in dependency_order(kinds) {
            match self.sync(&snapshot, kind).await {
                Ok(kind_report) => report.kinds.push(kind_report),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        // Release the connection before a temporary snapshot is removed.
        snapshot.close().await;
        drop(source);

        outcome.map(|()| report)
    }
}
