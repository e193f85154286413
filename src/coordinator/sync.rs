// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Per-kind sync: index, diff, map, create.

use tracing::{debug, error, info};

use crate::entity::EntityKind;
use crate::index::{extract_known_ids, fetch_all, CrossReferenceIndex};
use crate::mapping::map_row;
use crate::metrics::{self, PhaseTimer};
use crate::source::SnapshotReader;

use super::diff::unsynced_rows;
use super::{EngineState, KindReport, RowFailure, SyncEngine, SyncError};

impl SyncEngine {
    /// Sync one kind from an open snapshot.
    ///
    /// 1. Read the full remote set of the kind and extract the known ids
    /// 2. Read local rows and keep those with unknown origin ids
    /// 3. Build the cross-reference index for the kinds this one references
    /// 4. Map and create each unsynced row
    ///
    /// Index, local read and mapping errors abort. A rejected create is logged,
    /// recorded in the report, and left for the next run.
    #[tracing::instrument(skip(self, snapshot), fields(kind = %kind))]
    pub async fn sync(&self, snapshot: &SnapshotReader, kind: EntityKind) -> Result<KindReport, SyncError> {
        let collection = self.config.collections.get(kind);
        let mut report = KindReport::new(kind);

        // ========== Index ==========
        self.set_state(EngineState::Indexing(kind));
        let remote = {
            let _timer = PhaseTimer::new(kind, "index");
            fetch_all(self.remote.as_ref(), kind, collection, self.config.page_size).await?
        };
        let known = extract_known_ids(&remote);
        report.remote_records = remote.len();
        report.untracked = known.untracked;
        metrics::set_remote_records(kind, remote.len());
        info!(
            kind = %kind,
            remote_records = remote.len(),
            known = known.len(),
            untracked = known.untracked,
            duplicates = known.duplicates,
            "Remote index built"
        );

        // ========== Diff ==========
        self.set_state(EngineState::Diffing(kind));
        let rows = {
            let _timer = PhaseTimer::new(kind, "diff");
            snapshot.fetch_rows(kind).await?
        };
        let pending = unsynced_rows(&rows, &known);
        report.local_rows = rows.len();
        report.unsynced = pending.len();
        metrics::set_unsynced_rows(kind, pending.len());
        info!(kind = %kind, local_rows = rows.len(), unsynced = pending.len(), "Found unsynced rows");

        // Every kind passes through Creating, even with nothing to create.
        let xref = if pending.is_empty() {
            CrossReferenceIndex::default()
        } else {
            self.cross_reference(kind).await?
        };

        // ========== Create ==========
        self.set_state(EngineState::Creating(kind));
        let _timer = PhaseTimer::new(kind, "create");

        for row in pending {
            let origin_id = row.origin_id();
            let properties = map_row(row, &xref)?;

            match self.remote.create(collection, &properties).await {
                Ok(remote_id) => {
                    debug!(kind = %kind, origin_id, remote_id = %remote_id, "Created remote record");
                    self.created.entry(kind).or_default().absorb(origin_id, &remote_id);
                    metrics::record_created(kind);
                    report.created += 1;
                }
                Err(e) => {
                    error!(kind = %kind, origin_id, error = %e, "Failed to create remote record");
                    metrics::record_create_failure(kind);
                    report.failures.push(RowFailure { origin_id, error: e });
                }
            }
        }

        info!(
            kind = %kind,
            created = report.created,
            failed = report.failures.len(),
            "Kind synced"
        );
        Ok(report)
    }

    /// Cross-reference index for every kind `kind` links to.
    ///
    /// Re-reads each reference kind's remote set so rows synced in earlier runs
    /// resolve, then fills gaps with records created in this run in case the
    /// remote query lags behind its own writes.
    async fn cross_reference(&self, kind: EntityKind) -> Result<CrossReferenceIndex, SyncError> {
        let mut xref = CrossReferenceIndex::default();

        for &reference in kind.references() {
            let records = {
                let _timer = PhaseTimer::new(reference, "index");
                fetch_all(
                    self.remote.as_ref(),
                    reference,
                    self.config.collections.get(reference),
                    self.config.page_size,
                )
                .await?
            };
            xref.merge(&CrossReferenceIndex::from_records(&records));

            if let Some(created) = self.created.get(&reference) {
                xref.merge(&created);
            }
            debug!(kind = %kind, reference = %reference, entries = xref.len(), "Cross-reference index built");
        }

        Ok(xref)
    }
}
