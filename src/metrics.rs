// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for fitnotes-sync.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host process is responsible for choosing the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `fitnotes_sync_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `kind`: bodyweight, exercise, workout
//! - `phase`: acquire, index, diff, create
//! - `outcome`: success, failed

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

use crate::entity::EntityKind;

/// Record one remote page read while indexing
pub fn record_remote_page(kind: EntityKind, records: usize) {
    counter!("fitnotes_sync_remote_pages_total", "kind" => kind.name()).increment(1);
    counter!("fitnotes_sync_remote_records_read_total", "kind" => kind.name())
        .increment(records as u64);
}

/// Set the number of remote records found for a kind
pub fn set_remote_records(kind: EntityKind, count: usize) {
    gauge!("fitnotes_sync_remote_records", "kind" => kind.name()).set(count as f64);
}

/// Set the number of local rows awaiting creation for a kind
pub fn set_unsynced_rows(kind: EntityKind, count: usize) {
    gauge!("fitnotes_sync_unsynced_rows", "kind" => kind.name()).set(count as f64);
}

/// Record a remote record created
pub fn record_created(kind: EntityKind) {
    counter!("fitnotes_sync_records_created_total", "kind" => kind.name()).increment(1);
}

/// Record a per-row create failure
pub fn record_create_failure(kind: EntityKind) {
    counter!("fitnotes_sync_create_failures_total", "kind" => kind.name()).increment(1);
}

/// Record a fatal error by phase
pub fn record_fatal(phase: &'static str) {
    counter!("fitnotes_sync_fatal_errors_total", "phase" => phase).increment(1);
}

/// Record phase duration for a kind
pub fn record_phase(kind: EntityKind, phase: &'static str, duration: Duration) {
    histogram!(
        "fitnotes_sync_phase_seconds",
        "kind" => kind.name(),
        "phase" => phase
    )
    .record(duration.as_secs_f64());
}

/// Record a whole run
pub fn record_run(outcome: &'static str, duration: Duration) {
    counter!("fitnotes_sync_runs_total", "outcome" => outcome).increment(1);
    histogram!("fitnotes_sync_run_seconds").record(duration.as_secs_f64());
}

/// A timing guard that records a phase duration on drop
pub struct PhaseTimer {
    kind: EntityKind,
    phase: &'static str,
    start: Instant,
}

impl PhaseTimer {
    /// Start a new phase timer
    pub fn new(kind: EntityKind, phase: &'static str) -> Self {
        Self {
            kind,
            phase,
            start: Instant::now(),
        }
    }
}

impl Drop for PhaseTimer {
    fn drop(&mut self) {
        record_phase(self.kind, self.phase, self.start.elapsed());
    }
}
