// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Local rows with no remote counterpart.

use std::collections::HashSet;

use tracing::warn;

use crate::index::KnownIds;
use crate::record::LocalRow;

/// Rows whose origin id is not in `known`, in local query order.
///
/// A row repeating an origin id seen earlier in `rows` is skipped, so one run
/// never issues two creates for the same id.
#[must_use]
pub fn unsynced_rows<'a>(rows: &'a [LocalRow], known: &KnownIds) -> Vec<&'a LocalRow> {
    let mut seen = HashSet::with_capacity(rows.len());

    rows.iter()
        .filter(|row| {
            let origin_id = row.origin_id();
            if !seen.insert(origin_id) {
                warn!(kind = %row.kind(), origin_id, "Local origin id repeated, skipping");
                return false;
            }
            !known.contains(origin_id)
        })
        .collect()
}
