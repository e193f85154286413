// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Remote index building.
//!
//! Reads the full remote state of a collection and derives the two lookups the
//! orchestrator needs:
//! - [`KnownIds`]: origin ids already present remotely (the dedup set)
//! - [`CrossReferenceIndex`]: origin id to remote id, for linking dependent kinds
//!
//! Pagination is exhaustive and never retried: a failed page aborts the whole
//! fetch so a truncated index can't pass for a complete one.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, warn};

use crate::entity::EntityKind;
use crate::record::RemoteRecord;
use crate::remote::{RemoteError, RemoteStore};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("fetching remote {kind} records failed on page {page}: {source}")]
    Page {
        kind: EntityKind,
        page: usize,
        #[source]
        source: RemoteError,
    },
    #[error("remote {kind} page {page} reported more results but no cursor")]
    MissingCursor { kind: EntityKind, page: usize },
    #[error("remote {kind} page {page} returned the cursor it was given")]
    StalledCursor { kind: EntityKind, page: usize },
}

/// Fetch every record of a collection, following cursors until exhausted.
///
/// Records are returned in the order the store produced them.
pub async fn fetch_all(
    store: &dyn RemoteStore,
    kind: EntityKind,
    collection_id: &str,
    page_size: usize,
) -> Result<Vec<RemoteRecord>, IndexError> {
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page = 1;

    loop {
        let result = store
            .query(collection_id, page_size, cursor.as_deref())
            .await
            .map_err(|source| IndexError::Page { kind, page, source })?;

        crate::metrics::record_remote_page(kind, result.results.len());
        records.extend(result.results);

        if !result.has_more {
            debug!(kind = %kind, pages = page, records = records.len(), "Remote index fetched");
            return Ok(records);
        }

        let next = result
            .next_cursor
            .ok_or(IndexError::MissingCursor { kind, page })?;
        if cursor.as_deref() == Some(next.as_str()) {
            return Err(IndexError::StalledCursor { kind, page });
        }
        cursor = Some(next);
        page += 1;
    }
}

/// Origin ids already present in a remote collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownIds {
    ids: HashSet<i64>,
    /// Remote records without an integer dedup property
    pub untracked: usize,
    /// Remote records repeating an origin id already seen
    pub duplicates: usize,
}

impl KnownIds {
    #[must_use]
    pub fn contains(&self, origin_id: i64) -> bool {
        self.ids.contains(&origin_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<i64> for KnownIds {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
            ..Self::default()
        }
    }
}

/// Project the dedup property of each record into a membership set.
#[must_use]
pub fn extract_known_ids(records: &[RemoteRecord]) -> KnownIds {
    let mut known = KnownIds::default();

    for record in records {
        match record.origin_id() {
            Some(origin_id) => {
                if !known.ids.insert(origin_id) {
                    known.duplicates += 1;
                    warn!(origin_id, remote_id = %record.id, "Duplicate remote record for origin id");
                }
            }
            None => {
                known.untracked += 1;
                warn!(remote_id = %record.id, "Remote record has no integer origin id, ignoring");
            }
        }
    }

    known
}

/// Run-scoped map from a reference kind's origin id to its remote id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossReferenceIndex {
    entries: HashMap<i64, String>,
}

impl CrossReferenceIndex {
    /// Build from fetched records. The first record claiming an origin id wins.
    #[must_use]
    pub fn from_records(records: &[RemoteRecord]) -> Self {
        let mut index = Self::default();
        for record in records {
            if let Some(origin_id) = record.origin_id() {
                if !index.absorb(origin_id, &record.id) {
                    warn!(origin_id, remote_id = %record.id, "Ignoring duplicate cross-reference");
                }
            }
        }
        index
    }

    /// Add an entry unless the origin id is already mapped. Returns whether it was added.
    pub fn absorb(&mut self, origin_id: i64, remote_id: &str) -> bool {
        if self.entries.contains_key(&origin_id) {
            return false;
        }
        self.entries.insert(origin_id, remote_id.to_string());
        true
    }

    /// Merge another index; existing entries are kept.
    pub fn merge(&mut self, other: &CrossReferenceIndex) {
        for (origin_id, remote_id) in &other.entries {
            self.absorb(*origin_id, remote_id);
        }
    }

    #[must_use]
    pub fn resolve(&self, origin_id: i64) -> Option<&str> {
        self.entries.get(&origin_id).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
