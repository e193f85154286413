// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory remote store with real cursor pagination.
//!
//! Used for dry runs and tests. Cursors are opaque offsets into the insertion
//! order of a collection.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::traits::{QueryPage, RemoteError, RemoteStore};
use crate::record::{PropertySet, RemoteRecord};

pub struct InMemoryRemoteStore {
    collections: DashMap<String, Vec<RemoteRecord>>,
    next_id: AtomicU64,
    create_calls: AtomicU64,
    query_calls: AtomicU64,
}

impl InMemoryRemoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: DashMap::new(),
            next_id: AtomicU64::new(1),
            create_calls: AtomicU64::new(0),
            query_calls: AtomicU64::new(0),
        }
    }

    /// Insert pre-existing records, bypassing the create counter.
    pub fn seed(&self, collection_id: &str, records: impl IntoIterator<Item = RemoteRecord>) {
        self.collections
            .entry(collection_id.to_string())
            .or_default()
            .extend(records);
    }

    /// Snapshot of a collection in insertion order.
    #[must_use]
    pub fn records(&self, collection_id: &str) -> Vec<RemoteRecord> {
        self.collections
            .get(collection_id)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    /// Number of records in a collection.
    #[must_use]
    pub fn len(&self, collection_id: &str) -> usize {
        self.collections.get(collection_id).map_or(0, |r| r.len())
    }

    /// Total create calls received
    #[must_use]
    pub fn create_calls(&self) -> u64 {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Total query calls received
    #[must_use]
    pub fn query_calls(&self) -> u64 {
        self.query_calls.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn query(
        &self,
        collection_id: &str,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<QueryPage, RemoteError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        if page_size == 0 {
            return Err(RemoteError::Protocol("page_size must be positive".into()));
        }

        let start = match cursor {
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| RemoteError::Protocol(format!("invalid cursor '{}'", c)))?,
            None => 0,
        };

        let records = self.records(collection_id);
        let end = (start + page_size).min(records.len());
        let results = records.get(start..end).map(<[_]>::to_vec).unwrap_or_default();
        let has_more = end < records.len();

        Ok(QueryPage {
            results,
            has_more,
            next_cursor: has_more.then(|| end.to_string()),
        })
    }

    async fn create(&self, collection_id: &str, properties: &PropertySet) -> Result<String, RemoteError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let id = format!("page-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.collections
            .entry(collection_id.to_string())
            .or_default()
            .push(RemoteRecord::new(id.clone(), properties.to_properties()));
        Ok(id)
    }
}
