// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use thiserror::Error;

use crate::record::{PropertySet, RemoteRecord};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Remote API rejected request (HTTP {status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("Unexpected response from remote store: {0}")]
    Protocol(String),
}

/// One page of a collection query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub results: Vec<RemoteRecord>,
    /// Whether the store holds more records after this page
    pub has_more: bool,
    /// Cursor for the next page, present when `has_more`
    pub next_cursor: Option<String>,
}

/// The two remote document store operations the engine consumes.
///
/// Implementations are injected into [`crate::SyncEngine`] and owned by the
/// caller. The engine never overlaps calls.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch one page of `collection_id`, starting after `cursor`.
    async fn query(
        &self,
        collection_id: &str,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<QueryPage, RemoteError>;

    /// Create one record and return its remote id.
    async fn create(&self, collection_id: &str, properties: &PropertySet) -> Result<String, RemoteError>;
}
