// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Notion REST backend for the remote store.
//!
//! Collections are Notion databases, records are pages:
//! - query: `POST {api}/v1/databases/{id}/query`
//! - create: `POST {api}/v1/pages`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::traits::{QueryPage, RemoteError, RemoteStore};
use crate::config::SyncConfig;
use crate::record::{PropertySet, RemoteRecord};

pub struct NotionStore {
    client: Client,
    api_url: String,
    token: String,
    version: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<RemoteRecord>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct CreateResponse {
    id: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl NotionStore {
    pub fn new(config: &SyncConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.notion_api_url.trim_end_matches('/').to_string(),
            token: config.notion_token.clone(),
            version: config.notion_version.clone(),
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{}", self.api_url, path))
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.version)
    }

    async fn send(request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(api_error(status.as_u16(), &body))
    }
}

/// Turn a non-2xx response body into a [`RemoteError::Api`].
fn api_error(status: u16, body: &str) -> RemoteError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let (code, message) = match parsed {
        Some(ErrorBody { code, message }) => (code, message.unwrap_or_else(|| body.to_string())),
        None => (None, body.to_string()),
    };
    RemoteError::Api { status, code, message }
}

/// Decode a database query response.
fn parse_query_page(body: Value) -> Result<QueryPage, RemoteError> {
    let response: QueryResponse =
        serde_json::from_value(body).map_err(|e| RemoteError::Protocol(e.to_string()))?;
    Ok(QueryPage {
        results: response.results,
        has_more: response.has_more,
        next_cursor: response.next_cursor,
    })
}

#[async_trait]
impl RemoteStore for NotionStore {
    async fn query(
        &self,
        collection_id: &str,
        page_size: usize,
        cursor: Option<&str>,
    ) -> Result<QueryPage, RemoteError> {
        let mut body = json!({ "page_size": page_size });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }

        let response = Self::send(
            self.post(&format!("/v1/databases/{}/query", collection_id)).json(&body),
        )
        .await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::Protocol(e.to_string()))?;

        let page = parse_query_page(body)?;
        debug!(
            collection = collection_id,
            results = page.results.len(),
            has_more = page.has_more,
            "Notion query page"
        );
        Ok(page)
    }

    async fn create(&self, collection_id: &str, properties: &PropertySet) -> Result<String, RemoteError> {
        let body = json!({
            "parent": { "database_id": collection_id },
            "properties": properties,
        });

        let response = Self::send(self.post("/v1/pages").json(&body)).await?;
        let created: CreateResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Protocol(e.to_string()))?;
        Ok(created.id)
    }
}
