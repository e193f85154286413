// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the sync engine.
//!
//! # Example
//!
//! ```
//! use fitnotes_sync::{Collections, SyncConfig};
//!
//! let config = SyncConfig::new(
//!     "secret_token",
//!     Collections {
//!         bodyweight: "db-bodyweight".into(),
//!         exercise: "db-exercise".into(),
//!         workout: "db-workout".into(),
//!     },
//! );
//! assert_eq!(config.page_size, 100);
//! ```
//!
//! From the process environment, see [`SyncConfig::from_env`].

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::entity::EntityKind;

pub const ENV_NOTION_TOKEN: &str = "NOTION_API_KEY";
pub const ENV_BODYWEIGHT_DB: &str = "NOTION_BODYWEIGHT_DATABASE_ID";
pub const ENV_EXERCISE_DB: &str = "NOTION_EXERCISE_DATABASE_ID";
pub const ENV_WORKOUT_DB: &str = "NOTION_WORKOUT_DATABASE_ID";
pub const ENV_PAGE_SIZE: &str = "NOTION_PAGE_SIZE";
pub const ENV_NOTION_API_URL: &str = "NOTION_API_URL";
pub const ENV_BACKUP_PATH: &str = "FITNOTES_BACKUP_PATH";
pub const ENV_TOKEN_PATH: &str = "FITNOTES_TOKEN_PATH";
pub const ENV_CREDENTIALS_PATH: &str = "FITNOTES_CREDENTIALS_PATH";
pub const ENV_INTERACTIVE: &str = "IS_OFFLINE";

/// Largest page the Notion query endpoint accepts
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Required configuration value {0} is not set")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    /// An unconfigured deployment has nothing to sync; a misconfigured one
    /// is broken.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing(_))
    }
}

/// Remote collection (Notion database) per entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Collections {
    pub bodyweight: String,
    pub exercise: String,
    pub workout: String,
}

impl Collections {
    #[must_use]
    pub fn get(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Bodyweight => &self.bodyweight,
            EntityKind::Exercise => &self.exercise,
            EntityKind::Workout => &self.workout,
        }
    }
}

/// Where the FitNotes snapshot comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BackupConfig {
    /// Use this snapshot instead of downloading one
    #[serde(default)]
    pub local_path: Option<PathBuf>,

    /// Cached Google OAuth token
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,

    /// Installed-app client secrets, used for interactive authorization
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,

    /// Allow the browser authorization flow and persist refreshed tokens
    #[serde(default)]
    pub interactive: bool,

    /// Backup file names must contain both of these
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    #[serde(default = "default_name_suffix")]
    pub name_suffix: String,

    /// Loopback port for the authorization redirect
    #[serde(default = "default_redirect_port")]
    pub redirect_port: u16,
}

fn default_token_path() -> PathBuf { PathBuf::from("token.json") }
fn default_credentials_path() -> PathBuf { PathBuf::from("credentials.json") }
fn default_name_prefix() -> String { "FitNotes_Backup_".to_string() }
fn default_name_suffix() -> String { ".fitnotes".to_string() }
fn default_redirect_port() -> u16 { 8080 }

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            local_path: None,
            token_path: default_token_path(),
            credentials_path: default_credentials_path(),
            interactive: false,
            name_prefix: default_name_prefix(),
            name_suffix: default_name_suffix(),
            redirect_port: default_redirect_port(),
        }
    }
}

/// Configuration for one sync run.
#[derive(Clone, Deserialize)]
pub struct SyncConfig {
    /// Notion integration token
    pub notion_token: String,

    /// Target database per entity kind
    pub collections: Collections,

    /// Page size for remote queries (default: 100, the Notion maximum)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_notion_api_url")]
    pub notion_api_url: String,

    /// Value of the `Notion-Version` header
    #[serde(default = "default_notion_version")]
    pub notion_version: String,

    /// Per-request timeout for remote calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub backup: BackupConfig,
}

fn default_page_size() -> usize { MAX_PAGE_SIZE }
fn default_notion_api_url() -> String { "https://api.notion.com".to_string() }
fn default_notion_version() -> String { "2022-06-28".to_string() }
fn default_request_timeout_secs() -> u64 { 30 }

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("notion_token", &"<redacted>")
            .field("collections", &self.collections)
            .field("page_size", &self.page_size)
            .field("notion_api_url", &self.notion_api_url)
            .field("notion_version", &self.notion_version)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("backup", &self.backup)
            .finish()
    }
}

impl SyncConfig {
    /// Config with defaults for everything but the required values.
    pub fn new(notion_token: impl Into<String>, collections: Collections) -> Self {
        Self {
            notion_token: notion_token.into(),
            collections,
            page_size: default_page_size(),
            notion_api_url: default_notion_api_url(),
            notion_version: default_notion_version(),
            request_timeout_secs: default_request_timeout_secs(),
            backup: BackupConfig::default(),
        }
    }

    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from any name to value lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let collections = Collections {
            bodyweight: require(ENV_BODYWEIGHT_DB)?,
            exercise: require(ENV_EXERCISE_DB)?,
            workout: require(ENV_WORKOUT_DB)?,
        };
        let mut config = Self::new(require(ENV_NOTION_TOKEN)?, collections);

        if let Some(raw) = get(ENV_PAGE_SIZE) {
            config.page_size = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: ENV_PAGE_SIZE,
                reason: format!("'{}' is not a positive integer", raw),
            })?;
        }
        if let Some(url) = get(ENV_NOTION_API_URL) {
            config.notion_api_url = url;
        }

        config.backup.local_path = get(ENV_BACKUP_PATH).map(PathBuf::from);
        if let Some(path) = get(ENV_TOKEN_PATH) {
            config.backup.token_path = PathBuf::from(path);
        }
        if let Some(path) = get(ENV_CREDENTIALS_PATH) {
            config.backup.credentials_path = PathBuf::from(path);
        }
        config.backup.interactive = get(ENV_INTERACTIVE).is_some();

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid {
                name: ENV_PAGE_SIZE,
                reason: format!("must be between 1 and {}, got {}", MAX_PAGE_SIZE, self.page_size),
            });
        }
        Ok(())
    }
}
