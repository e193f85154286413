// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Google Drive backup acquisition.
//!
//! Credential resolution, in order:
//! 1. Cached token file, if the access token has not expired
//! 2. Refresh with the cached refresh token
//! 3. Interactive installed-app authorization (loopback redirect), only when
//!    [`BackupConfig::interactive`] is set
//!
//! Tokens are written back to the cache in interactive mode only.
//!
//! The newest backup is the first file when sorting matching names descending;
//! FitNotes names its backups `FitNotes_Backup_<timestamp>.fitnotes`.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::{AcquisitionError, SourceFile, SourceProvider};
use crate::config::BackupConfig;
use crate::resilience::retry::{retry_if, RetryConfig};

pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";
const DEFAULT_API_URL: &str = "https://www.googleapis.com";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const SNAPSHOT_FILE_NAME: &str = "db.sqlite";
/// Tokens this close to expiry are refreshed up front
const EXPIRY_MARGIN_SECS: u64 = 60;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Cached OAuth credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Expiry as unix seconds
    #[serde(default)]
    pub expires_at: Option<u64>,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl StoredToken {
    #[must_use]
    pub fn is_valid(&self, now: u64) -> bool {
        !self.access_token.is_empty()
            && self.expires_at.map_or(true, |exp| exp > now + EXPIRY_MARGIN_SECS)
    }

    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Merge a token endpoint response. Refresh responses omit the refresh
    /// token, so the previous one is kept.
    fn updated(&self, response: TokenResponse, now: u64) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or_else(|| self.refresh_token.clone()),
            expires_at: response.expires_in.map(|secs| now + secs),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            token_uri: self.token_uri.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Installed-app client secrets as downloaded from the Google console.
#[derive(Debug, Clone, Deserialize)]
struct ClientSecrets {
    client_id: String,
    client_secret: String,
    #[serde(default = "default_auth_uri")]
    auth_uri: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Drive search expression for backup files.
#[must_use]
pub fn backup_query(prefix: &str, suffix: &str) -> String {
    let quote = |s: &str| s.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name contains '{}' and name contains '{}' and trashed = false",
        quote(prefix),
        quote(suffix)
    )
}

/// Largest loopback request head read before giving up on a connection.
const MAX_REDIRECT_REQUEST: usize = 16 * 1024;

/// What a request to the loopback listener carried.
#[derive(Debug, PartialEq, Eq)]
enum Redirect {
    Code(String),
    Denied(String),
    /// Anything else the browser asks for (favicon, bare `/`)
    Other,
}

/// Classify a loopback request by its request line.
fn parse_redirect(request: &str) -> Redirect {
    let Some(target) = request.lines().next().and_then(|line| line.split_whitespace().nth(1)) else {
        return Redirect::Other;
    };
    let Ok(url) = Url::parse(&format!("http://localhost{}", target)) else {
        return Redirect::Other;
    };

    let mut code = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => return Redirect::Denied(value.into_owned()),
            _ => {}
        }
    }
    code.map_or(Redirect::Other, Redirect::Code)
}

/// Read up to the end of the request head. Empty when the peer closed first.
async fn read_request_head(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") && head.len() < MAX_REDIRECT_REQUEST {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&buf[..n]);
    }
    Ok(String::from_utf8_lossy(&head).into_owned())
}

/// Answer one loopback connection. `None` when it did not carry the redirect.
async fn serve_redirect(mut stream: TcpStream) -> Option<Result<String, AcquisitionError>> {
    let request = match read_request_head(&mut stream).await {
        Ok(request) if !request.is_empty() => request,
        Ok(_) => return None,
        Err(e) => {
            debug!(error = %e, "Dropped loopback connection");
            return None;
        }
    };

    let (status, body, outcome) = match parse_redirect(&request) {
        Redirect::Code(code) => ("200 OK", "Authorization complete. You can close this window.", Some(Ok(code))),
        Redirect::Denied(reason) => (
            "200 OK",
            "Authorization failed. Check the sync log.",
            Some(Err(AcquisitionError::Authorization(reason))),
        ),
        Redirect::Other => ("404 Not Found", "Not found", None),
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    // The browser reply is best effort; the code is what matters.
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
    outcome
}

/// Serve the loopback listener until a request carries a code or an error.
///
/// Connections are handled concurrently: browsers open idle preconnect
/// sockets and ask for `/favicon.ico` alongside the redirect.
async fn wait_for_code(listener: &TcpListener) -> Result<String, AcquisitionError> {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                debug!(peer = %peer, "Loopback connection");
                connections.spawn(serve_redirect(stream));
            }
            Some(joined) = connections.join_next() => {
                if let Ok(Some(outcome)) = joined {
                    return outcome;
                }
            }
        }
    }
}

/// Downloads the newest FitNotes backup from Google Drive.
pub struct DriveBackup {
    config: BackupConfig,
    client: Client,
    retry: RetryConfig,
    api_url: String,
}

impl DriveBackup {
    pub fn new(config: BackupConfig) -> Result<Self, AcquisitionError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AcquisitionError::Drive { status: None, message: e.to_string() })?;

        Ok(Self {
            config,
            client,
            retry: RetryConfig::acquisition(),
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Point file listing and download at another Drive API root.
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn send(request: RequestBuilder) -> Result<Response, AcquisitionError> {
        let response = request
            .send()
            .await
            .map_err(|e| AcquisitionError::Drive { status: None, message: e.to_string() })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(AcquisitionError::Drive { status: Some(status.as_u16()), message })
    }

    // ---- credentials ----

    async fn load_token(path: &Path) -> Option<StoredToken> {
        let bytes = tokio::fs::read(path).await.ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable token cache");
                None
            }
        }
    }

    async fn save_token(&self, token: &StoredToken) -> Result<(), AcquisitionError> {
        let bytes = serde_json::to_vec_pretty(token)
            .map_err(|e| AcquisitionError::Io(std::io::Error::other(e)))?;
        tokio::fs::write(&self.config.token_path, bytes).await?;
        debug!(path = %self.config.token_path.display(), "Token cache written");
        Ok(())
    }

    async fn credentials(&self) -> Result<StoredToken, AcquisitionError> {
        let cached = Self::load_token(&self.config.token_path).await;

        let token = match cached {
            Some(token) if token.is_valid(now_secs()) => return Ok(token),
            Some(token) if token.can_refresh() => {
                info!("Access token expired, refreshing");
                retry_if("drive_token_refresh", &self.retry, || self.refresh(&token), AcquisitionError::is_transient)
                    .await
                    .map_err(|e| AcquisitionError::CredentialRefresh(e.to_string()))?
            }
            _ if self.config.interactive => self.authorize().await?,
            _ => return Err(AcquisitionError::NoCredentials),
        };

        if self.config.interactive {
            self.save_token(&token).await?;
        }
        Ok(token)
    }

    async fn refresh(&self, token: &StoredToken) -> Result<StoredToken, AcquisitionError> {
        let refresh_token = token.refresh_token.as_deref().unwrap_or_default();
        let response = Self::send(self.client.post(&token.token_uri).form(&[
            ("client_id", token.client_id.as_str()),
            ("client_secret", token.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ]))
        .await?;

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AcquisitionError::CredentialRefresh(e.to_string()))?;
        Ok(token.updated(body, now_secs()))
    }

    async fn load_secrets(path: &Path) -> Result<ClientSecrets, AcquisitionError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AcquisitionError::Authorization(format!("cannot read client secrets {}: {}", path.display(), e))
        })?;
        let file: ClientSecretsFile = serde_json::from_slice(&bytes)
            .map_err(|e| AcquisitionError::Authorization(format!("invalid client secrets: {}", e)))?;
        file.installed
            .or(file.web)
            .ok_or_else(|| AcquisitionError::Authorization("client secrets have no client entry".into()))
    }

    fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/", self.config.redirect_port)
    }

    fn authorization_url(&self, secrets: &ClientSecrets) -> Result<Url, AcquisitionError> {
        Url::parse_with_params(
            &secrets.auth_uri,
            &[
                ("client_id", secrets.client_id.as_str()),
                ("redirect_uri", self.redirect_uri().as_str()),
                ("response_type", "code"),
                ("scope", DRIVE_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| AcquisitionError::Authorization(e.to_string()))
    }

    /// Installed-app flow: wait for the browser to hit the loopback redirect.
    async fn authorize(&self) -> Result<StoredToken, AcquisitionError> {
        let secrets = Self::load_secrets(&self.config.credentials_path).await?;
        let url = self.authorization_url(&secrets)?;

        let listener = TcpListener::bind(("127.0.0.1", self.config.redirect_port)).await?;
        info!(url = %url, "Open this URL in a browser to authorize Drive access");
        let code = wait_for_code(&listener).await?;

        let response = Self::send(self.client.post(&secrets.token_uri).form(&[
            ("code", code.as_str()),
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri().as_str()),
            ("grant_type", "authorization_code"),
        ]))
        .await
        .map_err(|e| AcquisitionError::Authorization(e.to_string()))?;

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AcquisitionError::Authorization(e.to_string()))?;

        let blank = StoredToken {
            access_token: String::new(),
            refresh_token: None,
            expires_at: None,
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            token_uri: secrets.token_uri.clone(),
        };
        info!("Drive access authorized");
        Ok(blank.updated(body, now_secs()))
    }

    // ---- files ----

    async fn find_latest(&self, token: &StoredToken) -> Result<DriveFile, AcquisitionError> {
        let query = backup_query(&self.config.name_prefix, &self.config.name_suffix);
        let url = format!("{}/drive/v3/files", self.api_url);
        let (url, q) = (url.as_str(), query.as_str());

        let list: FileList = retry_if(
            "drive_list_backups",
            &self.retry,
            || async move {
                Self::send(
                    self.client
                        .get(url)
                        .bearer_auth(&token.access_token)
                        .query(&[
                            ("q", q),
                            ("fields", "files(id, name)"),
                            ("orderBy", "name desc"),
                            ("pageSize", "1"),
                        ]),
                )
                .await?
                .json::<FileList>()
                .await
                .map_err(|e| AcquisitionError::Drive { status: None, message: e.to_string() })
            },
            AcquisitionError::is_transient,
        )
        .await?;

        info!(files = ?list.files, "Found backup files");
        list.files.into_iter().next().ok_or(AcquisitionError::NoBackupFound { pattern: query })
    }

    async fn download_once(
        &self,
        token: &StoredToken,
        file: &DriveFile,
        dest: &Path,
    ) -> Result<u64, AcquisitionError> {
        let url = format!("{}/drive/v3/files/{}", self.api_url, file.id);
        let mut response = Self::send(
            self.client
                .get(&url)
                .bearer_auth(&token.access_token)
                .query(&[("alt", "media")]),
        )
        .await?;

        let total = response.content_length();
        let mut out = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        let mut last_decile = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AcquisitionError::Download(e.to_string()))?
        {
            out.write_all(&chunk).await?;
            written += chunk.len() as u64;

            if let Some(total) = total.filter(|t| *t > 0) {
                let decile = written * 10 / total;
                if decile > last_decile {
                    last_decile = decile;
                    info!("Download {}%", (written * 100 / total).min(100));
                }
            }
        }
        out.flush().await?;

        if let Some(total) = total {
            if written != total {
                return Err(AcquisitionError::Download(format!(
                    "expected {} bytes, received {}",
                    total, written
                )));
            }
        }
        Ok(written)
    }
}

#[async_trait]
impl SourceProvider for DriveBackup {
    #[tracing::instrument(skip(self))]
    async fn get_local_file(&self) -> Result<SourceFile, AcquisitionError> {
        let token = self.credentials().await?;
        let latest = self.find_latest(&token).await?;
        info!(name = %latest.name, "Found latest backup file");

        let workdir = tempfile::tempdir()?;
        let dest: PathBuf = workdir.path().join(SNAPSHOT_FILE_NAME);

        let bytes = retry_if(
            "drive_download",
            &self.retry,
            || self.download_once(&token, &latest, &dest),
            AcquisitionError::is_transient,
        )
        .await?;

        info!(path = %dest.display(), bytes, "Downloaded backup");
        Ok(SourceFile::temporary(dest, workdir))
    }
}
