//! Sync protocol - fetch and conditional save of the config file.
//!
//! These functions are stateless: the revision returned by a fetch or save
//! is handed back to the caller, who passes it into the next save. A save
//! carrying a revision only succeeds if the remote file is still at that
//! revision; GitHub rejects stale writers instead of overwriting.

use super::error::{SyncError, SyncResult};
use super::payload::{decode_content, encode_content, prepare_for_save, PreparedPayload};
use super::remote::{ContentsApi, PutFileRequest, RemoteReply};
use crate::credentials::Credential;
use crate::document::ConfigDocument;
use serde::Deserialize;
use std::fmt;
use tracing::{info, warn};

/// Identity of one stored version of the remote file (its blob SHA).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn new(sha: impl Into<String>) -> Self {
        Self(sha.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Revision {
    fn from(sha: &str) -> Self {
        Self::new(sha)
    }
}

impl From<String> for Revision {
    fn from(sha: String) -> Self {
        Self(sha)
    }
}

/// Result of a successful fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The file exists at `revision`
    Existing {
        document: ConfigDocument,
        revision: Revision,
    },
    /// No file yet: starter document, next save creates it
    FirstRun { document: ConfigDocument },
}

impl FetchOutcome {
    pub fn document(&self) -> &ConfigDocument {
        match self {
            Self::Existing { document, .. } | Self::FirstRun { document } => document,
        }
    }

    pub fn revision(&self) -> Option<&Revision> {
        match self {
            Self::Existing { revision, .. } => Some(revision),
            Self::FirstRun { .. } => None,
        }
    }

    pub fn is_first_run(&self) -> bool {
        matches!(self, Self::FirstRun { .. })
    }

    pub fn into_parts(self) -> (ConfigDocument, Option<Revision>) {
        match self {
            Self::Existing { document, revision } => (document, Some(revision)),
            Self::FirstRun { document } => (document, None),
        }
    }
}

/// `GET contents` success body (only the fields we use)
#[derive(Debug, Deserialize)]
struct FileResponse {
    #[serde(default)]
    content: String,
    sha: String,
    #[serde(default)]
    encoding: Option<String>,
}

/// `PUT contents` success body
#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

/// GitHub error body
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Turn a non-success reply into `SyncError::Remote`, keeping GitHub's message.
fn remote_error(reply: RemoteReply) -> SyncError {
    let message = serde_json::from_str::<ErrorBody>(&reply.body)
        .ok()
        .and_then(|b| b.message)
        .or_else(|| {
            let body = reply.body.trim();
            (!body.is_empty()).then(|| body.to_string())
        })
        .or_else(|| {
            reqwest::StatusCode::from_u16(reply.status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Unknown error".to_string());

    SyncError::Remote {
        status: reply.status,
        message,
    }
}

/// Fetch the current config file.
pub fn fetch_remote<R: ContentsApi + ?Sized>(
    remote: &R,
    credential: &Credential,
) -> SyncResult<FetchOutcome> {
    let reply = remote.get_file(credential)?;

    match reply.status {
        200..=299 => {
            let file: FileResponse = serde_json::from_str(&reply.body)
                .map_err(|e| SyncError::InvalidPayload(format!("unexpected file reply: {}", e)))?;

            if let Some(encoding) = file.encoding.as_deref() {
                if encoding != "base64" {
                    return Err(SyncError::InvalidPayload(format!(
                        "unsupported content encoding '{}'",
                        encoding
                    )));
                }
            }

            let text = decode_content(&file.content)?;
            let document = ConfigDocument::from_json(&text)?;
            let revision = Revision::new(file.sha);

            info!(
                "[Sync] Loaded {}/{} at {} ({} keywords, {} receivers)",
                credential.owner,
                credential.repo,
                revision,
                document.keywords.len(),
                document.receivers.len()
            );
            Ok(FetchOutcome::Existing { document, revision })
        }
        404 => {
            info!(
                "[Sync] No config file in {}/{}, starting from defaults",
                credential.owner, credential.repo
            );
            Ok(FetchOutcome::FirstRun {
                document: ConfigDocument::starter(),
            })
        }
        401 => {
            warn!("[Sync] Token rejected by GitHub");
            Err(SyncError::AuthInvalid)
        }
        _ => Err(remote_error(reply)),
    }
}

/// Write an already prepared payload.
///
/// With a revision the write is conditional on the file still being at that
/// revision; without one it creates the file.
pub fn push_prepared<R: ContentsApi + ?Sized>(
    remote: &R,
    credential: &Credential,
    prepared: &PreparedPayload,
    revision: Option<&Revision>,
    message: &str,
) -> SyncResult<Revision> {
    let request = PutFileRequest {
        message: message.to_string(),
        content: encode_content(&prepared.content),
        sha: revision.map(|r| r.as_str().to_string()),
    };

    let reply = remote.put_file(credential, &request)?;
    if !reply.is_success() {
        let error = remote_error(reply);
        warn!("[Sync] Save rejected: {}", error);
        return Err(error);
    }

    let saved: PutResponse = serde_json::from_str(&reply.body)
        .map_err(|e| SyncError::InvalidPayload(format!("unexpected save reply: {}", e)))?;
    let new_revision = Revision::new(saved.content.sha);

    info!(
        "[Sync] Saved {}/{}: {} -> {}",
        credential.owner,
        credential.repo,
        revision.map(Revision::as_str).unwrap_or("<new>"),
        new_revision
    );
    Ok(new_revision)
}

/// Clean, serialize and write a document. Returns the new revision.
pub fn save_remote<R: ContentsApi + ?Sized>(
    remote: &R,
    credential: &Credential,
    document: &ConfigDocument,
    revision: Option<&Revision>,
    message: &str,
) -> SyncResult<Revision> {
    let prepared = prepare_for_save(document)?;
    push_prepared(remote, credential, &prepared, revision, message)
}
