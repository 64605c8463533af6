//! Sync error types.

/// Errors that can occur while synchronizing the config file.
///
/// A missing remote file is not an error: it is reported as a first run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// GitHub rejected the token (HTTP 401). The stored credential is discarded.
    #[error("Token is invalid or expired, please run setup again")]
    AuthInvalid,

    /// Any other non-success reply. `message` is GitHub's own text.
    #[error("GitHub error {status}: {message}")]
    Remote { status: u16, message: String },

    /// The remote file is not valid config JSON.
    #[error("Cannot parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// The reply could not be decoded (bad base64, not UTF-8, unexpected shape).
    #[error("Invalid reply from GitHub: {0}")]
    InvalidPayload(String),

    /// The request never got an HTTP reply.
    #[error("Cannot reach GitHub: {0}")]
    Transport(String),

    /// Another fetch or save is still in flight on this session.
    #[error("Another request is still in progress")]
    Busy,

    /// Save attempted before the remote file was fetched.
    #[error("Config has not been loaded yet")]
    NotLoaded,
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
