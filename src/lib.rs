//! newsbot-config library
//!
//! Edits the news bot's `config.json` (keywords, receivers, settings) that
//! lives in a GitHub repository, through the GitHub Contents API.
//! Provides:
//! - Credential store for the owner/repo/token triple
//! - Config document model with save-time cleanup
//! - Fetch / conditional save with revision tracking (optimistic concurrency)

pub mod config;
pub mod credentials;
pub mod document;
pub mod palette;
pub mod sync;

// Re-export main types
pub use config::AppConfig;
pub use credentials::{Credential, CredentialStore, KeyValueStore};
pub use document::{ConfigDocument, Keyword, Receiver, Settings};
pub use sync::{
    ConfigSession, ContentsApi, FetchOutcome, FetchStatus, GitHubContents, Revision, SyncError,
    SyncPhase,
};
