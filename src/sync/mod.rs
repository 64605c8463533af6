//! Sync module - keeps the config document in step with the file on GitHub.
//!
//! This module contains:
//! - `ContentsApi` seam and the `GitHubContents` HTTP implementation
//! - Stateless fetch / conditional save protocol
//! - `ConfigSession`, the stateful editing session with a busy guard

pub mod client;
pub mod error;
pub mod payload;
pub mod remote;
pub mod session;

pub use client::{fetch_remote, push_prepared, save_remote, FetchOutcome, Revision};
pub use error::{SyncError, SyncResult};
pub use payload::{decode_content, encode_content, prepare_for_save, PreparedPayload};
pub use remote::{ContentsApi, GitHubContents, PutFileRequest, RemoteReply};
pub use session::{ConfigSession, FetchStatus, SyncPhase, DEFAULT_COMMIT_MESSAGE};
