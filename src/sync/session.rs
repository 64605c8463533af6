//! Config session - one editable copy of the remote config file.
//!
//! The session owns the canonical in-memory document together with the
//! revision it was last synchronized at, and the credential store used to
//! authorize requests. Callers create one session per editing context and
//! pass it around explicitly.
//!
//! Lifecycle:
//! ```text
//! Uninitialized --fetch--> Synced --edit--> Dirty --save--> Synced
//!        any --fetch rejected (401)--> Unauthenticated (credential cleared)
//! ```
//!
//! Only one network operation may be in flight per session; a second one is
//! refused with `SyncError::Busy`.

use super::client::{self, FetchOutcome, Revision};
use super::error::{SyncError, SyncResult};
use super::payload::{self, PreparedPayload};
use super::remote::ContentsApi;
use crate::credentials::{Credential, CredentialStore, KeyValueStore};
use crate::document::ConfigDocument;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Commit message prefix used when none is configured.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update config";

/// Where the session stands relative to the remote file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Nothing fetched yet
    Uninitialized,
    /// In-memory document matches the remote revision
    Synced,
    /// Local edits not yet saved
    Dirty,
    /// Token was rejected; setup must run again
    Unauthenticated,
}

/// What a session fetch found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// Existing file loaded at this revision
    Existing(Revision),
    /// No file yet, starter document loaded
    FirstRun,
}

struct SessionState {
    phase: SyncPhase,
    document: ConfigDocument,
    revision: Option<Revision>,
    /// Bumped on every change of `document`
    generation: u64,
}

/// Holds the busy flag for the duration of one network operation.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> SyncResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { flag })
            .map_err(|_| SyncError::Busy)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Editing session over one remote config file.
pub struct ConfigSession<R, S> {
    remote: R,
    credentials: CredentialStore<S>,
    commit_message: String,
    state: Mutex<SessionState>,
    busy: AtomicBool,
}

impl<R: ContentsApi, S: KeyValueStore> ConfigSession<R, S> {
    pub fn new(remote: R, credentials: CredentialStore<S>) -> Self {
        Self {
            remote,
            credentials,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            state: Mutex::new(SessionState {
                phase: SyncPhase::Uninitialized,
                document: ConfigDocument::default(),
                revision: None,
                generation: 0,
            }),
            busy: AtomicBool::new(false),
        }
    }

    /// Set the commit message prefix (a timestamp is appended per save).
    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    // A panic while editing leaves the document as the closure left it;
    // there is no invariant spanning fields that could be broken.
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    // ---- credential ----

    pub fn load_credential(&self) -> Option<Credential> {
        self.credentials.load()
    }

    pub fn save_credential(&self, credential: &Credential) -> anyhow::Result<()> {
        self.credentials.save(credential)
    }

    pub fn clear_credential(&self) -> anyhow::Result<()> {
        self.credentials.clear()
    }

    // ---- document ----

    pub fn phase(&self) -> SyncPhase {
        self.state().phase
    }

    /// Revision the document was last fetched or saved at.
    pub fn revision(&self) -> Option<Revision> {
        self.state().revision.clone()
    }

    /// Snapshot of the current document.
    pub fn document(&self) -> ConfigDocument {
        self.state().document.clone()
    }

    /// Mutate the document in place. Every call counts as an edit and marks
    /// a synced session dirty; use [`try_edit`](Self::try_edit) for edits that can fail.
    pub fn edit<T>(&self, f: impl FnOnce(&mut ConfigDocument) -> T) -> T {
        let mut state = self.state();
        let result = f(&mut state.document);
        state.generation += 1;
        if state.phase == SyncPhase::Synced {
            state.phase = SyncPhase::Dirty;
        }
        result
    }

    /// Fallible variant of [`edit`](Self::edit).
    ///
    /// The closure works on a copy. Only an `Ok` result is committed and
    /// counts as an edit; on `Err` the document and phase are unchanged.
    pub fn try_edit<T, E>(
        &self,
        f: impl FnOnce(&mut ConfigDocument) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut state = self.state();
        let mut draft = state.document.clone();
        let value = f(&mut draft)?;
        state.document = draft;
        state.generation += 1;
        if state.phase == SyncPhase::Synced {
            state.phase = SyncPhase::Dirty;
        }
        Ok(value)
    }

    /// What the next save would write.
    pub fn prepare_for_save(&self) -> SyncResult<PreparedPayload> {
        payload::prepare_for_save(&self.state().document)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    // ---- network ----

    /// Load the remote file, replacing the in-memory document.
    ///
    /// A 401 clears the stored credential and moves the session to
    /// `Unauthenticated`. Other failures leave the session unchanged.
    pub fn fetch_remote(&self, credential: &Credential) -> SyncResult<FetchStatus> {
        let _guard = BusyGuard::acquire(&self.busy)?;

        match client::fetch_remote(&self.remote, credential) {
            Ok(outcome) => Ok(self.apply_fetch(outcome)),
            Err(SyncError::AuthInvalid) => {
                if let Err(e) = self.credentials.clear() {
                    warn!("Cannot clear rejected credential: {:#}", e);
                }
                self.state().phase = SyncPhase::Unauthenticated;
                Err(SyncError::AuthInvalid)
            }
            Err(e) => Err(e),
        }
    }

    fn apply_fetch(&self, outcome: FetchOutcome) -> FetchStatus {
        let (document, revision) = outcome.into_parts();
        let mut state = self.state();
        state.document = document;
        state.revision = revision.clone();
        state.generation += 1;
        state.phase = SyncPhase::Synced;

        match revision {
            Some(revision) => FetchStatus::Existing(revision),
            None => FetchStatus::FirstRun,
        }
    }

    /// Write the document, conditional on the revision last seen.
    ///
    /// On success the new revision is recorded and the document is replaced
    /// by its cleaned form. On failure nothing local changes.
    pub fn save_remote(&self, credential: &Credential) -> SyncResult<Revision> {
        let _guard = BusyGuard::acquire(&self.busy)?;

        let (prepared, revision, generation) = {
            let state = self.state();
            if matches!(
                state.phase,
                SyncPhase::Uninitialized | SyncPhase::Unauthenticated
            ) {
                return Err(SyncError::NotLoaded);
            }
            (
                payload::prepare_for_save(&state.document)?,
                state.revision.clone(),
                state.generation,
            )
        };

        let message = format!(
            "{} - {}",
            self.commit_message,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let new_revision =
            client::push_prepared(&self.remote, credential, &prepared, revision.as_ref(), &message)?;

        let mut state = self.state();
        state.revision = Some(new_revision.clone());
        if state.generation == generation {
            state.document = prepared.document;
            state.generation += 1;
            state.phase = SyncPhase::Synced;
        } else {
            // Edited while the request was in flight: keep those edits
            debug!("Document changed during save, staying dirty");
            state.phase = SyncPhase::Dirty;
        }

        info!("Config saved at revision {}", new_revision);
        Ok(new_revision)
    }
}
