//! Credential store - owner/repo/token triple persisted across runs.
//!
//! The credential is stored as one JSON record under a fixed key. A record
//! that is missing, unparsable or incomplete is treated as "no credential":
//! the user simply goes through setup again.

pub mod backend;

pub use backend::{FileStore, KeyValueStore, KeyringStore, MemoryStore};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Key under which the credential record is stored.
pub const DEFAULT_CREDENTIAL_KEY: &str = "newsbot_config";

/// Access to one GitHub repository.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Repository owner (user or organization)
    #[serde(default)]
    pub owner: String,
    /// Repository name
    #[serde(default)]
    pub repo: String,
    /// Personal access token
    #[serde(default)]
    pub token: String,
}

impl Credential {
    /// Build from user input, trimming surrounding whitespace.
    pub fn new(owner: &str, repo: &str, token: &str) -> Self {
        Self {
            owner: owner.trim().to_string(),
            repo: repo.trim().to_string(),
            token: token.trim().to_string(),
        }
    }

    /// All three fields present.
    pub fn is_complete(&self) -> bool {
        !self.owner.is_empty() && !self.repo.is_empty() && !self.token.is_empty()
    }
}

// Never print the token
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &"***")
            .finish()
    }
}

/// Reads and writes the credential record through a storage backend.
pub struct CredentialStore<S> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> CredentialStore<S> {
    pub fn new(backend: S) -> Self {
        Self::with_key(backend, DEFAULT_CREDENTIAL_KEY)
    }

    pub fn with_key(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the stored credential, if a usable one exists.
    pub fn load(&self) -> Option<Credential> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cannot read stored credential: {:#}", e);
                return None;
            }
        };

        match serde_json::from_str::<Credential>(&raw) {
            Ok(credential) if credential.is_complete() => Some(credential),
            Ok(_) => {
                warn!("Stored credential is incomplete, ignoring it");
                None
            }
            Err(e) => {
                warn!("Stored credential is malformed, ignoring it: {}", e);
                None
            }
        }
    }

    /// Persist the credential, replacing any previous one.
    pub fn save(&self, credential: &Credential) -> Result<()> {
        if !credential.is_complete() {
            bail!("Owner, repository and token are all required");
        }

        let json = serde_json::to_string(credential).context("Cannot serialize credential")?;
        self.backend.set(&self.key, &json)
    }

    /// Remove the stored credential.
    pub fn clear(&self) -> Result<()> {
        self.backend.remove(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore<MemoryStore> {
        CredentialStore::new(MemoryStore::new())
    }

    #[test]
    fn test_save_load_clear() -> Result<()> {
        let store = store();
        assert!(store.load().is_none());

        let credential = Credential::new(" acme ", "news", "t1\n");
        store.save(&credential)?;
        let loaded = store.load().expect("credential should load");
        assert_eq!(loaded.owner, "acme");
        assert_eq!(loaded.token, "t1");

        store.save(&Credential::new("acme", "other", "t2"))?;
        assert_eq!(store.load().map(|c| c.repo), Some("other".to_string()));

        store.clear()?;
        assert!(store.load().is_none());
        Ok(())
    }

    #[test]
    fn test_malformed_record_is_absent() -> Result<()> {
        let store = store();
        store.backend().set(DEFAULT_CREDENTIAL_KEY, "{not json")?;
        assert!(store.load().is_none());
        Ok(())
    }

    #[test]
    fn test_incomplete_record_is_absent() -> Result<()> {
        let store = store();
        store
            .backend()
            .set(DEFAULT_CREDENTIAL_KEY, r#"{"owner":"acme","repo":"news","token":""}"#)?;
        assert!(store.load().is_none());

        store
            .backend()
            .set(DEFAULT_CREDENTIAL_KEY, r#"{"owner":"acme","repo":"news"}"#)?;
        assert!(store.load().is_none());
        Ok(())
    }

    #[test]
    fn test_save_rejects_incomplete() {
        let store = store();
        assert!(store.save(&Credential::new("acme", "", "t1")).is_err());
        assert!(store.load().is_none());
    }

    #[test]
    fn test_debug_hides_token() {
        let credential = Credential::new("acme", "news", "ghp_secret");
        let printed = format!("{:?}", credential);
        assert!(printed.contains("acme"));
        assert!(!printed.contains("ghp_secret"));
    }

    #[test]
    fn test_stored_record_shape() -> Result<()> {
        let store = store();
        store.save(&Credential::new("acme", "news", "t1"))?;
        let raw = store.backend().get(DEFAULT_CREDENTIAL_KEY)?.unwrap_or_default();
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        assert_eq!(value["owner"], "acme");
        assert_eq!(value["repo"], "news");
        assert_eq!(value["token"], "t1");
        Ok(())
    }
}
