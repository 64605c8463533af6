//! GitHub Contents API access.
//!
//! `ContentsApi` is the seam between the sync protocol and HTTP: it only
//! moves bytes and reports the status code, all interpretation happens in
//! `client`. `GitHubContents` is the real implementation; tests plug in an
//! in-process fake.

use super::error::{SyncError, SyncResult};
use crate::config::GitHubConfig;
use crate::credentials::Credential;
use serde::Serialize;
use tracing::debug;

/// Raw HTTP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReply {
    pub status: u16,
    pub body: String,
}

impl RemoteReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Body of a create-or-update file request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutFileRequest {
    /// Commit message
    pub message: String,
    /// Base64 encoded file content
    pub content: String,
    /// Blob SHA of the file being replaced; omitted when creating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// Read and write one file in a repository.
pub trait ContentsApi: Send + Sync {
    /// `GET /repos/{owner}/{repo}/contents/{path}`
    fn get_file(&self, credential: &Credential) -> SyncResult<RemoteReply>;

    /// `PUT /repos/{owner}/{repo}/contents/{path}`
    fn put_file(&self, credential: &Credential, request: &PutFileRequest)
        -> SyncResult<RemoteReply>;
}

impl<T: ContentsApi + ?Sized> ContentsApi for &T {
    fn get_file(&self, credential: &Credential) -> SyncResult<RemoteReply> {
        (**self).get_file(credential)
    }

    fn put_file(
        &self,
        credential: &Credential,
        request: &PutFileRequest,
    ) -> SyncResult<RemoteReply> {
        (**self).put_file(credential, request)
    }
}

/// Contents API over HTTPS.
pub struct GitHubContents {
    client: reqwest::blocking::Client,
    api_base: String,
    file_path: String,
    user_agent: String,
}

impl Default for GitHubContents {
    fn default() -> Self {
        Self::from_config(&GitHubConfig::default())
    }
}

impl GitHubContents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &GitHubConfig) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            file_path: config.file_path.trim_start_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Contents URL of the config file in the credential's repository.
    pub fn file_url(&self, credential: &Credential) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, credential.owner, credential.repo, self.file_path
        )
    }

    fn request(
        &self,
        method: reqwest::Method,
        credential: &Credential,
    ) -> reqwest::blocking::RequestBuilder {
        self.client
            .request(method, self.file_url(credential))
            .header("Authorization", format!("token {}", credential.token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", &self.user_agent)
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    fn send(request: reqwest::blocking::RequestBuilder) -> SyncResult<RemoteReply> {
        let response = request
            .send()
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        debug!("[Contents] HTTP {} ({} bytes)", status, body.len());
        Ok(RemoteReply { status, body })
    }
}

impl ContentsApi for GitHubContents {
    fn get_file(&self, credential: &Credential) -> SyncResult<RemoteReply> {
        debug!("[Contents] GET {}", self.file_url(credential));
        Self::send(self.request(reqwest::Method::GET, credential))
    }

    fn put_file(
        &self,
        credential: &Credential,
        request: &PutFileRequest,
    ) -> SyncResult<RemoteReply> {
        debug!(
            "[Contents] PUT {} (sha: {})",
            self.file_url(credential),
            request.sha.as_deref().unwrap_or("<create>")
        );
        Self::send(self.request(reqwest::Method::PUT, credential).json(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_url() {
        let remote = GitHubContents::new();
        let credential = Credential::new("acme", "news", "t1");
        assert_eq!(
            remote.file_url(&credential),
            "https://api.github.com/repos/acme/news/contents/config.json"
        );
    }

    #[test]
    fn test_file_url_from_config() {
        let config = GitHubConfig {
            api_base: "https://ghe.example.com/api/v3/".to_string(),
            file_path: "/bot/config.json".to_string(),
            ..GitHubConfig::default()
        };
        let remote = GitHubContents::from_config(&config);
        let credential = Credential::new("acme", "news", "t1");
        assert_eq!(
            remote.file_url(&credential),
            "https://ghe.example.com/api/v3/repos/acme/news/contents/bot/config.json"
        );
    }

    #[test]
    fn test_put_request_omits_missing_sha() {
        let create = PutFileRequest {
            message: "Update config".to_string(),
            content: "e30=".to_string(),
            sha: None,
        };
        let json = serde_json::to_value(&create).unwrap();
        assert!(json.get("sha").is_none());

        let update = PutFileRequest {
            sha: Some("abc123".to_string()),
            ..create
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["sha"], "abc123");
    }
}
