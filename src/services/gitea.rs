//! Artifact store client for the Gitea contents API.
//!
//! Every model repository lives under a single service account. The API is
//! treated as a path-addressed blob store: create/read/update/list/delete by
//! `(repository, path)`. Writes target the `main` branch first and fall back
//! to `master` once, which compensates for repositories initialized under
//! either convention. Updates require the file's current SHA (the content
//! API's optimistic-concurrency token), obtained by a prior read.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::GiteaSettings;
use crate::error::{AppError, AppResult};

/// HTTP connect timeout for artifact store calls.
const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for metadata and read calls.
const READ_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for content uploads, which may carry large model files.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);
/// Wait after repository creation so auto-init can finish before the first
/// content write.
const REPO_INIT_DELAY: Duration = Duration::from_secs(2);

/// One entry of a folder listing.
#[derive(Debug, Clone, Deserialize)]
pub struct FolderEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: String,
}

impl FolderEntry {
    pub fn is_dir(&self) -> bool {
        self.entry_type == "dir"
    }

    pub fn is_file(&self) -> bool {
        self.entry_type == "file"
    }
}

/// A file read from the store: decoded text plus the SHA needed to update it.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub text: String,
    pub sha: String,
}

#[derive(Debug, Deserialize)]
struct RepoInfo {
    clone_url: String,
}

#[derive(Debug, Deserialize)]
struct ContentsInfo {
    content: Option<String>,
    sha: String,
}

/// Client for one Gitea instance.
#[derive(Clone)]
pub struct GiteaClient {
    http: reqwest::Client,
    settings: GiteaSettings,
}

impl GiteaClient {
    pub fn new(settings: GiteaSettings) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client for the artifact store");

        Self { http, settings }
    }

    fn auth_header(&self) -> String {
        format!("token {}", self.settings.token.expose_secret())
    }

    /// Percent-encode a repository path, keeping `/` separators intact.
    fn encode_path(path: &str) -> String {
        path.split('/')
            .map(|seg| urlencoding::encode(seg).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn contents_url(&self, repo: &str, path: &str) -> String {
        format!(
            "{}/api/v1/repos/{}/{}/contents/{}",
            self.settings.base_url,
            self.settings.account,
            repo,
            Self::encode_path(path),
        )
    }

    /// Ensure the repository exists, creating it if absent. Returns the
    /// clone URL. A 404 from the existence check is the only status that
    /// triggers creation; anything else non-2xx fails.
    pub async fn ensure_repository(&self, repo: &str, description: &str) -> AppResult<String> {
        let url = format!(
            "{}/api/v1/repos/{}/{}",
            self.settings.base_url, self.settings.account, repo
        );
        debug!("Checking artifact repository: {}", url);

        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .timeout(READ_TIMEOUT)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            let info: RepoInfo = resp.json().await?;
            return Ok(info.clone_url);
        }
        if status.as_u16() != 404 {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::remote(status.as_u16(), body));
        }

        self.create_repository(repo, description).await
    }

    /// Create a repository with an auto-initialized `main` branch.
    async fn create_repository(&self, repo: &str, description: &str) -> AppResult<String> {
        let url = format!("{}/api/v1/user/repos", self.settings.base_url);
        info!("Creating artifact repository: {}", repo);

        let body = json!({
            "name": repo,
            "description": description,
            "private": false,
            "auto_init": true,
            "default_branch": "main",
        });

        let resp = self
            .http
            .post(&url)
            .header("Authorization", self.auth_header())
            .timeout(READ_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::remote(status.as_u16(), body));
        }

        let info: RepoInfo = resp.json().await?;

        // Auto-init commits the initial README asynchronously; writing into
        // the repository too early fails with an empty-repo error.
        tokio::time::sleep(REPO_INIT_DELAY).await;

        Ok(info.clone_url)
    }

    /// Create a new file from raw bytes.
    pub async fn upload_binary(&self, repo: &str, path: &str, bytes: &[u8]) -> AppResult<()> {
        self.create_file(repo, path, &BASE64.encode(bytes)).await
    }

    /// Create a new text file (UTF-8).
    pub async fn upload_text(&self, repo: &str, path: &str, text: &str) -> AppResult<()> {
        self.create_file(repo, path, &BASE64.encode(text.as_bytes()))
            .await
    }

    async fn create_file(&self, repo: &str, path: &str, content_b64: &str) -> AppResult<()> {
        let url = self.contents_url(repo, path);
        let message = format!("Upload file: {}", path);

        for branch in ["main", "master"] {
            let body = json!({
                "content": content_b64,
                "message": message,
                "branch": branch,
            });

            let resp = self
                .http
                .post(&url)
                .header("Authorization", self.auth_header())
                .timeout(UPLOAD_TIMEOUT)
                .json(&body)
                .send()
                .await?;

            let status = resp.status();
            if status.is_success() {
                debug!("Uploaded {} to {} ({})", path, repo, branch);
                return Ok(());
            }

            let body = resp.text().await.unwrap_or_default();
            if branch == "master" {
                return Err(AppError::remote(status.as_u16(), body));
            }
            warn!(
                "Upload to main branch failed (status {}), retrying on master: {}",
                status, body
            );
        }

        unreachable!("branch fallback loop always returns")
    }

    /// Overwrite an existing file. `sha` must come from a prior
    /// [`read_file`](Self::read_file) of the same path; a stale value is
    /// rejected by the remote.
    pub async fn update_file(
        &self,
        repo: &str,
        path: &str,
        text: &str,
        sha: &str,
        message: &str,
    ) -> AppResult<()> {
        let url = self.contents_url(repo, path);
        let content_b64 = BASE64.encode(text.as_bytes());

        for branch in ["main", "master"] {
            let body = json!({
                "content": content_b64,
                "message": message,
                "sha": sha,
                "branch": branch,
            });

            let resp = self
                .http
                .put(&url)
                .header("Authorization", self.auth_header())
                .timeout(UPLOAD_TIMEOUT)
                .json(&body)
                .send()
                .await?;

            let status = resp.status();
            if status.is_success() {
                debug!("Updated {} in {} ({})", path, repo, branch);
                return Ok(());
            }

            let body = resp.text().await.unwrap_or_default();
            if branch == "master" {
                return Err(AppError::remote(status.as_u16(), body));
            }
            warn!(
                "Update on main branch failed (status {}), retrying on master: {}",
                status, body
            );
        }

        unreachable!("branch fallback loop always returns")
    }

    /// Read a file as UTF-8 text, returning its content and SHA.
    pub async fn read_file(&self, repo: &str, path: &str) -> AppResult<StoredFile> {
        let url = self.contents_url(repo, path);

        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .timeout(READ_TIMEOUT)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::remote(status.as_u16(), body));
        }

        let info: ContentsInfo = resp.json().await?;
        let encoded = info
            .content
            .ok_or_else(|| AppError::Decode(format!("No content returned for {}", path)))?;

        // The API wraps base64 lines; strip whitespace before decoding.
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64
            .decode(compact.as_bytes())
            .map_err(|e| AppError::Decode(format!("Invalid base64 in {}: {}", path, e)))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| AppError::Decode(format!("Invalid UTF-8 in {}: {}", path, e)))?;

        Ok(StoredFile {
            text,
            sha: info.sha,
        })
    }

    /// List the entries of a folder (empty path lists the repository root).
    pub async fn list_folder(&self, repo: &str, path: &str) -> AppResult<Vec<FolderEntry>> {
        let url = self.contents_url(repo, path);

        let resp = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .timeout(READ_TIMEOUT)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::remote(status.as_u16(), body));
        }

        let entries: Vec<FolderEntry> = resp.json().await?;

        Ok(entries)
    }

    /// Delete a repository.
    pub async fn delete_repository(&self, repo: &str) -> AppResult<()> {
        let url = format!(
            "{}/api/v1/repos/{}/{}",
            self.settings.base_url, self.settings.account, repo
        );
        info!("Deleting artifact repository: {}", repo);

        let resp = self
            .http
            .delete(&url)
            .header("Authorization", self.auth_header())
            .timeout(READ_TIMEOUT)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::remote(status.as_u16(), body));
        }

        Ok(())
    }

    /// Zip archive URL for the repository's main branch.
    pub fn archive_url(&self, repo: &str) -> String {
        format!(
            "{}/{}/{}/archive/main.zip",
            self.settings.base_url, self.settings.account, repo
        )
    }

    /// Raw download URL for a file on the main branch.
    pub fn download_url(&self, repo: &str, path: &str) -> String {
        format!(
            "{}/{}/{}/raw/branch/main/{}",
            self.settings.base_url,
            self.settings.account,
            repo,
            Self::encode_path(path),
        )
    }

    /// Raw URL prefix for a branch, used to recognize our own URLs.
    pub fn raw_prefix(&self, repo: &str, branch: &str) -> String {
        format!(
            "{}/{}/{}/raw/branch/{}/",
            self.settings.base_url, self.settings.account, repo, branch
        )
    }

    /// Site-wide default cover image, stored in the shared `imgs` repository.
    pub fn default_cover_url(&self) -> String {
        format!(
            "{}/{}/imgs/raw/branch/main/default-cover-img.png",
            self.settings.base_url, self.settings.account
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn test_client() -> GiteaClient {
        GiteaClient::new(GiteaSettings {
            base_url: "http://localhost:3000".to_string(),
            account: "modelcloud".to_string(),
            token: SecretString::from("test-token"),
        })
    }

    #[test]
    fn archive_url_targets_main_branch() {
        let client = test_client();
        assert_eq!(
            client.archive_url("models-alice"),
            "http://localhost:3000/modelcloud/models-alice/archive/main.zip"
        );
    }

    #[test]
    fn download_url_encodes_path_segments() {
        let client = test_client();
        assert_eq!(
            client.download_url("models-alice", "model-Res Net-20260109/cover-1.png"),
            "http://localhost:3000/modelcloud/models-alice/raw/branch/main/model-Res%20Net-20260109/cover-1.png"
        );
    }

    #[test]
    fn encode_path_keeps_separators() {
        assert_eq!(
            GiteaClient::encode_path("a b/c.md"),
            "a%20b/c.md"
        );
    }

    #[test]
    fn default_cover_lives_in_shared_imgs_repo() {
        let client = test_client();
        assert_eq!(
            client.default_cover_url(),
            "http://localhost:3000/modelcloud/imgs/raw/branch/main/default-cover-img.png"
        );
    }
}
