//! Reqwest-backed implementation of the [`GitHubApi`] trait.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::GitHubError;
use crate::models::{
    Branch, ContentEntry, InstallationRepositories, Issue, PullRequest, PullRequestFile,
    Repository, Workflow, WorkflowList, WorkflowRun, WorkflowRunList,
};
use crate::{GitHubApi, PullRequestState, ReviewEvent};

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const CLIENT_USER_AGENT: &str = concat!("warden/", env!("CARGO_PKG_VERSION"));

/// GitHub client for interacting with the REST API on behalf of an
/// installation token.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
}

impl GitHubClient {
    /// Create a new client authenticating every request with `token`.
    ///
    /// `base_url` is normally [`DEFAULT_API_URL`]; tests point it at a local
    /// mock server.
    pub fn new(token: &str, base_url: impl Into<String>) -> Result<Self, GitHubError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| GitHubError::Config("token is not a valid header value".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GitHubError> {
        debug!(path, "GET");
        let response = self.http.get(self.url(path)).query(query).send().await?;
        Self::decode(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GitHubError> {
        debug!(path, "POST");
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    async fn put_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GitHubError> {
        debug!(path, "PUT");
        let response = self.http.put(self.url(path)).json(body).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GitHubError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or(body);
            return Err(GitHubError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }

    async fn get_content_entry(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        reference: Option<&str>,
    ) -> Result<ContentEntry, GitHubError> {
        let url = format!("/repos/{owner}/{repo}/contents/{}", encode_path(path));
        let mut query = Vec::new();
        if let Some(reference) = reference {
            query.push(("ref", reference));
        }
        self.get_json(&url, &query).await
    }
}

/// Percent-encode a repository path, keeping directory separators intact.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn list_repositories(&self) -> Result<Vec<Repository>, GitHubError> {
        let page: InstallationRepositories = self
            .get_json("/installation/repositories", &[("per_page", "100")])
            .await?;
        Ok(page.repositories)
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository, GitHubError> {
        self.get_json(&format!("/repos/{owner}/{repo}"), &[]).await
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>, GitHubError> {
        self.get_json(
            &format!("/repos/{owner}/{repo}/branches"),
            &[("per_page", "100")],
        )
        .await
    }

    async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> Result<(), GitHubError> {
        let body = serde_json::json!({
            "ref": format!("refs/heads/{branch}"),
            "sha": sha,
        });
        let _: serde_json::Value = self
            .post_json(&format!("/repos/{owner}/{repo}/git/refs"), &body)
            .await?;
        Ok(())
    }

    async fn get_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<ContentEntry>, GitHubError> {
        let url = format!("/repos/{owner}/{repo}/contents/{}", encode_path(path));
        self.get_json(&url, &[]).await
    }

    async fn get_file_text(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<String, GitHubError> {
        let entry = self.get_content_entry(owner, repo, path, None).await?;
        decode_file_content(&entry)
    }

    async fn create_or_update_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
        branch: &str,
    ) -> Result<(), GitHubError> {
        // Update requires the current blob SHA; create must omit it.
        let existing_sha = match self.get_content_entry(owner, repo, path, Some(branch)).await {
            Ok(entry) => Some(entry.sha),
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err),
        };

        let mut body = serde_json::json!({
            "message": message,
            "content": BASE64.encode(content),
            "branch": branch,
        });
        if let Some(sha) = existing_sha {
            body["sha"] = serde_json::Value::String(sha);
        }

        let url = format!("/repos/{owner}/{repo}/contents/{}", encode_path(path));
        let _: serde_json::Value = self.put_json(&url, &body).await?;
        Ok(())
    }

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequest, GitHubError> {
        let payload = serde_json::json!({
            "title": title,
            "body": body,
            "head": head,
            "base": base,
        });
        self.post_json(&format!("/repos/{owner}/{repo}/pulls"), &payload)
            .await
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        state: PullRequestState,
    ) -> Result<Vec<PullRequest>, GitHubError> {
        self.get_json(
            &format!("/repos/{owner}/{repo}/pulls"),
            &[("state", state.as_str()), ("per_page", "100")],
        )
        .await
    }

    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, GitHubError> {
        self.get_json(&format!("/repos/{owner}/{repo}/pulls/{number}"), &[])
            .await
    }

    async fn list_pull_request_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PullRequestFile>, GitHubError> {
        self.get_json(
            &format!("/repos/{owner}/{repo}/pulls/{number}/files"),
            &[("per_page", "100")],
        )
        .await
    }

    async fn create_pull_request_review(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
        event: ReviewEvent,
    ) -> Result<(), GitHubError> {
        let payload = serde_json::json!({
            "body": body,
            "event": event.as_str(),
        });
        let _: serde_json::Value = self
            .post_json(
                &format!("/repos/{owner}/{repo}/pulls/{number}/reviews"),
                &payload,
            )
            .await?;
        Ok(())
    }

    async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
    ) -> Result<Issue, GitHubError> {
        let payload = serde_json::json!({
            "title": title,
            "body": body,
        });
        self.post_json(&format!("/repos/{owner}/{repo}/issues"), &payload)
            .await
    }

    async fn list_issues(&self, owner: &str, repo: &str) -> Result<Vec<Issue>, GitHubError> {
        self.get_json(
            &format!("/repos/{owner}/{repo}/issues"),
            &[("state", "open"), ("per_page", "100")],
        )
        .await
    }

    async fn list_workflows(&self, owner: &str, repo: &str) -> Result<Vec<Workflow>, GitHubError> {
        let page: WorkflowList = self
            .get_json(&format!("/repos/{owner}/{repo}/actions/workflows"), &[])
            .await?;
        Ok(page.workflows)
    }

    async fn list_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: u64,
    ) -> Result<Vec<WorkflowRun>, GitHubError> {
        let page: WorkflowRunList = self
            .get_json(
                &format!("/repos/{owner}/{repo}/actions/workflows/{workflow_id}/runs"),
                &[("per_page", "50")],
            )
            .await?;
        Ok(page.workflow_runs)
    }
}

/// Decode the base64 payload of a single-file content response.
fn decode_file_content(entry: &ContentEntry) -> Result<String, GitHubError> {
    let Some(content) = entry.content.as_deref() else {
        return Err(GitHubError::Decode(format!(
            "{} has no content payload (is it a directory?)",
            entry.path
        )));
    };
    if let Some(encoding) = entry.encoding.as_deref() {
        if encoding != "base64" {
            return Err(GitHubError::Decode(format!(
                "unsupported content encoding {encoding} for {}",
                entry.path
            )));
        }
    }

    // The API wraps base64 at 60 columns; strip the embedded newlines first.
    let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(cleaned.as_bytes())
        .map_err(|e| GitHubError::Decode(format!("invalid base64 in {}: {e}", entry.path)))?;
    String::from_utf8(bytes)
        .map_err(|e| GitHubError::Decode(format!("{} is not UTF-8: {e}", entry.path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(content: Option<&str>, encoding: Option<&str>) -> ContentEntry {
        serde_json::from_value(serde_json::json!({
            "name": "README.md",
            "path": "README.md",
            "sha": "abc123",
            "type": "file",
            "content": content,
            "encoding": encoding,
        }))
        .unwrap()
    }

    #[test]
    fn test_encode_path_keeps_separators() {
        assert_eq!(encode_path("docs/notes file.md"), "docs/notes%20file.md");
    }

    #[test]
    fn test_decode_file_content_strips_wrapping() {
        // "hello world" base64-encoded, wrapped the way the API wraps it.
        let wrapped = entry(Some("aGVsbG8g\nd29ybGQ=\n"), Some("base64"));
        assert_eq!(decode_file_content(&wrapped).unwrap(), "hello world");
    }

    #[test]
    fn test_decode_file_content_rejects_missing_payload() {
        let dir = entry(None, None);
        assert!(matches!(
            decode_file_content(&dir),
            Err(GitHubError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_file_content_rejects_bad_base64() {
        let bad = entry(Some("!!not-base64!!"), Some("base64"));
        assert!(matches!(
            decode_file_content(&bad),
            Err(GitHubError::Decode(_))
        ));
    }
}
