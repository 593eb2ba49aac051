#![doc = "GitHub integration: implements the core repository capabilities against the GitHub REST API."]
//
//! # GitHub client (CLI <-> Core)
//!
//! [`GitHubClient`] implements [`RepositoryReader`] and [`RepositoryWriter`] from
//! `readme-forge-core::contract`. Every request and response body is a typed struct;
//! status codes are mapped onto [`HostError`]:
//!
//! - 404 → `NotFound`
//! - 422 whose message mentions "already exists" → `AlreadyExists`
//! - any other non-success → `Upstream { status, message }`
//!
//! Raw file content is read from the raw content host, not the contents API, so
//! large files do not need base64 decoding.

use anyhow::Context;
use async_trait::async_trait;
use readme_forge_core::contract::{
    EntryKind, ForkedRepository, HostError, NewPullRequest, PullRequestResult,
    RepositoryMetadata, RepositoryReader, RepositoryWriter, TreeEntry,
};
use readme_forge_core::repository::RepositoryReference;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::load_config::GitHubSettings;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";

pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    raw_url: Url,
    authenticated: bool,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    description: Option<String>,
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeItem {
    path: String,
    #[serde(rename = "type")]
    kind: EntryKind,
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ForkResponse {
    name: String,
    owner: Owner,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: RefObject,
}

#[derive(Debug, Deserialize)]
struct ShaResponse {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    html_url: String,
    number: u64,
}

#[derive(Debug, Serialize)]
struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    reference: String,
    sha: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateBlobBody<'a> {
    content: &'a str,
    encoding: &'static str,
}

#[derive(Debug, Serialize)]
struct TreeEntryBody<'a> {
    path: &'a str,
    mode: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    sha: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateTreeBody<'a> {
    base_tree: &'a str,
    tree: Vec<TreeEntryBody<'a>>,
}

#[derive(Debug, Serialize)]
struct CreateCommitBody<'a> {
    message: &'a str,
    tree: &'a str,
    parents: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpdateRefBody<'a> {
    sha: &'a str,
    force: bool,
}

#[derive(Debug, Serialize)]
struct CreatePullBody<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

/// Map a non-success GitHub response onto [`HostError`].
pub(crate) fn classify_status(status: StatusCode, body: &str) -> HostError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string());
    match status {
        StatusCode::NOT_FOUND => HostError::NotFound(message),
        StatusCode::UNPROCESSABLE_ENTITY
            if message.to_ascii_lowercase().contains("already exists") =>
        {
            HostError::AlreadyExists(message)
        }
        _ => HostError::Upstream {
            status: status.as_u16(),
            message,
        },
    }
}

/// `{raw_base}/{owner}/{repo}/{branch}/{path}`, every segment percent-encoded.
pub(crate) fn raw_file_url(
    raw_base: &Url,
    reference: &RepositoryReference,
    path: &str,
) -> Result<Url, HostError> {
    let mut url = raw_base.clone();
    url.path_segments_mut()
        .map_err(|_| HostError::Transport(format!("{raw_base} cannot carry a path")))?
        .pop_if_empty()
        .extend([reference.owner.as_str(), reference.name.as_str()])
        .extend(reference.branch.split('/'))
        .extend(path.split('/'));
    Ok(url)
}

fn transport(e: reqwest::Error) -> HostError {
    HostError::Transport(e.to_string())
}

impl GitHubClient {
    pub fn new(settings: &GitHubSettings) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("readme-forge/", env!("CARGO_PKG_VERSION"))),
        );
        if let Some(token) = &settings.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .context("GITHUB_TOKEN contains characters not allowed in a header")?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let raw_url = Url::parse(&settings.raw_url)
            .with_context(|| format!("Invalid raw content URL {:?}", settings.raw_url))?;
        if raw_url.cannot_be_a_base() {
            anyhow::bail!("Raw content URL {:?} cannot carry a path", settings.raw_url);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build GitHub HTTP client")?;

        tracing::info!(
            api_url = %settings.api_url,
            token_set = settings.token.is_some(),
            "Initialized GitHubClient"
        );
        Ok(Self {
            http,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            raw_url,
            authenticated: settings.token.is_some(),
        })
    }

    /// Whether requests carry a token. Publishing needs one.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn repo_url(&self, owner: &str, repo: &str, rest: &str) -> String {
        format!("{}/repos/{owner}/{repo}{rest}", self.api_url)
    }

    async fn checked(&self, request: RequestBuilder) -> Result<reqwest::Response, HostError> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = classify_status(status, &body);
        tracing::debug!(%status, error = %err, "GitHub API returned error");
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, HostError> {
        let response = self.checked(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| HostError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RepositoryReader for GitHubClient {
    async fn repository_metadata(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<RepositoryMetadata, HostError> {
        tracing::info!(owner, repo, "Fetching repository metadata");
        let response: RepoResponse = self
            .send_json(self.http.get(self.repo_url(owner, repo, "")))
            .await?;
        Ok(RepositoryMetadata {
            name: response.name,
            description: response.description,
            default_branch: response.default_branch,
        })
    }

    async fn list_tree(
        &self,
        reference: &RepositoryReference,
    ) -> Result<Vec<TreeEntry>, HostError> {
        let url = self.repo_url(
            &reference.owner,
            &reference.name,
            &format!("/git/trees/{}?recursive=1", reference.branch),
        );
        let response: TreeResponse = self.send_json(self.http.get(url)).await?;
        if response.truncated {
            tracing::warn!(%reference, entries = response.tree.len(), "Tree listing was truncated by GitHub");
        }
        tracing::info!(%reference, entries = response.tree.len(), "Listed repository tree");
        Ok(response
            .tree
            .into_iter()
            .map(|item| TreeEntry {
                path: item.path,
                kind: item.kind,
                size: item.size.unwrap_or(0),
            })
            .collect())
    }

    async fn fetch_file(
        &self,
        reference: &RepositoryReference,
        path: &str,
    ) -> Result<String, HostError> {
        let url = raw_file_url(&self.raw_url, reference, path)?;
        let response = self.checked(self.http.get(url)).await?;
        response.text().await.map_err(transport)
    }
}

#[async_trait]
impl RepositoryWriter for GitHubClient {
    async fn fork(&self, owner: &str, repo: &str) -> Result<ForkedRepository, HostError> {
        let response: ForkResponse = self
            .send_json(self.http.post(self.repo_url(owner, repo, "/forks")))
            .await?;
        Ok(ForkedRepository {
            owner: response.owner.login,
            name: response.name,
        })
    }

    async fn branch_head(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<String, HostError> {
        let url = self.repo_url(owner, repo, &format!("/git/ref/heads/{branch}"));
        let response: RefResponse = self.send_json(self.http.get(url)).await?;
        Ok(response.object.sha)
    }

    async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> Result<(), HostError> {
        let body = CreateRefBody {
            reference: format!("refs/heads/{branch}"),
            sha,
        };
        self.checked(
            self.http
                .post(self.repo_url(owner, repo, "/git/refs"))
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn create_blob(
        &self,
        owner: &str,
        repo: &str,
        content: &str,
    ) -> Result<String, HostError> {
        let body = CreateBlobBody {
            content,
            encoding: "utf-8",
        };
        let response: ShaResponse = self
            .send_json(
                self.http
                    .post(self.repo_url(owner, repo, "/git/blobs"))
                    .json(&body),
            )
            .await?;
        Ok(response.sha)
    }

    async fn create_tree(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        path: &str,
        blob_sha: &str,
    ) -> Result<String, HostError> {
        let body = CreateTreeBody {
            base_tree: base,
            tree: vec![TreeEntryBody {
                path,
                mode: "100644",
                kind: "blob",
                sha: blob_sha,
            }],
        };
        let response: ShaResponse = self
            .send_json(
                self.http
                    .post(self.repo_url(owner, repo, "/git/trees"))
                    .json(&body),
            )
            .await?;
        Ok(response.sha)
    }

    async fn create_commit(
        &self,
        owner: &str,
        repo: &str,
        message: &str,
        tree_sha: &str,
        parent_sha: &str,
    ) -> Result<String, HostError> {
        let body = CreateCommitBody {
            message,
            tree: tree_sha,
            parents: vec![parent_sha],
        };
        let response: ShaResponse = self
            .send_json(
                self.http
                    .post(self.repo_url(owner, repo, "/git/commits"))
                    .json(&body),
            )
            .await?;
        Ok(response.sha)
    }

    async fn update_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
        force: bool,
    ) -> Result<(), HostError> {
        let url = self.repo_url(owner, repo, &format!("/git/refs/heads/{branch}"));
        self.checked(self.http.patch(url).json(&UpdateRefBody { sha, force }))
            .await?;
        Ok(())
    }

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        request: NewPullRequest,
    ) -> Result<PullRequestResult, HostError> {
        let body = CreatePullBody {
            title: &request.title,
            body: &request.body,
            head: &request.head,
            base: &request.base,
        };
        let response: PullResponse = self
            .send_json(
                self.http
                    .post(self.repo_url(owner, repo, "/pulls"))
                    .json(&body),
            )
            .await?;
        Ok(PullRequestResult {
            url: response.html_url,
            number: response.number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_not_found() {
        let err = classify_status(StatusCode::NOT_FOUND, r#"{"message":"Not Found"}"#);
        assert_eq!(err, HostError::NotFound("Not Found".to_string()));
    }

    #[test]
    fn existing_reference_maps_to_already_exists() {
        let err = classify_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"Reference already exists","documentation_url":"https://docs.github.com"}"#,
        );
        assert_eq!(
            err,
            HostError::AlreadyExists("Reference already exists".to_string())
        );
    }

    #[test]
    fn other_validation_failures_stay_upstream() {
        let err = classify_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"Invalid request"}"#,
        );
        assert_eq!(
            err,
            HostError::Upstream {
                status: 422,
                message: "Invalid request".to_string()
            }
        );
    }

    #[test]
    fn non_json_body_is_passed_through() {
        let err = classify_status(StatusCode::BAD_GATEWAY, "  upstream timeout \n");
        assert_eq!(
            err,
            HostError::Upstream {
                status: 502,
                message: "upstream timeout".to_string()
            }
        );
    }

    #[test]
    fn tree_listing_decodes_blobs_trees_and_submodules() {
        let body = r#"{
            "sha": "abc",
            "tree": [
                {"path": "src", "mode": "040000", "type": "tree", "sha": "1"},
                {"path": "src/lib.rs", "mode": "100644", "type": "blob", "sha": "2", "size": 42},
                {"path": "vendor/dep", "mode": "160000", "type": "commit", "sha": "3"}
            ],
            "truncated": false
        }"#;
        let parsed: TreeResponse = serde_json::from_str(body).unwrap();
        let kinds: Vec<EntryKind> = parsed.tree.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![EntryKind::Tree, EntryKind::Blob, EntryKind::Commit]);
        assert_eq!(parsed.tree[1].size, Some(42));
        assert_eq!(parsed.tree[0].size, None);
    }

    #[test]
    fn tree_body_serializes_single_readme_entry() {
        let body = CreateTreeBody {
            base_tree: "base",
            tree: vec![TreeEntryBody {
                path: "README.md",
                mode: "100644",
                kind: "blob",
                sha: "blob",
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "base_tree": "base",
                "tree": [{"path": "README.md", "mode": "100644", "type": "blob", "sha": "blob"}]
            })
        );
    }

    #[test]
    fn ref_body_uses_ref_key() {
        let body = CreateRefBody {
            reference: "refs/heads/update-readme".to_string(),
            sha: "abc",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"ref": "refs/heads/update-readme", "sha": "abc"})
        );
    }

    #[test]
    fn raw_file_url_encodes_reserved_characters_per_segment() {
        let base = Url::parse("https://raw.githubusercontent.com").unwrap();
        let reference = RepositoryReference::new("acme", "widgets");
        let url = raw_file_url(&base, &reference, "docs/C#.md").unwrap();
        assert_eq!(
            url.as_str(),
            "https://raw.githubusercontent.com/acme/widgets/main/docs/C%23.md"
        );

        let url = raw_file_url(&base, &reference, "notes/what?.md").unwrap();
        assert_eq!(
            url.as_str(),
            "https://raw.githubusercontent.com/acme/widgets/main/notes/what%3F.md"
        );
    }

    #[test]
    fn raw_file_url_keeps_base_path_and_slashed_branches() {
        let base = Url::parse("https://git.example.com/raw/").unwrap();
        let reference = RepositoryReference::new("acme", "widgets").with_branch("release/v2");
        let url = raw_file_url(&base, &reference, "src/lib.rs").unwrap();
        assert_eq!(
            url.as_str(),
            "https://git.example.com/raw/acme/widgets/release/v2/src/lib.rs"
        );
    }

    #[test]
    fn client_rejects_invalid_raw_url() {
        let result = GitHubClient::new(&GitHubSettings {
            api_url: "https://api.github.com".to_string(),
            raw_url: "not a url".to_string(),
            token: None,
        });
        assert!(result.is_err());
    }

    #[test]
    fn client_builds_without_token() {
        let client = GitHubClient::new(&GitHubSettings {
            api_url: "https://api.github.com/".to_string(),
            raw_url: "https://raw.githubusercontent.com".to_string(),
            token: None,
        })
        .unwrap();
        assert!(!client.is_authenticated());
        assert_eq!(
            client.repo_url("acme", "widgets", "/forks"),
            "https://api.github.com/repos/acme/widgets/forks"
        );
    }
}
