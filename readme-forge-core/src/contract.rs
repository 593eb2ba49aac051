//! # contract: capability interfaces consumed by the pipeline
//!
//! The pipeline never talks to a network directly. It is generic over three traits:
//!
//! - [`RepositoryReader`]: repository metadata, recursive tree listing, raw file content.
//! - [`TextGenerator`]: a single request/response text-generation call.
//! - [`RepositoryWriter`]: the fork / ref / blob / tree / commit / pull-request calls
//!   used by [`crate::publish`].
//!
//! Real clients live in the `readme-forge` binary crate. All traits are annotated for
//! `mockall`, so tests can script every capability deterministically (enable the
//! default `test-export-mocks` feature to use the mocks from integration tests).
//!
//! Every call returns a typed error: [`HostError`] for repository-hosting calls and
//! [`GenerationFailure`] for text generation. Implementors must map transport and
//! status failures onto these rather than returning opaque strings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[allow(unused_imports)]
use mockall::{automock, predicate::*};

use crate::repository::RepositoryReference;

/// Failure reported by the repository-hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// Repository, ref or path is absent (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The object being created already exists (e.g. a branch ref).
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Any other non-success status, message passed through unmodified.
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// Response arrived but did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Failure reported by the text-generation service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationFailure {
    #[error("authentication rejected ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("rate limited ({status}): {message}")]
    RateLimited { status: u16, message: String },

    /// Non-success status, transport failure (`status: None`) or an empty completion.
    #[error("upstream failure{}: {message}", status_suffix(.status))]
    Upstream { status: Option<u16>, message: String },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl GenerationFailure {
    /// Upstream HTTP status, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } | Self::RateLimited { status, .. } => Some(*status),
            Self::Upstream { status, .. } => *status,
        }
    }
}

/// Repository information used for the README title and description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    pub name: String,
    pub description: Option<String>,
    pub default_branch: Option<String>,
}

/// Kind of an entry in a recursive tree listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    /// Submodule pointer.
    Commit,
}

/// One entry of a recursive repository listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub kind: EntryKind,
    /// Size in bytes; 0 when the service does not report one.
    pub size: u64,
}

impl TreeEntry {
    pub fn blob(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Blob,
            size,
        }
    }

    pub fn tree(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Tree,
            size: 0,
        }
    }
}

/// Sampling parameters forwarded to the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_output_tokens: 1000,
        }
    }
}

/// A fully built generation request: system instruction, user message, sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub sampling: SamplingOptions,
}

/// The caller-owned copy of a repository created by a fork call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForkedRepository {
    pub owner: String,
    pub name: String,
}

/// Request body for opening a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    /// `{fork_owner}:{branch}`
    pub head: String,
    /// Branch in the original repository to merge into.
    pub base: String,
}

/// Terminal artifact of a successful publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestResult {
    pub url: String,
    pub number: u64,
}

/// Read access to a hosted repository.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepositoryReader: Send + Sync {
    /// Look up the repository's display metadata.
    async fn repository_metadata(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<RepositoryMetadata, HostError>;

    /// Full recursive listing of `reference`, in the order the service returns it.
    async fn list_tree(&self, reference: &RepositoryReference)
        -> Result<Vec<TreeEntry>, HostError>;

    /// Raw text of a single file at `reference`.
    async fn fetch_file(
        &self,
        reference: &RepositoryReference,
        path: &str,
    ) -> Result<String, HostError>;
}

/// Single request/response text generation.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationFailure>;
}

/// Mutating calls against the hosting service's git object model.
///
/// Each call is one REST operation; identifiers returned by one call are passed
/// into the next by [`crate::publish::publish_document`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepositoryWriter: Send + Sync {
    /// Fork `owner/repo` under the caller's identity.
    async fn fork(&self, owner: &str, repo: &str) -> Result<ForkedRepository, HostError>;

    /// Commit hash at the head of `branch`.
    async fn branch_head(&self, owner: &str, repo: &str, branch: &str)
        -> Result<String, HostError>;

    /// Create `refs/heads/{branch}` pointing at `sha`.
    async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> Result<(), HostError>;

    /// Store `content` as a UTF-8 blob, returning its hash.
    async fn create_blob(&self, owner: &str, repo: &str, content: &str)
        -> Result<String, HostError>;

    /// Create a tree on top of `base` with one blob entry at `path`, returning its hash.
    async fn create_tree(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        path: &str,
        blob_sha: &str,
    ) -> Result<String, HostError>;

    /// Create a commit with a single parent, returning its hash.
    async fn create_commit(
        &self,
        owner: &str,
        repo: &str,
        message: &str,
        tree_sha: &str,
        parent_sha: &str,
    ) -> Result<String, HostError>;

    /// Move `heads/{branch}` to `sha`, forcing when `force` is set.
    async fn update_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
        force: bool,
    ) -> Result<(), HostError>;

    /// Open a pull request against `owner/repo`.
    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        request: NewPullRequest,
    ) -> Result<PullRequestResult, HostError>;
}
