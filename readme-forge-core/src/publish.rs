//! Pull-request publication of a generated README.
//!
//! A strictly linear sequence against the hosting service:
//!
//! ```text
//! Start → Forked → BranchEnsured → BlobCreated → TreeCreated → CommitCreated → RefUpdated → PrCreated
//! ```
//!
//! Any failing step aborts with [`Error::Publication`] naming the stage that failed.
//! Nothing already created in the fork is rolled back. The only tolerated failure is
//! "branch already exists" while ensuring the branch; that ref is force-updated later.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::contract::{HostError, NewPullRequest, PullRequestResult, RepositoryWriter};
use crate::error::Error;
use crate::repository::RepositoryReference;

/// Path of the document inside the repository.
pub const README_PATH: &str = "README.md";
pub const COMMIT_MESSAGE: &str = "docs: update README.md with generated documentation";
pub const PULL_REQUEST_TITLE: &str = "Update README.md";
pub const PULL_REQUEST_BODY: &str = "This pull request updates README.md with documentation \
generated from the repository's source files. Please review the content before merging.";

/// Stages of the publication sequence. Each variant names the state reached when
/// its step succeeds; a failure is reported with the stage that was being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PublicationStage {
    Forked,
    BranchEnsured,
    BlobCreated,
    TreeCreated,
    CommitCreated,
    RefUpdated,
    PrCreated,
}

impl fmt::Display for PublicationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Forked => "Forked",
            Self::BranchEnsured => "BranchEnsured",
            Self::BlobCreated => "BlobCreated",
            Self::TreeCreated => "TreeCreated",
            Self::CommitCreated => "CommitCreated",
            Self::RefUpdated => "RefUpdated",
            Self::PrCreated => "PrCreated",
        };
        f.write_str(name)
    }
}

/// What to publish and where.
#[derive(Debug, Clone)]
pub struct PublishRequest<'a> {
    /// Original repository; `branch` is the base the pull request targets.
    pub target: &'a RepositoryReference,
    pub document: &'a str,
    /// Branch created in the fork.
    pub branch: &'a str,
    /// Wait after the fork call before using the fork.
    pub fork_grace: Duration,
}

fn failed(stage: PublicationStage) -> impl FnOnce(HostError) -> Error {
    move |source| {
        error!(%stage, error = %source, "[PUBLISH] Stage failed, aborting");
        Error::Publication { stage, source }
    }
}

/// Run the full fork → pull-request sequence and return the pull request.
pub async fn publish_document<W>(
    writer: &W,
    request: &PublishRequest<'_>,
) -> Result<PullRequestResult, Error>
where
    W: RepositoryWriter + ?Sized,
{
    let target = request.target;
    let branch = request.branch;
    info!(%target, branch, "[PUBLISH] Starting publication");

    let fork = writer
        .fork(&target.owner, &target.name)
        .await
        .map_err(failed(PublicationStage::Forked))?;
    info!(fork_owner = %fork.owner, fork_name = %fork.name, "[PUBLISH] Forked");

    // Forks are provisioned asynchronously. Fixed wait, no readiness check.
    if !request.fork_grace.is_zero() {
        info!(grace_secs = request.fork_grace.as_secs(), "[PUBLISH] Waiting for fork to be provisioned");
        tokio::time::sleep(request.fork_grace).await;
    }

    let base_sha = writer
        .branch_head(&target.owner, &target.name, &target.branch)
        .await
        .map_err(failed(PublicationStage::BranchEnsured))?;
    match writer
        .create_branch(&fork.owner, &fork.name, branch, &base_sha)
        .await
    {
        Ok(()) => info!(branch, %base_sha, "[PUBLISH] Branch created"),
        Err(HostError::AlreadyExists(message)) => {
            warn!(branch, %message, "[PUBLISH] Branch already exists in fork, reusing it")
        }
        Err(e) => return Err(failed(PublicationStage::BranchEnsured)(e)),
    }

    let blob_sha = writer
        .create_blob(&fork.owner, &fork.name, request.document)
        .await
        .map_err(failed(PublicationStage::BlobCreated))?;
    info!(%blob_sha, bytes = request.document.len(), "[PUBLISH] Blob created");

    let tree_sha = writer
        .create_tree(&fork.owner, &fork.name, &base_sha, README_PATH, &blob_sha)
        .await
        .map_err(failed(PublicationStage::TreeCreated))?;
    info!(%tree_sha, "[PUBLISH] Tree created");

    let commit_sha = writer
        .create_commit(&fork.owner, &fork.name, COMMIT_MESSAGE, &tree_sha, &base_sha)
        .await
        .map_err(failed(PublicationStage::CommitCreated))?;
    info!(%commit_sha, "[PUBLISH] Commit created");

    writer
        .update_branch(&fork.owner, &fork.name, branch, &commit_sha, true)
        .await
        .map_err(failed(PublicationStage::RefUpdated))?;
    info!(branch, %commit_sha, "[PUBLISH] Branch updated");

    let pull_request = writer
        .create_pull_request(
            &target.owner,
            &target.name,
            NewPullRequest {
                title: PULL_REQUEST_TITLE.to_string(),
                body: PULL_REQUEST_BODY.to_string(),
                head: format!("{}:{}", fork.owner, branch),
                base: target.branch.clone(),
            },
        )
        .await
        .map_err(failed(PublicationStage::PrCreated))?;
    info!(url = %pull_request.url, number = pull_request.number, "[PUBLISH] Pull request opened");

    Ok(pull_request)
}
