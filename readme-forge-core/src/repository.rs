//! Repository references and URL parsing.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Branch used when neither the URL nor the configuration names one.
pub const DEFAULT_BRANCH: &str = "main";

// scheme://[user@]host[:port]/owner/repo[...], host/owner/repo, or git@host:owner/repo
static REPOSITORY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.\-]*://)?(?:[^@/\s]+@)?[^/:\s]+(?::\d+)?[/:]([^/\s]+)/([^/?#\s]+)")
        .expect("repository URL pattern is valid")
});

/// An (owner, name, branch) triple identifying a remote source tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryReference {
    pub owner: String,
    pub name: String,
    pub branch: String,
}

impl RepositoryReference {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            branch: DEFAULT_BRANCH.to_string(),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.name, self.branch)
    }
}

/// Extract `owner/repo` from a repository URL of the shape `.../<owner>/<repo>[.git]`.
///
/// Extra path segments after the repository name (`/tree/main`, `/blob/...`) are
/// ignored. The returned reference points at [`DEFAULT_BRANCH`].
pub fn parse_repository_url(url: &str) -> Result<RepositoryReference, Error> {
    let trimmed = url.trim();
    let captures = REPOSITORY_URL
        .captures(trimmed)
        .ok_or_else(|| Error::InvalidUrl(url.to_string()))?;

    let owner = &captures[1];
    let repo = captures[2].strip_suffix(".git").unwrap_or(&captures[2]);
    if owner.is_empty() || repo.is_empty() {
        return Err(Error::InvalidUrl(url.to_string()));
    }

    tracing::debug!(owner, repo, "Parsed repository URL");
    Ok(RepositoryReference::new(owner, repo))
}
