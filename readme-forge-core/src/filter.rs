//! Path filtering for repository aggregation.
//!
//! Decides which repository files are worth sending to the generator: source code,
//! documentation and dependency manifests are allowed; vendored, generated,
//! binary, secret and test files are denied. Deny always wins over allow.

use std::sync::LazyLock;

use regex::RegexSet;
use serde::{Deserialize, Serialize};

use crate::error::Error;

const DENY_PATTERNS: &[&str] = &[
    // version control
    r"(^|/)\.(git|svn|hg)(/|$)",
    // dependencies
    r"(^|/)(node_modules|vendor|bower_components|\.venv|venv|__pycache__|site-packages)(/|$)",
    // build output
    r"(^|/)(dist|build|out|target|coverage|\.next|bin|obj)(/|$)",
    // OS metadata
    r"(^|/)(\.ds_store|thumbs\.db|desktop\.ini)$",
    // secrets
    r"(^|/)\.env(\.[^/]*)?$",
    r"\.(pem|key|p12|pfx)$",
    r"(^|/)id_(rsa|dsa|ecdsa|ed25519)[^/]*$",
    // binaries and media
    r"\.(png|jpe?g|gif|bmp|ico|svg|webp|tiff?|pdf|zip|tar|gz|tgz|bz2|xz|7z|rar|jar|war|class|exe|dll|so|dylib|a|o|wasm|woff2?|ttf|otf|eot|mp3|mp4|wav|mov|avi)$",
    // minified assets and source maps
    r"\.min\.(js|css)$",
    r"\.map$",
    // tests and specs
    r"(^|/)(tests?|__tests__|specs?)/",
    r"\.(test|spec)\.[a-z0-9]+$",
    r"(^|/)test_[^/]+$",
    r"_(test|spec)\.[a-z0-9]+$",
    // type declarations
    r"\.d\.ts$",
];

const ALLOW_PATTERNS: &[&str] = &[
    // source code
    r"\.(rs|py|js|jsx|mjs|cjs|ts|tsx|go|java|kt|kts|scala|rb|php|cs|fs|c|h|cc|cpp|hpp|swift|m|mm|sh|bash|zsh|ps1|lua|dart|ex|exs|erl|hs|clj|vue|svelte|sql|r|jl|zig)$",
    // documentation
    r"\.(md|mdx|rst|txt|adoc)$",
    // dependency manifests
    r"(^|/)(package\.json|cargo\.toml|pyproject\.toml|setup\.cfg|requirements[^/]*\.txt|pipfile|go\.mod|gemfile|pom\.xml|build\.gradle(\.kts)?|composer\.json|mix\.exs|dockerfile|makefile)$",
];

static BUILTIN_DENY: LazyLock<RegexSet> =
    LazyLock::new(|| build_set(DENY_PATTERNS.iter().copied()).expect("built-in deny patterns are valid"));
static BUILTIN_ALLOW: LazyLock<RegexSet> =
    LazyLock::new(|| build_set(ALLOW_PATTERNS.iter().copied()).expect("built-in allow patterns are valid"));

fn build_set<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<RegexSet, regex::Error> {
    RegexSet::new(patterns.into_iter().map(|p| format!("(?i){p}")))
}

/// Additional patterns appended to the built-in sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSettings {
    pub extra_allow: Vec<String>,
    pub extra_deny: Vec<String>,
}

/// Allow/deny predicate over repository paths.
#[derive(Debug, Clone)]
pub struct FileFilter {
    allow: RegexSet,
    deny: RegexSet,
    max_size_bytes: Option<u64>,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FileFilter {
    /// Filter using only the built-in pattern sets and no size ceiling.
    pub fn builtin() -> Self {
        Self {
            allow: BUILTIN_ALLOW.clone(),
            deny: BUILTIN_DENY.clone(),
            max_size_bytes: None,
        }
    }

    /// Built-in patterns plus the configured extras.
    pub fn from_settings(settings: &FilterSettings) -> Result<Self, Error> {
        if settings.extra_allow.is_empty() && settings.extra_deny.is_empty() {
            return Ok(Self::builtin());
        }

        let allow = build_set(
            ALLOW_PATTERNS
                .iter()
                .copied()
                .chain(settings.extra_allow.iter().map(String::as_str)),
        )
        .map_err(|e| Error::config(format!("Invalid allow pattern: {e}")))?;
        let deny = build_set(
            DENY_PATTERNS
                .iter()
                .copied()
                .chain(settings.extra_deny.iter().map(String::as_str)),
        )
        .map_err(|e| Error::config(format!("Invalid deny pattern: {e}")))?;

        tracing::debug!(
            extra_allow = settings.extra_allow.len(),
            extra_deny = settings.extra_deny.len(),
            "Built file filter with extra patterns"
        );
        Ok(Self {
            allow,
            deny,
            max_size_bytes: None,
        })
    }

    /// Exclude files larger than `max` bytes when a size is known.
    pub fn with_max_size(mut self, max: Option<u64>) -> Self {
        self.max_size_bytes = max;
        self
    }

    pub fn should_include(&self, path: &str, size_bytes: Option<u64>) -> bool {
        if let (Some(max), Some(size)) = (self.max_size_bytes, size_bytes) {
            if size > max {
                return false;
            }
        }
        if self.deny.is_match(path) {
            return false;
        }
        self.allow.is_match(path)
    }
}
