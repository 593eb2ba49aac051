/// `load_config` module: loads the optional YAML config file, injects secrets and
/// overrides from the environment, and produces the typed [`CliConfig`].
///
/// This is the only place where untrusted YAML is parsed. Every field has a fallback,
/// so running without a config file is valid: the built-in prompt template,
/// the default limits and the public GitHub endpoints are used.
///
/// # Environment
/// - `GENERATION_API_KEY` (or `DEEPSEEK_API_KEY`): generation service key
/// - `GITHUB_TOKEN`: repository token, required for publishing
/// - `GENERATION_BASE_URL`, `GENERATION_MODEL`, `README_BASE_BRANCH`,
///   `README_MAX_FILES`, `README_MAX_FILE_SIZE_BYTES`, `README_PR_BRANCH`: overrides
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::{Context, Result};
use readme_forge_core::config::{AggregationLimits, PipelineConfig, PublicationSettings};
use readme_forge_core::contract::SamplingOptions;
use readme_forge_core::filter::FilterSettings;
use readme_forge_core::repository::DEFAULT_BRANCH;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{error, info};

/// Prompt template used when the config does not name one.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/readme_prompt.md");

pub const DEFAULT_GENERATION_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_GENERATION_MODEL: &str = "deepseek-chat";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_RAW_URL: &str = "https://raw.githubusercontent.com";

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    repository: RepositorySection,
    aggregation: AggregationLimits,
    filter: FilterSettings,
    generation: GenerationSection,
    publication: PublicationSettings,
    github: GitHubSection,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RepositorySection {
    base_branch: String,
}

impl Default for RepositorySection {
    fn default() -> Self {
        Self {
            base_branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GenerationSection {
    base_url: String,
    model: String,
    template_path: Option<PathBuf>,
    sampling: SamplingOptions,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GENERATION_URL.to_string(),
            model: DEFAULT_GENERATION_MODEL.to_string(),
            template_path: None,
            sampling: SamplingOptions::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GitHubSection {
    api_url: String,
    raw_url: String,
}

impl Default for GitHubSection {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            raw_url: DEFAULT_GITHUB_RAW_URL.to_string(),
        }
    }
}

/// Connection settings for the chat-completions service.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

/// Connection settings for the GitHub REST API and raw content host.
#[derive(Debug, Clone)]
pub struct GitHubSettings {
    pub api_url: String,
    pub raw_url: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub pipeline: PipelineConfig,
    pub generation: GenerationSettings,
    pub github: GitHubSettings,
}

impl CliConfig {
    pub fn trace_loaded(&self) {
        self.pipeline.trace_loaded();
        info!(
            generation_url = %self.generation.base_url,
            model = %self.generation.model,
            generation_key_set = self.generation.api_key.is_some(),
            github_api = %self.github.api_url,
            github_token_set = self.github.token.is_some(),
            "Loaded endpoint settings"
        );
    }
}

/// Loads a YAML config file (no secrets) and applies environment secrets and overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    build(raw, path_ref.parent())
}

/// Configuration from fallbacks and the environment only.
pub fn default_config() -> Result<CliConfig> {
    info!("No config file given, using defaults and environment");
    build(RawConfig::default(), None)
}

fn build(raw: RawConfig, config_dir: Option<&Path>) -> Result<CliConfig> {
    let template = match &raw.generation.template_path {
        Some(template_path) => {
            let resolved = match config_dir {
                Some(dir) if template_path.is_relative() => dir.join(template_path),
                _ => template_path.clone(),
            };
            fs::read_to_string(&resolved)
                .with_context(|| format!("Failed to read prompt template {resolved:?}"))?
        }
        None => DEFAULT_TEMPLATE.to_string(),
    };

    let mut pipeline = PipelineConfig {
        base_branch: raw.repository.base_branch,
        aggregation: raw.aggregation,
        filter: raw.filter,
        sampling: raw.generation.sampling,
        template,
        publication: raw.publication,
    };
    let mut generation = GenerationSettings {
        base_url: raw.generation.base_url,
        model: raw.generation.model,
        api_key: secret("GENERATION_API_KEY").or_else(|| secret("DEEPSEEK_API_KEY")),
    };
    let github = GitHubSettings {
        api_url: raw.github.api_url,
        raw_url: raw.github.raw_url,
        token: secret("GITHUB_TOKEN"),
    };

    if let Some(url) = env_override::<String>("GENERATION_BASE_URL")? {
        generation.base_url = url;
    }
    if let Some(model) = env_override::<String>("GENERATION_MODEL")? {
        generation.model = model;
    }
    if let Some(branch) = env_override::<String>("README_BASE_BRANCH")? {
        pipeline.base_branch = branch;
    }
    if let Some(max_files) = env_override::<usize>("README_MAX_FILES")? {
        pipeline.aggregation.max_files = max_files;
    }
    if let Some(max_size) = env_override::<u64>("README_MAX_FILE_SIZE_BYTES")? {
        pipeline.aggregation.max_file_size_bytes = max_size;
    }
    if let Some(branch) = env_override::<String>("README_PR_BRANCH")? {
        pipeline.publication.branch = branch;
    }

    if pipeline.template.trim().is_empty() {
        anyhow::bail!("Prompt template is empty");
    }

    let config = CliConfig {
        pipeline,
        generation,
        github,
    };
    config.trace_loaded();
    Ok(config)
}

fn secret(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_override<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid value for {name} ({raw:?}): {e}")),
        _ => Ok(None),
    }
}
