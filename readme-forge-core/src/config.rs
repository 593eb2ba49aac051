use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contract::SamplingOptions;
use crate::filter::FilterSettings;
use crate::repository::DEFAULT_BRANCH;

/// Branch created in the fork when the caller does not name one.
pub const DEFAULT_PUBLISH_BRANCH: &str = "update-readme";

/// Caps applied while aggregating repository content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregationLimits {
    pub max_files: usize,
    pub max_file_size_bytes: u64,
}

impl Default for AggregationLimits {
    fn default() -> Self {
        Self {
            max_files: 40,
            max_file_size_bytes: 100_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublicationSettings {
    /// Branch created in the fork.
    pub branch: String,
    /// Seconds to wait after requesting the fork before touching it.
    pub fork_grace_secs: u64,
}

impl Default for PublicationSettings {
    fn default() -> Self {
        Self {
            branch: DEFAULT_PUBLISH_BRANCH.to_string(),
            fork_grace_secs: 5,
        }
    }
}

impl PublicationSettings {
    pub fn fork_grace(&self) -> Duration {
        Duration::from_secs(self.fork_grace_secs)
    }
}

/// Everything the pipeline needs besides its capabilities. Passed explicitly into
/// [`crate::pipeline::generate_readme`] and [`crate::pipeline::publish`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Branch of the target repository to read from and open pull requests against.
    pub base_branch: String,
    pub aggregation: AggregationLimits,
    pub filter: FilterSettings,
    pub sampling: SamplingOptions,
    /// Instruction text sent ahead of the repository content. Opaque to the pipeline.
    pub template: String,
    pub publication: PublicationSettings,
}

impl PipelineConfig {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            base_branch: DEFAULT_BRANCH.to_string(),
            aggregation: AggregationLimits::default(),
            filter: FilterSettings::default(),
            sampling: SamplingOptions::default(),
            template: template.into(),
            publication: PublicationSettings::default(),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            base_branch = %self.base_branch,
            max_files = self.aggregation.max_files,
            max_file_size_bytes = self.aggregation.max_file_size_bytes,
            temperature = self.sampling.temperature,
            max_output_tokens = self.sampling.max_output_tokens,
            template_chars = self.template.len(),
            publish_branch = %self.publication.branch,
            "Loaded PipelineConfig"
        );
        debug!(?self, "PipelineConfig loaded (full debug)");
    }
}
