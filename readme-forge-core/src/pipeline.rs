//! High-level pipeline: repository URL → README, and README → pull request.
//!
//! [`generate_readme`] runs aggregate → generate → assemble against a
//! [`RepositoryReader`] and a [`TextGenerator`]. [`publish`] hands a finished
//! document to the publication sequence through a [`RepositoryWriter`].
//! Both are fail-fast: the first failing stage ends the run.

use tracing::{error, info, warn};

use crate::aggregate::aggregate;
use crate::config::PipelineConfig;
use crate::contract::{
    HostError, PullRequestResult, RepositoryReader, RepositoryWriter, TextGenerator,
};
use crate::documentation::request_documentation;
use crate::error::Error;
use crate::filter::FileFilter;
use crate::publish::{publish_document, PublishRequest};
use crate::readme::assemble;
use crate::repository::{parse_repository_url, RepositoryReference};

fn target_reference(repository_url: &str, config: &PipelineConfig) -> Result<RepositoryReference, Error> {
    Ok(parse_repository_url(repository_url)?.with_branch(config.base_branch.clone()))
}

/// Generate a README for the repository at `repository_url`.
pub async fn generate_readme<R, G>(
    repository_url: &str,
    reader: &R,
    generator: &G,
    config: &PipelineConfig,
) -> Result<String, Error>
where
    R: RepositoryReader + ?Sized,
    G: TextGenerator + ?Sized,
{
    let reference = target_reference(repository_url, config)?;
    let filter = FileFilter::from_settings(&config.filter)?
        .with_max_size(Some(config.aggregation.max_file_size_bytes));
    info!(%reference, "[PIPELINE] Generating README");

    let metadata = reader
        .repository_metadata(&reference.owner, &reference.name)
        .await
        .map_err(|e| {
            error!(%reference, error = %e, "[PIPELINE] Repository lookup failed");
            match e {
                HostError::NotFound(_) => Error::NotFound(reference.full_name()),
                source => Error::Listing {
                    reference: reference.to_string(),
                    source,
                },
            }
        })?;

    if let Some(default_branch) = metadata
        .default_branch
        .as_deref()
        .filter(|branch| *branch != reference.branch)
    {
        warn!(
            %reference,
            default_branch,
            "[PIPELINE] Configured base branch differs from the repository's default branch"
        );
    }

    let context = aggregate(&reference, reader, &filter, &config.aggregation).await?;
    let generated = request_documentation(
        generator,
        &reference.full_name(),
        &context,
        &config.template,
        config.sampling,
    )
    .await?;

    let document = assemble(&metadata, &generated);
    info!(%reference, chars = document.len(), "[PIPELINE] README assembled");
    Ok(document)
}

/// Open a pull request replacing the README of `repository_url` with `document`.
///
/// `branch` defaults to the configured publication branch.
pub async fn publish<W>(
    repository_url: &str,
    document: &str,
    branch: Option<&str>,
    writer: &W,
    config: &PipelineConfig,
) -> Result<PullRequestResult, Error>
where
    W: RepositoryWriter + ?Sized,
{
    let target = target_reference(repository_url, config)?;
    let request = PublishRequest {
        target: &target,
        document,
        branch: branch.unwrap_or(config.publication.branch.as_str()),
        fork_grace: config.publication.fork_grace(),
    };
    publish_document(writer, &request).await
}
