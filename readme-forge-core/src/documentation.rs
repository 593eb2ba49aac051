//! Builds the generation request and interprets the reply.

use tracing::{error, info};

use crate::contract::{CompletionRequest, GenerationFailure, SamplingOptions, TextGenerator};
use crate::error::Error;

/// System instruction sent with every request.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert technical writer who produces detailed, \
accurate and practical software documentation. Format every code block with triple backticks \
and a language specifier, and keep markdown formatting consistent throughout the document.";

/// Compose the request for `owner_repo` from the opaque `template` and the aggregated context.
pub fn build_request(
    owner_repo: &str,
    context: &str,
    template: &str,
    sampling: SamplingOptions,
) -> CompletionRequest {
    let details = format!("\nRepository: {owner_repo}\n\nRepository Content:\n{context}");
    CompletionRequest {
        system: SYSTEM_INSTRUCTION.to_string(),
        user: format!("{template}\n\nRepository Details:\n{details}"),
        sampling,
    }
}

/// Ask the generator for documentation of `owner_repo`.
///
/// The reply is trimmed and otherwise returned verbatim; code fences are kept.
pub async fn request_documentation<G>(
    generator: &G,
    owner_repo: &str,
    context: &str,
    template: &str,
    sampling: SamplingOptions,
) -> Result<String, Error>
where
    G: TextGenerator + ?Sized,
{
    let request = build_request(owner_repo, context, template, sampling);
    info!(
        owner_repo,
        prompt_chars = request.user.len(),
        temperature = sampling.temperature,
        max_output_tokens = sampling.max_output_tokens,
        "[GENERATE] Requesting documentation"
    );

    let reply = generator.complete(request).await.map_err(|e| {
        error!(owner_repo, status = ?e.status(), error = %e, "[GENERATE] Generation failed");
        Error::Generation(e)
    })?;

    let documentation = reply.trim();
    if documentation.is_empty() {
        error!(owner_repo, "[GENERATE] Generator returned empty documentation");
        return Err(Error::Generation(GenerationFailure::Upstream {
            status: None,
            message: "generator returned an empty completion".to_string(),
        }));
    }

    info!(owner_repo, chars = documentation.len(), "[GENERATE] Documentation received");
    Ok(documentation.to_string())
}
