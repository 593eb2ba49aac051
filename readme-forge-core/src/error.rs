use thiserror::Error;

use crate::contract::{GenerationFailure, HostError};
use crate::publish::PublicationStage;

/// Result type alias using the pipeline's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the pipeline surfaces to its caller. None of them is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// Repository URL does not have the shape `.../<owner>/<repo>[.git]`.
    #[error("Invalid repository URL '{0}': expected .../<owner>/<repo>[.git]")]
    InvalidUrl(String),

    /// Repository or ref is absent on the hosting service.
    #[error("Repository or reference not found: {0}")]
    NotFound(String),

    /// The tree listing could not be obtained.
    #[error("Failed to list repository {reference}: {source}")]
    Listing {
        reference: String,
        #[source]
        source: HostError,
    },

    /// The generation service failed; upstream status and message are preserved.
    #[error("Documentation generation failed: {0}")]
    Generation(#[from] GenerationFailure),

    /// A publication step failed; earlier steps are not rolled back.
    #[error("Publication failed at stage {stage}: {source}")]
    Publication {
        stage: PublicationStage,
        #[source]
        source: HostError,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Stage at which publication failed, if this is a publication error.
    pub fn publication_stage(&self) -> Option<PublicationStage> {
        match self {
            Self::Publication { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
