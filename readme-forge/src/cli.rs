/// # readme-forge CLI Interface
///
/// Command parsing and orchestration for the `readme-forge` binary. The pipeline itself
/// (aggregation, generation, assembly, publication) lives in `readme-forge-core`; this
/// module loads configuration, builds the real HTTP clients and wires them in.
///
/// ## Commands
/// - `generate <URL>`: print a generated README on stdout, or write it with `--output`.
/// - `publish <URL>`: generate (or read `--document`) and open a pull request with it.
///   Requires `GITHUB_TOKEN`.
///
/// Programmatic callers and integration tests use [`run`] with a constructed [`Cli`].
use crate::generation::ChatCompletionsClient;
use crate::github::GitHubClient;
use crate::load_config::{default_config, load_config, CliConfig};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use readme_forge_core::pipeline::{generate_readme, publish};
use readme_forge_core::repository::parse_repository_url;
use std::fs;
use std::path::{Path, PathBuf};

/// Generate a README for a public GitHub repository and optionally propose it as a pull request.
#[derive(Parser)]
#[clap(
    name = "readme-forge",
    version,
    about = "Generate a README for a GitHub repository and optionally open a pull request with it"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a README and print it (or write it to --output)
    Generate {
        /// Repository URL, e.g. https://github.com/owner/repo
        url: String,
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Write the README to this file instead of stdout
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Open a pull request that replaces the repository's README
    Publish {
        /// Repository URL, e.g. https://github.com/owner/repo
        url: String,
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Publish this file instead of generating a new README
        #[clap(long)]
        document: Option<PathBuf>,
        /// Branch to create in the fork (default from config)
        #[clap(long)]
        branch: Option<String>,
    },
}

fn resolve_config(path: Option<&Path>) -> Result<CliConfig> {
    match path {
        Some(path) => load_config(path),
        None => default_config(),
    }
}

async fn generate(url: &str, config: &CliConfig, github: &GitHubClient) -> Result<String> {
    let generator = ChatCompletionsClient::new(&config.generation)?;
    generate_readme(url, github, &generator, &config.pipeline)
        .await
        .with_context(|| format!("README generation failed for {url}"))
}

/// Async CLI entrypoint shared by `main` and integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Generate {
            url,
            config,
            output,
        } => {
            parse_repository_url(&url)?;
            let config = resolve_config(config.as_deref())?;
            tracing::info!(command = "generate", %url, "Starting README generation");
            let github = GitHubClient::new(&config.github)?;
            let readme = generate(&url, &config, &github).await?;

            match output {
                Some(path) => {
                    fs::write(&path, &readme)
                        .with_context(|| format!("Failed to write README to {path:?}"))?;
                    tracing::info!(command = "generate", output = ?path, "README written");
                }
                None => println!("{readme}"),
            }
            Ok(())
        }
        Commands::Publish {
            url,
            config,
            document,
            branch,
        } => {
            parse_repository_url(&url)?;
            let config = resolve_config(config.as_deref())?;
            let github = GitHubClient::new(&config.github)?;
            if !github.is_authenticated() {
                anyhow::bail!("GITHUB_TOKEN must be set to publish");
            }
            tracing::info!(command = "publish", %url, "Starting README publication");

            let readme = match document {
                Some(path) => fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read document {path:?}"))?,
                None => generate(&url, &config, &github).await?,
            };

            match publish(&url, &readme, branch.as_deref(), &github, &config.pipeline).await {
                Ok(pr) => {
                    tracing::info!(command = "publish", url = %pr.url, number = pr.number, "Pull request opened");
                    println!("{}", pr.url);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "publish", error = %e, stage = ?e.publication_stage(), "Publication failed");
                    Err(e.into())
                }
            }
        }
    }
}
