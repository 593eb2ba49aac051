//! Repository content aggregation.
//!
//! Turns a repository listing into one bounded text context for the generator:
//! list → keep blobs → filter → size cap → count cap → fetch concurrently → join.
//!
//! Per-file fetch failures are logged and the file is dropped from the context.

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use crate::config::AggregationLimits;
use crate::contract::{EntryKind, HostError, RepositoryReader, TreeEntry};
use crate::error::Error;
use crate::filter::FileFilter;
use crate::repository::RepositoryReference;

/// A file whose content was fetched successfully. Only lives until it is joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub path: String,
    pub content: String,
}

impl FetchedFile {
    fn block(&self) -> String {
        format!("File: {}\n\n{}\n\n", self.path, self.content)
    }
}

/// Entries worth fetching, in listing order, capped at `limits.max_files`.
pub fn eligible_entries<'a>(
    entries: &'a [TreeEntry],
    filter: &FileFilter,
    limits: &AggregationLimits,
) -> Vec<&'a TreeEntry> {
    entries
        .iter()
        .filter(|entry| entry.kind == EntryKind::Blob)
        .filter(|entry| filter.should_include(&entry.path, Some(entry.size)))
        .filter(|entry| entry.size <= limits.max_file_size_bytes)
        .take(limits.max_files)
        .collect()
}

/// Join fetched files into the context string, in the given order.
pub fn join_context(files: &[FetchedFile]) -> String {
    files
        .iter()
        .map(FetchedFile::block)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the aggregated context for `reference`.
///
/// Fails only when the listing reports that the repository or ref does not exist.
/// Other listing failures and zero eligible files both yield an empty context.
pub async fn aggregate<R>(
    reference: &RepositoryReference,
    reader: &R,
    filter: &FileFilter,
    limits: &AggregationLimits,
) -> Result<String, Error>
where
    R: RepositoryReader + ?Sized,
{
    info!(%reference, "[AGGREGATE] Listing repository tree");
    let entries = match reader.list_tree(reference).await {
        Ok(entries) => entries,
        Err(HostError::NotFound(message)) => {
            warn!(%reference, %message, "[AGGREGATE] Repository or ref not found");
            return Err(Error::Listing {
                reference: reference.to_string(),
                source: HostError::NotFound(message),
            });
        }
        Err(e) => {
            warn!(%reference, error = %e, "[AGGREGATE] Listing failed, continuing with empty context");
            return Ok(String::new());
        }
    };

    let eligible = eligible_entries(&entries, filter, limits);
    info!(
        listed = entries.len(),
        eligible = eligible.len(),
        max_files = limits.max_files,
        "[AGGREGATE] Selected files for context"
    );

    // Each outcome carries its listing index; completion order does not matter.
    let mut pending: FuturesUnordered<_> = eligible
        .iter()
        .copied()
        .enumerate()
        .map(|(index, entry)| async move {
            let outcome = reader.fetch_file(reference, &entry.path).await;
            (index, entry.path.as_str(), outcome)
        })
        .collect();

    let mut slots: Vec<Option<FetchedFile>> = vec![None; eligible.len()];
    while let Some((index, path, outcome)) = pending.next().await {
        match outcome {
            Ok(content) => {
                debug!(path, bytes = content.len(), "[AGGREGATE] Fetched file");
                slots[index] = Some(FetchedFile {
                    path: path.to_string(),
                    content,
                });
            }
            Err(e) => {
                warn!(path, error = %e, "[AGGREGATE] Skipping file that could not be fetched");
            }
        }
    }

    let fetched: Vec<FetchedFile> = slots.into_iter().flatten().collect();
    let context = join_context(&fetched);
    info!(
        files = fetched.len(),
        skipped = eligible.len() - fetched.len(),
        chars = context.len(),
        "[AGGREGATE] Built repository context"
    );
    Ok(context)
}
