//! Final README assembly.

use crate::contract::RepositoryMetadata;

/// `# {name}`, then the description (if any), then the generated body.
pub fn assemble(metadata: &RepositoryMetadata, generated: &str) -> String {
    let mut document = format!("# {}\n", metadata.name);
    match metadata.description.as_deref().filter(|d| !d.is_empty()) {
        Some(description) => {
            document.push_str(description);
            document.push_str("\n\n");
        }
        None => document.push('\n'),
    }
    document.push_str(generated);
    document
}
