//! Document metadata cache

use super::{CachedDocument, DocMetadata};
use crate::utils::string::{collapse_whitespace, strip_markdown, truncate_with_ellipsis};
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
struct Entries {
    items: Vec<DocMetadata>,
    positions: HashMap<String, usize>,
    generation: u64,
}

/// Per-page summaries in first-insertion order.
///
/// Regenerating an entry replaces it in place, so ranking ties stay stable
/// across re-fetches. Every refresh bumps the generation under the same lock
/// that writes the entry, so a snapshot and its generation always agree.
pub struct MetadataCache {
    entries: RwLock<Entries>,
    excerpt_length: usize,
}

impl MetadataCache {
    /// Create an empty metadata cache
    #[must_use]
    pub fn new(excerpt_length: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            excerpt_length,
        }
    }

    /// Derive the summary for `document` and store it, replacing any previous one
    pub fn refresh(&self, document: &CachedDocument, source_url: &str) -> DocMetadata {
        let metadata = DocMetadata {
            identifier: document.identifier.clone(),
            title: document.title.clone(),
            excerpt: excerpt(&document.body, self.excerpt_length),
            source_url: source_url.to_string(),
        };

        let mut entries = self.entries.write();
        let existing = entries.positions.get(&metadata.identifier).copied();
        match existing {
            Some(position) => entries.items[position] = metadata.clone(),
            None => {
                let position = entries.items.len();
                entries
                    .positions
                    .insert(metadata.identifier.clone(), position);
                entries.items.push(metadata.clone());
            }
        }
        entries.generation += 1;

        metadata
    }

    /// Summary for one page
    pub fn get(&self, identifier: &str) -> Option<DocMetadata> {
        let entries = self.entries.read();
        entries
            .positions
            .get(identifier)
            .map(|&position| entries.items[position].clone())
    }

    /// Copy of every summary in insertion order, with the generation it reflects
    pub fn snapshot(&self) -> (Vec<DocMetadata>, u64) {
        let entries = self.entries.read();
        (entries.items.clone(), entries.generation)
    }

    /// Number of refreshes so far
    pub fn generation(&self) -> u64 {
        self.entries.read().generation
    }

    /// Number of summaries
    pub fn len(&self) -> usize {
        self.entries.read().items.len()
    }

    /// Whether no page has been summarized yet
    pub fn is_empty(&self) -> bool {
        self.entries.read().items.is_empty()
    }
}

/// Markup-free, single-line, bounded excerpt of a markdown body
#[must_use]
pub fn excerpt(body: &str, max_len: usize) -> String {
    truncate_with_ellipsis(&collapse_whitespace(&strip_markdown(body)), max_len)
}
