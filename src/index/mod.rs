//! Fuzzy search index over page metadata
//!
//! The index is an immutable snapshot of the metadata cache. Title, identifier
//! and excerpt are searched; a document is ranked by its best field.

pub mod fuzzy;

use crate::cache::DocMetadata;
use fuzzy::Pattern;
use serde::Serialize;

/// Hard upper bound on returned results
pub const MAX_RESULTS: usize = 50;

/// Highest normalized distance still counted as a match
pub const MATCH_THRESHOLD: f64 = 0.4;

/// Queries shorter than this never match
pub const MIN_MATCH_CHARS: usize = 2;

/// One ranked hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    /// Page identifier
    pub identifier: String,
    /// Page title
    pub title: String,
    /// Excerpt from the metadata cache
    pub excerpt: String,
    /// Absolute URL of the page
    pub source_url: String,
    /// 0-100, 100 being an exact match
    pub score: u8,
}

struct IndexedDoc {
    metadata: DocMetadata,
    fields: [Vec<char>; 3],
}

impl IndexedDoc {
    fn new(metadata: DocMetadata) -> Self {
        let lower = |s: &str| s.to_lowercase().chars().collect::<Vec<_>>();
        let fields = [
            lower(&metadata.title),
            lower(&metadata.identifier),
            lower(&metadata.excerpt),
        ];
        Self { metadata, fields }
    }

    fn best_distance(&self, pattern: &Pattern) -> f64 {
        self.fields
            .iter()
            .map(|field| pattern.distance(field))
            .fold(1.0, f64::min)
    }
}

/// Immutable search snapshot
pub struct SearchIndex {
    docs: Vec<IndexedDoc>,
    generation: u64,
}

impl SearchIndex {
    /// Build an index over `corpus`, remembering the metadata generation it reflects
    #[must_use]
    pub fn build(corpus: Vec<DocMetadata>, generation: u64) -> Self {
        Self {
            docs: corpus.into_iter().map(IndexedDoc::new).collect(),
            generation,
        }
    }

    /// Metadata generation this snapshot was built from
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of indexed documents
    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the index is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Ranked matches for `query`, at most `limit` (clamped to `1..=MAX_RESULTS`)
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredResult> {
        let pattern = Pattern::new(query);
        if pattern.len() < MIN_MATCH_CHARS {
            return Vec::new();
        }
        let limit = limit.clamp(1, MAX_RESULTS);

        let mut results: Vec<ScoredResult> = self
            .docs
            .iter()
            .filter_map(|doc| {
                let distance = doc.best_distance(&pattern);
                (distance <= MATCH_THRESHOLD).then(|| ScoredResult {
                    identifier: doc.metadata.identifier.clone(),
                    title: doc.metadata.title.clone(),
                    excerpt: doc.metadata.excerpt.clone(),
                    source_url: doc.metadata.source_url.clone(),
                    score: ((1.0 - distance) * 100.0).round() as u8,
                })
            })
            .collect();

        // stable: equal scores keep corpus order
        results.sort_by(|a, b| b.score.cmp(&a.score));
        results.truncate(limit);
        results
    }
}
