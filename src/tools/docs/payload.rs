//! Tool response shapes
//!
//! Every query returns a [`Reply`]: either the success payload or an
//! [`ErrorPayload`], serialized without a tag so the caller sees plain
//! `{ "error": ..., "details": ... }` objects on failure.

use super::format::PageFormat;
use serde::Serialize;

/// Success or structured failure
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Reply<T> {
    /// Operation succeeded
    Success(T),
    /// Operation failed
    Failure(ErrorPayload),
}

impl<T> Reply<T> {
    /// Failure with a summary and the error's message as details
    pub fn failure(error: &str, details: &impl std::fmt::Display) -> Self {
        Reply::Failure(ErrorPayload {
            error: error.to_string(),
            details: details.to_string(),
            query: None,
        })
    }

    /// Whether this is a success
    pub fn is_success(&self) -> bool {
        matches!(self, Reply::Success(_))
    }

    /// Success payload, if any
    pub fn success(self) -> Option<T> {
        match self {
            Reply::Success(value) => Some(value),
            Reply::Failure(_) => None,
        }
    }

    /// Failure payload, if any
    pub fn error(&self) -> Option<&ErrorPayload> {
        match self {
            Reply::Success(_) => None,
            Reply::Failure(payload) => Some(payload),
        }
    }
}

/// Failure payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    /// What failed
    pub error: String,
    /// Why it failed
    pub details: String,
    /// Original query, for search failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Public shape of a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicSummary {
    /// Sidebar title
    pub title: String,
    /// Page identifier, usable as `fetch_page` slug
    pub slug: String,
    /// Absolute URL
    pub url: String,
}

/// `list_topics` result
#[derive(Debug, Clone, Serialize)]
pub struct TopicList {
    /// Topics in navigation order
    pub topics: Vec<TopicSummary>,
    /// Number of topics
    pub total: usize,
}

/// `fetch_page` result
#[derive(Debug, Clone, Serialize)]
pub struct PageContent {
    /// Page title
    pub title: String,
    /// Normalized page identifier
    pub slug: String,
    /// Encoding of `content`
    pub format: PageFormat,
    /// Page content
    pub content: String,
    /// Served from a fresh cache entry
    pub cached: bool,
}

/// One `search_docs` hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Page identifier
    pub slug: String,
    /// Page title
    pub title: String,
    /// Excerpt of the page
    pub excerpt: String,
    /// Relevance, 0-100
    pub score: u8,
    /// Absolute URL
    pub url: String,
}

/// `search_docs` result
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    /// Query as received
    pub query: String,
    /// Hits, best first
    pub results: Vec<SearchHit>,
    /// Number of hits returned
    pub total: usize,
    /// Explanation when the result is empty for a structural reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// `fetch_page` arguments after validation
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    /// Page slug, path or same-site URL
    pub slug: String,
    /// Output encoding
    pub format: PageFormat,
    /// Section headings to keep
    pub sections: Option<Vec<String>>,
    /// Maximum content length in characters
    pub max_length: Option<usize>,
}

impl PageRequest {
    /// Markdown request for a whole page
    #[must_use]
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            ..Self::default()
        }
    }
}
