//! Documentation query tools module
//!
//! [`DocService`] owns all process-wide state (content cache, metadata cache,
//! search index, warm-up status). It is created once per server and shared
//! behind an `Arc`; nothing outlives the process.

pub mod fetch;
pub mod fetcher;
pub mod format;
pub mod list;
pub mod normalizer;
pub mod payload;
pub mod search;
pub mod topics;
pub mod warmup;

use crate::cache::{CachedDocument, ContentCache, MetadataCache};
use crate::config::DocsConfig;
use crate::error::{Error, Result};
use crate::index::SearchIndex;
use crate::utils::time::{Clock, SystemClock};
use crate::utils::validation::{validate_search_query, validate_slug};
use crate::utils::HttpClientBuilder;
use fetcher::{Fetcher, HttpFetcher};
use format::{filter_sections, render, truncate};
use parking_lot::RwLock;
use payload::{
    ErrorPayload, PageContent, PageRequest, Reply, SearchHit, SearchResults, TopicList,
    TopicSummary,
};
use std::sync::Arc;
use std::time::Duration;
use topics::TopicEntry;
use warmup::WarmupStatus;

/// Default number of search results
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Note returned by searches run before anything was cached
pub const EMPTY_CORPUS_NOTE: &str =
    "No documentation has been cached yet. Fetch a page or wait for the cache warm-up to finish, then search again.";

/// Document service
pub struct DocService {
    config: DocsConfig,
    fetcher: Arc<dyn Fetcher>,
    contents: ContentCache,
    metadata: MetadataCache,
    index: RwLock<Option<Arc<SearchIndex>>>,
    warmup: RwLock<WarmupStatus>,
}

impl DocService {
    /// Create a document service that fetches over HTTP
    pub fn new(config: DocsConfig) -> Result<Self> {
        let client = HttpClientBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_max_idle_per_host(config.warmup_batch_size.max(1))
            .build()?;
        Ok(Self::with_fetcher(
            config,
            Arc::new(HttpFetcher::new(client)),
            Arc::new(SystemClock),
        ))
    }

    /// Create a document service with an explicit fetcher and clock
    pub fn with_fetcher(config: DocsConfig, fetcher: Arc<dyn Fetcher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            contents: ContentCache::new(Duration::from_secs(config.cache_ttl_secs), clock),
            metadata: MetadataCache::new(config.excerpt_length),
            config,
            fetcher,
            index: RwLock::new(None),
            warmup: RwLock::new(WarmupStatus::NotStarted),
        }
    }

    /// Get docs configuration
    #[must_use]
    pub fn config(&self) -> &DocsConfig {
        &self.config
    }

    /// Get fetcher
    #[must_use]
    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    /// Get content cache
    #[must_use]
    pub fn contents(&self) -> &ContentCache {
        &self.contents
    }

    /// Get metadata cache
    #[must_use]
    pub fn metadata(&self) -> &MetadataCache {
        &self.metadata
    }

    /// Absolute URL of a page identifier
    #[must_use]
    pub fn page_url(&self, identifier: &str) -> String {
        topics::page_url(&self.config.base_url, identifier)
    }

    /// Absolute URL of the topic entry page
    #[must_use]
    pub fn entry_url(&self) -> String {
        let entry = topics::identifier_from(&self.config.entry_path, &self.config.base_url)
            .unwrap_or_default();
        self.page_url(&entry)
    }

    /// Turn a caller-supplied slug into a page identifier.
    ///
    /// An in-page anchor is dropped, so `docs/select#filters` shares the cache
    /// entry of `docs/select`.
    pub fn resolve_slug(&self, slug: &str) -> Result<String> {
        validate_slug(slug)?;
        topics::identifier_from(slug, &self.config.base_url)
            .map(|identifier| {
                topics::page_part(&identifier)
                    .trim_end_matches('/')
                    .to_string()
            })
            .filter(|identifier| !identifier.is_empty())
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "{slug} is not a page of {}",
                    self.config.base_url
                ))
            })
    }

    /// Discover the topic catalog from the entry page
    pub async fn discover_topics(&self) -> Result<Vec<TopicEntry>> {
        topics::discover_topics(
            self.fetcher.as_ref(),
            &self.config.base_url,
            &self.config.entry_path,
        )
        .await
    }

    /// Cached page if fresh, otherwise fetch + normalize + cache.
    ///
    /// The flag is `true` when the page came from the cache. On failure nothing
    /// is cached.
    pub async fn get_or_fetch(&self, identifier: &str) -> Result<(CachedDocument, bool)> {
        if let Some(document) = self.contents.get(identifier) {
            return Ok((document, true));
        }

        let url = self.page_url(identifier);
        let html = self.fetcher.fetch(&url).await?;
        let page = normalizer::normalize(&html)?;

        let document = self.contents.put(identifier, &page.title, &page.body)?;
        self.metadata.refresh(&document, &url);
        tracing::debug!(identifier, title = %document.title, "cached page");

        Ok((document, false))
    }

    /// Current search index, rebuilt first if missing or behind the metadata cache
    pub fn search_index(&self) -> Arc<SearchIndex> {
        let current = self.index.read().clone();
        match current {
            Some(index) if index.generation() == self.metadata.generation() => index,
            _ => self.rebuild_index(),
        }
    }

    /// Rebuild the search index from the metadata cache
    pub fn rebuild_index(&self) -> Arc<SearchIndex> {
        let (corpus, generation) = self.metadata.snapshot();
        let index = Arc::new(SearchIndex::build(corpus, generation));
        tracing::debug!(documents = index.len(), generation, "rebuilt search index");
        *self.index.write() = Some(index.clone());
        index
    }

    /// Size and generation of the last built index, without rebuilding
    #[must_use]
    pub fn index_state(&self) -> Option<(usize, u64)> {
        self.index
            .read()
            .as_ref()
            .map(|index| (index.len(), index.generation()))
    }

    /// List every documentation topic, discovering them afresh
    pub async fn list_topics(&self) -> Reply<TopicList> {
        match self.discover_topics().await {
            Ok(entries) => {
                let topics: Vec<TopicSummary> = entries
                    .into_iter()
                    .map(|entry| TopicSummary {
                        title: entry.title,
                        slug: entry.identifier,
                        url: entry.source_url,
                    })
                    .collect();
                Reply::Success(TopicList {
                    total: topics.len(),
                    topics,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "Error listing topics");
                Reply::failure("Failed to list documentation topics", &e)
            }
        }
    }

    /// Fetch one page, optionally filtered to sections, truncated and re-encoded
    pub async fn fetch_page(&self, request: &PageRequest) -> Reply<PageContent> {
        match self.try_fetch_page(request).await {
            Ok(page) => Reply::Success(page),
            Err(e) => {
                tracing::error!(slug = %request.slug, error = %e, "Error fetching page");
                Reply::failure("Failed to fetch documentation page", &e)
            }
        }
    }

    async fn try_fetch_page(&self, request: &PageRequest) -> Result<PageContent> {
        let identifier = self.resolve_slug(&request.slug)?;
        let (document, cached) = self.get_or_fetch(&identifier).await?;

        let mut content = match request.sections.as_deref() {
            Some(sections) if !sections.is_empty() => filter_sections(&document.body, sections),
            _ => document.body.clone(),
        };
        if let Some(max_length) = request.max_length {
            content = truncate(&content, max_length);
        }
        let content = render(request.format, &document.title, &identifier, &content)?;

        Ok(PageContent {
            title: document.title,
            slug: identifier,
            format: request.format,
            content,
            cached,
        })
    }

    /// Fuzzy search over the cached pages
    pub async fn search_docs(&self, query: &str, limit: Option<usize>) -> Reply<SearchResults> {
        if let Err(e) = validate_search_query(query) {
            return Reply::Failure(ErrorPayload {
                error: "Failed to search documentation".to_string(),
                details: e.to_string(),
                query: Some(query.to_string()),
            });
        }

        if self.metadata.is_empty() {
            return Reply::Success(SearchResults {
                query: query.to_string(),
                results: Vec::new(),
                total: 0,
                note: Some(EMPTY_CORPUS_NOTE.to_string()),
            });
        }

        let index = self.search_index();
        let results: Vec<SearchHit> = index
            .search(query, limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
            .into_iter()
            .map(|hit| SearchHit {
                slug: hit.identifier,
                title: hit.title,
                excerpt: hit.excerpt,
                score: hit.score,
                url: hit.source_url,
            })
            .collect();

        tracing::debug!(query, hits = results.len(), "search finished");
        Reply::Success(SearchResults {
            query: query.to_string(),
            total: results.len(),
            results,
            note: None,
        })
    }

    /// Current warm-up state
    #[must_use]
    pub fn warmup_status(&self) -> WarmupStatus {
        self.warmup.read().clone()
    }

    fn set_warmup_status(&self, status: WarmupStatus) {
        *self.warmup.write() = status;
    }
}

/// Re-export tool parameter types
pub use fetch::FetchPageTool;
pub use list::ListTopicsTool;
pub use search::SearchDocsTool;
