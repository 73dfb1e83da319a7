//! Topic discovery from the docs navigation

use super::fetcher::Fetcher;
use crate::error::{Error, Result};
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static NAV_ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[data-nav-index]")
        .unwrap_or_else(|e| panic!("BUG: hardcoded selector 'a[data-nav-index]': {e}"))
});

/// Attribute carrying the sidebar position of a navigation link
const NAV_INDEX_ATTR: &str = "data-nav-index";

/// One entry of the documentation catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicEntry {
    /// Cache key of the page
    pub identifier: String,
    /// Link text shown in the sidebar
    pub title: String,
    /// Absolute URL of the page
    pub source_url: String,
    /// Position in the sidebar
    pub navigation_order: i64,
    /// Raw `href` as found on the entry page
    pub href: String,
}

impl TopicEntry {
    /// Identifier of the page this topic lives on (in-page anchor removed)
    #[must_use]
    pub fn page_identifier(&self) -> &str {
        page_part(&self.identifier)
    }
}

/// Page part of an identifier: everything before the first `#`
#[must_use]
pub fn page_part(identifier: &str) -> &str {
    identifier
        .split_once('#')
        .map_or(identifier, |(page, _)| page)
}

/// Normalize a path, slug or same-site URL into a page identifier.
///
/// Returns `None` for absolute URLs whose scheme, host or port differ from
/// `base_url`, or whose path is outside it.
#[must_use]
pub fn identifier_from(raw: &str, base_url: &str) -> Option<String> {
    let raw = raw.trim();
    if !(raw.starts_with("http://") || raw.starts_with("https://")) {
        return Some(raw.trim_start_matches('/').trim_end_matches('/').to_string());
    }

    let url = Url::parse(raw).ok()?;
    let base = Url::parse(base_url).ok()?;
    if url.scheme() != base.scheme()
        || url.host_str() != base.host_str()
        || url.port_or_known_default() != base.port_or_known_default()
    {
        return None;
    }

    let base_path = base.path().trim_end_matches('/');
    let rest = url.path().strip_prefix(base_path)?;
    if !(rest.is_empty() || rest.starts_with('/')) {
        return None;
    }

    let mut identifier = rest.trim_start_matches('/').trim_end_matches('/').to_string();
    if let Some(fragment) = url.fragment() {
        identifier.push('#');
        identifier.push_str(fragment);
    }
    Some(identifier)
}

/// Absolute URL of a page identifier
#[must_use]
pub fn page_url(base_url: &str, identifier: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), identifier)
}

/// Extract the ordered, de-duplicated topic list from the entry page HTML.
///
/// Anchors need an `href` under `/docs/` or an in-page `#anchor`, non-empty
/// text and a `data-nav-index`. They are sorted by that index (stable), then
/// links that normalize to the same identifier are dropped, keeping the first.
#[must_use]
pub fn extract_topics(html: &str, base_url: &str, entry_identifier: &str) -> Vec<TopicEntry> {
    let document = Html::parse_document(html);

    let mut topics: Vec<TopicEntry> = document
        .select(&NAV_ANCHOR_SELECTOR)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?.trim();
            let title = anchor.text().collect::<String>().trim().to_string();
            if href.is_empty() || title.is_empty() {
                return None;
            }

            let identifier = if href.starts_with("/docs/") {
                identifier_from(href, base_url)?
            } else if href.starts_with('#') {
                format!("{entry_identifier}{href}")
            } else {
                return None;
            };

            let navigation_order = anchor
                .value()
                .attr(NAV_INDEX_ATTR)
                .and_then(|raw| raw.trim().parse::<i64>().ok())
                .unwrap_or(-1);

            Some(TopicEntry {
                source_url: page_url(base_url, &identifier),
                identifier,
                title,
                navigation_order,
                href: href.to_string(),
            })
        })
        .collect();

    topics.sort_by_key(|topic| topic.navigation_order);

    let mut seen = HashSet::new();
    topics.retain(|topic| seen.insert(topic.identifier.clone()));
    topics
}

/// Fetch the entry page and discover every documentation topic.
///
/// An empty catalog is an error: it means the site layout changed.
pub async fn discover_topics(
    fetcher: &dyn Fetcher,
    base_url: &str,
    entry_path: &str,
) -> Result<Vec<TopicEntry>> {
    let entry_identifier = identifier_from(entry_path, base_url).ok_or_else(|| {
        Error::Discovery(format!("entry path {entry_path} is outside {base_url}"))
    })?;
    let entry_url = page_url(base_url, &entry_identifier);

    let html = fetcher
        .fetch(&entry_url)
        .await
        .map_err(|e| Error::Discovery(format!("Failed to fetch docs overview: {e}")))?;

    let topics = extract_topics(&html, base_url, &entry_identifier);
    if topics.is_empty() {
        return Err(Error::Discovery(
            "No documentation topics found on the page".to_string(),
        ));
    }

    tracing::debug!(count = topics.len(), url = %entry_url, "discovered topics");
    Ok(topics)
}
