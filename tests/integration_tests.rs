//! Integration tests
//!
//! The documentation site is replaced by an in-memory fetcher and time by a
//! manual clock, so every test is deterministic and offline.

use async_trait::async_trait;
use drizzle_docs::config::{AppConfig, DocsConfig};
use drizzle_docs::error::{Error, Result};
use drizzle_docs::server::DocsServer;
use drizzle_docs::tools::docs::fetcher::Fetcher;
use drizzle_docs::tools::docs::format::{PageFormat, TRUNCATION_MARKER};
use drizzle_docs::tools::docs::payload::PageRequest;
use drizzle_docs::tools::docs::warmup::WarmupStatus;
use drizzle_docs::tools::docs::{DocService, EMPTY_CORPUS_NOTE};
use drizzle_docs::utils::time::{Clock, ManualClock};
use parking_lot::Mutex;
use rust_mcp_sdk::schema::{CallToolResult, ContentBlock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const BASE: &str = "https://orm.drizzle.team";

/// In-memory documentation site that counts requests per URL
#[derive(Default)]
struct MockSite {
    pages: Mutex<HashMap<String, String>>,
    requests: Mutex<HashMap<String, usize>>,
}

impl MockSite {
    fn with_pages(pages: &[(&str, String)]) -> Arc<Self> {
        let site = Arc::new(Self::default());
        for (path, html) in pages {
            site.set_page(path, html.clone());
        }
        site
    }

    fn set_page(&self, path: &str, html: String) {
        self.pages.lock().insert(format!("{BASE}{path}"), html);
    }

    fn requests(&self, path: &str) -> usize {
        self.requests
            .lock()
            .get(&format!("{BASE}{path}"))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Fetcher for MockSite {
    async fn fetch(&self, url: &str) -> Result<String> {
        // fragments never reach the server
        let url = url.split_once('#').map_or(url, |(page, _)| page);
        *self.requests.lock().entry(url.to_string()).or_insert(0) += 1;
        self.pages
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::status(url, 404))
    }
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{title}</title></head><body>\
         <nav><a data-nav-index=\"0\" href=\"/docs/overview\">Overview</a></nav>\
         <main>{body}</main><footer>Footer links</footer></body></html>"
    )
}

fn overview(anchors: &str) -> String {
    format!(
        "<html><head><title>Overview</title></head><body><nav>{anchors}</nav>\
         <main><h1>Drizzle ORM</h1><p>Headless TypeScript ORM.</p></main></body></html>"
    )
}

fn service(site: &Arc<MockSite>, clock: &Arc<ManualClock>) -> Arc<DocService> {
    let clock: Arc<dyn Clock> = clock.clone();
    Arc::new(DocService::with_fetcher(
        DocsConfig::default(),
        site.clone(),
        clock,
    ))
}

fn text_of(result: &CallToolResult) -> &str {
    match result.content.first() {
        Some(ContentBlock::TextContent(text)) => &text.text,
        other => panic!("expected text content, got {other:?}"),
    }
}

#[tokio::test]
async fn test_page_is_fetched_once_then_served_from_cache() {
    let site = MockSite::with_pages(&[(
        "/docs/select",
        page("Select", "<h1>Select</h1><p>Select rows from a table.</p>"),
    )]);
    let clock = Arc::new(ManualClock::new(1_000));
    let service = service(&site, &clock);

    let first = service
        .fetch_page(&PageRequest::new("docs/select"))
        .await
        .success()
        .unwrap();
    assert!(!first.cached);
    assert_eq!(first.title, "Select");
    assert_eq!(first.slug, "docs/select");
    assert!(first.content.contains("Select rows from a table."));
    assert!(!first.content.contains("Footer links"));

    let second = service
        .fetch_page(&PageRequest::new("/docs/select/"))
        .await
        .success()
        .unwrap();
    assert!(second.cached);
    assert_eq!(second.content, first.content);
    assert_eq!(site.requests("/docs/select"), 1);
}

#[tokio::test]
async fn test_expired_page_is_refetched_and_overwritten() {
    let site = MockSite::with_pages(&[("/docs/rqb", page("Queries", "<p>Version one.</p>"))]);
    let clock = Arc::new(ManualClock::new(0));
    let service = service(&site, &clock);

    let (first, cached) = service.get_or_fetch("docs/rqb").await.unwrap();
    assert!(!cached);
    assert!(first.body.contains("Version one."));

    clock.advance(Duration::from_secs(3599));
    assert!(service.get_or_fetch("docs/rqb").await.unwrap().1);

    site.set_page("/docs/rqb", page("Queries", "<p>Version two.</p>"));
    clock.advance(Duration::from_secs(1));

    let (second, cached) = service.get_or_fetch("docs/rqb").await.unwrap();
    assert!(!cached);
    assert!(second.body.contains("Version two."));
    assert_eq!(second.fetched_at_ms, 3_600_000);
    assert_eq!(site.requests("/docs/rqb"), 2);
    assert_eq!(service.contents().len(), 1);
    assert_eq!(service.metadata().len(), 1);
    assert!(service
        .metadata()
        .get("docs/rqb")
        .unwrap()
        .excerpt
        .contains("Version two."));
}

#[tokio::test]
async fn test_failed_fetch_caches_nothing() {
    let site = MockSite::with_pages(&[]);
    let service = service(&site, &Arc::new(ManualClock::new(0)));

    let reply = service.fetch_page(&PageRequest::new("docs/missing")).await;
    let error = reply.error().unwrap();
    assert_eq!(error.error, "Failed to fetch documentation page");
    assert!(error.details.contains("HTTP 404"));
    assert!(service.contents().is_empty());
    assert!(service.metadata().is_empty());

    site.set_page("/docs/missing", page("Found", "<p>Now it exists.</p>"));
    let page = service
        .fetch_page(&PageRequest::new("docs/missing"))
        .await
        .success()
        .unwrap();
    assert!(!page.cached);
}

#[tokio::test]
async fn test_invalid_slugs_are_rejected() {
    let site = MockSite::with_pages(&[]);
    let service = service(&site, &Arc::new(ManualClock::new(0)));

    for slug in ["", "   ", "https://example.com/docs/select", "docs/has space"] {
        let reply = service.fetch_page(&PageRequest::new(slug)).await;
        assert!(!reply.is_success(), "{slug:?} should be rejected");
    }
    assert_eq!(site.requests.lock().len(), 0);
}

#[tokio::test]
async fn test_list_topics_orders_and_dedupes() {
    let anchors = r##"
        <a data-nav-index="2" href="/docs/select">Select</a>
        <a data-nav-index="0" href="/docs/overview">Overview</a>
        <a data-nav-index="1" href="#quick-start">Quick start</a>
        <a data-nav-index="3" href="/docs/select">Select (duplicate)</a>
        <a data-nav-index="4" href="https://github.com/drizzle-team">GitHub</a>
    "##;
    let site = MockSite::with_pages(&[("/docs/overview", overview(anchors))]);
    let service = service(&site, &Arc::new(ManualClock::new(0)));

    let list = service.list_topics().await.success().unwrap();
    assert_eq!(list.total, 3);
    let slugs: Vec<&str> = list.topics.iter().map(|t| t.slug.as_str()).collect();
    assert_eq!(
        slugs,
        vec!["docs/overview", "docs/overview#quick-start", "docs/select"]
    );
    assert_eq!(list.topics[2].title, "Select");
    assert_eq!(list.topics[2].url, "https://orm.drizzle.team/docs/select");

    // discovery never caches
    service.list_topics().await;
    assert_eq!(site.requests("/docs/overview"), 2);
    assert!(service.contents().is_empty());
}

#[tokio::test]
async fn test_anchor_slug_shares_page_cache_entry() {
    let anchors = r##"
        <a data-nav-index="0" href="/docs/overview">Overview</a>
        <a data-nav-index="1" href="/docs/select">Select</a>
        <a data-nav-index="2" href="/docs/select#filters">Filters</a>
    "##;
    let site = MockSite::with_pages(&[
        ("/docs/overview", overview(anchors)),
        ("/docs/select", page("Select", "<p>Select rows from a table.</p>")),
    ]);
    let service = service(&site, &Arc::new(ManualClock::new(0)));

    let list = service.list_topics().await.success().unwrap();
    let slugs: Vec<String> = list.topics.into_iter().map(|t| t.slug).collect();
    assert_eq!(slugs, vec!["docs/overview", "docs/select", "docs/select#filters"]);

    let mut cached = Vec::new();
    for slug in &slugs {
        let page = service
            .fetch_page(&PageRequest::new(slug))
            .await
            .success()
            .unwrap();
        cached.push((page.slug, page.cached));
    }
    assert_eq!(
        cached,
        vec![
            ("docs/overview".to_string(), false),
            ("docs/select".to_string(), false),
            ("docs/select".to_string(), true),
        ]
    );
    assert_eq!(service.contents().len(), 2);
    assert_eq!(service.metadata().len(), 2);
    assert_eq!(site.requests("/docs/select"), 1);

    let results = service.search_docs("select", None).await.success().unwrap();
    let hits: Vec<&str> = results.results.iter().map(|hit| hit.slug.as_str()).collect();
    assert_eq!(hits.iter().filter(|slug| **slug == "docs/select").count(), 1);
    assert!(hits.iter().all(|slug| !slug.contains('#')));
}

#[tokio::test]
async fn test_list_topics_without_anchors_is_an_error() {
    let site = MockSite::with_pages(&[("/docs/overview", overview(""))]);
    let service = service(&site, &Arc::new(ManualClock::new(0)));

    let reply = service.list_topics().await;
    let error = reply.error().unwrap();
    assert_eq!(error.error, "Failed to list documentation topics");
    assert!(error.details.contains("No documentation topics found"));
}

#[tokio::test]
async fn test_search_tolerates_typos() {
    let site = MockSite::with_pages(&[
        (
            "/docs/migrations",
            page("Migrations", "<p>Generate and apply SQL migrations with Drizzle Kit.</p>"),
        ),
        (
            "/docs/select",
            page("Select", "<p>Select rows from a table.</p>"),
        ),
    ]);
    let service = service(&site, &Arc::new(ManualClock::new(0)));
    service.get_or_fetch("docs/migrations").await.unwrap();
    service.get_or_fetch("docs/select").await.unwrap();

    let results = service.search_docs("migartion", None).await.success().unwrap();
    assert_eq!(results.query, "migartion");
    assert!(results.total >= 1);
    assert_eq!(results.results[0].slug, "docs/migrations");
    assert_eq!(results.results[0].title, "Migrations");
    assert!(results.results[0].score >= 60);
    assert!(results.results.iter().all(|hit| hit.slug != "docs/select"));
    assert!(results.note.is_none());
}

#[tokio::test]
async fn test_search_index_follows_new_pages() {
    let site = MockSite::with_pages(&[
        ("/docs/select", page("Select", "<p>Select rows.</p>")),
        ("/docs/insert", page("Insert", "<p>Insert rows.</p>")),
    ]);
    let service = service(&site, &Arc::new(ManualClock::new(0)));

    service.get_or_fetch("docs/select").await.unwrap();
    let before = service.search_docs("insert", None).await.success().unwrap();
    assert!(before.results.iter().all(|hit| hit.slug != "docs/insert"));

    service.get_or_fetch("docs/insert").await.unwrap();
    let after = service.search_docs("insert", None).await.success().unwrap();
    assert_eq!(after.results[0].slug, "docs/insert");
    assert_eq!(after.results[0].score, 100);
}

#[tokio::test]
async fn test_search_during_page_insert_does_not_pin_stale_index() {
    let site = MockSite::with_pages(&[("/docs/select", page("Select", "<p>Select rows.</p>"))]);
    let service = service(&site, &Arc::new(ManualClock::new(0)));
    service.get_or_fetch("docs/select").await.unwrap();
    service.search_docs("select", None).await.success().unwrap();

    // content written, summary not yet derived
    let document = service
        .contents()
        .put("docs/insert", "Insert", "Insert rows into a table.")
        .unwrap();
    let during = service.search_docs("insert", None).await.success().unwrap();
    assert!(during.results.iter().all(|hit| hit.slug != "docs/insert"));

    service
        .metadata()
        .refresh(&document, &service.page_url("docs/insert"));
    let after = service.search_docs("insert", None).await.success().unwrap();
    assert_eq!(after.results[0].slug, "docs/insert");
    assert_eq!(
        service.index_state(),
        Some((2, service.metadata().generation()))
    );
}

#[tokio::test]
async fn test_search_limit_is_clamped() {
    let pages: Vec<(String, String)> = (0..97)
        .map(|i| {
            (
                format!("/docs/query-{i}"),
                page(&format!("Query builder {i}"), "<p>Build queries.</p>"),
            )
        })
        .collect();
    let borrowed: Vec<(&str, String)> = pages
        .iter()
        .map(|(path, html)| (path.as_str(), html.clone()))
        .collect();
    let site = MockSite::with_pages(&borrowed);
    let service = service(&site, &Arc::new(ManualClock::new(0)));

    for i in 0..97 {
        service.get_or_fetch(&format!("docs/query-{i}")).await.unwrap();
    }

    let results = service.search_docs("query", Some(100)).await.success().unwrap();
    assert_eq!(results.total, 50);
    assert_eq!(results.results.len(), 50);
    // equal scores keep cache order
    assert_eq!(results.results[0].slug, "docs/query-0");
    assert_eq!(results.results[49].slug, "docs/query-49");

    let one = service.search_docs("query", Some(0)).await.success().unwrap();
    assert_eq!(one.total, 1);
}

#[tokio::test]
async fn test_search_on_empty_cache_explains_itself() {
    let site = MockSite::with_pages(&[]);
    let service = service(&site, &Arc::new(ManualClock::new(0)));

    let results = service.search_docs("select", None).await.success().unwrap();
    assert_eq!(results.total, 0);
    assert_eq!(results.note.as_deref(), Some(EMPTY_CORPUS_NOTE));

    let reply = service.search_docs("   ", None).await;
    let error = reply.error().unwrap();
    assert_eq!(error.error, "Failed to search documentation");
    assert_eq!(error.query.as_deref(), Some("   "));
}

#[tokio::test]
async fn test_fetch_page_sections_truncation_and_formats() {
    let body = "<h1>Joins</h1><p>Intro to joins.</p>\
                <h2>Left join</h2><p>Left join keeps every row.</p>\
                <h2>Inner join</h2><p>Inner join keeps matches.</p>\
                <pre><code>db.select({ id: users.id }).from(users);</code></pre>";
    let site = MockSite::with_pages(&[("/docs/joins", page("Joins", body))]);
    let service = service(&site, &Arc::new(ManualClock::new(0)));

    let filtered = service
        .fetch_page(&PageRequest {
            sections: Some(vec!["left".to_string()]),
            ..PageRequest::new("docs/joins")
        })
        .await
        .success()
        .unwrap();
    assert!(filtered.content.contains("Left join keeps every row."));
    assert!(!filtered.content.contains("Inner join keeps matches."));
    assert!(!filtered.content.contains("Intro to joins."));

    let unmatched = service
        .fetch_page(&PageRequest {
            sections: Some(vec!["window functions".to_string()]),
            ..PageRequest::new("docs/joins")
        })
        .await
        .success()
        .unwrap();
    assert!(unmatched.content.contains("Intro to joins."));
    assert!(unmatched.content.contains("Inner join keeps matches."));

    let truncated = service
        .fetch_page(&PageRequest {
            max_length: Some(10),
            ..PageRequest::new("docs/joins")
        })
        .await
        .success()
        .unwrap();
    assert!(truncated.content.ends_with(TRUNCATION_MARKER));
    assert_eq!(
        truncated.content.chars().count(),
        10 + TRUNCATION_MARKER.chars().count()
    );

    let plain = service
        .fetch_page(&PageRequest {
            format: PageFormat::Plaintext,
            ..PageRequest::new("docs/joins")
        })
        .await
        .success()
        .unwrap();
    assert_eq!(plain.format, PageFormat::Plaintext);
    for forbidden in ['#', '*', '`', '[', ']', '(', ')', '{', '}', '<', '>'] {
        assert!(
            !plain.content.contains(forbidden),
            "{forbidden} left in {:?}",
            plain.content
        );
    }
    assert!(!plain.content.contains("\n\n\n"));
    assert!(plain.content.contains("Left join keeps every row."));

    let json = service
        .fetch_page(&PageRequest {
            format: PageFormat::Json,
            ..PageRequest::new("docs/joins")
        })
        .await
        .success()
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&json.content).unwrap();
    assert_eq!(value["title"], "Joins");
    assert_eq!(value["slug"], "docs/joins");
    assert!(value["content"]
        .as_str()
        .unwrap()
        .contains("Inner join keeps matches."));
    assert!(json.cached);
}

#[tokio::test]
async fn test_warmup_then_search() {
    let anchors = r##"
        <a data-nav-index="0" href="/docs/overview">Overview</a>
        <a data-nav-index="1" href="/docs/migrations">Migrations</a>
        <a data-nav-index="2" href="/docs/gone">Gone</a>
        <a data-nav-index="3" href="/docs/select">Select</a>
        <a data-nav-index="4" href="/docs/select#filters">Filters</a>
    "##;
    let site = MockSite::with_pages(&[
        ("/docs/overview", overview(anchors)),
        ("/docs/migrations", page("Migrations", "<p>Drizzle Kit migrations.</p>")),
        ("/docs/select", page("Select", "<p>Select rows.</p>")),
    ]);
    let service = service(&site, &Arc::new(ManualClock::new(0)));

    let report = service.spawn_warmup().await.unwrap();
    assert_eq!(report.topics, 5);
    assert_eq!(report.pages, 4);
    assert_eq!(report.cached, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].identifier, "docs/gone");
    assert_eq!(report.indexed, 3);
    assert_eq!(site.requests("/docs/select"), 1);
    assert!(matches!(service.warmup_status(), WarmupStatus::Completed(_)));
    assert_eq!(service.index_state(), Some((3, service.metadata().generation())));

    let results = service.search_docs("migartion", Some(5)).await.success().unwrap();
    assert_eq!(results.results[0].slug, "docs/migrations");

    let page = service
        .fetch_page(&PageRequest::new("docs/select"))
        .await
        .success()
        .unwrap();
    assert!(page.cached);
}

/// Site that answers after a delay and logs when each request starts and ends
struct SlowSite {
    entry: String,
    delay: Duration,
    in_flight: Mutex<usize>,
    peak: Mutex<usize>,
    events: Mutex<Vec<(bool, String)>>,
}

#[async_trait]
impl Fetcher for SlowSite {
    async fn fetch(&self, url: &str) -> Result<String> {
        let path = url.trim_start_matches(BASE).to_string();
        if path == "/docs/overview" {
            return Ok(self.entry.clone());
        }

        {
            let mut in_flight = self.in_flight.lock();
            *in_flight += 1;
            let mut peak = self.peak.lock();
            *peak = (*peak).max(*in_flight);
        }
        self.events.lock().push((true, path.clone()));

        sleep(self.delay).await;

        self.events.lock().push((false, path.clone()));
        *self.in_flight.lock() -= 1;
        Ok(page(&path, "<p>Slow page.</p>"))
    }
}

#[tokio::test(start_paused = true)]
async fn test_warmup_batches_run_one_after_another() {
    let paths: Vec<String> = (0..12).map(|i| format!("/docs/page-{i}")).collect();
    let anchors: String = paths
        .iter()
        .enumerate()
        .map(|(i, path)| format!("<a data-nav-index=\"{i}\" href=\"{path}\">Page {i}</a>"))
        .collect();
    let site = Arc::new(SlowSite {
        entry: overview(&anchors),
        delay: Duration::from_millis(50),
        in_flight: Mutex::new(0),
        peak: Mutex::new(0),
        events: Mutex::new(Vec::new()),
    });
    let config = DocsConfig::default();
    let batch_size = config.warmup_batch_size;
    let service = DocService::with_fetcher(config, site.clone(), Arc::new(ManualClock::new(0)));

    let report = service.warm_cache().await;
    assert_eq!(report.cached, 12);
    assert!(report.failures.is_empty());
    assert_eq!(*site.peak.lock(), batch_size);

    let events = site.events.lock().clone();
    let position = |start: bool, path: &str| {
        events
            .iter()
            .position(|(is_start, p)| *is_start == start && p == path)
            .unwrap()
    };
    for (i, earlier) in paths.iter().enumerate() {
        for later in paths.iter().skip((i / batch_size + 1) * batch_size) {
            assert!(
                position(false, earlier) < position(true, later),
                "{later} started before {earlier} finished"
            );
        }
    }
}

#[tokio::test]
async fn test_tools_through_registry() {
    let site = MockSite::with_pages(&[(
        "/docs/select",
        page("Select", "<p>Select rows from a table.</p>"),
    )]);
    let service = service(&site, &Arc::new(ManualClock::new(0)));
    let registry = drizzle_docs::tools::create_default_registry(&service);

    let names: Vec<String> = registry.get_tools().into_iter().map(|t| t.name).collect();
    assert_eq!(
        names,
        vec!["list_topics", "fetch_page", "search_docs", "health_check"]
    );

    let result = registry
        .execute_tool(
            "fetch_page",
            serde_json::json!({ "slug": "docs/select", "maxLength": 6 }),
        )
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(text_of(&result)).unwrap();
    assert_eq!(value["slug"], "docs/select");
    assert_eq!(value["format"], "markdown");
    assert_eq!(value["cached"], false);

    let result = registry
        .execute_tool("search_docs", serde_json::json!({ "query": "selcet" }))
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(text_of(&result)).unwrap();
    assert_eq!(value["results"][0]["slug"], "docs/select");

    // failures past argument validation are payloads, not protocol errors
    let result = registry
        .execute_tool("fetch_page", serde_json::json!({ "slug": "docs/nope" }))
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(text_of(&result)).unwrap();
    assert_eq!(value["error"], "Failed to fetch documentation page");

    assert!(registry
        .execute_tool(
            "fetch_page",
            serde_json::json!({ "slug": "docs/select", "format": "html" })
        )
        .await
        .is_err());
    assert!(registry
        .execute_tool("search_docs", serde_json::json!({}))
        .await
        .is_err());
    assert!(registry
        .execute_tool("no_such_tool", serde_json::json!({}))
        .await
        .is_err());
}

#[tokio::test]
async fn test_health_check_reports_cache_state() {
    let site = MockSite::with_pages(&[
        ("/docs/overview", overview(r#"<a data-nav-index="0" href="/docs/overview">Overview</a>"#)),
    ]);
    let service = service(&site, &Arc::new(ManualClock::new(0)));
    let registry = drizzle_docs::tools::create_default_registry(&service);

    service.warm_cache().await;

    let result = registry
        .execute_tool("health_check", serde_json::json!({ "verbose": true }))
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(text_of(&result)).unwrap();
    assert_eq!(value["status"], "healthy");
    assert_eq!(value["checks"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_server_without_prewarm() {
    let site = MockSite::with_pages(&[]);
    let service = service(&site, &Arc::new(ManualClock::new(0)));

    let mut config = AppConfig::default();
    config.docs.prewarm = false;
    let server = DocsServer::with_service(config, service);

    assert!(server.start_warmup().is_none());
    assert_eq!(server.service().warmup_status(), WarmupStatus::Disabled);

    let info = server.server_info();
    assert_eq!(info.server_info.name, "drizzle-docs");
    assert!(info.instructions.unwrap().contains("list_topics"));
    assert_eq!(server.tool_registry().get_tools().len(), 4);
}
