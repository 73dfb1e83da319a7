//! HTML page normalization
//!
//! Turns a raw documentation page into a title and a markdown body:
//! 1. Title from `<title>`, then the first `<h1>`, then `"Untitled"`
//! 2. Navigation, sidebars, headers, footers and asides are dropped
//! 3. The first main-content container wins, falling back to `<body>`
//! 4. The region goes through `html2md`, headings are rewritten to ATX form

use crate::error::{Error, Result};
use crate::utils::string::{collapse_blank_lines, collapse_whitespace};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Nesting beyond this depth is cut off while serializing
const MAX_NESTING_DEPTH: usize = 256;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("BUG: hardcoded selector {css:?}: {e}"))
}

static STRIP_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    selector("nav, .sidebar, footer, header, aside, [data-nav], [data-sidebar], script, style, noscript")
});

static CONTENT_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    ["main", "article", ".content", "[data-content]", ".prose"]
        .into_iter()
        .map(selector)
        .collect()
});

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static H1_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector("body"));

/// A page reduced to what the cache stores
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPage {
    /// Page title, never empty
    pub title: String,
    /// Markdown body, never empty
    pub body: String,
}

/// Normalize a raw HTML page
pub fn normalize(html: &str) -> Result<NormalizedPage> {
    let document = Html::parse_document(html);
    let title = extract_title(&document);

    let region = CONTENT_SELECTORS
        .iter()
        .find_map(|candidate| document.select(candidate).find(|el| !is_stripped(el)))
        .or_else(|| document.select(&BODY_SELECTOR).next())
        .unwrap_or_else(|| document.root_element());

    let mut region_html = String::new();
    serialize_children(&region, &mut region_html, 0);
    if region_html.trim().is_empty() {
        return Err(Error::Content("page has no content region".to_string()));
    }

    let body = to_markdown(&region_html);
    if body.trim().is_empty() {
        return Err(Error::Content(
            "content region produced no text".to_string(),
        ));
    }

    Ok(NormalizedPage { title, body })
}

fn extract_title(document: &Html) -> String {
    let text_of = |selector: &Selector| {
        document
            .select(selector)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|text| !text.is_empty())
    };

    text_of(&TITLE_SELECTOR)
        .or_else(|| text_of(&H1_SELECTOR))
        .unwrap_or_else(|| "Untitled".to_string())
}

/// True if the element or one of its ancestors is a non-content region
fn is_stripped(element: &ElementRef) -> bool {
    STRIP_SELECTOR.matches(element)
        || element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| STRIP_SELECTOR.matches(&ancestor))
}

fn push_escaped(output: &mut String, text: &str, escape_quotes: bool) {
    for ch in text.chars() {
        match ch {
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '&' => output.push_str("&amp;"),
            '"' if escape_quotes => output.push_str("&quot;"),
            c => output.push(c),
        }
    }
}

/// Serialize the children of `element`, skipping non-content subtrees
fn serialize_children(element: &ElementRef, output: &mut String, depth: usize) {
    if depth > MAX_NESTING_DEPTH {
        tracing::warn!(
            element = element.value().name(),
            limit = MAX_NESTING_DEPTH,
            "HTML nesting too deep, truncating"
        );
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_escaped(output, text, false),
            Node::Element(_) => {
                let Some(child_element) = ElementRef::wrap(child) else {
                    continue;
                };
                if STRIP_SELECTOR.matches(&child_element) {
                    continue;
                }

                let name = child_element.value().name();
                output.push('<');
                output.push_str(name);
                for (attr, value) in child_element.value().attrs() {
                    output.push(' ');
                    output.push_str(attr);
                    output.push_str("=\"");
                    push_escaped(output, value, true);
                    output.push('"');
                }
                output.push('>');

                if VOID_ELEMENTS.contains(&name) {
                    continue;
                }

                serialize_children(&child_element, output, depth + 1);
                output.push_str("</");
                output.push_str(name);
                output.push('>');
            }
            _ => {}
        }
    }
}

/// Convert an HTML fragment to normalized markdown
fn to_markdown(html: &str) -> String {
    let markdown = html2md::parse_html(html);
    collapse_blank_lines(&setext_to_atx(&markdown))
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

fn setext_level(line: &str) -> Option<usize> {
    let trimmed = line.trim();
    if trimmed.len() < 3 {
        return None;
    }
    if trimmed.chars().all(|c| c == '=') {
        Some(1)
    } else if trimmed.chars().all(|c| c == '-') {
        Some(2)
    } else {
        None
    }
}

/// Rewrite `Title\n=====` / `Title\n-----` headings as `# Title` / `## Title`
fn setext_to_atx(markdown: &str) -> String {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut in_fence = false;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if is_fence(line) {
            in_fence = !in_fence;
            out.push(line.to_string());
            i += 1;
            continue;
        }

        let trimmed = line.trim();
        let heading_candidate = !in_fence
            && !trimmed.is_empty()
            && !trimmed.starts_with(['#', '-', '*', '|', '>']);
        if heading_candidate {
            if let Some(level) = lines.get(i + 1).and_then(|next| setext_level(next)) {
                out.push(format!("{} {trimmed}", "#".repeat(level)));
                i += 2;
                continue;
            }
        }

        out.push(line.to_string());
        i += 1;
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Migrations - Drizzle ORM</title><style>.x { color: red; }</style></head>
<body>
  <header><a href="/">Home</a></header>
  <nav><a data-nav-index="1" href="/docs/overview">Overview</a></nav>
  <div class="sidebar">Sidebar links</div>
  <main>
    <h1>Migrations</h1>
    <p>Drizzle Kit generates <strong>SQL</strong> migrations.</p>
    <aside>Was this page helpful?</aside>
    <h2>Usage</h2>
    <p>Run the generate command.</p>
  </main>
  <footer>Copyright</footer>
</body>
</html>"#;

    #[test]
    fn test_normalize_extracts_main_content() {
        let page = normalize(PAGE).unwrap();
        assert_eq!(page.title, "Migrations - Drizzle ORM");
        assert!(page.body.contains("Drizzle Kit generates"));
        assert!(page.body.contains("Run the generate command."));
        assert!(page.body.contains("## Usage"));
        assert!(!page.body.contains("Sidebar links"));
        assert!(!page.body.contains("Was this page helpful"));
        assert!(!page.body.contains("Copyright"));
        assert!(!page.body.contains("color: red"));
    }

    #[test]
    fn test_title_falls_back_to_h1_then_untitled() {
        let page = normalize("<html><body><h1> Schema </h1><p>text</p></body></html>").unwrap();
        assert_eq!(page.title, "Schema");

        let page = normalize("<html><body><p>text only</p></body></html>").unwrap();
        assert_eq!(page.title, "Untitled");
    }

    #[test]
    fn test_falls_back_to_body_without_content_container() {
        let page = normalize(
            "<html><body><nav>menu</nav><div><p>Plain body text</p></div></body></html>",
        )
        .unwrap();
        assert!(page.body.contains("Plain body text"));
        assert!(!page.body.contains("menu"));
    }

    #[test]
    fn test_main_inside_stripped_region_is_skipped() {
        let html = "<html><body><aside><main><p>aside main</p></main></aside>\
                    <article><p>real article</p></article></body></html>";
        let page = normalize(html).unwrap();
        assert!(page.body.contains("real article"));
        assert!(!page.body.contains("aside main"));
    }

    #[test]
    fn test_page_without_content_fails() {
        let result = normalize("<html><body><nav>only navigation</nav></body></html>");
        assert!(matches!(result, Err(Error::Content(_))));
    }

    #[test]
    fn test_setext_to_atx() {
        let md = "Title\n==========\n\ntext\n\nSection\n----------\n\n```\ncode\n---\n```";
        let converted = setext_to_atx(md);
        assert!(converted.starts_with("# Title\n"));
        assert!(converted.contains("## Section"));
        assert!(converted.contains("code\n---"));
    }
}
