//! Page content shaping: section filter, truncation and output formats

use serde::{Deserialize, Serialize};

/// Appended when content is cut at `max_length`
pub const TRUNCATION_MARKER: &str = "\n\n... [content truncated]";

/// Output encoding of a fetched page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    /// Normalized markdown as cached
    #[default]
    Markdown,
    /// Title, slug and content wrapped in a JSON document
    Json,
    /// Markdown with structural characters removed
    Plaintext,
}

impl std::str::FromStr for PageFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(PageFormat::Markdown),
            "json" => Ok(PageFormat::Json),
            "plaintext" | "text" => Ok(PageFormat::Plaintext),
            _ => Err(format!("Unknown format: {s} (expected markdown, json or plaintext)")),
        }
    }
}

impl std::fmt::Display for PageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageFormat::Markdown => write!(f, "markdown"),
            PageFormat::Json => write!(f, "json"),
            PageFormat::Plaintext => write!(f, "plaintext"),
        }
    }
}

fn heading_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let text = trimmed.trim_start_matches('#');
    let level = trimmed.len() - text.len();
    if level == 0 || level > 6 {
        return None;
    }
    if !text.is_empty() && !text.starts_with(char::is_whitespace) {
        return None;
    }
    Some(text.trim().trim_end_matches('#').trim())
}

/// Keep only the heading blocks whose heading contains one of `sections`
/// (case-insensitive).
///
/// A block starts at a heading and runs until the next heading that does not
/// match. Headings inside fenced code are ignored. When nothing matches the
/// body is returned unchanged.
#[must_use]
pub fn filter_sections(body: &str, sections: &[String]) -> String {
    let wanted: Vec<String> = sections
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if wanted.is_empty() {
        return body.to_string();
    }

    let mut kept: Vec<&str> = Vec::new();
    let mut in_fence = false;
    let mut in_section = false;
    let mut matched_any = false;

    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
        } else if !in_fence {
            if let Some(heading) = heading_text(line) {
                let heading = heading.to_lowercase();
                in_section = wanted.iter().any(|w| heading.contains(w.as_str()));
                matched_any |= in_section;
            }
        }

        if in_section {
            kept.push(line);
        }
    }

    if matched_any {
        kept.join("\n").trim().to_string()
    } else {
        body.to_string()
    }
}

/// Cut `content` to `max_length` characters and append [`TRUNCATION_MARKER`]
#[must_use]
pub fn truncate(content: &str, max_length: usize) -> String {
    if content.chars().count() <= max_length {
        return content.to_string();
    }
    let mut cut: String = content.chars().take(max_length).collect();
    cut.push_str(TRUNCATION_MARKER);
    cut
}

/// Markdown reduced to plain text with at most one blank line in a row
#[must_use]
pub fn to_plaintext(markdown: &str) -> String {
    use crate::utils::string::{collapse_blank_lines, strip_markdown};

    collapse_blank_lines(&strip_markdown(markdown))
}

/// Render `content` in the requested format
pub fn render(
    format: PageFormat,
    title: &str,
    slug: &str,
    content: &str,
) -> crate::error::Result<String> {
    match format {
        PageFormat::Markdown => Ok(content.to_string()),
        PageFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "title": title,
            "slug": slug,
            "content": content,
        }))?),
        PageFormat::Plaintext => Ok(to_plaintext(content)),
    }
}
