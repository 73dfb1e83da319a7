//! Utility functions module

use crate::error::{Error, Result};
use reqwest::Client;
use std::time::Duration;

/// HTTP client builder
pub struct HttpClientBuilder {
    timeout: Duration,
    connect_timeout: Duration,
    pool_max_idle_per_host: usize,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 10,
            user_agent: format!("DrizzleDocsMCP/{}", crate::VERSION),
        }
    }
}

impl HttpClientBuilder {
    /// Create a new HTTP client builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connection pool size
    #[must_use]
    pub fn pool_max_idle_per_host(mut self, max_idle: usize) -> Self {
        self.pool_max_idle_per_host = max_idle;
        self
    }

    /// Build HTTP client
    pub fn build(self) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| Error::Initialization(format!("Failed to build HTTP client: {e}")))
    }
}

/// String utilities
pub mod string {
    /// Characters that carry markdown structure and never survive plain text output
    const MARKUP_CHARS: &[char] = &['#', '*', '`', '[', ']', '(', ')', '{', '}', '<', '>'];

    /// Truncate string and add ellipsis
    #[must_use]
    pub fn truncate_with_ellipsis(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            return s.to_string();
        }

        if max_len <= 3 {
            return "...".to_string();
        }

        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept.trim_end())
    }

    /// Check if string is empty or blank
    #[must_use]
    pub fn is_blank(s: &str) -> bool {
        s.trim().is_empty()
    }

    /// Collapse every run of whitespace (newlines included) into a single space
    #[must_use]
    pub fn collapse_whitespace(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Trim trailing whitespace on every line and keep at most one blank line in a row
    #[must_use]
    pub fn collapse_blank_lines(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        let mut previous_blank = true;

        for line in s.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                if !previous_blank {
                    out.push('\n');
                }
                previous_blank = true;
                continue;
            }
            out.push_str(line);
            out.push('\n');
            previous_blank = false;
        }

        out.trim_end().to_string()
    }

    /// Remove markdown markup, keeping the readable text.
    ///
    /// Fence lines are dropped (their code is kept), links and images are
    /// reduced to their label, backslash escapes are resolved and every
    /// structural character is removed.
    #[must_use]
    pub fn strip_markdown(s: &str) -> String {
        let mut out = String::with_capacity(s.len());

        for line in s.lines() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
                out.push('\n');
                continue;
            }

            let reduced = reduce_links(line);
            let mut chars = reduced.chars().peekable();
            let mut cleaned = String::with_capacity(reduced.len());
            while let Some(ch) = chars.next() {
                if ch == '\\' {
                    if let Some(&next) = chars.peek() {
                        if next.is_ascii_punctuation() {
                            chars.next();
                            if !MARKUP_CHARS.contains(&next) {
                                cleaned.push(next);
                            }
                            continue;
                        }
                    }
                }
                if !MARKUP_CHARS.contains(&ch) {
                    cleaned.push(ch);
                }
            }

            out.push_str(cleaned.trim());
            out.push('\n');
        }

        out
    }

    /// Replace `[label](target)` and `![alt](src)` with their label
    fn reduce_links(line: &str) -> String {
        let chars: Vec<char> = line.chars().collect();
        let mut out = String::with_capacity(line.len());
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            if ch == '!' && chars.get(i + 1) == Some(&'[') {
                i += 1;
                continue;
            }
            if ch == '[' {
                if let Some(label_end) = find_closing(&chars, i, '[', ']') {
                    if chars.get(label_end + 1) == Some(&'(') {
                        if let Some(target_end) = find_closing(&chars, label_end + 1, '(', ')') {
                            out.extend(&chars[i + 1..label_end]);
                            i = target_end + 1;
                            continue;
                        }
                    }
                }
            }
            out.push(ch);
            i += 1;
        }

        out
    }

    fn find_closing(chars: &[char], open_at: usize, open: char, close: char) -> Option<usize> {
        let mut depth = 0usize;
        for (offset, &ch) in chars[open_at..].iter().enumerate() {
            if ch == open {
                depth += 1;
            } else if ch == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(open_at + offset);
                }
            }
        }
        None
    }

}

/// Time utilities
pub mod time {
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::time::Duration;

    /// Source of wall-clock time in milliseconds since the Unix epoch
    pub trait Clock: Send + Sync {
        /// Current time in milliseconds
        fn now_ms(&self) -> i64;
    }

    /// Clock backed by the system time
    #[derive(Debug, Default, Clone, Copy)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now_ms(&self) -> i64 {
            current_timestamp_ms()
        }
    }

    /// Clock that only moves when told to
    #[derive(Debug, Default)]
    pub struct ManualClock {
        now_ms: AtomicI64,
    }

    impl ManualClock {
        /// Create a clock frozen at `start_ms`
        #[must_use]
        pub fn new(start_ms: i64) -> Self {
            Self {
                now_ms: AtomicI64::new(start_ms),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: Duration) {
            self.now_ms.fetch_add(duration_ms(by), Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> i64 {
            self.now_ms.load(Ordering::SeqCst)
        }
    }

    /// Get current timestamp (milliseconds)
    #[must_use]
    pub fn current_timestamp_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Convert a duration to whole milliseconds, saturating
    #[must_use]
    pub fn duration_ms(duration: Duration) -> i64 {
        i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
    }

    /// Format a millisecond timestamp as RFC 3339
    #[must_use]
    pub fn format_timestamp_ms(ms: i64) -> String {
        DateTime::<Utc>::from_timestamp_millis(ms)
            .map_or_else(|| ms.to_string(), |dt| dt.to_rfc3339())
    }
}

/// Validation utilities
pub mod validation {
    use super::string::is_blank;
    use crate::error::Error;

    /// Validate a page slug
    pub fn validate_slug(slug: &str) -> Result<(), Error> {
        if is_blank(slug) {
            return Err(Error::InvalidArgument("Slug cannot be empty".to_string()));
        }

        if slug.len() > 300 {
            return Err(Error::InvalidArgument("Slug is too long".to_string()));
        }

        if slug.chars().any(char::is_whitespace) {
            return Err(Error::InvalidArgument(
                "Slug cannot contain whitespace".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate search query
    pub fn validate_search_query(query: &str) -> Result<(), Error> {
        if is_blank(query) {
            return Err(Error::InvalidArgument(
                "Search query cannot be empty".to_string(),
            ));
        }

        if query.len() > 200 {
            return Err(Error::InvalidArgument(
                "Search query is too long".to_string(),
            ));
        }

        Ok(())
    }

}
