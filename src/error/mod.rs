//! Error handling module

use thiserror::Error;

/// Application error type
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch failed at the transport level or returned a non-success status
    #[error("Failed to fetch {url}: {message}")]
    Network {
        /// Requested URL
        url: String,
        /// HTTP status code, when the server answered
        status: Option<u16>,
        /// Human readable cause
        message: String,
    },

    /// Page was fetched but has no extractable content
    #[error("No content found on page: {0}")]
    Content(String),

    /// Entry page unreachable or no navigation items found
    #[error("Topic discovery failed: {0}")]
    Discovery(String),

    /// Caller supplied an unusable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Initialization error
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// MCP protocol error
    #[error("MCP protocol error: {0}")]
    Mcp(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Other errors
    #[error("Unknown error: {0}")]
    Other(String),
}

impl Error {
    /// Build a network error for a non-success HTTP status
    #[must_use]
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Error::Network {
            url: url.into(),
            status: Some(status),
            message: format!("HTTP {status}"),
        }
    }

    /// Build a network error for a transport failure
    #[must_use]
    pub fn transport(url: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Error::Network {
            url: url.into(),
            status: None,
            message: cause.to_string(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}
