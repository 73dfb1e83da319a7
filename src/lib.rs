//! Drizzle Docs MCP Server
//!
//! An MCP server that serves the Drizzle ORM documentation site as a queryable
//! corpus: topic listing, page retrieval in several formats and typo-tolerant
//! search over a cache that is warmed in the background.

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cache;
pub mod config;
pub mod error;
pub mod index;
pub mod server;
pub mod tools;
pub mod utils;

/// Re-export common types
pub use crate::error::{Error, Result};
pub use crate::server::DocsServer;
pub use crate::tools::docs::DocService;

/// Server version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name
pub const NAME: &str = "drizzle-docs";

/// Initialize logging system with configuration
///
/// Console output goes to stderr so the stdio transport keeps stdout to itself.
///
/// # Errors
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed
pub fn init_logging_with_config(config: &crate::config::LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = match config.level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    };
    let filter = EnvFilter::new(level);

    let file_appender = match (config.enable_file, &config.file_path) {
        (true, Some(file_path)) => {
            let path = std::path::Path::new(file_path);
            let log_dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let log_file_name = path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("drizzle-docs.log"));

            std::fs::create_dir_all(log_dir).map_err(|e| {
                error::Error::Initialization(format!("Failed to create log directory: {e}"))
            })?;

            Some(tracing_appender::rolling::daily(log_dir, log_file_name))
        }
        _ => None,
    };

    // Never run without any output at all
    let console = config.enable_console || file_appender.is_none();

    let console_layer = console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .compact()
    });

    let file_layer = file_appender.map(|appender| {
        fmt::layer()
            .with_writer(appender)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .compact()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| error::Error::Initialization(e.to_string()))?;

    Ok(())
}
