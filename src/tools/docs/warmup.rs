//! Background cache warm-up
//!
//! Discovers the topic catalog, then fetches every page in sequential batches
//! of concurrent requests. Individual page failures are logged and recorded
//! but never abort the run. The search index is rebuilt once at the end.

use super::DocService;
use crate::utils::time::duration_ms;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

/// Warm-up lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WarmupStatus {
    /// Not started yet
    NotStarted,
    /// Fetching pages
    Running,
    /// Finished, possibly with page failures
    Completed(WarmupReport),
    /// Topic discovery failed, nothing was fetched
    Failed {
        /// Discovery error
        error: String,
    },
    /// Turned off by configuration
    Disabled,
}

/// Page that could not be warmed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarmupFailure {
    /// Page identifier
    pub identifier: String,
    /// Error message
    pub error: String,
}

/// Outcome of one warm-up run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WarmupReport {
    /// Topics discovered
    pub topics: usize,
    /// Distinct pages those topics live on
    pub pages: usize,
    /// Pages now in the content cache
    pub cached: usize,
    /// Pages that failed
    pub failures: Vec<WarmupFailure>,
    /// Documents in the rebuilt search index
    pub indexed: usize,
    /// Wall time of the run
    pub elapsed_ms: i64,
}

impl DocService {
    /// Run the warm-up to completion.
    ///
    /// The returned report is also stored as the service's warm-up status.
    pub async fn warm_cache(&self) -> WarmupReport {
        let started = Instant::now();
        self.set_warmup_status(WarmupStatus::Running);

        let topics = match self.discover_topics().await {
            Ok(topics) => topics,
            Err(e) => {
                tracing::error!(error = %e, "Cache warm-up aborted");
                self.set_warmup_status(WarmupStatus::Failed {
                    error: e.to_string(),
                });
                return WarmupReport {
                    elapsed_ms: duration_ms(started.elapsed()),
                    ..WarmupReport::default()
                };
            }
        };

        let mut seen = HashSet::new();
        let pages: Vec<String> = topics
            .iter()
            .map(|topic| topic.page_identifier().to_string())
            .filter(|page| seen.insert(page.clone()))
            .collect();

        let batch_size = self.config().warmup_batch_size.max(1);
        tracing::info!(
            topics = topics.len(),
            pages = pages.len(),
            batch_size,
            "Starting cache warm-up"
        );

        let mut report = WarmupReport {
            topics: topics.len(),
            pages: pages.len(),
            ..WarmupReport::default()
        };

        for batch in pages.chunks(batch_size) {
            let outcomes = join_all(batch.iter().map(|identifier| async move {
                (identifier, self.get_or_fetch(identifier).await)
            }))
            .await;

            for (identifier, outcome) in outcomes {
                match outcome {
                    Ok(_) => report.cached += 1,
                    Err(e) => {
                        tracing::warn!(identifier = %identifier, error = %e, "Failed to warm page");
                        report.failures.push(WarmupFailure {
                            identifier: identifier.clone(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        report.indexed = self.rebuild_index().len();
        report.elapsed_ms = duration_ms(started.elapsed());

        tracing::info!(
            cached = report.cached,
            failed = report.failures.len(),
            indexed = report.indexed,
            elapsed_ms = report.elapsed_ms,
            "Cache warm-up finished"
        );

        self.set_warmup_status(WarmupStatus::Completed(report.clone()));
        report
    }

    /// Run the warm-up on a background task
    pub fn spawn_warmup(self: &Arc<Self>) -> JoinHandle<WarmupReport> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.warm_cache().await })
    }

    /// Mark the warm-up as turned off
    pub fn disable_warmup(&self) {
        self.set_warmup_status(WarmupStatus::Disabled);
    }
}
