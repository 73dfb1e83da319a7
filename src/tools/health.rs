//! 健康检查工具
#![allow(missing_docs)]

use crate::tools::docs::warmup::WarmupStatus;
use crate::tools::docs::DocService;
use crate::tools::{json_result, Tool};
use crate::utils::time::{current_timestamp_ms, format_timestamp_ms};
use async_trait::async_trait;
use rust_mcp_sdk::macros;
use rust_mcp_sdk::schema::{CallToolError, CallToolResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 健康检查工具参数
#[macros::mcp_tool(
    name = "health_check",
    title = "Health check",
    description = "Check that the documentation site is reachable and report the cache warm-up state, cached page count and search index state. Useful for diagnosing empty search results.",
    destructive_hint = false,
    idempotent_hint = true,
    open_world_hint = false,
    read_only_hint = true,
    execution(task_support = "optional")
)]
#[derive(Debug, Clone, Default, Deserialize, Serialize, macros::JsonSchema)]
pub struct HealthCheckTool {
    /// 详细输出
    #[json_schema(
        title = "Verbose",
        description = "Return every check as JSON, including healthy ones and response times",
        default = false
    )]
    pub verbose: Option<bool>,
}

/// 健康检查结果
#[derive(Debug, Clone, Serialize)]
struct HealthStatus {
    status: String,
    timestamp: String,
    checks: Vec<HealthCheck>,
    #[serde(with = "duration_secs")]
    uptime: Duration,
}

/// 单个健康检查
#[derive(Debug, Clone, Serialize)]
struct HealthCheck {
    name: String,
    status: String,
    duration_ms: u64,
    message: Option<String>,
    error: Option<String>,
}

impl HealthCheck {
    fn healthy(name: &str, duration_ms: u64, message: String) -> Self {
        Self {
            name: name.to_string(),
            status: "healthy".to_string(),
            duration_ms,
            message: Some(message),
            error: None,
        }
    }

    fn with_status(name: &str, status: &str, duration_ms: u64, error: String) -> Self {
        Self {
            name: name.to_string(),
            status: status.to_string(),
            duration_ms,
            message: None,
            error: Some(error),
        }
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}

/// 健康检查工具实现
pub struct HealthCheckToolImpl {
    service: Arc<DocService>,
    start_time: Instant,
}

impl HealthCheckToolImpl {
    /// 创建新的健康检查工具
    #[must_use]
    pub fn new(service: Arc<DocService>) -> Self {
        Self {
            service,
            start_time: Instant::now(),
        }
    }

    /// 检查文档站点入口页
    #[allow(clippy::cast_possible_truncation)]
    async fn check_site(&self) -> HealthCheck {
        let start = Instant::now();
        let url = self.service.entry_url();
        let outcome = self.service.fetcher().fetch(&url).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(_) => HealthCheck::healthy("docs_site", duration_ms, format!("{url} is reachable")),
            Err(e) => HealthCheck::with_status("docs_site", "unhealthy", duration_ms, e.to_string()),
        }
    }

    /// 检查缓存预热状态
    fn check_warmup(&self) -> HealthCheck {
        match self.service.warmup_status() {
            WarmupStatus::Completed(report) if report.failures.is_empty() => HealthCheck::healthy(
                "warmup",
                report.elapsed_ms.try_into().unwrap_or_default(),
                format!("{} pages cached", report.cached),
            ),
            WarmupStatus::Completed(report) => HealthCheck::with_status(
                "warmup",
                "degraded",
                report.elapsed_ms.try_into().unwrap_or_default(),
                format!(
                    "{} of {} pages failed",
                    report.failures.len(),
                    report.pages
                ),
            ),
            WarmupStatus::Failed { error } => {
                HealthCheck::with_status("warmup", "unhealthy", 0, error)
            }
            WarmupStatus::Running => {
                HealthCheck::with_status("warmup", "degraded", 0, "warm-up in progress".to_string())
            }
            WarmupStatus::NotStarted => {
                HealthCheck::with_status("warmup", "degraded", 0, "warm-up not started".to_string())
            }
            WarmupStatus::Disabled => {
                HealthCheck::healthy("warmup", 0, "warm-up disabled".to_string())
            }
        }
    }

    /// 检查缓存与索引
    fn check_cache(&self) -> HealthCheck {
        let contents = self.service.contents();
        let metadata = self.service.metadata();
        let index = match self.service.index_state() {
            Some((documents, generation)) if generation == metadata.generation() => {
                format!("index current with {documents} documents")
            }
            Some((documents, _)) => {
                format!("index stale with {documents} documents, rebuilt on next search")
            }
            None => "index not built yet".to_string(),
        };

        HealthCheck::healthy(
            "cache",
            0,
            format!(
                "{} pages cached ({} fresh), {} in metadata, {index}",
                contents.len(),
                contents.fresh_count(),
                metadata.len()
            ),
        )
    }

    /// 执行所有健康检查
    async fn perform_checks(&self, verbose: bool) -> HealthStatus {
        let checks = vec![
            self.check_site().await,
            self.check_warmup(),
            self.check_cache(),
        ];

        let overall_status = if checks.iter().all(|c| c.status == "healthy") {
            "healthy".to_string()
        } else if checks.iter().any(|c| c.status == "unhealthy") {
            "unhealthy".to_string()
        } else {
            "degraded".to_string()
        };

        HealthStatus {
            status: overall_status,
            timestamp: format_timestamp_ms(current_timestamp_ms()),
            checks: if verbose {
                checks
            } else {
                // 非详细模式下只返回有问题的检查
                checks
                    .into_iter()
                    .filter(|c| c.status != "healthy")
                    .collect()
            },
            uptime: self.start_time.elapsed(),
        }
    }
}

fn summarize(status: &HealthStatus) -> String {
    use std::fmt::Write;

    let mut summary = format!(
        "Status: {}\nUptime: {:.2?}\nTimestamp: {}",
        status.status, status.uptime, status.timestamp
    );

    if !status.checks.is_empty() {
        summary.push_str("\n\nChecks:");
        for check in &status.checks {
            let _ = write!(
                summary,
                "\n- {}: {} ({}ms)",
                check.name, check.status, check.duration_ms
            );
            if let Some(ref msg) = check.message {
                let _ = write!(summary, " - {msg}");
            }
            if let Some(ref err) = check.error {
                let _ = write!(summary, " [error: {err}]");
            }
        }
    }

    summary
}

#[async_trait]
impl Tool for HealthCheckToolImpl {
    fn definition(&self) -> rust_mcp_sdk::schema::Tool {
        HealthCheckTool::tool()
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        let params: HealthCheckTool = if arguments.is_null() {
            HealthCheckTool::default()
        } else {
            serde_json::from_value(arguments).map_err(|e| {
                CallToolError::invalid_arguments(
                    "health_check",
                    Some(format!("Invalid arguments: {e}")),
                )
            })?
        };

        let verbose = params.verbose.unwrap_or(false);
        let health_status = self.perform_checks(verbose).await;

        if verbose {
            json_result(&health_status)
        } else {
            Ok(CallToolResult::text_content(vec![
                summarize(&health_status).into(),
            ]))
        }
    }
}
