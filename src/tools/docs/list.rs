//! 列出文档主题工具
#![allow(missing_docs)]

use crate::tools::{json_result, Tool};
use async_trait::async_trait;
use rust_mcp_sdk::macros;
use rust_mcp_sdk::schema::{CallToolError, CallToolResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 列出文档主题的工具参数
#[macros::mcp_tool(
    name = "list_topics",
    title = "List documentation topics",
    description = "List every Drizzle ORM documentation topic in sidebar order. Each topic has a title, a slug usable with fetch_page, and its URL. Call this first to discover what the documentation covers.",
    destructive_hint = false,
    idempotent_hint = true,
    open_world_hint = false,
    read_only_hint = true,
    execution(task_support = "optional")
)]
#[derive(Debug, Clone, Default, Deserialize, Serialize, macros::JsonSchema)]
pub struct ListTopicsTool {}

/// 列出文档主题工具实现
pub struct ListTopicsToolImpl {
    service: Arc<super::DocService>,
}

impl ListTopicsToolImpl {
    /// 创建新的工具实例
    #[must_use]
    pub fn new(service: Arc<super::DocService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for ListTopicsToolImpl {
    fn definition(&self) -> rust_mcp_sdk::schema::Tool {
        ListTopicsTool::tool()
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        if !arguments.is_null() {
            let _params: ListTopicsTool = serde_json::from_value(arguments).map_err(|e| {
                CallToolError::invalid_arguments(
                    "list_topics",
                    Some(format!("Invalid arguments: {e}")),
                )
            })?;
        }

        json_result(&self.service.list_topics().await)
    }
}
