//! 搜索文档工具
#![allow(missing_docs)]

use crate::tools::{json_result, Tool};
use async_trait::async_trait;
use rust_mcp_sdk::macros;
use rust_mcp_sdk::schema::{CallToolError, CallToolResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 搜索文档的工具参数
#[macros::mcp_tool(
    name = "search_docs",
    title = "Search documentation",
    description = "Fuzzy search over the cached Drizzle ORM documentation by title, slug and excerpt. Tolerates typos. Returns slugs with a 0-100 relevance score; use fetch_page to read a hit.",
    destructive_hint = false,
    idempotent_hint = true,
    open_world_hint = false,
    read_only_hint = true,
    execution(task_support = "optional")
)]
#[derive(Debug, Clone, Deserialize, Serialize, macros::JsonSchema)]
pub struct SearchDocsTool {
    /// 搜索查询
    #[json_schema(
        title = "Query",
        description = "Search terms, e.g. migrations, relational queries, postgres enum"
    )]
    pub query: String,

    /// 结果数量限制
    #[json_schema(
        title = "Result limit",
        description = "Maximum number of results, clamped to 1-50",
        minimum = 1,
        maximum = 50,
        default = 10
    )]
    pub limit: Option<u32>,
}

/// 搜索文档工具实现
pub struct SearchDocsToolImpl {
    service: Arc<super::DocService>,
}

impl SearchDocsToolImpl {
    /// 创建新的工具实例
    #[must_use]
    pub fn new(service: Arc<super::DocService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for SearchDocsToolImpl {
    fn definition(&self) -> rust_mcp_sdk::schema::Tool {
        SearchDocsTool::tool()
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        let params: SearchDocsTool = serde_json::from_value(arguments).map_err(|e| {
            CallToolError::invalid_arguments(
                "search_docs",
                Some(format!("Invalid arguments: {e}")),
            )
        })?;

        let limit = params.limit.map(|n| n as usize);
        json_result(&self.service.search_docs(&params.query, limit).await)
    }
}
