//! 获取文档页面工具
#![allow(missing_docs)]

use super::format::PageFormat;
use super::payload::PageRequest;
use crate::tools::{json_result, Tool};
use async_trait::async_trait;
use rust_mcp_sdk::macros;
use rust_mcp_sdk::schema::{CallToolError, CallToolResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 获取文档页面的工具参数
#[macros::mcp_tool(
    name = "fetch_page",
    title = "Fetch documentation page",
    description = "Fetch one Drizzle ORM documentation page by slug (for example docs/select), path or site URL. Optionally keep only some sections, cap the length, and choose markdown, json or plaintext output.",
    destructive_hint = false,
    idempotent_hint = true,
    open_world_hint = false,
    read_only_hint = true,
    execution(task_support = "optional")
)]
#[derive(Debug, Clone, Deserialize, Serialize, macros::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FetchPageTool {
    /// 页面标识
    #[json_schema(
        title = "Page slug",
        description = "Page slug as returned by list_topics or search_docs, e.g. docs/migrations. Paths and https://orm.drizzle.team URLs are accepted too."
    )]
    pub slug: String,

    /// 输出格式
    #[json_schema(
        title = "Output format",
        description = "markdown (default), json or plaintext",
        default = "markdown"
    )]
    pub format: Option<String>,

    /// 章节过滤
    #[json_schema(
        title = "Sections",
        description = "Only keep sections whose heading contains one of these strings (case-insensitive). Ignored when nothing matches."
    )]
    pub sections: Option<Vec<String>>,

    /// 最大长度
    #[json_schema(
        title = "Maximum length",
        description = "Truncate the content to this many characters",
        minimum = 1
    )]
    pub max_length: Option<u32>,
}

impl FetchPageTool {
    /// 将工具参数转换为页面请求
    ///
    /// # Errors
    ///
    /// 输出格式未知时返回参数错误
    pub fn into_request(self) -> std::result::Result<PageRequest, CallToolError> {
        let format = match self.format.as_deref() {
            None => PageFormat::default(),
            Some(raw) => raw.parse::<PageFormat>().map_err(|e| {
                CallToolError::invalid_arguments("fetch_page", Some(e))
            })?,
        };

        Ok(PageRequest {
            slug: self.slug,
            format,
            sections: self.sections,
            max_length: self.max_length.map(|n| n as usize),
        })
    }
}

/// 获取文档页面工具实现
pub struct FetchPageToolImpl {
    service: Arc<super::DocService>,
}

impl FetchPageToolImpl {
    /// 创建新的工具实例
    #[must_use]
    pub fn new(service: Arc<super::DocService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for FetchPageToolImpl {
    fn definition(&self) -> rust_mcp_sdk::schema::Tool {
        FetchPageTool::tool()
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        let params: FetchPageTool = serde_json::from_value(arguments).map_err(|e| {
            CallToolError::invalid_arguments("fetch_page", Some(format!("Invalid arguments: {e}")))
        })?;

        let request = params.into_request()?;
        json_result(&self.service.fetch_page(&request).await)
    }
}
