//! MCP 处理器实现

use crate::server::DocsServer;
use crate::tools::ToolRegistry;
use async_trait::async_trait;
use rust_mcp_sdk::{
    mcp_server::ServerHandler,
    schema::{
        CallToolError, CallToolRequestParams, CallToolResult, ListToolsResult,
        PaginatedRequestParams, RpcError,
    },
    McpServer,
};
use std::sync::Arc;

/// MCP 服务器处理器
pub struct DocsHandler {
    server: Arc<DocsServer>,
}

impl DocsHandler {
    /// 创建新的处理器
    #[must_use]
    pub fn new(server: Arc<DocsServer>) -> Self {
        Self { server }
    }

    /// 获取工具注册器
    fn tool_registry(&self) -> &ToolRegistry {
        self.server.tool_registry()
    }
}

#[async_trait]
impl ServerHandler for DocsHandler {
    /// 处理列出工具请求
    async fn handle_list_tools_request(
        &self,
        _request: Option<PaginatedRequestParams>,
        _runtime: Arc<dyn McpServer>,
    ) -> std::result::Result<ListToolsResult, RpcError> {
        Ok(ListToolsResult {
            tools: self.tool_registry().get_tools(),
            meta: None,
            next_cursor: None,
        })
    }

    /// 处理调用工具请求
    async fn handle_call_tool_request(
        &self,
        params: CallToolRequestParams,
        _runtime: Arc<dyn McpServer>,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        tracing::debug!(tool = %params.name, "tool call");
        self.tool_registry()
            .execute_tool(
                &params.name,
                params
                    .arguments
                    .map_or(serde_json::Value::Null, serde_json::Value::Object),
            )
            .await
    }
}
