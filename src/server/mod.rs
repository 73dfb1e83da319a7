//! 服务器模块
//!
//! 提供 MCP 服务器的实现，支持 stdio、HTTP 和 SSE 传输。

pub mod handler;
pub mod transport;

use crate::config::AppConfig;
use crate::error::Result;
use crate::tools::docs::DocService;
use crate::tools::ToolRegistry;
use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, ProtocolVersion, ServerCapabilities,
    ServerCapabilitiesTools,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub use transport::TransportMode;

/// 初始化时发送给客户端的使用说明
pub const SERVER_INSTRUCTIONS: &str = "Use this server to read the Drizzle ORM documentation. \
Call list_topics first to see what is covered, then fetch_page with a slug to read a page, \
or search_docs to find pages by keyword (typos are tolerated). \
Search only covers pages that are already cached.";

/// MCP 服务器
#[derive(Clone)]
pub struct DocsServer {
    config: AppConfig,
    service: Arc<DocService>,
    tool_registry: Arc<ToolRegistry>,
}

impl DocsServer {
    /// 创建新的服务器实例
    pub fn new(config: AppConfig) -> Result<Self> {
        let service = Arc::new(DocService::new(config.docs.clone())?);
        Ok(Self::with_service(config, service))
    }

    /// 使用已有的文档服务创建服务器
    #[must_use]
    pub fn with_service(config: AppConfig, service: Arc<DocService>) -> Self {
        let tool_registry = Arc::new(crate::tools::create_default_registry(&service));
        Self {
            config,
            service,
            tool_registry,
        }
    }

    /// 获取配置
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 获取文档服务
    #[must_use]
    pub fn service(&self) -> &Arc<DocService> {
        &self.service
    }

    /// 获取工具注册器
    #[must_use]
    pub fn tool_registry(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }

    /// 启动后台缓存预热（配置关闭时不启动）
    ///
    /// 必须在 tokio 运行时内调用。
    pub fn start_warmup(&self) -> Option<JoinHandle<crate::tools::docs::warmup::WarmupReport>> {
        if self.config.docs.prewarm {
            Some(self.service.spawn_warmup())
        } else {
            tracing::info!("Cache warm-up disabled");
            self.service.disable_warmup();
            None
        }
    }

    /// 获取服务器信息
    #[must_use]
    pub fn server_info(&self) -> InitializeResult {
        InitializeResult {
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                title: Some("Drizzle Docs MCP Server".to_string()),
                description: self.config.server.description.clone(),
                icons: vec![],
                website_url: Some(self.config.docs.base_url.clone()),
            },
            capabilities: ServerCapabilities {
                tools: Some(ServerCapabilitiesTools { list_changed: None }),
                resources: None,
                prompts: None,
                experimental: None,
                completions: None,
                logging: None,
                tasks: None,
            },
            protocol_version: ProtocolVersion::V2025_11_25.into(),
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            meta: None,
        }
    }

    /// 按配置的传输模式运行服务器
    pub async fn run(&self) -> Result<()> {
        let mode: TransportMode = self
            .config
            .server
            .transport_mode
            .parse()
            .map_err(crate::error::Error::Config)?;
        let _warmup = self.start_warmup();
        transport::run_server_with_mode(self, mode).await
    }
}
