//! 配置模块
//!
//! 优先级：默认值 < TOML 配置文件 < `DRIZZLE_DOCS_*` 环境变量，命令行参数由主程序最后覆盖。

use crate::cache::DEFAULT_TTL_SECS;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "DRIZZLE_DOCS_";

/// 支持的传输模式
pub const TRANSPORT_MODES: [&str; 3] = ["stdio", "http", "sse"];

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// 应用程序配置
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,

    /// 文档站点配置
    pub docs: DocsConfig,

    /// 日志配置
    pub logging: LoggingConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务器名称
    pub name: String,

    /// 服务器版本
    pub version: String,

    /// 服务器描述
    pub description: Option<String>,

    /// 主机地址
    pub host: String,

    /// 端口
    pub port: u16,

    /// 传输模式: stdio, http or sse
    pub transport_mode: String,
}

/// 文档站点配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DocsConfig {
    /// 文档站点根地址，末尾斜杠可省略
    pub base_url: String,

    /// 入口页路径，其导航列出所有主题
    pub entry_path: String,

    /// 内容缓存过期时间（秒）
    pub cache_ttl_secs: u64,

    /// 预热时每批并发获取的页面数
    pub warmup_batch_size: usize,

    /// 摘要最大字符数
    pub excerpt_length: usize,

    /// 启动时是否在后台预热缓存
    pub prewarm: bool,

    /// 单次 HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,

    /// 日志文件路径
    pub file_path: Option<String>,

    /// 是否启用控制台日志 (stderr)
    pub enable_console: bool,

    /// 是否启用文件日志
    pub enable_file: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: crate::NAME.to_string(),
            version: crate::VERSION.to_string(),
            description: Some(
                "Drizzle ORM documentation server: topic listing, page retrieval and fuzzy search"
                    .to_string(),
            ),
            host: "127.0.0.1".to_string(),
            port: 8080,
            transport_mode: "stdio".to_string(),
        }
    }
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://orm.drizzle.team".to_string(),
            entry_path: "/docs/overview".to_string(),
            cache_ttl_secs: DEFAULT_TTL_SECS,
            warmup_batch_size: 5,
            excerpt_length: 200,
            prewarm: true,
            request_timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: Some("./logs/drizzle-docs.log".to_string()),
            enable_console: true,
            enable_file: false,
        }
    }
}

impl AppConfig {
    /// 从文件加载配置
    ///
    /// # Errors
    ///
    /// 如果文件不存在、无法读取或格式无效，返回错误
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {e}", path.display()))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {e}", path.display()))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    ///
    /// # Errors
    ///
    /// 如果无法序列化配置、创建目录或写入文件，返回错误
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| Error::Config(format!("Failed to create directory: {e}")))?;
            }
        }

        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// 验证配置
    ///
    /// # Errors
    ///
    /// 如果配置无效（如空主机名、无效端口、无效站点地址等），返回错误
    pub fn validate(&self) -> Result<(), Error> {
        if self.server.host.trim().is_empty() {
            return Err(Error::Config("Server host must not be empty".to_string()));
        }

        if self.server.port == 0 {
            return Err(Error::Config("Server port must not be 0".to_string()));
        }

        if !TRANSPORT_MODES.contains(&self.server.transport_mode.as_str()) {
            return Err(Error::Config(format!(
                "Invalid transport mode: {}, expected one of {TRANSPORT_MODES:?}",
                self.server.transport_mode
            )));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::Config(format!(
                "Invalid log level: {}, expected one of {LOG_LEVELS:?}",
                self.logging.level
            )));
        }

        self.docs.validate()
    }

    /// 使用 `DRIZZLE_DOCS_*` 环境变量覆盖配置
    ///
    /// # Errors
    ///
    /// 如果环境变量格式无效，返回错误
    pub fn apply_env(&mut self) -> Result<(), Error> {
        if let Some(host) = env_var("HOST") {
            self.server.host = host;
        }

        if let Some(port) = env_var("PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| Error::Config(format!("Invalid port {port:?}: {e}")))?;
        }

        if let Some(mode) = env_var("TRANSPORT_MODE") {
            self.server.transport_mode = mode.to_lowercase();
        }

        if let Some(level) = env_var("LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }

        if let Some(base_url) = env_var("BASE_URL") {
            self.docs.base_url = base_url;
        }

        Ok(())
    }

    /// 从环境变量加载配置
    ///
    /// # Errors
    ///
    /// 如果环境变量格式无效或配置验证失败，返回错误
    pub fn from_env() -> Result<Self, Error> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }
}

impl DocsConfig {
    /// 验证文档站点配置
    ///
    /// # Errors
    ///
    /// 站点地址不是 http(s) URL 或数值参数为 0 时返回错误
    pub fn validate(&self) -> Result<(), Error> {
        let base = url::Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("Invalid base_url {}: {e}", self.base_url)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "base_url must be http or https: {}",
                self.base_url
            )));
        }

        if self.entry_path.trim().is_empty() {
            return Err(Error::Config("entry_path must not be empty".to_string()));
        }

        if self.warmup_batch_size == 0 {
            return Err(Error::Config("warmup_batch_size must be at least 1".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(Error::Config("request_timeout_secs must not be 0".to_string()));
        }

        Ok(())
    }
}

fn env_var(suffix: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{suffix}"))
        .ok()
        .filter(|value| !value.trim().is_empty())
}
