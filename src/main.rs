//! Drizzle Docs MCP 服务器主程序

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use drizzle_docs::config::AppConfig;
use drizzle_docs::{DocService, DocsServer};
use rust_mcp_sdk::schema::ContentBlock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "drizzle-docs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MCP server for the Drizzle ORM documentation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件路径
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// 启用调试日志
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 启动服务器
    Serve {
        /// 传输模式 [stdio, http, sse]
        #[arg(short, long)]
        mode: Option<String>,

        /// 监听主机
        #[arg(long)]
        host: Option<String>,

        /// 监听端口
        #[arg(short, long)]
        port: Option<u16>,

        /// 文档站点根地址
        #[arg(long)]
        base_url: Option<String>,

        /// 跳过后台缓存预热
        #[arg(long)]
        no_prewarm: bool,
    },

    /// 生成配置文件
    Config {
        /// 输出文件路径
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// 覆盖已存在的文件
        #[arg(short, long)]
        force: bool,
    },

    /// 测试工具
    Test {
        /// 要测试的工具 [list_topics, fetch_page, search_docs, health_check]
        #[arg(short, long, default_value = "list_topics")]
        tool: String,

        /// 页面标识 (fetch_page)
        #[arg(long)]
        slug: Option<String>,

        /// 搜索关键词 (search_docs)
        #[arg(long)]
        query: Option<String>,

        /// 结果数量上限 (search_docs)
        #[arg(long)]
        limit: Option<u32>,

        /// 输出格式 (fetch_page) [markdown, json, plaintext]
        #[arg(long)]
        format: Option<String>,

        /// 要保留的章节标题，可重复 (fetch_page)
        #[arg(long = "section")]
        sections: Vec<String>,

        /// 内容截断字符数 (fetch_page)
        #[arg(long)]
        max_length: Option<u32>,

        /// 运行工具前先预热缓存
        #[arg(long)]
        warm: bool,
    },

    /// 显示版本信息
    Version,
}

/// 命令行覆盖参数
#[derive(Default)]
struct ServeOverrides {
    mode: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    base_url: Option<String>,
    no_prewarm: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            mode,
            host,
            port,
            base_url,
            no_prewarm,
        } => {
            let overrides = ServeOverrides {
                mode,
                host,
                port,
                base_url,
                no_prewarm,
            };
            serve_command(&cli.config, cli.debug, overrides).await?;
        }
        Commands::Config { output, force } => {
            config_command(&output, force)?;
        }
        Commands::Test {
            tool,
            slug,
            query,
            limit,
            format,
            sections,
            max_length,
            warm,
        } => {
            let arguments = tool_arguments(
                &tool,
                slug,
                query,
                limit,
                format,
                sections,
                max_length,
            )?;
            test_command(&cli.config, cli.debug, &tool, arguments, warm).await?;
        }
        Commands::Version => {
            version_command();
        }
    }

    Ok(())
}

/// 加载配置：默认值 < 配置文件 < 环境变量 < 命令行参数
fn load_config(config_path: &Path, overrides: ServeOverrides) -> anyhow::Result<AppConfig> {
    let mut config = if config_path.exists() {
        AppConfig::from_file(config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?
    } else {
        AppConfig::default()
    };

    config.apply_env()?;

    if let Some(mode) = overrides.mode {
        config.server.transport_mode = mode.to_lowercase();
    }
    if let Some(host) = overrides.host {
        config.server.host = host;
    }
    if let Some(port) = overrides.port {
        config.server.port = port;
    }
    if let Some(base_url) = overrides.base_url {
        config.docs.base_url = base_url;
    }
    if overrides.no_prewarm {
        config.docs.prewarm = false;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn init_logging(config: &AppConfig, debug: bool) -> anyhow::Result<()> {
    let mut logging = config.logging.clone();
    if debug {
        logging.level = "debug".to_string();
    }
    drizzle_docs::init_logging_with_config(&logging).context("Failed to initialize logging")?;
    Ok(())
}

/// 启动服务器命令
async fn serve_command(
    config_path: &Path,
    debug: bool,
    overrides: ServeOverrides,
) -> anyhow::Result<()> {
    let config = load_config(config_path, overrides)?;
    init_logging(&config, debug)?;

    tracing::info!(
        version = drizzle_docs::VERSION,
        mode = %config.server.transport_mode,
        base_url = %config.docs.base_url,
        "Starting Drizzle Docs MCP server"
    );

    let server = DocsServer::new(config).context("Failed to create server")?;
    server.run().await.context("Server stopped with an error")?;

    Ok(())
}

/// 生成配置文件命令
fn config_command(output: &Path, force: bool) -> anyhow::Result<()> {
    if output.exists() && !force {
        bail!(
            "Config file already exists: {}, use --force to overwrite",
            output.display()
        );
    }

    AppConfig::default()
        .save_to_file(output)
        .context("Failed to save config file")?;

    println!("Config file written to {}", output.display());
    Ok(())
}

/// 根据命令行参数构建工具的 JSON 参数
fn tool_arguments(
    tool: &str,
    slug: Option<String>,
    query: Option<String>,
    limit: Option<u32>,
    format: Option<String>,
    sections: Vec<String>,
    max_length: Option<u32>,
) -> anyhow::Result<serde_json::Value> {
    let arguments = match tool {
        "list_topics" => serde_json::json!({}),
        "fetch_page" => {
            let Some(slug) = slug else {
                bail!("fetch_page needs --slug");
            };
            let mut arguments = serde_json::json!({ "slug": slug });
            if let Some(format) = format {
                arguments["format"] = format.into();
            }
            if !sections.is_empty() {
                arguments["sections"] = sections.into();
            }
            if let Some(max_length) = max_length {
                arguments["maxLength"] = max_length.into();
            }
            arguments
        }
        "search_docs" => {
            let Some(query) = query else {
                bail!("search_docs needs --query");
            };
            let mut arguments = serde_json::json!({ "query": query });
            if let Some(limit) = limit {
                arguments["limit"] = limit.into();
            }
            arguments
        }
        "health_check" => serde_json::json!({ "verbose": true }),
        other => bail!("Unknown tool: {other}"),
    };
    Ok(arguments)
}

/// 测试工具命令
async fn test_command(
    config_path: &Path,
    debug: bool,
    tool: &str,
    arguments: serde_json::Value,
    warm: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path, ServeOverrides::default())?;
    init_logging(&config, debug)?;

    let service = Arc::new(DocService::new(config.docs.clone())?);
    if warm {
        let report = service.warm_cache().await;
        eprintln!(
            "Warm-up: {} pages cached, {} failed",
            report.cached,
            report.failures.len()
        );
    }

    let registry = drizzle_docs::tools::create_default_registry(&service);
    let result = registry
        .execute_tool(tool, arguments)
        .await
        .map_err(|e| anyhow::anyhow!("{tool} failed: {e}"))?;

    for content in &result.content {
        match content {
            ContentBlock::TextContent(text_content) => println!("{}", text_content.text),
            other => println!("{other:?}"),
        }
    }

    Ok(())
}

/// 版本命令
fn version_command() {
    println!("Drizzle Docs MCP server v{}", env!("CARGO_PKG_VERSION"));
    println!("Build time: {}", env!("BUILD_TIMESTAMP"));
    println!("Git commit: {}", env!("GIT_COMMIT"));
    println!("Rust version: {}", env!("RUST_VERSION"));
}
