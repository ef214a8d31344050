use anyhow::Context;
use clap::Parser;
use express_mcp::mcp::ExpressService;
use express_mcp::utils::logger;
use express_mcp::{CliConfig, ExpressClient};
use rmcp::{transport::stdio, ServiceExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌 (stderr)
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting express-mcp v{}", env!("CARGO_PKG_VERSION"));
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if config.credentials.is_unauthenticated() {
        tracing::warn!("⚠️ --customer or --auth_key is empty; upstream may reject requests");
    }

    let client = ExpressClient::from_config(&config).context("failed to build express client")?;
    tracing::info!(
        "📋 Price comparison carriers: {}",
        client.carriers().join(", ")
    );

    let service = ExpressService::new(client)
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;

    tracing::info!("✅ MCP server running, waiting for requests...");
    service.waiting().await?;

    tracing::info!("MCP server shutting down");
    Ok(())
}
