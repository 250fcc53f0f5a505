use anyhow::{Context, Result};
use owui_client::OpenWebUi;
use owui_mcp::{
    adapters::server::OwuiMcpServer,
    app::{discovery, registry::ToolRegistry},
    infra::{config::AppConfig, metrics},
};
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    // IMPORTANT: write logs to stderr; stdout must remain clear for MCP JSON-RPC
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = AppConfig::load()?;
    if let Some(metrics_cfg) = config.metrics_server_config()? {
        if metrics_cfg.auth_token.is_none() {
            tracing::warn!(
                addr = %metrics_cfg.addr,
                "metrics auth token missing; set METRICS_AUTH_TOKEN for production"
            );
        }
        metrics::spawn_metrics_server(metrics_cfg).await;
    }

    tracing::info!(api_url = %config.api_url(), "owui-mcp starting");
    if config.api_key.is_none() {
        tracing::warn!("OWUI_API_KEY is not set; requests will be unauthenticated");
    }

    let client =
        OpenWebUi::new(config.client_config()).context("construct Open WebUI client")?;

    // Discovery and registration happen once, before the serve loop; any
    // failure here aborts startup rather than serving a partial registry.
    let routers = discovery::discover(&client).context("discover client routers")?;
    let registry = ToolRegistry::build(routers).context("build tool registry")?;
    tracing::info!(tools = registry.len(), "registered tools from client surface");

    let handler = OwuiMcpServer::new(Arc::new(registry));
    let server = handler.serve(stdio()).await?;
    server.waiting().await?;
    Ok(())
}
