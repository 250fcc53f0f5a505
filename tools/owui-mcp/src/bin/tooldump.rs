use anyhow::{Context, Result};
use clap::Parser;
use owui_client::OpenWebUi;
use owui_mcp::{
    app::{discovery, registry::ToolRegistry},
    infra::config::AppConfig,
};

/// Print the tool registry that would be served for the configured client,
/// without starting the protocol loop.
#[derive(Parser, Debug)]
#[command(author, version, about = "Dump the discovered Open WebUI tool registry as JSON.")]
struct Args {
    /// Override the API base URL from config/environment
    #[arg(long)]
    api_url: Option<String>,

    /// Override the API key
    #[arg(long)]
    api_key: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load()?;
    if let Some(url) = args.api_url {
        config.api_url = Some(url);
    }
    if let Some(key) = args.api_key {
        config.api_key = Some(key);
    }

    let client =
        OpenWebUi::new(config.client_config()).context("construct Open WebUI client")?;
    let routers = discovery::discover(&client)?;
    let registry = ToolRegistry::build(routers)?;

    let tools = registry.list();
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&tools)?
    } else {
        serde_json::to_string(&tools)?
    };
    println!("{rendered}");
    Ok(())
}
