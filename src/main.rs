//! PricePull CLI entry point.
//!
//! Usage: `pricepull equity:AAPL fx:EUR cfd:XAU:USD`
//! (asset ids may also be passed as one comma-separated argument)

use anyhow::{bail, Context, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use pricepull::config::PullConfig;
use pricepull::network::GatewayClient;
use pricepull::orchestrator::Orchestrator;
use pricepull::types::AssetId;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = PullConfig::load()?;
    tracing::info!(config = %config.digest(), "configuration loaded");

    let assets = parse_assets(std::env::args().skip(1))?;
    if assets.is_empty() {
        bail!("usage: pricepull <asset-id> [asset-id ...] (e.g. equity:AAPL fx:EUR)");
    }

    let client =
        GatewayClient::new(&config.network.rpc_url).context("failed to build gateway client")?;
    let orchestrator = Orchestrator::new(Arc::new(client), config);

    let report = orchestrator.pull_prices(assets).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn parse_assets(args: impl Iterator<Item = String>) -> Result<Vec<AssetId>> {
    let mut assets = Vec::new();
    for arg in args {
        for token in arg.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            assets.push(AssetId::parse(token).with_context(|| format!("bad asset '{}'", token))?);
        }
    }
    Ok(assets)
}
