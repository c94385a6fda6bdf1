//! `prism-inventory`: Ansible dynamic inventory script for Prism Central.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use prism_core::config::ProcessEnv;
use prism_core::ClientFactory;
use prism_inventory::{InventoryConfig, InventoryEngine};
use tracing_subscriber::EnvFilter;

/// Dynamic inventory of Nutanix Prism Central VMs or hosts
#[derive(Parser, Debug)]
#[command(name = "prism-inventory", version, about, long_about = None)]
struct Args {
    /// Inventory file
    #[arg(short, long, env = "PRISM_INVENTORY_CONFIG")]
    config: PathBuf,

    /// Print the whole inventory
    #[arg(long, conflicts_with = "host")]
    list: bool,

    /// Print the variables of one host
    #[arg(long)]
    host: Option<String>,
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging();

    let config = InventoryConfig::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let transport = config
        .transport(&ProcessEnv)
        .context("resolving connection settings")?;
    let factory = ClientFactory::new(transport).context("creating API clients")?;

    let inventory = InventoryEngine::new(config)
        .build(&factory)
        .await
        .context("building inventory")?;

    let document = match args.host.as_deref() {
        Some(host) if !args.list => inventory.host_json(host),
        _ => inventory.to_json(),
    };
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
