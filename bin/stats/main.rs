//! Stats worker configuration check
//!
//! Resolves the stats worker configuration from the environment and prints
//! it with credentials redacted. Exits non-zero on deprecated or invalid
//! variables.

use anyhow::{Context, Result};
use clap::Parser;
use claim_wizard::{load_dotenv, StatsWorkerConfig};
use comfy_table::{presets::UTF8_FULL, Table};
use console::style;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stats-config")]
#[command(about = "Show the resolved stats worker configuration")]
struct Args {
    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let env_file = load_dotenv()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = &env_file {
        info!("Loaded environment from {}", path.display());
    }

    let args = Args::parse();

    let config = StatsWorkerConfig::from_env().context("Invalid stats worker configuration")?;
    debug!("Resolved config: {:?}", config);
    info!(
        "Loaded stats worker config: {} tokens on {} chains",
        config.enabled_tokens.len(),
        config.enabled_chains.len()
    );

    let redacted = config.redacted();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&redacted)?);
        return Ok(());
    }

    println!();
    println!("  {}", style("Stats Worker Configuration").cyan().bold());
    println!();
    print_key_value("Database", &redacted.db_path);
    print_key_value("AWS region", redacted.aws_region.as_deref().unwrap_or("-"));
    print_key_value("AWS profile", redacted.aws_profile.as_deref().unwrap_or("-"));
    print_key_value(
        "Pinata",
        if redacted.pinata_api_key.is_some() {
            "configured"
        } else {
            "not set"
        },
    );
    print_key_value(
        "CoinGecko",
        if redacted.coingecko_api_key.is_empty() {
            "not set"
        } else {
            "configured"
        },
    );
    print_key_value(
        "Tokens",
        &redacted
            .enabled_tokens
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", "),
    );
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Chain", "RPC", "Archive RPC", "Etherscan key"]);
    for chain in &redacted.enabled_chains {
        let etherscan = match redacted.etherscan_api_keys.get(chain) {
            Some(Some(_)) => "set",
            _ => "-",
        };
        table.add_row(vec![
            chain.as_str(),
            redacted.rpc_urls.get(chain).map(String::as_str).unwrap_or("-"),
            redacted
                .archive_rpc_urls
                .get(chain)
                .map(String::as_str)
                .unwrap_or("-"),
            etherscan,
        ]);
    }
    println!("{}", table);

    Ok(())
}

fn print_key_value(key: &str, value: &str) {
    println!("  {} {}", style(format!("{}:", key)).dim(), value);
}
