//! Claim CLI
//!
//! Runs the claim wizard in the terminal against a simulated claim provider.

mod wizard;

use anyhow::{Context, Result};
use clap::Parser;
use claim_wizard::{
    load_dotenv, spawn_claimed_watcher, Address, ClaimError, ClaimWizard, InMemoryClaimProvider,
    TokenAmount, WizardConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "claim")]
#[command(about = "Claim your token allocation and delegate its voting power")]
struct Args {
    /// Claimable amount, in whole tokens
    #[arg(long, default_value = "100", env = "CLAIM_SIMULATED_AMOUNT")]
    claimable: u128,

    /// Start as an account that has already claimed
    #[arg(long)]
    already_claimed: bool,

    /// Fail the first claim transaction as if the wallet rejected it
    #[arg(long)]
    fail_first: bool,

    /// Delegate that already holds more votes than the warning threshold
    #[arg(long)]
    heavy_delegate: Option<String>,

    /// Chain id the wallet is connected to
    #[arg(long, default_value = "1", env = "CLAIM_CONNECTED_CHAIN_ID")]
    chain_id: u64,

    /// Simulated wallet confirmation delay in milliseconds
    #[arg(long, default_value = "1500")]
    latency_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = load_dotenv()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = &env_file {
        info!("Loaded environment from {}", path.display());
    }

    let args = Args::parse();
    let config = WizardConfig::from_env().context("Invalid claim configuration")?;

    let provider = InMemoryClaimProvider::new(TokenAmount::from_tokens(args.claimable))
        .with_many_votes_threshold(config.many_votes_threshold)
        .with_latency(Duration::from_millis(args.latency_ms))
        .with_mark_claimed_on_success(true);

    if let Some(raw) = &args.heavy_delegate {
        let address: Address = raw
            .parse()
            .with_context(|| format!("Invalid --heavy-delegate address: {}", raw))?;
        let weight = TokenAmount::from_base_units(
            config
                .many_votes_threshold
                .base_units()
                .saturating_mul(2),
        );
        provider.set_vote_weight(address, weight);
    }
    if args.fail_first {
        provider.push_failure(ClaimError::Rejected(
            "User denied transaction signature".to_string(),
        ));
    }
    if args.already_claimed {
        provider.set_already_claimed(true);
    }

    info!("Starting claim wizard on chain {}", args.chain_id);

    let wizard = ClaimWizard::new(Arc::new(provider), config);
    let watcher = spawn_claimed_watcher(wizard.clone());

    let result = wizard::run_claim_wizard(&wizard, args.chain_id).await;

    watcher.shutdown();
    result
}
