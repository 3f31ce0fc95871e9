//! Open a position in a Drip vault, withdraw its token B and close it.
//!
//! export EXAMPLE_WALLET="[92,116,...,245,129]"
//! Run with: cargo run --bin withdraw

use drip_vault_examples::{flows, DripClient, DripConfig, Drip, Reporter, Wallet};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::var_os("DRIP_CONFIG").map(PathBuf::from);
    let config = DripConfig::load(config_path.as_deref())?;

    let wallet = Wallet::from_env(&config.wallet_env)?;
    let mut reporter = Reporter::stdout();
    reporter.connected_wallet(&wallet.pubkey())?;

    let drip = Drip::new(DripClient::new(config.clone(), wallet)?);
    let summary = flows::run_withdraw_example(&drip, &config, &mut reporter).await?;

    tracing::info!(position = %summary.deposit.position, "withdraw example finished");
    Ok(())
}
