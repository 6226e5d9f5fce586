use std::env;
use std::sync::Arc;

use anyhow::Context;
use wave_portal::{
    HttpWalletProvider, LogNotifier, PortalConfig, SubmitOutcome, WalletProvider, WaveBody, WavePortal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger (set RUST_LOG=debug for verbose output, RUST_LOG=info for normal)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    dotenv::dotenv().ok();

    // Node with unlocked accounts standing in for the browser wallet
    let wallet_url = env::var("WAVE_PORTAL_WALLET_URL").unwrap_or_else(|_| "http://localhost:8545".to_string());
    let message = env::args().nth(1);

    let config = PortalConfig::from_build_env();
    log::info!(
        "Wave portal for contract {} on chain {}, wallet at {}",
        config.contract_address,
        config.network.chain_id,
        wallet_url
    );

    let provider: Arc<dyn WalletProvider> = Arc::new(HttpWalletProvider::new(wallet_url));
    let portal = WavePortal::new(Some(provider), Arc::new(LogNotifier), config);

    portal.mount().await;
    if portal.account().is_none() {
        portal.connect().await.context("Failed to connect wallet")?;
    }

    print_feed(&portal);

    if let Some(message) = message {
        portal.set_message(message);
        match portal.wave().await.context("Wave failed")? {
            SubmitOutcome::Confirmed(tx_hash) => println!("Waved in {}", tx_hash),
            SubmitOutcome::Ignored => println!("A wave is already in flight"),
        }
        println!("📮 Received {} waves", portal.total_waves());
    }

    portal.unmount();
    Ok(())
}

fn print_feed(portal: &WavePortal) {
    if let Some(total) = portal.totals().get() {
        println!("📮 Received {} waves", total);
    }

    for wave in portal.waves() {
        println!("From: {}", wave.address);
        println!("{}", wave.formatted_timestamp());
        match wave.body() {
            WaveBody::Wave => println!("👋"),
            WaveBody::Text(text) => println!("{}", text),
        }
        println!();
    }
}
