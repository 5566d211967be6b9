mod config;
mod main_lib;

use config::Config;
use main_lib::{build_registry, init_tracing, report};
use swapdesk_quotes::{QuoteSession, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();

    let registry = build_registry(&config)?;
    let mut session = QuoteSession::new(registry, config.request(), std::sync::Arc::new(SystemClock));

    session.refresh().await?;
    println!("{}", serde_json::to_string_pretty(&report(&session)?)?);

    if let Some(failure) = session.best_error() {
        tracing::warn!("No quotes: {}", failure);
    } else if session.is_no_offers() {
        tracing::warn!("No provider offered a quote for this request");
    }

    if config.approve && session.selected().is_some() {
        let receipt = session.approve().await?;
        tracing::info!("Approved quote {} with {}", receipt.quote_id, receipt.provider_id);
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    }

    session.dismiss().await;
    Ok(())
}
