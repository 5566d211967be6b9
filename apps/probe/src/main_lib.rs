use std::sync::Arc;

use anyhow::Context;
use serde_json::{json, Value};
use swapdesk_quotes::{
    FixtureProvider, FixtureSpec, HttpQuoteProvider, ProviderCapabilities, ProviderRegistry,
    QuoteEngineConfig, QuoteProvider, QuoteSession,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

pub fn init_tracing() {
    let log_format = std::env::var("SWAPDESK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_fixtures(config: &Config) -> anyhow::Result<Vec<FixtureSpec>> {
    let Some(path) = &config.fixtures_path else {
        return Ok(Vec::new());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixtures from {}", path.display()))?;
    let specs: Vec<FixtureSpec> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid fixtures file {}", path.display()))?;
    tracing::info!("Loaded {} fixture providers from {}", specs.len(), path.display());
    Ok(specs)
}

pub fn build_registry(config: &Config) -> anyhow::Result<Arc<ProviderRegistry>> {
    let mut providers: Vec<Arc<dyn QuoteProvider>> = load_fixtures(config)?
        .into_iter()
        .map(|spec| Arc::new(FixtureProvider::new(spec)) as Arc<dyn QuoteProvider>)
        .collect();

    for (id, endpoint) in &config.http_providers {
        let capabilities = ProviderCapabilities {
            directions: vec![config.direction],
            supports_max: false,
        };
        let mut provider = HttpQuoteProvider::new(id.clone(), id.clone(), capabilities, endpoint.clone());
        if let Some(key) = &config.api_key {
            provider = provider.with_api_key(key.clone());
        }
        providers.push(Arc::new(provider));
    }

    if providers.is_empty() {
        anyhow::bail!("No providers configured; set SWAPDESK_FIXTURES or SWAPDESK_HTTP_PROVIDERS");
    }

    let engine_config = QuoteEngineConfig {
        provider_timeout_ms: config.provider_timeout_ms,
        ..Default::default()
    };
    Ok(Arc::new(ProviderRegistry::new(providers, engine_config)))
}

/// JSON summary of the session after a refresh.
pub fn report(session: &QuoteSession) -> anyhow::Result<Value> {
    let failures: Vec<Value> = session
        .failures()
        .iter()
        .map(|f| {
            json!({
                "providerId": f.provider_id,
                "displayName": f.display_name,
                "error": f.error.to_string(),
            })
        })
        .collect();

    let mut report = json!({
        "request": serde_json::to_value(session.request())?,
        "selected": session.selected().map(|q| q.id),
        "best": session.best().map(|q| q.id),
        "sections": serde_json::to_value(session.sections())?,
        "failures": failures,
        "noOffers": session.is_no_offers(),
        "bestError": session.best_error().map(|f| f.to_string()),
        "feeWarning": session.selected().map(|q| session.has_fee_warning(q)),
        "nextRefetchMs": session.next_refetch_delay().map(|d| d.as_millis() as u64),
        "diagnostics": session.diagnostics().summary(),
    });
    if session.request().direction.is_ramp() {
        report["paymentGroups"] = serde_json::to_value(session.payment_groups())?;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rust_decimal::Decimal;
    use swapdesk_quotes::{Direction, QuoteFor, SystemClock};

    use super::*;

    fn demo_config(direction: Direction) -> Config {
        Config {
            fixtures_path: Some(
                PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos/fixtures.json"),
            ),
            http_providers: Vec::new(),
            api_key: None,
            direction,
            quote_for: QuoteFor::From,
            amount: Decimal::new(100, 0),
            from_currency: "BTC".into(),
            to_currency: "ETH".into(),
            fiat_currency: "iso:USD".into(),
            country_code: "US".into(),
            state_province_code: None,
            provider_timeout_ms: Some(5_000),
            approve: false,
        }
    }

    #[tokio::test]
    async fn test_demo_swap_report() {
        let config = demo_config(Direction::Swap);
        let registry = build_registry(&config).unwrap();
        assert_eq!(registry.provider_ids().len(), 5);

        let mut session = QuoteSession::new(registry, config.request(), Arc::new(SystemClock));
        session.refresh().await.unwrap();
        let report = report(&session).unwrap();

        assert_eq!(report["noOffers"], json!(false));
        assert_eq!(report["failures"].as_array().unwrap().len(), 0);
        assert!(report.get("paymentGroups").is_none());
        // The DEX quote has the best rate and arrives after the fixed one.
        let best = session.best().unwrap();
        assert_eq!(best.provider_id, "lifi");
        session.dismiss().await;
    }

    #[tokio::test]
    async fn test_demo_buy_report_groups_payments() {
        let config = demo_config(Direction::Buy);
        let registry = build_registry(&config).unwrap();
        let mut session = QuoteSession::new(registry, config.request(), Arc::new(SystemClock));
        session.refresh().await.unwrap();
        let report = report(&session).unwrap();

        assert_eq!(report["failures"].as_array().unwrap().len(), 1);
        assert_eq!(report["paymentGroups"]["groups"].as_array().unwrap().len(), 2);
        session.dismiss().await;
    }

    #[test]
    fn test_no_providers_is_an_error() {
        let mut config = demo_config(Direction::Swap);
        config.fixtures_path = None;
        assert!(build_registry(&config).is_err());
    }
}
