use std::path::PathBuf;

use anyhow::{anyhow, Context};
use rust_decimal::Decimal;
use swapdesk_quotes::models::parse_amount;
use swapdesk_quotes::{AssetRef, Direction, QuoteFor, QuoteRequest, Region};

pub struct Config {
    pub fixtures_path: Option<PathBuf>,
    /// `id=endpoint` pairs for HTTP providers, comma separated.
    pub http_providers: Vec<(String, String)>,
    pub api_key: Option<String>,
    pub direction: Direction,
    pub quote_for: QuoteFor,
    pub amount: Decimal,
    pub from_currency: String,
    pub to_currency: String,
    pub fiat_currency: String,
    pub country_code: String,
    pub state_province_code: Option<String>,
    pub provider_timeout_ms: Option<u64>,
    pub approve: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let fixtures_path = std::env::var("SWAPDESK_FIXTURES").ok().map(PathBuf::from);
        let http_providers = std::env::var("SWAPDESK_HTTP_PROVIDERS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|entry| {
                entry
                    .split_once('=')
                    .map(|(id, url)| (id.trim().to_string(), url.trim().to_string()))
                    .ok_or_else(|| anyhow!("Invalid SWAPDESK_HTTP_PROVIDERS entry '{entry}'"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let direction = match std::env::var("SWAPDESK_DIRECTION")
            .unwrap_or_else(|_| "swap".into())
            .to_lowercase()
            .as_str()
        {
            "buy" => Direction::Buy,
            "sell" => Direction::Sell,
            "swap" => Direction::Swap,
            other => return Err(anyhow!("Invalid SWAPDESK_DIRECTION '{other}'")),
        };
        let quote_for = match std::env::var("SWAPDESK_QUOTE_FOR")
            .unwrap_or_else(|_| "from".into())
            .to_lowercase()
            .as_str()
        {
            "from" => QuoteFor::From,
            "to" => QuoteFor::To,
            "max" => QuoteFor::Max,
            other => return Err(anyhow!("Invalid SWAPDESK_QUOTE_FOR '{other}'")),
        };

        let amount = std::env::var("SWAPDESK_AMOUNT").unwrap_or_else(|_| "1".into());
        let amount = parse_amount(&amount).context("Invalid SWAPDESK_AMOUNT")?;

        let provider_timeout_ms = std::env::var("SWAPDESK_PROVIDER_TIMEOUT_MS")
            .ok()
            .map(|v| v.trim().parse::<u64>())
            .transpose()
            .context("Invalid SWAPDESK_PROVIDER_TIMEOUT_MS")?;

        Ok(Self {
            fixtures_path,
            http_providers,
            api_key: std::env::var("SWAPDESK_API_KEY").ok(),
            direction,
            quote_for,
            amount,
            from_currency: std::env::var("SWAPDESK_FROM").unwrap_or_else(|_| "BTC".into()),
            to_currency: std::env::var("SWAPDESK_TO").unwrap_or_else(|_| "ETH".into()),
            fiat_currency: std::env::var("SWAPDESK_FIAT").unwrap_or_else(|_| "iso:USD".into()),
            country_code: std::env::var("SWAPDESK_COUNTRY").unwrap_or_else(|_| "US".into()),
            state_province_code: std::env::var("SWAPDESK_STATE").ok(),
            provider_timeout_ms,
            approve: std::env::var("SWAPDESK_APPROVE")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }

    pub fn request(&self) -> QuoteRequest {
        if self.direction.is_ramp() {
            QuoteRequest::ramp(
                self.direction,
                AssetRef::new("probe-wallet", self.to_currency.clone()),
                self.fiat_currency.clone(),
                self.amount,
                self.quote_for,
                Region {
                    country_code: self.country_code.clone(),
                    state_province_code: self.state_province_code.clone(),
                },
            )
        } else {
            QuoteRequest::swap(
                AssetRef::new("probe-source", self.from_currency.clone()),
                AssetRef::new("probe-destination", self.to_currency.clone()),
                self.amount,
                self.quote_for,
            )
        }
    }
}
