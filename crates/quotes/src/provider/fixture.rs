//! Scripted in-memory provider.
//!
//! Prices every request from a fixed list of rates, or fails with a scripted
//! error. Records fetches, approvals and closes so callers can check the
//! quote lifecycle. Specs deserialize from JSON, which is how the probe
//! binary loads its provider set.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::errors::QuoteError;
use crate::models::{
    div_truncated, Direction, NetworkFee, ProviderId, Quote, QuoteFor, QuoteId, QuoteRequest,
    RampDetails, DECIMAL_PRECISION,
};

use super::capabilities::ProviderCapabilities;
use super::error_body::ProviderErrorBody;
use super::traits::{ApprovalReceipt, QuoteProvider};

/// Payment type assigned to ramp quotes whose template doesn't name one.
const DEFAULT_PAYMENT_TYPE: &str = "credit";

/// One quote the fixture produces per request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuoteTemplate {
    /// Destination units per source unit.
    pub rate: Decimal,

    #[serde(default)]
    pub is_estimate: bool,

    #[serde(default)]
    pub is_dex: bool,

    /// Lifetime from the moment of fetch. `None` never expires.
    #[serde(default)]
    pub expires_in_ms: Option<i64>,

    #[serde(default)]
    pub payment_type: Option<String>,

    #[serde(default)]
    pub network_fee: Option<NetworkFee>,

    /// Source amount quoted for max requests.
    #[serde(default)]
    pub max_amount: Option<Decimal>,
}

impl QuoteTemplate {
    pub fn fixed(rate: Decimal) -> Self {
        Self {
            rate,
            is_estimate: false,
            is_dex: false,
            expires_in_ms: None,
            payment_type: None,
            network_fee: None,
            max_amount: None,
        }
    }

    pub fn estimate(mut self) -> Self {
        self.is_estimate = true;
        self
    }

    pub fn dex(mut self) -> Self {
        self.is_dex = true;
        self
    }

    pub fn expires_in(mut self, millis: i64) -> Self {
        self.expires_in_ms = Some(millis);
        self
    }

    pub fn payment(mut self, payment_type: impl Into<String>) -> Self {
        self.payment_type = Some(payment_type.into());
        self
    }

    pub fn max_amount(mut self, amount: Decimal) -> Self {
        self.max_amount = Some(amount);
        self
    }
}

/// Serializable description of a fixture provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FixtureSpec {
    pub id: String,
    pub display_name: String,
    pub capabilities: ProviderCapabilities,

    #[serde(default)]
    pub quotes: Vec<QuoteTemplate>,

    /// When set, every fetch fails with this error.
    #[serde(default)]
    pub error: Option<ProviderErrorBody>,

    /// When set, every approval fails with this error.
    #[serde(default)]
    pub approve_error: Option<ProviderErrorBody>,

    /// Artificial latency per fetch.
    #[serde(default)]
    pub delay_ms: Option<u64>,

    /// Never answer a fetch.
    #[serde(default)]
    pub hang: bool,
}

impl FixtureSpec {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, capabilities: ProviderCapabilities) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            capabilities,
            quotes: Vec::new(),
            error: None,
            approve_error: None,
            delay_ms: None,
            hang: false,
        }
    }

    pub fn quote(mut self, template: QuoteTemplate) -> Self {
        self.quotes.push(template);
        self
    }

    pub fn failing(mut self, error: ProviderErrorBody) -> Self {
        self.error = Some(error);
        self
    }

    pub fn failing_approval(mut self, error: ProviderErrorBody) -> Self {
        self.approve_error = Some(error);
        self
    }

    pub fn delay(mut self, millis: u64) -> Self {
        self.delay_ms = Some(millis);
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }
}

pub struct FixtureProvider {
    id: ProviderId,
    spec: FixtureSpec,
    clock: Arc<dyn Clock>,
    fetches: AtomicUsize,
    approved: Mutex<Vec<QuoteId>>,
    closed: Mutex<Vec<QuoteId>>,
}

impl FixtureProvider {
    pub fn new(spec: FixtureSpec) -> Self {
        Self::with_clock(spec, Arc::new(SystemClock))
    }

    pub fn with_clock(spec: FixtureSpec, clock: Arc<dyn Clock>) -> Self {
        Self {
            id: ProviderId::Owned(spec.id.clone()),
            spec,
            clock,
            fetches: AtomicUsize::new(0),
            approved: Mutex::new(Vec::new()),
            closed: Mutex::new(Vec::new()),
        }
    }

    /// Number of fetches that reached this provider.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn approved_quotes(&self) -> Vec<QuoteId> {
        self.approved.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn closed_quotes(&self) -> Vec<QuoteId> {
        self.closed.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn price(&self, template: &QuoteTemplate, request: &QuoteRequest) -> Result<Quote, QuoteError> {
        let overflow = || QuoteError::ProviderError {
            provider: self.id.to_string(),
            message: "amount overflow".to_string(),
        };

        let (from_amount, to_amount) = match request.quote_for {
            QuoteFor::From => {
                let to = request.amount.checked_mul(template.rate).ok_or_else(overflow)?;
                (request.amount, to)
            }
            QuoteFor::To => {
                let from = div_truncated(request.amount, template.rate, DECIMAL_PRECISION)
                    .unwrap_or(Decimal::ZERO);
                (from, request.amount)
            }
            QuoteFor::Max => {
                let from = template.max_amount.unwrap_or(request.amount);
                let to = from.checked_mul(template.rate).ok_or_else(overflow)?;
                (from, to)
            }
        };

        let mut quote = Quote::new(
            self.id.clone(),
            self.spec.display_name.clone(),
            request.direction,
            from_amount,
            to_amount,
        );
        quote.is_estimate = template.is_estimate;
        quote.is_dex = template.is_dex;
        quote.network_fee = template.network_fee.clone();
        if let Some(ms) = template.expires_in_ms {
            quote.expiration_date = Some(self.clock.now() + ChronoDuration::milliseconds(ms));
        }
        if request.direction != Direction::Swap {
            quote.ramp = Some(RampDetails {
                payment_type: template
                    .payment_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PAYMENT_TYPE.to_string()),
                fiat_currency_code: request.fiat_currency_code.clone().unwrap_or_default(),
                settlement_range: None,
            });
        }
        Ok(quote)
    }
}

#[async_trait]
impl QuoteProvider for FixtureProvider {
    fn id(&self) -> ProviderId {
        self.id.clone()
    }

    fn display_name(&self) -> &str {
        &self.spec.display_name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        self.spec.capabilities.clone()
    }

    async fn fetch_quotes(&self, request: &QuoteRequest) -> Result<Vec<Quote>, QuoteError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        debug!("Fixture '{}' fetching {} quotes", self.id, self.spec.quotes.len());

        if self.spec.hang {
            std::future::pending::<()>().await;
        }
        if let Some(ms) = self.spec.delay_ms {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        if let Some(error) = &self.spec.error {
            return Err(error
                .clone()
                .into_error(&self.id, request.fiat_currency_code.as_deref()));
        }

        self.spec
            .quotes
            .iter()
            .map(|template| self.price(template, request))
            .collect()
    }

    async fn approve_quote(&self, quote: &Quote) -> Result<ApprovalReceipt, QuoteError> {
        if let Some(error) = &self.spec.approve_error {
            return Err(QuoteError::ApprovalFailed {
                provider: self.id.to_string(),
                message: error.clone().into_error(&self.id, None).to_string(),
            });
        }

        let mut approved = self.approved.lock().unwrap_or_else(|p| p.into_inner());
        approved.push(quote.id);
        Ok(ApprovalReceipt {
            quote_id: quote.id,
            provider_id: self.id.clone(),
            order_id: Some(format!("{}-{}", self.id, approved.len())),
            redirect_url: None,
            approved_at: self.clock.now(),
        })
    }

    async fn close_quote(&self, quote: &Quote) -> Result<(), QuoteError> {
        self.closed
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(quote.id);
        Ok(())
    }
}
