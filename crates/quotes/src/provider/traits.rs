//! Quote provider trait definitions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::QuoteError;
use crate::models::{ProviderId, Quote, QuoteId, QuoteRequest};

use super::capabilities::ProviderCapabilities;

/// What a provider hands back once a quote is accepted for execution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApprovalReceipt {
    pub quote_id: QuoteId,
    pub provider_id: ProviderId,

    /// Provider-side order or transaction reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    /// Where the user must continue the flow (ramp widgets).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,

    pub approved_at: DateTime<Utc>,
}

/// A swap or ramp provider.
///
/// Implement this trait to add a new liquidity source. Providers are
/// registered once at startup and queried concurrently on every fetch.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use swapdesk_quotes::provider::{ProviderCapabilities, QuoteProvider};
///
/// struct MyExchange;
///
/// #[async_trait]
/// impl QuoteProvider for MyExchange {
///     fn id(&self) -> ProviderId {
///         Cow::Borrowed("myexchange")
///     }
///
///     fn display_name(&self) -> &str {
///         "My Exchange"
///     }
///
///     fn capabilities(&self) -> ProviderCapabilities {
///         ProviderCapabilities::swap()
///     }
///
///     // ... implement fetch_quotes and approve_quote
/// }
/// ```
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Stable identifier, e.g. "changenow" or "moonpay".
    ///
    /// Used for attribution, logging, caching and circuit breaker tracking.
    fn id(&self) -> ProviderId;

    /// Human-readable name shown next to the provider's quotes and errors.
    fn display_name(&self) -> &str;

    fn capabilities(&self) -> ProviderCapabilities;

    /// Fetch every quote this provider offers for `request`.
    ///
    /// An empty vector means "no offer" and is not an error.
    async fn fetch_quotes(&self, request: &QuoteRequest) -> Result<Vec<Quote>, QuoteError>;

    /// Commit the quote for execution.
    async fn approve_quote(&self, quote: &Quote) -> Result<ApprovalReceipt, QuoteError>;

    /// Release any provider-side reservation (locked rates) held for `quote`.
    ///
    /// Default implementation holds nothing and does nothing.
    async fn close_quote(&self, quote: &Quote) -> Result<(), QuoteError> {
        let _ = quote;
        Ok(())
    }
}
