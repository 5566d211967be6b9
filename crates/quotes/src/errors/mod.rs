//! Error types and retry classification for the quote engine.
//!
//! This module provides:
//! - [`QuoteError`]: The main error enum for all quote operations
//! - [`RetryClass`]: Classification for circuit breaker bookkeeping
//! - [`ProviderFailure`]: A [`QuoteError`] tagged with the provider that raised it

mod retry;

pub use retry::RetryClass;

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{ProviderId, QuoteId};

/// Errors that can occur during quote operations.
///
/// Provider-side variants carry the id of the provider that raised them so
/// they stay attributable after aggregation.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// An amount could not be parsed as a non-negative decimal string.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The requested amount is below the provider's minimum.
    #[error("Below limit: {provider} requires at least {limit} {currency_code}")]
    UnderLimit {
        provider: String,
        limit: Decimal,
        currency_code: String,
    },

    /// The requested amount is above the provider's maximum.
    #[error("Above limit: {provider} allows at most {limit} {currency_code}")]
    OverLimit {
        provider: String,
        limit: Decimal,
        currency_code: String,
    },

    /// The provider does not operate in the requested region.
    #[error("Region restricted: {provider}")]
    RegionRestricted { provider: String },

    /// The provider does not trade one of the requested assets.
    #[error("Asset unsupported: {provider}")]
    AssetUnsupported { provider: String },

    /// The provider offers no payment method for this request.
    #[error("Payment method unsupported: {provider}")]
    PaymentUnsupported { provider: String },

    /// The provider does not accept the requested fiat currency.
    #[error("Fiat currency unsupported: {provider} - {fiat_currency_code}")]
    FiatUnsupported {
        provider: String,
        fiat_currency_code: String,
    },

    /// The provider cannot quote in the requested mode (by source, by destination, max).
    #[error("Amount type unsupported: {provider}")]
    AmountTypeUnsupported { provider: String },

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited { provider: String },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout { provider: String },

    /// A provider-specific error occurred.
    #[error("Provider error: {provider} - {message}")]
    ProviderError { provider: String, message: String },

    /// The provider returned quotes that failed validation.
    #[error("Validation failed: {provider} - {message}")]
    ValidationFailed { provider: String, message: String },

    /// The circuit breaker is open for this provider.
    #[error("Circuit open: {provider}")]
    CircuitOpen { provider: String },

    /// No registered provider can serve the request.
    #[error("No providers available")]
    NoProvidersAvailable,

    /// The quote passed its expiration date. A fresh fetch is required.
    #[error("Quote expired: {quote_id}")]
    QuoteExpired { quote_id: QuoteId },

    /// No quote with this id is tracked by the session.
    #[error("Quote not found: {0}")]
    QuoteNotFound(QuoteId),

    /// The quote was already approved and can't be approved or selected again.
    #[error("Quote already approved: {0}")]
    QuoteAlreadyApproved(QuoteId),

    /// Approval was requested with nothing selected.
    #[error("No quote selected")]
    NoQuoteSelected,

    /// Submitting the selected quote for execution failed.
    #[error("Approval failed: {provider} - {message}")]
    ApprovalFailed { provider: String, message: String },

    /// The fetch was abandoned because the session was dismissed.
    #[error("Cancelled")]
    Cancelled,

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QuoteError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use swapdesk_quotes::errors::{QuoteError, RetryClass};
    ///
    /// let error = QuoteError::RateLimited { provider: "changenow".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::FailoverWithPenalty);
    ///
    /// let error = QuoteError::RegionRestricted { provider: "moonpay".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::InvalidAmount(_)
            | Self::UnderLimit { .. }
            | Self::OverLimit { .. }
            | Self::RegionRestricted { .. }
            | Self::AssetUnsupported { .. }
            | Self::PaymentUnsupported { .. }
            | Self::FiatUnsupported { .. }
            | Self::AmountTypeUnsupported { .. } => RetryClass::Never,

            Self::RateLimited { .. } | Self::Timeout { .. } | Self::Network(_) => {
                RetryClass::FailoverWithPenalty
            }

            Self::ProviderError { .. } | Self::ValidationFailed { .. } | Self::Serialization(_) => {
                RetryClass::NextProvider
            }

            Self::CircuitOpen { .. } => RetryClass::CircuitOpen,

            Self::NoProvidersAvailable
            | Self::QuoteExpired { .. }
            | Self::QuoteNotFound(_)
            | Self::QuoteAlreadyApproved(_)
            | Self::NoQuoteSelected
            | Self::ApprovalFailed { .. }
            | Self::Cancelled => RetryClass::Never,
        }
    }

    /// Whether this error describes a provider limit or restriction the
    /// user can act on (change amount, region, asset or payment method).
    pub fn is_provider_limit(&self) -> bool {
        matches!(
            self,
            Self::UnderLimit { .. }
                | Self::OverLimit { .. }
                | Self::RegionRestricted { .. }
                | Self::AssetUnsupported { .. }
                | Self::PaymentUnsupported { .. }
                | Self::FiatUnsupported { .. }
                | Self::AmountTypeUnsupported { .. }
        )
    }

    /// Display precedence when every provider failed. Lower is shown first.
    pub(crate) fn display_rank(&self) -> u8 {
        match self {
            Self::UnderLimit { .. } => 0,
            Self::OverLimit { .. } => 1,
            Self::RegionRestricted { .. } => 2,
            Self::AssetUnsupported { .. }
            | Self::PaymentUnsupported { .. }
            | Self::FiatUnsupported { .. }
            | Self::AmountTypeUnsupported { .. } => 3,
            _ => 4,
        }
    }
}

/// A provider error tagged with the provider that raised it.
#[derive(Debug)]
pub struct ProviderFailure {
    pub provider_id: ProviderId,
    pub display_name: String,
    pub error: QuoteError,
}

impl ProviderFailure {
    pub fn new(provider_id: ProviderId, display_name: impl Into<String>, error: QuoteError) -> Self {
        Self {
            provider_id,
            display_name: display_name.into(),
            error,
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.display_name, self.provider_id, self.error)
    }
}

/// Picks the failure most worth showing when no provider returned a quote.
///
/// Minimum-amount errors win (lowest minimum first), then maximum-amount
/// errors (highest maximum first), then region restrictions, then
/// unsupported asset/payment/fiat, then anything else in arrival order.
pub fn best_failure<'a>(
    failures: impl IntoIterator<Item = &'a ProviderFailure>,
) -> Option<&'a ProviderFailure> {
    failures.into_iter().reduce(|best, candidate| {
        let (best_rank, candidate_rank) = (best.error.display_rank(), candidate.error.display_rank());
        if candidate_rank != best_rank {
            return if candidate_rank < best_rank { candidate } else { best };
        }
        match (&best.error, &candidate.error) {
            (QuoteError::UnderLimit { limit: a, .. }, QuoteError::UnderLimit { limit: b, .. })
                if b < a =>
            {
                candidate
            }
            (QuoteError::OverLimit { limit: a, .. }, QuoteError::OverLimit { limit: b, .. })
                if b > a =>
            {
                candidate
            }
            _ => best,
        }
    })
}
