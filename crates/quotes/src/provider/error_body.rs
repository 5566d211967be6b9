//! Structured provider errors as they appear on the wire and in fixtures.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::QuoteError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorType {
    OverLimit,
    UnderLimit,
    RegionRestricted,
    AssetUnsupported,
    PaymentUnsupported,
    FiatUnsupported,
    AmountTypeUnsupported,
    RateLimited,
    Timeout,
    #[serde(other)]
    Other,
}

/// `{"errorType": "underLimit", "errorAmount": "30", "displayCurrencyCode": "USD"}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderErrorBody {
    pub error_type: ErrorType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// The limit that was crossed, for `overLimit`/`underLimit`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_amount: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_currency_code: Option<String>,
}

impl ProviderErrorBody {
    pub fn new(error_type: ErrorType) -> Self {
        Self {
            error_type,
            message: None,
            error_amount: None,
            display_currency_code: None,
        }
    }

    pub fn limit(error_type: ErrorType, amount: Decimal, currency_code: impl Into<String>) -> Self {
        Self {
            error_type,
            message: None,
            error_amount: Some(amount),
            display_currency_code: Some(currency_code.into()),
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Convert into a [`QuoteError`] attributed to `provider`.
    ///
    /// `fiat_currency_code` fills in `fiatUnsupported` errors that don't name
    /// the currency themselves.
    pub fn into_error(self, provider: &str, fiat_currency_code: Option<&str>) -> QuoteError {
        let provider = provider.to_string();
        let currency_code = self.display_currency_code.clone().unwrap_or_default();
        match self.error_type {
            ErrorType::OverLimit => QuoteError::OverLimit {
                provider,
                limit: self.error_amount.unwrap_or_default(),
                currency_code,
            },
            ErrorType::UnderLimit => QuoteError::UnderLimit {
                provider,
                limit: self.error_amount.unwrap_or_default(),
                currency_code,
            },
            ErrorType::RegionRestricted => QuoteError::RegionRestricted { provider },
            ErrorType::AssetUnsupported => QuoteError::AssetUnsupported { provider },
            ErrorType::PaymentUnsupported => QuoteError::PaymentUnsupported { provider },
            ErrorType::FiatUnsupported => QuoteError::FiatUnsupported {
                provider,
                fiat_currency_code: self
                    .display_currency_code
                    .or_else(|| fiat_currency_code.map(str::to_string))
                    .unwrap_or_default(),
            },
            ErrorType::AmountTypeUnsupported => QuoteError::AmountTypeUnsupported { provider },
            ErrorType::RateLimited => QuoteError::RateLimited { provider },
            ErrorType::Timeout => QuoteError::Timeout { provider },
            ErrorType::Other => QuoteError::ProviderError {
                provider,
                message: self.message.unwrap_or_else(|| "unknown error".to_string()),
            },
        }
    }
}
