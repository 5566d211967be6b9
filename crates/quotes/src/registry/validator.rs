//! Quote validation.
//!
//! Checks what a provider hands back before it can be ranked:
//! - amounts are non-negative
//! - the quote answers the request that was asked (direction, provider)
//! - the quote has not already expired on arrival
//! - the network fee is not out of proportion (soft warning only)

use chrono::{DateTime, Utc};
use log::warn;
use rust_decimal::Decimal;

use crate::errors::QuoteError;
use crate::models::{ProviderId, Quote, QuoteRequest, DECIMAL_PRECISION};

/// Validation severity levels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationSeverity {
    /// Reject the quote.
    Hard,
    /// Accept the quote but log a warning.
    Soft,
}

#[derive(Clone, Debug)]
pub struct ValidationIssue {
    pub severity: ValidationSeverity,
    pub message: String,
}

impl ValidationIssue {
    fn hard(message: impl Into<String>) -> Self {
        Self {
            severity: ValidationSeverity::Hard,
            message: message.into(),
        }
    }

    fn soft(message: impl Into<String>) -> Self {
        Self {
            severity: ValidationSeverity::Soft,
            message: message.into(),
        }
    }
}

pub struct QuoteValidator {
    fee_warning_ratio: Decimal,
}

impl Default for QuoteValidator {
    fn default() -> Self {
        Self::new(Decimal::new(5, 2))
    }
}

impl QuoteValidator {
    pub fn new(fee_warning_ratio: Decimal) -> Self {
        Self { fee_warning_ratio }
    }

    /// Whether the quote's network fee eats a large share of the amount paid.
    pub fn has_fee_warning(&self, quote: &Quote) -> bool {
        quote
            .fee_ratio(DECIMAL_PRECISION)
            .is_some_and(|ratio| ratio >= self.fee_warning_ratio)
    }

    /// Collect every issue with `quote` as an answer from `provider_id` to `request`.
    pub fn inspect(
        &self,
        quote: &Quote,
        provider_id: &ProviderId,
        request: &QuoteRequest,
        now: DateTime<Utc>,
    ) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if quote.from_amount.is_sign_negative() || quote.to_amount.is_sign_negative() {
            issues.push(ValidationIssue::hard(format!(
                "Negative amount: {} -> {}",
                quote.from_amount, quote.to_amount
            )));
        }

        if &quote.provider_id != provider_id {
            issues.push(ValidationIssue::hard(format!(
                "Quote attributed to '{}' but returned by '{}'",
                quote.provider_id, provider_id
            )));
        }

        if quote.direction != request.direction {
            issues.push(ValidationIssue::hard(format!(
                "Quote direction {} does not match request direction {}",
                quote.direction, request.direction
            )));
        }

        if quote.is_expired(now) {
            issues.push(ValidationIssue::hard("Quote expired on arrival"));
        }

        if self.has_fee_warning(quote) {
            issues.push(ValidationIssue::soft(format!(
                "Network fee is at least {} of the amount paid",
                self.fee_warning_ratio
            )));
        }

        issues
    }

    /// Validate a single quote; soft issues are logged, hard issues reject it.
    pub fn validate(
        &self,
        quote: &Quote,
        provider_id: &ProviderId,
        request: &QuoteRequest,
        now: DateTime<Utc>,
    ) -> Result<(), QuoteError> {
        let issues = self.inspect(quote, provider_id, request, now);

        let hard: Vec<&str> = issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Hard)
            .map(|i| i.message.as_str())
            .collect();

        if !hard.is_empty() {
            return Err(QuoteError::ValidationFailed {
                provider: provider_id.to_string(),
                message: hard.join("; "),
            });
        }

        for issue in issues.iter().filter(|i| i.severity == ValidationSeverity::Soft) {
            warn!("Quote {} from '{}': {}", quote.id, provider_id, issue.message);
        }

        Ok(())
    }

    /// Split a provider's quotes into accepted and rejected.
    pub fn validate_batch(
        &self,
        quotes: Vec<Quote>,
        provider_id: &ProviderId,
        request: &QuoteRequest,
        now: DateTime<Utc>,
    ) -> (Vec<Quote>, Vec<(Quote, QuoteError)>) {
        let mut valid = Vec::with_capacity(quotes.len());
        let mut invalid = Vec::new();

        for quote in quotes {
            match self.validate(&quote, provider_id, request, now) {
                Ok(()) => valid.push(quote),
                Err(e) => invalid.push((quote, e)),
            }
        }

        (valid, invalid)
    }
}
