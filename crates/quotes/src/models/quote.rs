use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::amount::div_truncated;
use super::request::Direction;
use super::types::{PaymentType, ProviderId, QuoteId};

/// Network fee charged on top of the conversion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkFee {
    pub currency_code: String,
    pub native_amount: Decimal,
}

impl NetworkFee {
    pub fn new(currency_code: impl Into<String>, native_amount: Decimal) -> Self {
        Self {
            currency_code: currency_code.into(),
            native_amount,
        }
    }
}

/// Expected time from approval to settlement, in minutes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRange {
    pub min_minutes: u32,
    pub max_minutes: u32,
}

/// Ramp-only quote details.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RampDetails {
    pub payment_type: PaymentType,
    pub fiat_currency_code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement_range: Option<SettlementRange>,
}

/// A priced, possibly time-bounded offer from a single provider.
///
/// Amounts are exact decimals. For ramp quotes the fiat side is `from` when
/// buying and `to` when selling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,

    /// Provider that produced the quote.
    pub provider_id: ProviderId,
    pub provider_display_name: String,

    pub direction: Direction,

    /// Amount the user pays.
    pub from_amount: Decimal,

    /// Amount the user receives.
    pub to_amount: Decimal,

    /// `true` when settlement may differ from the quoted amounts.
    pub is_estimate: bool,

    /// `true` when the quote was sourced from a decentralized exchange.
    #[serde(default)]
    pub is_dex: bool,

    /// `None` means the quote does not expire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_fee: Option<NetworkFee>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ramp: Option<RampDetails>,
}

impl Quote {
    /// Create a fixed-rate, non-expiring quote with minimal required fields.
    pub fn new(
        provider_id: ProviderId,
        provider_display_name: impl Into<String>,
        direction: Direction,
        from_amount: Decimal,
        to_amount: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider_id,
            provider_display_name: provider_display_name.into(),
            direction,
            from_amount,
            to_amount,
            is_estimate: false,
            is_dex: false,
            expiration_date: None,
            network_fee: None,
            ramp: None,
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

    pub fn expires_at(mut self, expiration_date: DateTime<Utc>) -> Self {
        self.expiration_date = Some(expiration_date);
        self
    }

    pub fn with_network_fee(mut self, fee: NetworkFee) -> Self {
        self.network_fee = Some(fee);
        self
    }

    pub fn with_ramp(mut self, ramp: RampDetails) -> Self {
        self.ramp = Some(ramp);
        self
    }

    /// Fiat side of a ramp quote.
    pub fn fiat_amount(&self) -> Option<Decimal> {
        match self.direction {
            Direction::Buy => Some(self.from_amount),
            Direction::Sell => Some(self.to_amount),
            Direction::Swap => None,
        }
    }

    /// Crypto side of a ramp quote.
    pub fn crypto_amount(&self) -> Option<Decimal> {
        match self.direction {
            Direction::Buy => Some(self.to_amount),
            Direction::Sell => Some(self.from_amount),
            Direction::Swap => None,
        }
    }

    /// Effective rate `to / from`, truncated to `precision` fractional digits.
    ///
    /// Higher is better in every direction. Returns `None` when the quote
    /// can't be priced: zero `from_amount`, or a ramp quote with a zero
    /// crypto amount.
    pub fn rate(&self, precision: u32) -> Option<Decimal> {
        if self.crypto_amount().is_some_and(|c| c.is_zero()) {
            return None;
        }
        div_truncated(self.to_amount, self.from_amount, precision)
    }

    /// Whether both sides carry a non-zero amount.
    pub fn has_amounts(&self) -> bool {
        !self.from_amount.is_zero() && !self.to_amount.is_zero()
    }

    /// Network fee as a fraction of the amount paid.
    pub fn fee_ratio(&self, precision: u32) -> Option<Decimal> {
        let fee = self.network_fee.as_ref()?;
        div_truncated(fee.native_amount, self.from_amount, precision)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date.is_some_and(|exp| exp <= now)
    }

    /// Remaining lifetime, negative once expired. `None` if the quote never expires.
    pub fn time_to_expiration(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expiration_date.map(|exp| exp - now)
    }

    pub fn payment_type(&self) -> Option<&str> {
        self.ramp.as_ref().map(|r| r.payment_type.as_str())
    }
}
