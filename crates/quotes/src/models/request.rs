use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::ProviderId;

/// Which way value flows through the conversion.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Fiat to crypto.
    Buy,
    /// Crypto to fiat.
    Sell,
    /// Crypto to crypto.
    Swap,
}

impl Direction {
    pub fn is_ramp(&self) -> bool {
        matches!(self, Self::Buy | Self::Sell)
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
            Self::Swap => write!(f, "swap"),
        }
    }
}

/// Which side of the conversion the requested amount is denominated in.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteFor {
    /// Amount is what the user pays.
    From,
    /// Amount is what the user receives.
    To,
    /// Quote the largest amount the provider will accept; `amount` is ignored.
    Max,
}

/// Region the user is quoting from.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Region {
    /// ISO 3166-1 alpha-2 country code.
    pub country_code: String,

    /// State or province, where providers care about it (US states, CA provinces).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_province_code: Option<String>,
}

/// One side of the conversion: a wallet and the asset inside it.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AssetRef {
    pub wallet_id: String,
    pub currency_code: String,

    /// Token identifier for non-native assets; `None` for the chain's native asset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
}

impl AssetRef {
    pub fn new(wallet_id: impl Into<String>, currency_code: impl Into<String>) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            currency_code: currency_code.into(),
            token_id: None,
        }
    }

    pub fn with_token(mut self, token_id: impl Into<String>) -> Self {
        self.token_id = Some(token_id.into());
        self
    }
}

/// Request descriptor handed to every provider in a fetch cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub from: AssetRef,
    pub to: AssetRef,
    pub amount: Decimal,
    pub quote_for: QuoteFor,
    pub direction: Direction,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,

    /// Fiat side of a ramp request (e.g. "iso:USD").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiat_currency_code: Option<String>,
}

impl QuoteRequest {
    /// A crypto-to-crypto swap request.
    pub fn swap(from: AssetRef, to: AssetRef, amount: Decimal, quote_for: QuoteFor) -> Self {
        Self {
            from,
            to,
            amount,
            quote_for,
            direction: Direction::Swap,
            region: None,
            fiat_currency_code: None,
        }
    }

    /// A fiat ramp request. `crypto` is the wallet receiving (buy) or
    /// sending (sell) the crypto side.
    pub fn ramp(
        direction: Direction,
        crypto: AssetRef,
        fiat_currency_code: impl Into<String>,
        amount: Decimal,
        quote_for: QuoteFor,
        region: Region,
    ) -> Self {
        let fiat_currency_code = fiat_currency_code.into();
        let fiat = AssetRef::new("", fiat_currency_code.clone());
        let (from, to) = match direction {
            Direction::Sell => (crypto, fiat),
            _ => (fiat, crypto),
        };
        Self {
            from,
            to,
            amount,
            quote_for,
            direction,
            region: Some(region),
            fiat_currency_code: Some(fiat_currency_code),
        }
    }

    pub fn is_max(&self) -> bool {
        self.quote_for == QuoteFor::Max
    }

    /// Stable cache key: the serialized request plus the sorted set of
    /// provider ids taking part in the fetch.
    pub fn cache_key(&self, provider_ids: &[ProviderId]) -> String {
        let mut ids: Vec<&str> = provider_ids.iter().map(|id| id.as_ref()).collect();
        ids.sort_unstable();
        ids.dedup();

        // Struct field order is fixed, so the JSON form is stable.
        let request = serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self));
        format!("{}|{}", request, ids.join(","))
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use rust_decimal_macros::dec;

    use super::*;

    fn btc_to_eth() -> QuoteRequest {
        QuoteRequest::swap(
            AssetRef::new("wallet-btc", "BTC"),
            AssetRef::new("wallet-eth", "ETH"),
            dec!(0.5),
            QuoteFor::From,
        )
    }

    #[test]
    fn test_cache_key_ignores_provider_order_and_duplicates() {
        let request = btc_to_eth();
        let a = request.cache_key(&[Cow::Borrowed("lifi"), Cow::Borrowed("changenow")]);
        let b = request.cache_key(&[
            Cow::Borrowed("changenow"),
            Cow::Borrowed("lifi"),
            Cow::Borrowed("lifi"),
        ]);
        assert_eq!(a, b);
        assert!(a.ends_with("|changenow,lifi"));
    }

    #[test]
    fn test_cache_key_changes_with_request() {
        let ids = [Cow::Borrowed("lifi")];
        let mut other = btc_to_eth();
        other.amount = dec!(0.6);
        assert_ne!(btc_to_eth().cache_key(&ids), other.cache_key(&ids));
    }

    #[test]
    fn test_ramp_request_sides() {
        let region = Region {
            country_code: "US".to_string(),
            state_province_code: Some("NY".to_string()),
        };
        let buy = QuoteRequest::ramp(
            Direction::Buy,
            AssetRef::new("wallet-btc", "BTC"),
            "iso:USD",
            dec!(100),
            QuoteFor::From,
            region.clone(),
        );
        assert_eq!(buy.from.currency_code, "iso:USD");
        assert_eq!(buy.to.currency_code, "BTC");

        let sell = QuoteRequest::ramp(
            Direction::Sell,
            AssetRef::new("wallet-btc", "BTC"),
            "iso:USD",
            dec!(0.01),
            QuoteFor::From,
            region,
        );
        assert_eq!(sell.from.currency_code, "BTC");
        assert_eq!(sell.to.currency_code, "iso:USD");
        assert!(sell.direction.is_ramp());
    }

    #[test]
    fn test_direction_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Direction::Sell).unwrap(), "\"sell\"");
        assert_eq!(
            serde_json::from_str::<QuoteFor>("\"max\"").unwrap(),
            QuoteFor::Max
        );
    }
}
