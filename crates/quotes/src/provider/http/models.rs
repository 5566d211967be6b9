//! Wire types for the HTTP quote provider.
//!
//! Amounts travel as decimal strings and are parsed with
//! [`parse_amount`](crate::models::parse_amount); never through floats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::QuoteError;
use crate::models::{
    parse_amount, Direction, NetworkFee, ProviderId, Quote, QuoteFor, QuoteRequest, RampDetails,
    SettlementRange,
};

/// Body of `POST {endpoint}/quotes`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuoteRequestBody<'a> {
    pub direction: Direction,
    pub from_currency_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_token_id: Option<&'a str>,
    pub to_currency_code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_token_id: Option<&'a str>,
    /// Empty for max requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    pub amount_side: QuoteFor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_province_code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiat_currency_code: Option<&'a str>,
}

impl<'a> From<&'a QuoteRequest> for QuoteRequestBody<'a> {
    fn from(request: &'a QuoteRequest) -> Self {
        Self {
            direction: request.direction,
            from_currency_code: &request.from.currency_code,
            from_token_id: request.from.token_id.as_deref(),
            to_currency_code: &request.to.currency_code,
            to_token_id: request.to.token_id.as_deref(),
            amount: (!request.is_max()).then(|| request.amount.to_string()),
            amount_side: request.quote_for,
            country_code: request.region.as_ref().map(|r| r.country_code.as_str()),
            state_province_code: request
                .region
                .as_ref()
                .and_then(|r| r.state_province_code.as_deref()),
            fiat_currency_code: request.fiat_currency_code.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuotesResponse {
    #[serde(default)]
    pub quotes: Vec<WireQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireFee {
    pub currency_code: String,
    pub native_amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireQuote {
    /// Provider-side reference used for approve/close.
    pub quote_id: String,
    pub from_amount: String,
    pub to_amount: String,
    pub is_estimate: bool,
    #[serde(default)]
    pub is_dex: Option<bool>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub network_fee: Option<WireFee>,
    #[serde(default)]
    pub payment_type: Option<String>,
    /// `[min, max]` minutes until settlement.
    #[serde(default)]
    pub settlement_minutes: Option<[u32; 2]>,
}

impl WireQuote {
    /// Convert into an engine quote, returning it with the provider-side reference.
    pub fn into_quote(
        self,
        provider_id: &ProviderId,
        display_name: &str,
        request: &QuoteRequest,
    ) -> Result<(Quote, String), QuoteError> {
        let mut quote = Quote::new(
            provider_id.clone(),
            display_name,
            request.direction,
            parse_amount(&self.from_amount)?,
            parse_amount(&self.to_amount)?,
        );
        quote.is_estimate = self.is_estimate;
        quote.is_dex = self.is_dex.unwrap_or(false);
        quote.expiration_date = self.expires_at;

        if let Some(fee) = self.network_fee {
            quote.network_fee = Some(NetworkFee::new(
                fee.currency_code,
                parse_amount(&fee.native_amount)?,
            ));
        }

        if request.direction.is_ramp() {
            quote.ramp = Some(RampDetails {
                payment_type: self.payment_type.unwrap_or_default(),
                fiat_currency_code: request.fiat_currency_code.clone().unwrap_or_default(),
                settlement_range: self.settlement_minutes.map(|[min, max]| SettlementRange {
                    min_minutes: min,
                    max_minutes: max,
                }),
            });
        }

        Ok((quote, self.quote_id))
    }
}

/// Body returned by `POST {endpoint}/quotes/{id}/approve`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApprovalResponse {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
}
