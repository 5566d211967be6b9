//! Generic JSON-over-HTTP quote provider.
//!
//! Talks to a provider gateway exposing three routes:
//! - `POST {endpoint}/quotes` with the request, returning `{"quotes": [...]}`
//! - `POST {endpoint}/quotes/{quoteId}/approve`
//! - `DELETE {endpoint}/quotes/{quoteId}` to release a reservation
//!
//! Error responses carry a [`ProviderErrorBody`] so limit and region
//! failures arrive typed.

mod models;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use reqwest::{Client, Response, StatusCode};

use crate::errors::QuoteError;
use crate::models::{ProviderId, Quote, QuoteId, QuoteRequest};

use self::models::{ApprovalResponse, QuoteRequestBody, QuotesResponse};
use super::capabilities::ProviderCapabilities;
use super::error_body::ProviderErrorBody;
use super::traits::{ApprovalReceipt, QuoteProvider};

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpQuoteProvider {
    id: ProviderId,
    display_name: String,
    capabilities: ProviderCapabilities,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
    /// Engine quote id -> provider-side quote reference.
    references: Mutex<HashMap<QuoteId, String>>,
}

impl HttpQuoteProvider {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        capabilities: ProviderCapabilities,
        endpoint: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            id: ProviderId::Owned(id.into()),
            display_name: display_name.into(),
            capabilities,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: None,
            client,
            references: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn reference(&self, quote_id: &QuoteId) -> Option<String> {
        self.references
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(quote_id)
            .cloned()
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> QuoteError {
        if error.is_timeout() {
            QuoteError::Timeout {
                provider: self.id.to_string(),
            }
        } else {
            QuoteError::Network(error)
        }
    }

    /// Turn a non-success response into a typed error.
    async fn error_from_response(&self, response: Response, fiat_currency_code: Option<&str>) -> QuoteError {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return QuoteError::RateLimited {
                provider: self.id.to_string(),
            };
        }

        let text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ProviderErrorBody>(&text) {
            Ok(body) => body.into_error(&self.id, fiat_currency_code),
            Err(_) => QuoteError::ProviderError {
                provider: self.id.to_string(),
                message: format!("HTTP {}: {}", status, text.trim()),
            },
        }
    }
}

#[async_trait]
impl QuoteProvider for HttpQuoteProvider {
    fn id(&self) -> ProviderId {
        self.id.clone()
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        self.capabilities.clone()
    }

    async fn fetch_quotes(&self, request: &QuoteRequest) -> Result<Vec<Quote>, QuoteError> {
        let url = format!("{}/quotes", self.endpoint);
        debug!("Requesting quotes from '{}' at {}", self.id, url);

        let response = self
            .authorize(self.client.post(&url))
            .json(&QuoteRequestBody::from(request))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(self
                .error_from_response(response, request.fiat_currency_code.as_deref())
                .await);
        }

        let body: QuotesResponse = response.json().await.map_err(|e| self.transport_error(e))?;

        let mut quotes = Vec::with_capacity(body.quotes.len());
        let mut references = Vec::with_capacity(body.quotes.len());
        for wire in body.quotes {
            let (quote, reference) = wire.into_quote(&self.id, &self.display_name, request)?;
            references.push((quote.id, reference));
            quotes.push(quote);
        }

        self.references
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend(references);

        Ok(quotes)
    }

    async fn approve_quote(&self, quote: &Quote) -> Result<ApprovalReceipt, QuoteError> {
        let reference = self
            .reference(&quote.id)
            .ok_or(QuoteError::QuoteNotFound(quote.id))?;
        let url = format!("{}/quotes/{}/approve", self.endpoint, reference);

        let approval_failed = |message: String| QuoteError::ApprovalFailed {
            provider: self.id.to_string(),
            message,
        };

        let response = self
            .authorize(self.client.post(&url))
            .send()
            .await
            .map_err(|e| approval_failed(e.to_string()))?;

        if !response.status().is_success() {
            let error = self.error_from_response(response, None).await;
            return Err(approval_failed(error.to_string()));
        }

        let body: ApprovalResponse = response
            .json()
            .await
            .map_err(|e| approval_failed(e.to_string()))?;

        Ok(ApprovalReceipt {
            quote_id: quote.id,
            provider_id: self.id.clone(),
            order_id: body.order_id,
            redirect_url: body.redirect_url,
            approved_at: Utc::now(),
        })
    }

    async fn close_quote(&self, quote: &Quote) -> Result<(), QuoteError> {
        let reference = self
            .references
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&quote.id);

        let Some(reference) = reference else {
            // Nothing reserved, or already released.
            return Ok(());
        };

        let url = format!("{}/quotes/{}", self.endpoint, reference);
        let response = self
            .authorize(self.client.delete(&url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            warn!(
                "Closing quote {} at '{}' returned HTTP {}",
                quote.id,
                self.id,
                response.status()
            );
            return Err(self.error_from_response(response, None).await);
        }
        Ok(())
    }
}
