//! Provider registry for fanning a quote request out to every provider.
//!
//! The registry owns the registered providers and handles:
//! - Capability filtering (direction, max quoting)
//! - Circuit breaking for providers that keep timing out
//! - Serving still-fresh quotes from the cache
//! - Concurrent fetching (join-all, never first-wins)
//! - Quote validation
//! - Diagnostic tracking for debugging provider selection

use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use super::{
    AttemptResult, CircuitBreaker, FetchDiagnostics, FetchOutcome, ProviderOutcome, QuoteCache,
    QuoteValidator, SkipReason,
};
use crate::clock::{Clock, SystemClock};
use crate::config::QuoteEngineConfig;
use crate::errors::{ProviderFailure, QuoteError, RetryClass};
use crate::models::{ProviderId, Quote, QuoteRequest};
use crate::provider::{ApprovalReceipt, QuoteProvider};

/// How a provider's slot was filled.
enum Attempt {
    Cached(Vec<Quote>),
    Called(Result<Vec<Quote>, QuoteError>),
    /// Not called at all; the error stands in for its answer.
    Blocked(QuoteError),
}

/// Provider registry for orchestrating quote fetching.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn QuoteProvider>>,
    config: QuoteEngineConfig,
    circuit_breaker: CircuitBreaker,
    validator: QuoteValidator,
    cache: QuoteCache,
    clock: Arc<dyn Clock>,
}

impl ProviderRegistry {
    /// Create a registry using the system clock.
    pub fn new(providers: Vec<Arc<dyn QuoteProvider>>, config: QuoteEngineConfig) -> Self {
        Self::with_clock(providers, config, Arc::new(SystemClock))
    }

    /// Create a registry with an explicit clock for expiration checks.
    pub fn with_clock(
        providers: Vec<Arc<dyn QuoteProvider>>,
        config: QuoteEngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            providers,
            circuit_breaker: CircuitBreaker::new(config.circuit_breaker.clone()),
            validator: QuoteValidator::new(config.fee_warning_ratio),
            cache: QuoteCache::new(),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &QuoteEngineConfig {
        &self.config
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    pub fn provider(&self, provider_id: &str) -> Option<Arc<dyn QuoteProvider>> {
        self.providers
            .iter()
            .find(|p| p.id() == provider_id)
            .map(Arc::clone)
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    /// Whether the quote's network fee is high enough to warn the user about.
    pub fn has_fee_warning(&self, quote: &Quote) -> bool {
        self.validator.has_fee_warning(quote)
    }

    /// Drop every cached quote for `request`.
    pub fn invalidate(&self, request: &QuoteRequest) {
        self.cache.invalidate(&request.cache_key(&self.provider_ids()));
    }

    /// Fetch quotes for `request` from every eligible provider.
    ///
    /// 1. Filter by capability and circuit breaker (recorded as skips)
    /// 2. Serve providers whose cached quotes are all unexpired
    /// 3. Call the rest concurrently and wait for every one of them
    /// 4. Validate returned quotes, update circuit breaker and cache
    ///
    /// Provider failures are collected, never propagated: one provider
    /// failing doesn't affect the others.
    pub async fn fetch_all(&self, request: &QuoteRequest) -> FetchOutcome {
        let mut diagnostics = FetchDiagnostics::new();
        let cache_key = request.cache_key(&self.provider_ids());
        let now = self.clock.now();

        let mut eligible = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let provider_id = provider.id();
            let capabilities = provider.capabilities();

            if !capabilities.supports(request) {
                let reason = if capabilities.supports_direction(request.direction) {
                    SkipReason::MaxUnsupported
                } else {
                    SkipReason::DirectionUnsupported(request.direction)
                };
                debug!("Skipping '{}': {:?}", provider_id, reason);
                diagnostics.record_skip(provider_id, reason);
                continue;
            }
            if !self.circuit_breaker.is_allowed(&provider_id) {
                debug!("Skipping '{}': circuit open", provider_id);
                diagnostics.record_skip(provider_id.clone(), SkipReason::CircuitBreakerOpen);
                let error = QuoteError::CircuitOpen {
                    provider: provider_id.to_string(),
                };
                eligible.push((provider, Some(Attempt::Blocked(error))));
                continue;
            }

            let cached = if self.config.cache_enabled {
                self.cache.get_fresh(&cache_key, &provider_id, now).map(Attempt::Cached)
            } else {
                None
            };
            eligible.push((provider, cached));
        }

        if eligible.iter().all(|(_, a)| matches!(a, Some(Attempt::Blocked(_)))) {
            warn!("No providers available for {} request", request.direction);
        }

        let attempts = join_all(eligible.into_iter().map(|(provider, cached)| async move {
            let attempt = match cached {
                Some(attempt) => attempt,
                None => Attempt::Called(self.call_provider(provider.as_ref(), request).await),
            };
            (provider, attempt)
        }))
        .await;

        let mut outcomes = Vec::with_capacity(attempts.len());
        for (provider, attempt) in attempts {
            let provider_id = provider.id();
            match attempt {
                Attempt::Cached(quotes) => {
                    diagnostics.record(provider_id.clone(), AttemptResult::Cached { quotes: quotes.len() });
                    outcomes.push(ProviderOutcome::Quotes { provider_id, quotes });
                }
                Attempt::Called(Ok(quotes)) => {
                    self.circuit_breaker.record_success(&provider_id);

                    let (valid, rejected) =
                        self.validator
                            .validate_batch(quotes, &provider_id, request, self.clock.now());
                    for (quote, error) in &rejected {
                        warn!("Dropping quote {} from '{}': {}", quote.id, provider_id, error);
                        if let Err(e) = provider.close_quote(quote).await {
                            warn!("Failed to close rejected quote {}: {}", quote.id, e);
                        }
                    }

                    if self.config.cache_enabled {
                        self.cache.store(&cache_key, &provider_id, &valid);
                    }

                    diagnostics.record(
                        provider_id.clone(),
                        AttemptResult::Fetched {
                            quotes: valid.len(),
                            rejected: rejected.len(),
                        },
                    );
                    outcomes.push(ProviderOutcome::Quotes {
                        provider_id,
                        quotes: valid,
                    });
                }
                Attempt::Blocked(error) => {
                    outcomes.push(ProviderOutcome::Failed(ProviderFailure::new(
                        provider_id,
                        provider.display_name(),
                        error,
                    )));
                }
                Attempt::Called(Err(error)) => {
                    match error.retry_class() {
                        RetryClass::FailoverWithPenalty => {
                            self.circuit_breaker.record_failure(&provider_id)
                        }
                        // The provider answered; a refusal is not an outage.
                        RetryClass::Never => self.circuit_breaker.record_success(&provider_id),
                        RetryClass::NextProvider | RetryClass::CircuitOpen => {}
                    }

                    warn!("Provider '{}' failed: {}", provider_id, error);
                    diagnostics.record(provider_id.clone(), AttemptResult::Failed(error.to_string()));
                    outcomes.push(ProviderOutcome::Failed(ProviderFailure::new(
                        provider_id,
                        provider.display_name(),
                        error,
                    )));
                }
            }
        }

        info!("Fetch cycle: {}", diagnostics.summary());
        FetchOutcome {
            outcomes,
            diagnostics,
        }
    }

    /// Like [`fetch_all`](Self::fetch_all), abandoned as soon as `cancel` fires.
    ///
    /// In-flight provider calls are dropped and their results discarded.
    pub async fn fetch_all_cancellable(
        &self,
        request: &QuoteRequest,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, QuoteError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Fetch cycle cancelled");
                Err(QuoteError::Cancelled)
            }
            outcome = self.fetch_all(request) => Ok(outcome),
        }
    }

    /// Approve `quote` with the provider that issued it.
    pub async fn approve(&self, quote: &Quote) -> Result<ApprovalReceipt, QuoteError> {
        let provider = self
            .provider(&quote.provider_id)
            .ok_or(QuoteError::NoProvidersAvailable)?;
        provider.approve_quote(quote).await
    }

    /// Release `quote` with the provider that issued it. A closed quote is
    /// never served from the cache again.
    pub async fn close(&self, quote: &Quote) -> Result<(), QuoteError> {
        self.cache.evict_quote(&quote.id);
        match self.provider(&quote.provider_id) {
            Some(provider) => provider.close_quote(quote).await,
            None => Ok(()),
        }
    }

    async fn call_provider(
        &self,
        provider: &dyn QuoteProvider,
        request: &QuoteRequest,
    ) -> Result<Vec<Quote>, QuoteError> {
        match self.config.provider_timeout() {
            Some(limit) => tokio::time::timeout(limit, provider.fetch_quotes(request))
                .await
                .unwrap_or_else(|_| {
                    Err(QuoteError::Timeout {
                        provider: provider.id().to_string(),
                    })
                }),
            None => provider.fetch_quotes(request).await,
        }
    }
}
