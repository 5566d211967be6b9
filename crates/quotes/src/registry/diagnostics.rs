//! Per-provider bookkeeping for a single fetch cycle.

use crate::models::{Direction, ProviderId};

/// Why a provider was left out of a fetch cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Provider doesn't serve this direction (buy/sell/swap).
    DirectionUnsupported(Direction),

    /// Request asks for a max quote and the provider can't produce one.
    MaxUnsupported,

    /// Circuit breaker is open for this provider.
    CircuitBreakerOpen,
}

/// How a provider's slot in the fetch cycle was resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptResult {
    Skipped(SkipReason),
    /// Previous quotes were still fresh; no network call made.
    Cached { quotes: usize },
    Fetched { quotes: usize, rejected: usize },
    Failed(String),
}

#[derive(Clone, Debug)]
pub struct ProviderAttempt {
    pub provider_id: ProviderId,
    pub result: AttemptResult,
}

/// Which providers were tried, skipped, served from cache or failed.
#[derive(Clone, Debug, Default)]
pub struct FetchDiagnostics {
    pub attempts: Vec<ProviderAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, provider_id: ProviderId, result: AttemptResult) {
        self.attempts.push(ProviderAttempt {
            provider_id,
            result,
        });
    }

    pub fn record_skip(&mut self, provider_id: ProviderId, reason: SkipReason) {
        self.record(provider_id, AttemptResult::Skipped(reason));
    }

    /// One-line summary for logging.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| match &a.result {
                AttemptResult::Skipped(reason) => format!("{}: SKIPPED ({:?})", a.provider_id, reason),
                AttemptResult::Cached { quotes } => format!("{}: CACHED ({})", a.provider_id, quotes),
                AttemptResult::Fetched { quotes, rejected: 0 } => {
                    format!("{}: OK ({})", a.provider_id, quotes)
                }
                AttemptResult::Fetched { quotes, rejected } => {
                    format!("{}: OK ({}, {} rejected)", a.provider_id, quotes, rejected)
                }
                AttemptResult::Failed(err) => format!("{}: ERROR ({})", a.provider_id, err),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn skipped(&self) -> Vec<(&ProviderId, &SkipReason)> {
        self.attempts
            .iter()
            .filter_map(|a| match &a.result {
                AttemptResult::Skipped(reason) => Some((&a.provider_id, reason)),
                _ => None,
            })
            .collect()
    }

    pub fn cache_hits(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.result, AttemptResult::Cached { .. }))
            .count()
    }

    /// Number of providers actually called over the network.
    pub fn network_calls(&self) -> usize {
        self.attempts
            .iter()
            .filter(|a| matches!(a.result, AttemptResult::Fetched { .. } | AttemptResult::Failed(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    #[test]
    fn test_diagnostics_summary() {
        let mut diag = FetchDiagnostics::new();
        diag.record_skip(Cow::Borrowed("bity"), SkipReason::DirectionUnsupported(Direction::Buy));
        diag.record(Cow::Borrowed("banxa"), AttemptResult::Failed("Timeout: banxa".to_string()));
        diag.record(
            Cow::Borrowed("moonpay"),
            AttemptResult::Fetched {
                quotes: 2,
                rejected: 1,
            },
        );
        diag.record(Cow::Borrowed("paybis"), AttemptResult::Cached { quotes: 1 });

        let summary = diag.summary();
        assert!(summary.contains("bity: SKIPPED"));
        assert!(summary.contains("banxa: ERROR (Timeout: banxa)"));
        assert!(summary.contains("moonpay: OK (2, 1 rejected)"));
        assert!(summary.contains("paybis: CACHED (1)"));
        assert_eq!(diag.cache_hits(), 1);
        assert_eq!(diag.network_calls(), 2);
        assert_eq!(diag.skipped().len(), 1);
    }
}
