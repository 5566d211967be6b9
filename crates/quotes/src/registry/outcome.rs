//! Aggregated result of one fetch cycle.

use crate::errors::{best_failure, ProviderFailure};
use crate::models::{ProviderId, Quote};

use super::FetchDiagnostics;

/// What a single provider contributed to a fetch cycle.
#[derive(Debug)]
pub enum ProviderOutcome {
    /// Quotes the provider offered. Empty means "no offer", not an error.
    Quotes {
        provider_id: ProviderId,
        quotes: Vec<Quote>,
    },
    Failed(ProviderFailure),
}

impl ProviderOutcome {
    pub fn provider_id(&self) -> &ProviderId {
        match self {
            Self::Quotes { provider_id, .. } => provider_id,
            Self::Failed(failure) => &failure.provider_id,
        }
    }
}

/// Every provider's outcome, in registration order, plus diagnostics.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub outcomes: Vec<ProviderOutcome>,
    pub diagnostics: FetchDiagnostics,
}

impl FetchOutcome {
    pub fn quotes(&self) -> Vec<&Quote> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                ProviderOutcome::Quotes { quotes, .. } => Some(quotes.iter()),
                ProviderOutcome::Failed(_) => None,
            })
            .flatten()
            .collect()
    }

    pub fn into_quotes(self) -> Vec<Quote> {
        self.outcomes
            .into_iter()
            .filter_map(|o| match o {
                ProviderOutcome::Quotes { quotes, .. } => Some(quotes),
                ProviderOutcome::Failed(_) => None,
            })
            .flatten()
            .collect()
    }

    pub fn errors(&self) -> Vec<&ProviderFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                ProviderOutcome::Failed(failure) => Some(failure),
                ProviderOutcome::Quotes { .. } => None,
            })
            .collect()
    }

    pub fn has_quotes(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o, ProviderOutcome::Quotes { quotes, .. } if !quotes.is_empty()))
    }

    /// Nobody offered anything and nobody failed.
    pub fn is_no_offers(&self) -> bool {
        !self.has_quotes() && self.errors().is_empty()
    }

    /// The failure worth showing when no quote came back at all.
    ///
    /// See [`best_failure`] for the precedence.
    pub fn best_error(&self) -> Option<&ProviderFailure> {
        if self.has_quotes() {
            return None;
        }
        best_failure(self.errors())
    }
}
