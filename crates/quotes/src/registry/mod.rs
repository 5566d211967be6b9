//! Provider registry and its fetch-cycle machinery.
//!
//! This module provides:
//! - [`ProviderRegistry`]: concurrent fan-out of a request to every provider
//! - [`CircuitBreaker`]: keeps failing providers out of fetch cycles
//! - [`QuoteCache`]: reuses quotes that are still unexpired
//! - [`QuoteValidator`]: rejects malformed or stale quotes
//! - [`FetchOutcome`] / [`FetchDiagnostics`]: what each provider contributed

mod cache;
mod circuit_breaker;
mod diagnostics;
mod outcome;
mod provider_registry;
mod validator;

pub use cache::QuoteCache;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use diagnostics::{AttemptResult, FetchDiagnostics, ProviderAttempt, SkipReason};
pub use outcome::{FetchOutcome, ProviderOutcome};
pub use provider_registry::ProviderRegistry;
pub use validator::{QuoteValidator, ValidationIssue, ValidationSeverity};
