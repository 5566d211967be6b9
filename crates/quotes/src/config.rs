//! Engine configuration.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::DECIMAL_PRECISION;
use crate::registry::CircuitBreakerConfig;

/// Default lead time before the soonest expiration at which a refresh fires.
const DEFAULT_REFETCH_LEAD_MS: u64 = 1_000;

/// Tunables for fetching, ranking and expiration tracking.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteEngineConfig {
    /// Fractional digits kept when computing rates.
    pub rate_precision: u32,

    /// How long before the soonest expiration a refresh is scheduled.
    pub refetch_lead_ms: u64,

    /// Network fee / amount paid at or above which a quote is flagged.
    pub fee_warning_ratio: Decimal,

    /// Per-provider timeout. `None` lets a slow provider hold only its own slot.
    pub provider_timeout_ms: Option<u64>,

    /// Reuse a provider's previous quotes while all of them are unexpired.
    pub cache_enabled: bool,

    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for QuoteEngineConfig {
    fn default() -> Self {
        Self {
            rate_precision: DECIMAL_PRECISION,
            refetch_lead_ms: DEFAULT_REFETCH_LEAD_MS,
            fee_warning_ratio: Decimal::new(5, 2),
            provider_timeout_ms: None,
            cache_enabled: true,
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl QuoteEngineConfig {
    pub fn refetch_lead(&self) -> Duration {
        Duration::from_millis(self.refetch_lead_ms)
    }

    pub fn provider_timeout(&self) -> Option<Duration> {
        self.provider_timeout_ms.map(Duration::from_millis)
    }
}
