//! Per-provider circuit breaker.
//!
//! A provider that keeps timing out or rate limiting us is left out of
//! fetch cycles for a while instead of holding up every refresh:
//!
//! - **Closed**: provider is queried normally.
//! - **Open**: provider is skipped until the cool-down elapses.
//! - **HalfOpen**: provider is queried again; enough successes close the
//!   circuit, any failure reopens it.
//!
//! State is in-memory only.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::models::ProviderId;

/// Circuit breaker state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    /// Consecutive penalized failures.
    failures: u32,
    /// Consecutive successes while HalfOpen.
    probe_successes: u32,
    opened_at: Option<Instant>,
}

impl Default for Circuit {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            failures: 0,
            probe_successes: 0,
            opened_at: None,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Penalized failures in a row before the circuit opens.
    pub failure_threshold: u32,
    /// Cool-down before an open circuit lets a probe through.
    pub recovery_timeout_ms: u64,
    /// Successful probes needed to close a HalfOpen circuit.
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout_ms: 60_000,
            half_open_success_threshold: 2,
        }
    }
}

impl CircuitBreakerConfig {
    fn recovery_timeout(&self) -> Duration {
        Duration::from_millis(self.recovery_timeout_ms)
    }
}

/// Thread-safe circuit breaker keyed by provider id.
#[derive(Default)]
pub struct CircuitBreaker {
    circuits: Mutex<HashMap<ProviderId, Circuit>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// A poisoned lock only means a panic mid-update; the counters are
    /// still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<ProviderId, Circuit>> {
        self.circuits.lock().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Whether the provider may be queried now. Moves Open to HalfOpen
    /// once the cool-down has elapsed.
    pub fn is_allowed(&self, provider: &ProviderId) -> bool {
        let mut circuits = self.lock();
        let circuit = circuits.entry(provider.clone()).or_default();

        match circuit.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled_down = circuit
                    .opened_at
                    .is_some_and(|at| at.elapsed() >= self.config.recovery_timeout());
                if cooled_down {
                    info!("Circuit for '{}' is half-open, probing", provider);
                    circuit.state = CircuitState::HalfOpen;
                    circuit.probe_successes = 0;
                }
                cooled_down
            }
        }
    }

    pub fn record_success(&self, provider: &ProviderId) {
        let mut circuits = self.lock();
        let circuit = circuits.entry(provider.clone()).or_default();

        match circuit.state {
            CircuitState::Closed => circuit.failures = 0,
            CircuitState::HalfOpen => {
                circuit.probe_successes += 1;
                if circuit.probe_successes >= self.config.half_open_success_threshold {
                    info!("Circuit for '{}' closed after successful probes", provider);
                    *circuit = Circuit::default();
                }
            }
            CircuitState::Open => {
                debug!("Ignoring success for '{}' while circuit is open", provider);
            }
        }
    }

    pub fn record_failure(&self, provider: &ProviderId) {
        let mut circuits = self.lock();
        let circuit = circuits.entry(provider.clone()).or_default();
        circuit.failures += 1;

        match circuit.state {
            CircuitState::Closed if circuit.failures >= self.config.failure_threshold => {
                info!(
                    "Opening circuit for '{}' after {} failures",
                    provider, circuit.failures
                );
                circuit.state = CircuitState::Open;
                circuit.opened_at = Some(Instant::now());
            }
            CircuitState::Closed => {
                debug!(
                    "Failure for '{}' ({}/{})",
                    provider, circuit.failures, self.config.failure_threshold
                );
            }
            CircuitState::HalfOpen => {
                info!("Probe failed for '{}', reopening circuit", provider);
                circuit.state = CircuitState::Open;
                circuit.opened_at = Some(Instant::now());
                circuit.probe_successes = 0;
            }
            CircuitState::Open => {}
        }
    }

    pub fn state(&self, provider: &ProviderId) -> CircuitState {
        self.lock()
            .get(provider)
            .map(|c| c.state)
            .unwrap_or(CircuitState::Closed)
    }

    pub fn reset(&self, provider: &ProviderId) {
        if self.lock().remove(provider).is_some() {
            info!("Circuit for '{}' reset", provider);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    fn breaker(failure_threshold: u32, recovery_timeout_ms: u64, probes: u32) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold,
            recovery_timeout_ms,
            half_open_success_threshold: probes,
        })
    }

    #[test]
    fn test_circuit_starts_closed() {
        let cb = CircuitBreaker::default();
        let provider: ProviderId = Cow::Borrowed("changenow");
        assert!(cb.is_allowed(&provider));
        assert_eq!(cb.state(&provider), CircuitState::Closed);
    }

    #[test]
    fn test_circuit_opens_after_threshold() {
        let cb = breaker(3, 60_000, 2);
        let provider: ProviderId = Cow::Borrowed("sideshift");

        cb.record_failure(&provider);
        cb.record_failure(&provider);
        assert!(cb.is_allowed(&provider));

        cb.record_failure(&provider);
        assert!(!cb.is_allowed(&provider));
        assert_eq!(cb.state(&provider), CircuitState::Open);
    }

    #[test]
    fn test_success_resets_failures() {
        let cb = breaker(2, 60_000, 1);
        let provider: ProviderId = Cow::Borrowed("exolix");

        cb.record_failure(&provider);
        cb.record_success(&provider);
        cb.record_failure(&provider);
        assert_eq!(cb.state(&provider), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_cycle() {
        let cb = breaker(1, 10, 2);
        let provider: ProviderId = Cow::Borrowed("godex");

        cb.record_failure(&provider);
        assert!(!cb.is_allowed(&provider));

        std::thread::sleep(Duration::from_millis(20));
        assert!(cb.is_allowed(&provider));
        assert_eq!(cb.state(&provider), CircuitState::HalfOpen);

        cb.record_success(&provider);
        assert_eq!(cb.state(&provider), CircuitState::HalfOpen);
        cb.record_success(&provider);
        assert_eq!(cb.state(&provider), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_reopens_on_failure() {
        let cb = breaker(1, 10, 2);
        let provider: ProviderId = Cow::Borrowed("letsexchange");

        cb.record_failure(&provider);
        std::thread::sleep(Duration::from_millis(20));
        assert!(cb.is_allowed(&provider));

        cb.record_failure(&provider);
        assert_eq!(cb.state(&provider), CircuitState::Open);
        assert!(!cb.is_allowed(&provider));
    }

    #[test]
    fn test_reset_and_isolation() {
        let cb = breaker(1, 60_000, 1);
        let a: ProviderId = Cow::Borrowed("a");
        let b: ProviderId = Cow::Borrowed("b");

        cb.record_failure(&a);
        assert!(!cb.is_allowed(&a));
        assert!(cb.is_allowed(&b));

        cb.reset(&a);
        assert_eq!(cb.state(&a), CircuitState::Closed);
    }
}
