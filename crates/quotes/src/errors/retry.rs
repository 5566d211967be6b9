/// Classification for how the registry treats a provider error.
///
/// Every provider is already queried concurrently, so the class does not
/// decide whether other providers are tried. It decides whether the failure
/// counts against the provider's circuit breaker.
///
/// | Class | Record Circuit Breaker Failure? |
/// |-------|--------------------------------|
/// | `Never` | No |
/// | `FailoverWithPenalty` | Yes |
/// | `NextProvider` | No |
/// | `CircuitOpen` | No (already recorded) |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// The request itself is unacceptable to this provider (limits, region,
    /// unsupported asset). Asking again with the same request won't help.
    Never,

    /// Transient provider trouble: rate limiting, timeouts, transport errors.
    ///
    /// The failure is recorded in the circuit breaker, which may cause the
    /// provider to be skipped in later fetch cycles if failures accumulate.
    FailoverWithPenalty,

    /// The provider answered with an error of its own. Not penalized.
    NextProvider,

    /// Circuit breaker is open for this provider.
    CircuitOpen,
}
