//! Swapdesk Quotes Crate
//!
//! Quote fetching, ranking, expiration tracking and selection lifecycle for
//! crypto-to-crypto swaps and fiat on/off ramps.
//!
//! # Overview
//!
//! The quotes crate supports:
//! - Pluggable providers behind the [`QuoteProvider`] trait
//! - Concurrent join-all fetching with per-provider failure isolation
//! - Ranking with the fixed-over-estimate and DEX tie-break rules
//! - Expiration-aware refresh scheduling and quote caching
//! - A session enforcing "one selected quote, released when replaced"
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |   QuoteRequest   |  (assets, amount, direction, region)
//! +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! | ProviderRegistry | --> |    Providers     |  (fixture, HTTP, ...)
//! +------------------+     +------------------+
//!          |                 join-all, cache, circuit breaker
//!          v
//! +------------------+
//! |   FetchOutcome   |  (per-provider quotes or tagged failures)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |     Ranking      |  (best quote, rate order, payment groups)
//! +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! |   QuoteSession   | --> |    Expiration    |  (refresh timer, expiry events)
//! +------------------+     +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`QuoteRequest`] - What the user wants quoted
//! - [`Quote`] - A priced, possibly time-bounded offer
//! - [`ProviderRegistry`] - Fans a request out to every provider
//! - [`QuoteSession`] - Selection, approval and release for one flow
//! - [`QuoteError`] - Every failure the engine reports
//!
//! # Amounts
//!
//! Amounts are [`rust_decimal::Decimal`] inside the engine and decimal
//! strings on the wire. Rates use truncating division at a configurable
//! precision (18 fractional digits by default).

pub mod clock;
pub mod config;
pub mod errors;
pub mod expiration;
pub mod models;
pub mod provider;
pub mod ranking;
pub mod registry;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::QuoteEngineConfig;
pub use errors::{ProviderFailure, QuoteError, RetryClass};

pub use models::{
    AssetRef, Direction, NetworkFee, ProviderId, Quote, QuoteFor, QuoteId, QuoteRequest,
    RampDetails, Region,
};

pub use provider::{
    ApprovalReceipt, FixtureProvider, FixtureSpec, HttpQuoteProvider, ProviderCapabilities,
    QuoteProvider,
};

pub use ranking::{pick_best_quote, rank_quotes, QuoteSections, RankedQuotes};
pub use registry::{FetchOutcome, ProviderOutcome, ProviderRegistry};

pub use expiration::{ExpirationScheduler, QuoteState};
pub use session::{QuoteSession, SessionEvent};
