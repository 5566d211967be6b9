//! Quote providers.
//!
//! Every liquidity source implements [`QuoteProvider`]. Two implementations
//! ship with the crate:
//! - [`FixtureProvider`]: scripted in-memory quotes and errors
//! - [`HttpQuoteProvider`]: a JSON-over-HTTP provider gateway

mod capabilities;
mod error_body;
mod fixture;
mod http;
mod traits;

pub use capabilities::ProviderCapabilities;
pub use error_body::{ErrorType, ProviderErrorBody};
pub use fixture::{FixtureProvider, FixtureSpec, QuoteTemplate};
pub use http::HttpQuoteProvider;
pub use traits::{ApprovalReceipt, QuoteProvider};
