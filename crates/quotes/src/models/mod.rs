//! Quote engine models
//!
//! This module contains the core data types for quote operations:
//! - `types` - Type aliases for common identifiers (ProviderId, QuoteId, CurrencyCode)
//! - `amount` - Decimal string parsing and truncating division
//! - `request` - The request descriptor handed to providers (QuoteRequest)
//! - `quote` - Quote data structures (Quote, NetworkFee, RampDetails)

mod amount;
mod quote;
mod request;
mod types;

pub use amount::{div_truncated, parse_amount, DECIMAL_PRECISION};
pub use quote::{NetworkFee, Quote, RampDetails, SettlementRange};
pub use request::{AssetRef, Direction, QuoteFor, QuoteRequest, Region};
pub use types::{CurrencyCode, PaymentType, ProviderId, QuoteId};
