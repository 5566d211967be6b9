//! Quote ranking.
//!
//! Rates are `to / from` computed with exact decimal division, so a higher
//! rate is better for swaps, buys (more crypto per fiat) and sells (more
//! fiat per crypto) alike. Nothing here has side effects.

mod best;
mod groups;
mod order;
mod sections;

pub use best::pick_best_quote;
pub use groups::{group_by_payment_type, PaymentGroup, PaymentGroups};
pub use order::{rank_quotes, sort_by_rate, RankedQuotes};
pub use sections::{pick_max_quote, AmountSide, QuoteSection, QuoteSections, SectionKind};
