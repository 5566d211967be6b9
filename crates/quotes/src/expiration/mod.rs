//! Quote expiration tracking.
//!
//! The scheduler answers "when should the next refresh fire": a little
//! before the soonest expiration among the live quotes, or never when no
//! live quote expires. [`QuoteState`] is the per-quote lifecycle the
//! session drives.

mod scheduler;
mod state;

pub use scheduler::{prune_expired, ExpirationScheduler};
pub use state::QuoteState;
