use serde::Serialize;

use crate::models::{ProviderId, QuoteId};

/// Signals a session sends to whoever hosts it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    /// The selected quote passed its expiration date and was released.
    /// Sent once per quote; the host should fetch again.
    QuoteExpired {
        quote_id: QuoteId,
        provider_id: ProviderId,
    },
}
