use serde::{Deserialize, Serialize};

/// Lifecycle of a single quote within a session.
///
/// `Fetched -> Selected -> {Approved | Expired | Superseded | Failed}`.
/// Every terminal state has released the quote with its provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteState {
    Fetched,
    Selected,
    Approved,
    /// Passed its expiration date. Never revived; fetch again instead.
    Expired,
    /// Replaced by another selection, a refresh or dismissal.
    Superseded,
    /// Approval was attempted and rejected.
    Failed,
}

impl QuoteState {
    pub fn is_terminal(self) -> bool {
        !self.is_live()
    }

    /// Still held with the provider and must be closed eventually.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Fetched | Self::Selected)
    }
}
