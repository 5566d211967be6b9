//! Provider capabilities.

use serde::{Deserialize, Serialize};

use crate::models::{Direction, QuoteRequest};

/// Describes which requests a provider can answer.
///
/// Used by the registry to leave providers out of a fetch cycle up front
/// instead of collecting predictable errors from them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    /// Directions this provider quotes (swap, buy, sell).
    pub directions: Vec<Direction>,

    /// Whether the provider can quote the largest amount it accepts.
    #[serde(default)]
    pub supports_max: bool,
}

impl ProviderCapabilities {
    pub fn swap() -> Self {
        Self {
            directions: vec![Direction::Swap],
            supports_max: true,
        }
    }

    pub fn ramp() -> Self {
        Self {
            directions: vec![Direction::Buy, Direction::Sell],
            supports_max: false,
        }
    }

    pub fn supports_direction(&self, direction: Direction) -> bool {
        self.directions.contains(&direction)
    }

    pub fn supports(&self, request: &QuoteRequest) -> bool {
        self.supports_direction(request.direction) && (!request.is_max() || self.supports_max)
    }
}
