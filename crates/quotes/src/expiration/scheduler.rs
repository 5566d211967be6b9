use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;

use crate::clock::Clock;
use crate::models::Quote;

/// Split `quotes` into those still live at `now` and those that expired.
pub fn prune_expired(quotes: Vec<Quote>, now: DateTime<Utc>) -> (Vec<Quote>, Vec<Quote>) {
    quotes.into_iter().partition(|q| !q.is_expired(now))
}

/// Decides when the next expiration-driven refresh should fire.
#[derive(Clone, Copy, Debug)]
pub struct ExpirationScheduler {
    /// How long before the soonest expiration the refresh fires.
    lead: Duration,
}

impl ExpirationScheduler {
    pub fn new(lead: Duration) -> Self {
        Self { lead }
    }

    pub fn lead(&self) -> Duration {
        self.lead
    }

    /// Time until the next refresh, or `None` if no live quote expires.
    ///
    /// Already-expired quotes are ignored. The delay is the shortest
    /// remaining lifetime minus the lead, clamped to zero.
    pub fn next_refetch_delay(&self, quotes: &[Quote], now: DateTime<Utc>) -> Option<Duration> {
        let soonest = quotes
            .iter()
            .filter(|q| !q.is_expired(now))
            .filter_map(|q| q.time_to_expiration(now))
            .min()?;

        let remaining = soonest.to_std().unwrap_or_default();
        Some(remaining.saturating_sub(self.lead))
    }

    /// Sleep until the next refresh is due. Never completes when nothing
    /// expires, so it is meant to be raced against other events.
    pub async fn wait(&self, quotes: &[Quote], clock: &dyn Clock) {
        match self.next_refetch_delay(quotes, clock.now()) {
            Some(delay) => {
                debug!("Next quote refresh in {:?}", delay);
                tokio::time::sleep(delay).await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
