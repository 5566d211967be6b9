//! In-memory cache of provider quotes between refreshes.
//!
//! Entries are keyed by [`QuoteRequest::cache_key`](crate::models::QuoteRequest::cache_key)
//! and then by provider. A provider's entry is served only while every quote
//! in it is unexpired, so a refresh triggered by the soonest expiration
//! re-queries exactly the providers whose quotes went stale.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::models::{ProviderId, Quote, QuoteId};

type ProviderEntries = HashMap<ProviderId, Vec<Quote>>;

#[derive(Default)]
pub struct QuoteCache {
    entries: Mutex<HashMap<String, ProviderEntries>>,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ProviderEntries>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Quote cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Cached quotes for `provider_id`, if all of them are still live at `now`.
    pub fn get_fresh(&self, key: &str, provider_id: &ProviderId, now: DateTime<Utc>) -> Option<Vec<Quote>> {
        let mut entries = self.lock();
        let providers = entries.get_mut(key)?;
        let quotes = providers.get(provider_id)?;

        if quotes.iter().all(|q| !q.is_expired(now)) {
            debug!("Cache hit for '{}' ({} quotes)", provider_id, quotes.len());
            return Some(quotes.clone());
        }

        debug!("Cached quotes for '{}' are stale, dropping", provider_id);
        providers.remove(provider_id);
        None
    }

    /// Remember a provider's quotes. Quotes without an expiration never
    /// signal staleness, so such batches are not cached.
    pub fn store(&self, key: &str, provider_id: &ProviderId, quotes: &[Quote]) {
        let mut entries = self.lock();
        let providers = entries.entry(key.to_string()).or_default();

        if quotes.is_empty() || quotes.iter().any(|q| q.expiration_date.is_none()) {
            providers.remove(provider_id);
            return;
        }
        providers.insert(provider_id.clone(), quotes.to_vec());
    }

    /// Forget whichever provider entry holds `quote_id`. Called once a quote
    /// is closed, since the provider no longer honors it.
    pub fn evict_quote(&self, quote_id: &QuoteId) {
        for providers in self.lock().values_mut() {
            providers.retain(|_, quotes| !quotes.iter().any(|q| &q.id == quote_id));
        }
    }

    pub fn invalidate(&self, key: &str) {
        self.lock().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use chrono::Duration;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::Direction;

    fn quote(expires_in: Option<i64>, now: DateTime<Utc>) -> Quote {
        let q = Quote::new(Cow::Borrowed("moonpay"), "MoonPay", Direction::Buy, dec!(100), dec!(0.001));
        match expires_in {
            Some(secs) => q.expires_at(now + Duration::seconds(secs)),
            None => q,
        }
    }

    #[test]
    fn test_fresh_quotes_are_served() {
        let cache = QuoteCache::new();
        let now = Utc::now();
        let id: ProviderId = Cow::Borrowed("moonpay");
        let quotes = vec![quote(Some(8), now), quote(Some(30), now)];

        cache.store("k", &id, &quotes);
        let hit = cache.get_fresh("k", &id, now + Duration::seconds(5)).unwrap();
        assert_eq!(hit, quotes);
        assert!(cache.get_fresh("other", &id, now).is_none());
    }

    #[test]
    fn test_one_stale_quote_evicts_provider_entry() {
        let cache = QuoteCache::new();
        let now = Utc::now();
        let id: ProviderId = Cow::Borrowed("moonpay");

        cache.store("k", &id, &[quote(Some(8), now), quote(Some(30), now)]);
        assert!(cache.get_fresh("k", &id, now + Duration::seconds(9)).is_none());
        // Evicted, not just hidden.
        assert!(cache.get_fresh("k", &id, now).is_none());
    }

    #[test]
    fn test_non_expiring_batches_are_not_cached() {
        let cache = QuoteCache::new();
        let now = Utc::now();
        let id: ProviderId = Cow::Borrowed("moonpay");

        cache.store("k", &id, &[quote(Some(8), now), quote(None, now)]);
        assert!(cache.get_fresh("k", &id, now).is_none());

        cache.store("k", &id, &[]);
        assert!(cache.get_fresh("k", &id, now).is_none());
    }

    #[test]
    fn test_evict_closed_quote() {
        let cache = QuoteCache::new();
        let now = Utc::now();
        let moonpay: ProviderId = Cow::Borrowed("moonpay");
        let banxa: ProviderId = Cow::Borrowed("banxa");
        let closed = quote(Some(60), now);

        cache.store("k", &moonpay, &[closed.clone(), quote(Some(60), now)]);
        cache.store("k", &banxa, &[quote(Some(60), now)]);
        cache.evict_quote(&closed.id);

        assert!(cache.get_fresh("k", &moonpay, now).is_none());
        assert!(cache.get_fresh("k", &banxa, now).is_some());
    }

    #[test]
    fn test_invalidate() {
        let cache = QuoteCache::new();
        let now = Utc::now();
        let id: ProviderId = Cow::Borrowed("moonpay");

        cache.store("k", &id, &[quote(Some(60), now)]);
        cache.invalidate("k");
        assert!(cache.get_fresh("k", &id, now).is_none());
    }
}
