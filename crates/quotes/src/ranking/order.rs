//! Total ordering of a quote set, best first.

use std::cmp::Reverse;

use serde::Serialize;

use crate::models::{Quote, QuoteId};

use super::best::pick_best_quote;

/// Sort by rate, highest first. Quotes without a rate go last; the sort is
/// stable, so equal rates and unrated quotes keep their relative order.
pub fn sort_by_rate(quotes: &mut [Quote], precision: u32) {
    // `None < Some`, so reversing puts unrated quotes at the end.
    quotes.sort_by_cached_key(|q| Reverse(q.rate(precision)));
}

/// A ranked quote set.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RankedQuotes {
    /// Best quote first, then the rest by rate.
    pub ordered: Vec<Quote>,
    /// Index of the best quote in `ordered`; always `Some(0)` unless no
    /// quote has a rate.
    pub best: Option<usize>,
}

impl RankedQuotes {
    pub fn best(&self) -> Option<&Quote> {
        self.best.and_then(|i| self.ordered.get(i))
    }

    pub fn get(&self, quote_id: &QuoteId) -> Option<&Quote> {
        self.ordered.iter().find(|q| &q.id == quote_id)
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }
}

/// Order `quotes` best-to-worst and mark the best one.
///
/// The best is chosen by [`pick_best_quote`] and moved to the front; the
/// rest follow by rate. An empty input yields an empty set with no best,
/// which callers present as "no offers".
pub fn rank_quotes(mut quotes: Vec<Quote>, precision: u32) -> RankedQuotes {
    let best_id = pick_best_quote(&quotes, precision).map(|q| q.id);
    sort_by_rate(&mut quotes, precision);

    let best = best_id.and_then(|id| quotes.iter().position(|q| q.id == id));
    if let Some(index) = best {
        let quote = quotes.remove(index);
        quotes.insert(0, quote);
    }

    RankedQuotes {
        ordered: quotes,
        best: best.map(|_| 0),
    }
}
