//! Best-quote selection.

use rust_decimal::Decimal;

use crate::models::Quote;

/// Whether `challenger` displaces the current `best`. Rate ties keep `best`.
fn displaces(challenger: (&Quote, Decimal), best: (&Quote, Decimal)) -> bool {
    let (quote, current) = (challenger.0, best.0);
    let higher_rate = challenger.1 > best.1;

    // DEX quotes compete on rate alone.
    if quote.is_dex {
        return higher_rate;
    }

    // A DEX best only yields to a fixed quote with a better rate.
    if current.is_dex {
        return !quote.is_estimate && higher_rate;
    }

    if quote.is_estimate == current.is_estimate {
        return higher_rate;
    }

    // Exactly one is fixed, and the fixed one wins.
    !quote.is_estimate
}

/// Pick the best quote by rate, preferring fixed quotes over estimates.
///
/// Folds left over the quotes that have a rate:
/// 1. A DEX challenger is compared on rate only.
/// 2. Against a DEX best, a fixed challenger is compared on rate; an
///    estimate challenger never wins.
/// 3. Neither DEX and both fixed or both estimates: compared on rate.
/// 4. Exactly one fixed: the fixed quote wins regardless of rate.
///
/// Quotes with a zero source or crypto amount have no rate and are never
/// picked. Returns `None` when no quote has a rate.
pub fn pick_best_quote(quotes: &[Quote], precision: u32) -> Option<&Quote> {
    quotes
        .iter()
        .filter_map(|q| q.rate(precision).map(|rate| (q, rate)))
        .reduce(|best, challenger| {
            if displaces(challenger, best) {
                challenger
            } else {
                best
            }
        })
        .map(|(quote, _)| quote)
}
