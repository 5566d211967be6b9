//! Property-based tests for quote ranking.
//!
//! These tests verify the tie-break rules hold across random quote sets,
//! using the `proptest` crate for random test case generation.

use std::borrow::Cow;

use proptest::prelude::*;
use rust_decimal::Decimal;
use swapdesk_quotes::models::{Direction, Quote, DECIMAL_PRECISION};
use swapdesk_quotes::ranking::{pick_best_quote, rank_quotes, sort_by_rate};

// =============================================================================
// Generators
// =============================================================================

/// Generates a positive decimal amount with up to 8 fractional digits.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000_000, 0u32..=8).prop_map(|(mantissa, scale)| Decimal::new(mantissa, scale))
}

/// Generates a swap quote with random amounts and flags.
fn arb_quote() -> impl Strategy<Value = Quote> {
    (arb_amount(), arb_amount(), any::<bool>(), any::<bool>(), "[a-z]{4,8}").prop_map(
        |(from, to, is_estimate, is_dex, provider)| {
            let mut quote = Quote::new(
                Cow::Owned(provider.clone()),
                provider,
                Direction::Swap,
                from,
                to,
            );
            quote.is_estimate = is_estimate;
            quote.is_dex = is_dex;
            quote
        },
    )
}

fn arb_quotes(max_count: usize) -> impl Strategy<Value = Vec<Quote>> {
    proptest::collection::vec(arb_quote(), 0..=max_count)
}

fn rate(quote: &Quote) -> Decimal {
    quote.rate(DECIMAL_PRECISION).unwrap_or_default()
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A DEX quote with a strictly better rate beats a non-DEX quote,
    /// whichever order they arrive in.
    #[test]
    fn prop_better_dex_quote_wins(mut dex in arb_quote(), mut other in arb_quote()) {
        dex.is_dex = true;
        other.is_dex = false;
        prop_assume!(rate(&dex) > rate(&other));

        let quotes = [other.clone(), dex.clone()];
        let best = pick_best_quote(&quotes, DECIMAL_PRECISION).unwrap();
        prop_assert_eq!(best.id, dex.id);

        // With the DEX quote already best, a non-DEX challenger never beats its
        // better rate either.
        let quotes = [dex.clone(), other.clone()];
        let best = pick_best_quote(&quotes, DECIMAL_PRECISION).unwrap();
        prop_assert_eq!(best.id, dex.id);
    }

    /// Between two non-DEX quotes where exactly one is fixed, the fixed one
    /// wins regardless of rate or order.
    #[test]
    fn prop_fixed_beats_estimate(mut fixed in arb_quote(), mut estimate in arb_quote(), fixed_first in any::<bool>()) {
        fixed.is_dex = false;
        fixed.is_estimate = false;
        estimate.is_dex = false;
        estimate.is_estimate = true;

        let quotes = if fixed_first {
            vec![fixed.clone(), estimate]
        } else {
            vec![estimate, fixed.clone()]
        };
        let best = pick_best_quote(&quotes, DECIMAL_PRECISION).unwrap();
        prop_assert_eq!(best.id, fixed.id);
    }

    /// Zero-amount quotes are never best and always sort last.
    #[test]
    fn prop_zero_amount_excluded(quotes in arb_quotes(6), zeros in 1usize..4) {
        let mut all = quotes.clone();
        for i in 0..zeros {
            let name = format!("zero{i}");
            all.insert(
                i % (all.len() + 1),
                Quote::new(Cow::Owned(name.clone()), name, Direction::Swap, Decimal::ZERO, Decimal::ONE),
            );
        }

        if let Some(best) = pick_best_quote(&all, DECIMAL_PRECISION) {
            prop_assert!(!best.from_amount.is_zero());
        } else {
            prop_assert!(quotes.is_empty());
        }

        let ranked = rank_quotes(all, DECIMAL_PRECISION);
        let tail = &ranked.ordered[ranked.ordered.len() - zeros..];
        prop_assert!(tail.iter().all(|q| q.from_amount.is_zero()));
    }

    /// If every quote has a zero amount, sorting leaves the order unchanged.
    #[test]
    fn prop_all_zero_keeps_order(count in 0usize..6) {
        let mut quotes: Vec<Quote> = (0..count)
            .map(|i| {
                let name = format!("p{i}");
                Quote::new(Cow::Owned(name.clone()), name, Direction::Swap, Decimal::ZERO, Decimal::ONE)
            })
            .collect();
        let before: Vec<_> = quotes.iter().map(|q| q.id).collect();

        sort_by_rate(&mut quotes, DECIMAL_PRECISION);
        let after: Vec<_> = quotes.iter().map(|q| q.id).collect();
        prop_assert_eq!(before, after);
        prop_assert!(pick_best_quote(&quotes, DECIMAL_PRECISION).is_none());
    }

    /// Ranking the same list twice yields the same best quote and order.
    #[test]
    fn prop_ranking_is_idempotent(quotes in arb_quotes(8)) {
        let first = rank_quotes(quotes.clone(), DECIMAL_PRECISION);
        let second = rank_quotes(quotes.clone(), DECIMAL_PRECISION);

        prop_assert_eq!(first.best().map(|q| q.id), second.best().map(|q| q.id));
        let first_ids: Vec<_> = first.ordered.iter().map(|q| q.id).collect();
        let second_ids: Vec<_> = second.ordered.iter().map(|q| q.id).collect();
        prop_assert_eq!(first_ids, second_ids);
        prop_assert_eq!(
            pick_best_quote(&quotes, DECIMAL_PRECISION).map(|q| q.id),
            first.best().map(|q| q.id)
        );
    }

    /// Rates are `to / from` truncated to the configured precision.
    #[test]
    fn prop_rate_is_truncated_division(from in arb_amount(), to in arb_amount()) {
        let quote = Quote::new(Cow::Borrowed("p"), "P", Direction::Swap, from, to);
        let expected = (to / from).round_dp_with_strategy(8, rust_decimal::RoundingStrategy::ToZero);
        prop_assert_eq!(quote.rate(8).unwrap(), expected);
    }
}
