//! Payment-type grouping for ramp quote lists.

use serde::Serialize;

use crate::models::{PaymentType, Quote, QuoteId};

use super::order::sort_by_rate;

/// Ramp quotes sharing a payment type, best rate first.
#[derive(Clone, Debug, Serialize)]
pub struct PaymentGroup {
    pub payment_type: PaymentType,
    pub quotes: Vec<Quote>,
}

impl PaymentGroup {
    pub fn contains(&self, quote_id: &QuoteId) -> bool {
        self.quotes.iter().any(|q| &q.id == quote_id)
    }
}

/// Ramp quotes grouped by payment type, with the best rate across groups.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PaymentGroups {
    /// Groups in the order their payment type was first seen.
    pub groups: Vec<PaymentGroup>,
    pub best_overall: Option<QuoteId>,
}

impl PaymentGroups {
    pub fn best_overall(&self) -> Option<&Quote> {
        let id = self.best_overall?;
        self.groups
            .iter()
            .flat_map(|g| g.quotes.iter())
            .find(|q| q.id == id)
    }

    pub fn group(&self, payment_type: &str) -> Option<&PaymentGroup> {
        self.groups.iter().find(|g| g.payment_type == payment_type)
    }
}

/// Group ramp quotes by payment type and sort each group by rate.
///
/// Quotes without ramp details (swaps) are left out. The best overall is the
/// highest rate across every group, used to highlight a single row.
pub fn group_by_payment_type(quotes: &[Quote], precision: u32) -> PaymentGroups {
    let mut groups: Vec<PaymentGroup> = Vec::new();

    for quote in quotes {
        let Some(payment_type) = quote.payment_type() else {
            continue;
        };
        match groups.iter_mut().find(|g| g.payment_type == payment_type) {
            Some(group) => group.quotes.push(quote.clone()),
            None => groups.push(PaymentGroup {
                payment_type: payment_type.to_string(),
                quotes: vec![quote.clone()],
            }),
        }
    }

    for group in &mut groups {
        sort_by_rate(&mut group.quotes, precision);
    }

    let best_overall = groups
        .iter()
        .filter_map(|g| g.quotes.first())
        .filter_map(|q| q.rate(precision).map(|rate| (q, rate)))
        .reduce(|best, challenger| if challenger.1 > best.1 { challenger } else { best })
        .map(|(q, _)| q.id);

    PaymentGroups {
        groups,
        best_overall,
    }
}
