//! Display sections for a quote list, and max-flow selection.

use serde::{Deserialize, Serialize};

use crate::models::Quote;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Selected,
    Fixed,
    Variable,
}

#[derive(Clone, Debug, Serialize)]
pub struct QuoteSection {
    pub kind: SectionKind,
    pub quotes: Vec<Quote>,
}

/// A quote list split for display: the selected quote pinned on top, then
/// fixed quotes, then estimates. Empty sections are left out.
#[derive(Clone, Debug, Default, Serialize)]
pub struct QuoteSections {
    pub sections: Vec<QuoteSection>,
}

impl QuoteSections {
    /// `quotes` should already be ranked; order within a section is kept.
    pub fn build(selected: Option<&Quote>, quotes: &[Quote]) -> Self {
        let selected_id = selected.map(|q| q.id);
        let (fixed, variable): (Vec<Quote>, Vec<Quote>) = quotes
            .iter()
            .filter(|q| Some(q.id) != selected_id)
            .cloned()
            .partition(|q| !q.is_estimate);

        let sections = [
            (SectionKind::Selected, selected.cloned().into_iter().collect()),
            (SectionKind::Fixed, fixed),
            (SectionKind::Variable, variable),
        ]
        .into_iter()
        .filter(|(_, quotes): &(SectionKind, Vec<Quote>)| !quotes.is_empty())
        .map(|(kind, quotes)| QuoteSection { kind, quotes })
        .collect();

        Self { sections }
    }

    pub fn get(&self, kind: SectionKind) -> Option<&QuoteSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Which amount the user last typed into, for max flows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountSide {
    Fiat,
    Crypto,
}

/// For a max request, the ramp quote offering the largest amount on `side`.
///
/// Quotes missing either amount are ignored; ties keep the earlier quote.
pub fn pick_max_quote(quotes: &[Quote], side: AmountSide) -> Option<&Quote> {
    quotes
        .iter()
        .filter(|q| q.has_amounts())
        .filter_map(|q| {
            let amount = match side {
                AmountSide::Fiat => q.fiat_amount(),
                AmountSide::Crypto => q.crypto_amount(),
            };
            amount.map(|a| (q, a))
        })
        .reduce(|best, challenger| if challenger.1 > best.1 { challenger } else { best })
        .map(|(q, _)| q)
}
