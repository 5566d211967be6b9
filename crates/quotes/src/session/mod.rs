//! Quote session: one swap or ramp flow from first fetch to approval.
//!
//! The session owns the quote set of a single request and enforces the
//! selection rules:
//! - exactly one quote is selected at a time
//! - a quote that stops being selected is closed with its provider, unless
//!   it was approved
//! - an expired quote leaves the selectable set, and if it was selected a
//!   single [`SessionEvent::QuoteExpired`] is emitted
//! - every live quote is closed on dismissal, or on drop as a fallback
//!
//! Retired quotes leave the ranked list at once, so [`QuoteSession::best`]
//! and [`QuoteSession::ranked`] only ever show quotes that can still be used.

mod events;

pub use events::SessionEvent;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::errors::{best_failure, ProviderFailure, QuoteError};
use crate::expiration::{prune_expired, ExpirationScheduler, QuoteState};
use crate::models::{Quote, QuoteId, QuoteRequest};
use crate::provider::ApprovalReceipt;
use crate::ranking::{group_by_payment_type, rank_quotes, PaymentGroups, QuoteSections, RankedQuotes};
use crate::registry::{FetchDiagnostics, ProviderOutcome, ProviderRegistry};

pub struct QuoteSession {
    registry: Arc<ProviderRegistry>,
    request: QuoteRequest,
    clock: Arc<dyn Clock>,
    scheduler: ExpirationScheduler,
    precision: u32,

    /// Quotes still in play, in arrival order. `ranked` is derived from it.
    quotes: Vec<Quote>,
    ranked: RankedQuotes,
    states: HashMap<QuoteId, QuoteState>,
    selected: Option<QuoteId>,
    failures: Vec<ProviderFailure>,
    diagnostics: FetchDiagnostics,

    events: UnboundedSender<SessionEvent>,
    receiver: Option<UnboundedReceiver<SessionEvent>>,
    cancel: CancellationToken,
    /// Child of `cancel` guarding the current or next fetch.
    fetch_cancel: CancellationToken,
    dismissed: bool,
}

impl QuoteSession {
    pub fn new(registry: Arc<ProviderRegistry>, request: QuoteRequest, clock: Arc<dyn Clock>) -> Self {
        let config = registry.config();
        let scheduler = ExpirationScheduler::new(config.refetch_lead());
        let precision = config.rate_precision;
        let (events, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        Self {
            registry,
            request,
            clock,
            scheduler,
            precision,
            quotes: Vec::new(),
            ranked: RankedQuotes::default(),
            states: HashMap::new(),
            selected: None,
            failures: Vec::new(),
            diagnostics: FetchDiagnostics::new(),
            events,
            receiver: Some(receiver),
            fetch_cancel: cancel.child_token(),
            cancel,
            dismissed: false,
        }
    }

    /// The session's event stream. Can be taken once.
    pub fn take_events(&mut self) -> Option<UnboundedReceiver<SessionEvent>> {
        self.receiver.take()
    }

    pub fn request(&self) -> &QuoteRequest {
        &self.request
    }

    /// Fetch from every provider, rank, and select the best quote if
    /// nothing is selected.
    ///
    /// Quotes that expired since the last look are retired first, with the
    /// usual expiry event. Quotes from the previous cycle that didn't come
    /// back (cache hits keep their ids) are superseded and closed.
    pub async fn refresh(&mut self) -> Result<&RankedQuotes, QuoteError> {
        self.ensure_open()?;
        self.prune_expired().await;

        let fetched = self
            .registry
            .fetch_all_cancellable(&self.request, &self.fetch_cancel)
            .await;
        if self.fetch_cancel.is_cancelled() && !self.cancel.is_cancelled() {
            self.fetch_cancel = self.cancel.child_token();
        }
        let outcome = fetched?;

        let mut quotes = Vec::new();
        let mut failures = Vec::new();
        for provider_outcome in outcome.outcomes {
            match provider_outcome {
                ProviderOutcome::Quotes { quotes: q, .. } => quotes.extend(q),
                ProviderOutcome::Failed(failure) => failures.push(failure),
            }
        }
        // Anything already closed in this session stays out.
        quotes.retain(|q| self.states.get(&q.id).map_or(true, |s| s.is_live()));

        let previous = std::mem::replace(&mut self.quotes, quotes);
        for quote in previous {
            if !self.quotes.iter().any(|q| q.id == quote.id) {
                self.retire(&quote, QuoteState::Superseded).await;
            }
        }

        for quote in &self.quotes {
            self.states.entry(quote.id).or_insert(QuoteState::Fetched);
        }
        self.rerank();
        self.failures = failures;
        self.diagnostics = outcome.diagnostics;

        if self.selected.is_some_and(|id| self.ranked.get(&id).is_none()) {
            self.selected = None;
        }
        if self.selected.is_none() {
            if let Some(best) = self.ranked.best().map(|q| q.id) {
                self.mark_selected(best);
            }
        }

        info!(
            "Session refreshed: {} quotes, {} provider errors",
            self.ranked.len(),
            self.failures.len()
        );
        Ok(&self.ranked)
    }

    /// Select `quote_id`, closing the previous selection unless approved.
    pub async fn select(&mut self, quote_id: QuoteId) -> Result<&Quote, QuoteError> {
        self.ensure_open()?;

        let quote = self
            .ranked
            .get(&quote_id)
            .cloned()
            .ok_or(QuoteError::QuoteNotFound(quote_id))?;

        match self.state(&quote_id) {
            Some(QuoteState::Approved) => return Err(QuoteError::QuoteAlreadyApproved(quote_id)),
            Some(state) if state.is_terminal() => return Err(QuoteError::QuoteNotFound(quote_id)),
            _ => {}
        }

        if quote.is_expired(self.clock.now()) {
            self.prune_expired().await;
            return Err(QuoteError::QuoteExpired { quote_id });
        }

        if self.selected != Some(quote_id) {
            if let Some(previous) = self.selected.and_then(|id| self.ranked.get(&id).cloned()) {
                if self.retire(&previous, QuoteState::Superseded).await {
                    self.rerank();
                }
            }
            self.mark_selected(quote_id);
        }

        self.ranked
            .get(&quote_id)
            .ok_or(QuoteError::QuoteNotFound(quote_id))
    }

    /// Live quotes in ranked order, after dropping any that expired.
    pub async fn selectable_quotes(&mut self) -> Vec<Quote> {
        self.prune_expired().await;
        self.live_quotes().cloned().collect()
    }

    /// Submit the selected quote for execution.
    ///
    /// The quote is closed afterwards whatever the outcome. An expired
    /// quote is never submitted; fetch again instead.
    pub async fn approve(&mut self) -> Result<ApprovalReceipt, QuoteError> {
        self.ensure_open()?;

        let quote_id = self.selected.ok_or(QuoteError::NoQuoteSelected)?;
        if self.state(&quote_id) == Some(QuoteState::Approved) {
            return Err(QuoteError::QuoteAlreadyApproved(quote_id));
        }
        let quote = self
            .ranked
            .get(&quote_id)
            .cloned()
            .ok_or(QuoteError::QuoteNotFound(quote_id))?;

        if quote.is_expired(self.clock.now()) {
            self.prune_expired().await;
            return Err(QuoteError::QuoteExpired { quote_id });
        }

        let result = self.registry.approve(&quote).await;
        self.close_quote(&quote).await;

        match result {
            Ok(receipt) => {
                info!("Quote {} approved by '{}'", quote_id, quote.provider_id);
                self.states.insert(quote_id, QuoteState::Approved);
                Ok(receipt)
            }
            Err(error) => {
                warn!("Approval of quote {} failed: {}", quote_id, error);
                self.states.insert(quote_id, QuoteState::Failed);
                self.selected = None;
                self.rerank();
                Err(match error {
                    e @ QuoteError::ApprovalFailed { .. } => e,
                    other => QuoteError::ApprovalFailed {
                        provider: quote.provider_id.to_string(),
                        message: other.to_string(),
                    },
                })
            }
        }
    }

    /// Cancel any in-flight fetch and close every unapproved quote.
    pub async fn dismiss(&mut self) {
        if self.dismissed {
            return;
        }
        self.cancel.cancel();
        self.dismissed = true;

        let live: Vec<Quote> = self.live_quotes().cloned().collect();
        debug!("Dismissing session, releasing {} quotes", live.len());
        for quote in live {
            self.retire(&quote, QuoteState::Superseded).await;
        }
        self.selected = None;
        self.rerank();
    }

    /// Cancels the fetch in flight, or the next one if none is running.
    ///
    /// Only that fetch fails with [`QuoteError::Cancelled`]; later refreshes
    /// get a fresh token. Use [`dismiss`](Self::dismiss) to end the session.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.fetch_cancel.clone()
    }

    pub fn selected(&self) -> Option<&Quote> {
        self.selected.and_then(|id| self.ranked.get(&id))
    }

    /// The best quote still open for selection.
    pub fn best(&self) -> Option<&Quote> {
        self.ranked
            .best()
            .filter(|q| self.states.get(&q.id).is_some_and(|s| s.is_live()))
    }

    pub fn state(&self, quote_id: &QuoteId) -> Option<QuoteState> {
        self.states.get(quote_id).copied()
    }

    pub fn ranked(&self) -> &RankedQuotes {
        &self.ranked
    }

    /// Selected quote pinned, then fixed, then variable quotes.
    pub fn sections(&self) -> QuoteSections {
        let others: Vec<Quote> = self.live_quotes().cloned().collect();
        QuoteSections::build(self.selected(), &others)
    }

    /// Ramp quotes grouped by payment type.
    pub fn payment_groups(&self) -> PaymentGroups {
        let live: Vec<Quote> = self.live_quotes().cloned().collect();
        group_by_payment_type(&live, self.precision)
    }

    pub fn failures(&self) -> &[ProviderFailure] {
        &self.failures
    }

    pub fn diagnostics(&self) -> &FetchDiagnostics {
        &self.diagnostics
    }

    /// Every provider answered with nothing; not an error.
    pub fn is_no_offers(&self) -> bool {
        self.ranked.is_empty() && self.failures.is_empty()
    }

    /// The failure to show when no provider returned a quote.
    pub fn best_error(&self) -> Option<&ProviderFailure> {
        if !self.ranked.is_empty() {
            return None;
        }
        best_failure(&self.failures)
    }

    pub fn has_fee_warning(&self, quote: &Quote) -> bool {
        self.registry.has_fee_warning(quote)
    }

    /// Time until the next expiration-driven refresh.
    pub fn next_refetch_delay(&self) -> Option<Duration> {
        let live: Vec<Quote> = self.live_quotes().cloned().collect();
        self.scheduler.next_refetch_delay(&live, self.clock.now())
    }

    /// Resolves when the next expiration-driven refresh is due.
    pub async fn wait_for_refetch(&self) {
        let live: Vec<Quote> = self.live_quotes().cloned().collect();
        self.scheduler.wait(&live, self.clock.as_ref()).await
    }

    fn live_quotes(&self) -> impl Iterator<Item = &Quote> {
        self.ranked
            .ordered
            .iter()
            .filter(|q| self.states.get(&q.id).is_some_and(|s| s.is_live()))
    }

    fn ensure_open(&self) -> Result<(), QuoteError> {
        if self.dismissed {
            return Err(QuoteError::Cancelled);
        }
        Ok(())
    }

    fn mark_selected(&mut self, quote_id: QuoteId) {
        debug!("Selecting quote {}", quote_id);
        self.selected = Some(quote_id);
        self.states.insert(quote_id, QuoteState::Selected);
    }

    /// Expire every quote past its date and drop it from the set.
    async fn prune_expired(&mut self) {
        let (kept, expired) = prune_expired(std::mem::take(&mut self.quotes), self.clock.now());
        self.quotes = kept;
        if expired.is_empty() {
            return;
        }

        for quote in &expired {
            let was_selected = self.selected == Some(quote.id);
            if self.retire(quote, QuoteState::Expired).await && was_selected {
                info!("Selected quote {} from '{}' expired", quote.id, quote.provider_id);
                self.selected = None;
                // A closed receiver just means nobody is listening.
                let _ = self.events.send(SessionEvent::QuoteExpired {
                    quote_id: quote.id,
                    provider_id: quote.provider_id.clone(),
                });
            }
        }
        self.rerank();
    }

    /// Rank what is still in play. Retired quotes leave the list; an
    /// approved one stays so the receipt's quote remains visible.
    fn rerank(&mut self) {
        let states = &self.states;
        self.quotes.retain(|q| {
            states
                .get(&q.id)
                .map_or(true, |s| s.is_live() || *s == QuoteState::Approved)
        });
        self.ranked = rank_quotes(self.quotes.clone(), self.precision);
    }

    /// Move a live quote to a terminal state and release it. Returns
    /// whether the quote was live.
    async fn retire(&mut self, quote: &Quote, state: QuoteState) -> bool {
        let live = self.state(&quote.id).map_or(true, |s| s.is_live());
        if !live {
            return false;
        }
        self.states.insert(quote.id, state);
        self.close_quote(quote).await;
        true
    }

    async fn close_quote(&self, quote: &Quote) {
        if let Err(e) = self.registry.close(quote).await {
            warn!("Failed to close quote {} with '{}': {}", quote.id, quote.provider_id, e);
        }
    }
}

impl Drop for QuoteSession {
    fn drop(&mut self) {
        self.cancel.cancel();
        if self.dismissed {
            return;
        }

        let live: Vec<Quote> = self.live_quotes().cloned().collect();
        if live.is_empty() {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let registry = Arc::clone(&self.registry);
                handle.spawn(async move {
                    for quote in live {
                        if let Err(e) = registry.close(&quote).await {
                            warn!("Failed to close quote {} on drop: {}", quote.id, e);
                        }
                    }
                });
            }
            Err(_) => warn!(
                "Quote session dropped outside a runtime, {} quotes not released",
                live.len()
            ),
        }
    }
}

#[cfg(test)]
mod tests;
