use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal_macros::dec;

use super::*;
use crate::clock::ManualClock;
use crate::config::QuoteEngineConfig;
use crate::models::{AssetRef, QuoteFor};
use crate::provider::{
    ErrorType, FixtureProvider, FixtureSpec, ProviderCapabilities, ProviderErrorBody, QuoteProvider,
    QuoteTemplate,
};

struct Harness {
    session: QuoteSession,
    clock: Arc<ManualClock>,
    fixtures: Vec<Arc<FixtureProvider>>,
}

fn harness(specs: Vec<FixtureSpec>) -> Harness {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let fixtures: Vec<Arc<FixtureProvider>> = specs
        .into_iter()
        .map(|spec| Arc::new(FixtureProvider::with_clock(spec, clock.clone())))
        .collect();
    let providers = fixtures
        .iter()
        .map(|f| f.clone() as Arc<dyn QuoteProvider>)
        .collect();
    let registry = Arc::new(ProviderRegistry::with_clock(
        providers,
        QuoteEngineConfig::default(),
        clock.clone(),
    ));
    let request = QuoteRequest::swap(
        AssetRef::new("btc-wallet", "BTC"),
        AssetRef::new("eth-wallet", "ETH"),
        dec!(0.5),
        QuoteFor::From,
    );
    Harness {
        session: QuoteSession::new(registry, request, clock.clone()),
        clock,
        fixtures,
    }
}

fn swap(id: &str, template: QuoteTemplate) -> FixtureSpec {
    FixtureSpec::new(id, id.to_uppercase(), ProviderCapabilities::swap()).quote(template)
}

#[tokio::test]
async fn test_refresh_selects_best() {
    let mut h = harness(vec![
        swap("changenow", QuoteTemplate::fixed(dec!(15))),
        swap("lifi", QuoteTemplate::fixed(dec!(16)).estimate()),
    ]);

    let ranked = h.session.refresh().await.unwrap();
    assert_eq!(ranked.len(), 2);

    let selected = h.session.selected().unwrap();
    assert_eq!(selected.provider_id, "changenow");
    assert_eq!(h.session.state(&selected.id), Some(QuoteState::Selected));
}

#[tokio::test]
async fn test_select_releases_previous() {
    let mut h = harness(vec![
        swap("changenow", QuoteTemplate::fixed(dec!(15))),
        swap("godex", QuoteTemplate::fixed(dec!(14))),
    ]);
    h.session.refresh().await.unwrap();

    let first = h.session.selected().unwrap().id;
    let other = h
        .session
        .ranked()
        .ordered
        .iter()
        .find(|q| q.id != first)
        .unwrap()
        .id;

    let selected = h.session.select(other).await.unwrap();
    assert_eq!(selected.id, other);
    assert_eq!(h.session.state(&first), Some(QuoteState::Superseded));
    assert_eq!(h.fixtures[0].closed_quotes(), vec![first]);

    // The released quote is gone from the ranking too.
    assert_eq!(h.session.best().unwrap().id, other);
    assert_eq!(h.session.ranked().best().unwrap().id, other);
    assert!(h.session.ranked().get(&first).is_none());

    // The released quote can't come back.
    assert!(matches!(
        h.session.select(first).await,
        Err(QuoteError::QuoteNotFound(_))
    ));
    assert_eq!(h.session.selectable_quotes().await.len(), 1);
}

#[tokio::test]
async fn test_selecting_unknown_quote_fails() {
    let mut h = harness(vec![swap("changenow", QuoteTemplate::fixed(dec!(15)))]);
    h.session.refresh().await.unwrap();
    let err = h.session.select(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, QuoteError::QuoteNotFound(_)));
}

#[tokio::test]
async fn test_expired_selection_signals_once() {
    let mut h = harness(vec![
        swap("changenow", QuoteTemplate::fixed(dec!(15)).expires_in(8_000)),
        swap("godex", QuoteTemplate::fixed(dec!(14)).expires_in(60_000)),
    ]);
    let mut events = h.session.take_events().unwrap();
    h.session.refresh().await.unwrap();
    let expiring = h.session.selected().unwrap().id;

    h.clock.advance(ChronoDuration::seconds(9));
    let selectable = h.session.selectable_quotes().await;
    assert_eq!(selectable.len(), 1);
    assert!(selectable.iter().all(|q| q.id != expiring));
    assert!(h.session.selected().is_none());
    assert_eq!(h.session.state(&expiring), Some(QuoteState::Expired));

    h.session.selectable_quotes().await;
    match events.try_recv() {
        Ok(SessionEvent::QuoteExpired { quote_id, .. }) => assert_eq!(quote_id, expiring),
        other => panic!("expected expiry event, got {other:?}"),
    }
    assert!(events.try_recv().is_err());
    assert_eq!(h.fixtures[0].closed_quotes(), vec![expiring]);
}

#[tokio::test]
async fn test_approve_expired_quote_is_refused() {
    let mut h = harness(vec![swap("changenow", QuoteTemplate::fixed(dec!(15)).expires_in(5_000))]);
    h.session.refresh().await.unwrap();
    h.clock.advance(ChronoDuration::seconds(6));

    let err = h.session.approve().await.unwrap_err();
    assert!(matches!(err, QuoteError::QuoteExpired { .. }));
    assert!(h.fixtures[0].approved_quotes().is_empty());
}

#[tokio::test]
async fn test_approve_closes_quote() {
    let mut h = harness(vec![swap("changenow", QuoteTemplate::fixed(dec!(15)))]);
    h.session.refresh().await.unwrap();
    let id = h.session.selected().unwrap().id;

    let receipt = h.session.approve().await.unwrap();
    assert_eq!(receipt.quote_id, id);
    assert_eq!(h.session.state(&id), Some(QuoteState::Approved));
    assert_eq!(h.fixtures[0].approved_quotes(), vec![id]);
    assert_eq!(h.fixtures[0].closed_quotes(), vec![id]);

    assert!(matches!(
        h.session.approve().await,
        Err(QuoteError::QuoteAlreadyApproved(_))
    ));
}

#[tokio::test]
async fn test_failed_approval_still_closes() {
    let mut h = harness(vec![swap("changenow", QuoteTemplate::fixed(dec!(15)))
        .failing_approval(ProviderErrorBody::new(ErrorType::Other).message("kyc required"))]);
    h.session.refresh().await.unwrap();
    let id = h.session.selected().unwrap().id;

    let err = h.session.approve().await.unwrap_err();
    assert!(matches!(err, QuoteError::ApprovalFailed { .. }));
    assert_eq!(h.session.state(&id), Some(QuoteState::Failed));
    assert_eq!(h.fixtures[0].closed_quotes(), vec![id]);
    assert!(h.session.selected().is_none());
}

#[tokio::test]
async fn test_dismiss_releases_everything_and_blocks_reuse() {
    let mut h = harness(vec![
        swap("changenow", QuoteTemplate::fixed(dec!(15))),
        swap("godex", QuoteTemplate::fixed(dec!(14))),
    ]);
    h.session.refresh().await.unwrap();

    h.session.dismiss().await;
    assert_eq!(h.fixtures[0].closed_quotes().len(), 1);
    assert_eq!(h.fixtures[1].closed_quotes().len(), 1);
    assert!(h.session.cancellation_token().is_cancelled());
    assert!(matches!(h.session.refresh().await, Err(QuoteError::Cancelled)));
}

#[tokio::test]
async fn test_refresh_supersedes_stale_quotes() {
    let mut h = harness(vec![swap("changenow", QuoteTemplate::fixed(dec!(15)).expires_in(5_000))]);
    h.session.refresh().await.unwrap();
    let first = h.session.selected().unwrap().id;

    // Past the cached batch's lifetime, so the provider is asked again.
    h.clock.advance(ChronoDuration::seconds(6));
    h.session.refresh().await.unwrap();

    let second = h.session.selected().unwrap().id;
    assert_ne!(first, second);
    assert!(h.session.state(&first).unwrap().is_terminal());
    assert_eq!(h.fixtures[0].fetch_count(), 2);
}

#[tokio::test]
async fn test_cache_hit_keeps_selection() {
    let mut h = harness(vec![
        swap("changenow", QuoteTemplate::fixed(dec!(15)).expires_in(30_000)),
        swap("godex", QuoteTemplate::fixed(dec!(14)).expires_in(30_000)),
    ]);
    h.session.refresh().await.unwrap();
    let chosen = h
        .session
        .ranked()
        .ordered
        .iter()
        .find(|q| q.provider_id == "godex")
        .unwrap()
        .id;
    h.session.select(chosen).await.unwrap();

    h.clock.advance(ChronoDuration::seconds(10));
    h.session.refresh().await.unwrap();

    assert_eq!(h.session.selected().unwrap().id, chosen);
    assert_eq!(h.fixtures[1].fetch_count(), 1);
    // changenow's quote was closed on reselection, so its cache entry is gone.
    assert_eq!(h.fixtures[0].fetch_count(), 2);
}

#[tokio::test]
async fn test_no_offers_and_best_error() {
    let mut h = harness(vec![
        FixtureSpec::new("lifi", "LI.FI", ProviderCapabilities::swap()),
        FixtureSpec::new("godex", "Godex", ProviderCapabilities::swap()),
    ]);
    h.session.refresh().await.unwrap();
    assert!(h.session.is_no_offers());
    assert!(h.session.best_error().is_none());
    assert!(h.session.selected().is_none());

    let mut failing = harness(vec![FixtureSpec::new("banxa", "Banxa", ProviderCapabilities::swap())
        .failing(ProviderErrorBody::limit(ErrorType::OverLimit, dec!(0.1), "BTC"))]);
    failing.session.refresh().await.unwrap();
    assert!(!failing.session.is_no_offers());
    assert!(matches!(
        failing.session.best_error().unwrap().error,
        QuoteError::OverLimit { .. }
    ));
}

#[tokio::test]
async fn test_next_refetch_delay_uses_live_quotes() {
    let mut h = harness(vec![
        swap("changenow", QuoteTemplate::fixed(dec!(15)).expires_in(8_000)),
        swap("godex", QuoteTemplate::fixed(dec!(14))),
    ]);
    assert!(h.session.next_refetch_delay().is_none());

    h.session.refresh().await.unwrap();
    assert_eq!(h.session.next_refetch_delay(), Some(Duration::from_secs(7)));
}

#[tokio::test]
async fn test_drop_releases_live_quotes() {
    let h = harness(vec![swap("changenow", QuoteTemplate::fixed(dec!(15)))]);
    let Harness {
        mut session,
        fixtures,
        ..
    } = h;
    session.refresh().await.unwrap();
    let id = session.selected().unwrap().id;

    drop(session);
    for _ in 0..10 {
        if !fixtures[0].closed_quotes().is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(fixtures[0].closed_quotes(), vec![id]);
}

#[tokio::test]
async fn test_refresh_after_expiry_signals_expired_selection() {
    let mut h = harness(vec![
        swap("changenow", QuoteTemplate::fixed(dec!(15)).expires_in(10_000)),
        swap("godex", QuoteTemplate::fixed(dec!(14))),
    ]);
    let mut events = h.session.take_events().unwrap();
    h.session.refresh().await.unwrap();
    let expiring = h.session.selected().unwrap().id;

    h.clock.advance(ChronoDuration::seconds(11));
    h.session.refresh().await.unwrap();

    assert_eq!(h.session.state(&expiring), Some(QuoteState::Expired));
    match events.try_recv() {
        Ok(SessionEvent::QuoteExpired { quote_id, .. }) => assert_eq!(quote_id, expiring),
        other => panic!("expected expiry event, got {other:?}"),
    }
    assert!(events.try_recv().is_err());

    let fresh = h.session.selected().unwrap();
    assert_eq!(fresh.provider_id, "changenow");
    assert_ne!(fresh.id, expiring);
}

#[tokio::test]
async fn test_cancelled_fetch_does_not_end_session() {
    let mut h = harness(vec![swap("changenow", QuoteTemplate::fixed(dec!(15)))]);

    h.session.cancellation_token().cancel();
    assert!(matches!(h.session.refresh().await, Err(QuoteError::Cancelled)));
    assert!(!h.session.cancellation_token().is_cancelled());

    h.session.refresh().await.unwrap();
    assert_eq!(h.session.selected().unwrap().provider_id, "changenow");
}

#[tokio::test]
async fn test_approved_quote_is_not_offered_as_best() {
    let mut h = harness(vec![swap("changenow", QuoteTemplate::fixed(dec!(15)))]);
    h.session.refresh().await.unwrap();
    let id = h.session.selected().unwrap().id;

    h.session.approve().await.unwrap();
    assert_eq!(h.session.selected().unwrap().id, id);
    assert!(h.session.best().is_none());
    assert!(h.session.selectable_quotes().await.is_empty());
}
