//! Who hears about what, after each committed transition

mod common;

use common::TestEngine;
use std::time::Duration;
use ticketline_core::application::{Subscription, SubscriptionTarget};
use ticketline_core::domain::DispatchEvent;
use ticketline_core::AppError;

const QUIET: Duration = Duration::from_millis(50);

async fn next(sub: &mut Subscription) -> DispatchEvent {
    tokio::time::timeout(Duration::from_secs(1), sub.recv())
        .await
        .expect("event expected")
        .expect("mailbox open")
}

async fn assert_quiet(sub: &mut Subscription) {
    assert!(
        tokio::time::timeout(QUIET, sub.recv()).await.is_err(),
        "no event expected"
    );
}

#[tokio::test]
async fn test_take_ticket_reaches_counters_only() {
    let t = TestEngine::in_memory().await;
    let counter = t.counter("1").await;
    let mut display = t.engine.subscribe(SubscriptionTarget::Display).await.unwrap();
    let mut desk = t
        .engine
        .subscribe(SubscriptionTarget::Counter(counter))
        .await
        .unwrap();

    t.engine.take_ticket(None).await.unwrap();

    match next(&mut desk).await {
        DispatchEvent::TicketAdded(data) => assert_eq!(data.waiting_count, 1),
        other => panic!("unexpected event {:?}", other),
    }
    assert_quiet(&mut display).await;
}

#[tokio::test]
async fn test_call_next_announces_on_display() {
    let t = TestEngine::in_memory().await;
    let counter = t.counter("3").await;
    t.take(2).await;

    let mut display = t.engine.subscribe(SubscriptionTarget::Display).await.unwrap();
    let mut desk = t
        .engine
        .subscribe(SubscriptionTarget::Counter(counter))
        .await
        .unwrap();

    t.engine.call_next(counter, None).await.unwrap();

    match next(&mut display).await {
        DispatchEvent::TicketCalled(data) => {
            assert_eq!(data.ticket_number, "A001");
            assert_eq!(data.counter_id, counter);
            assert_eq!(data.counter_number, "3");
            assert_eq!(data.counter_name, "Counter 3");
        }
        other => panic!("unexpected event {:?}", other),
    }
    match next(&mut desk).await {
        DispatchEvent::CounterUpdated(data) => {
            assert_eq!(data.counter_id, counter);
            assert_eq!(data.current_ticket.as_deref(), Some("A001"));
            assert_eq!(data.waiting_count, 1);
        }
        other => panic!("unexpected event {:?}", other),
    }

    // Display subscribers never see counter bookkeeping
    t.engine.complete(counter).await.unwrap();
    assert!(matches!(next(&mut desk).await, DispatchEvent::CounterUpdated(_)));
    assert_quiet(&mut display).await;
}

#[tokio::test]
async fn test_empty_queue_without_release_publishes_nothing() {
    let t = TestEngine::in_memory().await;
    let counter = t.counter("1").await;
    let mut display = t.engine.subscribe(SubscriptionTarget::Display).await.unwrap();
    let mut desk = t
        .engine
        .subscribe(SubscriptionTarget::Counter(counter))
        .await
        .unwrap();

    t.engine.call_next(counter, None).await.unwrap();

    assert_quiet(&mut desk).await;
    assert_quiet(&mut display).await;
}

#[tokio::test]
async fn test_recall_repeats_display_announcement() {
    let t = TestEngine::in_memory().await;
    let counter = t.counter("1").await;
    t.take(1).await;
    t.engine.call_next(counter, None).await.unwrap();

    let mut display = t.engine.subscribe(SubscriptionTarget::Display).await.unwrap();
    t.engine.recall(counter).await.unwrap();

    match next(&mut display).await {
        DispatchEvent::TicketCalled(data) => assert_eq!(data.ticket_number, "A001"),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_reset_reaches_display_and_counters() {
    let t = TestEngine::in_memory().await;
    let counter = t.counter("1").await;
    t.take(3).await;

    let mut display = t.engine.subscribe(SubscriptionTarget::Display).await.unwrap();
    let mut desk = t
        .engine
        .subscribe(SubscriptionTarget::Counter(counter))
        .await
        .unwrap();

    t.engine.reset_today(None).await.unwrap();

    for sub in [&mut display, &mut desk] {
        match next(sub).await {
            DispatchEvent::QueueReset(data) => {
                assert_eq!(data.queue_type, None);
                assert_eq!(data.affected, 3);
                assert_eq!(data.waiting_count, 0);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_sweep_notifies_counters() {
    let t = TestEngine::in_memory().await;
    let counter = t.counter("1").await;
    t.take(1).await;
    let mut desk = t
        .engine
        .subscribe(SubscriptionTarget::Counter(counter))
        .await
        .unwrap();

    t.clock.advance(48 * common::HOUR_MS);
    let cancelled = t
        .engine
        .auto_cancel_stale(Duration::from_secs(24 * 3600))
        .await
        .unwrap();
    assert_eq!(cancelled, 1);

    match next(&mut desk).await {
        DispatchEvent::CounterUpdated(data) => {
            assert_eq!(data.counter_id, 0);
            assert_eq!(data.waiting_count, 0);
        }
        other => panic!("unexpected event {:?}", other),
    }

    // Nothing stale left, nothing published
    t.engine
        .auto_cancel_stale(Duration::from_secs(24 * 3600))
        .await
        .unwrap();
    assert_quiet(&mut desk).await;
}

#[tokio::test]
async fn test_subscribing_to_unknown_counter_fails() {
    let t = TestEngine::in_memory().await;
    let err = t
        .engine
        .subscribe(SubscriptionTarget::Counter(99))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(t.engine.hub().counter_subscribers(99), 0);
}
