//! Dispatch state machine against SQLite

mod common;

use common::TestEngine;
use std::time::Duration;
use ticketline_core::application::{CallNextOutcome, CounterOutcome};
use ticketline_core::domain::{CallAction, NewQueueType, TicketStatus};
use ticketline_core::port::{TicketFilter, TimeProvider};
use ticketline_core::AppError;

#[tokio::test]
async fn test_call_next_serves_in_fifo_order() {
    let t = TestEngine::in_memory().await;
    let counter = t.counter("1").await;
    t.take(3).await;

    let first = t.engine.call_next(counter, None).await.unwrap();
    let ticket = first.called_ticket().unwrap();
    assert_eq!(ticket.number, "A001");
    assert_eq!(ticket.status, TicketStatus::Called);
    assert_eq!(ticket.counter_id, Some(counter));
    assert_eq!(first.counter().current_ticket, Some(ticket.id));
    assert!(first.released().is_none());

    // Calling again completes A001 and takes A002
    let second = t.engine.call_next(counter, None).await.unwrap();
    assert_eq!(second.called_ticket().unwrap().number, "A002");
    let released = second.released().unwrap();
    assert_eq!(released.number, "A001");
    assert_eq!(released.status, TicketStatus::Completed);
    assert!(released.completed_at.is_some());
}

/// Three visitors, two counters, then the day's general queue is reset
#[tokio::test]
async fn test_two_counter_walkthrough_then_reset() {
    let t = TestEngine::in_memory().await;
    let one = t.counter("1").await;
    let two = t.counter("2").await;
    assert_eq!(t.take(3).await, vec!["A001", "A002", "A003"]);

    let first = t.engine.call_next(one, None).await.unwrap();
    assert_eq!(first.called_ticket().unwrap().number, "A001");
    let second = t.engine.call_next(two, None).await.unwrap();
    assert_eq!(second.called_ticket().unwrap().number, "A002");

    let done = t.engine.complete(one).await.unwrap();
    assert_eq!(done.ticket().unwrap().number, "A001");
    assert_eq!(done.ticket().unwrap().status, TicketStatus::Completed);

    let third = t.engine.call_next(one, None).await.unwrap();
    assert_eq!(third.called_ticket().unwrap().number, "A003");
    assert!(third.released().is_none());

    let empty = t.engine.call_next(one, None).await.unwrap();
    match empty {
        CallNextOutcome::NoWaitingTicket { released, .. } => {
            assert_eq!(released.unwrap().number, "A003");
        }
        other => panic!("expected an empty queue, got {:?}", other),
    }

    // called A001, A002, A003; completed A001, A003
    assert_eq!(t.engine.call_history(100).await.unwrap().len(), 5);

    t.engine
        .create_queue_type(NewQueueType {
            code: "vip".to_string(),
            name: "VIP".to_string(),
            prefix: "V".to_string(),
        })
        .await
        .unwrap();
    let vip = t.engine.take_ticket(Some("vip")).await.unwrap();

    let deleted = t.engine.reset_today(Some("general")).await.unwrap();
    assert_eq!(deleted, 3);

    assert!(t.engine.call_history(100).await.unwrap().is_empty());
    for counter in t.engine.list_counters().await.unwrap() {
        assert_eq!(counter.current_ticket, None, "counter {}", counter.number);
    }

    let remaining = t.engine.list_tickets(&TicketFilter::default()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, vip.id);
    assert_eq!(remaining[0].status, TicketStatus::Waiting);
}

#[tokio::test]
async fn test_empty_queue_clears_counter() {
    let t = TestEngine::in_memory().await;
    let counter = t.counter("1").await;
    t.take(1).await;

    t.engine.call_next(counter, None).await.unwrap();
    let outcome = t.engine.call_next(counter, None).await.unwrap();

    match outcome {
        CallNextOutcome::NoWaitingTicket { counter, released } => {
            assert_eq!(counter.current_ticket, None);
            assert_eq!(counter.last_call_at, None);
            assert_eq!(released.unwrap().status, TicketStatus::Completed);
        }
        other => panic!("expected an empty queue, got {:?}", other),
    }

    let stored = t.engine.list_counters().await.unwrap();
    assert_eq!(stored[0].current_ticket, None);
}

#[tokio::test]
async fn test_empty_queue_on_idle_counter_is_not_an_error() {
    let t = TestEngine::in_memory().await;
    let counter = t.counter("1").await;

    let outcome = t.engine.call_next(counter, None).await.unwrap();
    assert!(matches!(
        outcome,
        CallNextOutcome::NoWaitingTicket { released: None, .. }
    ));
}

#[tokio::test]
async fn test_completed_ticket_is_never_served_again() {
    let t = TestEngine::in_memory().await;
    let one = t.counter("1").await;
    let two = t.counter("2").await;
    t.take(2).await;

    let a1 = t.engine.call_next(one, None).await.unwrap();
    let a1 = a1.called_ticket().unwrap().clone();
    t.engine.complete(one).await.unwrap();

    let next = t.engine.call_next(two, None).await.unwrap();
    assert_eq!(next.called_ticket().unwrap().number, "A002");

    let none = t.engine.call_next(one, None).await.unwrap();
    assert!(none.called_ticket().is_none());
    assert_eq!(
        t.engine.find_ticket(a1.id).await.unwrap().status,
        TicketStatus::Completed
    );
}

#[tokio::test]
async fn test_finishing_twice_is_a_no_op() {
    let t = TestEngine::in_memory().await;
    let counter = t.counter("1").await;
    t.take(1).await;
    t.engine.call_next(counter, None).await.unwrap();

    let first = t.engine.cancel(counter).await.unwrap();
    assert_eq!(first.ticket().unwrap().status, TicketStatus::Cancelled);

    // Nothing held any more; status stays terminal
    assert_eq!(
        t.engine.complete(counter).await.unwrap(),
        CounterOutcome::NoCurrentTicket
    );
    assert_eq!(
        t.engine.recall(counter).await.unwrap(),
        CounterOutcome::NoCurrentTicket
    );
    assert_eq!(
        t.engine.find_ticket(1).await.unwrap().status,
        TicketStatus::Cancelled
    );
}

#[tokio::test]
async fn test_recall_keeps_ticket_and_records_history() {
    let t = TestEngine::in_memory().await;
    let counter = t.counter("1").await;
    t.take(1).await;
    t.engine.call_next(counter, None).await.unwrap();

    let recalled = t.engine.recall(counter).await.unwrap();
    assert_eq!(recalled.ticket().unwrap().status, TicketStatus::Called);
    t.engine.complete(counter).await.unwrap();

    // Newest first
    let actions: Vec<CallAction> = t
        .engine
        .call_history(10)
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    assert_eq!(
        actions,
        vec![CallAction::Completed, CallAction::Recalled, CallAction::Called]
    );
}

#[tokio::test]
async fn test_call_next_filters_by_queue_type() {
    let t = TestEngine::in_memory().await;
    let counter = t.counter("1").await;
    t.engine
        .create_queue_type(NewQueueType {
            code: "vip".to_string(),
            name: "VIP".to_string(),
            prefix: "V".to_string(),
        })
        .await
        .unwrap();

    t.engine.take_ticket(None).await.unwrap();
    t.engine.take_ticket(Some("vip")).await.unwrap();

    let vip = t.engine.call_next(counter, Some("vip")).await.unwrap();
    assert_eq!(vip.called_ticket().unwrap().number, "V001");

    let none = t.engine.call_next(counter, Some("vip")).await.unwrap();
    assert!(none.called_ticket().is_none());
    assert_eq!(t.engine.waiting_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_unknown_counter_is_not_found() {
    let t = TestEngine::in_memory().await;
    t.take(1).await;

    let err = t.engine.call_next(42, None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // The failed call left the queue untouched
    assert_eq!(t.engine.waiting_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_reset_only_touches_the_named_type() {
    let t = TestEngine::in_memory().await;
    let counter = t.counter("1").await;
    t.engine
        .create_queue_type(NewQueueType {
            code: "vip".to_string(),
            name: "VIP".to_string(),
            prefix: "V".to_string(),
        })
        .await
        .unwrap();

    t.engine.take_ticket(None).await.unwrap();
    t.engine.take_ticket(Some("vip")).await.unwrap();
    t.engine.take_ticket(Some("vip")).await.unwrap();
    t.engine.call_next(counter, Some("vip")).await.unwrap();

    let deleted = t.engine.reset_today(Some("vip")).await.unwrap();
    assert_eq!(deleted, 2);

    let remaining = t.engine.list_tickets(&TicketFilter::default()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].number, "A001");

    // The counter held a deleted ticket and is idle again
    let counters = t.engine.list_counters().await.unwrap();
    assert_eq!(counters[0].current_ticket, None);

    // Numbering restarts for the reset prefix only
    assert_eq!(t.engine.take_ticket(Some("vip")).await.unwrap().number, "V001");
    assert_eq!(t.engine.take_ticket(None).await.unwrap().number, "A002");
}

#[tokio::test]
async fn test_stale_tickets_are_cancelled() {
    let t = TestEngine::in_memory().await;
    t.take(2).await;

    t.clock.advance(25 * common::HOUR_MS);
    t.engine.take_ticket(None).await.unwrap();

    let cancelled = t
        .engine
        .auto_cancel_stale(Duration::from_secs(24 * 3600))
        .await
        .unwrap();
    assert_eq!(cancelled, 2);

    let oldest = t.engine.find_ticket(1).await.unwrap();
    assert_eq!(oldest.status, TicketStatus::Cancelled);
    assert_eq!(oldest.completed_at, Some(t.clock.now_millis()));
    assert_eq!(oldest.called_at, None);

    let stats = t.engine.stats_today().await.unwrap();
    assert_eq!(stats.stats.waiting, 1);
}

#[tokio::test]
async fn test_counter_holding_a_ticket_cannot_be_deleted() {
    let t = TestEngine::in_memory().await;
    let counter = t.counter("1").await;
    t.take(1).await;
    t.engine.call_next(counter, None).await.unwrap();

    let err = t.engine.delete_counter(counter).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    t.engine.complete(counter).await.unwrap();
    t.engine.delete_counter(counter).await.unwrap();
    assert!(t.engine.list_counters().await.unwrap().is_empty());

    // Served ticket survives with its counter reference cleared
    let ticket = t.engine.find_ticket(1).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Completed);
    assert_eq!(ticket.counter_id, None);
}
