//! Ticket numbering: per-prefix, per-day, monotonic

mod common;

use common::{TestEngine, DAY_MS};
use ticketline_core::application::SequencerConfig;
use ticketline_core::domain::{NewQueueType, TicketStatus};

#[tokio::test]
async fn test_first_three_tickets_of_the_day() {
    let t = TestEngine::in_memory().await;

    let numbers = t.take(3).await;
    assert_eq!(numbers, vec!["A001", "A002", "A003"]);

    let first = t.engine.find_ticket(1).await.unwrap();
    assert_eq!(first.status, TicketStatus::Waiting);
    assert_eq!(first.queue_type, "general");
    assert_eq!(first.sequence, 1);
}

#[tokio::test]
async fn test_numbers_stay_monotonic_after_service() {
    let t = TestEngine::in_memory().await;
    let counter = t.counter("1").await;

    t.take(2).await;
    t.engine.call_next(counter, None).await.unwrap();
    t.engine.complete(counter).await.unwrap();

    // Finished tickets still count towards the day's maximum
    let next = t.engine.take_ticket(None).await.unwrap();
    assert_eq!(next.number, "A003");
}

#[tokio::test]
async fn test_numbering_restarts_each_day() {
    let t = TestEngine::in_memory().await;
    assert_eq!(t.take(2).await, vec!["A001", "A002"]);

    t.clock.advance(DAY_MS);
    let tomorrow = t.engine.take_ticket(None).await.unwrap();
    assert_eq!(tomorrow.number, "A001");
    assert!(tomorrow.issued_on > t.engine.find_ticket(1).await.unwrap().issued_on);
}

#[tokio::test]
async fn test_numbering_continues_across_days_without_daily_reset() {
    let t = TestEngine::in_memory_with(SequencerConfig {
        reset_daily: false,
        ..SequencerConfig::default()
    })
    .await;
    t.take(2).await;

    t.clock.advance(DAY_MS);
    assert_eq!(t.engine.take_ticket(None).await.unwrap().number, "A003");
}

#[tokio::test]
async fn test_each_prefix_has_its_own_sequence() {
    let t = TestEngine::in_memory().await;
    t.engine
        .create_queue_type(NewQueueType {
            code: "vip".to_string(),
            name: "VIP".to_string(),
            prefix: "V".to_string(),
        })
        .await
        .unwrap();

    let a1 = t.engine.take_ticket(None).await.unwrap();
    let v1 = t.engine.take_ticket(Some("vip")).await.unwrap();
    let a2 = t.engine.take_ticket(Some("general")).await.unwrap();
    let v2 = t.engine.take_ticket(Some("vip")).await.unwrap();

    assert_eq!(
        [a1.number, v1.number, a2.number, v2.number],
        ["A001", "V001", "A002", "V002"]
    );
}

#[tokio::test]
async fn test_unknown_queue_type_uses_default_prefix() {
    let t = TestEngine::in_memory().await;
    let ticket = t.engine.take_ticket(Some("walk-in")).await.unwrap();
    assert_eq!(ticket.number, "A001");
    assert_eq!(ticket.queue_type, "walk-in");
}

#[tokio::test]
async fn test_configured_width_and_start() {
    let t = TestEngine::in_memory_with(SequencerConfig {
        start_number: 100,
        number_width: 4,
        ..SequencerConfig::default()
    })
    .await;

    assert_eq!(t.take(2).await, vec!["A0100", "A0101"]);
}
