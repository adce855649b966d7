//! Counter and queue type administration through the engine

mod common;

use common::TestEngine;
use ticketline_core::domain::{CallAction, NewQueueType, QueueTypeUpdate, TicketStatus};
use ticketline_core::port::TicketFilter;
use ticketline_core::AppError;

async fn vip(t: &TestEngine) {
    t.engine
        .create_queue_type(NewQueueType {
            code: "vip".to_string(),
            name: "VIP".to_string(),
            prefix: "V".to_string(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_prefix_change_applies_to_new_tickets_only() {
    let t = TestEngine::in_memory().await;
    vip(&t).await;
    let before = t.engine.take_ticket(Some("vip")).await.unwrap();
    assert_eq!(before.number, "V001");

    let updated = t
        .engine
        .update_queue_type(
            "vip",
            QueueTypeUpdate {
                prefix: Some("P".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.prefix, "P");
    assert_eq!(updated.name, "VIP");

    let after = t.engine.take_ticket(Some("vip")).await.unwrap();
    assert_eq!(after.number, "P001");
    assert_eq!(t.engine.find_ticket(before.id).await.unwrap().number, "V001");
    assert_eq!(t.engine.find_queue_type("vip").await.unwrap().prefix, "P");
}

#[tokio::test]
async fn test_invalid_queue_type_update_is_rejected() {
    let t = TestEngine::in_memory().await;
    vip(&t).await;

    let err = t
        .engine
        .update_queue_type(
            "vip",
            QueueTypeUpdate {
                name: Some("Gold".to_string()),
                prefix: Some("V1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let stored = t.engine.find_queue_type("vip").await.unwrap();
    assert_eq!(stored.name, "VIP");
    assert_eq!(stored.prefix, "V");

    let missing = t
        .engine
        .update_queue_type("gold", QueueTypeUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(missing, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_deleted_queue_type_falls_back_to_default_prefix() {
    let t = TestEngine::in_memory().await;
    vip(&t).await;
    let issued = t.engine.take_ticket(Some("vip")).await.unwrap();

    t.engine.delete_queue_type("vip").await.unwrap();
    assert!(matches!(
        t.engine.find_queue_type("vip").await.unwrap_err(),
        AppError::NotFound(_)
    ));
    assert!(matches!(
        t.engine.delete_queue_type("vip").await.unwrap_err(),
        AppError::NotFound(_)
    ));

    let stored = t.engine.find_ticket(issued.id).await.unwrap();
    assert_eq!(stored.queue_type, "vip");
    assert_eq!(stored.number, "V001");

    let next = t.engine.take_ticket(Some("vip")).await.unwrap();
    assert_eq!(next.number, "A001");
}

#[tokio::test]
async fn test_counter_update_keeps_omitted_fields() {
    let t = TestEngine::in_memory().await;
    let id = t.counter("4").await;

    let renamed = t
        .engine
        .update_counter(id, Some("  Teller 4 "), None)
        .await
        .unwrap();
    assert_eq!(renamed.name, "Teller 4");
    assert!(renamed.active);

    let paused = t.engine.update_counter(id, None, Some(false)).await.unwrap();
    assert_eq!(paused.name, "Teller 4");
    assert!(!paused.active);

    assert!(matches!(
        t.engine.update_counter(id, Some("   "), None).await.unwrap_err(),
        AppError::Validation(_)
    ));
    assert!(matches!(
        t.engine.update_counter(99, Some("x"), None).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_counter_cannot_be_deleted_while_serving() {
    let t = TestEngine::in_memory().await;
    let id = t.counter("1").await;
    t.take(1).await;
    t.engine.call_next(id, None).await.unwrap();

    assert!(matches!(
        t.engine.delete_counter(id).await.unwrap_err(),
        AppError::Conflict(_)
    ));

    t.engine.complete(id).await.unwrap();
    t.engine.delete_counter(id).await.unwrap();
    assert!(t.engine.list_counters().await.unwrap().is_empty());
    assert!(matches!(
        t.engine.delete_counter(id).await.unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_list_tickets_filters_and_pages_newest_first() {
    let t = TestEngine::in_memory().await;
    let counter = t.counter("1").await;
    t.take(5).await;
    t.engine.call_next(counter, None).await.unwrap();

    let waiting = t
        .engine
        .list_tickets(&TicketFilter {
            status: Some(TicketStatus::Waiting),
            ..Default::default()
        })
        .await
        .unwrap();
    let numbers: Vec<_> = waiting.iter().map(|t| t.number.as_str()).collect();
    assert_eq!(numbers, vec!["A005", "A004", "A003", "A002"]);

    let second_page = t
        .engine
        .list_tickets(&TicketFilter {
            limit: Some(2),
            offset: 2,
            ..Default::default()
        })
        .await
        .unwrap();
    let numbers: Vec<_> = second_page.iter().map(|t| t.number.as_str()).collect();
    assert_eq!(numbers, vec!["A003", "A002"]);
}

#[tokio::test]
async fn test_call_history_is_newest_first_and_limited() {
    let t = TestEngine::in_memory().await;
    let counter = t.counter("1").await;
    t.take(2).await;

    t.engine.call_next(counter, None).await.unwrap();
    t.clock.advance(1_000);
    t.engine.recall(counter).await.unwrap();
    t.clock.advance(1_000);
    t.engine.complete(counter).await.unwrap();

    let latest = t.engine.call_history(2).await.unwrap();
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].action, CallAction::Completed);
    assert_eq!(latest[1].action, CallAction::Recalled);
    assert!(latest[0].timestamp > latest[1].timestamp);

    assert_eq!(t.engine.call_history(50).await.unwrap().len(), 3);
}
