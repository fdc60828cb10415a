//! Relay loop behavior.

use super::harness::*;
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn events_are_handled_in_arrival_order() {
    let mut harness = TestHarness::new();
    harness.transport.push_events(vec![
        start_from(ALLOWED, "Ada"),
        prompt_from(STRANGER, "hello"),
        plain_message_from(ALLOWED),
    ]);
    harness.transport.push_events(vec![prompt_from(ALLOWED, "")]);

    let result = timeout(Duration::from_millis(300), harness.relay.run()).await;
    assert!(result.is_err(), "relay loop should still be polling");

    let texts = harness.sent_texts();
    assert_eq!(texts.len(), 3);
    assert!(texts[0].starts_with("👋"));
    assert_eq!(texts[1], crate::relay::NO_DATA_TEXT);
    assert_eq!(texts[2], "❌ Error: Prompt is empty");
    assert!(harness.transport.poll_count() > 2);
}

#[tokio::test]
async fn transient_poll_failures_are_survived() {
    let mut harness = TestHarness::new();
    harness.transport.push_failure(502);
    harness.transport.push_failure(502);
    harness.transport.push_events(vec![start_from(ALLOWED, "Ada")]);

    let result = timeout(Duration::from_millis(500), harness.relay.run()).await;
    assert!(result.is_err(), "relay loop should still be polling");

    assert_eq!(harness.sent().len(), 1);
}

#[tokio::test]
async fn rejected_token_stops_the_loop() {
    let mut harness = TestHarness::new();
    harness.transport.push_failure(401);
    harness.transport.push_events(vec![start_from(ALLOWED, "Ada")]);

    let result = timeout(Duration::from_secs(2), harness.relay.run())
        .await
        .expect("loop should stop on its own");
    let err = result.unwrap_err();
    assert!(err.is_fatal());

    // Nothing after the fatal poll is consumed.
    assert!(harness.sent().is_empty());
    assert_eq!(harness.transport.poll_count(), 1);
}
