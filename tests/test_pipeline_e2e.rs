//! End-to-end pipeline scenarios: chat text in, reply out.

mod common;

use std::sync::atomic::Ordering;

use common::*;

use panelbot::store::{CommandStore, CooldownStore};
use panelbot::types::{CommandKind, CommandStatus, InboundMessage, PendingInput, Platform};

#[tokio::test]
async fn refill_on_claimed_completed_order_submits_once() {
    let h = harness(MockPanel::completed());
    seed_claimed_completed_order(&h.store, "12345");
    register_alice(&h.store);

    let reply = h
        .pipeline
        .handle_message(&dm("12345 refill"))
        .await
        .expect("a command message gets a reply");

    assert!(reply.success, "got: {}", reply.text);
    assert!(reply.text.contains("✅ Refill submitted"), "got: {}", reply.text);
    assert_eq!(h.panel.refill_calls.load(Ordering::SeqCst), 1);

    // Exactly one terminal record and one cooldown.
    let records = h
        .store
        .commands_for_order("12345", Some(CommandKind::Refill))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, CommandStatus::Success);
    assert!(h
        .store
        .active_cooldown("12345", CommandKind::Refill, chrono::Utc::now())
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn bulk_status_aggregates_two_results() {
    let h = harness(MockPanel::new(serde_json::json!({
        "status": "In progress",
        "username": "alice",
    })));
    seed_in_progress_order(&h.store, "12345");
    seed_in_progress_order(&h.store, "67890");
    register_alice(&h.store);

    let reply = h
        .pipeline
        .handle_message(&dm("12345,67890 status"))
        .await
        .expect("reply");

    assert!(reply.success, "got: {}", reply.text);
    assert_eq!(reply.results.len(), 2);
    assert!(reply.text.contains("2 orders"));
    assert!(reply.text.contains("Success: 2"));
    assert!(reply.text.contains("Failed: 0"));
    // Status is read-only: no records for either order.
    assert!(h.store.commands_for_order("12345", None).unwrap().is_empty());
    assert!(h.store.commands_for_order("67890", None).unwrap().is_empty());
}

#[tokio::test]
async fn unregistered_sender_is_sent_to_registration() {
    let h = harness(MockPanel::completed());
    seed_in_progress_order(&h.store, "12345");
    // No mapping registered for this sender.

    let reply = h
        .pipeline
        .handle_message(&dm_from("628999", "12345 cancel"))
        .await
        .expect("reply");

    assert!(!reply.success);
    assert!(reply.text.contains("not registered"), "got: {}", reply.text);
    assert_eq!(
        reply.results[0].pending,
        Some(PendingInput::Registration)
    );
    // Nothing was attempted against the panel, nothing recorded.
    assert_eq!(h.panel.cancel_calls.load(Ordering::SeqCst), 0);
    assert!(h.store.commands_for_order("12345", None).unwrap().is_empty());
}

#[tokio::test]
async fn repeat_refill_within_cooldown_is_denied_without_panel_calls() {
    let h = harness(MockPanel::completed());
    seed_claimed_completed_order(&h.store, "12345");
    register_alice(&h.store);

    let first = h
        .pipeline
        .handle_message(&dm("12345 refill"))
        .await
        .expect("reply");
    assert!(first.success);

    let status_calls = h.panel.status_calls.load(Ordering::SeqCst);
    let second = h
        .pipeline
        .handle_message(&dm("12345 refill"))
        .await
        .expect("reply");

    assert!(!second.success);
    assert!(second.text.contains("wait"), "got: {}", second.text);
    assert!(second.text.contains("minute"), "got: {}", second.text);
    // Zero additional panel calls of any kind.
    assert_eq!(h.panel.refill_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.panel.status_calls.load(Ordering::SeqCst), status_calls);
}

#[tokio::test]
async fn mixed_bulk_refill_reports_both_outcomes() {
    let h = harness(MockPanel::completed());
    seed_claimed_completed_order(&h.store, "11100");
    seed_in_progress_order(&h.store, "22200");
    h.panel.script_order(
        "22200",
        serde_json::json!({"status": "In progress", "username": "alice"}),
    );
    register_alice(&h.store);

    let reply = h
        .pipeline
        .handle_message(&dm("11100,22200 refill"))
        .await
        .expect("reply");

    assert!(!reply.success, "one failure marks the reply failed");
    assert!(reply.text.contains("Success: 1"));
    assert!(reply.text.contains("Failed: 1"));
    // Only the completed order reached the panel.
    assert_eq!(h.panel.refill_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn chatter_is_ignored_and_malformed_commands_get_parse_errors() {
    let h = harness(MockPanel::completed());

    // Ordinary chatter: no reply at all.
    assert!(h
        .pipeline
        .handle_message(&dm("good morning, how are you?"))
        .await
        .is_none());

    // Passes the cheap keyword+digits gate but carries no usable order id
    // (the token is longer than any panel id can be).
    let overlong = "9".repeat(60);
    let reply = h
        .pipeline
        .handle_message(&dm(&format!("refill {overlong}")))
        .await
        .expect("parse failures are replied to");
    assert!(!reply.success);
    assert!(reply.text.contains("order ids"), "got: {}", reply.text);
}

#[tokio::test]
async fn account_command_reports_mapping_state() {
    let h = harness(MockPanel::completed());
    register_alice(&h.store);

    let reply = h
        .pipeline
        .handle_message(&dm("account"))
        .await
        .expect("reply");
    assert!(reply.success);
    assert!(reply.text.contains("alice"));

    let unregistered = h
        .pipeline
        .handle_message(&dm_from("628999", "account"))
        .await
        .expect("reply");
    assert!(!unregistered.success);
    assert!(unregistered.text.contains("not registered"));
}

#[tokio::test]
async fn verify_command_routes_before_the_order_pipeline() {
    let h = harness(MockPanel::completed());

    let reply = h
        .pipeline
        .handle_message(&dm("verify TXN-991"))
        .await
        .expect("reply");
    assert!(reply.success);
    assert!(reply.text.contains("TXN-991"));
    // The order pipeline never ran.
    assert_eq!(h.panel.status_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn group_messages_respect_group_policy() {
    let h = harness(MockPanel::completed());
    seed_in_progress_order(&h.store, "12345");
    register_alice(&h.store);

    // Default policy: group_security_mode = verified, order unclaimed.
    let msg = InboundMessage::group(ALICE_PHONE, "group-7", "12345 status", Platform::Telegram);
    let reply = h.pipeline.handle_message(&msg).await.expect("reply");
    assert!(!reply.success);
    assert!(reply.text.contains("claimed"), "got: {}", reply.text);
}
