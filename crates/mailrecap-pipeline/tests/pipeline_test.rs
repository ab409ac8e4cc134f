mod common;

use common::{active_user, harness, harness_with, mail_message, stored_log, ts};
use mailrecap_persist::Direction;
use mailrecap_pipeline::{Outcome, SkipReason};

const USER: &str = "user@example.com";

#[tokio::test]
async fn happy_path_persists_one_summary() {
    let h = harness(active_user(USER, "mock"));
    h.script
        .set_latest(mail_message("m1", "t1", 5, &["INBOX"]));

    let outcome = h.orchestrator.process_event(USER, "h-1").await;

    assert!(matches!(outcome, Outcome::Done { ref message_id } if message_id == "m1"));
    assert_eq!(h.summarizer.call_count(), 1);

    let logs = h.logs.all();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].message_id, "m1");
    assert_eq!(logs[0].summary, "a concise summary");
    assert_eq!(logs[0].ai_provider, "mock");
    assert_eq!(logs[0].direction, Direction::Inbound);
    assert_eq!(logs[0].timestamp, ts(5));
}

#[tokio::test]
async fn repeated_notification_is_idempotent() {
    let h = harness(active_user(USER, "mock"));
    h.script
        .set_latest(mail_message("m1", "t1", 5, &["INBOX"]));

    let first = h.orchestrator.process_event(USER, "h-1").await;
    let second = h.orchestrator.process_event(USER, "h-2").await;

    assert!(matches!(first, Outcome::Done { .. }));
    assert!(matches!(
        second,
        Outcome::Skipped(SkipReason::DuplicateMessage)
    ));
    assert_eq!(h.logs.count_for_message("m1"), 1);
    assert_eq!(h.summarizer.call_count(), 1);
}

#[tokio::test]
async fn persisted_log_blocks_reprocessing_across_restarts() {
    // Fresh tracker (as after a restart), but the log row already exists.
    let h = harness(active_user(USER, "mock"));
    h.logs.seed(vec![stored_log("m1", "t1", 0)]);
    h.script
        .set_latest(mail_message("m1", "t1", 0, &["INBOX"]));

    let outcome = h.orchestrator.process_event(USER, "h-1").await;

    assert!(matches!(
        outcome,
        Outcome::Skipped(SkipReason::DuplicateMessage)
    ));
    assert_eq!(h.summarizer.call_count(), 0);
    assert_eq!(h.logs.count_for_message("m1"), 1);
}

#[tokio::test]
async fn unknown_user_is_skipped_before_any_fetch() {
    let h = harness(active_user(USER, "mock"));
    h.script
        .set_latest(mail_message("m1", "t1", 5, &["INBOX"]));

    let outcome = h.orchestrator.process_event("stranger@example.com", "h-1").await;

    assert!(matches!(outcome, Outcome::Skipped(SkipReason::UnknownUser)));
    assert_eq!(h.summarizer.call_count(), 0);
    assert!(h.logs.all().is_empty());
}

#[tokio::test]
async fn inactive_user_is_skipped() {
    let mut user = active_user(USER, "mock");
    user.is_active = false;
    let h = harness(user);
    h.script
        .set_latest(mail_message("m1", "t1", 5, &["INBOX"]));

    let outcome = h.orchestrator.process_event(USER, "h-1").await;

    assert!(matches!(outcome, Outcome::Skipped(SkipReason::InactiveUser)));
    assert_eq!(h.summarizer.call_count(), 0);
    assert!(h.logs.all().is_empty());
}

#[tokio::test]
async fn mail_predating_activation_is_skipped() {
    let mut user = active_user(USER, "mock");
    user.last_started_at = Some(ts(10));
    let h = harness(user);
    h.script
        .set_latest(mail_message("m1", "t1", 5, &["INBOX"]));

    let outcome = h.orchestrator.process_event(USER, "h-1").await;

    assert!(matches!(outcome, Outcome::Skipped(SkipReason::StaleMessage)));
    assert_eq!(h.summarizer.call_count(), 0);
    assert!(h.logs.all().is_empty());
}

#[tokio::test]
async fn drafts_are_never_summarized() {
    let h = harness(active_user(USER, "mock"));
    h.script
        .set_latest(mail_message("m1", "t1", 5, &["DRAFT"]));

    let outcome = h.orchestrator.process_event(USER, "h-1").await;

    assert!(matches!(outcome, Outcome::Skipped(SkipReason::Draft)));
    assert_eq!(h.summarizer.call_count(), 0);
    assert!(h.logs.all().is_empty());
}

#[tokio::test]
async fn skipped_draft_can_still_be_processed_later() {
    // A draft skip is not a terminal state for the message ID: once the
    // message loses the draft label it goes through normally.
    let h = harness(active_user(USER, "mock"));
    h.script
        .set_latest(mail_message("m1", "t1", 5, &["DRAFT"]));
    let first = h.orchestrator.process_event(USER, "h-1").await;
    assert!(matches!(first, Outcome::Skipped(SkipReason::Draft)));

    h.script
        .set_latest(mail_message("m1", "t1", 5, &["INBOX"]));
    let second = h.orchestrator.process_event(USER, "h-2").await;

    assert!(matches!(second, Outcome::Done { .. }));
    assert_eq!(h.logs.count_for_message("m1"), 1);
}

#[tokio::test]
async fn sent_label_records_outbound_direction() {
    let h = harness(active_user(USER, "mock"));
    h.script
        .set_latest(mail_message("m1", "t1", 5, &["SENT"]));

    let outcome = h.orchestrator.process_event(USER, "h-1").await;

    assert!(matches!(outcome, Outcome::Done { .. }));
    assert_eq!(h.logs.all()[0].direction, Direction::Outbound);
}

#[tokio::test]
async fn provider_failure_persists_error_sentinel() {
    let h = harness_with(active_user(USER, "mock"), true, false);
    h.script
        .set_latest(mail_message("m1", "t1", 5, &["INBOX"]));

    let outcome = h.orchestrator.process_event(USER, "h-1").await;

    // A failed AI call is still a completed run: the sentinel is persisted
    // and the message never gets retried.
    assert!(matches!(outcome, Outcome::Done { .. }));
    let logs = h.logs.all();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].summary.starts_with("[mock error]:"));
    assert!(logs[0].summary.contains("quota exceeded"));

    let again = h.orchestrator.process_event(USER, "h-2").await;
    assert!(matches!(
        again,
        Outcome::Skipped(SkipReason::DuplicateMessage)
    ));
}

#[tokio::test]
async fn unregistered_provider_persists_sentinel() {
    let h = harness(active_user(USER, "claude"));
    h.script
        .set_latest(mail_message("m1", "t1", 5, &["INBOX"]));

    let outcome = h.orchestrator.process_event(USER, "h-1").await;

    assert!(matches!(outcome, Outcome::Done { .. }));
    let logs = h.logs.all();
    assert_eq!(logs[0].summary, "[claude error]: provider not registered");
    assert_eq!(h.summarizer.call_count(), 0);
}

#[tokio::test]
async fn failed_credential_refresh_skips_event() {
    let h = harness_with(active_user(USER, "mock"), false, true);

    let outcome = h.orchestrator.process_event(USER, "h-1").await;

    assert!(matches!(
        outcome,
        Outcome::Skipped(SkipReason::CredentialRefresh)
    ));
    assert!(h.logs.all().is_empty());
}

#[tokio::test]
async fn empty_mailbox_skips_event() {
    let h = harness(active_user(USER, "mock"));

    let outcome = h.orchestrator.process_event(USER, "h-1").await;

    assert!(matches!(outcome, Outcome::Skipped(SkipReason::EmptyMailbox)));
    assert_eq!(h.summarizer.call_count(), 0);
}
