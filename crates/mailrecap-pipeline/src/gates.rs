use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

use mailrecap_gmail::DRAFT_LABEL;
use mailrecap_persist::{EmailLogStore, User, UserStore};

use crate::dedup::DedupTracker;
use crate::error::Result;

/// Why an event was dropped without producing a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnknownUser,
    InactiveUser,
    StaleMessage,
    DuplicateMessage,
    Draft,
    EmptyMailbox,
    CredentialRefresh,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::UnknownUser => "no user record for this address",
            SkipReason::InactiveUser => "user is inactive",
            SkipReason::StaleMessage => "message predates user activation",
            SkipReason::DuplicateMessage => "message already processed",
            SkipReason::Draft => "message is a draft",
            SkipReason::EmptyMailbox => "mailbox has no messages",
            SkipReason::CredentialRefresh => "credential refresh failed",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    Skip(SkipReason),
}

/// Result of the user-active gate: the user record rides along on a pass so
/// the orchestrator does not re-read it.
pub enum UserGate {
    Active(User),
    Skip(SkipReason),
}

/// The ordered, short-circuiting validation checks. Order is fixed:
/// user-active, message age, not-duplicate, draft exclusion.
pub struct Gates {
    users: Arc<dyn UserStore>,
    logs: Arc<dyn EmailLogStore>,
}

impl Gates {
    pub fn new(users: Arc<dyn UserStore>, logs: Arc<dyn EmailLogStore>) -> Self {
        Self { users, logs }
    }

    /// Gate 1: the event's address must map to an active user.
    pub async fn user_active(&self, email: &str) -> Result<UserGate> {
        match self.users.find_by_email(email).await? {
            None => Ok(UserGate::Skip(SkipReason::UnknownUser)),
            Some(user) if !user.is_active => Ok(UserGate::Skip(SkipReason::InactiveUser)),
            Some(user) => Ok(UserGate::Active(user)),
        }
    }

    /// Gate 2: drop mail older than the user's last activation, so toggling
    /// a user back on does not replay their backlog.
    pub fn message_age(user: &User, message_time: DateTime<Utc>) -> GateDecision {
        match user.last_started_at {
            Some(started) if message_time < started => GateDecision::Skip(SkipReason::StaleMessage),
            _ => GateDecision::Pass,
        }
    }

    /// Gate 3: the persisted log is the authoritative duplicate signal; the
    /// tracker is a cheap first check. Either hit updates the tracker before
    /// returning.
    pub async fn not_duplicate(
        &self,
        tracker: &Mutex<DedupTracker>,
        message_id: &str,
    ) -> Result<GateDecision> {
        let tracker_hit = tracker.lock().await.is_duplicate(message_id);
        let persisted_hit =
            !tracker_hit && self.logs.find_by_message_id(message_id).await?.is_some();

        if tracker_hit || persisted_hit {
            tracker.lock().await.mark_processed(message_id);
            return Ok(GateDecision::Skip(SkipReason::DuplicateMessage));
        }
        Ok(GateDecision::Pass)
    }

    /// Gate 4: drafts are never summarized.
    pub fn not_draft(labels: &[String]) -> GateDecision {
        if labels.iter().any(|label| label == DRAFT_LABEL) {
            GateDecision::Skip(SkipReason::Draft)
        } else {
            GateDecision::Pass
        }
    }
}
