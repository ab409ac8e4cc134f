use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Direction, EmailLog, User};

/// User record access.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by email address (the primary identity).
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Create or replace the user record keyed by email.
    async fn upsert(&self, user: &User) -> Result<()>;

    /// Flip the processing toggle. `last_started_at` is recorded when the
    /// user transitions to active so that older mail can be age-gated.
    async fn set_active(
        &self,
        email: &str,
        is_active: bool,
        last_started_at: Option<DateTime<Utc>>,
    ) -> Result<()>;
}

/// Append-only email log access.
#[async_trait]
pub trait EmailLogStore: Send + Sync {
    /// Look up a log by its mail-provider message ID. This is the
    /// authoritative duplicate check.
    async fn find_by_message_id(&self, message_id: &str) -> Result<Option<EmailLog>>;

    /// Insert a batch of logs. A duplicate `message_id` in the batch is a
    /// no-op, not an error, so a losing racer cannot double-log a message.
    async fn insert_many(&self, logs: &[EmailLog]) -> Result<()>;

    /// Logs for one conversation thread, ascending by message timestamp.
    async fn thread_logs(&self, thread_id: &str, limit: i64) -> Result<Vec<EmailLog>>;

    /// A user's logs for dashboard display, newest first. Backfill rows are
    /// excluded.
    async fn user_logs(
        &self,
        email: &str,
        limit: i64,
        direction: Option<Direction>,
    ) -> Result<Vec<EmailLog>>;
}
