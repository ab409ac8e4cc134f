use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

/// Gmail label marking an unsent draft. Drafts are never summarized.
pub const DRAFT_LABEL: &str = "DRAFT";

/// Gmail label marking mail the user sent.
pub const SENT_LABEL: &str = "SENT";

/// Identifier pair returned by a mailbox listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub id: String,
    pub thread_id: String,
}

/// A fully fetched mail message, reduced to the fields the pipeline uses.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub id: String,
    pub thread_id: String,
    pub sender: String,
    pub subject: String,
    pub snippet: String,
    pub labels: Vec<String>,
    /// The message's own internal timestamp (from epoch milliseconds).
    pub timestamp: DateTime<Utc>,
}

impl MailMessage {
    pub fn is_draft(&self) -> bool {
        self.labels.iter().any(|label| label == DRAFT_LABEL)
    }

    pub fn is_sent(&self) -> bool {
        self.labels.iter().any(|label| label == SENT_LABEL)
    }
}

/// A per-user mailbox session, opened with a short-lived access credential.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// The single newest message in the mailbox, if any.
    async fn latest_message(&self) -> Result<Option<MessageRef>>;

    /// The message's internal timestamp, from a minimal-format fetch.
    async fn message_timestamp(&self, message_id: &str) -> Result<DateTime<Utc>>;

    /// Full message fetch: headers, snippet and labels.
    async fn message(&self, message_id: &str) -> Result<MailMessage>;

    /// All messages of a conversation thread, in provider order.
    async fn thread(&self, thread_id: &str) -> Result<Vec<MailMessage>>;
}

/// Opens per-user mailbox sessions from stored refresh tokens.
#[async_trait]
pub trait MailboxProvider: Send + Sync {
    async fn connect(&self, refresh_token: &str) -> Result<Box<dyn Mailbox>>;
}
