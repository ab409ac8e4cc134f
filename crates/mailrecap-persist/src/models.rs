use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved `ai_provider` value for log rows synthesized to fill context gaps.
///
/// Backfill rows carry a raw snippet instead of a real summary and are
/// excluded from user-facing log queries.
pub const BACKFILL_PROVIDER: &str = "system-backfill";

/// Whether a mail message was received by or sent from the user's mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default = "default_ai_provider")]
    pub ai_provider: String,
    /// How many prior thread messages to include when composing the
    /// summarization prompt.
    #[serde(default = "default_context_depth")]
    pub context_depth: usize,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            ai_provider: default_ai_provider(),
            context_depth: default_context_depth(),
        }
    }
}

fn default_ai_provider() -> String {
    "gemini".to_string()
}

fn default_context_depth() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub refresh_token: String,
    #[serde(default)]
    pub is_active: bool,
    /// Set on every inactive -> active transition. Messages older than this
    /// are skipped so a re-activation does not replay backlog mail.
    #[serde(default, with = "opt_bson_datetime")]
    pub last_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub settings: UserSettings,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            refresh_token: refresh_token.into(),
            is_active: false,
            last_started_at: None,
            settings: UserSettings::default(),
            created_at: Utc::now(),
        }
    }
}

/// One processed (or backfilled) mail message.
///
/// Append-only: at most one row exists per `message_id`, and rows are never
/// mutated after insertion. `timestamp` is the message's own send/receive
/// time, not the insertion time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailLog {
    pub user_email: String,
    pub message_id: String,
    pub thread_id: String,
    pub sender: String,
    pub subject: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_body: Option<String>,
    pub ai_provider: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
    #[serde(default = "default_direction")]
    pub direction: Direction,
}

impl EmailLog {
    pub fn is_backfill(&self) -> bool {
        self.ai_provider == BACKFILL_PROVIDER
    }
}

fn default_direction() -> Direction {
    Direction::Inbound
}

/// `Option<DateTime<Utc>>` as an optional BSON datetime.
mod opt_bson_datetime {
    use bson::DateTime as BsonDateTime;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(BsonDateTime::from_chrono).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(Option::<BsonDateTime>::deserialize(deserializer)?.map(BsonDateTime::to_chrono))
    }
}
