use std::collections::HashSet;
use std::sync::Arc;

use mailrecap_gmail::Mailbox;
use mailrecap_persist::{Direction, EmailLog, EmailLogStore, BACKFILL_PROVIDER};

use crate::error::Result;

/// Returned instead of an empty string when a thread has no usable history;
/// prompt composition must never see a blank context field.
pub const NO_HISTORY: &str = "No previous context available.";

/// How many persisted logs to scan per thread before deciding whether a
/// provider fetch is needed.
const THREAD_SCAN_LIMIT: i64 = 100;

/// Builds the bounded, chronologically ordered digest of prior thread
/// messages, backfilling gaps from the mail provider.
pub struct ContextAssembler {
    logs: Arc<dyn EmailLogStore>,
}

impl ContextAssembler {
    pub fn new(logs: Arc<dyn EmailLogStore>) -> Self {
        Self { logs }
    }

    /// Assemble up to `depth` prior messages for `thread_id`, oldest first.
    ///
    /// If the persisted logs already cover `depth` entries the provider is
    /// not contacted. Otherwise the full thread is fetched and every message
    /// not yet persisted (and not the one currently being processed) is
    /// synthesized into a backfill log, batch-inserted, and merged into the
    /// working set. A provider failure is logged and degrades to
    /// persisted-only context; it never fails the pipeline.
    pub async fn build_context(
        &self,
        mailbox: &dyn Mailbox,
        thread_id: &str,
        user_email: &str,
        current_message_id: &str,
        depth: usize,
    ) -> Result<String> {
        if thread_id.is_empty() {
            return Ok(NO_HISTORY.to_string());
        }

        let mut logs = self.logs.thread_logs(thread_id, THREAD_SCAN_LIMIT).await?;

        if logs.len() >= depth {
            return Ok(format_logs(tail(&logs, depth)));
        }

        if let Err(e) = self
            .backfill(mailbox, thread_id, user_email, current_message_id, &mut logs)
            .await
        {
            tracing::warn!(
                thread_id,
                error = %e,
                "thread backfill failed, continuing with persisted context only"
            );
        }

        Ok(format_logs(tail(&logs, depth)))
    }

    async fn backfill(
        &self,
        mailbox: &dyn Mailbox,
        thread_id: &str,
        user_email: &str,
        current_message_id: &str,
        logs: &mut Vec<EmailLog>,
    ) -> Result<()> {
        let messages = mailbox.thread(thread_id).await?;

        let known: HashSet<&str> = logs.iter().map(|log| log.message_id.as_str()).collect();
        let mut fresh = Vec::new();
        for message in messages {
            if message.id == current_message_id || known.contains(message.id.as_str()) {
                continue;
            }
            fresh.push(EmailLog {
                user_email: user_email.to_string(),
                message_id: message.id,
                thread_id: thread_id.to_string(),
                sender: message.sender,
                subject: message.subject,
                summary: format!("[Backfilled] {}", message.snippet),
                full_body: None,
                ai_provider: BACKFILL_PROVIDER.to_string(),
                timestamp: message.timestamp,
                direction: Direction::Inbound,
            });
        }

        if fresh.is_empty() {
            return Ok(());
        }

        tracing::debug!(thread_id, count = fresh.len(), "backfilling thread context");
        self.logs.insert_many(&fresh).await?;
        logs.extend(fresh);
        logs.sort_by_key(|log| log.timestamp);
        Ok(())
    }
}

fn tail(logs: &[EmailLog], depth: usize) -> &[EmailLog] {
    &logs[logs.len().saturating_sub(depth)..]
}

fn format_logs(logs: &[EmailLog]) -> String {
    if logs.is_empty() {
        return NO_HISTORY.to_string();
    }
    logs.iter()
        .map(|log| {
            format!(
                "[{}] {} said: {}",
                log.timestamp.format("%Y-%m-%d %H:%M"),
                log.sender,
                log.summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
