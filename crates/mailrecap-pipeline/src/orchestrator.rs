use std::sync::Arc;
use tokio::sync::Mutex;

use mailrecap_gmail::{MailboxProvider, SENT_LABEL};
use mailrecap_llm::SummarizerRegistry;
use mailrecap_persist::{Direction, EmailLog, EmailLogStore, UserStore};

use crate::context::ContextAssembler;
use crate::dedup::DedupTracker;
use crate::dispatch::SummarizeDispatcher;
use crate::error::Result;
use crate::gates::{GateDecision, Gates, SkipReason, UserGate};
use crate::prompt::PromptCompositor;

/// Terminal state of one event run.
#[derive(Debug)]
pub enum Outcome {
    /// A log entry was written for this message.
    Done { message_id: String },
    /// A validation gate (or an expected fetch condition) stopped the run.
    Skipped(SkipReason),
    /// An unexpected error; logged, event dropped. No retry queue.
    Failed(String),
}

/// Sequences one inbound notification through validation, fetch, context
/// assembly, summarization and persistence.
///
/// Side effects are strictly ordered: no AI call before every gate passes,
/// no persistence before summarization completes, and the dedup tracker is
/// updated only at a terminal state (success or explicit duplicate skip).
pub struct Orchestrator {
    logs: Arc<dyn EmailLogStore>,
    mail: Arc<dyn MailboxProvider>,
    gates: Gates,
    assembler: ContextAssembler,
    compositor: PromptCompositor,
    dispatcher: SummarizeDispatcher,
    tracker: Mutex<DedupTracker>,
}

impl Orchestrator {
    pub fn new(
        users: Arc<dyn UserStore>,
        logs: Arc<dyn EmailLogStore>,
        mail: Arc<dyn MailboxProvider>,
        registry: Arc<SummarizerRegistry>,
        compositor: PromptCompositor,
        tracker_capacity: usize,
    ) -> Self {
        Self {
            gates: Gates::new(users, Arc::clone(&logs)),
            assembler: ContextAssembler::new(Arc::clone(&logs)),
            logs,
            mail,
            compositor,
            dispatcher: SummarizeDispatcher::new(registry),
            tracker: Mutex::new(DedupTracker::new(tracker_capacity)),
        }
    }

    /// The sole entry point for inbound notifications. Idempotent with
    /// respect to already-logged message IDs and never returns an error to
    /// its caller; every failure is converted to an [`Outcome`] and logged.
    ///
    /// `history_id` is accepted but not replayed: only the single newest
    /// inbox message is fetched, trusting the one-notification-per-change
    /// cadence of the push subscription.
    pub async fn process_event(&self, email_address: &str, history_id: &str) -> Outcome {
        tracing::info!(email = email_address, history_id, "event received");

        let outcome = match self.run(email_address).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(email = email_address, error = %e, "event processing failed");
                Outcome::Failed(e.to_string())
            }
        };

        match &outcome {
            Outcome::Done { message_id } => {
                tracing::info!(email = email_address, message_id, "summary persisted");
            }
            Outcome::Skipped(reason) => {
                tracing::info!(email = email_address, %reason, "event skipped");
            }
            Outcome::Failed(_) => {}
        }
        outcome
    }

    async fn run(&self, email_address: &str) -> Result<Outcome> {
        // VALIDATING: gate 1 (user active).
        let user = match self.gates.user_active(email_address).await? {
            UserGate::Active(user) => user,
            UserGate::Skip(reason) => return Ok(Outcome::Skipped(reason)),
        };

        // FETCHING: open the mailbox and locate the newest message.
        let mailbox = match self.mail.connect(&user.refresh_token).await {
            Ok(mailbox) => mailbox,
            Err(e) => {
                tracing::warn!(email = email_address, error = %e, "mailbox connect failed");
                return Ok(Outcome::Skipped(SkipReason::CredentialRefresh));
            }
        };
        let Some(message_ref) = mailbox.latest_message().await? else {
            return Ok(Outcome::Skipped(SkipReason::EmptyMailbox));
        };
        let message_time = mailbox.message_timestamp(&message_ref.id).await?;

        // VALIDATING: gates 2-3 need the fetched timestamp and ID.
        if let GateDecision::Skip(reason) = Gates::message_age(&user, message_time) {
            return Ok(Outcome::Skipped(reason));
        }
        if let GateDecision::Skip(reason) = self
            .gates
            .not_duplicate(&self.tracker, &message_ref.id)
            .await?
        {
            return Ok(Outcome::Skipped(reason));
        }

        // FETCHING: full message for headers, snippet and labels.
        let message = mailbox.message(&message_ref.id).await?;

        // VALIDATING: gate 4 (draft exclusion).
        if let GateDecision::Skip(reason) = Gates::not_draft(&message.labels) {
            return Ok(Outcome::Skipped(reason));
        }

        tracing::debug!(
            email = email_address,
            sender = %message.sender,
            thread_id = %message_ref.thread_id,
            "processing message"
        );

        // CONTEXTING: never fails the pipeline on provider errors.
        let context = self
            .assembler
            .build_context(
                mailbox.as_ref(),
                &message_ref.thread_id,
                email_address,
                &message_ref.id,
                user.settings.context_depth,
            )
            .await?;

        // SUMMARIZING: dispatcher converts provider failures to sentinels.
        let prompt = self.compositor.compose(&context, &message.snippet);
        let provider = user.settings.ai_provider.clone();
        let summary = self.dispatcher.summarize(&provider, &prompt).await;

        // PERSISTING.
        let direction = if message.labels.iter().any(|label| label == SENT_LABEL) {
            Direction::Outbound
        } else {
            Direction::Inbound
        };
        let entry = EmailLog {
            user_email: email_address.to_string(),
            message_id: message_ref.id.clone(),
            thread_id: message_ref.thread_id.clone(),
            sender: message.sender,
            subject: message.subject,
            summary,
            full_body: None,
            ai_provider: provider,
            timestamp: message_time,
            direction,
        };
        self.logs
            .insert_many(std::slice::from_ref(&entry))
            .await?;

        // Terminal state reached; only now is the tracker updated.
        self.tracker.lock().await.mark_processed(&message_ref.id);

        Ok(Outcome::Done {
            message_id: message_ref.id,
        })
    }
}
