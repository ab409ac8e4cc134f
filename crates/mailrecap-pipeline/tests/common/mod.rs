#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use mailrecap_gmail::{GmailError, MailMessage, Mailbox, MailboxProvider, MessageRef};
use mailrecap_llm::{Summarizer, SummarizerRegistry};
use mailrecap_persist::{Direction, EmailLog, EmailLogStore, User, UserStore};
use mailrecap_pipeline::{Orchestrator, PromptCompositor, DEFAULT_TEMPLATE};

pub fn ts(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minute)
}

pub fn active_user(email: &str, provider: &str) -> User {
    let mut user = User::new(email, "refresh-token");
    user.is_active = true;
    user.settings.ai_provider = provider.to_string();
    user
}

pub fn mail_message(id: &str, thread_id: &str, minute: i64, labels: &[&str]) -> MailMessage {
    MailMessage {
        id: id.to_string(),
        thread_id: thread_id.to_string(),
        sender: format!("{id}@example.com"),
        subject: format!("subject {id}"),
        snippet: format!("snippet {id}"),
        labels: labels.iter().map(|l| l.to_string()).collect(),
        timestamp: ts(minute),
    }
}

pub fn stored_log(message_id: &str, thread_id: &str, minute: i64) -> EmailLog {
    EmailLog {
        user_email: "user@example.com".to_string(),
        message_id: message_id.to_string(),
        thread_id: thread_id.to_string(),
        sender: format!("{message_id}@example.com"),
        subject: "subject".to_string(),
        summary: format!("summary of {message_id}"),
        full_body: None,
        ai_provider: "gemini".to_string(),
        timestamp: ts(minute),
        direction: Direction::Inbound,
    }
}

// ============================================================================
// IN-MEMORY STORES
// ============================================================================

#[derive(Default)]
pub struct MemoryUsers {
    users: Mutex<HashMap<String, User>>,
}

impl MemoryUsers {
    pub fn with_user(user: User) -> Arc<Self> {
        let store = Self::default();
        store
            .users
            .lock()
            .unwrap()
            .insert(user.email.clone(), user);
        Arc::new(store)
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn find_by_email(&self, email: &str) -> mailrecap_persist::Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(email).cloned())
    }

    async fn upsert(&self, user: &User) -> mailrecap_persist::Result<()> {
        self.users
            .lock()
            .unwrap()
            .insert(user.email.clone(), user.clone());
        Ok(())
    }

    async fn set_active(
        &self,
        email: &str,
        is_active: bool,
        last_started_at: Option<DateTime<Utc>>,
    ) -> mailrecap_persist::Result<()> {
        if let Some(user) = self.users.lock().unwrap().get_mut(email) {
            user.is_active = is_active;
            if last_started_at.is_some() {
                user.last_started_at = last_started_at;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLogs {
    rows: Mutex<Vec<EmailLog>>,
}

impl MemoryLogs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, logs: Vec<EmailLog>) {
        self.rows.lock().unwrap().extend(logs);
    }

    pub fn all(&self) -> Vec<EmailLog> {
        self.rows.lock().unwrap().clone()
    }

    pub fn count_for_message(&self, message_id: &str) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|log| log.message_id == message_id)
            .count()
    }
}

#[async_trait]
impl EmailLogStore for MemoryLogs {
    async fn find_by_message_id(
        &self,
        message_id: &str,
    ) -> mailrecap_persist::Result<Option<EmailLog>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|log| log.message_id == message_id)
            .cloned())
    }

    async fn insert_many(&self, logs: &[EmailLog]) -> mailrecap_persist::Result<()> {
        // Mirrors the unique message_id index: duplicates are dropped, not
        // errors.
        let mut rows = self.rows.lock().unwrap();
        for log in logs {
            if rows.iter().all(|existing| existing.message_id != log.message_id) {
                rows.push(log.clone());
            }
        }
        Ok(())
    }

    async fn thread_logs(
        &self,
        thread_id: &str,
        limit: i64,
    ) -> mailrecap_persist::Result<Vec<EmailLog>> {
        let mut logs: Vec<EmailLog> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|log| log.thread_id == thread_id)
            .cloned()
            .collect();
        logs.sort_by_key(|log| log.timestamp);
        logs.truncate(limit as usize);
        Ok(logs)
    }

    async fn user_logs(
        &self,
        email: &str,
        limit: i64,
        direction: Option<Direction>,
    ) -> mailrecap_persist::Result<Vec<EmailLog>> {
        let mut logs: Vec<EmailLog> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|log| {
                log.user_email == email
                    && !log.is_backfill()
                    && direction.map_or(true, |d| log.direction == d)
            })
            .cloned()
            .collect();
        logs.sort_by_key(|log| std::cmp::Reverse(log.timestamp));
        logs.truncate(limit as usize);
        Ok(logs)
    }
}

// ============================================================================
// SCRIPTED MAILBOX
// ============================================================================

#[derive(Default)]
pub struct MailScript {
    pub latest: Mutex<Option<MessageRef>>,
    pub messages: Mutex<HashMap<String, MailMessage>>,
    pub thread: Mutex<Vec<MailMessage>>,
    pub fail_thread: AtomicBool,
    pub thread_calls: AtomicUsize,
}

impl MailScript {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script the newest inbox message (and make it fetchable by ID).
    pub fn set_latest(&self, message: MailMessage) {
        *self.latest.lock().unwrap() = Some(MessageRef {
            id: message.id.clone(),
            thread_id: message.thread_id.clone(),
        });
        self.messages
            .lock()
            .unwrap()
            .insert(message.id.clone(), message);
    }

    pub fn set_thread(&self, messages: Vec<MailMessage>) {
        *self.thread.lock().unwrap() = messages;
    }

    pub fn thread_fetches(&self) -> usize {
        self.thread_calls.load(Ordering::SeqCst)
    }
}

pub struct FakeMail {
    pub script: Arc<MailScript>,
    pub fail_connect: bool,
}

impl FakeMail {
    pub fn new(script: Arc<MailScript>) -> Arc<Self> {
        Arc::new(Self {
            script,
            fail_connect: false,
        })
    }

    pub fn failing_connect(script: Arc<MailScript>) -> Arc<Self> {
        Arc::new(Self {
            script,
            fail_connect: true,
        })
    }
}

#[async_trait]
impl MailboxProvider for FakeMail {
    async fn connect(&self, _refresh_token: &str) -> mailrecap_gmail::Result<Box<dyn Mailbox>> {
        if self.fail_connect {
            return Err(GmailError::TokenRefresh("invalid_grant".to_string()));
        }
        Ok(Box::new(ScriptedMailbox {
            script: Arc::clone(&self.script),
        }))
    }
}

struct ScriptedMailbox {
    script: Arc<MailScript>,
}

#[async_trait]
impl Mailbox for ScriptedMailbox {
    async fn latest_message(&self) -> mailrecap_gmail::Result<Option<MessageRef>> {
        Ok(self.script.latest.lock().unwrap().clone())
    }

    async fn message_timestamp(
        &self,
        message_id: &str,
    ) -> mailrecap_gmail::Result<DateTime<Utc>> {
        self.script
            .messages
            .lock()
            .unwrap()
            .get(message_id)
            .map(|m| m.timestamp)
            .ok_or_else(|| GmailError::Malformed(format!("no scripted message {message_id}")))
    }

    async fn message(&self, message_id: &str) -> mailrecap_gmail::Result<MailMessage> {
        self.script
            .messages
            .lock()
            .unwrap()
            .get(message_id)
            .cloned()
            .ok_or_else(|| GmailError::Malformed(format!("no scripted message {message_id}")))
    }

    async fn thread(&self, _thread_id: &str) -> mailrecap_gmail::Result<Vec<MailMessage>> {
        self.script.thread_calls.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_thread.load(Ordering::SeqCst) {
            return Err(GmailError::Malformed("scripted thread failure".to_string()));
        }
        Ok(self.script.thread.lock().unwrap().clone())
    }
}

// ============================================================================
// COUNTING SUMMARIZER + HARNESS
// ============================================================================

pub struct CountingSummarizer {
    pub calls: AtomicUsize,
    pub fail: bool,
    last_prompt: Mutex<Option<String>>,
}

impl CountingSummarizer {
    pub fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail,
            last_prompt: Mutex::new(None),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> String {
        self.last_prompt.lock().unwrap().clone().unwrap_or_default()
    }
}

#[async_trait]
impl Summarizer for CountingSummarizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn summarize(&self, prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        if self.fail {
            anyhow::bail!("quota exceeded");
        }
        Ok("a concise summary".to_string())
    }
}

pub struct Harness {
    pub users: Arc<MemoryUsers>,
    pub logs: Arc<MemoryLogs>,
    pub script: Arc<MailScript>,
    pub summarizer: Arc<CountingSummarizer>,
    pub orchestrator: Orchestrator,
}

pub fn harness(user: User) -> Harness {
    harness_with(user, false, false)
}

pub fn harness_with(user: User, fail_summarizer: bool, fail_connect: bool) -> Harness {
    let users = MemoryUsers::with_user(user);
    let logs = MemoryLogs::new();
    let script = MailScript::new();
    let mail = if fail_connect {
        FakeMail::failing_connect(Arc::clone(&script))
    } else {
        FakeMail::new(Arc::clone(&script))
    };

    let summarizer = CountingSummarizer::new(fail_summarizer);
    let mut registry = SummarizerRegistry::new();
    registry.register("mock", Arc::clone(&summarizer) as Arc<dyn Summarizer>);

    let orchestrator = Orchestrator::new(
        Arc::clone(&users) as Arc<dyn UserStore>,
        Arc::clone(&logs) as Arc<dyn EmailLogStore>,
        mail,
        Arc::new(registry),
        PromptCompositor::new(DEFAULT_TEMPLATE),
        1000,
    );

    Harness {
        users,
        logs,
        script,
        summarizer,
        orchestrator,
    }
}
