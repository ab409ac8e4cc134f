use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{GmailError, Result};
use crate::models::{MailMessage, Mailbox, MailboxProvider, MessageRef};
use crate::token::GoogleTokenClient;

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const UNKNOWN_SENDER: &str = "Unknown";
const NO_SUBJECT: &str = "No Subject";

/// Gmail-backed [`MailboxProvider`]: one shared HTTP client, one mailbox
/// session per refresh token.
pub struct GmailProvider {
    http: reqwest::Client,
    tokens: GoogleTokenClient,
}

impl GmailProvider {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> std::result::Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let tokens = GoogleTokenClient::new(http.clone(), client_id, client_secret);
        Ok(Self { http, tokens })
    }
}

#[async_trait]
impl MailboxProvider for GmailProvider {
    async fn connect(&self, refresh_token: &str) -> Result<Box<dyn Mailbox>> {
        let access_token = self.tokens.refresh_access_token(refresh_token).await?;
        Ok(Box::new(GmailMailbox {
            http: self.http.clone(),
            access_token,
        }))
    }
}

pub struct GmailMailbox {
    http: reqwest::Client,
    access_token: String,
}

impl GmailMailbox {
    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let url = format!("{GMAIL_API_BASE}{path_and_query}");
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GmailError::Api { status, body });
        }

        serde_json::from_str(&body).map_err(|e| GmailError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl Mailbox for GmailMailbox {
    async fn latest_message(&self) -> Result<Option<MessageRef>> {
        let listing: ListResponse = self.get_json("/messages?maxResults=1").await?;
        Ok(listing.messages.into_iter().next().map(|m| MessageRef {
            id: m.id,
            thread_id: m.thread_id,
        }))
    }

    async fn message_timestamp(&self, message_id: &str) -> Result<DateTime<Utc>> {
        let raw: RawMessage = self
            .get_json(&format!("/messages/{message_id}?format=minimal"))
            .await?;
        raw.timestamp()
    }

    async fn message(&self, message_id: &str) -> Result<MailMessage> {
        let raw: RawMessage = self.get_json(&format!("/messages/{message_id}")).await?;
        raw.try_into()
    }

    async fn thread(&self, thread_id: &str) -> Result<Vec<MailMessage>> {
        let raw: RawThread = self.get_json(&format!("/threads/{thread_id}")).await?;
        raw.messages.into_iter().map(MailMessage::try_from).collect()
    }
}

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<ListedMessage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListedMessage {
    id: String,
    thread_id: String,
}

#[derive(Deserialize)]
struct RawThread {
    #[serde(default)]
    messages: Vec<RawMessage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    id: String,
    thread_id: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    label_ids: Vec<String>,
    internal_date: Option<String>,
    payload: Option<RawPayload>,
}

#[derive(Deserialize)]
struct RawPayload {
    #[serde(default)]
    headers: Vec<RawHeader>,
}

#[derive(Deserialize)]
struct RawHeader {
    name: String,
    value: String,
}

impl RawMessage {
    fn header(&self, name: &str) -> Option<&str> {
        self.payload.as_ref().and_then(|payload| {
            payload
                .headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(name))
                .map(|h| h.value.as_str())
        })
    }

    fn timestamp(&self) -> Result<DateTime<Utc>> {
        let millis = self
            .internal_date
            .as_deref()
            .ok_or_else(|| GmailError::Malformed(format!("message {} has no internalDate", self.id)))?
            .parse::<i64>()
            .map_err(|e| GmailError::Malformed(format!("bad internalDate: {e}")))?;

        DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| GmailError::Malformed(format!("internalDate {millis} out of range")))
    }
}

impl TryFrom<RawMessage> for MailMessage {
    type Error = GmailError;

    fn try_from(raw: RawMessage) -> Result<Self> {
        let timestamp = raw.timestamp()?;
        let sender = raw.header("From").unwrap_or(UNKNOWN_SENDER).to_string();
        let subject = raw.header("Subject").unwrap_or(NO_SUBJECT).to_string();

        Ok(Self {
            id: raw.id,
            thread_id: raw.thread_id,
            sender,
            subject,
            snippet: raw.snippet,
            labels: raw.label_ids,
            timestamp,
        })
    }
}
