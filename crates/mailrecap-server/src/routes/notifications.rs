use axum::{extract::State, http::StatusCode};
use base64::Engine;
use serde::Deserialize;
use std::sync::Arc;

use crate::state::AppState;

/// Pub/Sub push envelope. Only `message.data` matters; the rest is carried
/// for logging.
#[derive(Debug, Deserialize)]
pub struct PushEnvelope {
    pub message: PushMessage,
    #[serde(default)]
    pub subscription: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub message_id: String,
}

/// The decoded Gmail watch notification. `historyId` arrives as either a
/// JSON number or a string depending on the publisher.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MailNotification {
    email_address: String,
    #[serde(default)]
    history_id: serde_json::Value,
}

/// Pub/Sub push ingress.
///
/// Always acknowledges with 204: a malformed envelope is logged and dropped,
/// never bounced back for redelivery. Each decoded event runs as its own
/// tracked task so the handler returns immediately and shutdown can drain
/// in-flight work.
pub async fn receive(State(state): State<Arc<AppState>>, body: String) -> StatusCode {
    let envelope: PushEnvelope = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(error = %e, "discarding unparseable push envelope");
            return StatusCode::NO_CONTENT;
        }
    };

    let (email_address, history_id) = match decode_notification(&envelope.message.data) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(
                message_id = %envelope.message.message_id,
                subscription = %envelope.subscription,
                error = %e,
                "discarding undecodable push payload"
            );
            return StatusCode::NO_CONTENT;
        }
    };

    let orchestrator = Arc::clone(&state.orchestrator);
    state.events.spawn(async move {
        orchestrator.process_event(&email_address, &history_id).await;
    });

    StatusCode::NO_CONTENT
}

/// Base64-decode and parse `message.data`. Pub/Sub publishes url-safe
/// base64; standard padding variants are accepted too.
fn decode_notification(data: &str) -> anyhow::Result<(String, String)> {
    let bytes = base64::engine::general_purpose::URL_SAFE
        .decode(data)
        .or_else(|_| base64::engine::general_purpose::STANDARD.decode(data))?;

    let notification: MailNotification = serde_json::from_slice(&bytes)?;
    let history_id = match &notification.history_id {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    };
    Ok((notification.email_address, history_id))
}
