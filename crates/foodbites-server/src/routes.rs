//! HTTP surface of the bot.
//!
//! - `GET /webhook`: Meta subscription handshake
//! - `POST /webhook`: inbound notifications, answered 200 straight away and
//!   processed on spawned tasks
//! - `GET /health`: liveness

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use foodbites_channels::webhook::{self, InboundMessage, WebhookNotification};
use foodbites_core::ConversationEngine;
use foodbites_types::errors::BotError;
use foodbites_types::traits::{DeliverySink, MediaFetcher, Transcriber};
use foodbites_types::MediaRef;

/// Shared state of the webhook handlers.
pub struct AppState {
    pub engine: Arc<ConversationEngine>,
    pub sink: Arc<dyn DeliverySink>,
    pub media: Arc<dyn MediaFetcher>,
    /// `None` disables voice notes; senders get the failure notice.
    pub transcriber: Option<Arc<dyn Transcriber>>,
    pub verify_token: String,
    /// Sent when a voice note cannot be downloaded or transcribed.
    pub voice_failure: String,
}

#[derive(Debug, Deserialize)]
struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// GET /webhook
async fn verify_webhook(
    State(state): State<Arc<AppState>>,
    Query(q): Query<VerifyQuery>,
) -> Result<String, StatusCode> {
    match webhook::verify_subscription(
        q.mode.as_deref(),
        q.verify_token.as_deref(),
        q.challenge.as_deref(),
        &state.verify_token,
    ) {
        Some(challenge) => {
            info!("webhook verification successful");
            Ok(challenge)
        }
        None => {
            warn!(mode = ?q.mode, "webhook verification failed");
            Err(StatusCode::FORBIDDEN)
        }
    }
}

/// POST /webhook
///
/// Always 200: Meta retries anything else, and a retried message would be
/// answered twice.
async fn receive_webhook(State(state): State<Arc<AppState>>, body: Bytes) -> StatusCode {
    let notification: WebhookNotification = match serde_json::from_slice(&body) {
        Ok(n) => n,
        Err(e) => {
            warn!(error = %e, size = body.len(), "unparseable webhook body ignored");
            return StatusCode::OK;
        }
    };

    let messages = webhook::extract_messages(&notification);
    if messages.is_empty() {
        debug!("no text message or sender found, skipping event");
        return StatusCode::OK;
    }

    for message in messages {
        tokio::spawn(handle_inbound(state.clone(), message));
    }
    StatusCode::OK
}

/// Turn one webhook message into an engine event and answer it.
async fn handle_inbound(state: Arc<AppState>, message: InboundMessage) {
    let event = match message {
        InboundMessage::Text { from, text } => webhook::text_event(&from, &text),
        InboundMessage::Voice { from, media } => match transcribe_voice(&state, &media).await {
            Ok(transcript) => {
                info!(user = %from, media_id = %media.id, "voice note transcribed");
                webhook::voice_event(&from, &transcript, media)
            }
            Err(e) => {
                error!(user = %from, media_id = %media.id, error = %e, "voice note handling failed");
                if let Err(e) = state.sink.send_text(&from, &state.voice_failure).await {
                    error!(user = %from, error = %e, "failed to send voice failure notice");
                }
                return;
            }
        },
    };

    info!(user = %event.user_id, event_id = %event.id, "inbound message");
    // Failures are logged by the engine.
    if let Ok(sent) = state.engine.process(&event, state.sink.as_ref()).await {
        debug!(user = %event.user_id, sent, "turn complete");
    }
}

async fn transcribe_voice(state: &AppState, media: &MediaRef) -> Result<String, BotError> {
    let transcriber = state.transcriber.as_ref().ok_or_else(|| {
        BotError::Transcription("no transcriber configured".to_string())
    })?;
    let audio = state.media.fetch(&media.id).await?;
    transcriber.transcribe(audio, &media.mime_type).await
}
