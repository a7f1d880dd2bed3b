/// Trait contracts for the collaborators of the conversation engine.
///
/// The engine codes against these interfaces, never against a concrete
/// WhatsApp client, LLM vendor or storage backend. Every trait lives here in
/// `foodbites-types` so that all crates can depend on them without circular
/// dependencies, and so tests can swap in fakes with no network access.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::BotError;
use crate::models::*;

// ============================================================
// Session Storage
// ============================================================

/// Per-user session storage with expiry.
///
/// Backends may be process memory (single instance) or an external store
/// (multi-instance). The engine must not assume either.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the state for a user.
    ///
    /// Returns a fresh default state when the user is unknown or the stored
    /// state has expired. Only backend unavailability is an error.
    async fn get(&self, user_id: &str) -> Result<SessionState, BotError>;

    /// Upsert the state for a user and reset its expiry to `ttl` from now.
    async fn put(
        &self,
        user_id: &str,
        state: &SessionState,
        ttl: std::time::Duration,
    ) -> Result<(), BotError>;
}

// ============================================================
// Channel Traits
// ============================================================

/// Outbound delivery to a messaging channel.
///
/// Each call is fire-and-forget from the router's perspective; the sink logs
/// or reports failures but never alters the content.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Send a plain text message.
    async fn send_text(&self, to: &str, body: &str) -> Result<(), BotError>;

    /// Send a prompt with up to three quick-reply buttons.
    async fn send_buttons(&self, to: &str, prompt: &str, labels: &[String])
        -> Result<(), BotError>;

    /// Send an image by URL or media id, with caption.
    async fn send_image(&self, to: &str, media: &str, caption: &str) -> Result<(), BotError>;

    /// Dispatch a channel-agnostic payload to the matching sender.
    async fn deliver(&self, to: &str, payload: &OutboundPayload) -> Result<(), BotError> {
        match payload {
            OutboundPayload::Text { body } => self.send_text(to, body).await,
            OutboundPayload::Buttons { prompt, labels } => {
                self.send_buttons(to, prompt, labels).await
            }
            OutboundPayload::Image { media, caption } => {
                self.send_image(to, media, caption).await
            }
        }
    }
}

/// Downloads media attached to inbound messages.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch the raw bytes of a media object by its channel id.
    async fn fetch(&self, media_id: &str) -> Result<Vec<u8>, BotError>;
}

/// Speech-to-text for voice notes, applied before intent routing.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe audio bytes of the given MIME type into text.
    async fn transcribe(&self, audio: Vec<u8>, mime_type: &str) -> Result<String, BotError>;
}

// ============================================================
// LLM Provider Trait
// ============================================================

/// Provider-agnostic LLM interface.
///
/// Supports multiple providers (OpenAI, Ollama) behind one request/response
/// shape. One call is one round trip: no streaming, no retries.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a completion request. Returns the model's response.
    async fn complete(&self, request: CompletionRequest)
        -> Result<CompletionResponse, BotError>;
}

// ============================================================
// Time
// ============================================================

/// Source of the current time, injectable so tests can freeze the clock.
pub trait Clock: Send + Sync {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
