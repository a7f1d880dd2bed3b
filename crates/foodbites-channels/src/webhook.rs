//! Inbound side of the WhatsApp channel.
//!
//! Meta delivers messages as webhook notifications shaped
//! `entry[].changes[].value.messages[]`. Status callbacks (sent, delivered,
//! read) arrive on the same endpoint with no `messages`. This module turns a
//! notification into the messages the bot should act on, and answers the
//! subscription handshake.

use serde::Deserialize;
use tracing::debug;

use foodbites_types::{InboundEvent, MediaRef};

// --- Meta webhook payload types ---

/// Top-level webhook notification.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookNotification {
    /// Normally "whatsapp_business_account".
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub value: Option<WebhookValue>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookValue {
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
}

/// A single inbound message.
#[derive(Debug, Deserialize)]
pub struct WebhookMessage {
    /// Sender phone number.
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub id: String,
    /// "text", "interactive", "audio", "image", ...
    #[serde(default, rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub text: Option<TextContent>,
    #[serde(default)]
    pub interactive: Option<InteractiveContent>,
    #[serde(default)]
    pub audio: Option<AudioContent>,
}

#[derive(Debug, Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct InteractiveContent {
    #[serde(default)]
    pub button_reply: Option<ButtonReply>,
}

/// The quick-reply button the user tapped.
#[derive(Debug, Deserialize)]
pub struct ButtonReply {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioContent {
    /// Media id, resolved to a download URL through the Graph API.
    pub id: String,
    #[serde(default)]
    pub mime_type: String,
}

// --- Normalized messages ---

/// What the bot should do with one webhook message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Text ready for the engine (typed text or a tapped button title).
    Text {
        /// Sender phone number.
        from: String,
        /// Message text.
        text: String,
    },
    /// A voice note that needs download and transcription first.
    Voice {
        /// Sender phone number.
        from: String,
        /// The attached audio.
        media: MediaRef,
    },
}

impl InboundMessage {
    /// Sender phone number.
    pub fn from(&self) -> &str {
        match self {
            InboundMessage::Text { from, .. } | InboundMessage::Voice { from, .. } => from,
        }
    }
}

/// Build the engine event for a message that already has text.
pub fn text_event(from: &str, text: &str) -> InboundEvent {
    InboundEvent::text(from, text)
}

/// Build the engine event for a transcribed voice note.
pub fn voice_event(from: &str, transcript: &str, media: MediaRef) -> InboundEvent {
    InboundEvent {
        media: Some(media),
        ..InboundEvent::text(from, transcript)
    }
}

/// Extract every actionable message from a notification, in delivery order.
///
/// Text comes from `text.body`, falling back to the tapped button's title.
/// Messages without a sender, without text and not audio (images, stickers,
/// reactions) are skipped.
pub fn extract_messages(notification: &WebhookNotification) -> Vec<InboundMessage> {
    let mut out = Vec::new();

    for value in notification
        .entry
        .iter()
        .flat_map(|entry| entry.changes.iter())
        .filter_map(|change| change.value.as_ref())
    {
        for msg in &value.messages {
            let from = msg.from.trim();
            if from.is_empty() {
                debug!(message_id = %msg.id, "skipping webhook message without sender");
                continue;
            }

            if let Some(text) = message_text(msg) {
                out.push(InboundMessage::Text {
                    from: from.to_string(),
                    text: text.to_string(),
                });
                continue;
            }

            match (&msg.audio, msg.msg_type.as_str()) {
                (Some(audio), "audio") => out.push(InboundMessage::Voice {
                    from: from.to_string(),
                    media: MediaRef {
                        id: audio.id.clone(),
                        mime_type: audio.mime_type.clone(),
                    },
                }),
                _ => debug!(
                    from,
                    message_id = %msg.id,
                    msg_type = %msg.msg_type,
                    "skipping webhook message without text"
                ),
            }
        }
    }

    out
}

fn message_text(msg: &WebhookMessage) -> Option<&str> {
    let typed = msg.text.as_ref().map(|t| t.body.as_str());
    let tapped = msg
        .interactive
        .as_ref()
        .and_then(|i| i.button_reply.as_ref())
        .map(|b| b.title.as_str());

    [typed, tapped]
        .into_iter()
        .flatten()
        .find(|text| !text.trim().is_empty())
}

/// Answer Meta's subscription handshake.
///
/// Returns the challenge to echo when `hub.mode` is present and the token
/// matches, `None` when the request must be refused.
pub fn verify_subscription(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&str>,
    expected_token: &str,
) -> Option<String> {
    match (mode, token) {
        (Some(mode), Some(token)) if !mode.is_empty() && token == expected_token => {
            Some(challenge.unwrap_or_default().to_string())
        }
        _ => None,
    }
}
