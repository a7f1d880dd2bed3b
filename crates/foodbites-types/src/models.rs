/// Shared data types used across all FoodBites subsystems.
///
/// Menu data, session state, inbound events, outbound payloads and the
/// provider-agnostic completion request/response live here so the core, the
/// channel adapters and the storage backends agree on one set of structures.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================
// Catalog Types
// ============================================================

/// A single dish on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Display name (e.g., "Jollof Rice & Chicken").
    pub name: String,
    /// Short description shown under the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Price as displayed, e.g. "₦2,500" or "₦2,500 / ₦3,000".
    pub price: String,
}

/// A named menu category with its items in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category title (e.g., "Main Courses (Lunch & Dinner)").
    pub name: String,
    /// Items in display order.
    pub items: Vec<CatalogItem>,
}

/// A parsed order: quantity, matched item and computed prices.
///
/// Created per inbound message by the order matcher; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Name of the matched catalog item.
    pub item_name: String,
    /// Requested quantity (always at least 1).
    pub quantity: u32,
    /// Unit price in whole currency units.
    pub unit_price: u64,
    /// `unit_price * quantity`.
    pub total_price: u64,
}

// ============================================================
// Conversation Types
// ============================================================

/// A message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message author.
    pub role: ChatRole,
    /// Content of the message.
    pub content: String,
}

impl ChatMessage {
    /// A turn written by the customer.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// A turn written by the assistant.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Roles in a chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The customer sending the message.
    User,
    /// The AI assistant.
    Assistant,
}

/// Per-user conversational memory.
///
/// One instance per sender. Mutated by the intent router on every handled
/// event and evicted by the session store after an inactivity TTL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Whether the welcome sequence has ever fired for this user.
    pub greeted: bool,
    /// When the welcome sequence last fired.
    pub last_greeted_at: Option<DateTime<Utc>>,
    /// Last classified intent, passed to the assistant as a hint.
    pub intent: Option<String>,
    /// Bounded window of recent assistant exchanges, oldest first.
    pub chat_history: Vec<ChatMessage>,
}

impl SessionState {
    /// Whether the welcome sequence must fire at `now`.
    ///
    /// True for users that were never greeted and for users whose last
    /// welcome is strictly older than `regreet_after`.
    pub fn welcome_due(&self, now: DateTime<Utc>, regreet_after: Duration) -> bool {
        if !self.greeted {
            return true;
        }
        match self.last_greeted_at {
            Some(at) => now - at > regreet_after,
            None => true,
        }
    }

    /// Reset the session for a fresh welcome at `now`.
    pub fn mark_welcomed(&mut self, now: DateTime<Utc>, intent: &str) {
        self.greeted = true;
        self.last_greeted_at = Some(now);
        self.chat_history.clear();
        self.intent = Some(intent.to_string());
    }

    /// Append a user turn and the assistant's reply, keeping at most `window` turns.
    ///
    /// Old turns are dropped in whole exchanges, so the history always starts
    /// with a user turn; an odd `window` therefore keeps `window - 1` turns.
    pub fn record_exchange(&mut self, user_text: &str, reply: &str, window: usize) {
        self.chat_history.push(ChatMessage::user(user_text));
        self.chat_history.push(ChatMessage::assistant(reply));
        let len = self.chat_history.len();
        if len > window {
            let excess = len - window;
            self.chat_history.drain(..(excess + excess % 2).min(len));
        }
    }
}

// ============================================================
// Channel Types
// ============================================================

/// Opaque reference to media attached to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Channel-specific media identifier.
    pub id: String,
    /// MIME type reported by the channel (e.g. "audio/ogg; codecs=opus").
    pub mime_type: String,
}

/// A normalized inbound message, after transport parsing and transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// Sender identifier (WhatsApp phone number).
    pub user_id: String,
    /// Message text; empty when the message carried no usable text.
    pub text: String,
    /// Attached media, if any.
    pub media: Option<MediaRef>,
    /// When the event was received.
    pub received_at: DateTime<Utc>,
}

impl InboundEvent {
    /// Build a text event received now.
    pub fn text(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            text: text.into(),
            media: None,
            received_at: Utc::now(),
        }
    }
}

/// One outbound message, described independently of the delivery channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundPayload {
    /// Plain text message.
    Text {
        /// Message body.
        body: String,
    },
    /// Prompt with up to three quick-reply buttons.
    Buttons {
        /// Prompt shown above the buttons.
        prompt: String,
        /// Button labels in display order.
        labels: Vec<String>,
    },
    /// Image by URL or uploaded media id, with caption.
    Image {
        /// `http(s)` URL or channel media id.
        media: String,
        /// Caption shown under the image.
        caption: String,
    },
}

impl OutboundPayload {
    /// Short kind label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundPayload::Text { .. } => "text",
            OutboundPayload::Buttons { .. } => "buttons",
            OutboundPayload::Image { .. } => "image",
        }
    }
}

// ============================================================
// LLM Types
// ============================================================

/// Request to an LLM provider for a completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System prompt.
    pub system: String,
    /// Conversation messages, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Model identifier (e.g., "gpt-4o-mini", "llama3").
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature for sampling.
    pub temperature: Option<f64>,
}

/// Response from an LLM completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text content.
    pub content: String,
    /// Model that actually served the request.
    pub model: String,
    /// Token usage statistics.
    pub usage: TokenUsage,
}

/// Token usage statistics from an LLM call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input/prompt tokens consumed.
    pub input_tokens: u32,
    /// Output/completion tokens generated.
    pub output_tokens: u32,
}
