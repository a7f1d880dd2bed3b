/// WhatsApp channel for the FoodBites bot.
///
/// - **WhatsApp**: Cloud API client for outbound messages and media download
/// - **Webhook**: notification parsing and the subscription handshake
/// - **Transcription**: Whisper speech-to-text for voice notes
pub mod transcription;
pub mod webhook;
pub mod whatsapp;

pub use transcription::WhisperTranscriber;
pub use webhook::{extract_messages, verify_subscription, InboundMessage, WebhookNotification};
pub use whatsapp::WhatsAppClient;
