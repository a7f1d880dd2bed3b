//! WhatsApp Business Cloud API client.
//!
//! Outbound side of the channel: implements [`DeliverySink`] by posting to
//! `{api_base}/{api_version}/{phone_number_id}/messages`, and [`MediaFetcher`]
//! by resolving a media id to its download URL and fetching the bytes. Every
//! request carries the access token as a bearer header.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use foodbites_types::config::WhatsAppConfig;
use foodbites_types::errors::BotError;
use foodbites_types::traits::{DeliverySink, MediaFetcher};

/// WhatsApp text message character limit.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

const TRUNCATION_SUFFIX: &str = "...(truncated)";

/// Graph API error envelope.
#[derive(Debug, Deserialize)]
struct GraphErrorResponse {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

/// Media lookup response; only the download URL matters.
#[derive(Debug, Deserialize)]
struct MediaInfo {
    url: String,
}

/// Sends messages and downloads media through the Cloud API.
pub struct WhatsAppClient {
    client: Client,
    token: String,
    phone_number_id: String,
    /// `{api_base}/{api_version}`, no trailing slash.
    graph_url: String,
}

impl WhatsAppClient {
    /// Create a client for one business phone number.
    pub fn new(token: String, phone_number_id: String, config: &WhatsAppConfig) -> Self {
        Self {
            client: Client::new(),
            token,
            phone_number_id,
            graph_url: format!(
                "{}/{}",
                config.api_base.trim_end_matches('/'),
                config.api_version.trim_matches('/')
            ),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.graph_url, self.phone_number_id)
    }

    /// POST one message body and map Graph errors.
    async fn post_message(&self, to: &str, kind: &str, payload: Value) -> Result<(), BotError> {
        let response = self
            .client
            .post(self.messages_url())
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| BotError::Channel(format!("WhatsApp API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = graph_error_detail(&body);
            warn!(to, kind, status = %status, error = %detail, "WhatsApp API rejected message");
            return Err(BotError::Channel(format!(
                "WhatsApp API error (HTTP {status}): {detail}"
            )));
        }

        debug!(to, kind, "WhatsApp message sent");
        Ok(())
    }

    /// GET a Graph resource with the bearer token, failing on non-2xx.
    async fn get_authorized(&self, url: &str) -> Result<reqwest::Response, BotError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| BotError::Channel(format!("WhatsApp media request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Channel(format!(
                "WhatsApp media error (HTTP {status}): {}",
                graph_error_detail(&body)
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl DeliverySink for WhatsAppClient {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), BotError> {
        self.post_message(to, "text", text_payload(to, body)).await
    }

    async fn send_buttons(
        &self,
        to: &str,
        prompt: &str,
        labels: &[String],
    ) -> Result<(), BotError> {
        self.post_message(to, "buttons", buttons_payload(to, prompt, labels))
            .await
    }

    async fn send_image(&self, to: &str, media: &str, caption: &str) -> Result<(), BotError> {
        self.post_message(to, "image", image_payload(to, media, caption))
            .await
    }
}

#[async_trait]
impl MediaFetcher for WhatsAppClient {
    async fn fetch(&self, media_id: &str) -> Result<Vec<u8>, BotError> {
        let info: MediaInfo = self
            .get_authorized(&format!("{}/{}", self.graph_url, media_id))
            .await?
            .json()
            .await
            .map_err(|e| BotError::Channel(format!("invalid media lookup response: {e}")))?;

        let bytes = self
            .get_authorized(&info.url)
            .await?
            .bytes()
            .await
            .map_err(|e| BotError::Channel(format!("media download failed: {e}")))?;

        debug!(media_id, size = bytes.len(), "downloaded WhatsApp media");
        Ok(bytes.to_vec())
    }
}

// ============================================================
// Request bodies
// ============================================================

/// Plain text message body.
pub fn text_payload(to: &str, body: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "text",
        "text": { "body": truncate_message(body) }
    })
}

/// Interactive reply-button message body. Button ids are `btn_1`, `btn_2`, ...
pub fn buttons_payload(to: &str, prompt: &str, labels: &[String]) -> Value {
    let buttons: Vec<Value> = labels
        .iter()
        .enumerate()
        .map(|(i, title)| {
            json!({
                "type": "reply",
                "reply": { "id": format!("btn_{}", i + 1), "title": title }
            })
        })
        .collect();

    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "interactive",
        "interactive": {
            "type": "button",
            "body": { "text": prompt },
            "action": { "buttons": buttons }
        }
    })
}

/// Image message body. URLs go in `link`, anything else is an uploaded media id.
pub fn image_payload(to: &str, media: &str, caption: &str) -> Value {
    let image = if media.starts_with("http") {
        json!({ "link": media, "caption": caption })
    } else {
        json!({ "id": media, "caption": caption })
    };

    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "image",
        "image": image
    })
}

/// Truncate a message to the WhatsApp character limit.
pub fn truncate_message(content: &str) -> String {
    if content.chars().count() <= MAX_MESSAGE_LENGTH {
        return content.to_string();
    }
    let keep = MAX_MESSAGE_LENGTH - TRUNCATION_SUFFIX.len();
    let mut truncated: String = content.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_SUFFIX);
    truncated
}

fn graph_error_detail(body: &str) -> String {
    match serde_json::from_str::<GraphErrorResponse>(body) {
        Ok(resp) => match resp.error.code {
            Some(code) => format!("{} (code {code})", resp.error.message),
            None => resp.error.message,
        },
        Err(_) if body.is_empty() => "no response body".to_string(),
        Err(_) => body.to_string(),
    }
}
