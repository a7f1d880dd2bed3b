//! Voice note transcription through the OpenAI audio API.
//!
//! `POST {api_base}/v1/audio/transcriptions` with a multipart `file` and
//! `model`; the response carries the transcript in `text`.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use foodbites_types::errors::BotError;
use foodbites_types::traits::Transcriber;

/// Default OpenAI API base URL.
const DEFAULT_API_BASE: &str = "https://api.openai.com";

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// [`Transcriber`] backed by Whisper.
pub struct WhisperTranscriber {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl WhisperTranscriber {
    /// Create a transcriber against the public OpenAI API.
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_API_BASE.to_string())
    }

    /// Create a transcriber against a custom base URL.
    pub fn with_base_url(api_key: String, model: String, api_base: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: Vec<u8>, mime_type: &str) -> Result<String, BotError> {
        // "audio/ogg; codecs=opus" -> "audio/ogg"
        let base_mime = mime_type.split(';').next().unwrap_or_default().trim();
        let base_mime = if base_mime.is_empty() { "audio/ogg" } else { base_mime };

        let size = audio.len();
        let file = Part::bytes(audio)
            .file_name(file_name_for(base_mime))
            .mime_str(base_mime)
            .map_err(|e| BotError::Transcription(format!("invalid MIME type {base_mime}: {e}")))?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone());

        let response = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.api_base))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| BotError::Transcription(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Transcription(format!(
                "transcription API error (HTTP {status}): {body}"
            )));
        }

        let transcript: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| BotError::Transcription(format!("Failed to parse response: {e}")))?;

        let text = transcript.text.trim();
        if text.is_empty() {
            return Err(BotError::Transcription("empty transcript".to_string()));
        }

        debug!(size, mime = base_mime, chars = text.chars().count(), "voice note transcribed");
        Ok(text.to_string())
    }
}

/// Upload file name; the API infers the format from the extension.
fn file_name_for(mime: &str) -> &'static str {
    match mime {
        "audio/mpeg" | "audio/mp3" => "voice.mp3",
        "audio/mp4" | "audio/m4a" | "audio/aac" => "voice.m4a",
        "audio/wav" | "audio/x-wav" => "voice.wav",
        "audio/webm" => "voice.webm",
        _ => "voice.ogg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transcriber_for(server: &MockServer) -> WhisperTranscriber {
        WhisperTranscriber::with_base_url(
            "test-key".to_string(),
            "whisper-1".to_string(),
            server.uri(),
        )
    }

    #[test]
    fn test_file_name_for_mime() {
        assert_eq!(file_name_for("audio/ogg"), "voice.ogg");
        assert_eq!(file_name_for("audio/mpeg"), "voice.mp3");
        assert_eq!(file_name_for("application/octet-stream"), "voice.ogg");
    }

    #[tokio::test]
    async fn test_transcribe_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/audio/transcriptions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"text": " Show me the menu. "})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let text = transcriber_for(&server)
            .transcribe(vec![0x4f, 0x67, 0x67, 0x53], "audio/ogg; codecs=opus")
            .await
            .unwrap();
        assert_eq!(text, "Show me the menu.");
    }

    #[tokio::test]
    async fn test_transcribe_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "Invalid file format.", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let err = transcriber_for(&server)
            .transcribe(vec![1, 2, 3], "audio/ogg")
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::Transcription(msg) if msg.contains("Invalid file format")));
    }

    #[tokio::test]
    async fn test_blank_transcript_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/audio/transcriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"text": "  "})))
            .mount(&server)
            .await;

        let err = transcriber_for(&server)
            .transcribe(vec![1, 2, 3], "")
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::Transcription(msg) if msg.contains("empty")));
    }
}
