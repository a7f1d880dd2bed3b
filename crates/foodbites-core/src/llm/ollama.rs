//! Ollama local LLM provider.
//!
//! Implements [`LlmProvider`] for local models running via the Ollama API.
//! Used as a fallback when the hosted model is unreachable, or as the primary
//! backend for offline development.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use foodbites_types::errors::BotError;
use foodbites_types::traits::LlmProvider;
use foodbites_types::{ChatMessage, ChatRole, CompletionRequest, CompletionResponse, TokenUsage};

/// Default Ollama API base URL for local instances.
const DEFAULT_OLLAMA_BASE: &str = "http://localhost:11434";

/// Ollama LLM provider for local model execution.
pub struct OllamaProvider {
    /// HTTP client for API requests.
    client: Client,
    /// Base URL for the Ollama API (default: `http://localhost:11434`).
    api_base: String,
}

// -- Ollama API request/response types --

/// Request body for Ollama's `/api/chat` endpoint.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
    /// Disable streaming to get a single response object.
    stream: bool,
}

/// A message in Ollama's chat format.
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

/// Generation options for Ollama.
#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Response from Ollama's `/api/chat` endpoint (non-streaming).
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    model: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl OllamaProvider {
    /// Create a new Ollama provider connecting to localhost.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_OLLAMA_BASE.to_string())
    }

    /// Create a new Ollama provider with a custom base URL.
    pub fn with_base_url(api_base: String) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Convert chat turns to Ollama format, prepending the system message.
    fn convert_messages(system: &str, messages: &[ChatMessage]) -> Vec<OllamaMessage> {
        let mut result = Vec::with_capacity(messages.len() + 1);

        if !system.is_empty() {
            result.push(OllamaMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }

        for msg in messages {
            result.push(OllamaMessage {
                role: match msg.role {
                    ChatRole::User => "user".to_string(),
                    ChatRole::Assistant => "assistant".to_string(),
                },
                content: msg.content.clone(),
            });
        }

        result
    }

    fn parse_response(resp: OllamaChatResponse) -> CompletionResponse {
        CompletionResponse {
            content: resp.message.content,
            model: resp.model,
            usage: TokenUsage {
                input_tokens: resp.prompt_eval_count.unwrap_or(0),
                output_tokens: resp.eval_count.unwrap_or(0),
            },
        }
    }

    /// Send a chat request to the Ollama API.
    async fn send_request(
        &self,
        request: OllamaChatRequest,
    ) -> Result<CompletionResponse, BotError> {
        let url = format!("{}/api/chat", self.api_base);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::LlmProvider(format!("Ollama HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::LlmProvider(format!(
                "Ollama API error (HTTP {status}): {body}"
            )));
        }

        let resp_body: OllamaChatResponse = response.json().await.map_err(|e| {
            BotError::LlmProvider(format!("Failed to parse Ollama response: {e}"))
        })?;

        Ok(Self::parse_response(resp_body))
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    /// Send a completion request to the Ollama chat API.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, BotError> {
        let ollama_request = OllamaChatRequest {
            messages: Self::convert_messages(&request.system, &request.messages),
            model: request.model,
            options: Some(OllamaOptions {
                temperature: request.temperature,
                num_predict: Some(request.max_tokens),
            }),
            stream: false,
        };

        self.send_request(ollama_request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_request() -> CompletionRequest {
        CompletionRequest {
            system: "You are helpful.".to_string(),
            messages: vec![ChatMessage::user("Hello!")],
            model: "llama3".to_string(),
            max_tokens: 512,
            temperature: Some(0.8),
        }
    }

    #[test]
    fn test_message_conversion() {
        let messages = OllamaProvider::convert_messages(
            "System prompt",
            &[ChatMessage::user("Hi"), ChatMessage::assistant("Hello")],
        );

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "System prompt");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
    }

    #[test]
    fn test_empty_system_becomes_no_system_message() {
        let messages = OllamaProvider::convert_messages("", &[ChatMessage::user("Hi")]);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
    }

    #[test]
    fn test_missing_token_counts_default_to_zero() {
        let resp = OllamaChatResponse {
            message: OllamaMessage {
                role: "assistant".to_string(),
                content: "ok".to_string(),
            },
            model: "mistral".to_string(),
            prompt_eval_count: None,
            eval_count: None,
        };

        let result = OllamaProvider::parse_response(resp);
        assert_eq!(result.usage.input_tokens, 0);
        assert_eq!(result.usage.output_tokens, 0);
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama3",
                "stream": false,
                "options": {"num_predict": 512}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {
                    "role": "assistant",
                    "content": "Hi! How can I help?"
                },
                "model": "llama3",
                "prompt_eval_count": 12,
                "eval_count": 6
            })))
            .mount(&server)
            .await;

        let provider = OllamaProvider::with_base_url(server.uri());
        let result = provider.complete(sample_request()).await.unwrap();

        assert_eq!(result.content, "Hi! How can I help?");
        assert_eq!(result.model, "llama3");
        assert_eq!(result.usage.input_tokens, 12);
    }

    #[tokio::test]
    async fn test_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let provider = OllamaProvider::with_base_url(server.uri());
        let err = provider.complete(sample_request()).await.unwrap_err();

        match err {
            BotError::LlmProvider(msg) => {
                assert!(msg.contains("500"), "unexpected message: {msg}");
            }
            other => panic!("Expected LlmProvider error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let provider = OllamaProvider::with_base_url("http://127.0.0.1:1".to_string());
        let err = provider.complete(sample_request()).await.unwrap_err();

        match err {
            BotError::LlmProvider(msg) => {
                assert!(msg.contains("request failed"), "unexpected message: {msg}");
            }
            other => panic!("Expected LlmProvider error, got: {other:?}"),
        }
    }
}
