//! OpenAI Chat Completions provider.
//!
//! Implements [`LlmProvider`] for OpenAI models (gpt-4o-mini and friends) via
//! `POST /v1/chat/completions`. The system prompt is sent as the first
//! message. Rate-limit headers from each response are remembered so a burst
//! of requests stops early instead of hammering a 429.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use foodbites_types::errors::BotError;
use foodbites_types::traits::LlmProvider;
use foodbites_types::{ChatMessage, ChatRole, CompletionRequest, CompletionResponse, TokenUsage};

/// Default OpenAI API base URL.
const DEFAULT_API_BASE: &str = "https://api.openai.com";

/// OpenAI LLM provider using the Chat Completions API.
pub struct OpenAiProvider {
    /// HTTP client for API requests.
    client: Client,
    /// OpenAI API key.
    api_key: String,
    /// Base URL for the API (overridable for testing).
    api_base: String,
    /// Rate limit state from the most recent response headers.
    rate_limit_state: Mutex<RateLimitState>,
}

/// Tracks rate limit information from OpenAI response headers.
struct RateLimitState {
    /// Remaining requests in the current window.
    remaining_requests: AtomicU64,
    /// When the rate limit window resets.
    reset_at: Option<Instant>,
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self {
            remaining_requests: AtomicU64::new(u64::MAX),
            reset_at: None,
        }
    }
}

// -- Chat Completions request/response types --

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ApiMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    message: String,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider with the given API key.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_API_BASE.to_string())
    }

    /// Create a new OpenAI provider with a custom base URL (for testing or
    /// OpenAI-compatible gateways).
    pub fn with_base_url(api_key: String, api_base: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            rate_limit_state: Mutex::new(RateLimitState::default()),
        }
    }

    /// Convert the system prompt and chat turns to API messages.
    fn convert_messages(system: &str, messages: &[ChatMessage]) -> Vec<ApiMessage> {
        let mut result = Vec::with_capacity(messages.len() + 1);
        if !system.is_empty() {
            result.push(ApiMessage {
                role: "system".to_string(),
                content: Some(system.to_string()),
            });
        }
        result.extend(messages.iter().map(|m| ApiMessage {
            role: match m.role {
                ChatRole::User => "user".to_string(),
                ChatRole::Assistant => "assistant".to_string(),
            },
            content: Some(m.content.clone()),
        }));
        result
    }

    /// Take the first choice's text.
    fn parse_response(resp: ChatResponse) -> Result<CompletionResponse, BotError> {
        let choice = resp.choices.into_iter().next().ok_or_else(|| {
            BotError::LlmProvider("OpenAI response contained no choices".to_string())
        })?;
        let usage = resp.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            model: resp.model,
            usage,
        })
    }

    /// Update rate limit state from response headers.
    fn update_rate_limits(state: &mut RateLimitState, headers: &reqwest::header::HeaderMap) {
        if let Some(remaining) = headers
            .get("x-ratelimit-remaining-requests")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
        {
            state.remaining_requests.store(remaining, Ordering::Relaxed);
        }

        if let Some(reset_secs) = headers
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
        {
            state.reset_at = Some(Instant::now() + Duration::from_secs(reset_secs));
        }
    }

    /// Check if we should wait before making a request due to rate limits.
    async fn check_rate_limit(&self) -> Result<(), BotError> {
        let state = self.rate_limit_state.lock().await;
        if let Some(reset_at) = state.reset_at {
            if Instant::now() < reset_at && state.remaining_requests.load(Ordering::Relaxed) == 0 {
                let wait = reset_at.duration_since(Instant::now());
                return Err(BotError::RateLimitExceeded(format!(
                    "OpenAI rate limit reached, retry after {}s",
                    wait.as_secs()
                )));
            }
        }
        Ok(())
    }

    /// Send a request to the Chat Completions API.
    async fn send_request(&self, request: ChatRequest) -> Result<CompletionResponse, BotError> {
        self.check_rate_limit().await?;

        let url = format!("{}/v1/chat/completions", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::LlmProvider(format!("HTTP request failed: {e}")))?;

        {
            let mut state = self.rate_limit_state.lock().await;
            Self::update_rate_limits(&mut state, response.headers());
        }

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(BotError::RateLimitExceeded(
                "OpenAI API rate limit exceeded (429)".to_string(),
            ));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(BotError::LlmProvider(
                "OpenAI API authentication failed: invalid API key".to_string(),
            ));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(err_resp) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(BotError::LlmProvider(format!(
                    "OpenAI API error ({}): {}",
                    err_resp.error.error_type.as_deref().unwrap_or("unknown"),
                    err_resp.error.message
                )));
            }
            return Err(BotError::LlmProvider(format!(
                "OpenAI API error (HTTP {status}): {body}"
            )));
        }

        let resp_body: ChatResponse = response
            .json()
            .await
            .map_err(|e| BotError::LlmProvider(format!("Failed to parse response: {e}")))?;

        Self::parse_response(resp_body)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    /// Send a completion request to the Chat Completions API.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, BotError> {
        let api_request = ChatRequest {
            messages: Self::convert_messages(&request.system, &request.messages),
            model: request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        self.send_request(api_request).await
    }
}
