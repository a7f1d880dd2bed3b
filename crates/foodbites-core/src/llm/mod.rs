//! LLM provider implementations for the FoodBites assistant.
//!
//! Provides concrete implementations of the [`LlmProvider`] trait for:
//! - **OpenAI** (`OpenAiProvider`): hosted models via the Chat Completions API
//! - **Ollama** (`OllamaProvider`): local models via the Ollama chat API
//! - **ProviderRouter**: primary provider with a fallback chain

pub mod ollama;
pub mod openai;
pub mod router;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use router::ProviderRouter;

use std::sync::Arc;

use foodbites_types::config::{AssistantConfig, LlmBackend};
use foodbites_types::errors::BotError;
use foodbites_types::traits::LlmProvider;

/// Build the provider chain described by the `assistant` config section.
///
/// `openai_api_key` is required when either the primary or the fallback
/// backend is OpenAI.
pub fn from_config(
    config: &AssistantConfig,
    openai_api_key: Option<&str>,
) -> Result<Arc<dyn LlmProvider>, BotError> {
    let primary = backend(config.provider, config, openai_api_key)?;

    let Some(fallback) = config.fallback else {
        return Ok(primary);
    };
    let model = config.fallback_model.clone().ok_or_else(|| {
        BotError::Config("assistant.fallback requires assistant.fallback_model".to_string())
    })?;

    tracing::info!(
        primary = ?config.provider,
        fallback = ?fallback,
        fallback_model = %model,
        "LLM fallback chain configured"
    );
    let router = ProviderRouter::new(primary, vec![])
        .with_fallback(backend(fallback, config, openai_api_key)?, model);
    Ok(Arc::new(router))
}

fn backend(
    kind: LlmBackend,
    config: &AssistantConfig,
    openai_api_key: Option<&str>,
) -> Result<Arc<dyn LlmProvider>, BotError> {
    match kind {
        LlmBackend::OpenAi => {
            let key = openai_api_key.ok_or_else(|| {
                BotError::Config("OpenAI backend selected but no API key was given".to_string())
            })?;
            Ok(Arc::new(OpenAiProvider::with_base_url(
                key.to_string(),
                config.openai_base_url.clone(),
            )))
        }
        LlmBackend::Ollama => Ok(Arc::new(OllamaProvider::with_base_url(
            config.ollama_base_url.clone(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_requires_key() {
        let err = from_config(&AssistantConfig::default(), None).err().unwrap();
        assert!(matches!(err, BotError::Config(msg) if msg.contains("API key")));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = AssistantConfig {
            provider: LlmBackend::Ollama,
            ..AssistantConfig::default()
        };
        assert!(from_config(&config, None).is_ok());
    }

    #[test]
    fn test_fallback_requires_model() {
        let config = AssistantConfig {
            fallback: Some(LlmBackend::Ollama),
            fallback_model: None,
            ..AssistantConfig::default()
        };
        let err = from_config(&config, Some("sk-test")).err().unwrap();
        assert!(matches!(err, BotError::Config(msg) if msg.contains("fallback_model")));
    }

    #[test]
    fn test_fallback_chain_builds() {
        let config = AssistantConfig {
            fallback: Some(LlmBackend::Ollama),
            fallback_model: Some("llama3".to_string()),
            ..AssistantConfig::default()
        };
        assert!(from_config(&config, Some("sk-test")).is_ok());
    }
}
