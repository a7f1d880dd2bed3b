//! Provider router with fallback chain.
//!
//! Sends each request to the primary provider; if it fails, tries each
//! fallback in order until one succeeds or all have been exhausted. A
//! fallback may carry its own model name, since a local Ollama model is not
//! called `gpt-4o-mini`.

use async_trait::async_trait;
use std::sync::Arc;

use foodbites_types::errors::BotError;
use foodbites_types::traits::LlmProvider;
use foodbites_types::{CompletionRequest, CompletionResponse};

/// One entry in the chain.
struct Route {
    provider: Arc<dyn LlmProvider>,
    /// Replaces `CompletionRequest::model` for this provider.
    model: Option<String>,
}

/// Routes LLM requests to a primary provider with automatic fallback.
pub struct ProviderRouter {
    /// Primary first, then fallbacks.
    routes: Vec<Route>,
}

impl std::fmt::Debug for ProviderRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRouter")
            .field("provider_count", &self.routes.len())
            .finish()
    }
}

impl ProviderRouter {
    /// Create a router with a primary provider and fallback chain.
    ///
    /// All providers receive the request's own model name.
    pub fn new(primary: Arc<dyn LlmProvider>, fallbacks: Vec<Arc<dyn LlmProvider>>) -> Self {
        let mut routes = Vec::with_capacity(1 + fallbacks.len());
        routes.push(Route {
            provider: primary,
            model: None,
        });
        routes.extend(fallbacks.into_iter().map(|provider| Route {
            provider,
            model: None,
        }));
        Self { routes }
    }

    /// Create a router from an ordered list of providers.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty.
    pub fn from_providers(providers: Vec<Arc<dyn LlmProvider>>) -> Result<Self, BotError> {
        let mut providers = providers.into_iter();
        let primary = providers.next().ok_or_else(|| {
            BotError::Config("ProviderRouter requires at least one provider".to_string())
        })?;
        Ok(Self::new(primary, providers.collect()))
    }

    /// Append a fallback that is always asked for `model`.
    pub fn with_fallback(mut self, provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        self.routes.push(Route {
            provider,
            model: Some(model.into()),
        });
        self
    }

    /// Number of providers in the chain.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Always false: a router has at least its primary.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[async_trait]
impl LlmProvider for ProviderRouter {
    /// Send a completion request, falling back through providers on failure.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, BotError> {
        let mut last_error = None;

        for (i, route) in self.routes.iter().enumerate() {
            let mut attempt = request.clone();
            if let Some(model) = &route.model {
                attempt.model = model.clone();
            }

            match route.provider.complete(attempt).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(
                        provider_index = i,
                        error = %e,
                        "LLM provider failed, trying next in fallback chain"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| BotError::LlmProvider("No providers available".to_string())))
    }
}
