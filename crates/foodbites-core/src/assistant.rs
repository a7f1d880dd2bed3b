//! LLM-backed assistant for free-form customer messages.
//!
//! Builds a bounded prompt (business profile, menu, intent hint, the tail of
//! the chat history and the new user turn), makes one completion call under a
//! timeout and returns the trimmed reply. It never reads or writes the
//! session store; the engine folds the reply into session state.

use std::sync::Arc;
use std::time::Duration;

use foodbites_types::config::{AssistantConfig, BusinessProfile};
use foodbites_types::errors::BotError;
use foodbites_types::traits::LlmProvider;
use foodbites_types::{ChatMessage, CompletionRequest, SessionState};

use crate::catalog::Catalog;

/// Intent hint used when the session has none.
const DEFAULT_INTENT: &str = "general";

/// Answers free-form messages through an [`LlmProvider`].
pub struct Assistant {
    llm: Arc<dyn LlmProvider>,
    business: BusinessProfile,
    config: AssistantConfig,
    /// Serialized once; the catalog never changes after startup.
    catalog_json: String,
}

impl Assistant {
    /// Create an assistant over the given provider and catalog.
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        catalog: &Catalog,
        business: BusinessProfile,
        config: AssistantConfig,
    ) -> Result<Self, BotError> {
        Ok(Self {
            llm,
            business,
            config,
            catalog_json: catalog.to_json()?,
        })
    }

    /// Produce a reply to `user_text` given the user's session.
    ///
    /// Fails with [`BotError::Timeout`] when the provider does not answer
    /// within `assistant.timeout_secs`, and with [`BotError::LlmProvider`]
    /// when the reply is empty.
    pub async fn respond(
        &self,
        user_id: &str,
        user_text: &str,
        state: &SessionState,
    ) -> Result<String, BotError> {
        let request = self.build_request(user_text, state);
        let history_turns = request.messages.len() - 1;
        let timeout = Duration::from_secs(self.config.timeout_secs);

        let response = tokio::time::timeout(timeout, self.llm.complete(request))
            .await
            .map_err(|_| {
                BotError::Timeout(format!(
                    "assistant did not answer within {}s",
                    self.config.timeout_secs
                ))
            })??;

        let reply = response.content.trim();
        if reply.is_empty() {
            return Err(BotError::LlmProvider(format!(
                "model {} returned an empty reply",
                response.model
            )));
        }

        tracing::info!(
            user = %user_id,
            model = %response.model,
            history_turns,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "assistant replied"
        );

        Ok(reply.to_string())
    }

    /// Assemble the completion request for one turn.
    pub fn build_request(&self, user_text: &str, state: &SessionState) -> CompletionRequest {
        let history = &state.chat_history;
        let start = history.len().saturating_sub(self.config.history_turns);

        let mut messages: Vec<ChatMessage> = history[start..].to_vec();
        messages.push(ChatMessage::user(user_text));

        CompletionRequest {
            system: self.system_prompt(state.intent.as_deref()),
            messages,
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    /// Render the system prompt for the given intent hint.
    pub fn system_prompt(&self, intent: Option<&str>) -> String {
        let b = &self.business;
        let mut prompt = format!(
            "You are *{}*, the official WhatsApp assistant for {}: {}.\n",
            b.assistant_name, b.business_name, b.tagline
        );

        prompt.push_str("Your job is to help customers with questions about:\n");
        for topic in &b.topics {
            prompt.push_str(&format!("- {topic}\n"));
        }

        prompt.push_str("\nDetails about the business:\n");
        for fact in &b.facts {
            prompt.push_str(&format!("- {fact}\n"));
        }
        for hours in &b.support_hours {
            if hours.day.eq_ignore_ascii_case("daily") {
                prompt.push_str(&format!("- Support hours: {} daily\n", hours.hours));
            } else {
                prompt.push_str(&format!(
                    "- Support hours on {}: {}\n",
                    hours.day, hours.hours
                ));
            }
        }
        prompt.push_str(&format!("- Phone: {}\n", b.phone));
        prompt.push_str(&format!("- Tone: {}\n", b.tone));

        prompt.push('\n');
        for rule in &b.rules {
            prompt.push_str(rule);
            prompt.push('\n');
        }

        prompt.push_str(&format!(
            "Current intent: {}.\nMenu:\n{}\n",
            intent.unwrap_or(DEFAULT_INTENT),
            self.catalog_json
        ));
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use foodbites_types::config::MenuConfig;
    use foodbites_types::{ChatRole, CompletionResponse, TokenUsage};
    use std::sync::Mutex;

    /// Records every request and answers with a fixed reply.
    struct MockLlm {
        reply: String,
        delay: Option<Duration>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockLlm {
        fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                delay: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::replying("too late")
            }
        }

        fn last_request(&self) -> CompletionRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlm {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, BotError> {
            self.requests.lock().unwrap().push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(CompletionResponse {
                content: self.reply.clone(),
                model: "mock-model".to_string(),
                usage: TokenUsage {
                    input_tokens: 100,
                    output_tokens: 20,
                },
            })
        }
    }

    fn assistant(llm: Arc<dyn LlmProvider>, config: AssistantConfig) -> Assistant {
        let catalog = Catalog::from_config(&MenuConfig::default()).unwrap();
        Assistant::new(llm, &catalog, BusinessProfile::default(), config).unwrap()
    }

    #[tokio::test]
    async fn test_reply_is_trimmed() {
        let llm = Arc::new(MockLlm::replying("  We open at 8am!  \n"));
        let assistant = assistant(llm, AssistantConfig::default());

        let reply = assistant
            .respond("2348000000000", "when do you open", &SessionState::default())
            .await
            .unwrap();
        assert_eq!(reply, "We open at 8am!");
    }

    #[tokio::test]
    async fn test_empty_reply_is_error() {
        let llm = Arc::new(MockLlm::replying("   "));
        let assistant = assistant(llm, AssistantConfig::default());

        let err = assistant
            .respond("2348000000000", "hello?", &SessionState::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::LlmProvider(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let llm = Arc::new(MockLlm::slow(Duration::from_secs(5)));
        let config = AssistantConfig {
            timeout_secs: 1,
            ..AssistantConfig::default()
        };
        let assistant = assistant(llm, config);

        let err = assistant
            .respond("2348000000000", "hello?", &SessionState::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_history_window_in_request() {
        let llm = Arc::new(MockLlm::replying("ok"));
        let assistant = assistant(llm.clone(), AssistantConfig::default());

        let mut state = SessionState::default();
        for i in 0..10 {
            state.record_exchange(&format!("q{i}"), &format!("a{i}"), 20);
        }

        assistant
            .respond("2348000000000", "latest", &state)
            .await
            .unwrap();

        let request = llm.last_request();
        assert_eq!(request.messages.len(), 7);
        assert_eq!(request.messages[0], ChatMessage::user("q7"));
        assert_eq!(request.messages[5], ChatMessage::assistant("a9"));
        assert_eq!(request.messages[6].role, ChatRole::User);
        assert_eq!(request.messages[6].content, "latest");
        assert_eq!(request.model, "gpt-4o-mini");
    }

    #[test]
    fn test_system_prompt_contents() {
        let assistant = assistant(
            Arc::new(MockLlm::replying("ok")),
            AssistantConfig::default(),
        );
        let prompt = assistant.system_prompt(None);

        assert!(prompt.contains("FoodBites Kitchen Customer Support Bot"));
        assert!(prompt.contains("- Support hours: 8am–8pm daily"));
        assert!(prompt.contains("- Support hours on Sunday: 2pm–8pm"));
        assert!(prompt.contains("- Phone: 080-7237-8767"));
        assert!(prompt.contains("Never invent new dishes or prices."));
        assert!(prompt.contains("Current intent: general."));
        assert!(prompt.contains("\"name\": \"Egusi Soup & Pounded Yam\""));
    }

    #[test]
    fn test_system_prompt_uses_session_intent() {
        let assistant = assistant(
            Arc::new(MockLlm::replying("ok")),
            AssistantConfig::default(),
        );
        assert!(assistant
            .system_prompt(Some("order"))
            .contains("Current intent: order."));
    }
}
