//! Conversation engine.
//!
//! Drives one inbound event through the bot:
//! 1. Drop empty messages without touching the store
//! 2. Take the per-user lock
//! 3. Load the session
//! 4. Classify the message and build the reply payloads
//! 5. Persist the updated session with a fresh TTL
//! 6. Hand the payloads to the delivery sink (when using [`ConversationEngine::process`])
//!
//! The lock is held for the whole cycle, so two messages from the same user
//! are handled and answered one after the other.

use std::sync::Arc;
use std::time::Duration;

use foodbites_types::config::{FoodBitesConfig, SessionConfig};
use foodbites_types::errors::BotError;
use foodbites_types::traits::*;
use foodbites_types::{InboundEvent, OutboundPayload};

use crate::assistant::Assistant;
use crate::catalog::Catalog;
use crate::formatter::MessageFormatter;
use crate::locks::KeyedLocks;
use crate::router::{Intent, IntentRouter};

/// All trait-object dependencies required by the engine.
pub struct EngineDeps {
    /// Session storage backend.
    pub store: Arc<dyn SessionStore>,
    /// LLM provider for free-form messages.
    pub llm: Arc<dyn LlmProvider>,
    /// Time source for welcome decisions.
    pub clock: Arc<dyn Clock>,
}

/// The conversation-state and intent-routing engine.
pub struct ConversationEngine {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    catalog: Arc<Catalog>,
    router: IntentRouter,
    formatter: MessageFormatter,
    assistant: Assistant,
    locks: KeyedLocks,
    session: SessionConfig,
}

impl ConversationEngine {
    /// Wire up an engine from its dependencies and the loaded config.
    pub fn new(deps: EngineDeps, config: &FoodBitesConfig) -> Result<Self, BotError> {
        let catalog = Arc::new(Catalog::from_config(&config.menu)?);
        let router = IntentRouter::new(
            &config.bot.routing,
            &config.bot.session,
            catalog.clone(),
        )?;
        let assistant = Assistant::new(
            deps.llm,
            &catalog,
            config.business.clone(),
            config.bot.assistant.clone(),
        )?;

        Ok(Self {
            store: deps.store,
            clock: deps.clock,
            catalog,
            router,
            formatter: MessageFormatter::new(config.bot.assets.clone()),
            assistant,
            locks: KeyedLocks::new(),
            session: config.bot.session.clone(),
        })
    }

    /// The catalog the engine answers from.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Handle one event and return the payloads to send, in order.
    ///
    /// An empty list means the event was ignored. Store failures are
    /// returned as errors; nothing is committed in that case.
    pub async fn handle(&self, event: &InboundEvent) -> Result<Vec<OutboundPayload>, BotError> {
        if event.text.trim().is_empty() {
            tracing::debug!(user = %event.user_id, event_id = %event.id, "empty message ignored");
            return Ok(Vec::new());
        }

        let _guard = self.locks.acquire(&event.user_id).await;
        self.handle_locked(event).await
    }

    /// Handle one event and deliver its replies through `sink`.
    ///
    /// Delivery happens under the per-user lock. A failed send is logged and
    /// the remaining payloads are still attempted. Returns how many payloads
    /// were delivered.
    pub async fn process(
        &self,
        event: &InboundEvent,
        sink: &dyn DeliverySink,
    ) -> Result<usize, BotError> {
        if event.text.trim().is_empty() {
            tracing::debug!(user = %event.user_id, event_id = %event.id, "empty message ignored");
            return Ok(0);
        }

        let _guard = self.locks.acquire(&event.user_id).await;
        let payloads = self.handle_locked(event).await.map_err(|e| {
            tracing::error!(
                user = %event.user_id,
                event_id = %event.id,
                error = %e,
                "turn dropped"
            );
            e
        })?;

        let mut delivered = 0;
        for payload in &payloads {
            match sink.deliver(&event.user_id, payload).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::error!(
                        user = %event.user_id,
                        kind = payload.kind(),
                        error = %e,
                        "failed to deliver reply"
                    );
                }
            }
        }
        Ok(delivered)
    }

    /// Steps 3-5; the caller holds the user's lock.
    async fn handle_locked(&self, event: &InboundEvent) -> Result<Vec<OutboundPayload>, BotError> {
        let user_id = event.user_id.as_str();
        let text = event.text.trim();

        let mut state = self.store.get(user_id).await?;
        let now = self.clock.now();
        let intent = self.router.classify(text, &state, now);
        let label = intent.label();

        tracing::info!(user = %user_id, intent = label, "handling message");

        let payloads = match intent {
            Intent::NeedsWelcome => {
                state.mark_welcomed(now, label);
                self.formatter.welcome()
            }
            Intent::Greeting => self.formatter.welcome_back(),
            Intent::MenuRequest => {
                state.intent = Some(label.to_string());
                self.formatter.menu(&self.catalog)
            }
            Intent::OrderDetected(order) => {
                tracing::info!(
                    user = %user_id,
                    item = %order.item_name,
                    quantity = order.quantity,
                    total = order.total_price,
                    "order detected"
                );
                state.intent = Some(label.to_string());
                vec![self.formatter.order_summary(&order)]
            }
            Intent::Freeform => match self.assistant.respond(user_id, text, &state).await {
                Ok(reply) => {
                    state.record_exchange(text, &reply, self.session.history_window);
                    vec![OutboundPayload::Text { body: reply }]
                }
                Err(e) => {
                    tracing::warn!(user = %user_id, error = %e, "assistant failed, sending apology");
                    return Ok(vec![self.formatter.apology()]);
                }
            },
        };

        self.store
            .put(user_id, &state, Duration::from_secs(self.session.ttl_secs))
            .await?;
        Ok(payloads)
    }
}
