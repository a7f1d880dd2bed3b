//! Intent classification.
//!
//! Decides how to handle one non-empty inbound message given the sender's
//! session:
//! - **NeedsWelcome**: never greeted, or last welcome older than the re-greet interval
//! - **Greeting**: the whole message is a configured greeting phrase
//! - **MenuRequest**: the message mentions the menu keyword
//! - **OrderDetected**: the order matcher recognises an item
//! - **Freeform**: anything else, answered by the assistant
//!
//! Rules are evaluated top to bottom and the first match wins. Empty messages
//! never reach the router; the engine drops them before loading the session.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use foodbites_types::config::{RoutingConfig, SessionConfig};
use foodbites_types::errors::BotError;
use foodbites_types::{OrderLine, SessionState};

use crate::catalog::Catalog;
use crate::order::OrderMatcher;

/// Classified intent of one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// First contact or re-greet after inactivity: send the welcome sequence.
    NeedsWelcome,
    /// Returning user said hello: send the welcome-back prompt.
    Greeting,
    /// Send the menu.
    MenuRequest,
    /// Send an order summary for the detected line.
    OrderDetected(OrderLine),
    /// Hand the message to the assistant.
    Freeform,
}

impl Intent {
    /// Label stored in `SessionState::intent` and used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::NeedsWelcome => "intro",
            Intent::Greeting => "greeting",
            Intent::MenuRequest => "menu",
            Intent::OrderDetected(_) => "order",
            Intent::Freeform => "freeform",
        }
    }
}

/// One inbound message as seen by the rules.
struct Turn<'a> {
    /// Trimmed and lowercased text.
    normalized: &'a str,
    state: &'a SessionState,
    now: DateTime<Utc>,
}

/// A named classification rule.
struct Rule {
    name: &'static str,
    check: fn(&IntentRouter, &Turn<'_>) -> Option<Intent>,
}

/// Rules in priority order.
const RULES: &[Rule] = &[
    Rule {
        name: "welcome",
        check: IntentRouter::welcome_rule,
    },
    Rule {
        name: "greeting",
        check: IntentRouter::greeting_rule,
    },
    Rule {
        name: "menu",
        check: IntentRouter::menu_rule,
    },
    Rule {
        name: "order",
        check: IntentRouter::order_rule,
    },
];

/// Classifies inbound messages into [`Intent`]s.
#[derive(Debug, Clone)]
pub struct IntentRouter {
    greetings: HashSet<String>,
    menu_keyword: String,
    regreet_after: Duration,
    matcher: OrderMatcher,
    catalog: Arc<Catalog>,
}

impl IntentRouter {
    /// Create a router from the routing and session config sections.
    pub fn new(
        routing: &RoutingConfig,
        session: &SessionConfig,
        catalog: Arc<Catalog>,
    ) -> Result<Self, BotError> {
        let regreet_after = i64::try_from(session.regreet_after_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                BotError::Config(format!(
                    "session.regreet_after_secs out of range: {}",
                    session.regreet_after_secs
                ))
            })?;

        Ok(Self {
            greetings: routing
                .greeting_phrases
                .iter()
                .map(|p| p.trim().to_lowercase())
                .collect(),
            menu_keyword: routing.menu_keyword.trim().to_lowercase(),
            regreet_after,
            matcher: OrderMatcher::new()?,
            catalog,
        })
    }

    /// Classify a non-empty message for a user in `state` at time `now`.
    pub fn classify(&self, text: &str, state: &SessionState, now: DateTime<Utc>) -> Intent {
        let normalized = text.trim().to_lowercase();
        let turn = Turn {
            normalized: &normalized,
            state,
            now,
        };

        for rule in RULES {
            if let Some(intent) = (rule.check)(self, &turn) {
                tracing::debug!(rule = rule.name, intent = intent.label(), "intent matched");
                return intent;
            }
        }

        tracing::debug!(intent = "freeform", "no rule matched");
        Intent::Freeform
    }

    fn welcome_rule(&self, turn: &Turn<'_>) -> Option<Intent> {
        turn.state
            .welcome_due(turn.now, self.regreet_after)
            .then_some(Intent::NeedsWelcome)
    }

    fn greeting_rule(&self, turn: &Turn<'_>) -> Option<Intent> {
        self.greetings
            .contains(turn.normalized)
            .then_some(Intent::Greeting)
    }

    fn menu_rule(&self, turn: &Turn<'_>) -> Option<Intent> {
        turn.normalized
            .contains(&self.menu_keyword)
            .then_some(Intent::MenuRequest)
    }

    fn order_rule(&self, turn: &Turn<'_>) -> Option<Intent> {
        self.matcher
            .detect_order(turn.normalized, &self.catalog)
            .map(Intent::OrderDetected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodbites_types::config::MenuConfig;

    fn router() -> IntentRouter {
        let catalog = Arc::new(Catalog::from_config(&MenuConfig::default()).unwrap());
        IntentRouter::new(
            &RoutingConfig::default(),
            &SessionConfig::default(),
            catalog,
        )
        .unwrap()
    }

    fn greeted(now: DateTime<Utc>) -> SessionState {
        let mut state = SessionState::default();
        state.mark_welcomed(now - Duration::hours(1), "intro");
        state
    }

    #[test]
    fn test_new_user_always_welcomed() {
        let now = Utc::now();
        let state = SessionState::default();
        for text in ["Hi", "menu", "2 egusi soup", "where are you located?"] {
            assert_eq!(
                router().classify(text, &state, now),
                Intent::NeedsWelcome,
                "text: {text}"
            );
        }
    }

    #[test]
    fn test_regreet_after_a_day() {
        let now = Utc::now();
        let mut state = SessionState::default();
        state.mark_welcomed(now - Duration::hours(25), "intro");
        assert_eq!(router().classify("menu", &state, now), Intent::NeedsWelcome);

        let state = greeted(now);
        assert_eq!(router().classify("menu", &state, now), Intent::MenuRequest);
    }

    #[test]
    fn test_greeting_must_be_whole_message() {
        let now = Utc::now();
        let state = greeted(now);
        assert_eq!(router().classify("  Good Morning ", &state, now), Intent::Greeting);
        assert_eq!(router().classify("hey", &state, now), Intent::Greeting);
        assert_ne!(
            router().classify("hi, do you deliver to ikeja?", &state, now),
            Intent::Greeting
        );
    }

    #[test]
    fn test_menu_keyword_anywhere() {
        let now = Utc::now();
        let state = greeted(now);
        assert_eq!(
            router().classify("📋 View Menu", &state, now),
            Intent::MenuRequest
        );
        assert_eq!(
            router().classify("can I see today's MENU please", &state, now),
            Intent::MenuRequest
        );
    }

    #[test]
    fn test_menu_beats_order() {
        let now = Utc::now();
        let state = greeted(now);
        assert_eq!(
            router().classify("is jollof on the menu", &state, now),
            Intent::MenuRequest
        );
    }

    #[test]
    fn test_order_detected() {
        let now = Utc::now();
        let state = greeted(now);
        match router().classify("2 egusi soup", &state, now) {
            Intent::OrderDetected(line) => {
                assert_eq!(line.quantity, 2);
                assert_eq!(line.total_price, 5600);
            }
            other => panic!("Expected order, got: {other:?}"),
        }
    }

    #[test]
    fn test_everything_else_is_freeform() {
        let now = Utc::now();
        let state = greeted(now);
        assert_eq!(
            router().classify("what's your support number on sunday", &state, now),
            Intent::Freeform
        );
        assert_eq!(
            router().classify("🚚 Delivery Info", &state, now),
            Intent::Freeform
        );
    }

    #[test]
    fn test_custom_trigger_words() {
        let catalog = Arc::new(Catalog::from_config(&MenuConfig::default()).unwrap());
        let routing = RoutingConfig {
            greeting_phrases: vec!["Bawo".to_string()],
            menu_keyword: "Food List".to_string(),
        };
        let router = IntentRouter::new(&routing, &SessionConfig::default(), catalog).unwrap();

        let now = Utc::now();
        let state = greeted(now);
        assert_eq!(router.classify("bawo", &state, now), Intent::Greeting);
        assert_eq!(router.classify("hi", &state, now), Intent::Freeform);
        assert_eq!(
            router.classify("send the food list", &state, now),
            Intent::MenuRequest
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(Intent::NeedsWelcome.label(), "intro");
        assert_eq!(Intent::MenuRequest.label(), "menu");
        assert_eq!(Intent::Freeform.label(), "freeform");
    }
}
