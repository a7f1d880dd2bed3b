/// Conversation engine for the FoodBites WhatsApp bot.
///
/// Turns one inbound customer message into the replies to send:
/// - **Catalog**: read-only menu with name lookup
/// - **Order**: quantity + item heuristic over free text
/// - **Formatter**: welcome, menu, order summary and apology payloads
/// - **Router**: ordered intent rules (welcome, greeting, menu, order, freeform)
/// - **Assistant**: bounded-prompt LLM delegate for free-form messages
/// - **Engine**: session load, classify, reply, persist, deliver
/// - **Locks**: per-user serialization of turns
/// - **LLM**: OpenAI and Ollama providers with a fallback router
pub mod assistant;
pub mod catalog;
pub mod engine;
pub mod formatter;
pub mod llm;
pub mod locks;
pub mod order;
pub mod router;

pub use engine::{ConversationEngine, EngineDeps};
