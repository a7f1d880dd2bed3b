/// Configuration types for the FoodBites bot.
///
/// Parsed from the YAML files of a config directory (see `config_loader`).
/// Every section has a `Default` matching the FoodBites Kitchen deployment,
/// so a missing optional field falls back to the production value.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{CatalogItem, Category};

/// Aggregate configuration loaded from a config directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodBitesConfig {
    /// Engine, routing, assistant and channel settings (`bot.yaml`).
    pub bot: BotConfig,
    /// The menu (`menu.yaml`).
    pub menu: MenuConfig,
    /// Business facts fed to the assistant prompt (`business.yaml`).
    pub business: BusinessProfile,
}

/// Top-level bot settings, parsed from `config/bot.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Session lifetime and history bounds.
    pub session: SessionConfig,
    /// Intent trigger data.
    pub routing: RoutingConfig,
    /// LLM assistant settings.
    pub assistant: AssistantConfig,
    /// Images and prompt texts used in replies.
    pub assets: AssetsConfig,
    /// Non-secret WhatsApp Cloud API settings.
    pub whatsapp: WhatsAppConfig,
}

/// Session store behaviour.
///
/// `ttl_secs` is the inactivity expiry of the whole session. It is unrelated
/// to `regreet_after_secs`, which only decides when the welcome sequence fires
/// again for a user whose session is still alive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Inactivity TTL of a session, in seconds.
    pub ttl_secs: u64,
    /// Maximum chat turns kept in a session.
    pub history_window: usize,
    /// Interval after which a greeted user is welcomed again, in seconds.
    pub regreet_after_secs: u64,
    /// How often the server sweeps expired sessions, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 20 * 60,
            history_window: 6,
            regreet_after_secs: 24 * 60 * 60,
            sweep_interval_secs: 60,
        }
    }
}

/// Trigger data for the deterministic intents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Phrases that count as a greeting when they are the whole message.
    pub greeting_phrases: Vec<String>,
    /// Substring that marks a menu request.
    pub menu_keyword: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            greeting_phrases: [
                "hi",
                "hello",
                "hey",
                "good morning",
                "good afternoon",
                "good evening",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            menu_keyword: "menu".to_string(),
        }
    }
}

/// Which LLM backend answers freeform messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// OpenAI Chat Completions API.
    OpenAi,
    /// Local Ollama instance.
    Ollama,
}

/// Settings for the LLM-backed assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Primary backend.
    pub provider: LlmBackend,
    /// Optional fallback backend tried when the primary fails.
    pub fallback: Option<LlmBackend>,
    /// Model identifier for the primary backend.
    pub model: String,
    /// Model identifier for the fallback backend.
    pub fallback_model: Option<String>,
    /// Maximum tokens per reply.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Number of history turns included in each prompt.
    pub history_turns: usize,
    /// Upper bound on one completion call, in seconds.
    pub timeout_secs: u64,
    /// Base URL of the OpenAI-compatible API.
    pub openai_base_url: String,
    /// Base URL of the Ollama API.
    pub ollama_base_url: String,
    /// Model used for voice-note transcription.
    pub transcription_model: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            provider: LlmBackend::OpenAi,
            fallback: None,
            model: "gpt-4o-mini".to_string(),
            fallback_model: None,
            max_tokens: 512,
            temperature: Some(0.7),
            history_turns: 6,
            timeout_secs: 30,
            openai_base_url: "https://api.openai.com".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            transcription_model: "whisper-1".to_string(),
        }
    }
}

/// An image reference with its caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    /// `http(s)` URL or uploaded media id.
    pub media: String,
    /// Caption shown under the image.
    pub caption: String,
}

/// Reply texts and images.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// The two images that open the welcome sequence.
    pub welcome_images: Vec<ImageAsset>,
    /// Button prompt closing the welcome sequence.
    pub welcome_prompt: String,
    /// Button prompt for returning users who say hello.
    pub welcome_back_prompt: String,
    /// Quick-reply options offered with both prompts.
    pub option_labels: Vec<String>,
    /// Image sent before the formatted menu.
    pub menu_image: ImageAsset,
    /// Currency symbol used in order summaries.
    pub currency_symbol: String,
    /// Message sent when the assistant cannot answer.
    pub apology: String,
    /// Message sent when a voice note cannot be transcribed.
    pub voice_failure: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            welcome_images: vec![
                ImageAsset {
                    media: "https://cdn.foodbites.example/welcome/kitchen.jpg".to_string(),
                    caption: "🍲 Freshly cooked Nigerian meals, every day.".to_string(),
                },
                ImageAsset {
                    media: "https://cdn.foodbites.example/welcome/delivery.jpg".to_string(),
                    caption: "🚚 Fast delivery across the city.".to_string(),
                },
            ],
            welcome_prompt: "👋 Welcome to FoodBites Kitchen! How can we help you today?"
                .to_string(),
            welcome_back_prompt: "👋 Welcome back to FoodBites Kitchen! How can we help you today?"
                .to_string(),
            option_labels: vec![
                "📋 View Menu".to_string(),
                "🚚 Delivery Info".to_string(),
                "💰 Pricing".to_string(),
            ],
            menu_image: ImageAsset {
                media: "https://i.imgur.com/2TcH7d6_d.png".to_string(),
                caption: "📋 *FoodBites Kitchen Menu*: here's what's cooking today!".to_string(),
            },
            currency_symbol: "₦".to_string(),
            apology: "😔 Sorry, I'm having trouble answering right now. Please try again in a moment or call us on 080-7237-8767.".to_string(),
            voice_failure: "⚠️ Sorry, I couldn't process that voice message.".to_string(),
        }
    }
}

/// Non-secret WhatsApp Cloud API settings. Tokens come from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppConfig {
    /// Graph API base URL.
    pub api_base: String,
    /// Graph API version segment (e.g. "v21.0").
    pub api_version: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_base: "https://graph.facebook.com".to_string(),
            api_version: "v21.0".to_string(),
        }
    }
}

/// The menu, parsed from `config/menu.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuConfig {
    /// Categories in display order.
    pub categories: Vec<Category>,
}

/// Rules every menu obeys, whether it comes from a file or is built in code:
/// at least one category, unique non-empty category names, and items with a
/// name and a price. Returns the first problem found.
pub fn check_menu(categories: &[Category]) -> Result<(), String> {
    if categories.is_empty() {
        return Err("menu has no categories".to_string());
    }

    let mut seen = HashSet::new();
    for category in categories {
        if category.name.trim().is_empty() {
            return Err("menu category with empty name".to_string());
        }
        if !seen.insert(category.name.as_str()) {
            return Err(format!("duplicate menu category '{}'", category.name));
        }
        for item in &category.items {
            if item.name.trim().is_empty() {
                return Err(format!(
                    "menu category '{}' has an item with an empty name",
                    category.name
                ));
            }
            if item.price.trim().is_empty() {
                return Err(format!("menu item '{}' has no price", item.name));
            }
        }
    }
    Ok(())
}

impl Default for MenuConfig {
    fn default() -> Self {
        let item = |name: &str, description: &str, price: &str| CatalogItem {
            name: name.to_string(),
            description: Some(description.to_string()),
            price: price.to_string(),
        };
        Self {
            categories: vec![Category {
                name: "Main Courses (Lunch & Dinner)".to_string(),
                items: vec![
                    item(
                        "Jollof Rice & Chicken",
                        "Classic Nigerian jollof with fried or grilled chicken",
                        "₦2,500",
                    ),
                    item(
                        "Fried Rice & Dodo",
                        "Fried rice with plantain and peppered chicken or beef",
                        "₦2,700",
                    ),
                    item(
                        "Ofada Rice & Ayamase Sauce",
                        "Local rice with spicy green ofada stew and assorted meat",
                        "₦3,000",
                    ),
                    item(
                        "Egusi Soup & Pounded Yam",
                        "Melon seed soup with beef, fish, and vegetable",
                        "₦2,800",
                    ),
                    item(
                        "Efo Riro & Amala/Fufu",
                        "Rich spinach stew with assorted meat",
                        "₦2,500",
                    ),
                    item(
                        "Bitterleaf Soup & Fufu",
                        "Traditional onugbu soup with meat and stockfish",
                        "₦2,700",
                    ),
                    item(
                        "Oha Soup & Semovita",
                        "Eastern Nigerian delicacy with oha leaves and proteins",
                        "₦2,800",
                    ),
                    item("Okra Soup & Eba", "Fresh okra soup with fish or beef", "₦2,500"),
                    item(
                        "Pepper Soup (Goat / Catfish)",
                        "Spicy broth with your choice of meat or fish",
                        "₦2,500 / ₦3,000",
                    ),
                    item(
                        "Native Jollof (Palm Oil Rice)",
                        "Local-style rice with smoked fish, crayfish, and traditional seasonings",
                        "₦2,600",
                    ),
                ],
            }],
        }
    }
}

/// Business facts embedded in the assistant's system prompt,
/// parsed from `config/business.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessProfile {
    /// Name the assistant introduces itself with.
    pub assistant_name: String,
    /// Trading name of the business.
    pub business_name: String,
    /// One-line description of the business.
    pub tagline: String,
    /// Topics the assistant helps with.
    pub topics: Vec<String>,
    /// Free-form facts, one per line ("Small package: ₦2,500").
    pub facts: Vec<String>,
    /// Support hours; `day` is "daily" or a weekday name.
    pub support_hours: Vec<SupportHours>,
    /// Contact phone number.
    pub phone: String,
    /// Tone directive.
    pub tone: String,
    /// Extra behavioural rules appended to the prompt.
    pub rules: Vec<String>,
}

/// Support hours for one day (or "daily").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportHours {
    /// "daily" or a weekday name.
    pub day: String,
    /// Opening window, e.g. "8am–8pm".
    pub hours: String,
}

impl Default for BusinessProfile {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        let hours = |day: &str, hours: &str| SupportHours {
            day: day.to_string(),
            hours: hours.to_string(),
        };
        Self {
            assistant_name: "FoodBites Kitchen Customer Support Bot".to_string(),
            business_name: "FoodBites Restaurants".to_string(),
            tagline: "a fast, reliable, and affordable food delivery service in Nigeria"
                .to_string(),
            topics: strings(&[
                "Menu options",
                "Delivery times",
                "Pricing",
                "Business hours",
                "Contact and support",
            ]),
            facts: strings(&[
                "Small package: ₦2,500",
                "Medium package: ₦8,000",
                "Large package: ₦20,000",
                "Within city: 1–2 hours",
                "Nearby cities: 3–5 hours",
                "Nationwide: 24–72 hours",
                "Pickup: free for orders over ₦10,000",
                "Drop-off: free for orders over ₦15,000",
                "Tracking: available via WhatsApp or website",
            ]),
            support_hours: vec![
                hours("daily", "8am–8pm"),
                hours("Sunday", "2pm–8pm"),
                hours("Monday", "9am–8pm"),
                hours("Tuesday", "8am–8pm"),
                hours("Wednesday", "8am–8pm"),
                hours("Thursday", "8am–8pm"),
                hours("Friday", "8am–8pm"),
                hours("Saturday", "10am–8pm"),
            ],
            phone: "080-7237-8767".to_string(),
            tone: "friendly, professional, reassuring".to_string(),
            rules: strings(&[
                "Always give helpful, accurate responses specific to FoodBites and avoid generic AI phrases.",
                "If a customer asks something unrelated, politely bring the focus back to deliveries or menu options.",
                "Orders are detected and totalled automatically; you only handle follow-ups such as pickup or delivery and cooking time.",
                "Never invent new dishes or prices.",
                "Always use a friendly, conversational Nigerian tone.",
            ]),
        }
    }
}
