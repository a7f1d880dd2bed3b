/// Unified error type for the FoodBites bot.
///
/// All modules use this error type for propagation across crate boundaries.
/// Internal module errors should be converted into the appropriate variant.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// Error from the catalog (invalid menu data).
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Error from a session store backend (unavailable, corrupt state).
    #[error("session store error: {0}")]
    Session(String),

    /// Database error (connection, query, migration).
    #[error("database error: {0}")]
    Database(String),

    /// Error from a channel adapter (WhatsApp Cloud API, webhook payloads).
    #[error("channel error: {0}")]
    Channel(String),

    /// Error from an LLM provider (API call failures, deserialization).
    #[error("LLM provider error: {0}")]
    LlmProvider(String),

    /// Error from the voice-note transcription service.
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Error from configuration loading or validation.
    #[error("config error: {0}")]
    Config(String),

    /// Rate limit exceeded on an upstream API.
    #[error("rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Timeout waiting for an external response.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Generic internal error for unexpected conditions.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for BotError {
    fn from(err: serde_yaml::Error) -> Self {
        BotError::Serialization(err.to_string())
    }
}
