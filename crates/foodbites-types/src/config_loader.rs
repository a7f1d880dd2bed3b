/// Config directory loader with validation.
///
/// Reads all config from a directory path and validates it on load. A file
/// that is absent falls back to the built-in default for its section; a file
/// that is present but malformed is an error.
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::config::*;
use crate::errors::BotError;

/// Upper bound on the session TTL and the re-greet interval (one year).
const MAX_SESSION_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

/// WhatsApp's limit on the number of reply buttons in one message.
const MAX_BUTTONS: usize = 3;

/// WhatsApp's limit on the length of a reply button title.
const MAX_BUTTON_TITLE_CHARS: usize = 20;

/// Loads and validates configuration from a directory.
///
/// Expected directory structure:
/// ```text
/// config/
/// ├── bot.yaml
/// ├── menu.yaml
/// └── business.yaml
/// ```
pub struct ConfigLoader {
    /// Root config directory path.
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given directory.
    pub fn new(config_dir: &Path) -> Self {
        Self {
            config_dir: config_dir.to_path_buf(),
        }
    }

    /// Load all configuration from the directory and validate it.
    pub fn load(&self) -> Result<FoodBitesConfig, BotError> {
        let mut config = Self::load_all(&self.config_dir)?;
        Self::normalize(&mut config);
        Self::validate(&config)?;
        tracing::info!(
            dir = %self.config_dir.display(),
            categories = config.menu.categories.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Load all config files from a directory without validating them.
    pub fn load_all(config_dir: &Path) -> Result<FoodBitesConfig, BotError> {
        if !config_dir.is_dir() {
            return Err(BotError::Config(format!(
                "config directory {} does not exist",
                config_dir.display()
            )));
        }

        Ok(FoodBitesConfig {
            bot: Self::load_yaml_or_default(config_dir, "bot.yaml")?,
            menu: Self::load_yaml_or_default(config_dir, "menu.yaml")?,
            business: Self::load_yaml_or_default(config_dir, "business.yaml")?,
        })
    }

    /// Load one YAML file, or the section default when the file is absent.
    fn load_yaml_or_default<T: DeserializeOwned + Default>(
        config_dir: &Path,
        file_name: &str,
    ) -> Result<T, BotError> {
        let path = config_dir.join(file_name);
        if !path.exists() {
            tracing::debug!(file = %path.display(), "config file absent, using defaults");
            return Ok(T::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| BotError::Config(format!("failed to read {}: {e}", path.display())))?;
        serde_yaml::from_str(&content)
            .map_err(|e| BotError::Config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Canonicalize values the router compares against normalized input.
    pub fn normalize(config: &mut FoodBitesConfig) {
        let routing = &mut config.bot.routing;
        for phrase in &mut routing.greeting_phrases {
            *phrase = phrase.trim().to_lowercase();
        }
        routing.menu_keyword = routing.menu_keyword.trim().to_lowercase();
    }

    /// Validate the aggregate config for internal consistency.
    ///
    /// Checks:
    /// - Session TTL, history window and re-greet interval are positive
    /// - Assistant history size and timeout are positive
    /// - Greeting phrases and the menu keyword are non-empty
    /// - Button labels fit WhatsApp's limits
    /// - The welcome sequence has exactly two images
    /// - The menu has unique, non-empty categories with named, priced items
    pub fn validate(config: &FoodBitesConfig) -> Result<(), BotError> {
        Self::validate_session(&config.bot.session)?;
        Self::validate_routing(&config.bot.routing)?;
        Self::validate_assistant(&config.bot.assistant)?;
        Self::validate_assets(&config.bot.assets)?;
        Self::validate_menu(&config.menu)?;
        Ok(())
    }

    fn validate_session(session: &SessionConfig) -> Result<(), BotError> {
        for (name, value) in [
            ("ttl_secs", session.ttl_secs),
            ("regreet_after_secs", session.regreet_after_secs),
            ("sweep_interval_secs", session.sweep_interval_secs),
        ] {
            if value == 0 {
                return Err(BotError::Config(format!(
                    "session.{name} must be positive (got 0)"
                )));
            }
        }
        for (name, value) in [
            ("ttl_secs", session.ttl_secs),
            ("regreet_after_secs", session.regreet_after_secs),
        ] {
            let in_range = i64::try_from(value)
                .ok()
                .and_then(chrono::Duration::try_seconds)
                .is_some();
            if !in_range || value > MAX_SESSION_INTERVAL_SECS {
                return Err(BotError::Config(format!(
                    "session.{name} must be at most {MAX_SESSION_INTERVAL_SECS} seconds (got {value})"
                )));
            }
        }
        if session.history_window == 0 {
            return Err(BotError::Config(
                "session.history_window must be positive (got 0)".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_routing(routing: &RoutingConfig) -> Result<(), BotError> {
        if routing.greeting_phrases.is_empty() {
            return Err(BotError::Config(
                "routing.greeting_phrases must not be empty".to_string(),
            ));
        }
        if let Some(blank) = routing.greeting_phrases.iter().position(|p| p.trim().is_empty()) {
            return Err(BotError::Config(format!(
                "routing.greeting_phrases[{blank}] is blank"
            )));
        }
        if routing.menu_keyword.trim().is_empty() {
            return Err(BotError::Config(
                "routing.menu_keyword must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_assistant(assistant: &AssistantConfig) -> Result<(), BotError> {
        if assistant.history_turns == 0 {
            return Err(BotError::Config(
                "assistant.history_turns must be positive (got 0)".to_string(),
            ));
        }
        if assistant.timeout_secs == 0 {
            return Err(BotError::Config(
                "assistant.timeout_secs must be positive (got 0)".to_string(),
            ));
        }
        if assistant.model.trim().is_empty() {
            return Err(BotError::Config(
                "assistant.model must not be empty".to_string(),
            ));
        }
        if assistant.fallback.is_some() && assistant.fallback_model.is_none() {
            return Err(BotError::Config(
                "assistant.fallback requires assistant.fallback_model".to_string(),
            ));
        }
        if let Some(t) = assistant.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(BotError::Config(format!(
                    "assistant.temperature must be within 0.0-2.0 (got {t})"
                )));
            }
        }
        Ok(())
    }

    fn validate_assets(assets: &AssetsConfig) -> Result<(), BotError> {
        if assets.welcome_images.len() != 2 {
            return Err(BotError::Config(format!(
                "assets.welcome_images must hold exactly 2 images (got {})",
                assets.welcome_images.len()
            )));
        }
        if assets.option_labels.is_empty() || assets.option_labels.len() > MAX_BUTTONS {
            return Err(BotError::Config(format!(
                "assets.option_labels must hold 1-{MAX_BUTTONS} labels (got {})",
                assets.option_labels.len()
            )));
        }
        for label in &assets.option_labels {
            let len = label.chars().count();
            if len == 0 || len > MAX_BUTTON_TITLE_CHARS {
                return Err(BotError::Config(format!(
                    "button label '{label}' must be 1-{MAX_BUTTON_TITLE_CHARS} characters (got {len})"
                )));
            }
        }
        if assets.apology.trim().is_empty() {
            return Err(BotError::Config(
                "assets.apology must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_menu(menu: &MenuConfig) -> Result<(), BotError> {
        check_menu(&menu.categories).map_err(BotError::Config)
    }
}
