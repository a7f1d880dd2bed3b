/// Shared types, traits, and errors for the FoodBites WhatsApp bot.
///
/// This crate is the foundation that all other FoodBites crates depend on.
/// It contains:
/// - **Trait contracts** (`traits`) for the collaborators the conversation engine talks to
/// - **Shared data types** (`models`) used across all subsystems
/// - **Error types** (`errors`) for unified error handling
/// - **Config types** (`config`) and the config directory loader (`config_loader`)
pub mod config;
pub mod config_loader;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export commonly used types at the crate root for convenience.
pub use errors::BotError;
pub use models::*;
pub use traits::*;
