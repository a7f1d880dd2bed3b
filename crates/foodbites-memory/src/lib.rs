/// Session storage backends for the FoodBites bot.
///
/// Both implement [`foodbites_types::SessionStore`]:
/// - **InMemory**: `DashMap`-backed store for a single instance, swept on a timer
/// - **Postgres**: shared store for several instances, expiry enforced in SQL
pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemorySessionStore;
pub use postgres::PgSessionStore;
