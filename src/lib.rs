pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::{discord_rest::DiscordRestClient, sqlite::SqliteStore, SystemClock};
pub use app::router::InteractionRouter;
pub use config::BotConfig;
pub use core::game::GameService;
pub use utils::error::{BotError, Result};
