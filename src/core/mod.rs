pub mod catalog;
pub mod game;
pub mod inventory;
pub mod leaderboard;
pub mod trade;

pub use crate::domain::model::{Card, InventoryEntry, Rarity, UserId};
pub use crate::domain::ports::{Clock, DiscordApi};
pub use crate::utils::error::Result;
pub use game::GameService;
