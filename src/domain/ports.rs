use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

pub trait Clock: Send + Sync {
    /// Unix timestamp in seconds.
    fn now(&self) -> i64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    Posted,
    /// 機器人在該頻道沒有發言權限
    Forbidden,
}

#[async_trait]
pub trait DiscordApi: Send + Sync {
    /// Bulk-overwrites the application's commands; returns how many Discord accepted.
    async fn register_commands(&self, guild_id: Option<u64>, commands: &Value) -> Result<usize>;

    async fn post_channel_message(&self, channel_id: u64, message: &Value) -> Result<PostOutcome>;

    /// Replaces the (deferred) original response of an interaction.
    async fn edit_original_response(&self, interaction_token: &str, message: &Value) -> Result<()>;
}
