use crate::domain::ports::{DiscordApi, PostOutcome};
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Thin client over the Discord REST API authenticated with the bot token.
#[derive(Clone)]
pub struct DiscordRestClient {
    client: Client,
    api_base: String,
    token: String,
    application_id: u64,
}

impl DiscordRestClient {
    pub fn new(api_base: &str, token: &str, application_id: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("tcg-bot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            application_id,
        })
    }

    fn commands_url(&self, guild_id: Option<u64>) -> String {
        match guild_id {
            Some(guild) => format!(
                "{}/applications/{}/guilds/{}/commands",
                self.api_base, self.application_id, guild
            ),
            None => format!("{}/applications/{}/commands", self.api_base, self.application_id),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }
}

#[async_trait]
impl DiscordApi for DiscordRestClient {
    async fn register_commands(&self, guild_id: Option<u64>, commands: &Value) -> Result<usize> {
        let url = self.commands_url(guild_id);
        tracing::debug!("Registering commands at: {}", url);

        let response = self
            .client
            .put(&url)
            .header("Authorization", self.auth_header())
            .json(commands)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::ApiStatusError {
                status: status.as_u16(),
                body,
            });
        }

        let synced: Value = response.json().await?;
        Ok(synced.as_array().map(|a| a.len()).unwrap_or(0))
    }

    async fn post_channel_message(&self, channel_id: u64, message: &Value) -> Result<PostOutcome> {
        let url = format!("{}/channels/{}/messages", self.api_base, channel_id);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(message)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(PostOutcome::Posted),
            StatusCode::FORBIDDEN => {
                tracing::warn!("⚠️ Missing permission to post in channel {}", channel_id);
                Ok(PostOutcome::Forbidden)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(BotError::ApiStatusError {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    async fn edit_original_response(&self, interaction_token: &str, message: &Value) -> Result<()> {
        // webhook 路徑以 interaction token 驗證，不需要 Bot token
        let url = format!(
            "{}/webhooks/{}/{}/messages/@original",
            self.api_base, self.application_id, interaction_token
        );
        let response = self.client.patch(&url).json(message).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::ApiStatusError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
