//! Discord interaction payloads (incoming) and interaction responses (outgoing).

use crate::domain::model::UserId;
use crate::utils::error::{BotError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const INTERACTION_PING: u8 = 1;
pub const INTERACTION_COMMAND: u8 = 2;
pub const INTERACTION_COMPONENT: u8 = 3;

pub const RESPONSE_PONG: u8 = 1;
pub const RESPONSE_MESSAGE: u8 = 4;
pub const RESPONSE_DEFERRED_MESSAGE: u8 = 5;
pub const RESPONSE_UPDATE_MESSAGE: u8 = 7;

pub const FLAG_EPHEMERAL: u64 = 1 << 6;
const PERMISSION_ADMINISTRATOR: u64 = 1 << 3;

pub fn parse_snowflake(field: &str, raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| BotError::interaction(format!("{} is not a snowflake: {:?}", field, raw)))
}

#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub data: Option<InteractionData>,
    #[serde(default)]
    pub member: Option<Member>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Interaction token for editing the original response later.
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub custom_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    pub user: User,
    #[serde(default)]
    pub permissions: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
}

impl Interaction {
    /// Guild interactions carry the user inside `member`, DMs at the top level.
    pub fn actor_id(&self) -> Result<UserId> {
        let user = self
            .member
            .as_ref()
            .map(|m| &m.user)
            .or(self.user.as_ref())
            .ok_or_else(|| BotError::interaction("interaction without user"))?;
        parse_snowflake("user.id", &user.id)
    }

    pub fn channel(&self) -> Option<u64> {
        self.channel_id.as_deref().and_then(|c| c.parse().ok())
    }

    pub fn is_admin(&self) -> bool {
        self.member
            .as_ref()
            .and_then(|m| m.permissions.as_deref())
            .and_then(|p| p.parse::<u64>().ok())
            .map(|bits| bits & PERMISSION_ADMINISTRATOR != 0)
            .unwrap_or(false)
    }

    pub fn command_name(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.name.as_deref())
    }

    pub fn custom_id(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.custom_id.as_deref())
    }

    fn option(&self, name: &str) -> Option<&Value> {
        self.data
            .as_ref()?
            .options
            .iter()
            .find(|o| o.name == name)?
            .value
            .as_ref()
    }

    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.option(name).and_then(|v| v.as_str())
    }

    pub fn option_i64(&self, name: &str) -> Option<i64> {
        self.option(name).and_then(|v| v.as_i64())
    }

    /// User options arrive as snowflake strings.
    pub fn option_user(&self, name: &str) -> Option<UserId> {
        self.option_str(name).and_then(|v| v.parse().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<MessageData>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: RESPONSE_PONG,
            data: None,
        }
    }

    pub fn message(data: MessageData) -> Self {
        Self {
            kind: RESPONSE_MESSAGE,
            data: Some(data),
        }
    }

    /// "Bot is thinking" placeholder, visible only to the caller until edited.
    pub fn deferred_ephemeral() -> Self {
        Self {
            kind: RESPONSE_DEFERRED_MESSAGE,
            data: Some(MessageData::default().ephemeral()),
        }
    }

    pub fn update(data: MessageData) -> Self {
        Self {
            kind: RESPONSE_UPDATE_MESSAGE,
            data: Some(data),
        }
    }

    /// 只有呼叫者看得到的文字回覆
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self::message(MessageData::text(content).ephemeral())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessageData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Embed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<ActionRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

impl MessageData {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: Some(vec![embed]),
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.components = Some(vec![ActionRow::new(buttons)]);
        self
    }

    /// An empty component list removes existing buttons on update.
    pub fn without_components(mut self) -> Self {
        self.components = Some(Vec::new());
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.flags = Some(FLAG_EPHEMERAL);
        self
    }

    pub fn is_ephemeral(&self) -> bool {
        self.flags.map(|f| f & FLAG_EPHEMERAL != 0).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRow {
    #[serde(rename = "type")]
    pub kind: u8,
    pub components: Vec<Button>,
}

impl ActionRow {
    pub fn new(components: Vec<Button>) -> Self {
        Self {
            kind: 1,
            components,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Secondary = 2,
    Success = 3,
    Danger = 4,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Button {
    #[serde(rename = "type")]
    pub kind: u8,
    pub style: u8,
    pub label: String,
    pub custom_id: String,
}

impl Button {
    pub fn new(style: ButtonStyle, label: impl Into<String>, custom_id: impl Into<String>) -> Self {
        Self {
            kind: 2,
            style: style as u8,
            label: label.into(),
            custom_id: custom_id.into(),
        }
    }
}
