#[cfg(feature = "cli")]
pub mod cli;
pub mod rules;

use crate::utils::error::{BotError, Result};
use crate::utils::validation::{
    validate_path, validate_public_key, validate_url, Validate,
};
use rules::GameRules;
use std::net::SocketAddr;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Clone)]
pub struct BotConfig {
    pub token: String,
    pub application_id: u64,
    pub public_key: String,
    pub guild_id: Option<u64>,
    pub db_path: String,
    pub cards_json: String,
    pub bind_addr: String,
    pub api_base: String,
    pub rules: GameRules,
}

// Token 不可出現在日誌中
impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"***")
            .field("application_id", &self.application_id)
            .field("guild_id", &self.guild_id)
            .field("db_path", &self.db_path)
            .field("cards_json", &self.cards_json)
            .field("bind_addr", &self.bind_addr)
            .field("api_base", &self.api_base)
            .field("rules", &self.rules)
            .finish()
    }
}

impl BotConfig {
    /// 從環境變數載入 (若存在 .env 會先讀取)
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("⚠️ Could not read .env file: {}", e),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("DISCORD_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| BotError::MissingConfigError {
                field: "DISCORD_TOKEN".to_string(),
            })?;

        let raw_app_id = lookup("DISCORD_APPLICATION_ID").ok_or_else(|| {
            BotError::MissingConfigError {
                field: "DISCORD_APPLICATION_ID".to_string(),
            }
        })?;
        let application_id =
            raw_app_id
                .trim()
                .parse::<u64>()
                .map_err(|_| BotError::InvalidConfigValueError {
                    field: "DISCORD_APPLICATION_ID".to_string(),
                    value: raw_app_id.clone(),
                    reason: "Must be a numeric Discord ID".to_string(),
                })?;

        let public_key = lookup("DISCORD_PUBLIC_KEY").ok_or_else(|| {
            BotError::MissingConfigError {
                field: "DISCORD_PUBLIC_KEY".to_string(),
            }
        })?;

        let guild_id = match lookup("GUILD_ID").filter(|g| !g.trim().is_empty()) {
            None => None,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    tracing::warn!(
                        "⚠️ GUILD_ID is not numeric: {:?}. Falling back to global sync.",
                        raw
                    );
                    None
                }
            },
        };

        let mut rules = GameRules::default();
        if let Some(raw) = lookup("DUPLICATE_COINS") {
            rules.shop_duplicate_coins =
                raw.trim()
                    .parse::<i64>()
                    .map_err(|_| BotError::InvalidConfigValueError {
                        field: "DUPLICATE_COINS".to_string(),
                        value: raw.clone(),
                        reason: "Must be an integer".to_string(),
                    })?;
        }

        Ok(Self {
            token,
            application_id,
            public_key: public_key.trim().to_string(),
            guild_id,
            db_path: lookup("DB_PATH").unwrap_or_else(|| "cards.db".to_string()),
            cards_json: lookup("CARDS_JSON").unwrap_or_else(|| "cards.json".to_string()),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            api_base: lookup("DISCORD_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            rules,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_addr
            .parse()
            .map_err(|_| BotError::InvalidConfigValueError {
                field: "BIND_ADDR".to_string(),
                value: self.bind_addr.clone(),
                reason: "Expected host:port".to_string(),
            })
    }
}

impl Validate for BotConfig {
    fn validate(&self) -> Result<()> {
        validate_public_key("DISCORD_PUBLIC_KEY", &self.public_key)?;
        validate_url("DISCORD_API_BASE", &self.api_base)?;
        validate_path("DB_PATH", &self.db_path)?;
        validate_path("CARDS_JSON", &self.cards_json)?;
        self.socket_addr()?;
        self.rules.validate()?;

        tracing::debug!("✅ Bot configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DISCORD_TOKEN", "s3cr3t"),
            ("DISCORD_APPLICATION_ID", "1234"),
            (
                "DISCORD_PUBLIC_KEY",
                "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a",
            ),
        ]
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let err = BotConfig::from_lookup(env(&[("DISCORD_APPLICATION_ID", "1")])).unwrap_err();
        assert!(matches!(err, BotError::MissingConfigError { ref field } if field == "DISCORD_TOKEN"));
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(env(&base())).unwrap();
        assert_eq!(config.db_path, "cards.db");
        assert_eq!(config.cards_json, "cards.json");
        assert_eq!(config.guild_id, None);
        assert_eq!(config.rules.shop_duplicate_coins, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_numeric_guild_falls_back_to_global() {
        let mut vars = base();
        vars.push(("GUILD_ID", "abc"));
        let config = BotConfig::from_lookup(env(&vars)).unwrap();
        assert_eq!(config.guild_id, None);

        let mut vars = base();
        vars.push(("GUILD_ID", "987"));
        let config = BotConfig::from_lookup(env(&vars)).unwrap();
        assert_eq!(config.guild_id, Some(987));
    }

    #[test]
    fn test_duplicate_coins_override() {
        let mut vars = base();
        vars.push(("DUPLICATE_COINS", "7"));
        let config = BotConfig::from_lookup(env(&vars)).unwrap();
        assert_eq!(config.rules.shop_duplicate_coins, 7);

        let mut vars = base();
        vars.push(("DUPLICATE_COINS", "many"));
        assert!(BotConfig::from_lookup(env(&vars)).is_err());
    }

    #[test]
    fn test_debug_hides_token() {
        let config = BotConfig::from_lookup(env(&base())).unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("s3cr3t"));
        assert!(printed.contains("***"));
    }

    #[test]
    fn test_invalid_public_key_fails_validation() {
        let vars = vec![
            ("DISCORD_TOKEN", "token"),
            ("DISCORD_APPLICATION_ID", "1234"),
            ("DISCORD_PUBLIC_KEY", "nothex"),
        ];
        let config = BotConfig::from_lookup(env(&vars)).unwrap();
        assert!(config.validate().is_err());
    }
}
