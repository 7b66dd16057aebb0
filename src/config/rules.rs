use crate::domain::model::Rarity;
use crate::utils::error::{BotError, Result};
use crate::utils::validation::{validate_positive_number, validate_range, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_PULL_COOLDOWN_SECONDS: i64 = 5 * 60 * 60;
pub const DEFAULT_DUPLICATE_COINS: i64 = 5;
pub const LEADERBOARD_HARD_MAX: i64 = 25;

/// Tunable game economy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRules {
    pub pull_cooldown_seconds: i64,
    pub pull_duplicate_coins: i64,
    pub shop_price: i64,
    pub shop_duplicate_coins: i64,
    pub view_timeout_seconds: i64,
    pub leaderboard_default: i64,
    pub leaderboard_max: i64,
    /// Keyed by canonical rarity name.
    pub rarity_weights: BTreeMap<String, f64>,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            pull_cooldown_seconds: DEFAULT_PULL_COOLDOWN_SECONDS,
            pull_duplicate_coins: 2,
            shop_price: 10,
            shop_duplicate_coins: DEFAULT_DUPLICATE_COINS,
            view_timeout_seconds: 120,
            leaderboard_default: 10,
            leaderboard_max: LEADERBOARD_HARD_MAX,
            rarity_weights: Rarity::ALL
                .iter()
                .map(|r| (r.as_str().to_string(), r.default_weight()))
                .collect(),
        }
    }
}

impl Validate for GameRules {
    fn validate(&self) -> Result<()> {
        validate_positive_number("rules.pull_cooldown_seconds", self.pull_cooldown_seconds, 0)?;
        validate_positive_number("rules.pull_duplicate_coins", self.pull_duplicate_coins, 0)?;
        validate_positive_number("rules.shop_price", self.shop_price, 1)?;
        validate_positive_number("rules.shop_duplicate_coins", self.shop_duplicate_coins, 0)?;
        validate_positive_number("rules.view_timeout_seconds", self.view_timeout_seconds, 1)?;
        validate_range("rules.leaderboard_max", self.leaderboard_max, 1, LEADERBOARD_HARD_MAX)?;
        validate_range(
            "rules.leaderboard_default",
            self.leaderboard_default,
            1,
            self.leaderboard_max,
        )?;

        let mut total = 0.0;
        for (rarity, weight) in &self.rarity_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(BotError::InvalidConfigValueError {
                    field: format!("rarity_weights.{}", rarity),
                    value: weight.to_string(),
                    reason: "Weight must be a finite number >= 0".to_string(),
                });
            }
            total += weight;
        }
        if total <= 0.0 {
            return Err(BotError::ConfigValidationError {
                field: "rarity_weights".to_string(),
                message: "At least one rarity needs a positive weight".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesFile {
    pub rules: Option<RulesSection>,
    pub rarity_weights: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesSection {
    pub pull_cooldown_seconds: Option<i64>,
    pub pull_duplicate_coins: Option<i64>,
    pub shop_price: Option<i64>,
    pub shop_duplicate_coins: Option<i64>,
    pub view_timeout_seconds: Option<i64>,
    pub leaderboard_default: Option<i64>,
    pub leaderboard_max: Option<i64>,
}

impl RulesFile {
    /// 從 TOML 檔案載入規則
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BotError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析規則
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${SHOP_PRICE})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BotError::config(e.to_string()))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 將檔案中的設定覆蓋到現有規則上
    pub fn apply_to(&self, rules: &mut GameRules) -> Result<()> {
        if let Some(section) = &self.rules {
            if let Some(v) = section.pull_cooldown_seconds {
                rules.pull_cooldown_seconds = v;
            }
            if let Some(v) = section.pull_duplicate_coins {
                rules.pull_duplicate_coins = v;
            }
            if let Some(v) = section.shop_price {
                rules.shop_price = v;
            }
            if let Some(v) = section.shop_duplicate_coins {
                rules.shop_duplicate_coins = v;
            }
            if let Some(v) = section.view_timeout_seconds {
                rules.view_timeout_seconds = v;
            }
            if let Some(v) = section.leaderboard_default {
                rules.leaderboard_default = v;
            }
            if let Some(v) = section.leaderboard_max {
                rules.leaderboard_max = v;
            }
        }

        if let Some(weights) = &self.rarity_weights {
            for (name, weight) in weights {
                let rarity = Rarity::parse(name).ok_or_else(|| BotError::InvalidConfigValueError {
                    field: "rarity_weights".to_string(),
                    value: name.clone(),
                    reason: "Unknown rarity. Valid: Common, Rare, Ultra Rare, Legendary"
                        .to_string(),
                })?;
                rules
                    .rarity_weights
                    .insert(rarity.as_str().to_string(), *weight);
            }
        }
        Ok(())
    }
}
