use serde::{Deserialize, Serialize};
use std::fmt;

pub type UserId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    UltraRare,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [
        Rarity::Common,
        Rarity::Rare,
        Rarity::UltraRare,
        Rarity::Legendary,
    ];

    /// 資料庫與卡片 JSON 使用的名稱
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::UltraRare => "Ultra Rare",
            Rarity::Legendary => "Legendary",
        }
    }

    /// Case-insensitive, surrounding whitespace ignored.
    pub fn parse(value: &str) -> Option<Rarity> {
        match value.trim().to_lowercase().as_str() {
            "common" => Some(Rarity::Common),
            "rare" => Some(Rarity::Rare),
            "ultra rare" => Some(Rarity::UltraRare),
            "legendary" => Some(Rarity::Legendary),
            _ => None,
        }
    }

    pub fn default_weight(&self) -> f64 {
        match self {
            Rarity::Common => 75.0,
            Rarity::Rare => 25.0,
            Rarity::UltraRare => 3.0,
            Rarity::Legendary => 0.5,
        }
    }

    /// Leaderboard points per copy.
    pub fn score(&self) -> i64 {
        match self {
            Rarity::Common => 1,
            Rarity::Rare => 2,
            Rarity::UltraRare => 5,
            Rarity::Legendary => 10,
        }
    }

    pub fn sort_rank(&self) -> i64 {
        match self {
            Rarity::Common => 1,
            Rarity::Rare => 2,
            Rarity::UltraRare => 3,
            Rarity::Legendary => 4,
        }
    }

    /// Embed colour (purple, gold, fuchsia, dark grey).
    pub fn color(&self) -> u32 {
        match self {
            Rarity::Legendary => 0x9B59B6,
            Rarity::UltraRare => 0xF1C40F,
            Rarity::Rare => 0xEB459E,
            Rarity::Common => 0x607D8B,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知稀有度一律以 Common 顯示
pub fn rarity_color(rarity: &str) -> u32 {
    Rarity::parse(rarity).unwrap_or(Rarity::Common).color()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardStats {
    pub flow: Option<i64>,
    pub punchlines: Option<i64>,
    pub style: Option<i64>,
    pub reputation: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub rarity: String,
    pub image_url: String,
    #[serde(default)]
    pub stats: CardStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    pub card: Card,
    pub qty: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeStatus {
    Pending,
    Done,
    Cancelled,
    Expired,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Pending => "pending",
            TradeStatus::Done => "done",
            TradeStatus::Cancelled => "cancelled",
            TradeStatus::Expired => "expired",
        }
    }

    pub fn parse(value: &str) -> Option<TradeStatus> {
        match value {
            "pending" => Some(TradeStatus::Pending),
            "done" => Some(TradeStatus::Done),
            "cancelled" => Some(TradeStatus::Cancelled),
            "expired" => Some(TradeStatus::Expired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    pub trade_id: i64,
    pub from_user: UserId,
    pub to_user: UserId,
    pub from_card_id: String,
    pub to_card_id: String,
    pub qty_from: i64,
    pub qty_to: i64,
    pub status: TradeStatus,
    pub created_ts: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrade {
    pub from_user: UserId,
    pub to_user: UserId,
    pub from_card_id: String,
    pub to_card_id: String,
    pub qty_from: i64,
    pub qty_to: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRow {
    pub user_id: UserId,
    pub cards_total: i64,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRow {
    pub user_id: UserId,
    pub cards_total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rarity_parse_is_case_insensitive() {
        assert_eq!(Rarity::parse("  ultra RARE "), Some(Rarity::UltraRare));
        assert_eq!(Rarity::parse("legendary"), Some(Rarity::Legendary));
        assert_eq!(Rarity::parse("mythic"), None);
    }

    #[test]
    fn test_unknown_rarity_uses_common_color() {
        assert_eq!(rarity_color("mythic"), Rarity::Common.color());
        assert_eq!(rarity_color("Legendary"), 0x9B59B6);
    }

    #[test]
    fn test_card_without_stats_deserializes() {
        let card: Card = serde_json::from_str(
            r#"{"id":"c1","name":"MC","rarity":"Rare","image_url":"https://img/1.png"}"#,
        )
        .unwrap();
        assert_eq!(card.stats, CardStats::default());
    }
}
