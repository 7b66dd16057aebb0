use crate::adapters::sqlite::SqliteStore;
use crate::domain::model::{Card, Rarity};
use crate::utils::error::{BotError, Result};
use std::path::Path;

/// Reads the card catalogue. A missing file is not an error: the bot starts with no cards.
pub fn read_catalog<P: AsRef<Path>>(path: P) -> Result<Option<Vec<Card>>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    parse_catalog(&content).map(Some)
}

pub fn parse_catalog(content: &str) -> Result<Vec<Card>> {
    let mut cards: Vec<Card> =
        serde_json::from_str(content).map_err(|e| BotError::CatalogError {
            message: format!("cards.json is not a valid card list: {}", e),
        })?;

    for card in &mut cards {
        if card.id.trim().is_empty() {
            return Err(BotError::CatalogError {
                message: format!("card {:?} has an empty id", card.name),
            });
        }
        // 統一稀有度名稱，排行榜與權重表才能比對
        match Rarity::parse(&card.rarity) {
            Some(rarity) => card.rarity = rarity.as_str().to_string(),
            None => tracing::warn!(
                "⚠️ Card {} has unknown rarity {:?}; it will never be drawn",
                card.id,
                card.rarity
            ),
        }
    }
    Ok(cards)
}

/// Upserts the catalogue into the store and returns how many cards were loaded.
pub fn sync_catalog<P: AsRef<Path>>(store: &SqliteStore, path: P) -> Result<usize> {
    let path = path.as_ref();
    match read_catalog(path)? {
        None => {
            tracing::warn!("⚠️ {} not found, create it first!", path.display());
            Ok(0)
        }
        Some(cards) => {
            let count = store.upsert_cards(&cards)?;
            tracing::info!("📥 {} cards loaded from {}", count, path.display());
            Ok(count)
        }
    }
}
