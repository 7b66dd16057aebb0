use crate::domain::model::{
    Card, CardStats, CountRow, InventoryEntry, NewTrade, Rarity, ScoreRow, Trade, TradeStatus,
    UserId,
};
use crate::utils::error::{BotError, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = r#"
PRAGMA journal_mode=WAL;

CREATE TABLE IF NOT EXISTS cards (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    rarity TEXT NOT NULL,
    image_url TEXT NOT NULL,
    flow INTEGER,
    punchlines INTEGER,
    style INTEGER,
    reputation INTEGER
);

CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY,
    last_pull_ts INTEGER DEFAULT 0,
    coins INTEGER DEFAULT 0
);

CREATE TABLE IF NOT EXISTS user_cards (
    user_id INTEGER NOT NULL,
    card_id TEXT NOT NULL,
    qty INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (user_id, card_id),
    FOREIGN KEY (card_id) REFERENCES cards(id)
);

CREATE TABLE IF NOT EXISTS rarity_weights (
    rarity TEXT PRIMARY KEY,
    weight REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS trades (
    trade_id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_user INTEGER NOT NULL,
    to_user INTEGER NOT NULL,
    from_card_id TEXT NOT NULL,
    to_card_id TEXT NOT NULL,
    qty_from INTEGER NOT NULL DEFAULT 1,
    qty_to INTEGER NOT NULL DEFAULT 1,
    status TEXT NOT NULL DEFAULT 'pending',
    created_ts INTEGER NOT NULL
);
"#;

const CARD_COLUMNS: &str = "id, name, rarity, image_url, flow, punchlines, style, reputation";

// Discord snowflakes 小於 2^63，可直接存成 INTEGER
fn uid(user: UserId) -> i64 {
    user as i64
}

fn card_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        rarity: row.get(offset + 2)?,
        image_url: row.get(offset + 3)?,
        stats: CardStats {
            flow: row.get(offset + 4)?,
            punchlines: row.get(offset + 5)?,
            style: row.get(offset + 6)?,
            reputation: row.get(offset + 7)?,
        },
    })
}

fn trade_from_row(row: &Row<'_>) -> rusqlite::Result<Trade> {
    let status: String = row.get(7)?;
    Ok(Trade {
        trade_id: row.get(0)?,
        from_user: row.get::<_, i64>(1)? as UserId,
        to_user: row.get::<_, i64>(2)? as UserId,
        from_card_id: row.get(3)?,
        to_card_id: row.get(4)?,
        qty_from: row.get(5)?,
        qty_to: row.get(6)?,
        status: TradeStatus::parse(&status).unwrap_or(TradeStatus::Cancelled),
        created_ts: row.get(8)?,
    })
}

fn card_qty_in(conn: &Connection, user: UserId, card_id: &str) -> Result<i64> {
    let qty = conn
        .query_row(
            "SELECT qty FROM user_cards WHERE user_id = ?1 AND card_id = ?2",
            params![uid(user), card_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(qty.unwrap_or(0))
}

/// Returns true when the user already owned the card.
fn add_to_inventory_in(conn: &Connection, user: UserId, card_id: &str) -> Result<bool> {
    let duplicate = card_qty_in(conn, user, card_id)? > 0;
    conn.execute(
        "INSERT INTO user_cards(user_id, card_id, qty) VALUES (?1, ?2, 1) \
         ON CONFLICT(user_id, card_id) DO UPDATE SET qty = qty + 1",
        params![uid(user), card_id],
    )?;
    Ok(duplicate)
}

fn add_coins_in(conn: &Connection, user: UserId, amount: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO users(user_id, coins) VALUES (?1, ?2) \
         ON CONFLICT(user_id) DO UPDATE SET coins = COALESCE(coins, 0) + ?2",
        params![uid(user), amount],
    )?;
    Ok(())
}

fn transfer_in(
    conn: &Connection,
    from: UserId,
    to: UserId,
    card_id: &str,
    qty: i64,
) -> Result<bool> {
    let moved = conn.execute(
        "UPDATE user_cards SET qty = qty - ?1 WHERE user_id = ?2 AND card_id = ?3 AND qty >= ?1",
        params![qty, uid(from), card_id],
    )?;
    if moved == 0 {
        return Ok(false);
    }
    conn.execute(
        "DELETE FROM user_cards WHERE user_id = ?1 AND card_id = ?2 AND qty <= 0",
        params![uid(from), card_id],
    )?;
    conn.execute(
        "INSERT INTO user_cards(user_id, card_id, qty) VALUES (?1, ?2, ?3) \
         ON CONFLICT(user_id, card_id) DO UPDATE SET qty = qty + ?3",
        params![uid(to), card_id, qty],
    )?;
    Ok(true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeCompletion {
    Completed,
    /// Already done, cancelled or expired by the time the swap ran.
    NotPending,
    SenderMissingCard,
    RecipientMissingCard,
}

/// SQLite-backed persistence for cards, users, inventories and trades.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| BotError::ServerError {
            message: "database connection lock poisoned".to_string(),
        })
    }

    /// 建立資料表、升級舊資料庫並寫入稀有度權重
    pub fn init(&self, weights: &BTreeMap<String, f64>) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)?;

        let mut stmt = conn.prepare("PRAGMA table_info(users)")?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);
        if !columns.iter().any(|c| c == "coins") {
            tracing::info!("🔧 Migrating users table: adding coins column");
            conn.execute("ALTER TABLE users ADD COLUMN coins INTEGER DEFAULT 0", [])?;
        }

        for (rarity, weight) in weights {
            conn.execute(
                "INSERT INTO rarity_weights(rarity, weight) VALUES (?1, ?2) \
                 ON CONFLICT(rarity) DO UPDATE SET weight = excluded.weight",
                params![rarity, weight],
            )?;
        }
        Ok(())
    }

    pub fn upsert_cards(&self, cards: &[Card]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for card in cards {
            tx.execute(
                "INSERT INTO cards(id, name, rarity, image_url, flow, punchlines, style, reputation) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
                 ON CONFLICT(id) DO UPDATE SET \
                    name = excluded.name, \
                    rarity = excluded.rarity, \
                    image_url = excluded.image_url, \
                    flow = excluded.flow, \
                    punchlines = excluded.punchlines, \
                    style = excluded.style, \
                    reputation = excluded.reputation",
                params![
                    card.id,
                    card.name,
                    card.rarity,
                    card.image_url,
                    card.stats.flow,
                    card.stats.punchlines,
                    card.stats.style,
                    card.stats.reputation
                ],
            )?;
        }
        tx.commit()?;
        Ok(cards.len())
    }

    pub fn card_name(&self, card_id: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let name = conn
            .query_row(
                "SELECT name FROM cards WHERE id = ?1",
                params![card_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    pub fn cards_by_rarity(&self, rarity: &str) -> Result<Vec<Card>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM cards WHERE rarity = ?1 ORDER BY id",
            CARD_COLUMNS
        ))?;
        let cards = stmt
            .query_map(params![rarity], |row| card_from_row(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    pub fn rarity_weights(&self) -> Result<Vec<(String, f64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT rarity, weight FROM rarity_weights ORDER BY rarity")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn last_pull_ts(&self, user: UserId) -> Result<i64> {
        let conn = self.conn()?;
        let ts: Option<Option<i64>> = conn
            .query_row(
                "SELECT last_pull_ts FROM users WHERE user_id = ?1",
                params![uid(user)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(ts.flatten().unwrap_or(0))
    }

    /// 抽卡: 冷卻檢查、加入收藏、重複卡給金幣，全部在同一個交易中
    ///
    /// `None` when the cooldown has not elapsed yet; nothing is written then.
    pub fn record_pull(
        &self,
        user: UserId,
        card_id: &str,
        now: i64,
        cooldown_seconds: i64,
        duplicate_reward: i64,
    ) -> Result<Option<bool>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO users(user_id, last_pull_ts, coins) VALUES (?1, 0, 0)",
            params![uid(user)],
        )?;
        let claimed = tx.execute(
            "UPDATE users SET last_pull_ts = ?2 \
             WHERE user_id = ?1 AND ?2 - COALESCE(last_pull_ts, 0) >= ?3",
            params![uid(user), now, cooldown_seconds],
        )?;
        if claimed == 0 {
            return Ok(None);
        }
        let duplicate = add_to_inventory_in(&tx, user, card_id)?;
        if duplicate && duplicate_reward != 0 {
            add_coins_in(&tx, user, duplicate_reward)?;
        }
        tx.commit()?;
        Ok(Some(duplicate))
    }

    /// Charges `price` and grants the card atomically. `None` when the balance is too low.
    pub fn purchase(
        &self,
        user: UserId,
        card_id: &str,
        price: i64,
        duplicate_reward: i64,
    ) -> Result<Option<bool>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let charged = tx.execute(
            "UPDATE users SET coins = COALESCE(coins, 0) - ?1 \
             WHERE user_id = ?2 AND COALESCE(coins, 0) >= ?1",
            params![price, uid(user)],
        )?;
        if charged == 0 {
            return Ok(None);
        }
        let duplicate = add_to_inventory_in(&tx, user, card_id)?;
        if duplicate && duplicate_reward != 0 {
            add_coins_in(&tx, user, duplicate_reward)?;
        }
        tx.commit()?;
        Ok(Some(duplicate))
    }

    pub fn coins(&self, user: UserId) -> Result<i64> {
        let conn = self.conn()?;
        let coins: Option<Option<i64>> = conn
            .query_row(
                "SELECT coins FROM users WHERE user_id = ?1",
                params![uid(user)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(coins.flatten().unwrap_or(0))
    }

    pub fn add_coins(&self, user: UserId, amount: i64) -> Result<()> {
        let conn = self.conn()?;
        add_coins_in(&conn, user, amount)
    }

    pub fn set_coins(&self, user: UserId, value: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users(user_id, coins) VALUES (?1, ?2) \
             ON CONFLICT(user_id) DO UPDATE SET coins = ?2",
            params![uid(user), value],
        )?;
        Ok(())
    }

    pub fn card_qty(&self, user: UserId, card_id: &str) -> Result<i64> {
        let conn = self.conn()?;
        card_qty_in(&conn, user, card_id)
    }

    pub fn add_to_inventory(&self, user: UserId, card_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        add_to_inventory_in(&conn, user, card_id)
    }

    /// Sorted by rarity (Legendary first), then name.
    pub fn inventory(&self, user: UserId) -> Result<Vec<InventoryEntry>> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT c.id, c.name, c.rarity, c.image_url, c.flow, c.punchlines, c.style, c.reputation, uc.qty \
             FROM user_cards uc \
             JOIN cards c ON c.id = uc.card_id \
             WHERE uc.user_id = ?1 \
             ORDER BY \
                CASE c.rarity WHEN '{}' THEN {} WHEN '{}' THEN {} WHEN '{}' THEN {} ELSE {} END DESC, \
                c.name ASC",
            Rarity::Legendary.as_str(),
            Rarity::Legendary.sort_rank(),
            Rarity::UltraRare.as_str(),
            Rarity::UltraRare.sort_rank(),
            Rarity::Rare.as_str(),
            Rarity::Rare.sort_rank(),
            Rarity::Common.sort_rank(),
        );
        let mut stmt = conn.prepare(&query)?;
        let entries = stmt
            .query_map(params![uid(user)], |row| {
                Ok(InventoryEntry {
                    card: card_from_row(row, 0)?,
                    qty: row.get(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn create_trade(&self, trade: &NewTrade, now: i64) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO trades(from_user, to_user, from_card_id, to_card_id, qty_from, qty_to, created_ts) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                uid(trade.from_user),
                uid(trade.to_user),
                trade.from_card_id,
                trade.to_card_id,
                trade.qty_from,
                trade.qty_to,
                now
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn trade(&self, trade_id: i64) -> Result<Option<Trade>> {
        let conn = self.conn()?;
        let trade = conn
            .query_row(
                "SELECT trade_id, from_user, to_user, from_card_id, to_card_id, qty_from, qty_to, status, created_ts \
                 FROM trades WHERE trade_id = ?1",
                params![trade_id],
                trade_from_row,
            )
            .optional()?;
        Ok(trade)
    }

    pub fn set_trade_status(&self, trade_id: i64, status: TradeStatus) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE trades SET status = ?1 WHERE trade_id = ?2",
            params![status.as_str(), trade_id],
        )?;
        Ok(())
    }

    /// Claims the pending trade, swaps both sides and marks it done, or rolls everything back.
    pub fn complete_trade(&self, trade: &Trade) -> Result<TradeCompletion> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let claimed = tx.execute(
            "UPDATE trades SET status = ?1 WHERE trade_id = ?2 AND status = ?3",
            params![
                TradeStatus::Done.as_str(),
                trade.trade_id,
                TradeStatus::Pending.as_str()
            ],
        )?;
        if claimed == 0 {
            return Ok(TradeCompletion::NotPending);
        }
        if !transfer_in(
            &tx,
            trade.from_user,
            trade.to_user,
            &trade.from_card_id,
            trade.qty_from,
        )? {
            return Ok(TradeCompletion::SenderMissingCard);
        }
        if !transfer_in(
            &tx,
            trade.to_user,
            trade.from_user,
            &trade.to_card_id,
            trade.qty_to,
        )? {
            return Ok(TradeCompletion::RecipientMissingCard);
        }
        tx.commit()?;
        Ok(TradeCompletion::Completed)
    }

    /// Ordered by score, then card count.
    pub fn score_leaderboard(&self, limit: i64) -> Result<Vec<ScoreRow>> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT uc.user_id, SUM(uc.qty) AS cards_total, \
                SUM(uc.qty * CASE c.rarity \
                    WHEN '{}' THEN {} WHEN '{}' THEN {} WHEN '{}' THEN {} ELSE {} END) AS score \
             FROM user_cards uc \
             JOIN cards c ON c.id = uc.card_id \
             GROUP BY uc.user_id \
             ORDER BY score DESC, cards_total DESC \
             LIMIT ?1",
            Rarity::Legendary.as_str(),
            Rarity::Legendary.score(),
            Rarity::UltraRare.as_str(),
            Rarity::UltraRare.score(),
            Rarity::Rare.as_str(),
            Rarity::Rare.score(),
            Rarity::Common.score(),
        );
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(ScoreRow {
                    user_id: row.get::<_, i64>(0)? as UserId,
                    cards_total: row.get(1)?,
                    score: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count_leaderboard(&self, limit: i64) -> Result<Vec<CountRow>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, SUM(qty) AS cards_total FROM user_cards \
             GROUP BY user_id ORDER BY cards_total DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(CountRow {
                    user_id: row.get::<_, i64>(0)? as UserId,
                    cards_total: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
