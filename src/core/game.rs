use crate::adapters::sqlite::SqliteStore;
use crate::config::rules::GameRules;
use crate::domain::model::{Card, UserId};
use crate::domain::ports::Clock;
use crate::utils::error::{BotError, Result};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};

/// A card that landed in a player's collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CardDraw {
    pub card: Card,
    pub duplicate: bool,
    /// Coins granted for the duplicate (0 for new cards).
    pub reward: i64,
    pub coins_after: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PullOutcome {
    OnCooldown { seconds_left: i64 },
    NoCards,
    Pulled(CardDraw),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseOutcome {
    InsufficientCoins { coins: i64, price: i64 },
    ShopEmpty,
    Purchased(CardDraw),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoinGrant {
    Granted { new_balance: i64 },
    ZeroAmount,
    NegativeAmount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoinSet {
    Set,
    Negative,
}

/// Game rules on top of the store: pulls, shop, coins, trades, inventory, leaderboards.
pub struct GameService {
    pub(crate) store: Arc<SqliteStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) rules: GameRules,
    rng: Mutex<StdRng>,
}

impl GameService {
    pub fn new(store: Arc<SqliteStore>, clock: Arc<dyn Clock>, rules: GameRules) -> Self {
        Self::with_rng(store, clock, rules, StdRng::from_entropy())
    }

    pub fn with_rng(
        store: Arc<SqliteStore>,
        clock: Arc<dyn Clock>,
        rules: GameRules,
        rng: StdRng,
    ) -> Self {
        Self {
            store,
            clock,
            rules,
            rng: Mutex::new(rng),
        }
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    fn rng(&self) -> Result<std::sync::MutexGuard<'_, StdRng>> {
        self.rng.lock().map_err(|_| BotError::ServerError {
            message: "rng lock poisoned".to_string(),
        })
    }

    /// 剩餘冷卻秒數，最小為 0
    pub fn cooldown_left(&self, user: UserId) -> Result<i64> {
        let last = self.store.last_pull_ts(user)?;
        let elapsed = (self.clock.now() - last).max(0);
        Ok((self.rules.pull_cooldown_seconds - elapsed).max(0))
    }

    /// Weighted rarity pick over the stored weights.
    pub fn pick_rarity(&self) -> Result<String> {
        let rows = self.store.rarity_weights()?;
        let dist = WeightedIndex::new(rows.iter().map(|(_, w)| *w)).map_err(|e| {
            BotError::ConfigValidationError {
                field: "rarity_weights".to_string(),
                message: format!("cannot draw a rarity: {}", e),
            }
        })?;
        let index = dist.sample(&mut *self.rng()?);
        Ok(rows[index].0.clone())
    }

    /// Rarity first, then a uniformly random card of that rarity.
    pub fn draw_card(&self) -> Result<Option<Card>> {
        let rarity = self.pick_rarity()?;
        let cards = self.store.cards_by_rarity(&rarity)?;
        if cards.is_empty() {
            tracing::warn!("⚠️ No cards with rarity {}", rarity);
            return Ok(None);
        }
        let card = cards.choose(&mut *self.rng()?).cloned();
        Ok(card)
    }

    pub fn pull(&self, user: UserId) -> Result<PullOutcome> {
        let seconds_left = self.cooldown_left(user)?;
        if seconds_left > 0 {
            return Ok(PullOutcome::OnCooldown { seconds_left });
        }

        let card = match self.draw_card()? {
            Some(card) => card,
            None => return Ok(PullOutcome::NoCards),
        };

        let reward = self.rules.pull_duplicate_coins;
        // 寫入時再檢查一次冷卻，同時送出的請求只有一個會成功
        let duplicate = match self.store.record_pull(
            user,
            &card.id,
            self.clock.now(),
            self.rules.pull_cooldown_seconds,
            reward,
        )? {
            Some(duplicate) => duplicate,
            None => {
                let seconds_left = self.cooldown_left(user)?;
                return Ok(PullOutcome::OnCooldown { seconds_left });
            }
        };
        let coins_after = self.store.coins(user)?;
        tracing::info!(
            "🎴 User {} pulled {} ({}){}",
            user,
            card.id,
            card.rarity,
            if duplicate { " [duplicate]" } else { "" }
        );

        Ok(PullOutcome::Pulled(CardDraw {
            card,
            duplicate,
            reward: if duplicate { reward } else { 0 },
            coins_after,
        }))
    }

    pub fn buy(&self, user: UserId) -> Result<PurchaseOutcome> {
        let price = self.rules.shop_price;
        let coins = self.store.coins(user)?;
        if coins < price {
            return Ok(PurchaseOutcome::InsufficientCoins { coins, price });
        }

        // 先抽卡再扣款，商店空時不收費
        let card = match self.draw_card()? {
            Some(card) => card,
            None => return Ok(PurchaseOutcome::ShopEmpty),
        };

        let reward = self.rules.shop_duplicate_coins;
        let duplicate = match self.store.purchase(user, &card.id, price, reward)? {
            Some(duplicate) => duplicate,
            None => {
                let coins = self.store.coins(user)?;
                return Ok(PurchaseOutcome::InsufficientCoins { coins, price });
            }
        };
        let coins_after = self.store.coins(user)?;
        tracing::info!("🛒 User {} bought {} for {} coins", user, card.id, price);

        Ok(PurchaseOutcome::Purchased(CardDraw {
            card,
            duplicate,
            reward: if duplicate { reward } else { 0 },
            coins_after,
        }))
    }

    pub fn coins(&self, user: UserId) -> Result<i64> {
        self.store.coins(user)
    }

    pub fn grant_coins(&self, user: UserId, amount: i64) -> Result<CoinGrant> {
        if amount == 0 {
            return Ok(CoinGrant::ZeroAmount);
        }
        if amount < 0 {
            return Ok(CoinGrant::NegativeAmount);
        }
        self.store.add_coins(user, amount)?;
        let new_balance = self.store.coins(user)?;
        tracing::info!("💰 Granted {} coins to {} (balance {})", amount, user, new_balance);
        Ok(CoinGrant::Granted { new_balance })
    }

    pub fn set_coins(&self, user: UserId, value: i64) -> Result<CoinSet> {
        if value < 0 {
            return Ok(CoinSet::Negative);
        }
        self.store.set_coins(user, value)?;
        tracing::info!("🛠️ Coins of {} set to {}", user, value);
        Ok(CoinSet::Set)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::domain::model::Rarity;

    #[test]
    fn test_first_pull_has_no_cooldown() {
        let (service, _) = service_with(&[card("c1", Rarity::Common)], common_only_rules());
        match service.pull(1).unwrap() {
            PullOutcome::Pulled(draw) => {
                assert_eq!(draw.card.id, "c1");
                assert!(!draw.duplicate);
                assert_eq!(draw.reward, 0);
                assert_eq!(draw.coins_after, 0);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_cooldown_blocks_second_pull() {
        let (service, clock) = service_with(&[card("c1", Rarity::Common)], common_only_rules());
        service.pull(1).unwrap();

        clock.advance(60);
        assert_eq!(
            service.pull(1).unwrap(),
            PullOutcome::OnCooldown {
                seconds_left: 5 * 3600 - 60
            }
        );

        clock.advance(5 * 3600);
        match service.pull(1).unwrap() {
            PullOutcome::Pulled(draw) => {
                assert!(draw.duplicate);
                assert_eq!(draw.reward, 2);
                assert_eq!(draw.coins_after, 2);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_clock_going_backwards_does_not_extend_cooldown() {
        let (service, clock) = service_with(&[card("c1", Rarity::Common)], common_only_rules());
        service.pull(1).unwrap();
        clock.advance(-100);
        assert_eq!(service.cooldown_left(1).unwrap(), 5 * 3600);
    }

    #[test]
    fn test_pull_without_cards_for_rarity() {
        let (service, _) = service_with(&[card("r1", Rarity::Rare)], common_only_rules());
        assert_eq!(service.pull(1).unwrap(), PullOutcome::NoCards);
        // no cooldown is consumed
        assert_eq!(service.cooldown_left(1).unwrap(), 0);
    }

    #[test]
    fn test_simultaneous_pulls_grant_one_card() {
        let (service, _) = service_with(&[card("c1", Rarity::Common)], common_only_rules());
        let outcomes: Vec<PullOutcome> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| service.pull(1).unwrap())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let pulled = outcomes
            .iter()
            .filter(|o| matches!(o, PullOutcome::Pulled(_)))
            .count();
        assert_eq!(pulled, 1);
        assert!(outcomes.iter().all(|o| matches!(
            o,
            PullOutcome::Pulled(_) | PullOutcome::OnCooldown { .. }
        )));
        assert_eq!(service.store().card_qty(1, "c1").unwrap(), 1);
        assert_eq!(service.coins(1).unwrap(), 0);
    }

    #[test]
    fn test_simultaneous_purchases_never_overdraw() {
        let (service, _) = service_with(&[card("c1", Rarity::Common)], common_only_rules());
        service.set_coins(1, 10).unwrap();
        let bought = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| service.buy(1).unwrap())).collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|o| matches!(o, PurchaseOutcome::Purchased(_)))
                .count()
        });
        assert_eq!(bought, 1);
        assert_eq!(service.coins(1).unwrap(), 0);
        assert_eq!(service.store().card_qty(1, "c1").unwrap(), 1);
    }

    #[test]
    fn test_weighted_pick_respects_zero_weights() {
        let mut rules = GameRules::default();
        for (name, weight) in rules.rarity_weights.iter_mut() {
            *weight = if name == "Legendary" { 1.0 } else { 0.0 };
        }
        let (service, _) = service_with(&[], rules);
        for _ in 0..50 {
            assert_eq!(service.pick_rarity().unwrap(), "Legendary");
        }
    }

    #[test]
    fn test_default_weights_favour_common() {
        let (service, _) = service_with(&[], GameRules::default());
        let commons = (0..1000)
            .filter(|_| service.pick_rarity().unwrap() == "Common")
            .count();
        assert!(commons > 600, "commons drawn: {}", commons);
    }

    #[test]
    fn test_shop_requires_price() {
        let (service, _) = service_with(&[card("c1", Rarity::Common)], common_only_rules());
        service.set_coins(1, 9).unwrap();
        assert_eq!(
            service.buy(1).unwrap(),
            PurchaseOutcome::InsufficientCoins { coins: 9, price: 10 }
        );
    }

    #[test]
    fn test_shop_purchase_and_duplicate_reward() {
        let (service, _) = service_with(&[card("c1", Rarity::Common)], common_only_rules());
        service.set_coins(1, 20).unwrap();

        match service.buy(1).unwrap() {
            PurchaseOutcome::Purchased(draw) => {
                assert!(!draw.duplicate);
                assert_eq!(draw.coins_after, 10);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        match service.buy(1).unwrap() {
            PurchaseOutcome::Purchased(draw) => {
                assert!(draw.duplicate);
                assert_eq!(draw.reward, 5);
                assert_eq!(draw.coins_after, 5);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_empty_shop_does_not_charge() {
        let (service, _) = service_with(&[], common_only_rules());
        service.set_coins(1, 10).unwrap();
        assert_eq!(service.buy(1).unwrap(), PurchaseOutcome::ShopEmpty);
        assert_eq!(service.coins(1).unwrap(), 10);
    }

    #[test]
    fn test_grant_and_set_coins() {
        let (service, _) = service_with(&[], GameRules::default());
        assert_eq!(service.grant_coins(1, 0).unwrap(), CoinGrant::ZeroAmount);
        assert_eq!(service.grant_coins(1, -3).unwrap(), CoinGrant::NegativeAmount);
        assert_eq!(
            service.grant_coins(1, 15).unwrap(),
            CoinGrant::Granted { new_balance: 15 }
        );
        assert_eq!(service.set_coins(1, -1).unwrap(), CoinSet::Negative);
        assert_eq!(service.set_coins(1, 4).unwrap(), CoinSet::Set);
        assert_eq!(service.coins(1).unwrap(), 4);
    }
}
