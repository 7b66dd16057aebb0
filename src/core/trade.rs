use crate::adapters::sqlite::TradeCompletion;
use crate::core::game::GameService;
use crate::domain::model::{NewTrade, Trade, TradeStatus, UserId};
use crate::utils::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeOffer {
    pub trade_id: i64,
    pub from_user: UserId,
    pub to_user: UserId,
    pub from_card_name: String,
    pub to_card_name: String,
    pub qty_from: i64,
    pub qty_to: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposeOutcome {
    SelfTrade,
    InvalidQuantity,
    OfferNotOwned,
    RequestNotOwned,
    Created(TradeOffer),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    NotFound,
    NotRecipient,
    NotPending,
    Expired,
    SenderMissingCard,
    RecipientMissingCard,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    NotFound,
    NotParticipant,
    NotPending,
    Expired,
    Cancelled,
}

impl GameService {
    fn is_expired(&self, trade: &Trade) -> bool {
        self.clock.now() - trade.created_ts > self.rules.view_timeout_seconds
    }

    pub fn propose_trade(&self, request: NewTrade) -> Result<ProposeOutcome> {
        if request.from_user == request.to_user {
            return Ok(ProposeOutcome::SelfTrade);
        }
        if request.qty_from < 1 || request.qty_to < 1 {
            return Ok(ProposeOutcome::InvalidQuantity);
        }
        if self.store.card_qty(request.from_user, &request.from_card_id)? < request.qty_from {
            return Ok(ProposeOutcome::OfferNotOwned);
        }
        if self.store.card_qty(request.to_user, &request.to_card_id)? < request.qty_to {
            return Ok(ProposeOutcome::RequestNotOwned);
        }

        let from_card_name = self
            .store
            .card_name(&request.from_card_id)?
            .unwrap_or_else(|| request.from_card_id.clone());
        let to_card_name = self
            .store
            .card_name(&request.to_card_id)?
            .unwrap_or_else(|| request.to_card_id.clone());

        let trade_id = self.store.create_trade(&request, self.clock.now())?;
        tracing::info!(
            "🤝 Trade #{} proposed: {} -> {} ({}x {} for {}x {})",
            trade_id,
            request.from_user,
            request.to_user,
            request.qty_from,
            request.from_card_id,
            request.qty_to,
            request.to_card_id
        );

        Ok(ProposeOutcome::Created(TradeOffer {
            trade_id,
            from_user: request.from_user,
            to_user: request.to_user,
            from_card_name,
            to_card_name,
            qty_from: request.qty_from,
            qty_to: request.qty_to,
        }))
    }

    pub fn accept_trade(&self, trade_id: i64, actor: UserId) -> Result<AcceptOutcome> {
        let trade = match self.store.trade(trade_id)? {
            Some(trade) => trade,
            None => return Ok(AcceptOutcome::NotFound),
        };
        if actor != trade.to_user {
            return Ok(AcceptOutcome::NotRecipient);
        }
        if trade.status != TradeStatus::Pending {
            return Ok(AcceptOutcome::NotPending);
        }
        if self.is_expired(&trade) {
            self.store.set_trade_status(trade_id, TradeStatus::Expired)?;
            return Ok(AcceptOutcome::Expired);
        }

        let outcome = match self.store.complete_trade(&trade)? {
            TradeCompletion::Completed => AcceptOutcome::Completed,
            TradeCompletion::NotPending => AcceptOutcome::NotPending,
            TradeCompletion::SenderMissingCard => AcceptOutcome::SenderMissingCard,
            TradeCompletion::RecipientMissingCard => AcceptOutcome::RecipientMissingCard,
        };
        tracing::info!("🤝 Trade #{} accept by {}: {:?}", trade_id, actor, outcome);
        Ok(outcome)
    }

    pub fn cancel_trade(&self, trade_id: i64, actor: UserId) -> Result<CancelOutcome> {
        let trade = match self.store.trade(trade_id)? {
            Some(trade) => trade,
            None => return Ok(CancelOutcome::NotFound),
        };
        if actor != trade.from_user && actor != trade.to_user {
            return Ok(CancelOutcome::NotParticipant);
        }
        if trade.status != TradeStatus::Pending {
            return Ok(CancelOutcome::NotPending);
        }
        // 按鈕逾時後兩個動作都失效
        if self.is_expired(&trade) {
            self.store.set_trade_status(trade_id, TradeStatus::Expired)?;
            return Ok(CancelOutcome::Expired);
        }
        self.store.set_trade_status(trade_id, TradeStatus::Cancelled)?;
        tracing::info!("❌ Trade #{} cancelled by {}", trade_id, actor);
        Ok(CancelOutcome::Cancelled)
    }
}
