use crate::app::commands::{
    CMD_COINS, CMD_COINS_ADD, CMD_COINS_SET, CMD_INVENTORY, CMD_PULL, CMD_SHOP, CMD_TOP, CMD_TRADE,
};
use crate::app::interactions::{
    parse_snowflake, Embed, Interaction, InteractionResponse, MessageData, INTERACTION_COMMAND,
    INTERACTION_COMPONENT, INTERACTION_PING,
};
use crate::app::render;
use crate::core::game::{CoinGrant, CoinSet, GameService, PullOutcome, PurchaseOutcome};
use crate::core::inventory::GalleryStep;
use crate::core::trade::{AcceptOutcome, CancelOutcome, ProposeOutcome};
use crate::domain::model::{NewTrade, UserId};
use crate::domain::ports::{DiscordApi, PostOutcome};
use crate::utils::error::{BotError, Result};
use std::sync::Arc;

/// A channel post that is finished after the interaction has been acknowledged.
#[derive(Debug, Clone, PartialEq)]
pub struct Announcement {
    pub channel_id: u64,
    pub interaction_token: String,
    pub content: String,
    pub embed: Embed,
    /// Shown to the caller once the public post went through.
    pub confirmation: String,
}

/// The immediate interaction response plus an optional deferred channel post.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub response: InteractionResponse,
    pub announcement: Option<Announcement>,
}

impl From<InteractionResponse> for Reply {
    fn from(response: InteractionResponse) -> Self {
        Self {
            response,
            announcement: None,
        }
    }
}

/// Dispatches verified interactions to the game and renders the replies.
#[derive(Clone)]
pub struct InteractionRouter {
    game: Arc<GameService>,
    api: Arc<dyn DiscordApi>,
}

impl InteractionRouter {
    pub fn new(game: Arc<GameService>, api: Arc<dyn DiscordApi>) -> Self {
        Self { game, api }
    }

    pub async fn handle(&self, interaction: &Interaction) -> Result<Reply> {
        match interaction.kind {
            INTERACTION_PING => Ok(InteractionResponse::pong().into()),
            INTERACTION_COMMAND => self.handle_command(interaction),
            INTERACTION_COMPONENT => self.handle_component(interaction).map(Reply::from),
            other => Err(BotError::interaction(format!(
                "unsupported interaction type {}",
                other
            ))),
        }
    }

    fn handle_command(&self, interaction: &Interaction) -> Result<Reply> {
        let actor = interaction.actor_id()?;
        let name = interaction
            .command_name()
            .ok_or_else(|| BotError::interaction("command without name"))?;
        tracing::debug!("Command /{} from {}", name, actor);

        let response = match name {
            CMD_PULL => return self.pull(interaction, actor),
            CMD_SHOP => return self.shop(interaction, actor),
            CMD_COINS => self.coins(interaction, actor),
            CMD_COINS_ADD => self.coins_add(interaction),
            CMD_COINS_SET => self.coins_set(interaction),
            CMD_INVENTORY => self.inventory(actor),
            CMD_TOP => self.top(interaction),
            CMD_TRADE => self.trade(interaction, actor),
            unknown => {
                tracing::warn!("⚠️ Unknown command /{}", unknown);
                Ok(InteractionResponse::ephemeral("Unbekannter Befehl."))
            }
        };
        response.map(Reply::from)
    }

    /// 先回覆 deferred，頻道貼文在背景完成，避免超過 Discord 的 3 秒期限
    fn announce(
        &self,
        interaction: &Interaction,
        content: String,
        embed: Embed,
        confirmation: &str,
    ) -> Reply {
        match (interaction.channel(), interaction.token.clone()) {
            (Some(channel_id), Some(interaction_token)) => Reply {
                response: InteractionResponse::deferred_ephemeral(),
                announcement: Some(Announcement {
                    channel_id,
                    interaction_token,
                    content,
                    embed,
                    confirmation: confirmation.to_string(),
                }),
            },
            _ => InteractionResponse::message(MessageData::embed(embed).ephemeral()).into(),
        }
    }

    /// Posts publicly, then edits the deferred response with the confirmation.
    /// Without permission to post, the caller sees the card privately instead.
    pub async fn deliver(&self, announcement: Announcement) {
        let Announcement {
            channel_id,
            interaction_token,
            content,
            embed,
            confirmation,
        } = announcement;

        let public = MessageData::embed(embed.clone()).with_content(content);
        let posted = match serde_json::to_value(&public) {
            Ok(payload) => self.api.post_channel_message(channel_id, &payload).await,
            Err(e) => Err(e.into()),
        };
        let followup = match posted {
            Ok(PostOutcome::Posted) => MessageData::text(confirmation),
            Ok(PostOutcome::Forbidden) => MessageData::embed(embed),
            Err(e) => {
                tracing::error!("❌ Posting to channel {} failed: {}", channel_id, e);
                tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
                MessageData::embed(embed)
            }
        };

        let edited = match serde_json::to_value(&followup) {
            Ok(payload) => {
                self.api
                    .edit_original_response(&interaction_token, &payload)
                    .await
            }
            Err(e) => Err(e.into()),
        };
        if let Err(e) = edited {
            tracing::error!("❌ Could not finish deferred response: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        }
    }

    fn pull(&self, interaction: &Interaction, actor: UserId) -> Result<Reply> {
        match self.game.pull(actor)? {
            PullOutcome::OnCooldown { seconds_left } => Ok(InteractionResponse::ephemeral(
                render::cooldown_message(seconds_left),
            )
            .into()),
            PullOutcome::NoCards => Ok(InteractionResponse::ephemeral(
                "⚠️ Keine Karten für diese Seltenheit gefunden. `cards.json` füllen & Bot neu starten.",
            )
            .into()),
            PullOutcome::Pulled(draw) => Ok(self.announce(
                interaction,
                format!("{} hat eine Karte gezogen! 🎉", render::mention(actor)),
                render::pull_embed(&draw),
                "✅ Karte wurde im Channel gepostet.",
            )),
        }
    }

    fn shop(&self, interaction: &Interaction, actor: UserId) -> Result<Reply> {
        match self.game.buy(actor)? {
            PurchaseOutcome::InsufficientCoins { coins, price } => Ok(InteractionResponse::ephemeral(
                format!("💰 Du hast {} Coins. Du brauchst **{}**.", coins, price),
            )
            .into()),
            PurchaseOutcome::ShopEmpty => Ok(InteractionResponse::ephemeral(
                "⚠️ Shop leer. Bitte später nochmal.",
            )
            .into()),
            PurchaseOutcome::Purchased(draw) => Ok(self.announce(
                interaction,
                format!("{} hat im Shop gekauft! 🛒", render::mention(actor)),
                render::purchase_embed(&draw),
                "✅ Kauf wurde im Channel gepostet.",
            )),
        }
    }

    fn coins(&self, interaction: &Interaction, actor: UserId) -> Result<InteractionResponse> {
        let target = interaction.option_user("user").unwrap_or(actor);
        let amount = self.game.coins(target)?;
        let content = if target == actor {
            format!("💰 Du hast **{}** TCG Coins.", amount)
        } else {
            format!("💰 {} hat **{}** TCG Coins.", render::mention(target), amount)
        };
        Ok(InteractionResponse::ephemeral(content))
    }

    fn coins_add(&self, interaction: &Interaction) -> Result<InteractionResponse> {
        if !interaction.is_admin() {
            return Ok(InteractionResponse::ephemeral(
                "⛔ Nur Admins dürfen Coins vergeben.",
            ));
        }
        let target = required_user(interaction, "user")?;
        let amount = required_i64(interaction, "amount")?;

        let content = match self.game.grant_coins(target, amount)? {
            CoinGrant::ZeroAmount => "Bitte eine positive Anzahl angeben.".to_string(),
            CoinGrant::NegativeAmount => "Für negative Werte nutze **/coins_set** oder rufe den Command mit positiver Zahl auf.".to_string(),
            CoinGrant::Granted { new_balance } => format!(
                "✅ {} hat **+{}** TCG Coins erhalten. Neuer Stand: **{}**.",
                render::mention(target),
                amount,
                new_balance
            ),
        };
        Ok(InteractionResponse::ephemeral(content))
    }

    fn coins_set(&self, interaction: &Interaction) -> Result<InteractionResponse> {
        if !interaction.is_admin() {
            return Ok(InteractionResponse::ephemeral(
                "⛔ Nur Admins dürfen Coins setzen.",
            ));
        }
        let target = required_user(interaction, "user")?;
        let value = required_i64(interaction, "value")?;

        let content = match self.game.set_coins(target, value)? {
            CoinSet::Negative => "Wert darf nicht negativ sein.".to_string(),
            CoinSet::Set => format!(
                "🛠️ Coins von {} auf **{}** gesetzt.",
                render::mention(target),
                value
            ),
        };
        Ok(InteractionResponse::ephemeral(content))
    }

    fn inventory(&self, actor: UserId) -> Result<InteractionResponse> {
        match self.game.gallery_page(actor, 0)? {
            None => Ok(InteractionResponse::ephemeral("📦 Du hast noch keine Karten.")),
            Some(page) => {
                let issued_ts = self.game.now();
                Ok(InteractionResponse::message(
                    render::gallery_message(&page, issued_ts).ephemeral(),
                ))
            }
        }
    }

    fn top(&self, interaction: &Interaction) -> Result<InteractionResponse> {
        let board = self.game.leaderboard(interaction.option_i64("limit"))?;
        Ok(InteractionResponse::message(MessageData::embed(
            render::leaderboard_embed(&board),
        )))
    }

    fn trade(&self, interaction: &Interaction, actor: UserId) -> Result<InteractionResponse> {
        let request = NewTrade {
            from_user: actor,
            to_user: required_user(interaction, "user")?,
            from_card_id: required_str(interaction, "deine_karte")?,
            to_card_id: required_str(interaction, "seine_karte")?,
            qty_from: interaction.option_i64("deine_menge").unwrap_or(1),
            qty_to: interaction.option_i64("seine_menge").unwrap_or(1),
        };

        let response = match self.game.propose_trade(request)? {
            ProposeOutcome::SelfTrade => {
                InteractionResponse::ephemeral("Du kannst nicht mit dir selbst traden.")
            }
            ProposeOutcome::InvalidQuantity => {
                InteractionResponse::ephemeral("Die Menge muss mindestens 1 sein.")
            }
            ProposeOutcome::OfferNotOwned => InteractionResponse::ephemeral(
                "Du besitzt deine angebotene Karte nicht in ausreichender Menge.",
            ),
            ProposeOutcome::RequestNotOwned => InteractionResponse::ephemeral(
                "Der Partner besitzt die geforderte Karte vermutlich nicht.",
            ),
            // 公開訊息，讓對方可以按按鈕
            ProposeOutcome::Created(offer) => {
                InteractionResponse::message(render::trade_message(&offer))
            }
        };
        Ok(response)
    }

    fn handle_component(&self, interaction: &Interaction) -> Result<InteractionResponse> {
        let actor = interaction.actor_id()?;
        let custom_id = interaction
            .custom_id()
            .ok_or_else(|| BotError::interaction("component without custom_id"))?;
        tracing::debug!("Component {} from {}", custom_id, actor);

        match ComponentAction::parse(custom_id)? {
            ComponentAction::AcceptTrade(trade_id) => self.accept_trade(trade_id, actor),
            ComponentAction::CancelTrade(trade_id) => self.cancel_trade(trade_id, actor),
            ComponentAction::Gallery {
                owner,
                index,
                issued_ts,
            } => self.turn_gallery(actor, owner, index, issued_ts),
        }
    }

    fn accept_trade(&self, trade_id: i64, actor: UserId) -> Result<InteractionResponse> {
        let response = match self.game.accept_trade(trade_id, actor)? {
            AcceptOutcome::NotFound => InteractionResponse::ephemeral("Trade nicht gefunden."),
            AcceptOutcome::NotRecipient => {
                InteractionResponse::ephemeral("Nur der Empfänger kann annehmen.")
            }
            AcceptOutcome::NotPending => {
                InteractionResponse::ephemeral("Dieser Trade ist nicht mehr aktiv.")
            }
            AcceptOutcome::Expired => InteractionResponse::update(
                MessageData::text("⌛ Trade abgelaufen.").without_components(),
            ),
            AcceptOutcome::SenderMissingCard => {
                InteractionResponse::ephemeral("Absender hat die Karte nicht mehr.")
            }
            AcceptOutcome::RecipientMissingCard => {
                InteractionResponse::ephemeral("Du hast die geforderte Karte nicht (mehr).")
            }
            AcceptOutcome::Completed => InteractionResponse::update(
                MessageData::text("✅ Trade abgeschlossen!").without_components(),
            ),
        };
        Ok(response)
    }

    fn cancel_trade(&self, trade_id: i64, actor: UserId) -> Result<InteractionResponse> {
        let response = match self.game.cancel_trade(trade_id, actor)? {
            CancelOutcome::NotFound => InteractionResponse::ephemeral("Trade nicht gefunden."),
            CancelOutcome::NotParticipant => {
                InteractionResponse::ephemeral("Nur Beteiligte können abbrechen.")
            }
            CancelOutcome::NotPending => {
                InteractionResponse::ephemeral("Dieser Trade ist nicht mehr aktiv.")
            }
            CancelOutcome::Expired => InteractionResponse::update(
                MessageData::text("⌛ Trade abgelaufen.").without_components(),
            ),
            CancelOutcome::Cancelled => InteractionResponse::update(
                MessageData::text("❌ Trade abgebrochen.").without_components(),
            ),
        };
        Ok(response)
    }

    fn turn_gallery(
        &self,
        actor: UserId,
        owner: UserId,
        index: i64,
        issued_ts: i64,
    ) -> Result<InteractionResponse> {
        let response = match self.game.gallery_step(actor, owner, index, issued_ts)? {
            GalleryStep::NotOwner => {
                InteractionResponse::ephemeral("Nur der Besitzer kann hier blättern.")
            }
            GalleryStep::Expired => InteractionResponse::update(
                MessageData::text("⌛ Diese Ansicht ist abgelaufen. Nutze /inventar erneut.")
                    .without_components(),
            ),
            GalleryStep::Empty => InteractionResponse::update(
                MessageData::text("📦 Du hast noch keine Karten.").without_components(),
            ),
            // 每次翻頁都重新計時
            GalleryStep::Page(page) => InteractionResponse::update(render::gallery_message(
                &page,
                self.game.now(),
            )),
        };
        Ok(response)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentAction {
    AcceptTrade(i64),
    CancelTrade(i64),
    Gallery {
        owner: UserId,
        index: i64,
        issued_ts: i64,
    },
}

impl ComponentAction {
    pub fn parse(custom_id: &str) -> Result<Self> {
        let parts: Vec<&str> = custom_id.split(':').collect();
        let number = |raw: &str| {
            raw.parse::<i64>()
                .map_err(|_| BotError::interaction(format!("bad custom_id {:?}", custom_id)))
        };
        match parts.as_slice() {
            ["trade", "accept", id] => Ok(ComponentAction::AcceptTrade(number(*id)?)),
            ["trade", "cancel", id] => Ok(ComponentAction::CancelTrade(number(*id)?)),
            ["inv", owner, index, issued_ts] => Ok(ComponentAction::Gallery {
                owner: parse_snowflake("custom_id.owner", *owner)?,
                index: number(*index)?,
                issued_ts: number(*issued_ts)?,
            }),
            _ => Err(BotError::interaction(format!(
                "unknown custom_id {:?}",
                custom_id
            ))),
        }
    }
}

fn required_user(interaction: &Interaction, name: &str) -> Result<UserId> {
    interaction
        .option_user(name)
        .ok_or_else(|| BotError::interaction(format!("missing user option {}", name)))
}

fn required_i64(interaction: &Interaction, name: &str) -> Result<i64> {
    interaction
        .option_i64(name)
        .ok_or_else(|| BotError::interaction(format!("missing integer option {}", name)))
}

fn required_str(interaction: &Interaction, name: &str) -> Result<String> {
    interaction
        .option_str(name)
        .map(str::to_string)
        .ok_or_else(|| BotError::interaction(format!("missing string option {}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_component_ids() {
        assert_eq!(
            ComponentAction::parse("trade:accept:12").unwrap(),
            ComponentAction::AcceptTrade(12)
        );
        assert_eq!(
            ComponentAction::parse("trade:cancel:3").unwrap(),
            ComponentAction::CancelTrade(3)
        );
        assert_eq!(
            ComponentAction::parse("inv:99:-1:1700000000").unwrap(),
            ComponentAction::Gallery {
                owner: 99,
                index: -1,
                issued_ts: 1_700_000_000
            }
        );
        assert!(ComponentAction::parse("trade:accept:x").is_err());
        assert!(ComponentAction::parse("something").is_err());
    }
}
