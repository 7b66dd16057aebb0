//! German-language messages and embeds shown to players.

use crate::app::interactions::{
    Button, ButtonStyle, Embed, EmbedField, EmbedFooter, EmbedImage, MessageData,
};
use crate::core::game::CardDraw;
use crate::core::inventory::GalleryPage;
use crate::core::leaderboard::Leaderboard;
use crate::core::trade::TradeOffer;
use crate::domain::model::{rarity_color, Card, UserId};

const LEADERBOARD_COLOR: u32 = 0xF1C40F;

pub fn mention(user: UserId) -> String {
    format!("<@{}>", user)
}

/// `HH:MM:SS`
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Only flow and punchlines are shown.
fn stats_field(card: &Card) -> Option<EmbedField> {
    let mut parts = Vec::new();
    if let Some(flow) = card.stats.flow {
        parts.push(format!("Flow: **{}**", flow));
    }
    if let Some(punch) = card.stats.punchlines {
        parts.push(format!("Punchlines: **{}**", punch));
    }
    if parts.is_empty() {
        return None;
    }
    Some(EmbedField {
        name: "Stats".to_string(),
        value: parts.join(" · "),
        inline: false,
    })
}

fn card_embed(title: String, description: String, card: &Card) -> Embed {
    Embed {
        title,
        description: Some(description),
        color: rarity_color(&card.rarity),
        image: (!card.image_url.is_empty()).then(|| EmbedImage {
            url: card.image_url.clone(),
        }),
        fields: stats_field(card).into_iter().collect(),
        footer: None,
    }
}

pub fn pull_embed(draw: &CardDraw) -> Embed {
    let card = &draw.card;
    let mut embed = card_embed(
        "🎴 Neue Karte gezogen!".to_string(),
        format!("**{}**\nSeltenheit: **{}**", card.name, card.rarity),
        card,
    );
    let mut footer = format!("💰 TCG Coins: {}", draw.coins_after);
    if draw.duplicate {
        footer = format!("+{} Coins für Duplikat · {}", draw.reward, footer);
    }
    embed.footer = Some(EmbedFooter { text: footer });
    embed
}

pub fn purchase_embed(draw: &CardDraw) -> Embed {
    let card = &draw.card;
    let mut embed = card_embed(
        "🛒 Kauf erfolgreich!".to_string(),
        format!(
            "Du hast **{}** gezogen (Seltenheit: **{}**).",
            card.name, card.rarity
        ),
        card,
    );
    let suffix = if draw.duplicate {
        format!(" (Duplikat: +{} Coins)", draw.reward)
    } else {
        String::new()
    };
    embed.footer = Some(EmbedFooter {
        text: format!("💰 Coins übrig: {}{}", draw.coins_after, suffix),
    });
    embed
}

pub fn cooldown_message(seconds_left: i64) -> String {
    format!(
        "⏳ Du kannst erst in **{}** wieder ziehen.",
        format_duration(seconds_left)
    )
}

pub fn gallery_custom_id(owner: UserId, index: i64, issued_ts: i64) -> String {
    format!("inv:{}:{}:{}", owner, index, issued_ts)
}

pub fn gallery_message(page: &GalleryPage, issued_ts: i64) -> MessageData {
    let entry = &page.entry;
    let embed = card_embed(
        format!("📚 Inventar – Karte {}/{}", page.index + 1, page.total),
        format!("**{}** ({}) · x{}", entry.card.name, entry.card.rarity, entry.qty),
        &entry.card,
    );
    let index = page.index as i64;
    MessageData::embed(embed).with_buttons(vec![
        Button::new(
            ButtonStyle::Secondary,
            "⟵ Zurück",
            gallery_custom_id(page.owner, index - 1, issued_ts),
        ),
        Button::new(
            ButtonStyle::Secondary,
            "Weiter ⟶",
            gallery_custom_id(page.owner, index + 1, issued_ts),
        ),
    ])
}

pub fn trade_message(offer: &TradeOffer) -> MessageData {
    let content = format!(
        "🤝 **Trade #{}**\n{} bietet **{}× {}** gegen **{}× {}** von {}.\n{}, bitte **annehmen** oder **abbrechen**.",
        offer.trade_id,
        mention(offer.from_user),
        offer.qty_from,
        offer.from_card_name,
        offer.qty_to,
        offer.to_card_name,
        mention(offer.to_user),
        mention(offer.to_user),
    );
    MessageData::text(content).with_buttons(vec![
        Button::new(
            ButtonStyle::Success,
            "✅ Annehmen",
            format!("trade:accept:{}", offer.trade_id),
        ),
        Button::new(
            ButtonStyle::Danger,
            "⛔ Abbrechen",
            format!("trade:cancel:{}", offer.trade_id),
        ),
    ])
}

fn rank_prefix(rank: usize) -> String {
    match rank {
        1 => "🥇".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        n => format!("{:>2}.", n),
    }
}

fn table(lines: Vec<String>) -> String {
    if lines.is_empty() {
        "– noch keine Daten –".to_string()
    } else {
        lines.join("\n")
    }
}

pub fn leaderboard_embed(board: &Leaderboard) -> Embed {
    let score_lines: Vec<String> = board
        .by_score
        .iter()
        .enumerate()
        .map(|(i, row)| {
            format!(
                "{} {} — **{} Punkte** · {} Karten",
                rank_prefix(i + 1),
                mention(row.user_id),
                row.score,
                row.cards_total
            )
        })
        .collect();
    let count_lines: Vec<String> = board
        .by_count
        .iter()
        .enumerate()
        .map(|(i, row)| {
            format!(
                "{} {} — **{} Karten**",
                rank_prefix(i + 1),
                mention(row.user_id),
                row.cards_total
            )
        })
        .collect();

    Embed {
        title: "🏆 Leaderboard".to_string(),
        description: Some(
            "Ranking der **wertvollsten** Sammlungen (Score) und der **größten** Sammlungen (Menge)."
                .to_string(),
        ),
        color: LEADERBOARD_COLOR,
        image: None,
        fields: vec![
            EmbedField {
                name: "💎 Top Sammlung (Score)".to_string(),
                value: table(score_lines),
                inline: false,
            },
            EmbedField {
                name: "📦 Top Kartenanzahl".to_string(),
                value: table(count_lines),
                inline: false,
            },
        ],
        footer: Some(EmbedFooter {
            text: "Punkte: Common=1, Rare=2, Ultra Rare=5, Legendary=10".to_string(),
        }),
    }
}
