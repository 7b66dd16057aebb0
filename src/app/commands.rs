use serde_json::{json, Value};

const OPTION_STRING: u8 = 3;
const OPTION_INTEGER: u8 = 4;
const OPTION_USER: u8 = 6;

pub const CMD_PULL: &str = "karte";
pub const CMD_SHOP: &str = "shop";
pub const CMD_COINS: &str = "coins";
pub const CMD_COINS_ADD: &str = "coins_add";
pub const CMD_COINS_SET: &str = "coins_set";
pub const CMD_INVENTORY: &str = "inventar";
pub const CMD_TOP: &str = "top";
pub const CMD_TRADE: &str = "trade";

fn option(kind: u8, name: &str, description: &str, required: bool) -> Value {
    json!({
        "type": kind,
        "name": name,
        "description": description,
        "required": required,
    })
}

/// Slash command definitions for bulk registration.
pub fn command_definitions(shop_price: i64, cooldown_seconds: i64) -> Value {
    let hours = cooldown_seconds / 3600;
    json!([
        {
            "name": CMD_PULL,
            "description": format!("Ziehe eine Sammelkarte (1x alle {}h).", hours),
        },
        {
            "name": CMD_SHOP,
            "description": format!("TCG-Shop: {} Coins = 1 zufällige Karte kaufen", shop_price),
        },
        {
            "name": CMD_COINS,
            "description": "Zeigt deine TCG Coins (oder die eines Users).",
            "options": [option(OPTION_USER, "user", "Optional: Anderen User anzeigen", false)],
        },
        {
            "name": CMD_COINS_ADD,
            "description": "(Admin) Gibt einem User TCG Coins dazu.",
            "options": [
                option(OPTION_USER, "user", "Wem Coins geben", true),
                option(OPTION_INTEGER, "amount", "Anzahl der Coins (positiv)", true),
            ],
        },
        {
            "name": CMD_COINS_SET,
            "description": "(Admin) Setzt den exakten Coin-Stand eines Users.",
            "options": [
                option(OPTION_USER, "user", "Wessen Coins setzen", true),
                option(OPTION_INTEGER, "value", "Neuer exakter Wert (>= 0)", true),
            ],
        },
        {
            "name": CMD_INVENTORY,
            "description": "Zeigt dein Karten-Inventar als Galerie (nur für dich sichtbar).",
        },
        {
            "name": CMD_TOP,
            "description": "Leaderboard: Wertvollste Sammlungen & größte Sammlungen.",
            "options": [option(OPTION_INTEGER, "limit", "Wie viele Plätze anzeigen (Standard 10, max 25)", false)],
        },
        {
            "name": CMD_TRADE,
            "description": "Starte einen 1:1 Trade (mit Bestätigungs-Buttons).",
            "options": [
                option(OPTION_USER, "user", "Handelspartner", true),
                option(OPTION_STRING, "deine_karte", "ID deiner Karte", true),
                option(OPTION_STRING, "seine_karte", "ID der Karte des Partners", true),
                option(OPTION_INTEGER, "deine_menge", "Menge deiner Karte (default 1)", false),
                option(OPTION_INTEGER, "seine_menge", "Menge seiner Karte (default 1)", false),
            ],
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_commands_defined() {
        let commands = command_definitions(10, 18_000);
        let names: Vec<&str> = commands
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                CMD_PULL,
                CMD_SHOP,
                CMD_COINS,
                CMD_COINS_ADD,
                CMD_COINS_SET,
                CMD_INVENTORY,
                CMD_TOP,
                CMD_TRADE
            ]
        );
        assert_eq!(commands[0]["description"], "Ziehe eine Sammelkarte (1x alle 5h).");
    }

    #[test]
    fn test_required_options_come_first() {
        // Discord rejects optional options before required ones.
        for command in command_definitions(10, 18_000).as_array().unwrap() {
            if let Some(options) = command["options"].as_array() {
                let required: Vec<bool> = options
                    .iter()
                    .map(|o| o["required"].as_bool().unwrap())
                    .collect();
                let mut sorted = required.clone();
                sorted.sort_by(|a, b| b.cmp(a));
                assert_eq!(required, sorted, "command {}", command["name"]);
            }
        }
    }
}
