use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tcg_bot::app::interactions::{Interaction, InteractionResponse};
use tcg_bot::app::router::Reply;
use tcg_bot::config::rules::GameRules;
use tcg_bot::core::catalog::sync_catalog;
use tcg_bot::domain::ports::{Clock, DiscordApi, PostOutcome};
use tcg_bot::{GameService, InteractionRouter, Result, SqliteStore};
use tempfile::TempDir;

struct TestClock(AtomicI64);

impl Clock for TestClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Records channel posts and answers with a fixed outcome.
struct RecordingApi {
    outcome: PostOutcome,
    posts: Mutex<Vec<(u64, Value)>>,
    edits: Mutex<Vec<(String, Value)>>,
}

impl RecordingApi {
    fn new(outcome: PostOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            posts: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl DiscordApi for RecordingApi {
    async fn register_commands(&self, _guild_id: Option<u64>, commands: &Value) -> Result<usize> {
        Ok(commands.as_array().map(|a| a.len()).unwrap_or(0))
    }

    async fn post_channel_message(&self, channel_id: u64, message: &Value) -> Result<PostOutcome> {
        self.posts
            .lock()
            .unwrap()
            .push((channel_id, message.clone()));
        Ok(self.outcome)
    }

    async fn edit_original_response(&self, interaction_token: &str, message: &Value) -> Result<()> {
        self.edits
            .lock()
            .unwrap()
            .push((interaction_token.to_string(), message.clone()));
        Ok(())
    }
}

struct Harness {
    _dir: TempDir,
    game: Arc<GameService>,
    clock: Arc<TestClock>,
    api: Arc<RecordingApi>,
    router: InteractionRouter,
}

fn harness(outcome: PostOutcome) -> Harness {
    let dir = TempDir::new().unwrap();
    let cards_path = dir.path().join("cards.json");
    std::fs::write(
        &cards_path,
        json!([
            {"id": "c1", "name": "MC Alpha", "rarity": "common", "image_url": "https://img/c1.png",
             "stats": {"flow": 70, "punchlines": 60}},
            {"id": "c2", "name": "MC Beta", "rarity": "Common", "image_url": "https://img/c2.png"}
        ])
        .to_string(),
    )
    .unwrap();

    let mut rules = GameRules::default();
    for (name, weight) in rules.rarity_weights.iter_mut() {
        *weight = if name == "Common" { 1.0 } else { 0.0 };
    }

    let store = Arc::new(SqliteStore::open(dir.path().join("cards.db")).unwrap());
    store.init(&rules.rarity_weights).unwrap();
    assert_eq!(sync_catalog(&store, &cards_path).unwrap(), 2);

    let clock = Arc::new(TestClock(AtomicI64::new(1_700_000_000)));
    let game = Arc::new(GameService::with_rng(
        store,
        clock.clone(),
        rules,
        StdRng::seed_from_u64(42),
    ));
    let api = RecordingApi::new(outcome);
    let router = InteractionRouter::new(game.clone(), api.clone());
    Harness {
        _dir: dir,
        game,
        clock,
        api,
        router,
    }
}

fn command(user: u64, name: &str, options: Value, admin: bool) -> Interaction {
    serde_json::from_value(json!({
        "type": 2,
        "guild_id": "50",
        "channel_id": "60",
        "token": format!("tok-{}", user),
        "member": {"user": {"id": user.to_string()}, "permissions": if admin { "8" } else { "0" }},
        "data": {"name": name, "options": options}
    }))
    .unwrap()
}

fn component(user: u64, custom_id: &str) -> Interaction {
    serde_json::from_value(json!({
        "type": 3,
        "channel_id": "60",
        "member": {"user": {"id": user.to_string()}, "permissions": "0"},
        "data": {"custom_id": custom_id, "component_type": 2}
    }))
    .unwrap()
}

impl Harness {
    /// Runs a command and returns the immediate response only.
    async fn run(&self, interaction: &Interaction) -> InteractionResponse {
        self.router.handle(interaction).await.unwrap().response
    }

    /// Runs a command and finishes any deferred channel post.
    async fn run_delivered(&self, interaction: &Interaction) -> Reply {
        let reply = self.router.handle(interaction).await.unwrap();
        if let Some(announcement) = reply.announcement.clone() {
            self.router.deliver(announcement).await;
        }
        reply
    }
}

fn content(response: &InteractionResponse) -> String {
    response
        .data
        .as_ref()
        .and_then(|d| d.content.clone())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_pull_posts_publicly_then_cooldown() {
    let h = harness(PostOutcome::Posted);

    let reply = h.run_delivered(&command(1, "karte", json!([]), false)).await;
    assert_eq!(reply.response, InteractionResponse::deferred_ephemeral());

    {
        let posts = h.api.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, 60);
        assert_eq!(posts[0].1["content"], "<@1> hat eine Karte gezogen! 🎉");
        assert_eq!(posts[0].1["embeds"][0]["title"], "🎴 Neue Karte gezogen!");

        let edits = h.api.edits.lock().unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].0, "tok-1");
        assert_eq!(edits[0].1["content"], "✅ Karte wurde im Channel gepostet.");
    }

    let response = h.run(&command(1, "karte", json!([]), false)).await;
    assert_eq!(
        content(&response),
        "⏳ Du kannst erst in **05:00:00** wieder ziehen."
    );

    h.clock.0.fetch_add(3600, Ordering::SeqCst);
    let response = h.run(&command(1, "karte", json!([]), false)).await;
    assert_eq!(
        content(&response),
        "⏳ Du kannst erst in **04:00:00** wieder ziehen."
    );
}

#[tokio::test]
async fn test_card_is_booked_before_the_channel_post() {
    let h = harness(PostOutcome::Posted);

    let reply = h
        .router
        .handle(&command(1, "karte", json!([]), false))
        .await
        .unwrap();
    assert!(reply.announcement.is_some());
    // acknowledged without waiting on the REST call
    assert!(h.api.posts.lock().unwrap().is_empty());
    assert_eq!(h.game.store().inventory(1).unwrap().len(), 1);
}

#[tokio::test]
async fn test_forbidden_channel_falls_back_to_private_embed() {
    let h = harness(PostOutcome::Forbidden);

    h.run_delivered(&command(1, "karte", json!([]), false)).await;
    let edits = h.api.edits.lock().unwrap();
    assert_eq!(edits.len(), 1);
    assert!(edits[0].1.get("content").is_none());
    assert_eq!(edits[0].1["embeds"][0]["title"], "🎴 Neue Karte gezogen!");
}

#[tokio::test]
async fn test_pull_outside_a_channel_answers_directly() {
    let h = harness(PostOutcome::Posted);
    let dm: Interaction = serde_json::from_value(json!({
        "type": 2,
        "token": "tok-dm",
        "user": {"id": "1"},
        "data": {"name": "karte"}
    }))
    .unwrap();

    let reply = h.router.handle(&dm).await.unwrap();
    assert!(reply.announcement.is_none());
    let data = reply.response.data.unwrap();
    assert!(data.is_ephemeral());
    assert_eq!(data.embeds.unwrap()[0].title, "🎴 Neue Karte gezogen!");
}

#[tokio::test]
async fn test_coins_admin_and_shop() {
    let h = harness(PostOutcome::Posted);

    let response = h.run(&command(1, "shop", json!([]), false)).await;
    assert_eq!(content(&response), "💰 Du hast 0 Coins. Du brauchst **10**.");

    let grant = json!([
        {"name": "user", "type": 6, "value": "1"},
        {"name": "amount", "type": 4, "value": 25}
    ]);
    let response = h.run(&command(2, "coins_add", grant.clone(), false)).await;
    assert_eq!(content(&response), "⛔ Nur Admins dürfen Coins vergeben.");

    let response = h.run(&command(2, "coins_add", grant, true)).await;
    assert_eq!(
        content(&response),
        "✅ <@1> hat **+25** TCG Coins erhalten. Neuer Stand: **25**."
    );

    let zero = json!([
        {"name": "user", "type": 6, "value": "1"},
        {"name": "amount", "type": 4, "value": 0}
    ]);
    let response = h.run(&command(2, "coins_add", zero, true)).await;
    assert_eq!(content(&response), "Bitte eine positive Anzahl angeben.");

    h.run_delivered(&command(1, "shop", json!([]), false)).await;
    assert_eq!(
        h.api.edits.lock().unwrap()[0].1["content"],
        "✅ Kauf wurde im Channel gepostet."
    );
    assert_eq!(h.game.coins(1).unwrap(), 15);

    let response = h.run(&command(1, "coins", json!([]), false)).await;
    assert_eq!(content(&response), "💰 Du hast **15** TCG Coins.");

    let set = json!([
        {"name": "user", "type": 6, "value": "1"},
        {"name": "value", "type": 4, "value": -1}
    ]);
    let response = h.run(&command(2, "coins_set", set, true)).await;
    assert_eq!(content(&response), "Wert darf nicht negativ sein.");

    let other = json!([{"name": "user", "type": 6, "value": "1"}]);
    let response = h.run(&command(2, "coins", other, false)).await;
    assert_eq!(content(&response), "💰 <@1> hat **15** TCG Coins.");
}

#[tokio::test]
async fn test_trade_roundtrip_through_buttons() {
    let h = harness(PostOutcome::Posted);
    h.game.store().add_to_inventory(1, "c1").unwrap();
    h.game.store().add_to_inventory(2, "c2").unwrap();

    let options = json!([
        {"name": "user", "type": 6, "value": "2"},
        {"name": "deine_karte", "type": 3, "value": "c1"},
        {"name": "seine_karte", "type": 3, "value": "c2"}
    ]);
    let response = h.run(&command(1, "trade", options, false)).await;
    let data = response.data.clone().unwrap();
    assert!(!data.is_ephemeral());
    assert!(content(&response).contains("**1× MC Alpha** gegen **1× MC Beta**"));
    let buttons = &data.components.unwrap()[0].components;
    assert_eq!(buttons[0].custom_id, "trade:accept:1");
    assert_eq!(buttons[1].custom_id, "trade:cancel:1");

    let response = h.run(&component(1, "trade:accept:1")).await;
    assert_eq!(content(&response), "Nur der Empfänger kann annehmen.");

    let response = h.run(&component(2, "trade:accept:1")).await;
    assert_eq!(response.kind, 7);
    assert_eq!(content(&response), "✅ Trade abgeschlossen!");
    assert_eq!(response.data.unwrap().components, Some(Vec::new()));

    assert_eq!(h.game.store().card_qty(1, "c2").unwrap(), 1);
    assert_eq!(h.game.store().card_qty(2, "c1").unwrap(), 1);
    assert_eq!(h.game.store().card_qty(1, "c1").unwrap(), 0);

    let response = h.run(&component(1, "trade:cancel:1")).await;
    assert_eq!(content(&response), "Dieser Trade ist nicht mehr aktiv.");
}

#[tokio::test]
async fn test_inventory_gallery_paging_and_expiry() {
    let h = harness(PostOutcome::Posted);

    let response = h.run(&command(1, "inventar", json!([]), false)).await;
    assert_eq!(content(&response), "📦 Du hast noch keine Karten.");

    h.game.store().add_to_inventory(1, "c1").unwrap();
    h.game.store().add_to_inventory(1, "c2").unwrap();

    let response = h.run(&command(1, "inventar", json!([]), false)).await;
    let data = response.data.unwrap();
    assert!(data.is_ephemeral());
    let next = data.components.unwrap()[0].components[1].custom_id.clone();
    assert_eq!(next, "inv:1:1:1700000000");

    let response = h.run(&component(2, &next)).await;
    assert_eq!(content(&response), "Nur der Besitzer kann hier blättern.");

    h.clock.0.fetch_add(60, Ordering::SeqCst);
    let response = h.run(&component(1, &next)).await;
    assert_eq!(response.kind, 7);
    let data = response.data.unwrap();
    let embed = &data.embeds.as_ref().unwrap()[0];
    assert_eq!(embed.title, "📚 Inventar – Karte 2/2");
    assert_eq!(embed.description.as_deref(), Some("**MC Beta** (Common) · x1"));
    // wraps around and carries the fresh timestamp
    assert_eq!(
        data.components.unwrap()[0].components[1].custom_id,
        "inv:1:2:1700000060"
    );

    h.clock.0.fetch_add(121, Ordering::SeqCst);
    let response = h.run(&component(1, &next)).await;
    assert_eq!(
        content(&response),
        "⌛ Diese Ansicht ist abgelaufen. Nutze /inventar erneut."
    );
}

#[tokio::test]
async fn test_leaderboard_and_unknown_inputs() {
    let h = harness(PostOutcome::Posted);
    h.game.store().add_to_inventory(3, "c1").unwrap();

    let response = h.run(&command(1, "top", json!([{"name": "limit", "type": 4, "value": 100}]), false)).await;
    let data = response.data.unwrap();
    assert!(!data.is_ephemeral());
    let embed = &data.embeds.unwrap()[0];
    assert_eq!(embed.title, "🏆 Leaderboard");
    assert_eq!(embed.fields[0].value, "🥇 <@3> — **1 Punkte** · 1 Karten");

    let response = h.run(&command(1, "dance", json!([]), false)).await;
    assert_eq!(content(&response), "Unbekannter Befehl.");

    assert!(h.router.handle(&component(1, "bogus:1")).await.is_err());
}
