use clap::Parser;
use std::sync::Arc;
use tcg_bot::app::commands::command_definitions;
use tcg_bot::app::server::{self, AppState};
use tcg_bot::core::catalog::sync_catalog;
use tcg_bot::domain::ports::DiscordApi;
use tcg_bot::utils::error::ErrorSeverity;
use tcg_bot::utils::logger::{self, LogFormat};
use tcg_bot::utils::validation::Validate;
use tcg_bot::{
    BotConfig, CliArgs, DiscordRestClient, GameService, InteractionRouter, Result, SqliteStore,
    SystemClock,
};

async fn run(args: CliArgs) -> Result<()> {
    let mut config = BotConfig::from_env()?;
    args.apply_to(&mut config)?;
    config.validate()?;
    if args.verbose {
        tracing::debug!("Bot config: {:?}", config);
    }

    // 資料庫與卡片目錄
    let store = Arc::new(SqliteStore::open(&config.db_path)?);
    store.init(&config.rules.rarity_weights)?;
    sync_catalog(&store, &config.cards_json)?;

    let api = Arc::new(DiscordRestClient::new(
        &config.api_base,
        &config.token,
        config.application_id,
    )?);

    if args.skip_sync {
        tracing::info!("⏭️ Skipping slash command sync");
    } else {
        let commands =
            command_definitions(config.rules.shop_price, config.rules.pull_cooldown_seconds);
        let synced = api.register_commands(config.guild_id, &commands).await?;
        match config.guild_id {
            Some(guild) => tracing::info!(
                "✅ {} Slash-Commands für Guild {} synchronisiert",
                synced,
                guild
            ),
            None => tracing::info!(
                "✅ {} globale Slash-Commands synchronisiert (Propagation kann dauern)",
                synced
            ),
        }
    }

    if args.dry_run {
        tracing::info!("🧪 Dry run finished, not starting the server");
        return Ok(());
    }

    let addr = config.socket_addr()?;
    let game = Arc::new(GameService::new(
        store,
        Arc::new(SystemClock),
        config.rules.clone(),
    ));
    let router = InteractionRouter::new(game, api);
    let state = AppState::new(router, &config.public_key)?;
    server::serve(addr, state).await
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 初始化日誌
    logger::init_logger(LogFormat::from_json_flag(args.json_logs), args.verbose);
    tracing::info!("Starting tcg-bot");

    if let Err(e) = run(args).await {
        tracing::error!(
            "❌ Bot stopped: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low | ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }
}
