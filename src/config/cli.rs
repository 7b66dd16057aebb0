use crate::config::rules::RulesFile;
use crate::config::BotConfig;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "tcg-bot")]
#[command(about = "Discord trading card bot (interactions endpoint)")]
pub struct CliArgs {
    /// Optional TOML file with game rules and rarity weights
    #[arg(short, long, env = "RULES_PATH")]
    pub rules: Option<String>,

    /// Override BIND_ADDR
    #[arg(long)]
    pub bind: Option<String>,

    /// Override DB_PATH
    #[arg(long)]
    pub db_path: Option<String>,

    /// Override CARDS_JSON
    #[arg(long)]
    pub cards_json: Option<String>,

    /// Do not register slash commands on startup
    #[arg(long)]
    pub skip_sync: bool,

    /// Prepare the database and catalogue, then exit
    #[arg(long)]
    pub dry_run: bool,

    /// Emit JSON log lines (for containers)
    #[arg(long, env = "JSON_LOGS")]
    pub json_logs: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// 將命令列參數與規則檔覆蓋到環境設定上
    pub fn apply_to(&self, config: &mut BotConfig) -> Result<()> {
        if let Some(path) = &self.rules {
            tracing::info!("📁 Loading rules from: {}", path);
            RulesFile::from_file(path)?.apply_to(&mut config.rules)?;
        }
        if let Some(bind) = &self.bind {
            config.bind_addr = bind.clone();
        }
        if let Some(db_path) = &self.db_path {
            config.db_path = db_path.clone();
        }
        if let Some(cards_json) = &self.cards_json {
            config.cards_json = cards_json.clone();
        }
        Ok(())
    }
}
