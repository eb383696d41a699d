use gamevault::config::AppConfig;
use gamevault::db::Database;
use gamevault::wallet::WalletService;
use gamevault::{gateway, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("GV_ENV").unwrap_or_else(|_| "dev".to_string());
    let config = AppConfig::load(&env)?;

    let _guard = logging::init_logging(&config);

    tracing::info!(
        git = env!("GIT_HASH"),
        env = %env,
        "Starting gamevault wallet service"
    );

    let db = Database::connect(&config).await?;
    db.migrate().await?;

    let service = WalletService::new(
        db.pool().clone(),
        config.wallet.max_transaction_amount,
    );

    gateway::run_server(&config, service).await
}
