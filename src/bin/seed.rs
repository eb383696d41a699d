//! Seed binary
//!
//! Creates the demo asset types, system accounts and player wallets, then
//! funds the players through adjustment transfers so every user balance is
//! backed by ledger entries. Genesis balances are minted directly into the
//! system accounts before any ledger history exists; everything after that
//! moves through the transfer engine.
//!
//! The seed is re-runnable: creates are tolerant of existing rows and the
//! funding transfers carry fixed idempotency keys.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use sqlx::PgPool;

use gamevault::account::{Account, AccountKind, AccountRepository, NewAccount, system_accounts};
use gamevault::asset::{AssetManager, AssetType, NewAssetType};
use gamevault::config::AppConfig;
use gamevault::db::{self, Database};
use gamevault::wallet::engine::{TransferEngine, TransferParams};
use gamevault::wallet::{TxType, WalletStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let env = std::env::var("GV_ENV").unwrap_or_else(|_| "dev".to_string());
    let config = AppConfig::load(&env)?;

    let database = Database::connect(&config).await?;
    database.migrate().await?;

    seed(database.pool()).await?;

    tracing::info!("Seed complete");
    Ok(())
}

async fn seed(pool: &PgPool) -> Result<()> {
    let gold = ensure_asset(pool, "GOLD", "Gold Coins", "Premium in-game currency", 2).await?;
    let points = ensure_asset(pool, "POINTS", "Loyalty Points", "Earned loyalty currency", 0).await?;

    // System accounts for both assets
    for asset in [&gold, &points] {
        for name in system_accounts::ALL {
            ensure_account(pool, name, AccountKind::System, asset).await?;
        }
    }

    // Player wallets
    let alice_gold = ensure_account(pool, "user_alice", AccountKind::User, &gold).await?;
    let bob_gold = ensure_account(pool, "user_bob", AccountKind::User, &gold).await?;
    ensure_account(pool, "user_alice", AccountKind::User, &points).await?;
    let bob_points = ensure_account(pool, "user_bob", AccountKind::User, &points).await?;

    // Genesis mint: target snapshot is Treasury GOLD=10,000,000 and Bonus
    // POINTS=5,000,000 AFTER the player funding below has been transferred
    // out, so the mint includes the funded amounts.
    let treasury_gold =
        ensure_account(pool, system_accounts::TREASURY, AccountKind::System, &gold).await?;
    let bonus_points =
        ensure_account(pool, system_accounts::BONUS_POOL, AccountKind::System, &points).await?;

    mint_genesis(pool, &treasury_gold, Decimal::from(10_000_650u64)).await?;
    mint_genesis(pool, &bonus_points, Decimal::from(5_000_300u64)).await?;

    // Fund players through the engine so their balances have ledger backing
    let engine = TransferEngine::new(WalletStore::new(pool.clone()), None);

    ensure_adjustment(
        &engine,
        "seed-alice-gold-001",
        &treasury_gold,
        &alice_gold,
        &gold,
        Decimal::from(500u64),
    )
    .await?;
    ensure_adjustment(
        &engine,
        "seed-bob-gold-001",
        &treasury_gold,
        &bob_gold,
        &gold,
        Decimal::from(150u64),
    )
    .await?;
    ensure_adjustment(
        &engine,
        "seed-bob-points-001",
        &bonus_points,
        &bob_points,
        &points,
        Decimal::from(300u64),
    )
    .await?;

    Ok(())
}

async fn ensure_asset(
    pool: &PgPool,
    code: &str,
    name: &str,
    description: &str,
    decimal_places: i16,
) -> Result<AssetType> {
    let new = NewAssetType {
        code: code.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        decimal_places,
    };

    match AssetManager::create(pool, &new).await {
        Ok(asset) => {
            tracing::info!(code, "asset type created");
            Ok(asset)
        }
        Err(e) if db::is_unique_violation(&e) => AssetManager::get_by_code(pool, code)
            .await?
            .context("asset type vanished after duplicate-key create"),
        Err(e) => Err(e.into()),
    }
}

async fn ensure_account(
    pool: &PgPool,
    user_id: &str,
    kind: AccountKind,
    asset: &AssetType,
) -> Result<Account> {
    let new = NewAccount {
        user_id: user_id.to_string(),
        kind,
        asset_id: asset.asset_id,
        display_name: None,
        metadata: serde_json::json!({}),
    };

    match AccountRepository::create(pool, &new).await {
        Ok(account) => {
            tracing::info!(user_id, asset = %asset.code, "account created");
            Ok(account)
        }
        Err(e) if db::is_unique_violation(&e) => {
            AccountRepository::find_by_user_and_asset(pool, user_id, asset.asset_id)
                .await?
                .context("account vanished after duplicate-key create")
        }
        Err(e) => Err(e.into()),
    }
}

async fn mint_genesis(pool: &PgPool, account: &Account, balance: Decimal) -> Result<()> {
    // Only mint while the account has no history yet; re-running the seed
    // must not clobber balances that transfers have since moved.
    let has_history: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM ledger_entries_tb WHERE account_id = $1)",
    )
    .bind(account.account_id)
    .fetch_one(pool)
    .await?;

    if has_history {
        tracing::info!(account = %account.user_id, "genesis mint skipped, account has history");
        return Ok(());
    }

    AccountRepository::set_genesis_balance(pool, account.account_id, balance).await?;
    tracing::info!(account = %account.user_id, balance = %balance, "genesis balance minted");
    Ok(())
}

async fn ensure_adjustment(
    engine: &TransferEngine,
    idempotency_key: &str,
    from: &Account,
    to: &Account,
    asset: &AssetType,
    amount: Decimal,
) -> Result<()> {
    let outcome = engine
        .execute_transfer(TransferParams {
            idempotency_key: idempotency_key.to_string(),
            from_account: from.account_id,
            to_account: to.account_id,
            asset_id: asset.asset_id,
            decimal_places: asset.decimal_places(),
            amount,
            tx_type: TxType::Adjustment,
            description: format!("Seed funding for {}", to.user_id),
            metadata: serde_json::json!({ "seed": true }),
        })
        .await?;

    tracing::info!(
        tx_id = %outcome.transaction.tx_id,
        replay = outcome.is_replay,
        user = %to.user_id,
        asset = %asset.code,
        amount = %amount,
        "seed funding transfer"
    );

    Ok(())
}
