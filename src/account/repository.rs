//! Repository layer for account lookups and admin mutations
//!
//! Balance mutation lives in `wallet::store`, not here; this layer only
//! creates and reads account rows.

use super::models::{Account, AccountKind, NewAccount};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

const ACCOUNT_COLUMNS: &str = "account_id, user_id, account_kind, asset_id, balance, \
     display_name, metadata, is_active, created_at, updated_at";

/// Account repository
pub struct AccountRepository;

impl AccountRepository {
    /// Get account by ID
    pub async fn get_by_id(pool: &PgPool, account_id: Uuid) -> Result<Option<Account>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM accounts_tb WHERE account_id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(account_id)
        .fetch_optional(pool)
        .await?;

        row.map(|r| row_to_account(&r)).transpose()
    }

    /// Get the wallet for a (user, asset) pair
    pub async fn find_by_user_and_asset(
        pool: &PgPool,
        user_id: &str,
        asset_id: Uuid,
    ) -> Result<Option<Account>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM accounts_tb WHERE user_id = $1 AND asset_id = $2",
            ACCOUNT_COLUMNS
        ))
        .bind(user_id)
        .bind(asset_id)
        .fetch_optional(pool)
        .await?;

        row.map(|r| row_to_account(&r)).transpose()
    }

    /// Create a new account with zero balance.
    ///
    /// A duplicate (user_id, asset_id) surfaces as a unique-violation
    /// `sqlx::Error`; callers classify it via `db::is_unique_violation`.
    pub async fn create(pool: &PgPool, new: &NewAccount) -> Result<Account, sqlx::Error> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO accounts_tb (user_id, account_kind, asset_id, display_name, metadata)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(&new.user_id)
        .bind(new.kind.id())
        .bind(new.asset_id)
        .bind(&new.display_name)
        .bind(&new.metadata)
        .fetch_one(pool)
        .await?;

        row_to_account(&row)
    }

    /// List accounts with optional user filter (admin surface)
    pub async fn list(
        pool: &PgPool,
        user_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Account>, sqlx::Error> {
        let rows = match user_id {
            Some(uid) => {
                sqlx::query(&format!(
                    "SELECT {} FROM accounts_tb WHERE user_id = $1 \
                     ORDER BY created_at DESC LIMIT $2",
                    ACCOUNT_COLUMNS
                ))
                .bind(uid)
                .bind(limit)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM accounts_tb ORDER BY created_at DESC LIMIT $1",
                    ACCOUNT_COLUMNS
                ))
                .bind(limit)
                .fetch_all(pool)
                .await?
            }
        };

        rows.iter().map(row_to_account).collect()
    }

    /// Snapshot of all system account balances with their asset codes
    pub async fn system_balances(
        pool: &PgPool,
    ) -> Result<Vec<(Account, String, i16)>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}, t.code AS asset_code, t.decimal_places AS asset_decimal_places
            FROM accounts_tb a
            JOIN asset_types_tb t ON a.asset_id = t.asset_id
            WHERE a.account_kind = $1
            ORDER BY a.user_id ASC, t.code ASC
            "#,
            qualified_columns("a")
        ))
        .bind(AccountKind::System.id())
        .fetch_all(pool)
        .await?;

        rows.iter()
            .map(|r| {
                let account = row_to_account(r)?;
                let code: String = r.get("asset_code");
                let decimal_places: i16 = r.get("asset_decimal_places");
                Ok((account, code, decimal_places))
            })
            .collect()
    }

    /// Seed-only direct balance write, bypassing the transfer engine.
    ///
    /// Used exclusively to mint genesis balances into system accounts before
    /// any ledger history exists. Never called on user accounts.
    pub async fn set_genesis_balance(
        pool: &PgPool,
        account_id: Uuid,
        balance: Decimal,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE accounts_tb SET balance = $1, updated_at = NOW() WHERE account_id = $2",
        )
        .bind(balance)
        .bind(account_id)
        .execute(pool)
        .await?;

        Ok(())
    }
}

fn qualified_columns(alias: &str) -> String {
    ACCOUNT_COLUMNS
        .split(", ")
        .map(|c| format!("{}.{}", alias, c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn row_to_account(row: &PgRow) -> Result<Account, sqlx::Error> {
    let kind_id: i16 = row.get("account_kind");
    let kind = AccountKind::from_id(kind_id)
        .ok_or_else(|| sqlx::Error::Protocol(format!("Invalid account_kind: {}", kind_id)))?;

    Ok(Account {
        account_id: row.get("account_id"),
        user_id: row.get("user_id"),
        kind,
        asset_id: row.get("asset_id"),
        balance: row.get("balance"),
        display_name: row.get("display_name"),
        metadata: row.get("metadata"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
