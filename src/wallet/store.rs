//! Wallet Store Layer
//!
//! PostgreSQL-backed primitives the transfer engine is built on. The
//! contract is deliberately narrow so it can be re-implemented on any
//! backend offering per-row conditional atomic updates plus unique-key
//! constraints:
//!
//! - unique insert of a pending transaction (duplicate key distinguishable)
//! - conditional atomic debit (`balance >= amount AND is_active`)
//! - unconditional atomic credit (gated on `is_active`)
//! - append-only ledger entry insert
//!
//! No multi-statement SQL transactions are used on the engine path;
//! correctness depends only on single-UPDATE atomicity and the unique
//! indexes.

use rust_decimal::Decimal;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::db;

use super::models::{EntryType, LedgerEntry, Transaction, TxStatus, TxType};

const TX_COLUMNS: &str = "tx_id, idempotency_key, asset_id, from_account, to_account, amount, \
     tx_type, status, description, metadata, failure_reason, debit_entry_id, credit_entry_id, \
     created_at, updated_at";

const ENTRY_COLUMNS: &str =
    "entry_id, tx_id, account_id, asset_id, entry_type, amount, balance_after, created_at";

/// Parameters for inserting a new pending transaction
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub idempotency_key: String,
    pub asset_id: Uuid,
    pub from_account: Uuid,
    pub to_account: Uuid,
    pub amount: Decimal,
    pub tx_type: TxType,
    pub description: String,
    pub metadata: serde_json::Value,
}

/// Outcome of a unique insert attempt
#[derive(Debug)]
pub enum PendingInsert {
    Inserted(Transaction),
    /// Another worker holds the (idempotency_key, asset_id) lock
    DuplicateKey,
}

/// One history listing row: a ledger entry joined with its owning transaction
#[derive(Debug, Clone)]
pub struct HistoryRow {
    pub entry: LedgerEntry,
    pub tx_type: TxType,
    pub tx_status: TxStatus,
    pub description: String,
    pub tx_metadata: serde_json::Value,
}

/// Wallet store operations
#[derive(Clone)]
pub struct WalletStore {
    pool: PgPool,
}

impl WalletStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Look up a transaction by its idempotency lock key
    pub async fn find_by_idempotency_key(
        &self,
        idempotency_key: &str,
        asset_id: Uuid,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM transactions_tb WHERE idempotency_key = $1 AND asset_id = $2",
            TX_COLUMNS
        ))
        .bind(idempotency_key)
        .bind(asset_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_transaction(&r)).transpose()
    }

    /// Insert a new transaction in PENDING state.
    ///
    /// The unique index on (idempotency_key, asset_id) is the authoritative
    /// at-most-once lock; a duplicate key means a concurrent worker won the
    /// race and is reported as a distinct outcome, not an error.
    pub async fn insert_pending(&self, new: &NewTransaction) -> Result<PendingInsert, sqlx::Error> {
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO transactions_tb
                (idempotency_key, asset_id, from_account, to_account, amount,
                 tx_type, status, description, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            TX_COLUMNS
        ))
        .bind(&new.idempotency_key)
        .bind(new.asset_id)
        .bind(new.from_account)
        .bind(new.to_account)
        .bind(new.amount)
        .bind(new.tx_type.id())
        .bind(TxStatus::Pending.id())
        .bind(&new.description)
        .bind(&new.metadata)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(PendingInsert::Inserted(row_to_transaction(&row)?)),
            Err(e) if db::is_unique_violation(&e) => Ok(PendingInsert::DuplicateKey),
            Err(e) => Err(e),
        }
    }

    /// Conditional atomic debit.
    ///
    /// Applies `balance <- balance - amount` only while the predicate
    /// `balance >= amount AND is_active` still holds at commit time.
    /// Returns the post-debit balance, or None if the predicate failed.
    pub async fn conditional_debit(
        &self,
        account_id: Uuid,
        amount: Decimal,
    ) -> Result<Option<Decimal>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            UPDATE accounts_tb
            SET balance = balance - $2, updated_at = NOW()
            WHERE account_id = $1 AND balance >= $2 AND is_active
            RETURNING balance
            "#,
        )
        .bind(account_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("balance")))
    }

    /// Unconditional atomic credit, still gated on the account being active.
    ///
    /// Returns the post-credit balance, or None if the account is missing or
    /// was concurrently deactivated.
    pub async fn credit(
        &self,
        account_id: Uuid,
        amount: Decimal,
    ) -> Result<Option<Decimal>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            UPDATE accounts_tb
            SET balance = balance + $2, updated_at = NOW()
            WHERE account_id = $1 AND is_active
            RETURNING balance
            "#,
        )
        .bind(account_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("balance")))
    }

    /// Append one ledger entry. Entries are never updated or deleted.
    pub async fn insert_ledger_entry(
        &self,
        tx_id: Uuid,
        account_id: Uuid,
        asset_id: Uuid,
        entry_type: EntryType,
        amount: Decimal,
        balance_after: Decimal,
    ) -> Result<LedgerEntry, sqlx::Error> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO ledger_entries_tb
                (tx_id, account_id, asset_id, entry_type, amount, balance_after)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ENTRY_COLUMNS
        ))
        .bind(tx_id)
        .bind(account_id)
        .bind(asset_id)
        .bind(entry_type.id())
        .bind(amount)
        .bind(balance_after)
        .fetch_one(&self.pool)
        .await?;

        row_to_entry(&row)
    }

    /// Advance a pending transaction to COMPLETED and attach its two ledger
    /// entries. Terminal states are never left: the update is guarded on the
    /// row still being PENDING.
    pub async fn mark_completed(
        &self,
        tx_id: Uuid,
        debit_entry_id: Uuid,
        credit_entry_id: Uuid,
    ) -> Result<Transaction, sqlx::Error> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE transactions_tb
            SET status = $2, debit_entry_id = $3, credit_entry_id = $4, updated_at = NOW()
            WHERE tx_id = $1 AND status = $5
            RETURNING {}
            "#,
            TX_COLUMNS
        ))
        .bind(tx_id)
        .bind(TxStatus::Completed.id())
        .bind(debit_entry_id)
        .bind(credit_entry_id)
        .bind(TxStatus::Pending.id())
        .fetch_one(&self.pool)
        .await?;

        row_to_transaction(&row)
    }

    /// Advance a pending transaction to FAILED with a failure reason.
    ///
    /// Guarded on PENDING like `mark_completed`; a second call keeps the
    /// first recorded reason. Returns whether the transition happened.
    pub async fn mark_failed(&self, tx_id: Uuid, reason: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE transactions_tb
            SET status = $2, failure_reason = $3, updated_at = NOW()
            WHERE tx_id = $1 AND status = $4
            "#,
        )
        .bind(tx_id)
        .bind(TxStatus::Failed.id())
        .bind(reason)
        .bind(TxStatus::Pending.id())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Ledger entries for one account, most recent first, with the owning
    /// transaction's type, status, description and metadata
    pub async fn list_history(
        &self,
        account_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<HistoryRow>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}, t.tx_type AS tx_type, t.status AS tx_status,
                   t.description AS description, t.metadata AS tx_metadata
            FROM ledger_entries_tb e
            JOIN transactions_tb t ON e.tx_id = t.tx_id
            WHERE e.account_id = $1
            ORDER BY e.created_at DESC, e.entry_id DESC
            OFFSET $2 LIMIT $3
            "#,
            qualified_entry_columns("e")
        ))
        .bind(account_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                let entry = row_to_entry(r)?;
                let tx_type_id: i16 = r.get("tx_type");
                let tx_status_id: i16 = r.get("tx_status");
                Ok(HistoryRow {
                    entry,
                    tx_type: TxType::from_id(tx_type_id).ok_or_else(|| {
                        sqlx::Error::Protocol(format!("Invalid tx_type: {}", tx_type_id))
                    })?,
                    tx_status: TxStatus::from_id(tx_status_id).ok_or_else(|| {
                        sqlx::Error::Protocol(format!("Invalid status: {}", tx_status_id))
                    })?,
                    description: r.get("description"),
                    tx_metadata: r.get("tx_metadata"),
                })
            })
            .collect()
    }

    /// Recompute an account balance from its ledger:
    /// sum(credits) - sum(debits) over completed transactions only
    pub async fn computed_balance(&self, account_id: Uuid) -> Result<Decimal, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(
                SUM(CASE WHEN e.entry_type = $2 THEN e.amount ELSE -e.amount END),
                0
            ) AS computed
            FROM ledger_entries_tb e
            JOIN transactions_tb t ON e.tx_id = t.tx_id
            WHERE e.account_id = $1 AND t.status = $3
            "#,
        )
        .bind(account_id)
        .bind(EntryType::Credit.id())
        .bind(TxStatus::Completed.id())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("computed"))
    }

    /// List transactions with optional filters (admin surface)
    pub async fn list_transactions(
        &self,
        asset_id: Option<Uuid>,
        status: Option<TxStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM transactions_tb
            WHERE ($1::uuid IS NULL OR asset_id = $1)
              AND ($2::smallint IS NULL OR status = $2)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
            TX_COLUMNS
        ))
        .bind(asset_id)
        .bind(status.map(|s| s.id()))
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_transaction).collect()
    }
}

fn qualified_entry_columns(alias: &str) -> String {
    ENTRY_COLUMNS
        .split(", ")
        .map(|c| format!("{}.{}", alias, c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn row_to_transaction(row: &PgRow) -> Result<Transaction, sqlx::Error> {
    let tx_type_id: i16 = row.get("tx_type");
    let tx_type = TxType::from_id(tx_type_id)
        .ok_or_else(|| sqlx::Error::Protocol(format!("Invalid tx_type: {}", tx_type_id)))?;

    let status_id: i16 = row.get("status");
    let status = TxStatus::from_id(status_id)
        .ok_or_else(|| sqlx::Error::Protocol(format!("Invalid status: {}", status_id)))?;

    Ok(Transaction {
        tx_id: row.get("tx_id"),
        idempotency_key: row.get("idempotency_key"),
        asset_id: row.get("asset_id"),
        from_account: row.get("from_account"),
        to_account: row.get("to_account"),
        amount: row.get("amount"),
        tx_type,
        status,
        description: row.get("description"),
        metadata: row.get("metadata"),
        failure_reason: row.get("failure_reason"),
        debit_entry_id: row.get("debit_entry_id"),
        credit_entry_id: row.get("credit_entry_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_entry(row: &PgRow) -> Result<LedgerEntry, sqlx::Error> {
    let entry_type_id: i16 = row.get("entry_type");
    let entry_type = EntryType::from_id(entry_type_id)
        .ok_or_else(|| sqlx::Error::Protocol(format!("Invalid entry_type: {}", entry_type_id)))?;

    Ok(LedgerEntry {
        entry_id: row.get("entry_id"),
        tx_id: row.get("tx_id"),
        account_id: row.get("account_id"),
        asset_id: row.get("asset_id"),
        entry_type,
        amount: row.get("amount"),
        balance_after: row.get("balance_after"),
        created_at: row.get("created_at"),
    })
}
