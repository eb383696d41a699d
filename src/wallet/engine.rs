//! Transfer Engine
//!
//! Drives the pending -> completed/failed state machine for a single
//! transaction: idempotency check, pending insert (the at-most-once lock),
//! atomic conditional debit and unconditional credit in deterministic
//! account order, the paired ledger write, and finalization.
//!
//! The engine holds no in-process lock across any store call; any number of
//! replicas across any number of processes is safe. The unique index on
//! (idempotency_key, asset_id) is the serialization point.

use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::account::AccountRepository;
use crate::money;

use super::error::EngineError;
use super::models::{EntryType, LedgerEntry, Transaction, TxType};
use super::store::{NewTransaction, PendingInsert, WalletStore};

/// Minimum idempotency key length after trimming
pub const MIN_IDEMPOTENCY_KEY_LEN: usize = 8;

/// Bounded re-read of a concurrently created transaction after a duplicate
/// key: 5 attempts, 25 ms doubling capped at 150 ms (< 500 ms total wait)
const REPLAY_READ_ATTEMPTS: u32 = 5;
const REPLAY_BACKOFF_START: Duration = Duration::from_millis(25);
const REPLAY_BACKOFF_CAP: Duration = Duration::from_millis(150);

/// Bounded retries for each side of the paired ledger write
const LEDGER_WRITE_ATTEMPTS: u32 = 3;

/// Inputs for one transfer execution
#[derive(Debug, Clone)]
pub struct TransferParams {
    pub idempotency_key: String,
    pub from_account: Uuid,
    pub to_account: Uuid,
    pub asset_id: Uuid,
    pub decimal_places: u32,
    pub amount: Decimal,
    pub tx_type: TxType,
    pub description: String,
    pub metadata: serde_json::Value,
}

/// Result of one transfer execution
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub transaction: Transaction,
    pub is_replay: bool,
}

/// The transfer engine: a stateless bundle of operations over the store
pub struct TransferEngine {
    store: WalletStore,
    max_transaction_amount: Option<Decimal>,
}

/// Validate and trim an idempotency key
pub fn validate_idempotency_key(raw: &str) -> Result<String, EngineError> {
    let key = raw.trim();
    if key.len() < MIN_IDEMPOTENCY_KEY_LEN {
        return Err(EngineError::Validation(format!(
            "idempotency key must be at least {} characters after trimming",
            MIN_IDEMPOTENCY_KEY_LEN
        )));
    }
    Ok(key.to_string())
}

/// Deterministic update order: the account with the smaller id goes first.
///
/// The baseline store only needs per-row atomicity, but a global order keeps
/// reversed transfers between the same two accounts deadlock-free under
/// storage layers that take row-level locks.
fn debit_first(from_account: Uuid, to_account: Uuid) -> bool {
    from_account <= to_account
}

impl TransferEngine {
    pub fn new(store: WalletStore, max_transaction_amount: Option<Decimal>) -> Self {
        Self {
            store,
            max_transaction_amount,
        }
    }

    pub fn store(&self) -> &WalletStore {
        &self.store
    }

    /// Execute a transfer with at-most-once semantics.
    ///
    /// On first execution the returned transaction is terminal (completed or
    /// failed). On replay the original outcome is returned verbatim with
    /// `is_replay = true` - including a still-pending one, which is never
    /// retried from a different worker; operators reconcile via the verify
    /// surface.
    pub async fn execute_transfer(
        &self,
        params: TransferParams,
    ) -> Result<TransferOutcome, EngineError> {
        let key = validate_idempotency_key(&params.idempotency_key)?;

        // 1. Idempotency lookup. This runs before amount validation so that
        //    a replay with mismatched parameters still observes the original
        //    outcome instead of a fresh validation error.
        if let Some(existing) = self
            .store
            .find_by_idempotency_key(&key, params.asset_id)
            .await?
        {
            info!(tx_id = %existing.tx_id, status = %existing.status, "idempotent replay");
            return Ok(TransferOutcome {
                transaction: existing,
                is_replay: true,
            });
        }

        // 2. Validation, all before any store mutation
        let amount = money::normalize(params.amount, params.decimal_places)?;

        if let Some(max) = self.max_transaction_amount
            && amount > max
        {
            return Err(EngineError::AmountExceedsLimit(max));
        }

        if params.from_account == params.to_account {
            return Err(EngineError::InvalidTransfer(
                "source and destination are the same account".into(),
            ));
        }

        self.validate_accounts(&params).await?;

        // 3. Insert the pending row - the at-most-once lock
        let new = NewTransaction {
            idempotency_key: key.clone(),
            asset_id: params.asset_id,
            from_account: params.from_account,
            to_account: params.to_account,
            amount,
            tx_type: params.tx_type,
            description: params.description,
            metadata: params.metadata,
        };

        let tx = match self.store.insert_pending(&new).await? {
            PendingInsert::Inserted(tx) => tx,
            PendingInsert::DuplicateKey => {
                // A concurrent worker won the race; observe its outcome
                return self.read_winner(&key, params.asset_id).await;
            }
        };

        // 4-8. Settle; any error flips the transaction to FAILED first
        match self.settle(&tx, amount).await {
            Ok(completed) => Ok(TransferOutcome {
                transaction: completed,
                is_replay: false,
            }),
            Err(e) => {
                if let Err(mark_err) = self.store.mark_failed(tx.tx_id, &e.to_string()).await {
                    error!(
                        tx_id = %tx.tx_id,
                        error = %mark_err,
                        "could not mark transaction failed"
                    );
                }
                Err(e)
            }
        }
    }

    /// Both accounts must exist, be active, differ, and carry the requested
    /// asset type
    async fn validate_accounts(&self, params: &TransferParams) -> Result<(), EngineError> {
        let pool = self.store.pool();

        let from = AccountRepository::get_by_id(pool, params.from_account)
            .await?
            .ok_or_else(|| EngineError::AccountNotFound(params.from_account.to_string()))?;
        let to = AccountRepository::get_by_id(pool, params.to_account)
            .await?
            .ok_or_else(|| EngineError::AccountNotFound(params.to_account.to_string()))?;

        if !from.is_active {
            return Err(EngineError::AccountInactive(from.account_id.to_string()));
        }
        if !to.is_active {
            return Err(EngineError::AccountInactive(to.account_id.to_string()));
        }

        if from.asset_id != params.asset_id || to.asset_id != params.asset_id {
            return Err(EngineError::AssetMismatch);
        }

        Ok(())
    }

    /// Steps 4-8: balance updates, paired ledger write, completion
    async fn settle(&self, tx: &Transaction, amount: Decimal) -> Result<Transaction, EngineError> {
        let (debit_after, credit_after) = self.apply_balance_updates(tx, amount).await?;

        let (debit_entry, credit_entry) = self
            .write_ledger_pair(tx, amount, debit_after, credit_after)
            .await?;

        let completed = self
            .store
            .mark_completed(tx.tx_id, debit_entry.entry_id, credit_entry.entry_id)
            .await?;

        info!(
            tx_id = %completed.tx_id,
            tx_type = %completed.tx_type,
            amount = %amount,
            "transfer completed"
        );

        Ok(completed)
    }

    /// Apply the conditional debit and the credit in sorted account-id order.
    ///
    /// Whichever update landed first is reversed best-effort if the second
    /// one fails; a failed reversal is recorded on the transaction as a
    /// double fault for out-of-band reconciliation.
    async fn apply_balance_updates(
        &self,
        tx: &Transaction,
        amount: Decimal,
    ) -> Result<(Decimal, Decimal), EngineError> {
        if debit_first(tx.from_account, tx.to_account) {
            let debit_after = self
                .store
                .conditional_debit(tx.from_account, amount)
                .await?
                .ok_or(EngineError::InsufficientBalance)?;

            match self.store.credit(tx.to_account, amount).await? {
                Some(credit_after) => Ok((debit_after, credit_after)),
                None => {
                    // The debit already landed; re-add the deducted amount
                    let reason = match self.store.credit(tx.from_account, amount).await {
                        Ok(Some(_)) => {
                            warn!(tx_id = %tx.tx_id, "credit failed, source compensated");
                            "destination rejected credit; source compensated".to_string()
                        }
                        Ok(None) | Err(_) => {
                            error!(
                                tx_id = %tx.tx_id,
                                "credit failed and compensation failed, manual reconciliation required"
                            );
                            "destination rejected credit; COMPENSATION FAILED".to_string()
                        }
                    };
                    Err(EngineError::InternalStore(reason))
                }
            }
        } else {
            let credit_after = self
                .store
                .credit(tx.to_account, amount)
                .await?
                .ok_or_else(|| {
                    EngineError::InternalStore("destination account rejected credit".into())
                })?;

            match self.store.conditional_debit(tx.from_account, amount).await? {
                Some(debit_after) => Ok((debit_after, credit_after)),
                None => {
                    // The credit already landed; take the amount back
                    match self.store.conditional_debit(tx.to_account, amount).await {
                        Ok(Some(_)) => {
                            warn!(tx_id = %tx.tx_id, "debit refused, destination compensated");
                        }
                        Ok(None) | Err(_) => {
                            error!(
                                tx_id = %tx.tx_id,
                                "debit refused and compensation failed, manual reconciliation required"
                            );
                            // Record the double fault before the generic
                            // failure path overwrites nothing (pending-only
                            // guard keeps the first reason)
                            let _ = self
                                .store
                                .mark_failed(
                                    tx.tx_id,
                                    "insufficient balance; destination COMPENSATION FAILED",
                                )
                                .await;
                        }
                    }
                    Err(EngineError::InsufficientBalance)
                }
            }
        }
    }

    /// Paired ledger write, each side retried a bounded number of times.
    ///
    /// If a side still fails, the balance updates stay in place and the
    /// transaction fails; the verify surface detects the gap.
    async fn write_ledger_pair(
        &self,
        tx: &Transaction,
        amount: Decimal,
        debit_after: Decimal,
        credit_after: Decimal,
    ) -> Result<(LedgerEntry, LedgerEntry), EngineError> {
        let debit_entry = self
            .insert_entry_with_retry(tx, tx.from_account, EntryType::Debit, amount, debit_after)
            .await?;
        let credit_entry = self
            .insert_entry_with_retry(tx, tx.to_account, EntryType::Credit, amount, credit_after)
            .await?;

        Ok((debit_entry, credit_entry))
    }

    async fn insert_entry_with_retry(
        &self,
        tx: &Transaction,
        account_id: Uuid,
        entry_type: EntryType,
        amount: Decimal,
        balance_after: Decimal,
    ) -> Result<LedgerEntry, EngineError> {
        let mut attempt = 0;
        loop {
            match self
                .store
                .insert_ledger_entry(tx.tx_id, account_id, tx.asset_id, entry_type, amount, balance_after)
                .await
            {
                Ok(entry) => return Ok(entry),
                Err(e) => {
                    attempt += 1;
                    if attempt >= LEDGER_WRITE_ATTEMPTS {
                        error!(
                            tx_id = %tx.tx_id,
                            entry_type = %entry_type,
                            error = %e,
                            "ledger write failed after {} attempts",
                            attempt
                        );
                        return Err(EngineError::Store(e));
                    }
                    warn!(
                        tx_id = %tx.tx_id,
                        entry_type = %entry_type,
                        attempt,
                        error = %e,
                        "ledger write failed, retrying"
                    );
                }
            }
        }
    }

    /// After a duplicate-key insert, re-read the winner's transaction in a
    /// bounded exponential-backoff loop
    async fn read_winner(
        &self,
        idempotency_key: &str,
        asset_id: Uuid,
    ) -> Result<TransferOutcome, EngineError> {
        let mut delay = REPLAY_BACKOFF_START;

        for attempt in 1..=REPLAY_READ_ATTEMPTS {
            tokio::time::sleep(delay).await;

            if let Some(tx) = self
                .store
                .find_by_idempotency_key(idempotency_key, asset_id)
                .await?
            {
                info!(
                    tx_id = %tx.tx_id,
                    attempt,
                    "concurrent creator observed after duplicate key"
                );
                return Ok(TransferOutcome {
                    transaction: tx,
                    is_replay: true,
                });
            }

            delay = (delay * 2).min(REPLAY_BACKOFF_CAP);
        }

        warn!(
            idempotency_key,
            "duplicate key reported but no transaction visible after backoff"
        );
        Err(EngineError::TransactionConflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_idempotency_key_trims_and_bounds() {
        assert_eq!(validate_idempotency_key("  abcd1234  ").unwrap(), "abcd1234");
        assert!(validate_idempotency_key("abcd123").is_err());
        assert!(validate_idempotency_key("   ab   ").is_err());
        assert!(validate_idempotency_key("").is_err());
    }

    #[test]
    fn test_debit_first_is_total_order() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);

        // Exactly one of the two directions debits first
        assert!(debit_first(a, b));
        assert!(!debit_first(b, a));
        // Same id sorts stably (rejected upstream anyway)
        assert!(debit_first(a, a));
    }
}
