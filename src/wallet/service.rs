//! Operation Facade
//!
//! The three named money flows (top-up, bonus, spend) select the correct
//! source and destination for the transfer engine; the read operations
//! (balance, history, ledger verification) answer from the store directly.

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::account::system_accounts;
use crate::asset::AssetType;

use super::engine::{TransferEngine, TransferParams};
use super::error::EngineError;
use super::models::{Transaction, TxStatus, TxType};
use super::resolver;
use super::store::{HistoryRow, WalletStore};

/// History page size cap
pub const MAX_HISTORY_LIMIT: u32 = 100;
/// History page size when the client does not ask for one
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

/// Tolerance for the cached-vs-computed balance comparison
fn consistency_tolerance() -> Decimal {
    Decimal::new(1, 6) // 1e-6
}

/// Common inputs of the three write flows
#[derive(Debug, Clone)]
pub struct FlowParams {
    pub user_id: String,
    pub asset_code: String,
    pub amount: Decimal,
    pub idempotency_key: String,
    pub metadata: Option<Map<String, Value>>,
}

/// A finished write flow, with enough asset context to format the response
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub transaction: Transaction,
    pub is_replay: bool,
    pub asset_code: String,
    pub decimal_places: u32,
}

/// Balance read result
#[derive(Debug, Clone)]
pub struct BalanceView {
    pub balance: Decimal,
    pub asset_code: String,
    pub asset_name: String,
    pub decimal_places: u32,
}

/// History read result
#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub entries: Vec<HistoryRow>,
    pub page: u32,
    pub limit: u32,
    pub decimal_places: u32,
}

/// Ledger verification result: the out-of-band audit tool
#[derive(Debug, Clone)]
pub struct VerifyView {
    pub cached_balance: Decimal,
    pub computed_balance: Decimal,
    pub is_consistent: bool,
    pub asset_code: String,
    pub decimal_places: u32,
}

/// The wallet service: flows + reads over one injected store
pub struct WalletService {
    engine: TransferEngine,
}

impl WalletService {
    pub fn new(pool: PgPool, max_transaction_amount: Option<Decimal>) -> Self {
        let store = WalletStore::new(pool);
        Self {
            engine: TransferEngine::new(store, max_transaction_amount),
        }
    }

    fn pool(&self) -> &PgPool {
        self.engine.store().pool()
    }

    pub fn store(&self) -> &WalletStore {
        self.engine.store()
    }

    /// Top-up: treasury -> user wallet
    pub async fn top_up(&self, params: FlowParams) -> Result<TransferReceipt, EngineError> {
        let asset = resolver::resolve_asset(self.pool(), &params.asset_code).await?;
        let user = resolver::resolve_user_account(self.pool(), &params.user_id, &asset).await?;
        let treasury =
            resolver::resolve_system_account(self.pool(), system_accounts::TREASURY, &asset)
                .await?;

        self.execute_flow(
            &asset,
            treasury.account_id,
            user.account_id,
            TxType::Topup,
            format!("Top-up for {}", params.user_id),
            merge_metadata(params.metadata.clone(), &[]),
            &params,
        )
        .await
    }

    /// Bonus: bonus pool -> user wallet, with a reason tag in the metadata
    pub async fn grant_bonus(
        &self,
        params: FlowParams,
        reason: &str,
    ) -> Result<TransferReceipt, EngineError> {
        let asset = resolver::resolve_asset(self.pool(), &params.asset_code).await?;
        let user = resolver::resolve_user_account(self.pool(), &params.user_id, &asset).await?;
        let pool_account =
            resolver::resolve_system_account(self.pool(), system_accounts::BONUS_POOL, &asset)
                .await?;

        self.execute_flow(
            &asset,
            pool_account.account_id,
            user.account_id,
            TxType::Bonus,
            format!("Bonus for {}", params.user_id),
            merge_metadata(params.metadata.clone(), &[("reason", Value::String(reason.to_string()))]),
            &params,
        )
        .await
    }

    /// Spend: user wallet -> revenue, with the purchased item in the metadata
    pub async fn spend(
        &self,
        params: FlowParams,
        item_id: &str,
    ) -> Result<TransferReceipt, EngineError> {
        let item_id = item_id.trim();
        if item_id.is_empty() {
            return Err(EngineError::Validation("itemId must not be empty".into()));
        }

        let asset = resolver::resolve_asset(self.pool(), &params.asset_code).await?;
        let user = resolver::resolve_user_account(self.pool(), &params.user_id, &asset).await?;
        let revenue =
            resolver::resolve_system_account(self.pool(), system_accounts::REVENUE, &asset)
                .await?;

        self.execute_flow(
            &asset,
            user.account_id,
            revenue.account_id,
            TxType::Spend,
            format!("Spend by {}", params.user_id),
            merge_metadata(params.metadata.clone(), &[("itemId", Value::String(item_id.to_string()))]),
            &params,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn execute_flow(
        &self,
        asset: &AssetType,
        from_account: Uuid,
        to_account: Uuid,
        tx_type: TxType,
        description: String,
        metadata: Value,
        params: &FlowParams,
    ) -> Result<TransferReceipt, EngineError> {
        let outcome = self
            .engine
            .execute_transfer(TransferParams {
                idempotency_key: params.idempotency_key.clone(),
                from_account,
                to_account,
                asset_id: asset.asset_id,
                decimal_places: asset.decimal_places(),
                amount: params.amount,
                tx_type,
                description,
                metadata,
            })
            .await?;

        Ok(TransferReceipt {
            transaction: outcome.transaction,
            is_replay: outcome.is_replay,
            asset_code: asset.code.clone(),
            decimal_places: asset.decimal_places(),
        })
    }

    /// Current cached balance of a user wallet
    pub async fn get_balance(
        &self,
        user_id: &str,
        asset_code: &str,
    ) -> Result<BalanceView, EngineError> {
        let asset = resolver::resolve_asset(self.pool(), asset_code).await?;
        let account = resolver::find_user_account(self.pool(), user_id, &asset).await?;

        Ok(BalanceView {
            balance: account.balance,
            asset_code: asset.code,
            asset_name: asset.name,
            decimal_places: asset.decimal_places as u32,
        })
    }

    /// Ledger history of a user wallet, most recent first
    pub async fn get_history(
        &self,
        user_id: &str,
        asset_code: &str,
        page: u32,
        limit: u32,
    ) -> Result<HistoryPage, EngineError> {
        let asset = resolver::resolve_asset(self.pool(), asset_code).await?;
        let account = resolver::find_user_account(self.pool(), user_id, &asset).await?;

        let page = page.max(1);
        let limit = clamp_limit(limit);
        let offset = (page as i64 - 1) * limit as i64;

        let entries = self
            .store()
            .list_history(account.account_id, offset, limit as i64)
            .await?;

        Ok(HistoryPage {
            entries,
            page,
            limit,
            decimal_places: asset.decimal_places as u32,
        })
    }

    /// Recompute the ledger-derived balance and compare with the cache
    pub async fn verify_ledger(
        &self,
        user_id: &str,
        asset_code: &str,
    ) -> Result<VerifyView, EngineError> {
        let asset = resolver::resolve_asset(self.pool(), asset_code).await?;
        let account = resolver::find_user_account(self.pool(), user_id, &asset).await?;

        let computed = self.store().computed_balance(account.account_id).await?;
        let cached = account.balance;
        let is_consistent = (cached - computed).abs() < consistency_tolerance();

        if !is_consistent {
            tracing::warn!(
                user_id,
                asset_code = %asset.code,
                cached = %cached,
                computed = %computed,
                "ledger inconsistency detected"
            );
        }

        Ok(VerifyView {
            cached_balance: cached,
            computed_balance: computed,
            is_consistent,
            asset_code: asset.code,
            decimal_places: asset.decimal_places as u32,
        })
    }

    /// Admin: list transactions with optional filters
    pub async fn list_transactions(
        &self,
        asset_id: Option<Uuid>,
        status: Option<TxStatus>,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Transaction>, EngineError> {
        let page = page.max(1);
        let limit = clamp_limit(limit);
        let offset = (page as i64 - 1) * limit as i64;

        Ok(self
            .store()
            .list_transactions(asset_id, status, offset, limit as i64)
            .await?)
    }
}

/// Clamp a client-supplied page size into [1, MAX_HISTORY_LIMIT]
pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_HISTORY_LIMIT)
}

/// Merge flow tags into the client metadata bag.
///
/// Client keys are preserved verbatim; flow tags win on collision.
fn merge_metadata(base: Option<Map<String, Value>>, extra: &[(&str, Value)]) -> Value {
    let mut map = base.unwrap_or_default();
    for (key, value) in extra {
        map.insert((*key).to_string(), value.clone());
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit_bounds() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(20), 20);
        assert_eq!(clamp_limit(100), 100);
        assert_eq!(clamp_limit(101), 100);
        assert_eq!(clamp_limit(u32::MAX), 100);
    }

    #[test]
    fn test_merge_metadata_preserves_client_keys() {
        let mut base = Map::new();
        base.insert("campaign".to_string(), Value::String("summer".to_string()));

        let merged = merge_metadata(
            Some(base),
            &[("reason", Value::String("level_complete".to_string()))],
        );

        assert_eq!(merged["campaign"], "summer");
        assert_eq!(merged["reason"], "level_complete");
    }

    #[test]
    fn test_merge_metadata_tags_win_on_collision() {
        let mut base = Map::new();
        base.insert("itemId".to_string(), Value::String("spoofed".to_string()));

        let merged = merge_metadata(
            Some(base),
            &[("itemId", Value::String("item_sword_of_fire".to_string()))],
        );

        assert_eq!(merged["itemId"], "item_sword_of_fire");
    }

    #[test]
    fn test_merge_metadata_empty_base() {
        let merged = merge_metadata(None, &[]);
        assert_eq!(merged, Value::Object(Map::new()));
    }

    #[test]
    fn test_consistency_tolerance_value() {
        assert_eq!(consistency_tolerance().to_string(), "0.000001");
    }
}
