//! Wallet handlers: the three write flows plus balance, history and verify

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, ok, write_result};
use crate::money;
use crate::wallet::engine::validate_idempotency_key;
use crate::wallet::service::{DEFAULT_HISTORY_LIMIT, FlowParams, TransferReceipt};
use crate::wallet::store::HistoryRow;

// ============================================================================
// Request DTOs
// ============================================================================

/// Top-up request body
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopUpRequest {
    pub user_id: String,
    pub asset_code: String,
    /// Amount as a decimal string, e.g. "100" or "2.50"
    pub amount: String,
    pub idempotency_key: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Map<String, Value>>,
}

/// Bonus request body: top-up shape plus a reason tag
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BonusRequest {
    pub user_id: String,
    pub asset_code: String,
    pub amount: String,
    pub reason: String,
    pub idempotency_key: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Map<String, Value>>,
}

/// Spend request body: top-up shape plus the purchased item
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpendRequest {
    pub user_id: String,
    pub asset_code: String,
    pub amount: String,
    pub item_id: String,
    pub idempotency_key: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Map<String, Value>>,
}

/// History query string
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Transaction as returned by the write endpoints
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: String,
    pub idempotency_key: String,
    pub asset_code: String,
    pub from_account: String,
    pub to_account: String,
    /// Amount formatted at the asset precision
    #[schema(example = "100.00")]
    pub amount: String,
    #[serde(rename = "type")]
    pub tx_type: String,
    pub status: String,
    pub description: String,
    #[schema(value_type = Object)]
    pub metadata: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// The two ledger entry ids once completed, empty otherwise
    pub ledger_entries: Vec<String>,
    pub created_at: String,
}

impl TransactionView {
    fn from_receipt(receipt: &TransferReceipt) -> Self {
        let tx = &receipt.transaction;
        let ledger_entries = [tx.debit_entry_id, tx.credit_entry_id]
            .iter()
            .flatten()
            .map(|id| id.to_string())
            .collect();

        Self {
            id: tx.tx_id.to_string(),
            idempotency_key: tx.idempotency_key.clone(),
            asset_code: receipt.asset_code.clone(),
            from_account: tx.from_account.to_string(),
            to_account: tx.to_account.to_string(),
            amount: money::format_amount(tx.amount, receipt.decimal_places),
            tx_type: tx.tx_type.as_str().to_string(),
            status: tx.status.as_str().to_string(),
            description: tx.description.clone(),
            metadata: tx.metadata.clone(),
            failure_reason: tx.failure_reason.clone(),
            ledger_entries,
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// Balance read response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceData {
    #[schema(example = "570.00")]
    pub balance: String,
    pub asset_code: String,
    pub asset_name: String,
}

/// One history listing row
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryView {
    pub id: String,
    pub transaction_id: String,
    pub entry_type: String,
    pub amount: String,
    pub balance_after: String,
    pub transaction_type: String,
    pub transaction_status: String,
    pub description: String,
    #[schema(value_type = Object)]
    pub metadata: Value,
    pub created_at: String,
}

impl HistoryEntryView {
    fn from_row(row: &HistoryRow, decimal_places: u32) -> Self {
        Self {
            id: row.entry.entry_id.to_string(),
            transaction_id: row.entry.tx_id.to_string(),
            entry_type: row.entry.entry_type.as_str().to_string(),
            amount: money::format_amount(row.entry.amount, decimal_places),
            balance_after: money::format_amount(row.entry.balance_after, decimal_places),
            transaction_type: row.tx_type.as_str().to_string(),
            transaction_status: row.tx_status.as_str().to_string(),
            description: row.description.clone(),
            metadata: row.tx_metadata.clone(),
            created_at: row.entry.created_at.to_rfc3339(),
        }
    }
}

/// History read response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryData {
    pub entries: Vec<HistoryEntryView>,
    pub page: u32,
    pub limit: u32,
}

/// Ledger verification response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyData {
    pub cached_balance: String,
    pub computed_balance: String,
    pub is_consistent: bool,
    pub asset_code: String,
}

// ============================================================================
// Idempotency key transport
// ============================================================================

/// Idempotency key: header `idempotency-key` or body `idempotencyKey`.
/// Required for all write endpoints; trimmed; at least 8 characters.
fn extract_idempotency_key(
    headers: &HeaderMap,
    body_key: Option<&String>,
) -> Result<String, ApiError> {
    let raw = headers
        .get("idempotency-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| body_key.cloned())
        .ok_or_else(|| {
            ApiError::bad_request(
                "Missing idempotency key: provide header 'idempotency-key' or body 'idempotencyKey'",
            )
        })?;

    validate_idempotency_key(&raw).map_err(ApiError::from)
}

// ============================================================================
// Write handlers
// ============================================================================

/// Top-up a user wallet from the treasury
///
/// POST /api/wallets/topup
#[utoipa::path(
    post,
    path = "/api/wallets/topup",
    request_body = TopUpRequest,
    responses(
        (status = 201, description = "Transfer executed", body = TransactionView),
        (status = 200, description = "Idempotent replay of an earlier execution"),
        (status = 400, description = "Invalid parameters or missing idempotency key"),
        (status = 404, description = "Unknown asset or wallet"),
        (status = 409, description = "Transaction conflict"),
        (status = 422, description = "Insufficient balance")
    ),
    tag = "Wallet"
)]
pub async fn top_up(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<TopUpRequest>,
) -> ApiResult<TransactionView> {
    let key = match extract_idempotency_key(&headers, req.idempotency_key.as_ref()) {
        Ok(k) => k,
        Err(e) => return e.into_err(),
    };
    let amount = match money::parse_amount(&req.amount) {
        Ok(a) => a,
        Err(e) => return ApiError::bad_request(format!("invalid amount: {}", e)).into_err(),
    };

    let params = FlowParams {
        user_id: req.user_id,
        asset_code: req.asset_code,
        amount,
        idempotency_key: key,
        metadata: req.metadata,
    };

    match state.service.top_up(params).await {
        Ok(receipt) => write_result(TransactionView::from_receipt(&receipt), receipt.is_replay),
        Err(e) => ApiError::from(e).into_err(),
    }
}

/// Grant a bonus to a user wallet from the bonus pool
///
/// POST /api/wallets/bonus
#[utoipa::path(
    post,
    path = "/api/wallets/bonus",
    request_body = BonusRequest,
    responses(
        (status = 201, description = "Transfer executed", body = TransactionView),
        (status = 200, description = "Idempotent replay of an earlier execution"),
        (status = 400, description = "Invalid parameters or missing idempotency key"),
        (status = 404, description = "Unknown asset or wallet"),
        (status = 409, description = "Transaction conflict"),
        (status = 422, description = "Insufficient balance")
    ),
    tag = "Wallet"
)]
pub async fn bonus(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<BonusRequest>,
) -> ApiResult<TransactionView> {
    let key = match extract_idempotency_key(&headers, req.idempotency_key.as_ref()) {
        Ok(k) => k,
        Err(e) => return e.into_err(),
    };
    let amount = match money::parse_amount(&req.amount) {
        Ok(a) => a,
        Err(e) => return ApiError::bad_request(format!("invalid amount: {}", e)).into_err(),
    };

    let params = FlowParams {
        user_id: req.user_id,
        asset_code: req.asset_code,
        amount,
        idempotency_key: key,
        metadata: req.metadata,
    };

    match state.service.grant_bonus(params, &req.reason).await {
        Ok(receipt) => write_result(TransactionView::from_receipt(&receipt), receipt.is_replay),
        Err(e) => ApiError::from(e).into_err(),
    }
}

/// Spend from a user wallet into revenue
///
/// POST /api/wallets/spend
#[utoipa::path(
    post,
    path = "/api/wallets/spend",
    request_body = SpendRequest,
    responses(
        (status = 201, description = "Transfer executed", body = TransactionView),
        (status = 200, description = "Idempotent replay of an earlier execution"),
        (status = 400, description = "Invalid parameters or missing idempotency key"),
        (status = 404, description = "Unknown asset or wallet"),
        (status = 409, description = "Transaction conflict"),
        (status = 422, description = "Insufficient balance")
    ),
    tag = "Wallet"
)]
pub async fn spend(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<SpendRequest>,
) -> ApiResult<TransactionView> {
    let key = match extract_idempotency_key(&headers, req.idempotency_key.as_ref()) {
        Ok(k) => k,
        Err(e) => return e.into_err(),
    };
    let amount = match money::parse_amount(&req.amount) {
        Ok(a) => a,
        Err(e) => return ApiError::bad_request(format!("invalid amount: {}", e)).into_err(),
    };

    let params = FlowParams {
        user_id: req.user_id,
        asset_code: req.asset_code,
        amount,
        idempotency_key: key,
        metadata: req.metadata,
    };

    match state.service.spend(params, &req.item_id).await {
        Ok(receipt) => write_result(TransactionView::from_receipt(&receipt), receipt.is_replay),
        Err(e) => ApiError::from(e).into_err(),
    }
}

// ============================================================================
// Read handlers
// ============================================================================

/// Get a user wallet balance
///
/// GET /api/wallets/{user_id}/balance/{asset_code}
#[utoipa::path(
    get,
    path = "/api/wallets/{user_id}/balance/{asset_code}",
    params(
        ("user_id" = String, Path, description = "User id"),
        ("asset_code" = String, Path, description = "Asset code, case-insensitive")
    ),
    responses(
        (status = 200, description = "Balance", body = BalanceData),
        (status = 404, description = "Unknown asset or wallet")
    ),
    tag = "Wallet"
)]
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path((user_id, asset_code)): Path<(String, String)>,
) -> ApiResult<BalanceData> {
    match state.service.get_balance(&user_id, &asset_code).await {
        Ok(view) => ok(BalanceData {
            balance: money::format_amount(view.balance, view.decimal_places),
            asset_code: view.asset_code,
            asset_name: view.asset_name,
        }),
        Err(e) => ApiError::from(e).into_err(),
    }
}

/// Get the ledger history of a user wallet, most recent first
///
/// GET /api/wallets/{user_id}/history/{asset_code}?page=&limit=
#[utoipa::path(
    get,
    path = "/api/wallets/{user_id}/history/{asset_code}",
    params(
        ("user_id" = String, Path, description = "User id"),
        ("asset_code" = String, Path, description = "Asset code, case-insensitive"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Page size, clamped to 100")
    ),
    responses(
        (status = 200, description = "History page", body = HistoryData),
        (status = 404, description = "Unknown asset or wallet")
    ),
    tag = "Wallet"
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path((user_id, asset_code)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<HistoryData> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

    match state
        .service
        .get_history(&user_id, &asset_code, page, limit)
        .await
    {
        Ok(history) => ok(HistoryData {
            entries: history
                .entries
                .iter()
                .map(|row| HistoryEntryView::from_row(row, history.decimal_places))
                .collect(),
            page: history.page,
            limit: history.limit,
        }),
        Err(e) => ApiError::from(e).into_err(),
    }
}

/// Recompute the ledger-derived balance and compare with the cached one
///
/// GET /api/wallets/{user_id}/verify/{asset_code}
#[utoipa::path(
    get,
    path = "/api/wallets/{user_id}/verify/{asset_code}",
    params(
        ("user_id" = String, Path, description = "User id"),
        ("asset_code" = String, Path, description = "Asset code, case-insensitive")
    ),
    responses(
        (status = 200, description = "Verification result", body = VerifyData),
        (status = 404, description = "Unknown asset or wallet")
    ),
    tag = "Wallet"
)]
pub async fn verify_ledger(
    State(state): State<Arc<AppState>>,
    Path((user_id, asset_code)): Path<(String, String)>,
) -> ApiResult<VerifyData> {
    match state.service.verify_ledger(&user_id, &asset_code).await {
        Ok(view) => ok(VerifyData {
            cached_balance: money::format_amount(view.cached_balance, view.decimal_places),
            computed_balance: money::format_amount(view.computed_balance, view.decimal_places),
            is_consistent: view.is_consistent,
            asset_code: view.asset_code,
        }),
        Err(e) => ApiError::from(e).into_err(),
    }
}
