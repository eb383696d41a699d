//! Admin handlers: asset-type and account management, transaction listing,
//! system balances snapshot

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, created, ok};
use crate::account::{Account, AccountKind, AccountRepository, NewAccount, system_accounts};
use crate::asset::{AssetManager, AssetType, NewAssetType, normalize_code};
use crate::db;
use crate::money;
use crate::wallet::service::DEFAULT_HISTORY_LIMIT;
use crate::wallet::{Transaction, TxStatus};

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssetTypeRequest {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub decimal_places: i16,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetTypeView {
    pub id: String,
    pub code: String,
    pub name: String,
    pub description: String,
    pub decimal_places: i16,
    pub is_active: bool,
    pub created_at: String,
}

impl AssetTypeView {
    fn from_asset(asset: &AssetType) -> Self {
        Self {
            id: asset.asset_id.to_string(),
            code: asset.code.clone(),
            name: asset.name.clone(),
            description: asset.description.clone(),
            decimal_places: asset.decimal_places,
            is_active: asset.is_active,
            created_at: asset.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub user_id: String,
    pub asset_code: String,
    /// "user" (default) or "system"; system accounts must use a well-known name
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: String,
    pub user_id: String,
    pub account_type: String,
    pub asset_id: String,
    pub balance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl AccountView {
    fn from_account(account: &Account) -> Self {
        Self {
            id: account.account_id.to_string(),
            user_id: account.user_id.clone(),
            account_type: account.kind.as_str().to_string(),
            asset_id: account.asset_id.to_string(),
            balance: account.balance.to_string(),
            display_name: account.display_name.clone(),
            is_active: account.is_active,
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    pub asset_code: Option<String>,
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminTransactionView {
    pub id: String,
    pub idempotency_key: String,
    pub asset_id: String,
    pub from_account: String,
    pub to_account: String,
    pub amount: String,
    #[serde(rename = "type")]
    pub tx_type: String,
    pub status: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_at: String,
}

impl AdminTransactionView {
    fn from_tx(tx: &Transaction) -> Self {
        Self {
            id: tx.tx_id.to_string(),
            idempotency_key: tx.idempotency_key.clone(),
            asset_id: tx.asset_id.to_string(),
            from_account: tx.from_account.to_string(),
            to_account: tx.to_account.to_string(),
            amount: tx.amount.to_string(),
            tx_type: tx.tx_type.as_str().to_string(),
            status: tx.status.as_str().to_string(),
            description: tx.description.clone(),
            failure_reason: tx.failure_reason.clone(),
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemBalanceView {
    pub account: String,
    pub asset_code: String,
    pub balance: String,
    pub is_active: bool,
}

// ============================================================================
// Asset types
// ============================================================================

/// Create an asset type
///
/// POST /api/admin/asset-types
#[utoipa::path(
    post,
    path = "/api/admin/asset-types",
    request_body = CreateAssetTypeRequest,
    responses(
        (status = 201, description = "Asset type created", body = AssetTypeView),
        (status = 400, description = "Invalid code or precision"),
        (status = 409, description = "Duplicate asset type code")
    ),
    tag = "Admin"
)]
pub async fn create_asset_type(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAssetTypeRequest>,
) -> ApiResult<AssetTypeView> {
    let code = match normalize_code(&req.code) {
        Ok(c) => c,
        Err(e) => return ApiError::bad_request(e).into_err(),
    };

    if !(0..=money::MAX_DECIMAL_PLACES as i16).contains(&req.decimal_places) {
        return ApiError::bad_request(format!(
            "decimalPlaces must be in [0, {}]",
            money::MAX_DECIMAL_PLACES
        ))
        .into_err();
    }

    if req.name.trim().is_empty() {
        return ApiError::bad_request("name must not be empty").into_err();
    }

    let new = NewAssetType {
        code,
        name: req.name.trim().to_string(),
        description: req.description.unwrap_or_default(),
        decimal_places: req.decimal_places,
    };

    match AssetManager::create(state.service.store().pool(), &new).await {
        Ok(asset) => created(AssetTypeView::from_asset(&asset)),
        Err(e) if db::is_unique_violation(&e) => {
            ApiError::conflict(format!("asset type '{}' already exists", new.code)).into_err()
        }
        Err(e) => {
            tracing::error!(error = %e, "asset type create failed");
            ApiError::internal("internal store error").into_err()
        }
    }
}

/// List all asset types
///
/// GET /api/admin/asset-types
#[utoipa::path(
    get,
    path = "/api/admin/asset-types",
    responses((status = 200, description = "Asset types", body = [AssetTypeView])),
    tag = "Admin"
)]
pub async fn list_asset_types(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<AssetTypeView>> {
    match AssetManager::list_all(state.service.store().pool()).await {
        Ok(assets) => ok(assets.iter().map(AssetTypeView::from_asset).collect()),
        Err(e) => {
            tracing::error!(error = %e, "asset type listing failed");
            ApiError::internal("internal store error").into_err()
        }
    }
}

// ============================================================================
// Accounts
// ============================================================================

/// Create an account (wallet) for a user or a system name
///
/// POST /api/admin/accounts
#[utoipa::path(
    post,
    path = "/api/admin/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = AccountView),
        (status = 400, description = "Invalid parameters"),
        (status = 404, description = "Unknown asset"),
        (status = 409, description = "Account already exists for this user and asset")
    ),
    tag = "Admin"
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<AccountView> {
    let pool = state.service.store().pool();

    let user_id = req.user_id.trim().to_string();
    if user_id.is_empty() {
        return ApiError::bad_request("userId must not be empty").into_err();
    }

    let kind = match req.account_type.as_deref() {
        None => {
            if system_accounts::is_system_name(&user_id) {
                AccountKind::System
            } else {
                AccountKind::User
            }
        }
        Some("user") => AccountKind::User,
        Some("system") => AccountKind::System,
        Some(other) => {
            return ApiError::bad_request(format!("unknown accountType: {}", other)).into_err();
        }
    };

    // System names and the system kind must agree both ways
    if (kind == AccountKind::System) != system_accounts::is_system_name(&user_id) {
        return ApiError::bad_request(
            "system accounts must use a well-known SYSTEM_* name, and vice versa",
        )
        .into_err();
    }

    let code = match normalize_code(&req.asset_code) {
        Ok(c) => c,
        Err(e) => return ApiError::bad_request(e).into_err(),
    };
    let asset = match AssetManager::get_by_code(pool, &code).await {
        Ok(Some(asset)) => asset,
        Ok(None) => return ApiError::not_found(format!("asset not found: {}", code)).into_err(),
        Err(e) => {
            tracing::error!(error = %e, "asset lookup failed");
            return ApiError::internal("internal store error").into_err();
        }
    };

    let new = NewAccount {
        user_id: user_id.clone(),
        kind,
        asset_id: asset.asset_id,
        display_name: req.display_name,
        metadata: Value::Object(req.metadata.unwrap_or_default()),
    };

    match AccountRepository::create(pool, &new).await {
        Ok(account) => created(AccountView::from_account(&account)),
        Err(e) if db::is_unique_violation(&e) => ApiError::conflict(format!(
            "account already exists for user '{}' and asset '{}'",
            user_id, code
        ))
        .into_err(),
        Err(e) => {
            tracing::error!(error = %e, "account create failed");
            ApiError::internal("internal store error").into_err()
        }
    }
}

/// List accounts, optionally filtered by user
///
/// GET /api/admin/accounts?user_id=
#[utoipa::path(
    get,
    path = "/api/admin/accounts",
    params(("user_id" = Option<String>, Query, description = "Filter by user id")),
    responses((status = 200, description = "Accounts", body = [AccountView])),
    tag = "Admin"
)]
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListAccountsQuery>,
) -> ApiResult<Vec<AccountView>> {
    match AccountRepository::list(
        state.service.store().pool(),
        query.user_id.as_deref(),
        200,
    )
    .await
    {
        Ok(accounts) => ok(accounts.iter().map(AccountView::from_account).collect()),
        Err(e) => {
            tracing::error!(error = %e, "account listing failed");
            ApiError::internal("internal store error").into_err()
        }
    }
}

// ============================================================================
// Transactions & system balances
// ============================================================================

/// List transactions with optional asset/status filters
///
/// GET /api/admin/transactions?asset_code=&status=&page=&limit=
#[utoipa::path(
    get,
    path = "/api/admin/transactions",
    params(
        ("asset_code" = Option<String>, Query, description = "Filter by asset code"),
        ("status" = Option<String>, Query, description = "pending | completed | failed"),
        ("page" = Option<u32>, Query, description = "1-based page number"),
        ("limit" = Option<u32>, Query, description = "Page size, clamped to 100")
    ),
    responses((status = 200, description = "Transactions", body = [AdminTransactionView])),
    tag = "Admin"
)]
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTransactionsQuery>,
) -> ApiResult<Vec<AdminTransactionView>> {
    let pool = state.service.store().pool();

    let asset_id: Option<Uuid> = match &query.asset_code {
        Some(code) => {
            let code = match normalize_code(code) {
                Ok(c) => c,
                Err(e) => return ApiError::bad_request(e).into_err(),
            };
            match AssetManager::get_by_code(pool, &code).await {
                Ok(Some(asset)) => Some(asset.asset_id),
                Ok(None) => {
                    return ApiError::not_found(format!("asset not found: {}", code)).into_err();
                }
                Err(e) => {
                    tracing::error!(error = %e, "asset lookup failed");
                    return ApiError::internal("internal store error").into_err();
                }
            }
        }
        None => None,
    };

    let status = match query.status.as_deref() {
        None => None,
        Some("pending") => Some(TxStatus::Pending),
        Some("completed") => Some(TxStatus::Completed),
        Some("failed") => Some(TxStatus::Failed),
        Some(other) => {
            return ApiError::bad_request(format!("unknown status filter: {}", other)).into_err();
        }
    };

    match state
        .service
        .list_transactions(
            asset_id,
            status,
            query.page.unwrap_or(1),
            query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
        )
        .await
    {
        Ok(txs) => ok(txs.iter().map(AdminTransactionView::from_tx).collect()),
        Err(e) => ApiError::from(e).into_err(),
    }
}

/// Snapshot of all system account balances
///
/// GET /api/admin/system-balances
#[utoipa::path(
    get,
    path = "/api/admin/system-balances",
    responses((status = 200, description = "System balances", body = [SystemBalanceView])),
    tag = "Admin"
)]
pub async fn system_balances(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<SystemBalanceView>> {
    match AccountRepository::system_balances(state.service.store().pool()).await {
        Ok(rows) => ok(rows
            .iter()
            .map(|(account, code, decimal_places)| SystemBalanceView {
                account: account.user_id.clone(),
                asset_code: code.clone(),
                balance: money::format_amount(account.balance, *decimal_places as u32),
                is_active: account.is_active,
            })
            .collect()),
        Err(e) => {
            tracing::error!(error = %e, "system balances snapshot failed");
            ApiError::internal("internal store error").into_err()
        }
    }
}
