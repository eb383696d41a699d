//! OpenAPI documentation
//!
//! Auto-generated OpenAPI 3.0 document, served at `/api-docs/openapi.json`.

use utoipa::OpenApi;

use crate::gateway::handlers::admin::{
    AccountView, AdminTransactionView, AssetTypeView, CreateAccountRequest,
    CreateAssetTypeRequest, SystemBalanceView,
};
use crate::gateway::handlers::health::HealthResponse;
use crate::gateway::handlers::wallet::{
    BalanceData, BonusRequest, HistoryData, HistoryEntryView, SpendRequest, TopUpRequest,
    TransactionView, VerifyData,
};

/// Main API documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "GameVault Wallet API",
        version = "0.1.0",
        description = "Virtual-wallet transaction engine: idempotent top-up/bonus/spend flows \
                       over a double-entry ledger."
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::wallet::top_up,
        crate::gateway::handlers::wallet::bonus,
        crate::gateway::handlers::wallet::spend,
        crate::gateway::handlers::wallet::get_balance,
        crate::gateway::handlers::wallet::get_history,
        crate::gateway::handlers::wallet::verify_ledger,
        crate::gateway::handlers::admin::create_asset_type,
        crate::gateway::handlers::admin::list_asset_types,
        crate::gateway::handlers::admin::create_account,
        crate::gateway::handlers::admin::list_accounts,
        crate::gateway::handlers::admin::list_transactions,
        crate::gateway::handlers::admin::system_balances,
    ),
    components(schemas(
        HealthResponse,
        TopUpRequest,
        BonusRequest,
        SpendRequest,
        TransactionView,
        BalanceData,
        HistoryData,
        HistoryEntryView,
        VerifyData,
        CreateAssetTypeRequest,
        AssetTypeView,
        CreateAccountRequest,
        AccountView,
        AdminTransactionView,
        SystemBalanceView,
    )),
    tags(
        (name = "System", description = "Health and diagnostics"),
        (name = "Wallet", description = "Wallet flows and reads"),
        (name = "Admin", description = "Asset type and account management")
    )
)]
pub struct ApiDoc;
