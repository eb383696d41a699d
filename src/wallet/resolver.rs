//! Symbolic input resolution
//!
//! Maps the facade's symbolic inputs (asset codes, user ids, well-known
//! system account names) to concrete store records, validating activity and
//! asset-type membership on the way.

use sqlx::PgPool;

use crate::account::{Account, AccountKind, AccountRepository, system_accounts};
use crate::asset::{AssetManager, AssetType, normalize_code};

use super::error::EngineError;

/// Resolve an asset code (case-insensitive) to an active asset type
pub async fn resolve_asset(pool: &PgPool, code: &str) -> Result<AssetType, EngineError> {
    let normalized = normalize_code(code).map_err(|_| EngineError::AssetNotFound(code.into()))?;

    let asset = AssetManager::get_by_code(pool, &normalized)
        .await?
        .ok_or_else(|| EngineError::AssetNotFound(normalized.clone()))?;

    // Inactive asset types may not participate in new transactions
    if !asset.is_active {
        return Err(EngineError::AssetNotFound(normalized));
    }

    Ok(asset)
}

/// Resolve a user's wallet for the given asset type
pub async fn resolve_user_account(
    pool: &PgPool,
    user_id: &str,
    asset: &AssetType,
) -> Result<Account, EngineError> {
    let account = AccountRepository::find_by_user_and_asset(pool, user_id, asset.asset_id)
        .await?
        .ok_or_else(|| EngineError::WalletNotFound {
            user_id: user_id.to_string(),
            asset_code: asset.code.clone(),
        })?;

    if !account.is_active {
        return Err(EngineError::WalletInactive);
    }

    Ok(account)
}

/// Find a user's wallet without requiring it to be active.
///
/// Read surfaces (balance, history, verify) stay available for frozen
/// wallets; only money movement demands an active account.
pub async fn find_user_account(
    pool: &PgPool,
    user_id: &str,
    asset: &AssetType,
) -> Result<Account, EngineError> {
    AccountRepository::find_by_user_and_asset(pool, user_id, asset.asset_id)
        .await?
        .ok_or_else(|| EngineError::WalletNotFound {
            user_id: user_id.to_string(),
            asset_code: asset.code.clone(),
        })
}

/// Resolve one of the fixed system accounts for the given asset type
pub async fn resolve_system_account(
    pool: &PgPool,
    name: &str,
    asset: &AssetType,
) -> Result<Account, EngineError> {
    if !system_accounts::is_system_name(name) {
        return Err(EngineError::Validation(format!(
            "unknown system account: {}",
            name
        )));
    }

    let account = AccountRepository::find_by_user_and_asset(pool, name, asset.asset_id)
        .await?
        .ok_or_else(|| EngineError::WalletNotFound {
            user_id: name.to_string(),
            asset_code: asset.code.clone(),
        })?;

    if account.kind != AccountKind::System {
        return Err(EngineError::Validation(format!(
            "account '{}' is not a system account",
            name
        )));
    }

    if !account.is_active {
        return Err(EngineError::WalletInactive);
    }

    Ok(account)
}
