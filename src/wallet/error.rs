//! Engine error taxonomy
//!
//! Every failure the engine can surface, classified so the gateway can map
//! kinds to user-visible status codes without string matching.

use crate::money::MoneyError;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("wallet not found for user '{user_id}' and asset '{asset_code}'")]
    WalletNotFound { user_id: String, asset_code: String },

    #[error("wallet is inactive")]
    WalletInactive,

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("account is inactive: {0}")]
    AccountInactive(String),

    #[error("account asset does not match the requested asset type")]
    AssetMismatch,

    #[error("invalid transfer: {0}")]
    InvalidTransfer(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] MoneyError),

    #[error("amount exceeds per-transaction limit of {0}")]
    AmountExceedsLimit(Decimal),

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("concurrent transaction with the same idempotency key could not be observed")]
    TransactionConflict,

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("internal store error: {0}")]
    InternalStore(String),
}
