//! Gateway request handlers

pub mod admin;
pub mod health;
pub mod wallet;

pub use admin::{
    create_account, create_asset_type, list_accounts, list_asset_types, list_transactions,
    system_balances,
};
pub use health::{HealthResponse, health_check};
pub use wallet::{bonus, get_balance, get_history, spend, top_up, verify_ledger};
