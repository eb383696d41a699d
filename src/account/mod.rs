//! Wallet accounts
//!
//! An account is a per-user per-asset balance record, or one of the fixed
//! system accounts (treasury, bonus pool, revenue). Balances are mutated
//! exclusively through the transfer engine's atomic store primitives.

pub mod models;
pub mod repository;

pub use models::{Account, AccountKind, NewAccount, system_accounts};
pub use repository::AccountRepository;
