//! Account models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use uuid::Uuid;

/// Well-known system account names.
///
/// System accounts are the fixed counterparties of the three wallet flows;
/// they are created by the seed/admin surface, one per asset type they serve.
pub mod system_accounts {
    pub const TREASURY: &str = "SYSTEM_TREASURY";
    pub const BONUS_POOL: &str = "SYSTEM_BONUS_POOL";
    pub const REVENUE: &str = "SYSTEM_REVENUE";

    pub const ALL: [&str; 3] = [TREASURY, BONUS_POOL, REVENUE];

    pub fn is_system_name(name: &str) -> bool {
        ALL.contains(&name)
    }
}

/// Account ownership kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum AccountKind {
    /// Player-owned wallet
    User = 1,
    /// Platform-owned account (treasury, bonus pool, revenue)
    System = 2,
}

impl AccountKind {
    /// Get numeric ID for PostgreSQL storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// Convert from PostgreSQL ID
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(AccountKind::User),
            2 => Some(AccountKind::System),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::User => "user",
            AccountKind::System => "system",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A wallet: one balance slot for one (user, asset) pair
#[derive(Debug, Clone)]
pub struct Account {
    pub account_id: Uuid,
    pub user_id: String,
    pub kind: AccountKind,
    pub asset_id: Uuid,
    pub balance: Decimal,
    pub display_name: Option<String>,
    pub metadata: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a new account (admin/seed surface)
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_id: String,
    pub kind: AccountKind,
    pub asset_id: Uuid,
    pub display_name: Option<String>,
    pub metadata: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_kind_roundtrip() {
        for kind in [AccountKind::User, AccountKind::System] {
            assert_eq!(AccountKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(AccountKind::from_id(0), None);
        assert_eq!(AccountKind::from_id(3), None);
    }

    #[test]
    fn test_system_account_names() {
        assert!(system_accounts::is_system_name("SYSTEM_TREASURY"));
        assert!(system_accounts::is_system_name("SYSTEM_BONUS_POOL"));
        assert!(system_accounts::is_system_name("SYSTEM_REVENUE"));
        assert!(!system_accounts::is_system_name("SYSTEM_JACKPOT"));
        assert!(!system_accounts::is_system_name("alice"));
    }
}
