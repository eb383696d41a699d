//! Transaction and ledger entry models
//!
//! Numeric IDs are designed for PostgreSQL storage as SMALLINT.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use uuid::Uuid;

/// Money-movement flavor of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum TxType {
    Topup = 1,
    Bonus = 2,
    Spend = 3,
    /// Seed/operator-driven correction
    Adjustment = 4,
}

impl TxType {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TxType::Topup),
            2 => Some(TxType::Bonus),
            3 => Some(TxType::Spend),
            4 => Some(TxType::Adjustment),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Topup => "topup",
            TxType::Bonus => "bonus",
            TxType::Spend => "spend",
            TxType::Adjustment => "adjustment",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction lifecycle state
///
/// Terminal states: COMPLETED (1), FAILED (-1). A pending row doubles as the
/// at-most-once lock for its idempotency key; it is advanced to a terminal
/// state by the worker that created it, never by a replaying worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum TxStatus {
    Pending = 0,
    Completed = 1,
    Failed = -1,
}

impl TxStatus {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxStatus::Completed | TxStatus::Failed)
    }

    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(TxStatus::Pending),
            1 => Some(TxStatus::Completed),
            -1 => Some(TxStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Pending => "pending",
            TxStatus::Completed => "completed",
            TxStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ledger entry direction: credit raises the balance, debit lowers it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum EntryType {
    Credit = 1,
    Debit = 2,
}

impl EntryType {
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(EntryType::Credit),
            2 => Some(EntryType::Debit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Credit => "credit",
            EntryType::Debit => "debit",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One money-movement event
#[derive(Debug, Clone)]
pub struct Transaction {
    pub tx_id: Uuid,
    pub idempotency_key: String,
    pub asset_id: Uuid,
    pub from_account: Uuid,
    pub to_account: Uuid,
    pub amount: Decimal,
    pub tx_type: TxType,
    pub status: TxStatus,
    pub description: String,
    pub metadata: serde_json::Value,
    pub failure_reason: Option<String>,
    pub debit_entry_id: Option<Uuid>,
    pub credit_entry_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One immutable half of a double-entry record.
///
/// `balance_after` is the account balance snapshot returned by the atomic
/// update that this entry records. It reflects some serial schedule of the
/// balance updates, not the insertion order of entries.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub entry_id: Uuid,
    pub tx_id: Uuid,
    pub account_id: Uuid,
    pub asset_id: Uuid,
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_type_roundtrip() {
        for t in [TxType::Topup, TxType::Bonus, TxType::Spend, TxType::Adjustment] {
            assert_eq!(TxType::from_id(t.id()), Some(t));
        }
        assert_eq!(TxType::from_id(0), None);
        assert_eq!(TxType::from_id(5), None);
    }

    #[test]
    fn test_tx_status_roundtrip_and_terminality() {
        for s in [TxStatus::Pending, TxStatus::Completed, TxStatus::Failed] {
            assert_eq!(TxStatus::from_id(s.id()), Some(s));
        }
        assert!(!TxStatus::Pending.is_terminal());
        assert!(TxStatus::Completed.is_terminal());
        assert!(TxStatus::Failed.is_terminal());
    }

    #[test]
    fn test_entry_type_roundtrip() {
        assert_eq!(EntryType::from_id(1), Some(EntryType::Credit));
        assert_eq!(EntryType::from_id(2), Some(EntryType::Debit));
        assert_eq!(EntryType::from_id(3), None);
        assert_eq!(EntryType::Credit.as_str(), "credit");
        assert_eq!(EntryType::Debit.as_str(), "debit");
    }
}
