use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a permissionless boost refresh (`kick`) was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KickRejection {
    /// The target still holds voting power; only a fully decayed lock may be kicked.
    UserLockedBalanceNonZero,
    /// The stored working supply already equals the base-only value.
    WorkingSupplyUpToDate,
}

impl fmt::Display for KickRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KickRejection::UserLockedBalanceNonZero => write!(f, "UserLockedBalanceNonZero"),
            KickRejection::WorkingSupplyUpToDate => write!(f, "WorkingSupplyUpToDate"),
        }
    }
}

/// Protocol-wide error types for the PPI farm.
///
/// Every variant is raised before any ledger entry is written, so a call
/// that returns an error leaves balances, locks and pools as it found them.
/// At most the vote-escrow supply cursor has moved forward, which no query
/// can observe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PpiError {
    /// Zero or otherwise disallowed amount supplied to a mutating call.
    #[error("Invalid amount: must be greater than 0")]
    InvalidAmount,

    /// Lock lifecycle violation (existing lock, missing/expired lock, bad unlock time).
    #[error("Lock state conflict: {0}")]
    LockStateConflict(String),

    /// Withdraw attempted before the lock's unlock time.
    #[error("Lock has not expired yet")]
    LockNotExpired,

    /// Withdraw amount exceeds the recorded stake.
    #[error("Insufficient stake: requested {requested} but only {available} staked")]
    InsufficientStake { requested: u128, available: u128 },

    /// `kick` refused.
    #[error("Boost refresh rejected: {0}")]
    BoostRefreshRejected(KickRejection),

    /// Token balance too small for a transfer.
    #[error("Insufficient balance: requested {requested} but only {available} available")]
    InsufficientBalance { requested: u128, available: u128 },

    /// Spender allowance too small for a `transfer_from`.
    #[error("Insufficient allowance: requested {requested} but only {allowed} approved")]
    InsufficientAllowance { requested: u128, allowed: u128 },

    /// Checked arithmetic overflowed.
    #[error("Math overflow")]
    MathOverflow,

    /// Emission schedule rejected at construction.
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Pool id out of range.
    #[error("Unknown pool: {0}")]
    UnknownPool(usize),

    /// A pool for this staking token already exists.
    #[error("Pool already exists for token {0}")]
    DuplicatePool(String),

    /// Caller is not the controller owner.
    #[error("Caller is not the owner")]
    Unauthorized,

    /// Configuration could not be loaded or is inconsistent.
    #[error("Config error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse error category, stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidAmount,
    LockStateConflict,
    LockNotExpired,
    InsufficientStake,
    BoostRefreshRejected,
    Token,
    Arithmetic,
    Farm,
    Config,
}

impl PpiError {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PpiError::InvalidAmount => ErrorKind::InvalidAmount,
            PpiError::LockStateConflict(_) => ErrorKind::LockStateConflict,
            PpiError::LockNotExpired => ErrorKind::LockNotExpired,
            PpiError::InsufficientStake { .. } => ErrorKind::InsufficientStake,
            PpiError::BoostRefreshRejected(_) => ErrorKind::BoostRefreshRejected,
            PpiError::InsufficientBalance { .. } | PpiError::InsufficientAllowance { .. } => {
                ErrorKind::Token
            }
            PpiError::MathOverflow => ErrorKind::Arithmetic,
            PpiError::UnknownPool(_) | PpiError::DuplicatePool(_) | PpiError::Unauthorized => {
                ErrorKind::Farm
            }
            PpiError::InvalidSchedule(_) | PpiError::Config(_) | PpiError::Serialization(_) => {
                ErrorKind::Config
            }
        }
    }
}

impl From<serde_json::Error> for PpiError {
    fn from(e: serde_json::Error) -> Self {
        PpiError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_groups_token_errors() {
        let balance = PpiError::InsufficientBalance {
            requested: 2,
            available: 1,
        };
        let allowance = PpiError::InsufficientAllowance {
            requested: 2,
            allowed: 1,
        };
        assert_eq!(balance.kind(), ErrorKind::Token);
        assert_eq!(allowance.kind(), ErrorKind::Token);
    }

    #[test]
    fn test_kick_rejection_message() {
        let err = PpiError::BoostRefreshRejected(KickRejection::WorkingSupplyUpToDate);
        assert_eq!(
            err.to_string(),
            "Boost refresh rejected: WorkingSupplyUpToDate"
        );
        assert_eq!(err.kind(), ErrorKind::BoostRefreshRejected);
    }

    #[test]
    fn test_serde_json_error_converts() {
        let err: PpiError = serde_json::from_str::<u64>("nope").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
