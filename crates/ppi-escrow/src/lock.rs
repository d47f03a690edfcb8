// crates/ppi-escrow/src/lock.rs
//
// Per-account lock and its lifecycle.
//
// Valid transitions:
//   NoLock -> Locked (create_lock)
//   Locked -> Locked (increase_unlock_time / increase_amount)
//   Locked -> Expired (time passes unlock_time)
//   Expired -> NoLock (withdraw)

use std::fmt;

use serde::{Deserialize, Serialize};

use ppi_core::{mul_div, Amount, Timestamp};

/// An account's escrowed amount and its week-aligned unlock time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    /// Locked token base units. Zero means no lock.
    pub amount: Amount,
    /// Unix time the lock opens, always a multiple of WEEK.
    pub unlock_time: Timestamp,
}

/// Lifecycle state of a lock at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockState {
    /// Never created or already withdrawn.
    NoLock,
    /// Holding tokens, unlock time still ahead.
    Locked,
    /// Unlock time reached; tokens wait for withdraw.
    Expired,
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockState::NoLock => write!(f, "NoLock"),
            LockState::Locked => write!(f, "Locked"),
            LockState::Expired => write!(f, "Expired"),
        }
    }
}

impl Lock {
    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }

    /// Lifecycle state at `now`.
    pub fn state(&self, now: Timestamp) -> LockState {
        if self.is_empty() {
            LockState::NoLock
        } else if now >= self.unlock_time {
            LockState::Expired
        } else {
            LockState::Locked
        }
    }

    /// Voting balance at `t`: `amount * (unlock_time - t) / max_time`,
    /// zero from `unlock_time` on.
    pub fn balance_at(&self, t: Timestamp, max_time: u64) -> Amount {
        if self.is_empty() || t >= self.unlock_time || max_time == 0 {
            return 0;
        }
        let remaining = (self.unlock_time - t) as Amount;
        // amount * remaining / max_time <= amount whenever remaining <= max_time
        mul_div(self.amount, remaining, max_time as Amount).unwrap_or(Amount::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppi_core::WEEK;

    const MAX_TIME: u64 = 4 * 52 * WEEK;

    #[test]
    fn test_state_transitions_with_time() {
        let lock = Lock {
            amount: 100,
            unlock_time: 10 * WEEK,
        };
        assert_eq!(lock.state(WEEK), LockState::Locked);
        assert_eq!(lock.state(10 * WEEK - 1), LockState::Locked);
        assert_eq!(lock.state(10 * WEEK), LockState::Expired);
        assert_eq!(Lock::default().state(WEEK), LockState::NoLock);
    }

    #[test]
    fn test_balance_decays_linearly() {
        let lock = Lock {
            amount: MAX_TIME as Amount * 10,
            unlock_time: MAX_TIME + WEEK,
        };
        assert_eq!(lock.balance_at(WEEK, MAX_TIME), MAX_TIME as Amount * 10);
        assert_eq!(lock.balance_at(WEEK + MAX_TIME / 2, MAX_TIME), MAX_TIME as Amount * 5);
        assert_eq!(lock.balance_at(MAX_TIME + WEEK, MAX_TIME), 0);
        assert_eq!(lock.balance_at(MAX_TIME + 2 * WEEK, MAX_TIME), 0);
    }

    #[test]
    fn test_balance_is_non_increasing() {
        let lock = Lock {
            amount: 1_000_000_000_000_000_000,
            unlock_time: 20 * WEEK,
        };
        let mut previous = lock.balance_at(0, MAX_TIME);
        for t in (0..=21 * WEEK).step_by(12_345) {
            let current = lock.balance_at(t, MAX_TIME);
            assert!(current <= previous);
            previous = current;
        }
        assert_eq!(lock.balance_at(20 * WEEK, MAX_TIME), 0);
    }
}
