// crates/ppi-farm/src/pool.rs
//
// Pool and per-user staking records.
//
// A user's claim on a pool's rewards is `working_supply * acc_reward_per_share
// / 1e18 - reward_debt`. The debt is reset after every settlement so each
// increment of `acc_reward_per_share` is paid exactly once.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ppi_core::{mul_div, Address, Amount, PpiError, Timestamp, ACC_PRECISION};

/// Accounting state of one staking pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolInfo {
    /// Staked token.
    pub token: Address,
    /// Share of the emission relative to the controller's total alloc points.
    pub alloc_point: u64,
    /// Time up to which rewards have been accrued.
    pub last_reward_time: Timestamp,
    /// Pool reward per unit of working supply, scaled by 1e18.
    pub acc_reward_per_share: u128,
    /// Raw staked amount.
    pub total_supply: Amount,
    /// Sum of users' boosted working supply.
    pub working_supply: Amount,
}

/// One account's position in one pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub amount: Amount,
    pub working_supply: Amount,
    pub reward_debt: u128,
}

impl UserInfo {
    /// Reward owed at `acc_reward_per_share`.
    pub fn pending(&self, acc_reward_per_share: u128) -> Result<Amount, PpiError> {
        let accrued = mul_div(self.working_supply, acc_reward_per_share, ACC_PRECISION)?;
        Ok(accrued.saturating_sub(self.reward_debt))
    }
}

/// Debt of `working_supply` at `acc_reward_per_share`.
pub fn reward_debt(working_supply: Amount, acc_reward_per_share: u128) -> Result<u128, PpiError> {
    mul_div(working_supply, acc_reward_per_share, ACC_PRECISION)
}

/// A pool with its stakers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    pub info: PoolInfo,
    pub users: BTreeMap<Address, UserInfo>,
}

impl Pool {
    pub fn new(token: Address, alloc_point: u64, last_reward_time: Timestamp) -> Self {
        Self {
            info: PoolInfo {
                token,
                alloc_point,
                last_reward_time,
                acc_reward_per_share: 0,
                total_supply: 0,
                working_supply: 0,
            },
            users: BTreeMap::new(),
        }
    }

    /// The account's position (default if it never staked).
    pub fn user(&self, account: &Address) -> UserInfo {
        self.users.get(account).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_subtracts_debt() {
        let user = UserInfo {
            amount: 10,
            working_supply: 3_300_000,
            reward_debt: 1_000,
        };
        // 3.3M * 2e18 / 1e18 = 6.6M
        assert_eq!(user.pending(2 * ACC_PRECISION).unwrap(), 6_600_000 - 1_000);
    }

    #[test]
    fn test_debt_at_current_acc_leaves_nothing_pending() {
        let acc = 123_456_789_012_345_678_901u128;
        let working = 5_000_000_000_000_000_000_000u128;
        let user = UserInfo {
            amount: working,
            working_supply: working,
            reward_debt: reward_debt(working, acc).unwrap(),
        };
        assert_eq!(user.pending(acc).unwrap(), 0);
    }

    #[test]
    fn test_unknown_user_is_default() {
        let pool = Pool::new(Address::from_label("LP"), 100, 0);
        assert_eq!(pool.user(&Address::from_label("nobody")), UserInfo::default());
    }
}
