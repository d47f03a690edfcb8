// crates/ppi-farm/src/boost.rs
//
// vePPI boost of a staker's working supply.
//
//   working = amount * 33 / 100
//           + pool_total * lock_balance / total_lock * 67 / 100
//
// The second term is the staker's share of the pool in proportion to their
// share of all voting power. With no voting power anywhere only the base
// term applies. All divisions truncate.

use serde::{Deserialize, Serialize};

use ppi_core::math::{add, percent_of};
use ppi_core::{mul_div, Amount, PpiError};

pub const BASE_PERCENT: u8 = 33;
pub const BOOST_PERCENT: u8 = 67;

/// Split between the unconditional and the voting-power part of working supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostPolicy {
    base_percent: u8,
    boost_percent: u8,
}

impl Default for BoostPolicy {
    fn default() -> Self {
        Self {
            base_percent: BASE_PERCENT,
            boost_percent: BOOST_PERCENT,
        }
    }
}

impl BoostPolicy {
    pub fn base_percent(&self) -> u8 {
        self.base_percent
    }

    pub fn boost_percent(&self) -> u8 {
        self.boost_percent
    }

    /// Working supply with no voting power.
    pub fn base(&self, amount: Amount) -> Result<Amount, PpiError> {
        percent_of(amount, self.base_percent as u128)
    }

    /// Boosted working supply of a position.
    ///
    /// # Arguments
    /// * `amount` - the staker's raw stake after the call
    /// * `pool_total` - the pool's raw total after the call
    /// * `lock_balance` - the staker's current voting balance
    /// * `total_lock` - the aggregate voting supply now
    pub fn working_supply(
        &self,
        amount: Amount,
        pool_total: Amount,
        lock_balance: Amount,
        total_lock: Amount,
    ) -> Result<Amount, PpiError> {
        let base = self.base(amount)?;
        if total_lock == 0 {
            return Ok(base);
        }
        let share = mul_div(pool_total, lock_balance, total_lock)?;
        let boost = percent_of(share, self.boost_percent as u128)?;
        add(base, boost)
    }
}
