// crates/ppi-economics/src/rewards.rs
//
// Reward splitting for newly emitted PPI.
//
// Each pool's emission is divided by fixed percentages:
//   1. POOL share (50%) accrues to the pool's stakers via reward-per-share.
//   2. The remaining half goes to the protocol sinks:
//      treasury (30%), market (10%), dev (10%) of the total.
// Integer truncation dust is credited to the treasury so the four parts
// always add back up to the input exactly.

use serde::{Deserialize, Serialize};

use ppi_core::math::percent_of;
use ppi_core::{Address, Amount, PpiError};

/// Share of every emission that stays with the pool's stakers.
pub const POOL_PERCENT: u8 = 50;
pub const TREASURY_PERCENT: u8 = 30;
pub const MARKET_PERCENT: u8 = 10;
pub const DEV_PERCENT: u8 = 10;

/// Recipients of the non-pool part of every emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkAddresses {
    pub treasury: Address,
    pub market: Address,
    pub dev: Address,
}

/// Fixed-percentage splitter. Percentages always sum to 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSplitter {
    pool_percent: u8,
    treasury_percent: u8,
    market_percent: u8,
    dev_percent: u8,
    sinks: SinkAddresses,
}

/// The result of splitting one emission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSplit {
    /// Credited to the pool's reward-per-share.
    pub pool: Amount,
    pub treasury: Amount,
    pub market: Amount,
    pub dev: Amount,
}

impl RewardSplit {
    /// Total handed to the sinks.
    pub fn sinks_total(&self) -> Amount {
        self.treasury + self.market + self.dev
    }
}

impl RewardSplitter {
    /// Create a splitter with custom percentages.
    ///
    /// # Errors
    /// `Config` if the percentages do not sum to 100.
    pub fn new(
        pool_percent: u8,
        treasury_percent: u8,
        market_percent: u8,
        dev_percent: u8,
        sinks: SinkAddresses,
    ) -> Result<Self, PpiError> {
        let sum = pool_percent as u32
            + treasury_percent as u32
            + market_percent as u32
            + dev_percent as u32;
        if sum != 100 {
            return Err(PpiError::Config(format!(
                "reward split must sum to 100, got {}",
                sum
            )));
        }
        Ok(Self {
            pool_percent,
            treasury_percent,
            market_percent,
            dev_percent,
            sinks,
        })
    }

    /// The protocol's standard 50 / 30 / 10 / 10 split.
    pub fn standard(sinks: SinkAddresses) -> Self {
        Self {
            pool_percent: POOL_PERCENT,
            treasury_percent: TREASURY_PERCENT,
            market_percent: MARKET_PERCENT,
            dev_percent: DEV_PERCENT,
            sinks,
        }
    }

    pub fn sinks(&self) -> &SinkAddresses {
        &self.sinks
    }

    /// `[pool, treasury, market, dev]` percentages.
    pub fn percentages(&self) -> [u8; 4] {
        [
            self.pool_percent,
            self.treasury_percent,
            self.market_percent,
            self.dev_percent,
        ]
    }

    /// Split `reward` into its pool and sink parts.
    pub fn split(&self, reward: Amount) -> Result<RewardSplit, PpiError> {
        let pool = percent_of(reward, self.pool_percent as u128)?;
        let market = percent_of(reward, self.market_percent as u128)?;
        let dev = percent_of(reward, self.dev_percent as u128)?;
        // Treasury takes its share plus whatever truncation left over.
        let treasury = reward - pool - market - dev;

        Ok(RewardSplit {
            pool,
            treasury,
            market,
            dev,
        })
    }
}
