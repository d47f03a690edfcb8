// crates/ppi-core/src/traits.rs

use crate::types::{Address, Amount, Timestamp};

/// Source of the current time.
///
/// Read once at the start of every call; never cached across calls.
pub trait Clock: Send + Sync {
    /// Current unix time in seconds.
    fn now(&self) -> Timestamp;
}

/// Decaying voting power consumed by the farm's boost computation.
///
/// Implemented by ppi-escrow.
pub trait VotingPower {
    /// Voting balance of `account` at time `t`, projected from its current lock.
    fn balance_of_at(&self, account: &Address, t: Timestamp) -> Amount;

    /// Aggregate voting supply at time `t`.
    ///
    /// May advance the implementation's lazy checkpoint up to `min(t, now)`,
    /// which never changes the value of any query.
    fn total_supply_at(&mut self, t: Timestamp, now: Timestamp) -> Amount;
}
