// crates/ppi-escrow/src/escrow.rs
//
// Vote escrow: lock PPI for up to `max_time` in exchange for linearly
// decaying voting power (vePPI).
//
// Each mutating call validates everything first, then pulls or pushes the
// locked token, then advances the supply checkpoint and commits. A call that
// returns an error has changed nothing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ppi_core::{week_floor, Address, Amount, PpiError, Timestamp, VotingPower, WEEK, YEAR};
use ppi_economics::TokenLedger;

use crate::checkpoint::SupplyCheckpoints;
use crate::lock::{Lock, LockState};

/// Default maximum lock duration (4 years).
pub const DEFAULT_MAX_TIME: u64 = 4 * YEAR;

/// Token-style metadata of the escrow's voting balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for EscrowMetadata {
    fn default() -> Self {
        Self {
            name: "Vote-escrowed PPI".to_string(),
            symbol: "vePPI".to_string(),
            decimals: 18,
        }
    }
}

/// Locks, week buckets and aggregate supply checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteEscrow {
    /// Vault address holding all locked tokens.
    address: Address,
    /// The locked token.
    token: Address,
    metadata: EscrowMetadata,
    /// Maximum lock duration; a lock of exactly this length has balance == amount.
    max_time: u64,
    locks: BTreeMap<Address, Lock>,
    checkpoints: SupplyCheckpoints,
    /// Sum of amounts of all non-withdrawn locks (undecayed).
    locked_supply: Amount,
}

impl VoteEscrow {
    /// Create an escrow for `token` at `now`.
    ///
    /// # Errors
    /// `Config` if `max_time` is shorter than one week.
    pub fn new(
        address: Address,
        token: Address,
        max_time: u64,
        metadata: EscrowMetadata,
        now: Timestamp,
    ) -> Result<Self, PpiError> {
        if max_time < WEEK {
            return Err(PpiError::Config(format!(
                "max lock time {} must be at least one week",
                max_time
            )));
        }
        Ok(Self {
            address,
            token,
            metadata,
            max_time,
            locks: BTreeMap::new(),
            checkpoints: SupplyCheckpoints::new(now),
            locked_supply: 0,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn token(&self) -> &Address {
        &self.token
    }

    pub fn metadata(&self) -> &EscrowMetadata {
        &self.metadata
    }

    pub fn max_time(&self) -> u64 {
        self.max_time
    }

    /// Undecayed total of all non-withdrawn locks.
    pub fn locked_supply(&self) -> Amount {
        self.locked_supply
    }

    /// The account's current lock (empty if none).
    pub fn lock_of(&self, account: &Address) -> Lock {
        self.locks.get(account).copied().unwrap_or_default()
    }

    /// Lifecycle state of the account's lock at `now`.
    pub fn state_of(&self, account: &Address, now: Timestamp) -> LockState {
        self.lock_of(account).state(now)
    }

    /// Amount bucketed to unlock at `week`.
    pub fn unlock_schedule(&self, week: Timestamp) -> Amount {
        self.checkpoints.unlock_schedule(week)
    }

    /// Week the supply cursor last advanced to.
    pub fn last_checkpoint(&self) -> Timestamp {
        self.checkpoints.last_checkpoint()
    }

    /// Read-only view of the supply checkpoints.
    pub fn checkpoints(&self) -> &SupplyCheckpoints {
        &self.checkpoints
    }

    /// All accounts with a non-empty lock.
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &Lock)> {
        self.locks.iter().filter(|(_, lock)| !lock.is_empty())
    }

    fn latest_unlock(&self, now: Timestamp) -> Timestamp {
        now.saturating_add(self.max_time)
    }

    /// Lock `amount` until `unlock_time`, rounded down to a whole week.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount == 0`.
    /// - `LockStateConflict` if the caller already holds a lock (withdraw it
    ///   first), or if the rounded unlock time is not in the future or lies
    ///   beyond `now + max_time`.
    /// - token errors if the caller has not approved or does not hold `amount`.
    pub fn create_lock(
        &mut self,
        tokens: &mut TokenLedger,
        caller: &Address,
        amount: Amount,
        unlock_time: Timestamp,
        now: Timestamp,
    ) -> Result<Lock, PpiError> {
        if amount == 0 {
            return Err(PpiError::InvalidAmount);
        }
        if !self.lock_of(caller).is_empty() {
            return Err(PpiError::LockStateConflict(
                "lock already exists, withdraw it first".to_string(),
            ));
        }
        let unlock = week_floor(unlock_time);
        if unlock <= now {
            return Err(PpiError::LockStateConflict(format!(
                "unlock time {} (rounded from {}) must be in the future",
                unlock, unlock_time
            )));
        }
        if unlock > self.latest_unlock(now) {
            return Err(PpiError::LockStateConflict(format!(
                "unlock time {} exceeds the maximum lock duration",
                unlock
            )));
        }
        let locked_supply = self
            .locked_supply
            .checked_add(amount)
            .ok_or(PpiError::MathOverflow)?;
        self.checkpoints.check_add(amount, unlock, now)?;

        tokens.transfer_from(&self.token, &self.address, caller, &self.address, amount)?;

        self.checkpoints.advance_to(now);
        self.checkpoints.add_lock(amount, unlock);
        let lock = Lock {
            amount,
            unlock_time: unlock,
        };
        self.locks.insert(*caller, lock);
        self.locked_supply = locked_supply;

        tracing::info!("Lock created for {}: {} until {}", caller, amount, unlock);
        Ok(lock)
    }

    /// Push the caller's unlock time out to `new_unlock_time` (rounded down).
    ///
    /// # Errors
    /// `LockStateConflict` if the caller has no lock, the lock has expired,
    /// the rounded time does not increase the unlock time, or it lies beyond
    /// `now + max_time`.
    pub fn increase_unlock_time(
        &mut self,
        caller: &Address,
        new_unlock_time: Timestamp,
        now: Timestamp,
    ) -> Result<Lock, PpiError> {
        let lock = self.lock_of(caller);
        match lock.state(now) {
            LockState::NoLock => {
                return Err(PpiError::LockStateConflict("no existing lock".to_string()))
            }
            LockState::Expired => {
                return Err(PpiError::LockStateConflict(
                    "lock has expired, withdraw first".to_string(),
                ))
            }
            LockState::Locked => {}
        }
        let unlock = week_floor(new_unlock_time);
        if unlock <= lock.unlock_time {
            return Err(PpiError::LockStateConflict(format!(
                "unlock time can only increase: {} <= {}",
                unlock, lock.unlock_time
            )));
        }
        if unlock > self.latest_unlock(now) {
            return Err(PpiError::LockStateConflict(format!(
                "unlock time {} exceeds the maximum lock duration",
                unlock
            )));
        }
        self.checkpoints
            .check_extend(lock.amount, lock.unlock_time, unlock, now)?;

        self.checkpoints.advance_to(now);
        self.checkpoints
            .extend_lock(lock.amount, lock.unlock_time, unlock);
        let updated = Lock {
            amount: lock.amount,
            unlock_time: unlock,
        };
        self.locks.insert(*caller, updated);

        tracing::info!(
            "Lock of {} extended from {} to {}",
            caller,
            lock.unlock_time,
            unlock
        );
        Ok(updated)
    }

    /// Add `amount` to `account`'s lock, paid by `caller`. The unlock time
    /// does not change.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount == 0`.
    /// - `LockStateConflict` if `account` has no lock or it has expired.
    /// - token errors if `caller` cannot pay.
    pub fn increase_amount(
        &mut self,
        tokens: &mut TokenLedger,
        caller: &Address,
        account: &Address,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Lock, PpiError> {
        if amount == 0 {
            return Err(PpiError::InvalidAmount);
        }
        let lock = self.lock_of(account);
        match lock.state(now) {
            LockState::NoLock => {
                return Err(PpiError::LockStateConflict("no existing lock".to_string()))
            }
            LockState::Expired => {
                return Err(PpiError::LockStateConflict(
                    "lock has expired, withdraw first".to_string(),
                ))
            }
            LockState::Locked => {}
        }
        let new_amount = lock
            .amount
            .checked_add(amount)
            .ok_or(PpiError::MathOverflow)?;
        let locked_supply = self
            .locked_supply
            .checked_add(amount)
            .ok_or(PpiError::MathOverflow)?;
        self.checkpoints.check_add(amount, lock.unlock_time, now)?;

        tokens.transfer_from(&self.token, &self.address, caller, &self.address, amount)?;

        self.checkpoints.advance_to(now);
        self.checkpoints.add_lock(amount, lock.unlock_time);
        let updated = Lock {
            amount: new_amount,
            unlock_time: lock.unlock_time,
        };
        self.locks.insert(*account, updated);
        self.locked_supply = locked_supply;

        tracing::info!("Lock of {} increased by {} (paid by {})", account, amount, caller);
        Ok(updated)
    }

    /// Return an expired lock's tokens to the caller and clear the lock.
    ///
    /// The lock's week bucket is left as is; the checkpoint cursor consumed
    /// it when the unlock week was entered.
    ///
    /// # Errors
    /// `LockStateConflict` if the caller has no lock, `LockNotExpired` before
    /// the unlock time.
    pub fn withdraw(
        &mut self,
        tokens: &mut TokenLedger,
        caller: &Address,
        now: Timestamp,
    ) -> Result<Amount, PpiError> {
        let lock = self.lock_of(caller);
        match lock.state(now) {
            LockState::NoLock => {
                return Err(PpiError::LockStateConflict("no existing lock".to_string()))
            }
            LockState::Locked => return Err(PpiError::LockNotExpired),
            LockState::Expired => {}
        }

        tokens.transfer(&self.token, &self.address, caller, lock.amount)?;

        self.checkpoints.advance_to(now);
        self.locks.remove(caller);
        self.locked_supply -= lock.amount;

        tracing::info!("Lock of {} withdrawn: {}", caller, lock.amount);
        Ok(lock.amount)
    }

    /// Permissionless checkpoint: advance the supply cursor to the week of
    /// `now`. Returns the number of weeks advanced.
    pub fn checkpoint(&mut self, now: Timestamp) -> u64 {
        self.checkpoints.advance_to(now)
    }

    /// Voting balance of `account` at `t`, projected from its current lock.
    pub fn balance_of_at(&self, account: &Address, t: Timestamp) -> Amount {
        self.lock_of(account).balance_at(t, self.max_time)
    }

    /// Voting balance of `account` now.
    pub fn balance_of(&self, account: &Address, now: Timestamp) -> Amount {
        self.balance_of_at(account, now)
    }

    /// Aggregate voting supply at `t`.
    ///
    /// Advances the cursor to `min(t, now)`; past weeks come from the
    /// recorded history, future times are projected without persisting.
    pub fn total_supply_at(&mut self, t: Timestamp, now: Timestamp) -> Amount {
        self.checkpoints.advance_to(t.min(now));
        self.checkpoints.supply_at(t, self.max_time)
    }

    /// Aggregate voting supply now.
    pub fn total_supply(&mut self, now: Timestamp) -> Amount {
        self.total_supply_at(now, now)
    }

    /// Aggregate voting supply at the start of the week containing
    /// `week_timestamp`.
    pub fn history_supply(&mut self, week_timestamp: Timestamp, now: Timestamp) -> Amount {
        self.total_supply_at(week_floor(week_timestamp), now)
    }

    /// Aggregate supply at `t` from current state only, without advancing.
    pub fn supply_at_readonly(&self, t: Timestamp) -> Amount {
        self.checkpoints.supply_at(t, self.max_time)
    }
}

impl VotingPower for VoteEscrow {
    fn balance_of_at(&self, account: &Address, t: Timestamp) -> Amount {
        VoteEscrow::balance_of_at(self, account, t)
    }

    fn total_supply_at(&mut self, t: Timestamp, now: Timestamp) -> Amount {
        VoteEscrow::total_supply_at(self, t, now)
    }
}
