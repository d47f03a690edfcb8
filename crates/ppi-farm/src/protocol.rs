// crates/ppi-farm/src/protocol.rs
//
// Single-writer facade over the whole system.
//
// `Protocol` owns the token ledger, the vote escrow, the farm controller and
// the clock. Each method is one user call: it reads `now` once from the
// clock and passes it down, so every component sees the same time.

use serde::{Deserialize, Serialize};

use ppi_core::{Address, Amount, Clock, PpiError, Timestamp};
use ppi_economics::{EmissionSchedule, RewardSplitter, TokenLedger};
use ppi_escrow::{EscrowMetadata, Lock, VoteEscrow};

use crate::controller::{Accrual, FarmController, FarmParams, Settlement};
use crate::pool::{PoolInfo, UserInfo};

/// Addresses and parameters of a fresh deployment.
#[derive(Debug, Clone)]
pub struct Deployment {
    pub owner: Address,
    pub reward_token: Address,
    pub escrow_address: Address,
    pub farm_address: Address,
    pub max_time: u64,
    pub metadata: EscrowMetadata,
    pub schedule: EmissionSchedule,
    pub splitter: RewardSplitter,
    pub first_pool: Address,
    pub first_alloc_point: u64,
    pub start_time: Timestamp,
}

/// Serializable view of everything the protocol holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolState {
    pub now: Timestamp,
    pub tokens: TokenLedger,
    pub escrow: VoteEscrow,
    pub farm: FarmController,
}

pub struct Protocol<C: Clock> {
    clock: C,
    tokens: TokenLedger,
    escrow: VoteEscrow,
    farm: FarmController,
}

impl<C: Clock> Protocol<C> {
    /// Deploy escrow and farm at the clock's current time.
    ///
    /// # Errors
    /// `Config` if the escrow parameters are invalid.
    pub fn deploy(clock: C, deployment: Deployment) -> Result<Self, PpiError> {
        let now = clock.now();
        let escrow = VoteEscrow::new(
            deployment.escrow_address,
            deployment.reward_token,
            deployment.max_time,
            deployment.metadata,
            now,
        )?;
        let farm = FarmController::new(
            FarmParams {
                owner: deployment.owner,
                address: deployment.farm_address,
                reward_token: deployment.reward_token,
                schedule: deployment.schedule,
                splitter: deployment.splitter,
                first_pool: deployment.first_pool,
                first_alloc_point: deployment.first_alloc_point,
                start_time: deployment.start_time,
            },
            now,
        );
        Ok(Self::from_parts(clock, TokenLedger::new(), escrow, farm))
    }

    pub fn from_parts(clock: C, tokens: TokenLedger, escrow: VoteEscrow, farm: FarmController) -> Self {
        Self {
            clock,
            tokens,
            escrow,
            farm,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn tokens(&self) -> &TokenLedger {
        &self.tokens
    }

    pub fn escrow(&self) -> &VoteEscrow {
        &self.escrow
    }

    pub fn farm(&self) -> &FarmController {
        &self.farm
    }

    /// Snapshot of all state at the current time.
    pub fn state(&self) -> ProtocolState {
        ProtocolState {
            now: self.now(),
            tokens: self.tokens.clone(),
            escrow: self.escrow.clone(),
            farm: self.farm.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Tokens
    // -----------------------------------------------------------------------

    /// Faucet mint, for seeding balances in tests and replays.
    pub fn mint(&mut self, token: &Address, to: &Address, amount: Amount) {
        self.tokens.mint(token, to, amount);
    }

    pub fn approve(&mut self, caller: &Address, token: &Address, spender: &Address, amount: Amount) {
        self.tokens.approve(token, caller, spender, amount);
    }

    pub fn balance_of(&self, token: &Address, holder: &Address) -> Amount {
        self.tokens.balance_of(token, holder)
    }

    // -----------------------------------------------------------------------
    // Vote escrow
    // -----------------------------------------------------------------------

    pub fn create_lock(
        &mut self,
        caller: &Address,
        amount: Amount,
        unlock_time: Timestamp,
    ) -> Result<Lock, PpiError> {
        let now = self.clock.now();
        self.escrow
            .create_lock(&mut self.tokens, caller, amount, unlock_time, now)
    }

    pub fn increase_unlock_time(
        &mut self,
        caller: &Address,
        unlock_time: Timestamp,
    ) -> Result<Lock, PpiError> {
        let now = self.clock.now();
        self.escrow.increase_unlock_time(caller, unlock_time, now)
    }

    pub fn increase_amount(
        &mut self,
        caller: &Address,
        account: &Address,
        amount: Amount,
    ) -> Result<Lock, PpiError> {
        let now = self.clock.now();
        self.escrow
            .increase_amount(&mut self.tokens, caller, account, amount, now)
    }

    pub fn withdraw_lock(&mut self, caller: &Address) -> Result<Amount, PpiError> {
        let now = self.clock.now();
        self.escrow.withdraw(&mut self.tokens, caller, now)
    }

    pub fn vote_balance(&self, account: &Address) -> Amount {
        self.escrow.balance_of(account, self.clock.now())
    }

    pub fn vote_balance_at(&self, account: &Address, t: Timestamp) -> Amount {
        self.escrow.balance_of_at(account, t)
    }

    pub fn vote_supply(&mut self) -> Amount {
        let now = self.clock.now();
        self.escrow.total_supply(now)
    }

    pub fn vote_supply_at(&mut self, t: Timestamp) -> Amount {
        let now = self.clock.now();
        self.escrow.total_supply_at(t, now)
    }

    pub fn history_supply(&mut self, week: Timestamp) -> Amount {
        let now = self.clock.now();
        self.escrow.history_supply(week, now)
    }

    pub fn checkpoint(&mut self) -> u64 {
        let now = self.clock.now();
        self.escrow.checkpoint(now)
    }

    // -----------------------------------------------------------------------
    // Farm
    // -----------------------------------------------------------------------

    pub fn deposit(&mut self, caller: &Address, pid: usize, amount: Amount) -> Result<Settlement, PpiError> {
        let now = self.clock.now();
        self.farm
            .deposit(&mut self.tokens, &mut self.escrow, caller, pid, amount, now)
    }

    pub fn withdraw(&mut self, caller: &Address, pid: usize, amount: Amount) -> Result<Settlement, PpiError> {
        let now = self.clock.now();
        self.farm
            .withdraw(&mut self.tokens, &mut self.escrow, caller, pid, amount, now)
    }

    pub fn kick(&mut self, pid: usize, account: &Address) -> Result<Settlement, PpiError> {
        let now = self.clock.now();
        self.farm.kick(&mut self.tokens, &self.escrow, pid, account, now)
    }

    pub fn update_pool(&mut self, pid: usize) -> Result<Accrual, PpiError> {
        let now = self.clock.now();
        self.farm.update_pool(&mut self.tokens, pid, now)
    }

    pub fn mass_update_pools(&mut self) -> Result<Vec<Accrual>, PpiError> {
        let now = self.clock.now();
        self.farm.mass_update_pools(&mut self.tokens, now)
    }

    pub fn add_pool(
        &mut self,
        caller: &Address,
        alloc_point: u64,
        token: Address,
        start_time: Timestamp,
        with_update: bool,
    ) -> Result<usize, PpiError> {
        let now = self.clock.now();
        self.farm.add(
            &mut self.tokens,
            caller,
            alloc_point,
            token,
            start_time,
            with_update,
            now,
        )
    }

    pub fn set_pool(
        &mut self,
        caller: &Address,
        pid: usize,
        alloc_point: u64,
        with_update: bool,
    ) -> Result<(), PpiError> {
        let now = self.clock.now();
        self.farm
            .set(&mut self.tokens, caller, pid, alloc_point, with_update, now)
    }

    pub fn pending_reward(&self, pid: usize, account: &Address) -> Result<Amount, PpiError> {
        self.farm.pending_reward(pid, account, self.clock.now())
    }

    pub fn pool_info(&self, pid: usize) -> Result<&PoolInfo, PpiError> {
        self.farm.pool_info(pid)
    }

    pub fn user_info(&self, pid: usize, account: &Address) -> Result<UserInfo, PpiError> {
        self.farm.user_info(pid, account)
    }
}
