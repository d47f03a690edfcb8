// crates/ppi-farm/src/controller.rs
//
// Farm controller: staking pools, reward-per-share accrual and vePPI boost.
//
// Every accrual-triggering call runs in three phases:
//   1. compute the pool's accrual and the caller's new position with checked
//      arithmetic, touching nothing;
//   2. move the staked token (the only fallible external step);
//   3. mint the emission split, pay the pending reward and write the pool
//      and user records.
// A call that fails in phase 1 or 2 leaves the farm and the ledger as they
// were.

use serde::{Deserialize, Serialize};

use ppi_core::math::{add, sub};
use ppi_core::{
    mul_div, Address, Amount, KickRejection, PpiError, Timestamp, VotingPower, ACC_PRECISION,
};
use ppi_economics::{EmissionSchedule, RewardSplit, RewardSplitter, TokenLedger};

use crate::boost::BoostPolicy;
use crate::pool::{reward_debt, Pool, PoolInfo, UserInfo};

/// Everything needed to stand up a controller and its first pool.
#[derive(Debug, Clone)]
pub struct FarmParams {
    /// May add pools and change allocations.
    pub owner: Address,
    /// Vault holding staked tokens and undistributed pool rewards.
    pub address: Address,
    /// Token minted as emission.
    pub reward_token: Address,
    pub schedule: EmissionSchedule,
    pub splitter: RewardSplitter,
    pub first_pool: Address,
    pub first_alloc_point: u64,
    pub start_time: Timestamp,
}

/// A pool's accrual up to some time, computed but not yet written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accrual {
    pub pool: usize,
    pub last_reward_time: Timestamp,
    pub acc_reward_per_share: u128,
    /// Emission to mint for this accrual.
    pub split: RewardSplit,
}

/// Result of a deposit, withdraw or kick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub pool: usize,
    pub account: Address,
    /// Reward actually transferred to the account.
    pub harvested: Amount,
    /// The account's position after the call.
    pub user: UserInfo,
}

/// New figures for one position, validated and ready to commit.
struct Plan {
    accrual: Accrual,
    account: Address,
    pending: Amount,
    user: UserInfo,
    pool_total: Amount,
    pool_working: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmController {
    owner: Address,
    address: Address,
    reward_token: Address,
    schedule: EmissionSchedule,
    splitter: RewardSplitter,
    boost: BoostPolicy,
    pools: Vec<Pool>,
    total_alloc_point: u64,
}

impl FarmController {
    /// Create the controller with its first pool, accruing from
    /// `max(start_time, now)`.
    pub fn new(params: FarmParams, now: Timestamp) -> Self {
        let first = Pool::new(
            params.first_pool,
            params.first_alloc_point,
            params.start_time.max(now),
        );
        tracing::info!(
            "Farm controller {} created, first pool {} (alloc {})",
            params.address,
            params.first_pool,
            params.first_alloc_point
        );
        Self {
            owner: params.owner,
            address: params.address,
            reward_token: params.reward_token,
            schedule: params.schedule,
            splitter: params.splitter,
            boost: BoostPolicy::default(),
            pools: vec![first],
            total_alloc_point: params.first_alloc_point,
        }
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn reward_token(&self) -> &Address {
        &self.reward_token
    }

    pub fn schedule(&self) -> &EmissionSchedule {
        &self.schedule
    }

    pub fn splitter(&self) -> &RewardSplitter {
        &self.splitter
    }

    pub fn boost(&self) -> &BoostPolicy {
        &self.boost
    }

    pub fn pool_length(&self) -> usize {
        self.pools.len()
    }

    pub fn total_alloc_point(&self) -> u64 {
        self.total_alloc_point
    }

    fn pool(&self, pid: usize) -> Result<&Pool, PpiError> {
        self.pools.get(pid).ok_or(PpiError::UnknownPool(pid))
    }

    pub fn pool_info(&self, pid: usize) -> Result<&PoolInfo, PpiError> {
        Ok(&self.pool(pid)?.info)
    }

    pub fn user_info(&self, pid: usize, account: &Address) -> Result<UserInfo, PpiError> {
        Ok(self.pool(pid)?.user(account))
    }

    /// All pools in id order.
    pub fn pools(&self) -> impl Iterator<Item = (usize, &PoolInfo)> {
        self.pools.iter().map(|pool| &pool.info).enumerate()
    }

    /// Stakers of a pool with their positions.
    pub fn users(&self, pid: usize) -> Result<impl Iterator<Item = (&Address, &UserInfo)>, PpiError> {
        Ok(self.pool(pid)?.users.iter())
    }

    /// Reward the account could harvest at `now`, without changing anything.
    pub fn pending_reward(
        &self,
        pid: usize,
        account: &Address,
        now: Timestamp,
    ) -> Result<Amount, PpiError> {
        let accrual = self.accrue(pid, now)?;
        self.pool(pid)?.user(account).pending(accrual.acc_reward_per_share)
    }

    // -----------------------------------------------------------------------
    // Accrual
    // -----------------------------------------------------------------------

    /// Compute the pool's accrual up to `now`.
    ///
    /// Nothing accrues while the pool has no working supply or no pool has
    /// any allocation; `last_reward_time` stays put so the emission is picked
    /// up once both are back.
    pub fn accrue(&self, pid: usize, now: Timestamp) -> Result<Accrual, PpiError> {
        let info = &self.pool(pid)?.info;
        let unchanged = Accrual {
            pool: pid,
            last_reward_time: info.last_reward_time,
            acc_reward_per_share: info.acc_reward_per_share,
            split: RewardSplit::default(),
        };
        if now <= info.last_reward_time || info.working_supply == 0 || self.total_alloc_point == 0 {
            return Ok(unchanged);
        }

        let emitted = self.schedule.calculate_reward(info.last_reward_time, now);
        let reward = mul_div(
            emitted,
            info.alloc_point as u128,
            self.total_alloc_point as u128,
        )?;
        let split = self.splitter.split(reward)?;
        let increment = mul_div(split.pool, ACC_PRECISION, info.working_supply)?;

        Ok(Accrual {
            pool: pid,
            last_reward_time: now,
            acc_reward_per_share: add(info.acc_reward_per_share, increment)?,
            split,
        })
    }

    fn apply_accrual(&mut self, tokens: &mut TokenLedger, accrual: &Accrual) {
        let sinks = *self.splitter.sinks();
        tokens.mint(&self.reward_token, &self.address, accrual.split.pool);
        tokens.mint(&self.reward_token, &sinks.treasury, accrual.split.treasury);
        tokens.mint(&self.reward_token, &sinks.market, accrual.split.market);
        tokens.mint(&self.reward_token, &sinks.dev, accrual.split.dev);

        if let Some(pool) = self.pools.get_mut(accrual.pool) {
            if accrual.last_reward_time > pool.info.last_reward_time {
                tracing::debug!(
                    "Pool {} accrued {} for stakers over {}s (acc {})",
                    accrual.pool,
                    accrual.split.pool,
                    accrual.last_reward_time - pool.info.last_reward_time,
                    accrual.acc_reward_per_share
                );
            }
            pool.info.last_reward_time = accrual.last_reward_time;
            pool.info.acc_reward_per_share = accrual.acc_reward_per_share;
        }
    }

    /// Accrue one pool up to `now`.
    pub fn update_pool(
        &mut self,
        tokens: &mut TokenLedger,
        pid: usize,
        now: Timestamp,
    ) -> Result<Accrual, PpiError> {
        let accrual = self.accrue(pid, now)?;
        self.apply_accrual(tokens, &accrual);
        Ok(accrual)
    }

    /// Accrue every pool up to `now`. Either all pools accrue or none does.
    pub fn mass_update_pools(
        &mut self,
        tokens: &mut TokenLedger,
        now: Timestamp,
    ) -> Result<Vec<Accrual>, PpiError> {
        let accruals = (0..self.pools.len())
            .map(|pid| self.accrue(pid, now))
            .collect::<Result<Vec<_>, _>>()?;
        for accrual in &accruals {
            self.apply_accrual(tokens, accrual);
        }
        Ok(accruals)
    }

    // -----------------------------------------------------------------------
    // Pool administration
    // -----------------------------------------------------------------------

    /// Register a new pool for `token`. Owner only.
    ///
    /// # Errors
    /// `Unauthorized` for any caller but the owner, `DuplicatePool` if the
    /// token already has a pool.
    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &mut self,
        tokens: &mut TokenLedger,
        caller: &Address,
        alloc_point: u64,
        token: Address,
        start_time: Timestamp,
        with_update: bool,
        now: Timestamp,
    ) -> Result<usize, PpiError> {
        if *caller != self.owner {
            return Err(PpiError::Unauthorized);
        }
        if self.pools.iter().any(|pool| pool.info.token == token) {
            return Err(PpiError::DuplicatePool(token.to_string()));
        }
        let total = self
            .total_alloc_point
            .checked_add(alloc_point)
            .ok_or(PpiError::MathOverflow)?;
        if with_update {
            self.mass_update_pools(tokens, now)?;
        }

        self.pools
            .push(Pool::new(token, alloc_point, start_time.max(now)));
        self.total_alloc_point = total;
        let pid = self.pools.len() - 1;
        tracing::info!("Pool {} added for {} (alloc {})", pid, token, alloc_point);
        Ok(pid)
    }

    /// Change a pool's allocation. Owner only.
    pub fn set(
        &mut self,
        tokens: &mut TokenLedger,
        caller: &Address,
        pid: usize,
        alloc_point: u64,
        with_update: bool,
        now: Timestamp,
    ) -> Result<(), PpiError> {
        if *caller != self.owner {
            return Err(PpiError::Unauthorized);
        }
        let previous = self.pool(pid)?.info.alloc_point;
        let total = (self.total_alloc_point - previous)
            .checked_add(alloc_point)
            .ok_or(PpiError::MathOverflow)?;
        if with_update {
            self.mass_update_pools(tokens, now)?;
        }

        if let Some(pool) = self.pools.get_mut(pid) {
            pool.info.alloc_point = alloc_point;
        }
        self.total_alloc_point = total;
        tracing::info!("Pool {} alloc {} -> {}", pid, previous, alloc_point);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Staking
    // -----------------------------------------------------------------------

    fn boosted<V: VotingPower>(
        &self,
        escrow: &mut V,
        account: &Address,
        amount: Amount,
        pool_total: Amount,
        now: Timestamp,
    ) -> Result<Amount, PpiError> {
        let lock_balance = escrow.balance_of_at(account, now);
        let total_lock = escrow.total_supply_at(now, now);
        self.boost
            .working_supply(amount, pool_total, lock_balance, total_lock)
    }

    fn plan(
        &self,
        accrual: Accrual,
        account: &Address,
        amount: Amount,
        pool_total: Amount,
        working: Amount,
    ) -> Result<Plan, PpiError> {
        let pool = self.pool(accrual.pool)?;
        let current = pool.user(account);
        let pending = current.pending(accrual.acc_reward_per_share)?;
        let pool_working = add(sub(pool.info.working_supply, current.working_supply)?, working)?;
        let user = UserInfo {
            amount,
            working_supply: working,
            reward_debt: reward_debt(working, accrual.acc_reward_per_share)?,
        };
        Ok(Plan {
            accrual,
            account: *account,
            pending,
            user,
            pool_total,
            pool_working,
        })
    }

    /// Pay up to `pending` from the vault; a short vault pays what it holds.
    fn pay_reward(
        &self,
        tokens: &mut TokenLedger,
        to: &Address,
        pending: Amount,
    ) -> Result<Amount, PpiError> {
        let available = tokens.balance_of(&self.reward_token, &self.address);
        let paid = pending.min(available);
        if paid < pending {
            tracing::warn!(
                "Vault short on rewards: paying {} of {} to {}",
                paid,
                pending,
                to
            );
        }
        tokens.transfer(&self.reward_token, &self.address, to, paid)?;
        Ok(paid)
    }

    fn commit(&mut self, tokens: &mut TokenLedger, plan: Plan) -> Result<Settlement, PpiError> {
        let pid = plan.accrual.pool;
        self.apply_accrual(tokens, &plan.accrual);
        let harvested = self.pay_reward(tokens, &plan.account, plan.pending)?;

        if let Some(pool) = self.pools.get_mut(pid) {
            pool.info.total_supply = plan.pool_total;
            pool.info.working_supply = plan.pool_working;
            if plan.user == UserInfo::default() {
                pool.users.remove(&plan.account);
            } else {
                pool.users.insert(plan.account, plan.user);
            }
        }
        Ok(Settlement {
            pool: pid,
            account: plan.account,
            harvested,
            user: plan.user,
        })
    }

    /// Stake `amount` of the pool's token, harvesting pending rewards and
    /// refreshing the boost. `amount == 0` only harvests and refreshes.
    ///
    /// # Errors
    /// `UnknownPool`, token errors if the caller cannot pay, `MathOverflow`.
    pub fn deposit<V: VotingPower>(
        &mut self,
        tokens: &mut TokenLedger,
        escrow: &mut V,
        caller: &Address,
        pid: usize,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Settlement, PpiError> {
        let accrual = self.accrue(pid, now)?;
        let pool = self.pool(pid)?;
        let token = pool.info.token;
        let new_amount = add(pool.user(caller).amount, amount)?;
        let pool_total = add(pool.info.total_supply, amount)?;
        if amount > 0 {
            tokens.ensure_transfer_from(&token, &self.address, caller, amount)?;
        }
        let working = self.boosted(escrow, caller, new_amount, pool_total, now)?;
        let plan = self.plan(accrual, caller, new_amount, pool_total, working)?;

        if amount > 0 {
            tokens.transfer_from(&token, &self.address, caller, &self.address, amount)?;
        }
        let settlement = self.commit(tokens, plan)?;

        tracing::info!(
            "Deposit of {} into pool {} by {} (working {}, harvested {})",
            amount,
            pid,
            caller,
            settlement.user.working_supply,
            settlement.harvested
        );
        Ok(settlement)
    }

    /// Unstake `amount`, harvesting pending rewards and refreshing the boost.
    ///
    /// # Errors
    /// `InsufficientStake` if `amount` exceeds the caller's stake.
    pub fn withdraw<V: VotingPower>(
        &mut self,
        tokens: &mut TokenLedger,
        escrow: &mut V,
        caller: &Address,
        pid: usize,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Settlement, PpiError> {
        let accrual = self.accrue(pid, now)?;
        let pool = self.pool(pid)?;
        let token = pool.info.token;
        let user = pool.user(caller);
        if amount > user.amount {
            return Err(PpiError::InsufficientStake {
                requested: amount,
                available: user.amount,
            });
        }
        let new_amount = user.amount - amount;
        let pool_total = sub(pool.info.total_supply, amount)?;
        tokens.ensure_balance(&token, &self.address, amount)?;
        let working = self.boosted(escrow, caller, new_amount, pool_total, now)?;
        let plan = self.plan(accrual, caller, new_amount, pool_total, working)?;

        if amount > 0 {
            tokens.transfer(&token, &self.address, caller, amount)?;
        }
        let settlement = self.commit(tokens, plan)?;

        tracing::info!(
            "Withdrawal of {} from pool {} by {} (working {}, harvested {})",
            amount,
            pid,
            caller,
            settlement.user.working_supply,
            settlement.harvested
        );
        Ok(settlement)
    }

    /// Drop a stale boost back to the base working supply once the
    /// account's voting power has fully decayed. Anyone may call this.
    ///
    /// # Errors
    /// `BoostRefreshRejected(UserLockedBalanceNonZero)` while the account
    /// still has voting power, `BoostRefreshRejected(WorkingSupplyUpToDate)`
    /// if there is nothing to refresh.
    pub fn kick<V: VotingPower>(
        &mut self,
        tokens: &mut TokenLedger,
        escrow: &V,
        pid: usize,
        account: &Address,
        now: Timestamp,
    ) -> Result<Settlement, PpiError> {
        let pool = self.pool(pid)?;
        if escrow.balance_of_at(account, now) > 0 {
            return Err(PpiError::BoostRefreshRejected(
                KickRejection::UserLockedBalanceNonZero,
            ));
        }
        let user = pool.user(account);
        let pool_total = pool.info.total_supply;
        let base = self.boost.base(user.amount)?;
        if user.working_supply == base {
            return Err(PpiError::BoostRefreshRejected(
                KickRejection::WorkingSupplyUpToDate,
            ));
        }
        let accrual = self.accrue(pid, now)?;
        let plan = self.plan(accrual, account, user.amount, pool_total, base)?;
        let settlement = self.commit(tokens, plan)?;

        tracing::info!(
            "Kicked {} in pool {}: working {} -> {}",
            account,
            pid,
            user.working_supply,
            base
        );
        Ok(settlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppi_core::{week_floor, Clock, ManualClock, WEEK};
    use ppi_economics::{RateEntry, SinkAddresses, UNIT};
    use ppi_escrow::{EscrowMetadata, VoteEscrow, DEFAULT_MAX_TIME};

    const START: Timestamp = 1_700_000_000;
    const RATE: Amount = 10 * UNIT;

    struct Fixture {
        farm: FarmController,
        escrow: VoteEscrow,
        tokens: TokenLedger,
        clock: ManualClock,
    }

    fn ppi() -> Address {
        Address::from_label("PPI")
    }

    fn lp() -> Address {
        Address::from_label("LP")
    }

    fn owner() -> Address {
        Address::from_label("owner")
    }

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn bob() -> Address {
        Address::from_label("bob")
    }

    fn sinks() -> SinkAddresses {
        SinkAddresses {
            treasury: Address::from_low_u64(2),
            market: Address::from_low_u64(3),
            dev: Address::from_low_u64(4),
        }
    }

    fn fixture() -> Fixture {
        let clock = ManualClock::new(START - 1_000);
        let schedule = EmissionSchedule::new(vec![
            RateEntry {
                start_time: START,
                rate_per_second: RATE,
            },
            RateEntry {
                start_time: START + 100 * WEEK,
                rate_per_second: 0,
            },
        ])
        .unwrap();
        let farm_address = Address::from_label("FarmController");
        let farm = FarmController::new(
            FarmParams {
                owner: owner(),
                address: farm_address,
                reward_token: ppi(),
                schedule,
                splitter: RewardSplitter::standard(sinks()),
                first_pool: lp(),
                first_alloc_point: 1_000,
                start_time: START,
            },
            clock.now(),
        );
        let escrow_address = Address::from_label("VotingEscrow");
        let escrow = VoteEscrow::new(
            escrow_address,
            ppi(),
            DEFAULT_MAX_TIME,
            EscrowMetadata::default(),
            clock.now(),
        )
        .unwrap();
        let mut tokens = TokenLedger::new();
        for user in [alice(), bob()] {
            tokens.mint(&lp(), &user, 100_000_000);
            tokens.approve(&lp(), &user, &farm_address, Amount::MAX);
            tokens.mint(&ppi(), &user, 1_000 * UNIT);
            tokens.approve(&ppi(), &user, &escrow_address, Amount::MAX);
        }
        Fixture {
            farm,
            escrow,
            tokens,
            clock,
        }
    }

    #[test]
    fn test_first_pool_registered() {
        let f = fixture();
        assert_eq!(f.farm.pool_length(), 1);
        assert_eq!(f.farm.total_alloc_point(), 1_000);
        let info = f.farm.pool_info(0).unwrap();
        assert_eq!(info.token, lp());
        assert_eq!(info.last_reward_time, START);
        assert!(matches!(f.farm.pool_info(1), Err(PpiError::UnknownPool(1))));
    }

    #[test]
    fn test_deposit_base_working_supply() {
        let mut f = fixture();
        let now = f.clock.now();
        let s = f
            .farm
            .deposit(&mut f.tokens, &mut f.escrow, &alice(), 0, 10_000_000, now)
            .unwrap();
        assert_eq!(s.user.amount, 10_000_000);
        assert_eq!(s.user.working_supply, 3_300_000);
        assert_eq!(s.harvested, 0);
        let info = f.farm.pool_info(0).unwrap();
        assert_eq!(info.total_supply, 10_000_000);
        assert_eq!(info.working_supply, 3_300_000);
        assert_eq!(f.tokens.balance_of(&lp(), f.farm.address()), 10_000_000);
    }

    #[test]
    fn test_accrual_and_split() {
        let mut f = fixture();
        let now = f.clock.now();
        f.farm
            .deposit(&mut f.tokens, &mut f.escrow, &alice(), 0, 10_000_000, now)
            .unwrap();
        f.clock.set(START + 100);
        let accrual = f.farm.update_pool(&mut f.tokens, 0, f.clock.now()).unwrap();

        let reward = 100 * RATE;
        assert_eq!(accrual.split.pool, reward / 2);
        assert_eq!(
            accrual.acc_reward_per_share,
            mul_div(reward / 2, ACC_PRECISION, 3_300_000).unwrap()
        );
        assert_eq!(f.tokens.balance_of(&ppi(), &sinks().treasury), reward * 30 / 100);
        assert_eq!(f.tokens.balance_of(&ppi(), &sinks().market), reward / 10);
        assert_eq!(f.tokens.balance_of(&ppi(), &sinks().dev), reward / 10);
        assert_eq!(f.tokens.balance_of(&ppi(), f.farm.address()), reward / 2);
    }

    #[test]
    fn test_no_accrual_without_working_supply() {
        let mut f = fixture();
        f.clock.set(START + 500);
        let accrual = f.farm.update_pool(&mut f.tokens, 0, f.clock.now()).unwrap();
        assert_eq!(accrual.last_reward_time, START);
        assert_eq!(f.farm.pool_info(0).unwrap().last_reward_time, START);
        assert_eq!(f.tokens.total_supply(&ppi()), 2_000 * UNIT);

        // the first staker picks up the emission since START
        let now = f.clock.now();
        f.farm
            .deposit(&mut f.tokens, &mut f.escrow, &alice(), 0, 1_000, now)
            .unwrap();
        f.clock.set(START + 600);
        let pending = f.farm.pending_reward(0, &alice(), f.clock.now()).unwrap();
        // 600s of emission, half to the pool, one truncation each way
        assert!(300 * RATE - pending <= 1);
    }

    #[test]
    fn test_pending_matches_zero_deposit_harvest() {
        let mut f = fixture();
        let now = f.clock.now();
        f.farm
            .deposit(&mut f.tokens, &mut f.escrow, &alice(), 0, 7_000_000, now)
            .unwrap();
        f.farm
            .deposit(&mut f.tokens, &mut f.escrow, &bob(), 0, 3_000_000, now)
            .unwrap();
        f.clock.set(START + 12_345);
        let now = f.clock.now();
        let pending = f.farm.pending_reward(0, &alice(), now).unwrap();
        let before = f.tokens.balance_of(&ppi(), &alice());
        let s = f
            .farm
            .deposit(&mut f.tokens, &mut f.escrow, &alice(), 0, 0, now)
            .unwrap();
        assert_eq!(s.harvested, pending);
        assert_eq!(f.tokens.balance_of(&ppi(), &alice()) - before, pending);
        assert_eq!(f.farm.pending_reward(0, &alice(), now).unwrap(), 0);
    }

    #[test]
    fn test_zero_deposit_is_idempotent_within_a_second() {
        let mut f = fixture();
        f.clock.set(START + 10);
        let now = f.clock.now();
        f.farm
            .deposit(&mut f.tokens, &mut f.escrow, &alice(), 0, 5_000_000, now)
            .unwrap();
        let first = f
            .farm
            .deposit(&mut f.tokens, &mut f.escrow, &alice(), 0, 0, now)
            .unwrap();
        let second = f
            .farm
            .deposit(&mut f.tokens, &mut f.escrow, &alice(), 0, 0, now)
            .unwrap();
        assert_eq!(second.harvested, 0);
        assert_eq!(first.user, second.user);
    }

    #[test]
    fn test_withdraw_more_than_staked_rejected() {
        let mut f = fixture();
        let now = f.clock.now();
        f.farm
            .deposit(&mut f.tokens, &mut f.escrow, &alice(), 0, 1_000, now)
            .unwrap();
        let before = f.farm.pool_info(0).unwrap().clone();
        let result = f
            .farm
            .withdraw(&mut f.tokens, &mut f.escrow, &alice(), 0, 1_001, now);
        assert_eq!(
            result,
            Err(PpiError::InsufficientStake {
                requested: 1_001,
                available: 1_000
            })
        );
        assert_eq!(*f.farm.pool_info(0).unwrap(), before);
    }

    #[test]
    fn test_full_withdraw_clears_position() {
        let mut f = fixture();
        let now = f.clock.now();
        f.farm
            .deposit(&mut f.tokens, &mut f.escrow, &alice(), 0, 1_000, now)
            .unwrap();
        f.clock.set(START + 50);
        let now = f.clock.now();
        let s = f
            .farm
            .withdraw(&mut f.tokens, &mut f.escrow, &alice(), 0, 1_000, now)
            .unwrap();
        assert_eq!(s.user, UserInfo::default());
        assert!(s.harvested > 0);
        assert_eq!(f.farm.users(0).unwrap().count(), 0);
        assert_eq!(f.farm.pool_info(0).unwrap().working_supply, 0);
        assert_eq!(f.tokens.balance_of(&lp(), &alice()), 100_000_000);
    }

    #[test]
    fn test_lock_boosts_working_supply() {
        let mut f = fixture();
        let now = f.clock.now();
        f.escrow
            .create_lock(&mut f.tokens, &alice(), 100 * UNIT, now + 100 * WEEK, now)
            .unwrap();
        let s = f
            .farm
            .deposit(&mut f.tokens, &mut f.escrow, &alice(), 0, 1_000_000, now)
            .unwrap();
        // sole locker: 33% + 67% of the whole pool
        assert_eq!(s.user.working_supply, 1_000_000);

        let b = f
            .farm
            .deposit(&mut f.tokens, &mut f.escrow, &bob(), 0, 1_000_000, now)
            .unwrap();
        assert_eq!(b.user.working_supply, 330_000);
    }

    #[test]
    fn test_kick_rejections_and_refresh() {
        let mut f = fixture();
        let now = f.clock.now();
        let lock = f
            .escrow
            .create_lock(&mut f.tokens, &alice(), 100 * UNIT, now + 3 * WEEK, now)
            .unwrap();
        f.farm
            .deposit(&mut f.tokens, &mut f.escrow, &alice(), 0, 1_000_000, now)
            .unwrap();
        f.farm
            .deposit(&mut f.tokens, &mut f.escrow, &bob(), 0, 1_000_000, now)
            .unwrap();

        assert_eq!(
            f.farm.kick(&mut f.tokens, &f.escrow, 0, &alice(), now),
            Err(PpiError::BoostRefreshRejected(
                KickRejection::UserLockedBalanceNonZero
            ))
        );
        assert_eq!(
            f.farm.kick(&mut f.tokens, &f.escrow, 0, &bob(), now),
            Err(PpiError::BoostRefreshRejected(
                KickRejection::WorkingSupplyUpToDate
            ))
        );

        f.clock.set(lock.unlock_time);
        let now = f.clock.now();
        let pending = f.farm.pending_reward(0, &alice(), now).unwrap();
        let s = f.farm.kick(&mut f.tokens, &f.escrow, 0, &alice(), now).unwrap();
        assert_eq!(s.user.working_supply, 330_000);
        assert_eq!(s.harvested, pending);
        assert_eq!(f.farm.pool_info(0).unwrap().working_supply, 660_000);

        // second kick is a no-op rejection
        assert_eq!(
            f.farm.kick(&mut f.tokens, &f.escrow, 0, &alice(), now),
            Err(PpiError::BoostRefreshRejected(
                KickRejection::WorkingSupplyUpToDate
            ))
        );
    }

    #[test]
    fn test_add_and_set_pools() {
        let mut f = fixture();
        let now = f.clock.now();
        let other = Address::from_label("LP2");
        assert_eq!(
            f.farm.add(&mut f.tokens, &alice(), 500, other, START, true, now),
            Err(PpiError::Unauthorized)
        );
        assert!(matches!(
            f.farm.add(&mut f.tokens, &owner(), 500, lp(), START, true, now),
            Err(PpiError::DuplicatePool(_))
        ));
        let pid = f
            .farm
            .add(&mut f.tokens, &owner(), 500, other, START, true, now)
            .unwrap();
        assert_eq!(pid, 1);
        assert_eq!(f.farm.pool_length(), 2);
        assert_eq!(f.farm.total_alloc_point(), 1_500);

        f.farm
            .set(&mut f.tokens, &owner(), 1, 1_000, false, now)
            .unwrap();
        assert_eq!(f.farm.total_alloc_point(), 2_000);
        assert_eq!(f.farm.pool_info(1).unwrap().alloc_point, 1_000);
        assert_eq!(
            f.farm.set(&mut f.tokens, &owner(), 7, 1, false, now),
            Err(PpiError::UnknownPool(7))
        );
    }

    #[test]
    fn test_alloc_share_of_emission() {
        let mut f = fixture();
        let now = f.clock.now();
        let other = Address::from_label("LP2");
        f.farm
            .add(&mut f.tokens, &owner(), 500, other, START, true, now)
            .unwrap();
        f.farm
            .deposit(&mut f.tokens, &mut f.escrow, &alice(), 0, 1_000, now)
            .unwrap();
        f.clock.set(START + 300);
        let accrual = f.farm.update_pool(&mut f.tokens, 0, f.clock.now()).unwrap();
        // pool 0 holds 1000 of 1500 alloc points
        let reward = 300 * RATE * 1_000 / 1_500;
        assert_eq!(accrual.split.pool, reward / 2);
    }

    #[test]
    fn test_failed_deposit_leaves_no_trace() {
        let mut f = fixture();
        let carol = Address::from_label("carol");
        let before_pool = f.farm.pool_info(0).unwrap().clone();
        let result = f
            .farm
            .deposit(&mut f.tokens, &mut f.escrow, &carol, 0, 10, f.clock.now());
        assert!(matches!(
            result,
            Err(PpiError::InsufficientAllowance { .. })
        ));
        assert_eq!(*f.farm.pool_info(0).unwrap(), before_pool);
        assert_eq!(f.farm.user_info(0, &carol).unwrap(), UserInfo::default());
    }

    #[test]
    fn test_rejected_calls_do_not_advance_escrow() {
        let mut f = fixture();
        f.clock.set(START + 5 * WEEK);
        let checkpoint = f.escrow.last_checkpoint();
        let carol = Address::from_label("carol");
        let now = f.clock.now();
        assert!(matches!(
            f.farm.deposit(&mut f.tokens, &mut f.escrow, &carol, 0, 10, now),
            Err(PpiError::InsufficientAllowance { .. })
        ));
        assert!(matches!(
            f.farm.withdraw(&mut f.tokens, &mut f.escrow, &carol, 0, 10, now),
            Err(PpiError::InsufficientStake { .. })
        ));
        assert_eq!(f.escrow.last_checkpoint(), checkpoint);
    }

    #[test]
    fn test_emission_held_while_no_pool_has_allocation() {
        let mut f = fixture();
        let now = f.clock.now();
        f.farm
            .deposit(&mut f.tokens, &mut f.escrow, &alice(), 0, 1_000, now)
            .unwrap();
        f.farm
            .set(&mut f.tokens, &owner(), 0, 0, false, now)
            .unwrap();
        assert_eq!(f.farm.total_alloc_point(), 0);

        f.clock.set(START + 400);
        let accrual = f.farm.update_pool(&mut f.tokens, 0, f.clock.now()).unwrap();
        assert_eq!(accrual.last_reward_time, START);
        assert_eq!(accrual.split, RewardSplit::default());

        let now = f.clock.now();
        f.farm
            .set(&mut f.tokens, &owner(), 0, 1_000, false, now)
            .unwrap();
        f.clock.set(START + 500);
        let accrual = f.farm.update_pool(&mut f.tokens, 0, f.clock.now()).unwrap();
        assert_eq!(accrual.last_reward_time, START + 500);
        assert_eq!(accrual.split.pool, 500 * RATE / 2);
    }

    #[test]
    fn test_boost_never_exceeds_pool_total() {
        let mut f = fixture();
        let boundary = week_floor(START) + 2 * WEEK;
        f.clock.set(boundary);
        let now = f.clock.now();
        f.escrow
            .create_lock(&mut f.tokens, &alice(), 500 * UNIT, now + 100 * WEEK, now)
            .unwrap();
        let s = f
            .farm
            .deposit(&mut f.tokens, &mut f.escrow, &alice(), 0, 1_000_000, now)
            .unwrap();
        // all voting power, whole pool
        assert_eq!(s.user.working_supply, 1_000_000);

        // a second locker on the next boundary, after the cursor entered it
        let next = boundary + WEEK;
        f.clock.set(next);
        let now = f.clock.now();
        f.escrow.checkpoint(now);
        f.escrow
            .create_lock(&mut f.tokens, &bob(), 900 * UNIT, now + 150 * WEEK, now)
            .unwrap();
        let b = f
            .farm
            .deposit(&mut f.tokens, &mut f.escrow, &bob(), 0, 1_000, now)
            .unwrap();
        let pool_total = f.farm.pool_info(0).unwrap().total_supply;
        assert_eq!(pool_total, 1_001_000);
        assert!(b.user.working_supply <= pool_total);
        assert!(b.user.working_supply > 330);
    }
}
