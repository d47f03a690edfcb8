// crates/ppi-escrow/src/checkpoint.rs
//
// Aggregate vote supply via lazy weekly checkpoints.
//
// Every lock contributes `amount * (unlock - t) / max_time`, so the sum over
// all locks is `(bias - slope * (t - week)) / max_time` where, at the
// checkpoint week:
//   bias  = sum of amount * (unlock - week) over active locks
//   slope = sum of amount over active locks
// Unlock times are week-aligned, so inside one week the aggregate is exactly
// linear. Crossing into the next week subtracts `slope * WEEK` from the bias
// and drops the amounts unlocking in that week from the slope.
//
// The cursor only moves forward, one week per step, and each step costs one
// bucket lookup: per-call work is proportional to the weeks elapsed since the
// last touch, independent of the number of accounts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ppi_core::math::{add, sub};
use ppi_core::{week_floor, Amount, PpiError, Timestamp, WEEK};

/// Aggregate bias and slope as of a week boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalPoint {
    /// Week-aligned time this point describes.
    pub week: Timestamp,
    /// Sum of `amount * (unlock - week)` over locks active at `week`.
    pub bias: u128,
    /// Sum of `amount` over locks active at `week`.
    pub slope: u128,
}

impl GlobalPoint {
    /// Bias at `t` inside this point's week (or at any later time, if no
    /// lock unlocks in between).
    pub fn bias_at(&self, t: Timestamp) -> u128 {
        let elapsed = t.saturating_sub(self.week) as u128;
        self.bias.saturating_sub(self.slope.saturating_mul(elapsed))
    }

    /// Decayed supply at `t`.
    pub fn supply_at(&self, t: Timestamp, max_time: u64) -> Amount {
        if max_time == 0 {
            return 0;
        }
        self.bias_at(t) / max_time as u128
    }
}

/// Week buckets, the live checkpoint cursor, and the append-only history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyCheckpoints {
    /// Live aggregate at the last checkpointed week.
    point: GlobalPoint,
    /// week -> total amount of locks unlocking at that week.
    unlock_schedule: BTreeMap<Timestamp, Amount>,
    /// week -> aggregate at that week. The cursor's own week mirrors the
    /// live point and is fixed once the cursor moves past it.
    history: BTreeMap<Timestamp, GlobalPoint>,
}

impl SupplyCheckpoints {
    /// Start the cursor at the week containing `now` with nothing locked.
    pub fn new(now: Timestamp) -> Self {
        let point = GlobalPoint {
            week: week_floor(now),
            bias: 0,
            slope: 0,
        };
        let mut history = BTreeMap::new();
        history.insert(point.week, point);
        Self {
            point,
            unlock_schedule: BTreeMap::new(),
            history,
        }
    }

    /// The live point.
    pub fn point(&self) -> &GlobalPoint {
        &self.point
    }

    /// Last week the cursor has consumed.
    pub fn last_checkpoint(&self) -> Timestamp {
        self.point.week
    }

    /// Amount scheduled to unlock at `week`.
    pub fn unlock_schedule(&self, week: Timestamp) -> Amount {
        self.unlock_schedule.get(&week).copied().unwrap_or(0)
    }

    /// Recorded aggregate for `week`, if the cursor has entered it.
    pub fn history(&self, week: Timestamp) -> Option<&GlobalPoint> {
        self.history.get(&week)
    }

    /// Non-zero buckets in week order.
    pub fn buckets(&self) -> impl Iterator<Item = (&Timestamp, &Amount)> {
        self.unlock_schedule.iter().filter(|(_, amount)| **amount > 0)
    }

    fn step(&self, point: &GlobalPoint) -> GlobalPoint {
        let next = point.week + WEEK;
        let expiring = self.unlock_schedule(next);
        GlobalPoint {
            week: next,
            bias: point.bias.saturating_sub(point.slope.saturating_mul(WEEK as u128)),
            slope: point.slope.saturating_sub(expiring),
        }
    }

    /// The point the cursor would reach at `week`, without moving it.
    pub fn project(&self, week: Timestamp) -> GlobalPoint {
        let target = week_floor(week);
        let mut point = self.point;
        while point.week < target {
            point = self.step(&point);
        }
        point
    }

    /// Move the cursor forward to `week`, recording each week entered.
    ///
    /// Weeks at or before the cursor are a no-op. Returns the number of
    /// weeks advanced.
    pub fn advance_to(&mut self, week: Timestamp) -> u64 {
        let target = week_floor(week);
        let mut steps = 0;
        while self.point.week < target {
            self.point = self.step(&self.point);
            self.record();
            steps += 1;
        }
        if steps > 0 {
            tracing::debug!(
                "Supply checkpoint advanced {} weeks to {} (slope {})",
                steps,
                self.point.week,
                self.point.slope
            );
        }
        steps
    }

    fn record(&mut self) {
        self.history.insert(self.point.week, self.point);
    }

    /// Aggregate supply at `t`, reading history for weeks the cursor has
    /// passed, the live point for its current week, and a read-only
    /// projection for later weeks.
    pub fn supply_at(&self, t: Timestamp, max_time: u64) -> Amount {
        let week = week_floor(t);
        if week < self.point.week {
            return match self.history.range(..=week).next_back() {
                Some((_, recorded)) => recorded.supply_at(t, max_time),
                None => 0,
            };
        }
        if week == self.point.week {
            return self.point.supply_at(t, max_time);
        }
        self.project(week).supply_at(t, max_time)
    }

    /// Check that adding a lock of `amount` until `unlock` at the week of
    /// `now` cannot overflow.
    pub fn check_add(&self, amount: Amount, unlock: Timestamp, now: Timestamp) -> Result<(), PpiError> {
        let point = self.project(now);
        let weight = lock_weight(amount, unlock, point.week)?;
        add(point.bias, weight)?;
        add(point.slope, amount)?;
        add(self.unlock_schedule(unlock), amount)?;
        Ok(())
    }

    /// Check that moving `amount` from `old_unlock` to `new_unlock` cannot
    /// overflow.
    pub fn check_extend(
        &self,
        amount: Amount,
        old_unlock: Timestamp,
        new_unlock: Timestamp,
        now: Timestamp,
    ) -> Result<(), PpiError> {
        let point = self.project(now);
        let extra = lock_weight(amount, new_unlock, old_unlock)?;
        add(point.bias, extra)?;
        sub(self.unlock_schedule(old_unlock), amount)?;
        add(self.unlock_schedule(new_unlock), amount)?;
        Ok(())
    }

    /// Add `amount` unlocking at `unlock`. The cursor must already be at the
    /// current week and `check_add` must have passed.
    pub fn add_lock(&mut self, amount: Amount, unlock: Timestamp) {
        let weight = amount.saturating_mul((unlock - self.point.week) as u128);
        self.point.bias = self.point.bias.saturating_add(weight);
        self.point.slope = self.point.slope.saturating_add(amount);
        let bucket = self.unlock_schedule.entry(unlock).or_insert(0);
        *bucket = bucket.saturating_add(amount);
        self.record();
    }

    /// Move `amount` from the `old_unlock` bucket to `new_unlock`. The cursor
    /// must already be at the current week and `check_extend` must have passed.
    pub fn extend_lock(&mut self, amount: Amount, old_unlock: Timestamp, new_unlock: Timestamp) {
        let extra = amount.saturating_mul((new_unlock - old_unlock) as u128);
        self.point.bias = self.point.bias.saturating_add(extra);

        if let Some(bucket) = self.unlock_schedule.get_mut(&old_unlock) {
            *bucket = bucket.saturating_sub(amount);
            if *bucket == 0 {
                self.unlock_schedule.remove(&old_unlock);
            }
        }
        let bucket = self.unlock_schedule.entry(new_unlock).or_insert(0);
        *bucket = bucket.saturating_add(amount);
        self.record();
    }
}

fn lock_weight(amount: Amount, unlock: Timestamp, from: Timestamp) -> Result<u128, PpiError> {
    let duration = unlock.checked_sub(from).ok_or(PpiError::MathOverflow)? as u128;
    amount.checked_mul(duration).ok_or(PpiError::MathOverflow)
}
