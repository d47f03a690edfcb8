// crates/ppi-economics/src/emission.rs
//
// Piecewise-constant PPI emission schedule.
//
// The schedule is a table of (start_time, rate_per_second) entries. A rate
// holds from its start time until the next entry's start time; the last entry
// carries rate 0 and ends emission. The table is validated once and never
// mutated afterwards.
//
// The default plan releases a fixed token amount per 30-day period over 36
// periods, front-loaded and tapering.

use serde::{Deserialize, Serialize};

use ppi_core::{Amount, PpiError, Timestamp, MONTH};

use crate::token::UNIT;

/// Whole PPI released in each period of the default plan.
pub const DEFAULT_RELEASE_PLAN: [u128; 36] = [
    53_680_000, 48_800_000, 43_920_000, 39_040_000, 34_160_000, 29_280_000, 26_840_000,
    24_400_000, 21_960_000, 19_520_000, 15_616_000, 14_640_000, 13_664_000, 12_688_000,
    11_712_000, 10_736_000, 9_760_000, 8_784_000, 7_808_000, 6_832_000, 5_856_000, 4_880_000,
    3_904_000, 2_928_000, 2_684_000, 2_440_000, 2_196_000, 1_952_000, 1_708_000, 1_464_000,
    1_220_000, 976_000, 732_000, 488_000, 390_400, 341_600,
];

/// Default release period length (30 days).
pub const DEFAULT_RELEASE_PERIOD: u64 = MONTH;

/// One step of the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateEntry {
    /// First second (inclusive) at which `rate_per_second` applies.
    pub start_time: Timestamp,
    /// Base units emitted per second.
    pub rate_per_second: Amount,
}

/// Immutable emission rate table.
///
/// Deserialization goes through [`EmissionSchedule::new`], so a table read
/// from disk is validated like one built in code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RateEntry>", into = "Vec<RateEntry>")]
pub struct EmissionSchedule {
    entries: Vec<RateEntry>,
}

impl EmissionSchedule {
    /// Build a schedule from its entries.
    ///
    /// # Errors
    /// `InvalidSchedule` if the table is empty, start times are not strictly
    /// increasing, or the last entry is not a zero-rate sentinel.
    pub fn new(entries: Vec<RateEntry>) -> Result<Self, PpiError> {
        let last = entries
            .last()
            .ok_or_else(|| PpiError::InvalidSchedule("rate table is empty".to_string()))?;
        if last.rate_per_second != 0 {
            return Err(PpiError::InvalidSchedule(format!(
                "last entry at {} must have rate 0, found {}",
                last.start_time, last.rate_per_second
            )));
        }
        for pair in entries.windows(2) {
            if pair[1].start_time <= pair[0].start_time {
                return Err(PpiError::InvalidSchedule(format!(
                    "start times must be strictly increasing: {} then {}",
                    pair[0].start_time, pair[1].start_time
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Build the schedule from a per-period release plan.
    ///
    /// Period `i` starts at `start + i * period` and releases
    /// `plan[i]` whole tokens at `plan[i] * 1e18 / period` units per second.
    /// A zero-rate sentinel follows the last period.
    pub fn from_release_plan(
        start: Timestamp,
        plan: &[u128],
        period: u64,
    ) -> Result<Self, PpiError> {
        if period == 0 {
            return Err(PpiError::InvalidSchedule(
                "release period must be non-zero".to_string(),
            ));
        }
        let mut entries = Vec::with_capacity(plan.len() + 1);
        for (i, tokens) in plan.iter().enumerate() {
            let rate = tokens
                .checked_mul(UNIT)
                .ok_or(PpiError::MathOverflow)?
                / period as u128;
            entries.push(RateEntry {
                start_time: period_start(start, i as u64, period)?,
                rate_per_second: rate,
            });
        }
        entries.push(RateEntry {
            start_time: period_start(start, plan.len() as u64, period)?,
            rate_per_second: 0,
        });
        Self::new(entries)
    }

    /// The default 36-period plan starting at `start`.
    pub fn default_plan(start: Timestamp) -> Result<Self, PpiError> {
        Self::from_release_plan(start, &DEFAULT_RELEASE_PLAN, DEFAULT_RELEASE_PERIOD)
    }

    /// All entries in order.
    pub fn entries(&self) -> &[RateEntry] {
        &self.entries
    }

    /// Timestamp after which nothing is emitted.
    pub fn end_time(&self) -> Timestamp {
        // new() guarantees at least one entry
        self.entries.last().map(|e| e.start_time).unwrap_or_default()
    }

    /// Emission rate in effect at `t` (0 before the first entry).
    pub fn rate_at(&self, t: Timestamp) -> Amount {
        let idx = self.entries.partition_point(|e| e.start_time <= t);
        if idx == 0 {
            0
        } else {
            self.entries[idx - 1].rate_per_second
        }
    }

    /// Total base units emitted over the half-open interval `[from, to)`.
    ///
    /// Returns 0 when `from >= to`.
    pub fn calculate_reward(&self, from: Timestamp, to: Timestamp) -> Amount {
        if from >= to {
            return 0;
        }

        let mut total: Amount = 0;
        for (i, entry) in self.entries.iter().enumerate() {
            let entry_end = self
                .entries
                .get(i + 1)
                .map(|next| next.start_time)
                .unwrap_or(Timestamp::MAX);

            if entry_end <= from {
                continue;
            }
            if entry.start_time >= to {
                break;
            }

            let overlap_start = from.max(entry.start_time);
            let overlap_end = to.min(entry_end);
            let seconds = (overlap_end - overlap_start) as Amount;
            total = total.saturating_add(entry.rate_per_second.saturating_mul(seconds));
        }

        total
    }
}

impl TryFrom<Vec<RateEntry>> for EmissionSchedule {
    type Error = PpiError;

    fn try_from(entries: Vec<RateEntry>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<EmissionSchedule> for Vec<RateEntry> {
    fn from(schedule: EmissionSchedule) -> Self {
        schedule.entries
    }
}

fn period_start(start: Timestamp, index: u64, period: u64) -> Result<Timestamp, PpiError> {
    index
        .checked_mul(period)
        .and_then(|offset| start.checked_add(offset))
        .ok_or(PpiError::MathOverflow)
}
