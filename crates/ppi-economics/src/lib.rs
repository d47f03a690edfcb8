// crates/ppi-economics/src/lib.rs
//
// ppi-economics: PPI token amounts, the emission schedule, reward splitting
// between pools and protocol sinks, and the in-memory token ledger.
//
// All monetary values are tracked in base units (1 PPI = 10^18 units).

pub mod emission;
pub mod ledger;
pub mod rewards;
pub mod token;

// Re-export key types for ergonomic access from downstream crates.
pub use emission::{EmissionSchedule, RateEntry, DEFAULT_RELEASE_PERIOD, DEFAULT_RELEASE_PLAN};
pub use ledger::TokenLedger;
pub use rewards::{RewardSplit, RewardSplitter, SinkAddresses, POOL_PERCENT};
pub use token::{Ppi, UNIT};
