// crates/ppi-core/src/lib.rs
//
// ppi-core: Core types, errors, clock and fixed-point math for the PPI
// boosted farm.
//
// This is the leaf crate every other crate in the workspace depends on.

pub mod clock;
pub mod error;
pub mod math;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use ppi_core::Address;`

pub use clock::{ManualClock, SystemClock};
pub use error::{ErrorKind, KickRejection, PpiError};
pub use math::{mul_div, ACC_PRECISION};
pub use traits::{Clock, VotingPower};
pub use types::{week_floor, Address, Amount, Timestamp, DAY, HOUR, MONTH, WEEK, YEAR};
