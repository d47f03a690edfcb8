// crates/ppi-escrow/src/lib.rs
//
// ppi-escrow: Vote-escrowed PPI.
//
// Accounts lock PPI until a week-aligned unlock time and receive voting
// power that decays linearly to zero at unlock. Aggregate supply is kept
// with lazy weekly checkpoints so historical and future queries never scan
// individual locks.

pub mod checkpoint;
pub mod escrow;
pub mod lock;

pub use checkpoint::{GlobalPoint, SupplyCheckpoints};
pub use escrow::{EscrowMetadata, VoteEscrow, DEFAULT_MAX_TIME};
pub use lock::{Lock, LockState};
