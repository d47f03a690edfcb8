// crates/ppi-farm/src/lib.rs
//
// ppi-farm: Boosted PPI farm.
//
// Stakers deposit pool tokens and earn PPI emission in proportion to their
// working supply: 33% of the stake plus a vePPI-weighted share of the pool.
// `Protocol` wires the farm, the vote escrow and the token ledger
// behind one clock.

pub mod boost;
pub mod controller;
pub mod pool;
pub mod protocol;

pub use boost::BoostPolicy;
pub use controller::{Accrual, FarmController, FarmParams, Settlement};
pub use pool::{PoolInfo, UserInfo};
pub use protocol::{Deployment, Protocol, ProtocolState};
