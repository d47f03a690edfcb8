// crates/ppi-cli/src/commands/mod.rs
//
// Command module declarations for the PPI CLI.

pub mod replay;
pub mod schedule;
