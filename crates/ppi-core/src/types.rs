// crates/ppi-core/src/types.rs
//
// Account identity, amount and time primitives shared by every PPI crate.
//
// Amounts are token base units (1 token = 10^18 units) held in u128.
// Timestamps are unix seconds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::PpiError;

/// Token amount in base units.
pub type Amount = u128;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

pub const SECOND: u64 = 1;
pub const MINUTE: u64 = 60 * SECOND;
pub const HOUR: u64 = 60 * MINUTE;
pub const DAY: u64 = 24 * HOUR;
/// Lock unlock times are bucketed to whole weeks.
pub const WEEK: u64 = 7 * DAY;
/// Release period used by the default emission plan.
pub const MONTH: u64 = 30 * DAY;
pub const YEAR: u64 = 365 * DAY;

/// Round a timestamp down to the start of its week.
pub fn week_floor(t: Timestamp) -> Timestamp {
    t / WEEK * WEEK
}

/// A 20-byte account or contract address.
///
/// Serialized as a `0x`-prefixed lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Derive a deterministic address from a human-readable label.
    ///
    /// Takes the last 20 bytes of SHA-256(label). Used for contract vaults
    /// and for named accounts in configs and replay scripts.
    pub fn from_label(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Address(bytes)
    }

    /// Address whose last byte is `n` (e.g. `0x...02` for the treasury sink).
    pub fn from_low_u64(n: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&n.to_be_bytes());
        Address(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = PpiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(digits)
            .map_err(|e| PpiError::Serialization(format!("Invalid address {}: {}", s, e)))?;
        let bytes: [u8; 20] = raw.try_into().map_err(|_| {
            PpiError::Serialization(format!("Invalid address {}: expected 20 bytes", s))
        })?;
        Ok(Address(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = PpiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}
