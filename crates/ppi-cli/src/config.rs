// crates/ppi-cli/src/config.rs
//
// Protocol configuration for the PPI CLI.
// Loaded from a TOML file or populated with the defaults of the live
// deployment (36-month release plan, 4-year max lock, 50/30/10/10 split).
//
// Addresses are written either as `0x`-prefixed hex or as a plain label,
// which maps to a deterministic address (see `Address::from_label`).

use serde::{Deserialize, Serialize};
use std::fs;

use ppi_core::{Address, Amount, Clock, PpiError, Timestamp};
use ppi_economics::{
    EmissionSchedule, RewardSplitter, SinkAddresses, DEFAULT_RELEASE_PERIOD, DEFAULT_RELEASE_PLAN,
};
use ppi_escrow::{EscrowMetadata, DEFAULT_MAX_TIME};
use ppi_farm::{Deployment, Protocol};

use crate::error::CliError;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Log level: "trace", "debug", "info", "warn", "error". `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Unix time emission starts.
    #[serde(default = "default_start_time")]
    pub start_time: Timestamp,

    /// Length of one release period in seconds.
    #[serde(default = "default_release_period")]
    pub release_period: u64,

    /// Whole PPI released in each period.
    #[serde(default = "default_release_rates")]
    pub release_rates: Vec<Amount>,

    #[serde(default)]
    pub escrow: EscrowConfig,

    #[serde(default)]
    pub farm: FarmConfig,

    /// Pools added after the first one, in order.
    #[serde(default)]
    pub pools: Vec<PoolConfig>,
}

/// `[escrow]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowConfig {
    #[serde(default = "default_escrow_address")]
    pub address: String,

    /// Maximum lock duration in seconds.
    #[serde(default = "default_max_time")]
    pub max_time: u64,

    #[serde(default = "default_escrow_name")]
    pub name: String,

    #[serde(default = "default_escrow_symbol")]
    pub symbol: String,
}

/// `[farm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmConfig {
    #[serde(default = "default_farm_address")]
    pub address: String,

    #[serde(default = "default_owner")]
    pub owner: String,

    #[serde(default = "default_reward_token")]
    pub reward_token: String,

    #[serde(default = "default_treasury")]
    pub treasury: String,

    #[serde(default = "default_market")]
    pub market: String,

    #[serde(default = "default_dev")]
    pub dev: String,

    /// Percentages `[pool, treasury, market, dev]`; must sum to 100.
    #[serde(default = "default_split")]
    pub split: [u8; 4],

    #[serde(default = "default_first_pool")]
    pub first_pool: String,

    #[serde(default = "default_first_alloc_point")]
    pub first_alloc_point: u64,
}

/// One `[[pools]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    pub token: String,
    pub alloc_point: u64,
    /// Defaults to the global `start_time`.
    #[serde(default)]
    pub start_time: Option<Timestamp>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_start_time() -> Timestamp {
    // 2024-01-01T00:00:00Z
    1_704_067_200
}

fn default_release_period() -> u64 {
    DEFAULT_RELEASE_PERIOD
}

fn default_release_rates() -> Vec<Amount> {
    DEFAULT_RELEASE_PLAN.to_vec()
}

fn default_escrow_address() -> String {
    "VotingEscrow".to_string()
}

fn default_max_time() -> u64 {
    DEFAULT_MAX_TIME
}

fn default_escrow_name() -> String {
    EscrowMetadata::default().name
}

fn default_escrow_symbol() -> String {
    EscrowMetadata::default().symbol
}

fn default_farm_address() -> String {
    "FarmController".to_string()
}

fn default_owner() -> String {
    "admin".to_string()
}

fn default_reward_token() -> String {
    "PPI".to_string()
}

fn default_treasury() -> String {
    Address::from_low_u64(2).to_string()
}

fn default_market() -> String {
    Address::from_low_u64(3).to_string()
}

fn default_dev() -> String {
    Address::from_low_u64(4).to_string()
}

fn default_split() -> [u8; 4] {
    [50, 30, 10, 10]
}

fn default_first_pool() -> String {
    "ETH/USDT".to_string()
}

fn default_first_alloc_point() -> u64 {
    1_000
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self {
            address: default_escrow_address(),
            max_time: default_max_time(),
            name: default_escrow_name(),
            symbol: default_escrow_symbol(),
        }
    }
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            address: default_farm_address(),
            owner: default_owner(),
            reward_token: default_reward_token(),
            treasury: default_treasury(),
            market: default_market(),
            dev: default_dev(),
            split: default_split(),
            first_pool: default_first_pool(),
            first_alloc_point: default_first_alloc_point(),
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            start_time: default_start_time(),
            release_period: default_release_period(),
            release_rates: default_release_rates(),
            escrow: EscrowConfig::default(),
            farm: FarmConfig::default(),
            pools: Vec::new(),
        }
    }
}

/// Resolve a config or script address: `0x` hex, or a label.
pub fn parse_address(value: &str) -> Result<Address, PpiError> {
    if value.starts_with("0x") {
        value.parse()
    } else {
        Ok(Address::from_label(value))
    }
}

impl ProtocolConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, CliError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, CliError> {
        let config: ProtocolConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// The emission schedule described by `start_time`, `release_period` and
    /// `release_rates`.
    pub fn schedule(&self) -> Result<EmissionSchedule, PpiError> {
        EmissionSchedule::from_release_plan(self.start_time, &self.release_rates, self.release_period)
    }

    pub fn splitter(&self) -> Result<RewardSplitter, PpiError> {
        let [pool, treasury, market, dev] = self.farm.split;
        RewardSplitter::new(
            pool,
            treasury,
            market,
            dev,
            SinkAddresses {
                treasury: parse_address(&self.farm.treasury)?,
                market: parse_address(&self.farm.market)?,
                dev: parse_address(&self.farm.dev)?,
            },
        )
    }

    pub fn deployment(&self) -> Result<Deployment, PpiError> {
        Ok(Deployment {
            owner: parse_address(&self.farm.owner)?,
            reward_token: parse_address(&self.farm.reward_token)?,
            escrow_address: parse_address(&self.escrow.address)?,
            farm_address: parse_address(&self.farm.address)?,
            max_time: self.escrow.max_time,
            metadata: EscrowMetadata {
                name: self.escrow.name.clone(),
                symbol: self.escrow.symbol.clone(),
                decimals: 18,
            },
            schedule: self.schedule()?,
            splitter: self.splitter()?,
            first_pool: parse_address(&self.farm.first_pool)?,
            first_alloc_point: self.farm.first_alloc_point,
            start_time: self.start_time,
        })
    }

    /// Deploy a fresh protocol on `clock` and register the extra pools.
    pub fn build_protocol<C: Clock>(&self, clock: C) -> Result<Protocol<C>, PpiError> {
        let deployment = self.deployment()?;
        let owner = deployment.owner;
        let mut protocol = Protocol::deploy(clock, deployment)?;
        for pool in &self.pools {
            protocol.add_pool(
                &owner,
                pool.alloc_point,
                parse_address(&pool.token)?,
                pool.start_time.unwrap_or(self.start_time),
                true,
            )?;
        }
        Ok(protocol)
    }
}
