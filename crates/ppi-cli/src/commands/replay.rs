// crates/ppi-cli/src/commands/replay.rs
//
// `ppi replay <script.json>` - run a timestamped list of calls against a
// fresh protocol built from the config.
//
// Script format:
//
//   {
//     "deploy_at": 1704000000,
//     "steps": [
//       { "at": 1704000000, "call": { "mint": { "token": "ETH/USDT", "to": "alice", "amount": 1000 } } },
//       { "at": 1704000000, "call": { "approve": { "caller": "alice", "token": "ETH/USDT", "spender": "FarmController", "amount": 1000 } } },
//       { "at": 1704000100, "call": { "deposit": { "caller": "alice", "pid": 0, "amount": 1000 } } }
//     ]
//   }
//
// Addresses are labels or `0x` hex. A failing call is reported and the
// replay continues with the next step.

use std::fs;

use clap::Args;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use ppi_core::{Amount, ManualClock, PpiError, Timestamp};
use ppi_farm::{Protocol, ProtocolState};

use crate::config::{parse_address, ProtocolConfig};
use crate::error::CliError;
use crate::output::{format_json, format_table, OutputFormat};
use crate::shared::SharedProtocol;

/// Arguments for `ppi replay`.
#[derive(Debug, Args)]
pub struct ReplayCmd {
    /// Path to the JSON call script.
    script: String,

    /// Print JSON (outcomes plus full final state) instead of tables.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Deployment time; defaults to the first step's time.
    #[serde(default)]
    pub deploy_at: Option<Timestamp>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub at: Timestamp,
    pub call: Call,
}

/// One user call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Call {
    CreateLock {
        caller: String,
        amount: Amount,
        unlock_time: Timestamp,
    },
    IncreaseUnlockTime {
        caller: String,
        unlock_time: Timestamp,
    },
    IncreaseAmount {
        caller: String,
        account: String,
        amount: Amount,
    },
    WithdrawLock {
        caller: String,
    },
    Deposit {
        caller: String,
        pid: usize,
        amount: Amount,
    },
    Withdraw {
        caller: String,
        pid: usize,
        amount: Amount,
    },
    Kick {
        pid: usize,
        account: String,
    },
    UpdatePool {
        pid: usize,
    },
    Mint {
        token: String,
        to: String,
        amount: Amount,
    },
    Approve {
        caller: String,
        token: String,
        spender: String,
        amount: Amount,
    },
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::CreateLock { .. } => "create_lock",
            Call::IncreaseUnlockTime { .. } => "increase_unlock_time",
            Call::IncreaseAmount { .. } => "increase_amount",
            Call::WithdrawLock { .. } => "withdraw_lock",
            Call::Deposit { .. } => "deposit",
            Call::Withdraw { .. } => "withdraw",
            Call::Kick { .. } => "kick",
            Call::UpdatePool { .. } => "update_pool",
            Call::Mint { .. } => "mint",
            Call::Approve { .. } => "approve",
        }
    }

    /// Execute against `protocol`, describing the result.
    pub fn apply(&self, protocol: &mut Protocol<ManualClock>) -> Result<String, PpiError> {
        match self {
            Call::CreateLock {
                caller,
                amount,
                unlock_time,
            } => {
                let lock = protocol.create_lock(&parse_address(caller)?, *amount, *unlock_time)?;
                Ok(format!("locked {} until {}", lock.amount, lock.unlock_time))
            }
            Call::IncreaseUnlockTime {
                caller,
                unlock_time,
            } => {
                let lock = protocol.increase_unlock_time(&parse_address(caller)?, *unlock_time)?;
                Ok(format!("unlock time {}", lock.unlock_time))
            }
            Call::IncreaseAmount {
                caller,
                account,
                amount,
            } => {
                let lock = protocol.increase_amount(
                    &parse_address(caller)?,
                    &parse_address(account)?,
                    *amount,
                )?;
                Ok(format!("lock amount {}", lock.amount))
            }
            Call::WithdrawLock { caller } => {
                let amount = protocol.withdraw_lock(&parse_address(caller)?)?;
                Ok(format!("returned {}", amount))
            }
            Call::Deposit {
                caller,
                pid,
                amount,
            } => {
                let s = protocol.deposit(&parse_address(caller)?, *pid, *amount)?;
                Ok(format!(
                    "staked {}, working {}, harvested {}",
                    s.user.amount, s.user.working_supply, s.harvested
                ))
            }
            Call::Withdraw {
                caller,
                pid,
                amount,
            } => {
                let s = protocol.withdraw(&parse_address(caller)?, *pid, *amount)?;
                Ok(format!(
                    "staked {}, working {}, harvested {}",
                    s.user.amount, s.user.working_supply, s.harvested
                ))
            }
            Call::Kick { pid, account } => {
                let s = protocol.kick(*pid, &parse_address(account)?)?;
                Ok(format!(
                    "working {}, harvested {}",
                    s.user.working_supply, s.harvested
                ))
            }
            Call::UpdatePool { pid } => {
                let accrual = protocol.update_pool(*pid)?;
                Ok(format!(
                    "acc {} (pool share {})",
                    accrual.acc_reward_per_share, accrual.split.pool
                ))
            }
            Call::Mint { token, to, amount } => {
                protocol.mint(&parse_address(token)?, &parse_address(to)?, *amount);
                Ok(format!("minted {}", amount))
            }
            Call::Approve {
                caller,
                token,
                spender,
                amount,
            } => {
                protocol.approve(
                    &parse_address(caller)?,
                    &parse_address(token)?,
                    &parse_address(spender)?,
                    *amount,
                );
                Ok(format!("approved {}", amount))
            }
        }
    }
}

/// Result of one step.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct Outcome {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "At")]
    pub at: Timestamp,
    #[tabled(rename = "Call")]
    pub call: String,
    #[tabled(rename = "Ok")]
    pub ok: bool,
    #[tabled(rename = "Result")]
    pub detail: String,
}

#[derive(Tabled)]
struct PoolRow {
    #[tabled(rename = "Pool")]
    pid: usize,
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Alloc")]
    alloc_point: u64,
    #[tabled(rename = "Total")]
    total_supply: String,
    #[tabled(rename = "Working")]
    working_supply: String,
    #[tabled(rename = "Acc/share")]
    acc_reward_per_share: String,
    #[tabled(rename = "Last reward")]
    last_reward_time: Timestamp,
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "Pool")]
    pid: usize,
    #[tabled(rename = "Account")]
    account: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Working")]
    working_supply: String,
    #[tabled(rename = "Debt")]
    reward_debt: String,
}

#[derive(Serialize)]
struct ReplayReport<'a> {
    outcomes: &'a [Outcome],
    state: &'a ProtocolState,
}

pub fn load_script(path: &str) -> Result<Script, CliError> {
    let contents = fs::read_to_string(path)?;
    let script: Script = serde_json::from_str(&contents)?;
    Ok(script)
}

/// Deploy from `config` and run every step in order under the shared lock.
pub async fn replay(
    config: &ProtocolConfig,
    script: &Script,
) -> Result<(Vec<Outcome>, ProtocolState), CliError> {
    let deploy_at = script
        .deploy_at
        .or_else(|| script.steps.first().map(|step| step.at))
        .unwrap_or(config.start_time);
    let protocol = config.build_protocol(ManualClock::new(deploy_at))?;
    let shared = SharedProtocol::new(protocol);

    let mut outcomes = Vec::with_capacity(script.steps.len());
    let mut last = deploy_at;
    for (index, step) in script.steps.iter().enumerate() {
        if step.at < last {
            tracing::warn!(
                "Step {} at {} is earlier than {}; the clock does not go back",
                index,
                step.at,
                last
            );
        }
        shared.clock().set(step.at);
        last = last.max(step.at);

        let result = shared.call(|protocol| step.call.apply(protocol)).await;
        let (ok, detail) = match result {
            Ok(detail) => (true, detail),
            Err(e) => {
                tracing::info!("Step {} ({}) rejected: {}", index, step.call.name(), e);
                (false, e.to_string())
            }
        };
        outcomes.push(Outcome {
            index,
            at: last,
            call: step.call.name().to_string(),
            ok,
            detail,
        });
    }

    Ok((outcomes, shared.state().await))
}

fn pool_rows(state: &ProtocolState) -> Vec<PoolRow> {
    state
        .farm
        .pools()
        .map(|(pid, info)| PoolRow {
            pid,
            token: info.token.to_string(),
            alloc_point: info.alloc_point,
            total_supply: info.total_supply.to_string(),
            working_supply: info.working_supply.to_string(),
            acc_reward_per_share: info.acc_reward_per_share.to_string(),
            last_reward_time: info.last_reward_time,
        })
        .collect()
}

fn user_rows(state: &ProtocolState) -> Vec<UserRow> {
    let mut rows = Vec::new();
    for pid in 0..state.farm.pool_length() {
        if let Ok(users) = state.farm.users(pid) {
            for (account, user) in users {
                rows.push(UserRow {
                    pid,
                    account: account.to_string(),
                    amount: user.amount.to_string(),
                    working_supply: user.working_supply.to_string(),
                    reward_debt: user.reward_debt.to_string(),
                });
            }
        }
    }
    rows
}

/// Run the replay command.
pub async fn run(cmd: &ReplayCmd, config: &ProtocolConfig) -> Result<(), Box<dyn std::error::Error>> {
    let script = load_script(&cmd.script)?;
    tracing::info!("Replaying {} steps from {}", script.steps.len(), cmd.script);
    let (outcomes, state) = replay(config, &script).await?;

    match OutputFormat::from_json_flag(cmd.json) {
        OutputFormat::Json => {
            let report = ReplayReport {
                outcomes: &outcomes,
                state: &state,
            };
            println!("{}", format_json(&report));
        }
        OutputFormat::Table => {
            println!("{}", format_table(&outcomes));
            println!();
            println!("Pools at {}", state.now);
            println!("{}", format_table(&pool_rows(&state)));
            let users = user_rows(&state);
            if !users.is_empty() {
                println!();
                println!("{}", format_table(&users));
            }
        }
    }

    let failed = outcomes.iter().filter(|o| !o.ok).count();
    if failed > 0 {
        tracing::warn!("{} of {} steps were rejected", failed, outcomes.len());
    }
    Ok(())
}
