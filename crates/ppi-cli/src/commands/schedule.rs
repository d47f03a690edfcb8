// crates/ppi-cli/src/commands/schedule.rs
//
// `ppi schedule` - print the emission rate table and, optionally, the reward
// emitted between two timestamps.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use ppi_core::{Amount, Timestamp};
use ppi_economics::EmissionSchedule;

use crate::config::ProtocolConfig;
use crate::output::{format_json, format_ppi, format_table, format_time, OutputFormat};

/// Arguments for `ppi schedule`.
#[derive(Debug, Args)]
pub struct ScheduleCmd {
    /// Start of the reward window (unix seconds). Defaults to the emission start.
    #[arg(long)]
    from: Option<Timestamp>,

    /// End of the reward window (unix seconds). Defaults to the emission end.
    #[arg(long)]
    to: Option<Timestamp>,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct RateRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "Rate (units/s)")]
    rate: String,
    #[tabled(rename = "Period emission")]
    emission: String,
}

#[derive(Debug, Serialize)]
struct ScheduleReport<'a> {
    schedule: &'a EmissionSchedule,
    from: Timestamp,
    to: Timestamp,
    reward: Amount,
}

fn rows(schedule: &EmissionSchedule) -> Vec<RateRow> {
    let entries = schedule.entries();
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let emission = entries
                .get(i + 1)
                .map(|next| schedule.calculate_reward(entry.start_time, next.start_time))
                .unwrap_or(0);
            RateRow {
                index: i,
                start: format_time(entry.start_time),
                rate: entry.rate_per_second.to_string(),
                emission: format_ppi(emission),
            }
        })
        .collect()
}

/// Run the schedule command.
pub async fn run(cmd: &ScheduleCmd, config: &ProtocolConfig) -> Result<(), Box<dyn std::error::Error>> {
    let schedule = config.schedule()?;
    let from = cmd.from.unwrap_or(config.start_time);
    let to = cmd.to.unwrap_or_else(|| schedule.end_time());
    let reward = schedule.calculate_reward(from, to);

    match OutputFormat::from_json_flag(cmd.json) {
        OutputFormat::Json => {
            let report = ScheduleReport {
                schedule: &schedule,
                from,
                to,
                reward,
            };
            println!("{}", format_json(&report));
        }
        OutputFormat::Table => {
            println!("{}", format_table(&rows(&schedule)));
            println!();
            println!(
                "Emission {} .. {}: {} ({} units)",
                format_time(from),
                format_time(to),
                format_ppi(reward),
                reward
            );
        }
    }

    Ok(())
}
