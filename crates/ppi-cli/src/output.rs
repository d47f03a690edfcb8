// crates/ppi-cli/src/output.rs
//
// Output formatting utilities for the PPI CLI.
// Supports table and JSON output modes.

use serde::Serialize;
use tabled::{Table, Tabled};

use ppi_core::{Amount, Timestamp};
use ppi_economics::Ppi;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Base units as a decimal PPI amount.
pub fn format_ppi(units: Amount) -> String {
    Ppi::from_units(units).to_string()
}

/// Unix time as RFC 3339, falling back to the raw number.
pub fn format_time(t: Timestamp) -> String {
    i64::try_from(t)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| t.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppi_economics::UNIT;

    #[test]
    fn test_format_ppi() {
        assert_eq!(format_ppi(3 * UNIT / 2), "1.5 PPI");
        assert_eq!(format_ppi(0), "0 PPI");
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "1970-01-01T00:00:00+00:00");
        assert_eq!(format_time(u64::MAX), u64::MAX.to_string());
    }
}
