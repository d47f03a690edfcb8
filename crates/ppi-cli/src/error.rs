// crates/ppi-cli/src/error.rs
//
// Errors surfaced by the CLI before they reach `main`.

use thiserror::Error;

use ppi_core::PpiError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid script: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Protocol(#[from] PpiError),
}
